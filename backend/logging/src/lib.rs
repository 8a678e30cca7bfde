//! Telemetry and structured logging components for ReceiptForge.
//!
//! Handles log redaction, console/NDJSON output, and per-request analysis events.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{AnalysisEvent, EventLogEntry, EventLogger};
pub use logger::{bootstrap_dispatch, bootstrap_dispatch_with_writer, init_logger};
pub use redact::redact_sensitive_data;
