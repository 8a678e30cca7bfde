//! ReceiptForge Gateway HTTP API Server
//!
//! Serves the receipt analysis endpoint and a health probe.

pub mod analyze_api;
pub mod health_api;
pub mod server;

pub use analyze_api::ApiError;
pub use server::{build_router, start_server, GatewayState};
