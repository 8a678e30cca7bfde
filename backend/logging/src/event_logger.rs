//! Analysis Event Logger
//!
//! One structured event per analysis request, routed through `tracing` under
//! the `analysis_events` target so file sinks can pick them out.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::redact::redact_sensitive_data;

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalysisEvent {
    Completed {
        provider: String,
        model: String,
        mime_type: String,
        latency_ms: u64,
    },
    Failed {
        status: u16,
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub event: AnalysisEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redact and emit an analysis event. Returns the entry that was logged.
    pub fn log_event(request_id: &str, mut event: AnalysisEvent) -> EventLogEntry {
        if let AnalysisEvent::Failed { error_msg, .. } = &mut event {
            *error_msg = redact_sensitive_data(error_msg);
        }

        let entry = EventLogEntry {
            request_id: request_id.into(),
            timestamp: Utc::now(),
            event,
        };

        let payload = serde_json::to_string(&entry).unwrap_or_default();
        match &entry.event {
            AnalysisEvent::Completed { .. } => {
                info!(target: "analysis_events", event = %payload, "Receipt analyzed")
            }
            AnalysisEvent::Failed { .. } => {
                warn!(target: "analysis_events", event = %payload, "Receipt analysis failed")
            }
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_events_are_redacted() {
        let entry = EventLogger::log_event(
            "req-1",
            AnalysisEvent::Failed {
                status: 500,
                error_msg: "upstream rejected key AIzaSyA1b2C3d4E5f6G7h8I9j0KlMnOpQrStUv".into(),
            },
        );
        match entry.event {
            AnalysisEvent::Failed { error_msg, status } => {
                assert_eq!(status, 500);
                assert!(!error_msg.contains("AIzaSy"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let entry = EventLogger::log_event(
            "req-2",
            AnalysisEvent::Completed {
                provider: "gemini".into(),
                model: "gemini-1.5-flash".into(),
                mime_type: "image/png".into(),
                latency_ms: 12,
            },
        );
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["event"]["type"], "completed");
        assert_eq!(json["request_id"], "req-2");
    }
}
