//! `POST /api/analyze`: receipt image in, extracted JSON out.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use receiptforge_core::ReceiptError;
use receiptforge_logging::{AnalysisEvent, EventLogger};

use crate::server::GatewayState;

/// A [`ReceiptError`] rendered as `{error, details?}` with its status code.
#[derive(Debug)]
pub struct ApiError(pub ReceiptError);

impl From<ReceiptError> for ApiError {
    fn from(err: ReceiptError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.to_envelope())).into_response()
    }
}

fn body_rejection(rejection: BytesRejection, limit: usize) -> ReceiptError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ReceiptError::ImageTooLarge { limit }
    } else {
        ReceiptError::InvalidRequest(rejection.body_text())
    }
}

/// Handler for `POST /api/analyze`
pub async fn analyze_receipt(
    State(state): State<GatewayState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Value>, ApiError> {
    let request_id = Uuid::new_v4().to_string();
    let span = info_span!("analyze_receipt", request_id = %request_id);

    async move {
        let result = match body {
            Ok(bytes) => {
                debug!(body_len = bytes.len(), "Received analysis request");
                state.analyzer.analyze_body(&bytes).await
            }
            Err(rejection) => Err(body_rejection(rejection, state.max_body_bytes)),
        };

        match result {
            Ok(outcome) => {
                EventLogger::log_event(
                    &request_id,
                    AnalysisEvent::Completed {
                        provider: outcome.provider,
                        model: outcome.model,
                        mime_type: outcome.mime_type,
                        latency_ms: outcome.latency_ms,
                    },
                );
                Ok(Json(outcome.value))
            }
            Err(err) => {
                EventLogger::log_event(
                    &request_id,
                    AnalysisEvent::Failed {
                        status: err.status_code(),
                        error_msg: err.to_string(),
                    },
                );
                Err(ApiError(err))
            }
        }
    }
    .instrument(span)
    .await
}
