use thiserror::Error;

use crate::types::ErrorEnvelope;

/// Every way a receipt analysis can fail.
///
/// The first two kinds are the explicit input checks; everything else is
/// reported to the caller as a generic processing failure unless it has a
/// dedicated status (oversized image, strict schema rejection).
#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("Image is required")]
    MissingImage,

    #[error("API Key is missing")]
    MissingCredential,

    #[error("invalid request body: {0}")]
    InvalidRequest(String),

    #[error("image payload exceeds the {limit} byte limit")]
    ImageTooLarge { limit: usize },

    #[error("image payload is not valid base64: {0}")]
    InvalidImage(String),

    #[error("vision provider error ({provider}): {message}")]
    Upstream { provider: String, message: String },

    #[error("model output is not valid JSON: {0}")]
    MalformedOutput(#[from] serde_json::Error),

    #[error("receipt validation failed: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReceiptError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingImage => 400,
            Self::MissingCredential => 401,
            Self::ImageTooLarge { .. } => 413,
            Self::Validation(_) => 422,
            _ => 500,
        }
    }

    /// The stable `error` string shown to callers.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::MissingImage => "Image is required",
            Self::MissingCredential => "API Key is missing",
            Self::ImageTooLarge { .. } => "Image is too large",
            Self::Validation(_) => "Receipt validation failed",
            _ => "Failed to analyze receipt",
        }
    }

    /// The underlying cause, without the kind prefix.
    pub fn details(&self) -> Option<String> {
        match self {
            Self::MissingImage | Self::MissingCredential => None,
            Self::InvalidRequest(msg)
            | Self::InvalidImage(msg)
            | Self::Validation(msg) => Some(msg.clone()),
            Self::Upstream { message, .. } => Some(message.clone()),
            Self::MalformedOutput(e) => Some(e.to_string()),
            Self::ImageTooLarge { .. } => Some(self.to_string()),
            Self::Other(e) => Some(format!("{e:#}")),
        }
    }

    pub fn to_envelope(&self) -> ErrorEnvelope {
        let envelope = ErrorEnvelope::new(self.public_message());
        match self.details() {
            Some(details) => envelope.with_details(details),
            None => envelope,
        }
    }
}
