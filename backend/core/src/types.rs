use serde::{Deserialize, Serialize};

/// MIME type assumed when the image carries no data-URI header.
pub const DEFAULT_IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Body of `POST /api/analyze`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    /// Base64 image, optionally prefixed with `data:<mime>;base64,`.
    #[serde(default)]
    pub image: Option<String>,
    /// Caller-supplied credential; falls back to the configured default.
    #[serde(default)]
    pub api_key: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: Some(image.into()),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// The image value, if present and non-empty.
    pub fn image(&self) -> Option<&str> {
        self.image.as_deref().filter(|s| !s.is_empty())
    }

    /// The caller's credential, if present and non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|s| !s.is_empty())
    }
}

/// The four fields extracted from a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    /// Transaction date, `YYYY-MM-DD`.
    pub date: String,
    /// Store or vendor name.
    pub name: String,
    /// Currency symbol or code (`¥`, `$`, `JPY`).
    pub currency: String,
    /// Total paid, without thousands separators.
    pub amount: String,
}

/// JSON body returned for every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Inline image data ready to hand to a vision model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    /// Raw base64, header stripped.
    pub data: String,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }
}
