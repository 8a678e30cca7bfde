//! Receipt analysis: validate the request, call the vision model once, and
//! turn its text into JSON.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use serde_json::Value;
use tracing::{debug, instrument};

use receiptforge_config::VisionConfig;
use receiptforge_core::{AnalyzeRequest, ReceiptError, VisionProvider, VisionRequest};

use crate::cleanup::parse_model_output;
use crate::data_uri::{check_image_size, decode_image};
use crate::gemini::GeminiProvider;
use crate::prompt::receipt_prompt_for_today;
use crate::schema::validate_receipt;

/// Behaviour switches for [`ReceiptAnalyzer`].
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    /// Used when the caller sends no `apiKey`.
    pub default_api_key: Option<String>,
    /// Enforce the four-field schema instead of passing output through.
    pub strict_schema: bool,
    /// Decoded image size limit; `None` accepts any size.
    pub max_image_bytes: Option<usize>,
}

/// Successful analysis result.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    /// Parsed model output (or the normalised record in strict mode).
    pub value: Value,
    pub mime_type: String,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
}

/// Shared, read-only analysis service. One instance serves all requests.
pub struct ReceiptAnalyzer {
    provider: Arc<dyn VisionProvider>,
    options: AnalyzerOptions,
}

impl ReceiptAnalyzer {
    pub fn new(provider: Arc<dyn VisionProvider>, options: AnalyzerOptions) -> Self {
        Self { provider, options }
    }

    /// Build an analyzer backed by Gemini from the `vision` config section.
    pub fn from_config(vision: &VisionConfig) -> Result<Self> {
        let mut provider = GeminiProvider::new(vision.model()).with_base_url(vision.base_url());
        if let Some(secs) = vision.timeout_secs {
            provider = provider.with_timeout(Duration::from_secs(secs))?;
        }

        let options = AnalyzerOptions {
            default_api_key: vision.api_key().map(str::to_string),
            strict_schema: vision.strict_schema(),
            max_image_bytes: vision.max_image_bytes,
        };
        Ok(Self::new(Arc::new(provider), options))
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    pub fn has_default_credential(&self) -> bool {
        self.default_credential().is_some()
    }

    fn default_credential(&self) -> Option<&str> {
        self.options.default_api_key.as_deref().filter(|k| !k.is_empty())
    }

    /// Parse a raw HTTP body into a request.
    pub fn parse_request(body: &[u8]) -> Result<AnalyzeRequest, ReceiptError> {
        serde_json::from_slice(body).map_err(|e| ReceiptError::InvalidRequest(e.to_string()))
    }

    /// Caller key if non-empty, else the configured default.
    pub fn resolve_credential<'a>(
        &'a self,
        request: &'a AnalyzeRequest,
    ) -> Result<&'a str, ReceiptError> {
        request
            .api_key()
            .or_else(|| self.default_credential())
            .ok_or(ReceiptError::MissingCredential)
    }

    /// Parse `body` and analyze it.
    pub async fn analyze_body(&self, body: &[u8]) -> Result<AnalysisOutcome, ReceiptError> {
        let request = Self::parse_request(body)?;
        self.analyze(&request).await
    }

    #[instrument(skip_all, fields(provider = %self.provider.name(), model = %self.provider.model()))]
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisOutcome, ReceiptError> {
        let image = request.image().ok_or(ReceiptError::MissingImage)?;
        let api_key = self.resolve_credential(request)?;

        let payload = decode_image(image);
        if let Some(limit) = self.options.max_image_bytes {
            let size = check_image_size(&payload, limit)?;
            debug!(size, limit, "Image within size limit");
        }
        let mime_type = payload.mime_type.clone();

        let vision_request = VisionRequest {
            api_key: api_key.to_string(),
            prompt: receipt_prompt_for_today(),
            image: payload,
        };

        let response = self
            .provider
            .complete(&vision_request)
            .await
            .map_err(|e| ReceiptError::Upstream {
                provider: self.provider.name().to_string(),
                message: format!("{e:#}"),
            })?;

        let value = parse_model_output(&response.text)?;
        let value = if self.options.strict_schema {
            serde_json::to_value(validate_receipt(value)?)?
        } else {
            value
        };

        Ok(AnalysisOutcome {
            value,
            mime_type,
            provider: response.provider,
            model: response.model,
            latency_ms: response.latency_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockVisionProvider;
    use serde_json::json;

    const FENCED: &str = "```json\n{\"date\":\"2023-01-01\",\"name\":\"Shop\",\"currency\":\"$\",\"amount\":\"10\"}\n```";

    fn analyzer(mock: Arc<MockVisionProvider>, options: AnalyzerOptions) -> ReceiptAnalyzer {
        ReceiptAnalyzer::new(mock, options)
    }

    fn with_default_key() -> AnalyzerOptions {
        AnalyzerOptions {
            default_api_key: Some("AIza-default".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn missing_image_is_rejected_before_the_model_is_called() {
        let mock = Arc::new(MockVisionProvider::new("mock").with_response(FENCED));
        let analyzer = analyzer(mock.clone(), with_default_key());

        for body in [r#"{}"#, r#"{"image":""}"#, r#"{"image":null,"apiKey":"k"}"#] {
            let err = analyzer.analyze_body(body.as_bytes()).await.unwrap_err();
            assert!(matches!(err, ReceiptError::MissingImage), "{body}");
        }
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn missing_credential_without_default() {
        let mock = Arc::new(MockVisionProvider::new("mock").with_response(FENCED));
        let analyzer = analyzer(mock.clone(), AnalyzerOptions::default());

        let err = analyzer
            .analyze(&AnalyzeRequest::new("AAAA"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReceiptError::MissingCredential));

        let err = analyzer
            .analyze(&AnalyzeRequest::new("AAAA").with_api_key(""))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 401);
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn empty_default_key_counts_as_missing() {
        let mock = Arc::new(MockVisionProvider::new("mock").with_response(FENCED));
        let analyzer = analyzer(
            mock,
            AnalyzerOptions {
                default_api_key: Some(String::new()),
                ..Default::default()
            },
        );

        assert!(!analyzer.has_default_credential());
        let err = analyzer.analyze(&AnalyzeRequest::new("AAAA")).await.unwrap_err();
        assert!(matches!(err, ReceiptError::MissingCredential));
    }

    #[tokio::test]
    async fn caller_key_wins_over_default() {
        let mock = Arc::new(MockVisionProvider::new("mock").with_response(FENCED));
        let analyzer = analyzer(mock.clone(), with_default_key());

        analyzer
            .analyze(&AnalyzeRequest::new("AAAA").with_api_key("AIza-caller"))
            .await
            .unwrap();
        analyzer.analyze(&AnalyzeRequest::new("AAAA")).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].api_key, "AIza-caller");
        assert_eq!(requests[1].api_key, "AIza-default");
    }

    #[tokio::test]
    async fn fenced_output_is_parsed() {
        let mock = Arc::new(MockVisionProvider::new("mock").with_response(FENCED));
        let analyzer = analyzer(mock.clone(), with_default_key());

        let outcome = analyzer
            .analyze(&AnalyzeRequest::new("data:image/png;base64,AAAA"))
            .await
            .unwrap();
        assert_eq!(
            outcome.value,
            json!({"date": "2023-01-01", "name": "Shop", "currency": "$", "amount": "10"})
        );
        assert_eq!(outcome.mime_type, "image/png");

        let sent = &mock.requests()[0];
        assert_eq!(sent.image.mime_type, "image/png");
        assert_eq!(sent.image.data, "AAAA");
        assert!(sent.prompt.contains("YYYY-MM-DD"));
    }

    #[tokio::test]
    async fn output_shape_is_passed_through_by_default() {
        let mock = Arc::new(MockVisionProvider::new("mock").with_response(r#"{"total": 12.5}"#));
        let analyzer = analyzer(mock, with_default_key());

        let outcome = analyzer.analyze(&AnalyzeRequest::new("AAAA")).await.unwrap();
        assert_eq!(outcome.value, json!({"total": 12.5}));
    }

    #[tokio::test]
    async fn strict_mode_rejects_wrong_shape() {
        let mock = Arc::new(MockVisionProvider::new("mock").with_response(r#"{"total": 12.5}"#));
        let analyzer = analyzer(
            mock,
            AnalyzerOptions {
                strict_schema: true,
                ..with_default_key()
            },
        );

        let err = analyzer.analyze(&AnalyzeRequest::new("AAAA")).await.unwrap_err();
        assert_eq!(err.status_code(), 422);
    }

    #[tokio::test]
    async fn strict_mode_normalises_record() {
        let mock = Arc::new(MockVisionProvider::new("mock").with_response(
            r#"{"amount":"10","currency":"$","name":"Shop","date":"2023-01-01","note":"x"}"#,
        ));
        let analyzer = analyzer(
            mock,
            AnalyzerOptions {
                strict_schema: true,
                ..with_default_key()
            },
        );

        let outcome = analyzer.analyze(&AnalyzeRequest::new("AAAA")).await.unwrap();
        assert_eq!(
            outcome.value,
            json!({"date": "2023-01-01", "name": "Shop", "currency": "$", "amount": "10"})
        );
    }

    #[tokio::test]
    async fn prose_output_is_a_generic_failure() {
        let mock = Arc::new(MockVisionProvider::new("mock").with_response("sorry, I cannot read this"));
        let analyzer = analyzer(mock, with_default_key());

        let err = analyzer.analyze(&AnalyzeRequest::new("AAAA")).await.unwrap_err();
        assert!(matches!(err, ReceiptError::MalformedOutput(_)));
        assert_eq!(err.status_code(), 500);
        assert!(!err.details().unwrap().is_empty());
    }

    #[tokio::test]
    async fn provider_failure_becomes_upstream_error() {
        let mock = Arc::new(MockVisionProvider::new("mock").with_failure("connection refused"));
        let analyzer = analyzer(mock, with_default_key());

        let err = analyzer.analyze(&AnalyzeRequest::new("AAAA")).await.unwrap_err();
        match err {
            ReceiptError::Upstream { provider, message } => {
                assert_eq!(provider, "mock");
                assert_eq!(message, "connection refused");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_an_invalid_request() {
        let mock = Arc::new(MockVisionProvider::new("mock"));
        let analyzer = analyzer(mock, with_default_key());

        let err = analyzer.analyze_body(b"{not json").await.unwrap_err();
        assert!(matches!(err, ReceiptError::InvalidRequest(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn image_limit_is_enforced_when_configured() {
        let mock = Arc::new(MockVisionProvider::new("mock").with_response(FENCED));
        let analyzer = analyzer(
            mock.clone(),
            AnalyzerOptions {
                max_image_bytes: Some(3),
                ..with_default_key()
            },
        );

        analyzer.analyze(&AnalyzeRequest::new("AAAA")).await.unwrap();
        let err = analyzer
            .analyze(&AnalyzeRequest::new("data:image/png;base64,AAAAAAAA"))
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 413);
        assert_eq!(mock.requests().len(), 1);
    }

    #[test]
    fn from_config_uses_vision_section() {
        let vision = VisionConfig {
            api_key: Some("AIza-config".into()),
            model: Some("gemini-1.5-flash-8b".into()),
            timeout_secs: Some(30),
            ..Default::default()
        };
        let analyzer = ReceiptAnalyzer::from_config(&vision).unwrap();
        assert_eq!(analyzer.provider_name(), "gemini");
        assert_eq!(analyzer.model(), "gemini-1.5-flash-8b");
        assert!(analyzer.has_default_credential());
    }
}
