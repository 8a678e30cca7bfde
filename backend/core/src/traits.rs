use anyhow::Result;
use async_trait::async_trait;

use crate::types::ImagePayload;

/// Trait for vision-capable language models used by the analyzer.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Provider name (e.g., "gemini", "mock").
    fn name(&self) -> &str;

    /// Model identifier the provider sends requests to.
    fn model(&self) -> &str;

    /// Send one multimodal completion request and return the response text.
    async fn complete(&self, request: &VisionRequest) -> Result<VisionResponse>;
}

/// A single prompt + inline image request.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub api_key: String,
    pub prompt: String,
    pub image: ImagePayload,
}

/// Response from a vision provider.
#[derive(Debug, Clone)]
pub struct VisionResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
}
