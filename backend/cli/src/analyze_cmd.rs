//! CLI Analyze Command
//!
//! Runs a single receipt image through the analyzer in-process.

use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use receiptforge_config::ReceiptForgeConfig;
use receiptforge_core::AnalyzeRequest;
use receiptforge_understanding::{detect_image_mime_type, ReceiptAnalyzer};

/// Read `path` and encode it as a `data:<mime>;base64,...` URI.
pub async fn encode_image_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mime_type = detect_image_mime_type(path);
    Ok(format!("data:{mime_type};base64,{}", STANDARD.encode(bytes)))
}

/// Prints the result (or the error envelope) and returns whether it succeeded.
pub async fn run(config: &ReceiptForgeConfig, path: &Path, api_key: Option<String>) -> Result<bool> {
    let analyzer = ReceiptAnalyzer::from_config(&config.vision)?;

    let mut request = AnalyzeRequest::new(encode_image_file(path).await?);
    if let Some(key) = api_key {
        request = request.with_api_key(key);
    }

    match analyzer.analyze(&request).await {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome.value)?);
            Ok(true)
        }
        Err(err) => {
            eprintln!("{}", serde_json::to_string_pretty(&err.to_envelope())?);
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn encodes_file_with_detected_mime_type() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG").unwrap();

        let uri = encode_image_file(file.path()).await.unwrap();
        assert_eq!(uri, "data:image/png;base64,iVBORw==");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = encode_image_file(Path::new("/nonexistent/receipt.jpg"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("receipt.jpg"));
    }
}
