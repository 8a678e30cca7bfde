//! Receipt understanding: turns a base64 receipt image into a JSON record
//! using a vision language model.

pub mod analyzer;
pub mod cleanup;
pub mod data_uri;
pub mod gemini;
pub mod mime;
pub mod mock;
pub mod prompt;
pub mod schema;

pub use analyzer::{AnalysisOutcome, AnalyzerOptions, ReceiptAnalyzer};
pub use cleanup::{parse_model_output, strip_code_fences};
pub use data_uri::{check_image_size, decode_image};
pub use gemini::GeminiProvider;
pub use mime::detect_image_mime_type;
pub use mock::MockVisionProvider;
pub use prompt::{build_receipt_prompt, receipt_prompt_for_today};
pub use schema::validate_receipt;
