pub mod error;
pub mod traits;
pub mod types;

pub use error::ReceiptError;
pub use traits::{VisionProvider, VisionRequest, VisionResponse};
pub use types::{
    AnalyzeRequest, ErrorEnvelope, ImagePayload, ReceiptRecord, DEFAULT_IMAGE_MIME_TYPE,
};
