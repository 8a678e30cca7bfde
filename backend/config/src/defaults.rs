//! Config defaults: applies default values to parsed config.

use crate::schema::ReceiptForgeConfig;

/// Default gateway bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Default gateway port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default HTTP body limit (Gemini's inline data ceiling is 20 MB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Cost-optimised multimodal model used for receipt extraction.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Gemini REST API root.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default `tracing` filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Apply all defaults to a freshly loaded config.
///
/// Optional limits (`timeoutSecs`, `maxImageBytes`) are left unset.
pub fn apply_all_defaults(config: ReceiptForgeConfig) -> ReceiptForgeConfig {
    let config = apply_gateway_defaults(config);
    let config = apply_vision_defaults(config);
    apply_logging_defaults(config)
}

fn apply_gateway_defaults(mut config: ReceiptForgeConfig) -> ReceiptForgeConfig {
    let gw = &mut config.gateway;
    gw.bind.get_or_insert_with(|| DEFAULT_BIND_ADDRESS.to_string());
    gw.port.get_or_insert(DEFAULT_PORT);
    gw.max_body_bytes.get_or_insert(DEFAULT_MAX_BODY_BYTES);
    gw.cors_permissive.get_or_insert(false);
    config
}

fn apply_vision_defaults(mut config: ReceiptForgeConfig) -> ReceiptForgeConfig {
    let vision = &mut config.vision;
    vision.model.get_or_insert_with(|| DEFAULT_MODEL.to_string());
    vision
        .base_url
        .get_or_insert_with(|| DEFAULT_GEMINI_BASE_URL.to_string());
    vision.strict_schema.get_or_insert(false);
    config
}

fn apply_logging_defaults(mut config: ReceiptForgeConfig) -> ReceiptForgeConfig {
    let logging = &mut config.logging;
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(false);
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::VisionConfig;

    #[test]
    fn fills_model_and_port() {
        let cfg = apply_all_defaults(ReceiptForgeConfig::default());
        assert_eq!(cfg.vision.model.as_deref(), Some(DEFAULT_MODEL));
        assert_eq!(cfg.gateway.port, Some(DEFAULT_PORT));
        assert_eq!(cfg.gateway.max_body_bytes, Some(DEFAULT_MAX_BODY_BYTES));
    }

    #[test]
    fn leaves_optional_limits_unset() {
        let cfg = apply_all_defaults(ReceiptForgeConfig::default());
        assert!(cfg.vision.timeout_secs.is_none());
        assert!(cfg.vision.max_image_bytes.is_none());
        assert!(cfg.vision.api_key.is_none());
    }

    #[test]
    fn does_not_override_user_model() {
        let cfg = ReceiptForgeConfig {
            vision: VisionConfig {
                model: Some("gemini-2.0-flash".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg);
        assert_eq!(cfg.vision.model(), "gemini-2.0-flash");
    }
}
