//! Config validation: schema checks with user-friendly error messages.

use crate::schema::ReceiptForgeConfig;
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &ReceiptForgeConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_gateway(config, &mut report);
    validate_vision(config, &mut report);
    report
}

fn validate_gateway(config: &ReceiptForgeConfig, report: &mut ValidationReport) {
    let gw = &config.gateway;
    if let Some(port) = gw.port {
        if port == 0 {
            report.error("gateway.port", "Port must be > 0");
        } else if port < 1024 && port != 80 && port != 443 {
            report.warn(
                "gateway.port",
                format!("Port {port} requires elevated privileges; consider using a port >= 1024"),
            );
        }
    }
    if gw.max_body_bytes == Some(0) {
        report.error("gateway.maxBodyBytes", "maxBodyBytes must be > 0");
    }
}

fn validate_vision(config: &ReceiptForgeConfig, report: &mut ValidationReport) {
    let vision = &config.vision;

    if vision.api_key().is_none() {
        report.warn(
            "vision.apiKey",
            "No default credential configured; callers must supply apiKey",
        );
    }
    if vision.model().trim().is_empty() {
        report.error("vision.model", "Model id cannot be empty");
    }
    let base_url = vision.base_url();
    if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
        report.error(
            "vision.baseUrl",
            format!("Base URL '{base_url}' must start with http:// or https://"),
        );
    }
    if vision.timeout_secs == Some(0) {
        report.error("vision.timeoutSecs", "timeoutSecs must be > 0 when set");
    }
    if let Some(limit) = vision.max_image_bytes {
        if limit == 0 {
            report.error("vision.maxImageBytes", "maxImageBytes must be > 0 when set");
        } else if limit > config.gateway.max_body_bytes() {
            report.warn(
                "vision.maxImageBytes",
                "maxImageBytes exceeds gateway.maxBodyBytes; the body limit applies first",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{GatewayConfig, VisionConfig};

    #[test]
    fn default_config_is_valid_with_credential_warning() {
        let report = validate(&ReceiptForgeConfig::default());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.iter().any(|w| w.path == "vision.apiKey"));
    }

    #[test]
    fn zero_timeout_is_error() {
        let cfg = ReceiptForgeConfig {
            vision: VisionConfig {
                api_key: Some("AIza-test".into()),
                timeout_secs: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "vision.timeoutSecs");
    }

    #[test]
    fn non_http_base_url_is_error() {
        let cfg = ReceiptForgeConfig {
            vision: VisionConfig {
                base_url: Some("ftp://example.com".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.errors.iter().any(|e| e.path == "vision.baseUrl"));
    }

    #[test]
    fn image_limit_above_body_limit_warns() {
        let cfg = ReceiptForgeConfig {
            gateway: GatewayConfig {
                max_body_bytes: Some(1024),
                ..Default::default()
            },
            vision: VisionConfig {
                max_image_bytes: Some(4096),
                ..Default::default()
            },
            ..Default::default()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert!(report.warnings.iter().any(|w| w.path == "vision.maxImageBytes"));
    }
}
