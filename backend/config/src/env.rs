//! Environment variable substitution and overrides for config values.
//!
//! Supports `${VAR_NAME}` syntax in string values, resolved at load time.
//! Only uppercase `[A-Z_][A-Z0-9_]*` variable names are matched.
//! After substitution, well-known variables override individual fields.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use crate::schema::ReceiptForgeConfig;

/// Pattern matching valid uppercase env var names.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap());

/// Default credential for the vision provider.
pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
pub const RECEIPTFORGE_BIND: &str = "RECEIPTFORGE_BIND";
pub const RECEIPTFORGE_PORT: &str = "RECEIPTFORGE_PORT";
pub const RECEIPTFORGE_MODEL: &str = "RECEIPTFORGE_MODEL";
pub const RECEIPTFORGE_GEMINI_BASE_URL: &str = "RECEIPTFORGE_GEMINI_BASE_URL";
pub const RECEIPTFORGE_TIMEOUT_SECS: &str = "RECEIPTFORGE_TIMEOUT_SECS";
pub const RECEIPTFORGE_MAX_IMAGE_BYTES: &str = "RECEIPTFORGE_MAX_IMAGE_BYTES";
pub const RECEIPTFORGE_STRICT_SCHEMA: &str = "RECEIPTFORGE_STRICT_SCHEMA";
pub const RECEIPTFORGE_LOG_DIR: &str = "RECEIPTFORGE_LOG_DIR";
pub const RUST_LOG: &str = "RUST_LOG";

/// Error returned for missing env vars.
#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Snapshot of the process environment.
pub fn process_env() -> HashMap<String, String> {
    std::env::vars().collect()
}

/// Substitute `${VAR}` references in a config JSON value tree.
///
/// Only string leaves are processed. A reference to an unset or empty
/// variable is an error.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    substitute_value(value, env, "")
}

fn substitute_value(value: &Value, env: &HashMap<String, String>, path: &str) -> Result<Value> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => {
            let result: Result<Vec<_>> = arr
                .iter()
                .enumerate()
                .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
                .collect();
            Ok(Value::Array(result?))
        }
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(s: &str, env: &HashMap<String, String>, path: &str) -> Result<String> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &regex::Captures| {
        let var_name = &caps[1];
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    if let Some(err) = missing {
        bail!(err);
    }
    Ok(substituted.into_owned())
}

/// Apply well-known environment variables on top of a loaded config.
///
/// Unparseable numeric or boolean values are ignored with a warning.
pub fn apply_env_overrides_with(
    mut config: ReceiptForgeConfig,
    env: &HashMap<String, String>,
) -> ReceiptForgeConfig {
    let get = |name: &str| env.get(name).filter(|v| !v.is_empty()).cloned();

    if let Some(key) = get(GEMINI_API_KEY) {
        config.vision.api_key = Some(key);
    }
    if let Some(bind) = get(RECEIPTFORGE_BIND) {
        config.gateway.bind = Some(bind);
    }
    if let Some(port) = parse_var(env, RECEIPTFORGE_PORT) {
        config.gateway.port = Some(port);
    }
    if let Some(model) = get(RECEIPTFORGE_MODEL) {
        config.vision.model = Some(model);
    }
    if let Some(url) = get(RECEIPTFORGE_GEMINI_BASE_URL) {
        config.vision.base_url = Some(url);
    }
    if let Some(secs) = parse_var(env, RECEIPTFORGE_TIMEOUT_SECS) {
        config.vision.timeout_secs = Some(secs);
    }
    if let Some(bytes) = parse_var(env, RECEIPTFORGE_MAX_IMAGE_BYTES) {
        config.vision.max_image_bytes = Some(bytes);
    }
    if let Some(strict) = parse_var(env, RECEIPTFORGE_STRICT_SCHEMA) {
        config.vision.strict_schema = Some(strict);
    }
    if let Some(dir) = get(RECEIPTFORGE_LOG_DIR) {
        config.logging.dir = Some(dir);
    }
    if let Some(level) = get(RUST_LOG) {
        config.logging.level = Some(level);
    }

    config
}

fn parse_var<T: std::str::FromStr>(env: &HashMap<String, String>, name: &str) -> Option<T> {
    let raw = env.get(name).filter(|v| !v.is_empty())?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!(var = name, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_nested_var() {
        let v = json!({"vision": {"apiKey": "${MY_GEMINI_KEY}"}});
        let result = resolve_env_vars_with(&v, &env(&[("MY_GEMINI_KEY", "AIza-test")])).unwrap();
        assert_eq!(result["vision"]["apiKey"], "AIza-test");
    }

    #[test]
    fn error_on_missing_var_names_the_path() {
        let v = json!({"vision": {"apiKey": "${MISSING_VAR}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("MISSING_VAR"));
        assert!(err.contains("vision.apiKey"));
    }

    #[test]
    fn passthrough_non_var_strings_and_numbers() {
        let v = json!({"model": "gemini-1.5-flash", "port": 8080});
        let result = resolve_env_vars_with(&v, &HashMap::new()).unwrap();
        assert_eq!(result, v);
    }

    #[test]
    fn gemini_key_becomes_default_credential() {
        let cfg = apply_env_overrides_with(
            ReceiptForgeConfig::default(),
            &env(&[(GEMINI_API_KEY, "AIza-default")]),
        );
        assert_eq!(cfg.vision.api_key(), Some("AIza-default"));
    }

    #[test]
    fn numeric_and_boolean_overrides() {
        let cfg = apply_env_overrides_with(
            ReceiptForgeConfig::default(),
            &env(&[
                (RECEIPTFORGE_PORT, "9100"),
                (RECEIPTFORGE_TIMEOUT_SECS, "30"),
                (RECEIPTFORGE_STRICT_SCHEMA, "true"),
            ]),
        );
        assert_eq!(cfg.gateway.port(), 9100);
        assert_eq!(cfg.vision.timeout_secs, Some(30));
        assert!(cfg.vision.strict_schema());
    }

    #[test]
    fn unparseable_override_is_ignored() {
        let cfg = apply_env_overrides_with(
            ReceiptForgeConfig::default(),
            &env(&[(RECEIPTFORGE_PORT, "not-a-port")]),
        );
        assert!(cfg.gateway.port.is_none());
    }
}
