//! Config file location and loading.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Default config file name within the config directory.
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Explicit config file path.
pub const RECEIPTFORGE_CONFIG: &str = "RECEIPTFORGE_CONFIG";

/// Config directory override.
pub const RECEIPTFORGE_CONFIG_DIR: &str = "RECEIPTFORGE_CONFIG_DIR";

/// Resolve the ReceiptForge config directory.
/// Priority: `RECEIPTFORGE_CONFIG_DIR` env > `~/.receiptforge/`
pub fn config_dir(env: &HashMap<String, String>) -> PathBuf {
    if let Some(dir) = env.get(RECEIPTFORGE_CONFIG_DIR).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".receiptforge"),
        None => PathBuf::from(".receiptforge"),
    }
}

/// Resolve the config file to read: `RECEIPTFORGE_CONFIG` if set, else
/// `config.yaml` inside [`config_dir`].
pub fn config_file_path(env: &HashMap<String, String>) -> PathBuf {
    if let Some(path) = env.get(RECEIPTFORGE_CONFIG).filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    config_dir(env).join(CONFIG_FILE_NAME)
}

/// Read the YAML config file into an untyped value tree.
///
/// Returns an empty object if the file doesn't exist.
pub async fn load_raw_config(path: &Path) -> Result<Value> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(serde_json::Map::new()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    if raw.trim().is_empty() {
        return Ok(Value::Object(serde_json::Map::new()));
    }

    let value: Value = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    match value {
        Value::Null => Ok(Value::Object(serde_json::Map::new())),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn explicit_config_path_wins() {
        let env = env(&[
            (RECEIPTFORGE_CONFIG, "/etc/receiptforge.yaml"),
            (RECEIPTFORGE_CONFIG_DIR, "/tmp/rf"),
        ]);
        assert_eq!(config_file_path(&env), PathBuf::from("/etc/receiptforge.yaml"));
    }

    #[test]
    fn config_dir_override() {
        let env = env(&[(RECEIPTFORGE_CONFIG_DIR, "/tmp/rf")]);
        assert_eq!(config_file_path(&env), PathBuf::from("/tmp/rf/config.yaml"));
    }

    #[tokio::test]
    async fn missing_file_yields_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let value = load_raw_config(&dir.path().join("absent.yaml")).await.unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[tokio::test]
    async fn empty_file_yields_empty_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();
        let value = load_raw_config(&path).await.unwrap();
        assert_eq!(value, serde_json::json!({}));
    }

    #[tokio::test]
    async fn invalid_yaml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "gateway: [unclosed").unwrap();
        let err = load_raw_config(&path).await.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config YAML"));
    }
}
