//! `receiptforge-config` — ReceiptForge runtime configuration management.
//!
//! Provides:
//! - Typed config schema (gateway, vision provider, logging)
//! - Optional YAML config file
//! - `${ENV_VAR}` substitution and well-known env overrides
//! - Default value application
//! - Validation and redaction for safe logging

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{apply_env_overrides_with, process_env, resolve_env_vars_with, MissingEnvVarError};
pub use io::{config_dir, config_file_path, load_raw_config};
pub use redact::redact;
pub use schema::{GatewayConfig, LoggingConfig, ReceiptForgeConfig, VisionConfig};
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Load, substitute env vars, apply overrides and defaults, and validate.
///
/// `path` defaults to [`config_file_path`] of the process environment.
/// This is the main entry point for loading a config at runtime.
pub async fn load_and_prepare(path: Option<&Path>) -> Result<ReceiptForgeConfig> {
    let env = process_env();
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => config_file_path(&env),
    };
    load_and_prepare_with(&path, &env).await
}

/// Same as [`load_and_prepare`] with an explicit environment map.
pub async fn load_and_prepare_with(
    path: &Path,
    env: &HashMap<String, String>,
) -> Result<ReceiptForgeConfig> {
    let raw = load_raw_config(path).await?;

    let value = resolve_env_vars_with(&raw, env).context("Failed to resolve env vars in config")?;

    let config: ReceiptForgeConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_env_overrides_with(config, env);
    let config = apply_all_defaults(config);

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        let first = &report.errors[0];
        anyhow::bail!("invalid configuration: {first}");
    }

    Ok(config)
}
