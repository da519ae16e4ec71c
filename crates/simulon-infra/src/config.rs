//! Configuration loader for Simulon.
//!
//! Reads `config.toml` from the data directory (`~/.simulon/` in production)
//! and deserializes it into [`SimulonConfig`]. Falls back to defaults when the
//! file is missing or malformed. A few environment variables override the
//! file on top.

use std::path::{Path, PathBuf};

use secrecy::SecretString;

use simulon_types::config::SimulonConfig;

pub const DATA_DIR_ENV: &str = "SIMULON_DATA_DIR";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const MODEL_ENV: &str = "SIMULON_MODEL";
pub const BASE_URL_ENV: &str = "SIMULON_BASE_URL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{API_KEY_ENV} is not set")]
    MissingApiKey,
}

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `SIMULON_DATA_DIR` environment variable
/// 2. `~/.simulon`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".simulon");
    }

    PathBuf::from(".simulon")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`SimulonConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
pub async fn load_config(data_dir: &Path) -> SimulonConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return SimulonConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return SimulonConfig::default();
        }
    };

    match toml::from_str::<SimulonConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            SimulonConfig::default()
        }
    }
}

/// Apply `SIMULON_MODEL` / `SIMULON_BASE_URL` from the process environment.
pub fn apply_env_overrides(config: &mut SimulonConfig) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

fn apply_overrides_from(config: &mut SimulonConfig, lookup: impl Fn(&str) -> Option<String>) {
    let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(model) = present(MODEL_ENV) {
        tracing::debug!(%model, "model overridden from environment");
        config.provider.model = model;
    }
    if let Some(base_url) = present(BASE_URL_ENV) {
        tracing::debug!(%base_url, "base URL overridden from environment");
        config.provider.base_url = base_url;
    }
}

/// The provider API key from `OPENAI_API_KEY`.
pub fn api_key_from_env() -> Result<SecretString, ConfigError> {
    api_key_from(std::env::var(API_KEY_ENV).ok())
}

fn api_key_from(value: Option<String>) -> Result<SecretString, ConfigError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(SecretString::from(key.trim().to_string())),
        _ => Err(ConfigError::MissingApiKey),
    }
}
