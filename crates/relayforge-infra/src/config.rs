//! Service configuration loader for relayforge.
//!
//! Reads `config.toml` from the data directory (`~/.relayforge/` in production)
//! and deserializes it into [`ServiceConfig`]. Falls back to defaults when the
//! file is missing or malformed.

use std::path::Path;

use relayforge_types::config::ServiceConfig;

/// Smallest collaborator deadline accepted from configuration.
const MIN_TIMEOUT_SECS: u64 = 1;

/// Load service configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`ServiceConfig::default()`].
/// - If the file exists but fails to parse, logs a warning and returns the default.
/// - If the file parses, out-of-range values are clamped.
pub async fn load_service_config(data_dir: &Path) -> ServiceConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return ServiceConfig::default();
        }
    };

    match toml::from_str::<ServiceConfig>(&content) {
        Ok(config) => normalize(config),
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            ServiceConfig::default()
        }
    }
}

fn normalize(mut config: ServiceConfig) -> ServiceConfig {
    config.customize_timeout_secs = config.customize_timeout_secs.max(MIN_TIMEOUT_SECS);
    config.shellcode_timeout_secs = config.shellcode_timeout_secs.max(MIN_TIMEOUT_SECS);
    config.max_per_page = config.max_per_page.max(1);
    config.default_per_page = config.default_per_page.clamp(1, config.max_per_page);
    config
}
