//! Service configuration types for relayforge.
//!
//! `ServiceConfig` represents the top-level `config.toml` that controls the
//! customizer deadline, collaborator endpoints, and listing limits.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration for the relay build service.
///
/// Loaded from `~/.relayforge/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Deadline for one customizer call, in seconds.
    #[serde(default = "default_customize_timeout_secs")]
    pub customize_timeout_secs: u64,

    /// Base URL of the gateway-side customization endpoint.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// External shellcode converter executable. Shellcode builds fail
    /// when unset.
    #[serde(default)]
    pub shellcode_tool: Option<PathBuf>,

    /// Extra arguments passed to the shellcode converter before the
    /// generated ones.
    #[serde(default)]
    pub shellcode_tool_args: Vec<String>,

    /// Deadline for one shellcode converter run, in seconds. The converter
    /// is killed when it passes.
    #[serde(default = "default_shellcode_timeout_secs")]
    pub shellcode_timeout_secs: u64,

    /// Scratch directory for shellcode conversion (system temp dir if unset).
    #[serde(default)]
    pub temp_dir: Option<PathBuf>,

    #[serde(default = "default_per_page")]
    pub default_per_page: u32,

    #[serde(default = "default_max_per_page")]
    pub max_per_page: u32,
}

fn default_customize_timeout_secs() -> u64 {
    120
}

fn default_shellcode_timeout_secs() -> u64 {
    60
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:52935".to_string()
}

fn default_per_page() -> u32 {
    10
}

fn default_max_per_page() -> u32 {
    100
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            customize_timeout_secs: default_customize_timeout_secs(),
            gateway_url: default_gateway_url(),
            shellcode_tool: None,
            shellcode_tool_args: Vec::new(),
            shellcode_timeout_secs: default_shellcode_timeout_secs(),
            temp_dir: None,
            default_per_page: default_per_page(),
            max_per_page: default_max_per_page(),
        }
    }
}

impl ServiceConfig {
    pub fn customize_timeout(&self) -> Duration {
        Duration::from_secs(self.customize_timeout_secs)
    }

    pub fn shellcode_timeout(&self) -> Duration {
        Duration::from_secs(self.shellcode_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_config_default_values() {
        let config = ServiceConfig::default();
        assert_eq!(config.customize_timeout(), Duration::from_secs(120));
        assert_eq!(config.default_per_page, 10);
        assert!(config.shellcode_tool.is_none());
        assert_eq!(config.shellcode_timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_service_config_deserialize_with_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config, ServiceConfig::default());
    }

    #[test]
    fn test_service_config_deserialize_with_values() {
        let toml_str = r#"
customize_timeout_secs = 30
gateway_url = "http://10.0.0.5:52935"
shellcode_tool = "/opt/donut/donut"
shellcode_tool_args = ["-t"]
shellcode_timeout_secs = 15
max_per_page = 50
"#;
        let config: ServiceConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.customize_timeout_secs, 30);
        assert_eq!(config.gateway_url, "http://10.0.0.5:52935");
        assert_eq!(
            config.shellcode_tool.as_deref(),
            Some(std::path::Path::new("/opt/donut/donut"))
        );
        assert_eq!(config.shellcode_tool_args, vec!["-t".to_string()]);
        assert_eq!(config.shellcode_timeout_secs, 15);
        assert_eq!(config.max_per_page, 50);
        assert_eq!(config.default_per_page, 10);
    }
}
