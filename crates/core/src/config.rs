use std::path::Path;

use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;
use tracing::debug;

/// Root application configuration. Loaded from environment variables
/// with the prefix `MINI_CRM__` and an optional TOML config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Bearer token sent with every request. Supplied explicitly by the
    /// caller; never looked up from ambient storage.
    #[serde(default)]
    pub token: Option<String>,
}

// ─── Segmentation Config ────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct SegmentationConfig {
    /// Inactivity reported for customers that have never been active.
    #[serde(default = "default_never_active_days")]
    pub never_active_days: f64,
}

fn default_base_url() -> String {
    "https://mini-crm-eg7w.onrender.com/api".to_string()
}
fn default_timeout_ms() -> u64 {
    10_000
}
fn default_never_active_days() -> f64 {
    9999.0
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            token: None,
        }
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            never_active_days: default_never_active_days(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from an optional TOML file, with environment
    /// variables taking precedence over file values.
    pub fn load_from(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading config file");
            builder = builder.add_source(config::File::from(path).required(true));
        }
        Self::build(builder.add_source(
            config::Environment::with_prefix("MINI_CRM")
                .separator("__")
                .try_parsing(true),
        ))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, config::ConfigError> {
        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{File, FileFormat};

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "https://mini-crm-eg7w.onrender.com/api");
        assert_eq!(config.api.timeout_ms, 10_000);
        assert!(config.api.token.is_none());
        assert_eq!(config.segmentation.never_active_days, 9999.0);
    }

    #[test]
    fn test_toml_overrides_keep_remaining_defaults() {
        let builder = config::Config::builder().add_source(File::from_str(
            r#"
            [api]
            base_url = "http://localhost:5000/api"
            token = "secret"

            [segmentation]
            never_active_days = 365.0
            "#,
            FileFormat::Toml,
        ));
        let config = AppConfig::build(builder).unwrap();

        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.token.as_deref(), Some("secret"));
        assert_eq!(config.api.timeout_ms, 10_000);
        assert_eq!(config.segmentation.never_active_days, 365.0);
    }

    #[test]
    fn test_empty_sources_give_defaults() {
        let config = AppConfig::build(config::Config::builder()).unwrap();
        assert_eq!(config.api.timeout_ms, 10_000);
    }
}
