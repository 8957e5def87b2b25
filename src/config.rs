//! Application configuration.
//!
//! Handles loading, validating, and merging a `fitting-room.toml` file on top
//! of stock defaults. Every option is optional; a file need only name the
//! values it overrides. Unknown keys are rejected to catch typos early.
//!
//! ## Configuration Options
//!
//! ```toml
//! [backend]
//! endpoint = "https://generativelanguage.googleapis.com"
//! size_model = "gemini-2.5-flash"
//! image_model = "gemini-2.5-flash-image"
//! api_key_env = "API_KEY"   # Environment variable read on every call
//! timeout_secs = 120
//!
//! [retry]
//! retries = 2               # Extra attempts after the first
//! base_delay_ms = 2000      # Doubles on each retry
//!
//! [images]
//! size_estimate_edge = 800  # Longer-edge bound for size estimation
//! composite_edge = 1024     # Longer-edge bound for the composite inputs
//! quality = 90              # JPEG quality (1-100)
//!
//! [proxy]
//! endpoint = "https://images.weserv.nl/"
//! width = 1024
//! format = "jpg"
//!
//! [pacing]
//! delay_ms = 1200           # Minimum time spent in the size-estimation stage
//! ```
//!
//! The API key itself never lives in the config file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `fitting-room.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Generation backend endpoint, models and credential source.
    pub backend: BackendConfig,
    /// Retry budget for backend calls.
    pub retry: RetryConfig,
    /// Normalization bounds and encoding quality.
    pub images: ImagesConfig,
    /// Resize proxy for remote product images.
    pub proxy: ProxyConfig,
    /// Progress pacing between stages.
    pub pacing: PacingConfig,
}

impl AppConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        parse_url("backend.endpoint", &self.backend.endpoint)?;
        parse_url("proxy.endpoint", &self.proxy.endpoint)?;
        if self.backend.size_model.trim().is_empty() || self.backend.image_model.trim().is_empty() {
            return Err(ConfigError::Validation(
                "backend.size_model and backend.image_model must not be empty".into(),
            ));
        }
        if self.backend.api_key_env.trim().is_empty() {
            return Err(ConfigError::Validation(
                "backend.api_key_env must not be empty".into(),
            ));
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "backend.timeout_secs must be positive".into(),
            ));
        }
        if !(1..=100).contains(&self.images.quality) {
            return Err(ConfigError::Validation(
                "images.quality must be 1-100".into(),
            ));
        }
        if self.images.size_estimate_edge == 0 || self.images.composite_edge == 0 {
            return Err(ConfigError::Validation(
                "images edge bounds must be non-zero".into(),
            ));
        }
        if self.proxy.width == 0 {
            return Err(ConfigError::Validation("proxy.width must be non-zero".into()));
        }
        if self.proxy.format.trim().is_empty() {
            return Err(ConfigError::Validation("proxy.format must not be empty".into()));
        }
        Ok(())
    }
}

fn parse_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw)
        .map_err(|e| ConfigError::Validation(format!("{key} is not a valid URL: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation(format!(
            "{key} must be http or https, got {other}"
        ))),
    }
}

/// Generation backend settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BackendConfig {
    pub endpoint: String,
    /// Text/vision model used for size classification.
    pub size_model: String,
    /// Image model used for the composite.
    pub image_model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            size_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.5-flash-image".to_string(),
            api_key_env: "API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

impl BackendConfig {
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        parse_url("backend.endpoint", &self.endpoint)
    }
}

/// Retry budget for rate-limited backend calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    pub retries: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 2,
            base_delay_ms: 2000,
        }
    }
}

/// Normalization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    pub size_estimate_edge: u32,
    pub composite_edge: u32,
    pub quality: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            size_estimate_edge: 800,
            composite_edge: 1024,
            quality: 90,
        }
    }
}

/// Resize proxy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    pub endpoint: String,
    pub width: u32,
    pub format: String,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://images.weserv.nl/".to_string(),
            width: 1024,
            format: "jpg".to_string(),
        }
    }
}

impl ProxyConfig {
    pub fn endpoint_url(&self) -> Result<Url, ConfigError> {
        parse_url("proxy.endpoint", &self.endpoint)
    }
}

/// Perceived-progress pacing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PacingConfig {
    pub delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self { delay_ms: 1200 }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(AppConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<AppConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: AppConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `path`, or stock defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = path.map(load_raw_config).transpose()?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# fitting-room configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Generation backend
# ---------------------------------------------------------------------------
[backend]
endpoint = "https://generativelanguage.googleapis.com"

# Text/vision model that classifies the person's build into a size.
size_model = "gemini-2.5-flash"

# Image model that renders the person wearing the product.
image_model = "gemini-2.5-flash-image"

# Environment variable holding the API key. Read on every call, so a new
# key takes effect without restarting.
api_key_env = "API_KEY"

# Per-request timeout in seconds.
timeout_secs = 120

# ---------------------------------------------------------------------------
# Retry on rate limiting (HTTP 429 / quota exceeded)
# ---------------------------------------------------------------------------
[retry]
# Extra attempts after the first one.
retries = 2

# Delay before the first retry; doubles on each following retry.
base_delay_ms = 2000

# ---------------------------------------------------------------------------
# Image normalization
# ---------------------------------------------------------------------------
[images]
# Longer-edge bound (px) for the photo sent to size estimation.
size_estimate_edge = 800

# Longer-edge bound (px) for the photo and product sent to the composite call.
composite_edge = 1024

# JPEG quality (1 = worst, 100 = best).
quality = 90

# ---------------------------------------------------------------------------
# Resize proxy for remote product images
# ---------------------------------------------------------------------------
[proxy]
endpoint = "https://images.weserv.nl/"
width = 1024
format = "jpg"

# ---------------------------------------------------------------------------
# Progress pacing
# ---------------------------------------------------------------------------
[pacing]
# Minimum time (ms) spent in the size-estimation stage. 0 disables it.
delay_ms = 1200
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = AppConfig::default();
        assert_eq!(config.retry.retries, 2);
        assert_eq!(config.retry.base_delay_ms, 2000);
        assert_eq!(config.images.size_estimate_edge, 800);
        assert_eq!(config.images.composite_edge, 1024);
        assert_eq!(config.backend.api_key_env, "API_KEY");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r##"
[retry]
retries = 4
"##;
        let config: AppConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.retry.retries, 4);
        // Defaults preserved
        assert_eq!(config.retry.base_delay_ms, 2000);
        assert_eq!(config.pacing.delay_ms, 1200);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let toml = r##"
[images]
max_edge = 512
"##;
        assert!(toml::from_str::<AppConfig>(toml).is_err());
    }

    #[test]
    fn stock_config_toml_matches_defaults() {
        let parsed: AppConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(parsed, AppConfig::default());
    }

    // =========================================================================
    // merge_toml tests
    // =========================================================================

    #[test]
    fn merge_overrides_nested_keys_only() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str("[images]\nquality = 75").unwrap();
        let config: AppConfig = merge_toml(base, overlay).try_into().unwrap();
        assert_eq!(config.images.quality, 75);
        assert_eq!(config.images.composite_edge, 1024);
    }

    #[test]
    fn merge_replaces_scalars() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    // =========================================================================
    // load_config tests
    // =========================================================================

    #[test]
    fn load_config_without_path_uses_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fitting-room.toml");
        fs::write(&path, "[pacing]\ndelay_ms = 0\n[backend]\napi_key_env = \"GEMINI_KEY\"\n")
            .unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.pacing.delay_ms, 0);
        assert_eq!(config.backend.api_key_env, "GEMINI_KEY");
        assert_eq!(config.backend.size_model, "gemini-2.5-flash");
    }

    #[test]
    fn load_config_missing_file_errors() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(tmp.path().join("absent.toml").as_path()));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn load_config_rejects_invalid_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("fitting-room.toml");
        fs::write(&path, "[images]\nquality = 0\n").unwrap();

        let result = load_config(Some(path.as_path()));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_non_http_endpoint() {
        let mut config = AppConfig::default();
        config.proxy.endpoint = "ftp://proxy.example.com".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(m)) if m.contains("proxy.endpoint")));
    }

    #[test]
    fn validate_rejects_zero_edges() {
        let mut config = AppConfig::default();
        config.images.composite_edge = 0;
        assert!(config.validate().is_err());
    }
}
