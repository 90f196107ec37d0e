use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(String),

    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_user_agent: String,
    pub page_size: usize,
    pub fetch_timeout_seconds: u64,
    pub retry_countdown_seconds: u32,
    pub search_debounce_ms: u64,
    pub price_ceiling_fallback: f64,
    pub low_stock_threshold: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            request_user_agent: "StorefrontCatalog/0.1".to_string(),
            page_size: 12,
            fetch_timeout_seconds: 10,
            retry_countdown_seconds: 45,
            search_debounce_ms: 300,
            price_ceiling_fallback: 1000.0,
            low_stock_threshold: 5,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base_url must not be empty".into()));
        }
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be at least 1".into()));
        }
        if self.fetch_timeout_seconds == 0 {
            return Err(ConfigError::Invalid("fetch_timeout_seconds must be at least 1".into()));
        }
        if self.retry_countdown_seconds == 0 {
            return Err(ConfigError::Invalid("retry_countdown_seconds must be at least 1".into()));
        }
        if !self.price_ceiling_fallback.is_finite() || self.price_ceiling_fallback < 0.0 {
            return Err(ConfigError::Invalid(
                "price_ceiling_fallback must be a non-negative number".into(),
            ));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_seconds)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

pub fn load_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }
    let content = fs::read_to_string(path)?;
    let config = load_config_from_str(&content)?;
    Ok(config)
}

/// Parses and validates a JSON config document.
pub fn load_config_from_str(json: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(json)?;
    config.validate()?;
    Ok(config)
}
