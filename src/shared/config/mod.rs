//! Engine configuration module
//!
//! Tunables for the conversation engine: debounce windows, the at-bottom
//! threshold and display limits. Values come from defaults, an optional
//! TOML file, and the `ROOMCHAT_API_URL` environment variable.
//!
//! ```toml
//! server_url = "https://chat.example.com"
//! typing_quiet_period_ms = 1000
//! unread_clear_delay_ms = 3000
//! bottom_threshold_px = 150.0
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default channel endpoint
pub const DEFAULT_SERVER_URL: &str = "http://localhost:3001";

/// Environment variable overriding `server_url`
pub const SERVER_URL_ENV: &str = "ROOMCHAT_API_URL";

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Channel endpoint handed to the transport
    pub server_url: String,
    /// Quiet period after the last keystroke before `stopTyping`
    pub typing_quiet_period_ms: u64,
    /// Peers whose typing entry is not refreshed within this window are dropped
    pub typing_expiry_ms: u64,
    /// Debounce before clearing unread state once the viewport reaches the bottom
    pub unread_clear_delay_ms: u64,
    /// Delay before clearing unread state after the banner is activated
    pub banner_grace_delay_ms: u64,
    /// Distance from the bottom (px) still counted as "at bottom"
    pub bottom_threshold_px: f64,
    /// Names shown before collapsing to "N others"
    pub max_visible_typing: usize,
    /// Avatar slots in the room header, one of which is the overflow bubble
    pub max_visible_avatars: usize,
    /// Character budget for the quoted reply snippet
    pub reply_preview_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            typing_quiet_period_ms: 1000,
            typing_expiry_ms: 10_000,
            unread_clear_delay_ms: 3000,
            banner_grace_delay_ms: 1000,
            bottom_threshold_px: 150.0,
            max_visible_typing: 2,
            max_visible_avatars: 3,
            reply_preview_len: 30,
        }
    }
}

impl EngineConfig {
    /// Create a new EngineConfigBuilder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Parse a TOML document; missing keys keep their defaults
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file, then apply the environment override
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut config = Self::from_toml_str(&raw)?;
        config.apply_env();
        Ok(config)
    }

    /// Load from [`EngineConfig::default_path`], or defaults if no file exists
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => {
                let mut config = Self::default();
                config.apply_env();
                Ok(config)
            }
        }
    }

    /// Platform config location: `<config_dir>/roomchat/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("roomchat");
        path.push("config.toml");
        Some(path)
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.trim().is_empty() {
                tracing::debug!("[Config] {} overrides server_url", SERVER_URL_ENV);
                self.server_url = url;
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.server_url.starts_with("http://")
            || self.server_url.starts_with("https://")
            || self.server_url.starts_with("ws://")
            || self.server_url.starts_with("wss://"))
        {
            return Err(ConfigError::InvalidUrl(self.server_url.clone()));
        }
        let durations = [
            ("typing_quiet_period_ms", self.typing_quiet_period_ms),
            ("typing_expiry_ms", self.typing_expiry_ms),
            ("unread_clear_delay_ms", self.unread_clear_delay_ms),
            ("banner_grace_delay_ms", self.banner_grace_delay_ms),
        ];
        for (name, value) in durations {
            if value == 0 {
                return Err(ConfigError::InvalidValue {
                    field: name,
                    message: "must be greater than zero".to_string(),
                });
            }
        }
        if !(self.bottom_threshold_px > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "bottom_threshold_px",
                message: "must be positive".to_string(),
            });
        }
        if self.max_visible_avatars < 1 {
            return Err(ConfigError::InvalidValue {
                field: "max_visible_avatars",
                message: "needs at least one slot".to_string(),
            });
        }
        Ok(())
    }

    pub fn typing_quiet_period(&self) -> Duration {
        Duration::from_millis(self.typing_quiet_period_ms)
    }

    pub fn typing_expiry(&self) -> Duration {
        Duration::from_millis(self.typing_expiry_ms)
    }

    pub fn unread_clear_delay(&self) -> Duration {
        Duration::from_millis(self.unread_clear_delay_ms)
    }

    pub fn banner_grace_delay(&self) -> Duration {
        Duration::from_millis(self.banner_grace_delay_ms)
    }
}

/// Builder for EngineConfig
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the server URL
    pub fn server_url(mut self, url: impl Into<String>) -> Self {
        self.config.server_url = url.into();
        self
    }

    pub fn typing_quiet_period(mut self, period: Duration) -> Self {
        self.config.typing_quiet_period_ms = period.as_millis() as u64;
        self
    }

    pub fn typing_expiry(mut self, expiry: Duration) -> Self {
        self.config.typing_expiry_ms = expiry.as_millis() as u64;
        self
    }

    pub fn unread_clear_delay(mut self, delay: Duration) -> Self {
        self.config.unread_clear_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn banner_grace_delay(mut self, delay: Duration) -> Self {
        self.config.banner_grace_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn bottom_threshold_px(mut self, px: f64) -> Self {
        self.config.bottom_threshold_px = px;
        self
    }

    pub fn max_visible_typing(mut self, count: usize) -> Self {
        self.config.max_visible_typing = count;
        self
    }

    pub fn max_visible_avatars(mut self, count: usize) -> Self {
        self.config.max_visible_avatars = count;
        self
    }

    pub fn reply_preview_len(mut self, len: usize) -> Self {
        self.config.reply_preview_len = len;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
    #[error("failed to read {path:?}: {message}")]
    Io { path: PathBuf, message: String },
    #[error("failed to parse config: {0}")]
    Parse(String),
}
