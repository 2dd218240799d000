//! Configuration module for thumbfeed

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::Path;
use std::path::PathBuf;

use crate::theme::Theme;

/// Feed shown when nothing else is configured
pub const DEFAULT_FEED_URL: &str = "http://www.imooc.com/api/teacher?type=4&num=30";

/// Configuration values that cannot produce a working loader
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// Cache fraction outside (0, 1]
    #[error("cache_fraction must be in (0, 1], got {0}")]
    InvalidCacheFraction(f64),
    /// Memory limit and fraction leave no room for the cache
    #[error("cache budget is zero (memory_limit_mb = {memory_limit_mb}, cache_fraction = {cache_fraction})")]
    ZeroBudget {
        /// Configured memory limit
        memory_limit_mb: u64,
        /// Configured fraction
        cache_fraction: f64,
    },
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Selected theme
    #[serde(default)]
    pub theme: Theme,

    /// JSON feed listing the items to show
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// Memory the thumbnail cache may take a share of, in MiB
    #[serde(default = "default_memory_limit_mb")]
    pub memory_limit_mb: u64,

    /// Share of `memory_limit_mb` given to the thumbnail cache
    #[serde(default = "default_cache_fraction")]
    pub cache_fraction: f64,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Largest thumbnail body accepted, in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Quiet time after the last scroll input before the list counts as settled
    #[serde(default = "default_settle_delay")]
    pub settle_delay_ms: u64,

    /// Whether to render thumbnails with terminal graphics
    #[serde(default = "default_show_thumbnails")]
    pub show_thumbnails: bool,
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_memory_limit_mb() -> u64 {
    512
}

fn default_cache_fraction() -> f64 {
    0.25
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    crate::images::DEFAULT_MAX_BODY_BYTES
}

fn default_settle_delay() -> u64 {
    250
}

fn default_show_thumbnails() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            feed_url: default_feed_url(),
            memory_limit_mb: default_memory_limit_mb(),
            cache_fraction: default_cache_fraction(),
            request_timeout_secs: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
            settle_delay_ms: default_settle_delay(),
            show_thumbnails: default_show_thumbnails(),
        }
    }
}

impl Config {
    /// Get the default config file path
    pub fn default_path() -> Result<PathBuf> {
        crate::paths::config_path()
    }

    /// Load config from the default path or create default
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// Load config from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    /// Save config to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Byte budget for the thumbnail cache.
    pub fn cache_budget_bytes(&self) -> Result<NonZeroUsize, ConfigError> {
        let fraction = self.cache_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::InvalidCacheFraction(fraction));
        }

        let limit = self.memory_limit_mb.saturating_mul(1024 * 1024);
        let budget = (limit as f64 * fraction) as usize;
        NonZeroUsize::new(budget).ok_or(ConfigError::ZeroBudget {
            memory_limit_mb: self.memory_limit_mb,
            cache_fraction: fraction,
        })
    }
}
