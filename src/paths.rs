//! Common paths for thumbfeed data storage
//!
//! thumbfeed keeps its files under ~/.config/thumbfeed/ on all platforms:
//! - config.toml - User configuration

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Get the thumbfeed data directory (~/.config/thumbfeed/)
pub fn thumbfeed_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    let dir = home.join(".config").join("thumbfeed");
    fs::create_dir_all(&dir).context("Failed to create thumbfeed directory")?;
    Ok(dir)
}

/// Get the config file path (~/.config/thumbfeed/config.toml)
pub fn config_path() -> Result<PathBuf> {
    Ok(thumbfeed_dir()?.join("config.toml"))
}
