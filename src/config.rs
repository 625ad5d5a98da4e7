// Configuration loading.
// Reads config.toml from the user config directory, falling back to defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::cache::{self, DEFAULT_CAPACITY};
use crate::error::Result;
use crate::github::GITHUB_API_BASE;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the GitHub REST API.
    pub api_base: String,
    /// Quiet period after the last keystroke before searching.
    pub debounce_ms: u64,
    /// Number of avatar payloads kept in memory.
    pub image_cache_capacity: usize,
    /// Fallback log filter when RUST_LOG is unset.
    pub log_level: String,
    /// Override for the favorites file location.
    pub favorites_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: GITHUB_API_BASE.to_string(),
            debounce_ms: 500,
            image_cache_capacity: DEFAULT_CAPACITY,
            log_level: "info".to_string(),
            favorites_path: None,
        }
    }
}

impl Config {
    /// Load from the default config path. No config directory means defaults.
    pub fn load() -> Result<Self> {
        match cache::config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Where favorites are persisted, or None to keep them in memory only.
    pub fn favorites_file(&self) -> Option<PathBuf> {
        self.favorites_path.clone().or_else(cache::favorites_path)
    }
}
