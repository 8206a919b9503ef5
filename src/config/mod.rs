//! Configuration and storage location
//!
//! Everything lives under `~/.bifrost`: `config.toml` for settings and
//! `auth.json` for the token.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_SERVER_URL: &str = "https://api.is-an.ai";

const CONFIG_DIR: &str = ".bifrost";
const CONFIG_FILE: &str = "config.toml";

/// Application configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the Bifrost API server
    pub api_server_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_server_url: DEFAULT_API_SERVER_URL.to_string(),
        }
    }
}

impl Config {
    /// Per-user directory holding config and token (`~/.bifrost`)
    pub fn dir() -> Result<PathBuf> {
        let dirs = BaseDirs::new().context("Could not determine home directory")?;
        Ok(dirs.home_dir().join(CONFIG_DIR))
    }

    /// Load configuration from `dir`, falling back to defaults if there is no file
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);

        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        toml::from_str(&content).context("Failed to parse config file")
    }
}
