use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Corresponds to the customizable config file that can be modified by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Register the commands for this guild only, globally otherwise
    pub guild_id: Option<u64>,
    /// Tell the user when a command failed
    pub reply_on_error: bool,
    pub max_dice_faces: i64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            guild_id: None,
            reply_on_error: true,
            max_dice_faces: 1000,
        }
    }
}

impl Config {
    /// Read the config file, falling back to the defaults if there is none
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!("No config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let content = std::fs::read_to_string(path)
            .context(format!("Could not read {}", path.display()))?;
        Self::from_json(&content).context(format!("Could not parse {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}
