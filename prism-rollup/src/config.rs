//! Rollup planner configuration
//!
//! Read from the `[rollup]` table of a Prism config file:
//!
//! ```toml
//! [rollup]
//! default_time_zone = "UTC"
//! strict_intervals = false
//! ```

use crate::caps::DEFAULT_TIME_ZONE;
use crate::error::RollupError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PlannerConfig {
    /// Time zone for date histograms that don't name one
    #[serde(default = "default_time_zone")]
    pub default_time_zone: String,

    /// Reject matches that would otherwise only produce a compatibility
    /// warning (non-multiple or mixed fixed/calendar intervals)
    #[serde(default)]
    pub strict_intervals: bool,
}

fn default_time_zone() -> String {
    DEFAULT_TIME_ZONE.to_string()
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_time_zone: default_time_zone(),
            strict_intervals: false,
        }
    }
}

/// Config file layout; unrelated sections are ignored
#[derive(Debug, Default, Deserialize, Serialize)]
struct ConfigFile {
    #[serde(default)]
    rollup: PlannerConfig,
}

impl PlannerConfig {
    /// Parse the `[rollup]` table from TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        file.rollup.validate()?;
        Ok(file.rollup)
    }

    /// Load from a config file, or defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(
                "No rollup config at {}, using defaults",
                path.display()
            );
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save as a `[rollup]` table
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(&ConfigFile {
            rollup: self.clone(),
        })
        .map_err(|e| RollupError::Config(e.to_string()))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_time_zone.trim().is_empty() {
            return Err(RollupError::Config(
                "rollup.default_time_zone must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
