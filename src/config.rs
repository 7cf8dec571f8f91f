use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine::{DEFAULT_ACTIVITY_LIMIT, DEFAULT_VALUATION_HISTORY_LIMIT};
use crate::error::Result;

pub const CONFIG_FILE: &str = "config.yaml";

/// Project settings stored in `.slicepie/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Company name written into the ledger by `init`
    pub company_name: String,
    /// Number of activity events kept
    pub activity_limit: usize,
    /// Number of saved valuation snapshots kept
    pub valuation_history_limit: usize,
    /// tracing filter used when RUST_LOG is unset
    pub log_filter: String,
    /// Bind address for `serve --http`
    pub http_bind: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            company_name: String::new(),
            activity_limit: DEFAULT_ACTIVITY_LIMIT,
            valuation_history_limit: DEFAULT_VALUATION_HISTORY_LIMIT,
            log_filter: "warn".to_string(),
            http_bind: "127.0.0.1:8787".to_string(),
        }
    }
}

impl Config {
    /// Load from a `.slicepie` directory. A missing file gives the defaults.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&text)?)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::write(dir.join(CONFIG_FILE), serde_yaml::to_string(self)?)?;
        Ok(())
    }
}
