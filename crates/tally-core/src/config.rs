//! Engine configuration
//!
//! Config is loaded with a two-layer resolution:
//! 1. An explicit path, or the override in the data dir
//!    (~/.local/share/tally/config/tally.toml)
//! 2. Embedded defaults (compiled into binary)
//!
//! Environment variables override whatever the file says:
//! - `TALLY_DEFAULT_ALERT_THRESHOLD`
//! - `TALLY_ROLLOVER_INTERVAL_HOURS`

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/tally.toml");

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub budget: BudgetSettings,
    pub alerts: AlertSettings,
    pub scheduler: SchedulerSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSettings {
    /// Used when an allocation is created without its own threshold
    pub default_alert_threshold: f64,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            default_alert_threshold: 0.8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertSettings {
    /// Progress percent that escalates an alert to danger
    pub danger_percent: f64,
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            danger_percent: 90.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSettings {
    pub rollover_interval_hours: u64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            rollover_interval_hours: 24,
        }
    }
}

impl Config {
    /// Load config from `path`, the default override location, or the embedded defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let content = match path.map(Path::to_path_buf).or_else(default_config_path) {
            Some(p) if p.exists() => {
                debug!("Loading config from {}", p.display());
                fs::read_to_string(&p)?
            }
            Some(p) if path.is_some() => {
                return Err(Error::InvalidData(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            _ => DEFAULT_CONFIG.to_string(),
        };

        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("TALLY_DEFAULT_ALERT_THRESHOLD") {
            match value.parse() {
                Ok(v) => self.budget.default_alert_threshold = v,
                Err(_) => warn!("Ignoring invalid TALLY_DEFAULT_ALERT_THRESHOLD: {}", value),
            }
        }
        if let Ok(value) = std::env::var("TALLY_ROLLOVER_INTERVAL_HOURS") {
            match value.parse() {
                Ok(v) => self.scheduler.rollover_interval_hours = v,
                Err(_) => warn!("Ignoring invalid TALLY_ROLLOVER_INTERVAL_HOURS: {}", value),
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.budget.default_alert_threshold) {
            return Err(Error::InvalidData(format!(
                "default_alert_threshold must be between 0 and 1, got {}",
                self.budget.default_alert_threshold
            )));
        }
        if self.alerts.danger_percent <= 0.0 {
            return Err(Error::InvalidData(
                "danger_percent must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("config").join("tally.toml"))
}
