use crate::algorithm::HashAlgorithm;
use crate::error::ConfigError;
use crate::monitor::MonitorConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub default_algorithm: HashAlgorithm,
    pub monitor: MonitorConfig,
}

impl Settings {
    /// Load settings from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        let settings: Settings = serde_json::from_str(&json)?;
        settings.validate()?;
        debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let interval = self.monitor.poll_interval_ms;
        if !(100..=60_000).contains(&interval) {
            return Err(ConfigError::Invalid(format!(
                "poll_interval_ms must be between 100 and 60000, got {interval}"
            )));
        }
        Ok(())
    }
}
