use crate::error::ConfigError;
use directories::ProjectDirs;
use std::path::PathBuf;

pub const APP_QUALIFIER: &str = "com";
pub const APP_ORG: &str = "hashwatch";
pub const APP_NAME: &str = "hashwatch";

/// Overrides the settings file location.
pub const CONFIG_ENV: &str = "HASHWATCH_CONFIG";

pub fn config_dir() -> Result<PathBuf, ConfigError> {
    let dirs = ProjectDirs::from(APP_QUALIFIER, APP_ORG, APP_NAME).ok_or(ConfigError::NoConfigDir)?;
    Ok(dirs.config_dir().to_path_buf())
}

pub fn settings_path() -> Result<PathBuf, ConfigError> {
    if let Ok(override_path) = std::env::var(CONFIG_ENV) {
        if !override_path.is_empty() {
            return Ok(PathBuf::from(override_path));
        }
    }
    Ok(config_dir()?.join("settings.json"))
}
