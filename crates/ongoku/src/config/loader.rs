//! Settings persistence.
//!
//! Settings live in `<config dir>/settings.json`. The config directory is
//! `dirs::config_dir()/ongoku` unless `ONGOKU_CONFIG_DIR` points elsewhere.
//! `ONGOKU_API_URL` overrides the stored API URL without being written back.

use std::path::{Path, PathBuf};

use crate::config::schema::Settings;
use crate::error::ConfigError;

pub const CONFIG_DIR_ENV_VAR: &str = "ONGOKU_CONFIG_DIR";
pub const API_URL_ENV_VAR: &str = "ONGOKU_API_URL";

const SETTINGS_FILE: &str = "settings.json";

/// Directory holding settings and the session store.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV_VAR).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    dirs::config_dir()
        .map(|dir| dir.join("ongoku"))
        .ok_or(ConfigError::NoConfigDir)
}

pub fn settings_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join(SETTINGS_FILE))
}

/// Loads settings from the default location with environment overrides.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let mut settings = load_settings_from(&settings_path()?)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Loads settings from `path`. A missing file yields defaults.
pub fn load_settings_from(path: &Path) -> Result<Settings, ConfigError> {
    if !path.exists() {
        log::debug!("No settings at {}, using defaults", path.display());
        return Ok(Settings::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let settings: Settings = serde_json::from_str(&content)?;
    Ok(settings)
}

pub fn save_settings(settings: &Settings) -> Result<(), ConfigError> {
    save_settings_to(settings, &settings_path()?)
}

pub fn save_settings_to(settings: &Settings, path: &Path) -> Result<(), ConfigError> {
    settings.validate()?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteFile {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }

    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

fn apply_env_overrides(settings: &mut Settings) {
    if let Ok(url) = std::env::var(API_URL_ENV_VAR) {
        if !url.is_empty() {
            settings.api_url = url;
        }
    }
}
