//! Config command handlers

use anyhow::{bail, Context, Result};

use ongoku::config::{load_settings_from, save_settings_to, settings_path, API_URL_ENV_VAR};
use ongoku::{load_settings, Settings};

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let settings = load_settings().context("Failed to load settings")?;
    let path = settings_path()?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "api_url": settings.api_url,
                    "settings_file": path,
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", settings.api_url);
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  api-url: {}", settings.api_url);
            if std::env::var_os(API_URL_ENV_VAR).is_some() {
                println!();
                println!("api-url is overridden by {}", API_URL_ENV_VAR);
            }
            println!();
            println!("Settings file: {}", path.display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: &str, value: &str, output: &Output) -> Result<()> {
    let path = settings_path()?;
    // Read the file itself so environment overrides are not persisted.
    let mut settings = load_settings_from(&path).context("Failed to load settings")?;

    apply(&mut settings, key, value)?;
    save_settings_to(&settings, &path).context("Failed to save settings")?;

    output.success(&format!("Set {} = {}", key, value));
    Ok(())
}

fn apply(settings: &mut Settings, key: &str, value: &str) -> Result<()> {
    match key {
        "api-url" | "api_url" => {
            settings.api_url = value.trim_end_matches('/').to_string();
        }
        _ => bail!("Unknown configuration key: {}. Valid keys: api-url", key),
    }
    Ok(())
}
