use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.ongoku.dev";

/// User settings persisted between invocations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.api_url).map_err(|e| ConfigError::Validation {
            message: format!("apiUrl '{}' is not a valid URL: {}", self.api_url, e),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                message: format!("apiUrl must use http or https, got '{}'", url.scheme()),
            });
        }

        Ok(())
    }
}
