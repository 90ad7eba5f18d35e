pub mod loader;
pub mod schema;

pub use loader::{
    config_dir, load_settings, load_settings_from, save_settings,
    save_settings_to, settings_path, API_URL_ENV_VAR, CONFIG_DIR_ENV_VAR,
};
pub use schema::{Settings, DEFAULT_API_URL};
