pub mod error;
pub mod paths;
pub mod settings;

pub use error::ConfigError;
pub use paths::{
    default_app_root, default_state_path, resolve_config_root, settings_path, user_config_root,
    APP_DIR_NAME, MOCK_STATE_REL_PATH, SETTINGS_FILE_NAME,
};
pub use settings::{Settings, DEFAULT_WORKSPACE_ID};

use std::path::Path;

pub fn load_settings(app_root: &Path) -> Result<Settings, ConfigError> {
    Settings::from_path(&settings_path(app_root))
}
