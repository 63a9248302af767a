use crate::config::ConfigError;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "flowctl";
pub const SETTINGS_FILE_NAME: &str = "config.yaml";
pub const MOCK_STATE_REL_PATH: &str = "mock/state.json";

/// Per-user configuration directory for the current platform.
///
/// Falls back to `$HOME/.config` when the platform location cannot be resolved.
pub fn user_config_root() -> Result<PathBuf, ConfigError> {
    resolve_config_root(|key| std::env::var_os(key))
}

pub fn resolve_config_root<F>(env: F) -> Result<PathBuf, ConfigError>
where
    F: Fn(&str) -> Option<OsString>,
{
    if let Some(root) = platform_config_root(&env) {
        return Ok(root);
    }
    let home = non_empty(env("HOME")).ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(PathBuf::from(home).join(".config"))
}

#[cfg(target_os = "windows")]
fn platform_config_root<F>(env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    non_empty(env("APPDATA")).map(PathBuf::from)
}

#[cfg(target_os = "macos")]
fn platform_config_root<F>(env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    non_empty(env("HOME")).map(|home| PathBuf::from(home).join("Library/Application Support"))
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn platform_config_root<F>(env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<OsString>,
{
    non_empty(env("XDG_CONFIG_HOME"))
        .map(PathBuf::from)
        .filter(|path| path.is_absolute())
}

fn non_empty(value: Option<OsString>) -> Option<OsString> {
    value.filter(|v| !v.is_empty())
}

pub fn default_app_root() -> Result<PathBuf, ConfigError> {
    Ok(user_config_root()?.join(APP_DIR_NAME))
}

pub fn settings_path(app_root: &Path) -> PathBuf {
    app_root.join(SETTINGS_FILE_NAME)
}

pub fn default_state_path() -> Result<PathBuf, ConfigError> {
    Ok(default_app_root()?.join(MOCK_STATE_REL_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<OsString> {
        let map: HashMap<String, OsString> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), OsString::from(v)))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    fn falls_back_to_home_dot_config_without_platform_root() {
        let root = resolve_config_root(env_of(&[("HOME", "/home/dev")])).expect("root");
        assert_eq!(root, PathBuf::from("/home/dev/.config"));
    }

    #[test]
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    fn prefers_absolute_xdg_config_home() {
        let root = resolve_config_root(env_of(&[
            ("HOME", "/home/dev"),
            ("XDG_CONFIG_HOME", "/xdg"),
        ]))
        .expect("root");
        assert_eq!(root, PathBuf::from("/xdg"));

        let relative = resolve_config_root(env_of(&[
            ("HOME", "/home/dev"),
            ("XDG_CONFIG_HOME", "relative/xdg"),
        ]))
        .expect("root");
        assert_eq!(relative, PathBuf::from("/home/dev/.config"));
    }

    #[test]
    fn default_state_path_sits_under_app_root() {
        match (default_app_root(), default_state_path()) {
            (Ok(root), Ok(state)) => {
                assert_eq!(state, root.join("mock").join("state.json"));
                assert!(root.ends_with(APP_DIR_NAME));
            }
            (Err(_), Err(err)) => {
                assert!(matches!(err, ConfigError::HomeDirectoryUnavailable))
            }
            (root, state) => panic!("inconsistent resolution: {root:?} vs {state:?}"),
        }
    }

    #[test]
    fn missing_home_is_reported() {
        let err = resolve_config_root(env_of(&[])).expect_err("no home");
        assert!(matches!(err, ConfigError::HomeDirectoryUnavailable));
    }
}
