use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const DEFAULT_WORKSPACE_ID: &str = "ws-local";
pub const DEFAULT_FAULT_EVERY_TICKS: i64 = 7;
pub const DEFAULT_WATCH_POLL_MILLIS: u64 = 500;
pub const MIN_WATCH_POLL_MILLIS: u64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_workspace")]
    pub workspace: String,
    #[serde(default)]
    pub state_path: Option<PathBuf>,
    #[serde(default = "default_fault_every_ticks")]
    pub fault_every_ticks: i64,
    #[serde(default = "default_watch_poll_millis")]
    pub watch_poll_millis: u64,
}

fn default_workspace() -> String {
    DEFAULT_WORKSPACE_ID.to_string()
}

fn default_fault_every_ticks() -> i64 {
    DEFAULT_FAULT_EVERY_TICKS
}

fn default_watch_poll_millis() -> u64 {
    DEFAULT_WATCH_POLL_MILLIS
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
            state_path: None,
            fault_every_ticks: DEFAULT_FAULT_EVERY_TICKS,
            watch_poll_millis: DEFAULT_WATCH_POLL_MILLIS,
        }
    }
}

impl Settings {
    /// Reads settings from `path`. A missing file yields the defaults.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };
        let settings = Self::from_yaml(&raw, path)?;
        settings.validate()?;
        Ok(settings)
    }

    fn from_yaml(raw: &str, path: &Path) -> Result<Self, ConfigError> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workspace.trim().is_empty() {
            return Err(ConfigError::Settings(
                "`workspace` must be non-empty".to_string(),
            ));
        }
        if self.fault_every_ticks <= 0 {
            return Err(ConfigError::Settings(format!(
                "`faultEveryTicks` must be greater than 0, got {}",
                self.fault_every_ticks
            )));
        }
        if self.watch_poll_millis < MIN_WATCH_POLL_MILLIS {
            return Err(ConfigError::Settings(format!(
                "`watchPollMillis` must be at least {MIN_WATCH_POLL_MILLIS}, got {}",
                self.watch_poll_millis
            )));
        }
        Ok(())
    }

    /// Snapshot location; a relative `statePath` is taken relative to `app_root`.
    pub fn resolve_state_path(&self, app_root: &Path) -> PathBuf {
        match &self.state_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => app_root.join(path),
            None => app_root.join(super::MOCK_STATE_REL_PATH),
        }
    }
}
