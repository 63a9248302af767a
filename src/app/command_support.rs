use crate::config::{default_app_root, load_settings, ConfigError, Settings};
use crate::mock::{MockEngine, MockError, MockStore, State, TickModuloFault};
use crate::shared::logging::append_event_log;
use std::path::{Path, PathBuf};

pub fn map_config_err(err: ConfigError) -> String {
    err.to_string()
}

pub fn map_mock_err(err: MockError) -> String {
    err.to_string()
}

/// Everything a `mock` command needs: resolved paths, settings and the store.
#[derive(Debug, Clone)]
pub struct MockContext {
    pub app_root: PathBuf,
    pub settings: Settings,
    pub store: MockStore,
}

impl MockContext {
    pub fn resolve() -> Result<Self, String> {
        let app_root = default_app_root().map_err(map_config_err)?;
        Self::from_app_root(app_root)
    }

    pub fn from_app_root(app_root: impl Into<PathBuf>) -> Result<Self, String> {
        let app_root = app_root.into();
        let settings = load_settings(&app_root).map_err(map_config_err)?;
        let store = MockStore::new(settings.resolve_state_path(&app_root));
        Ok(Self {
            app_root,
            settings,
            store,
        })
    }

    pub fn state_path(&self) -> &Path {
        self.store.path()
    }

    pub fn workspace_id(&self) -> &str {
        &self.settings.workspace
    }

    pub fn engine(&self) -> MockEngine {
        MockEngine::new(self.workspace_id())
            .with_fault_policy(TickModuloFault::new(self.settings.fault_every_ticks))
    }

    pub fn load_or_seed(&self) -> Result<State, String> {
        let (state, seeded) = self
            .store
            .load_or_seed(self.workspace_id())
            .map_err(map_mock_err)?;
        if seeded {
            self.log(
                "info",
                "mock.state_seeded",
                &format!(
                    "workspace={} path={}",
                    self.workspace_id(),
                    self.state_path().display()
                ),
            );
        }
        Ok(state)
    }

    pub fn save(&self, state: &State) -> Result<(), String> {
        self.store.save(state).map_err(|err| {
            self.log("error", "mock.save_failed", &err.to_string());
            map_mock_err(err)
        })
    }

    pub fn log(&self, level: &str, event: &str, message: &str) {
        append_event_log(&self.app_root, level, event, message);
    }
}
