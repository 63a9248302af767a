use crate::mock::error::MockError;
use crate::mock::model::State;
use crate::mock::store::MockStore;
use std::time::SystemTime;

/// Detects snapshots rewritten by another process by comparing modification times.
///
/// Best effort: a rewrite inside the filesystem's timestamp granularity can
/// go unnoticed until the next one.
#[derive(Debug, Clone)]
pub struct StateWatcher {
    store: MockStore,
    last_seen: Option<SystemTime>,
}

impl StateWatcher {
    pub fn new(store: MockStore) -> Self {
        Self {
            store,
            last_seen: None,
        }
    }

    pub fn store(&self) -> &MockStore {
        &self.store
    }

    /// Records the current modification time as already observed.
    pub fn mark_seen(&mut self) -> Result<(), MockError> {
        self.last_seen = self.store.modified_at()?;
        Ok(())
    }

    /// Reloads the snapshot when it changed since the last observation.
    pub fn poll(&mut self) -> Result<Option<State>, MockError> {
        let Some(modified) = self.store.modified_at()? else {
            return Ok(None);
        };
        if self.last_seen.is_some_and(|seen| modified <= seen) {
            return Ok(None);
        }
        let state = self.store.load()?;
        self.last_seen = Some(modified);
        Ok(Some(state))
    }
}
