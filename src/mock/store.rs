use crate::mock::error::MockError;
use crate::mock::model::State;
use crate::mock::seed::seed_default;
use crate::shared::fs_atomic::atomic_write_file;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Reads the snapshot at `path`.
///
/// A missing file is reported as [`MockError::StateMissing`] so callers can
/// decide to seed; unparsable content is [`MockError::Malformed`].
pub fn load_state(path: &Path) -> Result<State, MockError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(source) if source.kind() == ErrorKind::NotFound => {
            return Err(MockError::StateMissing {
                path: path.display().to_string(),
            })
        }
        Err(source) => return Err(io_error(path, source)),
    };
    serde_json::from_str(&raw).map_err(|source| MockError::Malformed {
        path: path.display().to_string(),
        source,
    })
}

/// Indented JSON followed by exactly one newline.
pub fn encode_state(state: &State) -> Result<Vec<u8>, serde_json::Error> {
    let mut body = serde_json::to_vec_pretty(state)?;
    body.push(b'\n');
    Ok(body)
}

/// Writes `state` to a sibling temp file and renames it over `path`.
pub fn save_state_atomic(path: &Path, state: &State) -> Result<(), MockError> {
    let body = encode_state(state).map_err(|source| MockError::Encode {
        path: path.display().to_string(),
        source,
    })?;
    atomic_write_file(path, &body).map_err(|source| io_error(path, source))
}

#[derive(Debug, Clone)]
pub struct MockStore {
    path: PathBuf,
}

impl MockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<State, MockError> {
        load_state(&self.path)
    }

    pub fn save(&self, state: &State) -> Result<(), MockError> {
        save_state_atomic(&self.path, state)
    }

    /// Loads the snapshot, seeding and saving one first when none exists.
    ///
    /// Returns whether seeding happened. A malformed file is an error, never
    /// silently replaced.
    pub fn load_or_seed(&self, workspace_id: &str) -> Result<(State, bool), MockError> {
        match self.load() {
            Ok(state) => Ok((state, false)),
            Err(MockError::StateMissing { .. }) => {
                let state = seed_default(workspace_id);
                self.save(&state)?;
                Ok((state, true))
            }
            Err(err) => Err(err),
        }
    }

    /// Replaces whatever is on disk with a fresh seed.
    pub fn reset(&self, workspace_id: &str) -> Result<State, MockError> {
        let state = seed_default(workspace_id);
        self.save(&state)?;
        Ok(state)
    }

    /// Modification time of the snapshot, `None` while it does not exist.
    pub fn modified_at(&self) -> Result<Option<SystemTime>, MockError> {
        match fs::metadata(&self.path) {
            Ok(meta) => meta
                .modified()
                .map(Some)
                .map_err(|source| io_error(&self.path, source)),
            Err(source) if source.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(io_error(&self.path, source)),
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> MockError {
    MockError::Io {
        path: path.display().to_string(),
        source,
    }
}
