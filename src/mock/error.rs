use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Workspace,
    Flow,
    Run,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Workspace => write!(f, "workspace"),
            EntityKind::Flow => write!(f, "flow"),
            EntityKind::Run => write!(f, "run"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MockError {
    #[error("{kind} `{id}` not found")]
    NotFound { kind: EntityKind, id: String },
    #[error("mock state not found at {path}")]
    StateMissing { path: String },
    #[error("malformed mock state at {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode mock state for {path}: {source}")]
    Encode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to generate run id: {0}")]
    Entropy(getrandom::Error),
}

impl MockError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// True for an absent entity or an absent snapshot file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::StateMissing { .. })
    }
}
