//! Error types for clustersync-engine.

use std::path::PathBuf;

use thiserror::Error;

use clustersync_core::SnapshotError;

/// All errors that can arise while reconciling.
///
/// Any of these aborts the run; the playbook trigger must not fire once a
/// write has failed, since on-disk state is then of unknown consistency.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An error reading the current on-disk snapshot.
    #[error("snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),

    /// An I/O error during a write or delete, with annotated path.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML rendering of a desired document failed.
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience constructor for [`EngineError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> EngineError {
    EngineError::Io {
        path: path.into(),
        source,
    }
}
