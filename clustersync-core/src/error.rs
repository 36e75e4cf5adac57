//! Error types for clustersync-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from reading the on-disk snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on load — includes file path and line context from serde_yaml.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The shared configuration file is missing. It carries operator-authored
    /// settings and cannot be synthesized, so its absence is fatal.
    #[error("shared configuration file not found at {path}")]
    MissingConfig { path: PathBuf },

    /// `dirs::home_dir()` returned `None` — cannot locate the playbook directory.
    #[error("cannot determine home directory; set $HOME or pass --playbook-dir")]
    HomeNotFound,
}

/// Convenience constructor for [`SnapshotError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SnapshotError {
    SnapshotError::Io {
        path: path.into(),
        source,
    }
}
