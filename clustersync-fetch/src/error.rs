//! Error types for clustersync-fetch.
//!
//! Every variant is fatal for the run: fetch failures abort before any file
//! is written.

use thiserror::Error;

/// All errors that can arise from fetching the desired topology.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Transport-level failure: timeout, DNS, connection refused.
    #[error("could not reach the cluster endpoint: {0}")]
    Transport(String),

    /// HTTP 401 — the secret was rejected.
    #[error(
        "the cluster password seems to be wrong; verify it or generate a new \
         one on the cluster overview page"
    )]
    Auth,

    /// HTTP 400/405 with a structured body — server-supplied message verbatim.
    #[error("{0}")]
    Protocol(String),

    /// Any other non-200 status.
    #[error("unexpected HTTP status {status} from the cluster endpoint")]
    Unexpected { status: u16 },

    /// The response body was not a valid topology document.
    #[error("malformed response from the cluster endpoint: {0}")]
    Decode(#[from] std::io::Error),

    /// Server protocol version differs from ours. Fatal before any write —
    /// the operator must obtain an updated client.
    #[error(
        "this client is outdated [version {local}, server expects {server}]; \
         download the current release and run it again"
    )]
    VersionSkew { local: String, server: String },
}
