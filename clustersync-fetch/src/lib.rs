//! # clustersync-fetch
//!
//! Remote topology fetcher. One blocking POST to the control plane, strict
//! protocol-version gate, typed failures. No retries — a failed attempt is
//! terminal for the invocation and the surrounding scheduler decides when to
//! try again.

pub mod client;
pub mod error;

pub use client::{agent, cluster_id_from_hostname, fetch, Endpoint, ScalingDirection};
pub use error::FetchError;

/// Compiled-in protocol version, compared against the server's `VERSION`
/// field on every fetch.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default control-plane endpoint template. `{cluster_id}` is substituted
/// once at startup.
pub const DEFAULT_ENDPOINT: &str =
    "https://simplevm.denbi.de/portal/api/autoscaling/{cluster_id}/scale-data/";
