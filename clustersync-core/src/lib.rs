//! Clustersync core library — domain types, playbook layout, snapshot reads.
//!
//! Public API surface:
//! - [`types`] — newtypes and the desired-state topology document
//! - [`layout`] — [`PlaybookLayout`], all managed on-disk paths
//! - [`snapshot`] — read-only views of the current on-disk configuration
//! - [`error`] — [`SnapshotError`]

pub mod error;
pub mod layout;
pub mod snapshot;
pub mod types;

pub use error::SnapshotError;
pub use layout::PlaybookLayout;
pub use types::{Hostname, Topology, Worker, WorkerStatus};
