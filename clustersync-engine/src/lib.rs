//! # clustersync-engine
//!
//! The reconciliation core: diff the desired topology against the on-disk
//! playbook configuration, apply a minimal idempotent set of atomic file
//! mutations, and report whether anything actually changed.
//!
//! Call [`reconcile::run`] with a [`clustersync_core::PlaybookLayout`] and a
//! fetched [`clustersync_core::Topology`].

pub mod audit;
pub mod diff;
pub mod error;
pub mod reconcile;
pub mod render;
pub mod writer;

pub use diff::FileDiff;
pub use error::EngineError;
pub use reconcile::{ReconcileReport, run};
pub use writer::WriteResult;
