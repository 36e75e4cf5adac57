//! The reconciliation algorithm.
//!
//! Five entity classes, fixed order, disjoint files:
//!
//! 1. inventory `[workers]` section (wholesale section replacement)
//! 2. per-host variable files (`host_vars/<hostname>.yaml`)
//! 3. per-group variable files (`group_vars/<name>.yaml`, `master` protected)
//! 4. inventory groupings file (`vars/hosts.yaml`)
//! 5. shared CIDR allow-list (`vars/common_configuration.yaml`)
//!
//! Each class compares fully rendered target content against current on-disk
//! content byte-for-byte; the aggregate changed flag is the OR across
//! classes. The shared config is read before the first write, so its absence
//! aborts the run with zero mutations.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use clustersync_core::{snapshot, Hostname, PlaybookLayout, Topology, Worker, WorkerStatus};

use crate::audit;
use crate::diff::{self, FileDiff};
use crate::error::EngineError;
use crate::render;
use crate::writer::{self, WriteResult};

/// The group file reserved for the operator; never created, overwritten, or
/// deleted by reconciliation.
pub const PROTECTED_GROUP: &str = "master";

/// Inventory section holding worker connection lines.
const WORKERS_SECTION: &str = "workers";

/// Outcome of a full reconciliation run.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub inventory_changed: bool,
    pub host_vars_changed: bool,
    pub group_vars_changed: bool,
    pub groupings_changed: bool,
    pub cidrs_changed: bool,
    /// Every file touched or inspected, in application order.
    pub writes: Vec<WriteResult>,
    /// Hostnames whose per-host files were deleted this run.
    pub removed: Vec<Hostname>,
    /// Unified diffs of pending changes; populated in dry-run only.
    pub diffs: Vec<FileDiff>,
}

impl ReconcileReport {
    /// Did any class change anything?
    pub fn changed(&self) -> bool {
        self.inventory_changed
            || self.host_vars_changed
            || self.group_vars_changed
            || self.groupings_changed
            || self.cidrs_changed
    }
}

/// Reconcile the desired topology against the on-disk playbook configuration.
///
/// Dry-run renders and compares everything but writes nothing, collecting
/// unified diffs instead.
pub fn run(
    layout: &PlaybookLayout,
    topology: &Topology,
    dry_run: bool,
) -> Result<ReconcileReport, EngineError> {
    // Read the shared config first: if it is missing, the run must abort
    // before any class has written a byte.
    let cidr_doc = snapshot::read_cidr_config(layout)?;
    let workers = eligible_workers(&topology.workers);
    tracing::info!(
        "reconciling {} eligible of {} reported workers",
        workers.len(),
        topology.workers.len()
    );

    let mut report = ReconcileReport::default();
    report.inventory_changed = sync_inventory(layout, &workers, dry_run, &mut report)?;
    report.host_vars_changed = sync_host_vars(layout, topology, &workers, dry_run, &mut report)?;
    report.group_vars_changed = sync_group_vars(layout, topology, dry_run, &mut report)?;
    report.groupings_changed = sync_groupings(layout, topology, dry_run, &mut report)?;
    report.cidrs_changed =
        sync_cidrs(layout, cidr_doc, &topology.cluster_cidrs, dry_run, &mut report)?;

    if !dry_run {
        audit::append_removed(layout, &report.removed)?;
    }
    tracing::info!(
        "reconciliation finished: inventory={} host_vars={} group_vars={} groupings={} cidrs={}",
        report.inventory_changed,
        report.host_vars_changed,
        report.group_vars_changed,
        report.groupings_changed,
        report.cidrs_changed,
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Worker eligibility
// ---------------------------------------------------------------------------

/// Filter the reported worker set down to the desired one.
///
/// Builds a new collection by predicate — never mutates the list being
/// iterated. A worker is eligible when it is ACTIVE, has an address, and the
/// address is valid dotted-quad IPv4. Duplicate hostnames keep the first
/// occurrence; hostname is the canonical identity since addresses can be
/// reused after node replacement.
pub fn eligible_workers(workers: &[Worker]) -> Vec<&Worker> {
    let mut seen: HashSet<&Hostname> = HashSet::new();
    let mut eligible = Vec::new();
    for worker in workers {
        match &worker.status {
            WorkerStatus::Active => {}
            WorkerStatus::Other(status) => {
                tracing::debug!("worker {} has status {status}, excluded", worker.hostname);
                continue;
            }
        }
        let Some(ip) = worker.ip.as_deref() else {
            tracing::debug!("worker {} has no address yet, excluded", worker.hostname);
            continue;
        };
        if worker.valid_ip().is_none() {
            tracing::warn!(
                "worker {} reported invalid address {ip:?}, skipping it",
                worker.hostname
            );
            continue;
        }
        if !seen.insert(&worker.hostname) {
            tracing::warn!(
                "duplicate report for worker {}, keeping the first occurrence",
                worker.hostname
            );
            continue;
        }
        eligible.push(worker);
    }
    eligible
}

// ---------------------------------------------------------------------------
// Class 1: inventory [workers] section
// ---------------------------------------------------------------------------

fn sync_inventory(
    layout: &PlaybookLayout,
    workers: &[&Worker],
    dry_run: bool,
    report: &mut ReconcileReport,
) -> Result<bool, EngineError> {
    let lines: Vec<String> = workers
        .iter()
        .filter_map(|w| w.valid_ip())
        .map(render::worker_line)
        .collect();
    let current = read_existing(&layout.inventory())?;
    let desired = render::replace_section(&current, WORKERS_SECTION, &lines);
    apply_tracked(layout, &layout.inventory(), &desired, dry_run, report)
}

// ---------------------------------------------------------------------------
// Classes 2 + 3: per-host and per-group variable files
// ---------------------------------------------------------------------------

fn sync_host_vars(
    layout: &PlaybookLayout,
    topology: &Topology,
    workers: &[&Worker],
    dry_run: bool,
    report: &mut ReconcileReport,
) -> Result<bool, EngineError> {
    // Structured per-host map; older protocol revisions only carried a
    // volume list on the worker itself, so fall back to that shape.
    let mut desired: BTreeMap<Hostname, String> = BTreeMap::new();
    if topology.host_entries.is_empty() {
        for worker in workers {
            if let Some(volumes) = &worker.volumes {
                desired.insert(worker.hostname.clone(), render::volumes_doc(volumes)?);
            }
        }
    } else {
        for (hostname, value) in &topology.host_entries {
            desired.insert(Hostname::from(hostname.clone()), render::yaml_doc(value)?);
        }
    }

    let mut changed = false;
    for (hostname, content) in &desired {
        changed |= apply_tracked(layout, &layout.host_file(hostname), content, dry_run, report)?;
    }

    let expected: BTreeSet<String> = desired.keys().map(|h| format!("{h}.yaml")).collect();
    for file_name in snapshot::list_yaml_files(&layout.host_vars_dir())? {
        if expected.contains(&file_name) {
            continue;
        }
        let path = layout.host_vars_dir().join(&file_name);
        if let Some(result) = writer::remove(&path, dry_run)? {
            changed = true;
            if let Some(stem) = file_name.strip_suffix(".yaml") {
                report.removed.push(Hostname::from(stem));
            }
            report.writes.push(result);
        }
    }
    Ok(changed)
}

fn sync_group_vars(
    layout: &PlaybookLayout,
    topology: &Topology,
    dry_run: bool,
    report: &mut ReconcileReport,
) -> Result<bool, EngineError> {
    let mut changed = false;
    let mut expected: BTreeSet<String> = BTreeSet::new();
    for (name, value) in &topology.groups_vars {
        if name == PROTECTED_GROUP {
            tracing::debug!("group {PROTECTED_GROUP} is operator-managed, not touching it");
            continue;
        }
        expected.insert(format!("{name}.yaml"));
        let content = render::yaml_doc(value)?;
        changed |= apply_tracked(layout, &layout.group_file(name), &content, dry_run, report)?;
    }

    let protected_file = format!("{PROTECTED_GROUP}.yaml");
    for file_name in snapshot::list_yaml_files(&layout.group_vars_dir())? {
        if expected.contains(&file_name) || file_name == protected_file {
            continue;
        }
        let path = layout.group_vars_dir().join(&file_name);
        if let Some(result) = writer::remove(&path, dry_run)? {
            changed = true;
            report.writes.push(result);
        }
    }
    Ok(changed)
}

// ---------------------------------------------------------------------------
// Class 4: inventory groupings file
// ---------------------------------------------------------------------------

fn sync_groupings(
    layout: &PlaybookLayout,
    topology: &Topology,
    dry_run: bool,
    report: &mut ReconcileReport,
) -> Result<bool, EngineError> {
    if topology.groupings.is_null() {
        // The server did not send a grouping document; leave the file alone.
        return Ok(false);
    }
    let desired = render::yaml_doc(&topology.groupings)?;
    apply_tracked(layout, &layout.groupings_file(), &desired, dry_run, report)
}

// ---------------------------------------------------------------------------
// Class 5: shared CIDR allow-list
// ---------------------------------------------------------------------------

fn sync_cidrs(
    layout: &PlaybookLayout,
    mut doc: serde_yaml::Value,
    desired_cidrs: &[String],
    dry_run: bool,
    report: &mut ReconcileReport,
) -> Result<bool, EngineError> {
    let desired_value = serde_yaml::Value::Sequence(
        desired_cidrs
            .iter()
            .map(|c| serde_yaml::Value::String(c.clone()))
            .collect(),
    );

    let mut differs = false;
    let empty = serde_yaml::Value::Sequence(Vec::new());
    if let Some(entries) = doc
        .get_mut("cluster_cidrs")
        .and_then(|v| v.as_sequence_mut())
    {
        for entry in entries.iter_mut() {
            // Order-sensitive comparison of the whole list; an absent key
            // counts as an empty list.
            let current = entry.get("provider_cidrs").unwrap_or(&empty);
            if *current == desired_value {
                continue;
            }
            if let Some(map) = entry.as_mapping_mut() {
                map.insert(
                    serde_yaml::Value::String("provider_cidrs".to_owned()),
                    desired_value.clone(),
                );
                differs = true;
            }
        }
    }

    if !differs {
        // Equal allow-list: the shared file is not rewritten at all.
        return Ok(false);
    }
    let rendered = render::yaml_doc(&doc)?;
    apply_tracked(layout, &layout.common_config(), &rendered, dry_run, report)
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn apply_tracked(
    layout: &PlaybookLayout,
    path: &Path,
    desired: &str,
    dry_run: bool,
    report: &mut ReconcileReport,
) -> Result<bool, EngineError> {
    if dry_run {
        let current = read_existing(path)?;
        if current != desired {
            report
                .diffs
                .push(diff::unified(layout.root(), path, &current, desired));
        }
    }
    let result = writer::apply(path, desired, dry_run)?;
    let changed = result.is_change();
    report.writes.push(result);
    Ok(changed)
}

fn read_existing(path: &Path) -> Result<String, EngineError> {
    Ok(snapshot::read_optional(path)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn worker(value: serde_json::Value) -> Worker {
        serde_json::from_value(value).expect("worker fixture")
    }

    #[test]
    fn non_active_workers_are_excluded() {
        let workers = vec![
            worker(json!({"hostname": "w1", "ip": "10.0.0.5", "status": "ACTIVE"})),
            worker(json!({"hostname": "w2", "ip": "10.0.0.6", "status": "BUILDING"})),
        ];
        let eligible = eligible_workers(&workers);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].hostname, Hostname::from("w1"));
    }

    #[test]
    fn null_ip_workers_are_excluded() {
        let workers = vec![worker(
            json!({"hostname": "w1", "ip": null, "status": "ACTIVE"}),
        )];
        assert!(eligible_workers(&workers).is_empty());
    }

    #[test]
    fn invalid_ip_is_skipped_but_others_survive() {
        let workers = vec![
            worker(json!({"hostname": "bad", "ip": "999.1.1.1", "status": "ACTIVE"})),
            worker(json!({"hostname": "good", "ip": "10.0.0.6", "status": "ACTIVE"})),
        ];
        let eligible = eligible_workers(&workers);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].hostname, Hostname::from("good"));
    }

    #[test]
    fn duplicate_hostnames_keep_first_occurrence() {
        let workers = vec![
            worker(json!({"hostname": "w1", "ip": "10.0.0.5", "status": "ACTIVE"})),
            worker(json!({"hostname": "w1", "ip": "10.0.0.9", "status": "ACTIVE"})),
        ];
        let eligible = eligible_workers(&workers);
        assert_eq!(eligible.len(), 1);
        assert_eq!(eligible[0].ip.as_deref(), Some("10.0.0.5"));
    }
}
