//! Read-only views of the current on-disk configuration.
//!
//! Missing files are a valid "absent" result, not an error — with one
//! exception: the shared configuration file, which carries operator-authored
//! settings and whose absence is fatal.
//!
//! The per-entity readers ([`read_group`], [`read_host`],
//! [`read_inventory_section`]) are the query surface for inspecting a single
//! entity's current state. Reconciliation itself compares fully rendered
//! file content fetched through [`read_optional`].

use std::io::ErrorKind;
use std::path::Path;

use crate::error::{io_err, SnapshotError};
use crate::layout::PlaybookLayout;
use crate::types::Hostname;

/// Current content of a group variables file, or `None` if absent.
pub fn read_group(layout: &PlaybookLayout, name: &str) -> Result<Option<String>, SnapshotError> {
    read_optional(&layout.group_file(name))
}

/// Current content of a per-host variables file, or `None` if absent.
pub fn read_host(
    layout: &PlaybookLayout,
    hostname: &Hostname,
) -> Result<Option<String>, SnapshotError> {
    read_optional(&layout.host_file(hostname))
}

/// The lines of one bracketed inventory section, header excluded.
///
/// A missing inventory file or section yields an empty vec. Blank lines
/// inside the section are skipped.
pub fn read_inventory_section(
    layout: &PlaybookLayout,
    section: &str,
) -> Result<Vec<String>, SnapshotError> {
    let Some(content) = read_optional(&layout.inventory())? else {
        return Ok(vec![]);
    };
    let header = format!("[{section}]");
    let mut lines = Vec::new();
    let mut in_section = false;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed == header {
            in_section = true;
            continue;
        }
        if trimmed.starts_with('[') {
            in_section = false;
            continue;
        }
        if in_section && !trimmed.is_empty() {
            lines.push(line.to_owned());
        }
    }
    Ok(lines)
}

/// Parse the shared configuration file.
///
/// Returns [`SnapshotError::MissingConfig`] if the file does not exist — it
/// cannot be safely synthesized.
pub fn read_cidr_config(layout: &PlaybookLayout) -> Result<serde_yaml::Value, SnapshotError> {
    let path = layout.common_config();
    let Some(content) = read_optional(&path)? else {
        return Err(SnapshotError::MissingConfig { path });
    };
    serde_yaml::from_str(&content).map_err(|e| SnapshotError::Parse { path, source: e })
}

/// File names (with extension) of every `.yaml` file directly in `dir`,
/// sorted. A missing directory yields an empty vec.
pub fn list_yaml_files(dir: &Path) -> Result<Vec<String>, SnapshotError> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => return Err(io_err(dir, e)),
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|n| n.ends_with(".yaml"))
        .collect();
    names.sort();
    Ok(names)
}

/// Current content of any file, or `None` if absent.
///
/// The building block under the per-entity readers above; the reconciler
/// also reads the content it byte-compares rendered output against through
/// this.
pub fn read_optional(path: &Path) -> Result<Option<String>, SnapshotError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_err(path, e)),
    }
}
