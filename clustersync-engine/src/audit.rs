//! Append-only audit trail of removed workers.
//!
//! Non-authoritative: reconciliation never reads this file back, and entries
//! are never pruned. One `RFC3339<TAB>hostname` line per deleted per-host
//! file.

use std::io::Write;

use chrono::Utc;

use clustersync_core::{Hostname, PlaybookLayout};

use crate::error::{io_err, EngineError};

/// Record removed workers in `vars/removed_workers.log`.
pub fn append_removed(layout: &PlaybookLayout, removed: &[Hostname]) -> Result<(), EngineError> {
    if removed.is_empty() {
        return Ok(());
    }
    let path = layout.audit_log();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| io_err(&path, e))?;
    let now = Utc::now().to_rfc3339();
    for hostname in removed {
        writeln!(file, "{now}\t{hostname}").map_err(|e| io_err(&path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn empty_removal_set_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let layout = PlaybookLayout::at(tmp.path());
        append_removed(&layout, &[]).unwrap();
        assert!(!layout.audit_log().exists());
    }

    #[test]
    fn entries_accumulate_across_runs() {
        let tmp = TempDir::new().unwrap();
        let layout = PlaybookLayout::at(tmp.path());

        append_removed(&layout, &[Hostname::from("w1")]).unwrap();
        append_removed(&layout, &[Hostname::from("w2"), Hostname::from("w3")]).unwrap();

        let log = fs::read_to_string(layout.audit_log()).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("\tw1"));
        assert!(lines[1].ends_with("\tw2"));
        assert!(lines[2].ends_with("\tw3"));
    }
}
