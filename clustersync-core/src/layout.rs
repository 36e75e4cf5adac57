//! Playbook directory layout.
//!
//! # On-disk layout
//!
//! ```text
//! <root>/                        ($HOME/playbook by default)
//!   ansible_hosts                (line-oriented inventory, bracketed sections)
//!   vars/
//!     common_configuration.yaml  (shared config — CIDR allow-list lives here)
//!     hosts.yaml                 (host → ansible group membership)
//!     removed_workers.log        (append-only audit trail)
//!   group_vars/
//!     <group>.yaml               (one file per variable group)
//!   host_vars/
//!     <hostname>.yaml            (one file per worker with extra attributes)
//! ```
//!
//! A `PlaybookLayout` is constructed once at startup and never mutated;
//! everything path-dependent takes it explicitly so tests can point it at a
//! `TempDir`.

use std::path::{Path, PathBuf};

use crate::error::SnapshotError;
use crate::types::Hostname;

/// All managed paths, derived from one playbook root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybookLayout {
    root: PathBuf,
}

impl PlaybookLayout {
    /// Layout rooted at an explicit directory. Used by tests and `--playbook-dir`.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Layout rooted at `$HOME/playbook`.
    pub fn from_home() -> Result<Self, SnapshotError> {
        let home = dirs::home_dir().ok_or(SnapshotError::HomeNotFound)?;
        Ok(Self::at(home.join("playbook")))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// `<root>/ansible_hosts`
    pub fn inventory(&self) -> PathBuf {
        self.root.join("ansible_hosts")
    }

    /// `<root>/vars`
    pub fn vars_dir(&self) -> PathBuf {
        self.root.join("vars")
    }

    /// `<root>/vars/common_configuration.yaml`
    pub fn common_config(&self) -> PathBuf {
        self.vars_dir().join("common_configuration.yaml")
    }

    /// `<root>/vars/hosts.yaml`
    pub fn groupings_file(&self) -> PathBuf {
        self.vars_dir().join("hosts.yaml")
    }

    /// `<root>/vars/removed_workers.log`
    pub fn audit_log(&self) -> PathBuf {
        self.vars_dir().join("removed_workers.log")
    }

    /// `<root>/group_vars`
    pub fn group_vars_dir(&self) -> PathBuf {
        self.root.join("group_vars")
    }

    /// `<root>/group_vars/<name>.yaml`
    pub fn group_file(&self, name: &str) -> PathBuf {
        self.group_vars_dir().join(format!("{name}.yaml"))
    }

    /// `<root>/host_vars`
    pub fn host_vars_dir(&self) -> PathBuf {
        self.root.join("host_vars")
    }

    /// `<root>/host_vars/<hostname>.yaml`
    pub fn host_file(&self, hostname: &Hostname) -> PathBuf {
        self.host_vars_dir().join(format!("{hostname}.yaml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_derive_from_root() {
        let layout = PlaybookLayout::at("/srv/playbook");
        assert_eq!(layout.inventory(), PathBuf::from("/srv/playbook/ansible_hosts"));
        assert_eq!(
            layout.common_config(),
            PathBuf::from("/srv/playbook/vars/common_configuration.yaml")
        );
        assert_eq!(
            layout.group_file("workers"),
            PathBuf::from("/srv/playbook/group_vars/workers.yaml")
        );
        assert_eq!(
            layout.host_file(&Hostname::from("w1")),
            PathBuf::from("/srv/playbook/host_vars/w1.yaml")
        );
    }
}
