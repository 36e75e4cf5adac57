//! Domain types for the desired cluster topology.
//!
//! The topology document arrives as JSON from the control plane; provider
//! metadata we do not interpret is carried as opaque `serde_json::Value` bags
//! and rendered to YAML verbatim.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed worker hostname.
///
/// Hostname is the canonical worker identity: IP addresses can be reused
/// after node replacement, hostnames are not.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hostname(pub String);

impl fmt::Display for Hostname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Hostname {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Hostname {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// Lifecycle status as reported by the provider. Only `Active` workers are
/// eligible for inclusion in the inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum WorkerStatus {
    Active,
    /// Any other provider status (BUILDING, SHUTOFF, ERROR, …).
    Other(String),
}

impl From<String> for WorkerStatus {
    fn from(s: String) -> Self {
        if s == "ACTIVE" {
            WorkerStatus::Active
        } else {
            WorkerStatus::Other(s)
        }
    }
}

impl From<WorkerStatus> for String {
    fn from(s: WorkerStatus) -> Self {
        match s {
            WorkerStatus::Active => "ACTIVE".to_owned(),
            WorkerStatus::Other(s) => s,
        }
    }
}

/// One compute node as reported by the control plane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    pub hostname: Hostname,
    /// Dotted-quad address; absent while the node is still being provisioned.
    #[serde(default)]
    pub ip: Option<String>,
    pub status: WorkerStatus,
    /// Block-storage volume list (legacy per-host variable source).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volumes: Option<serde_json::Value>,
    /// Opaque provider metadata (memory, cores, ephemeral disks, …).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Worker {
    /// The worker's address, if present and valid dotted-quad IPv4.
    pub fn valid_ip(&self) -> Option<&str> {
        let ip = self.ip.as_deref()?;
        Ipv4Addr::from_str(ip).ok()?;
        Some(ip)
    }
}

// ---------------------------------------------------------------------------
// Topology
// ---------------------------------------------------------------------------

/// The desired-state document returned by the control plane.
///
/// Unknown wire fields are ignored; maps the server did not send default to
/// empty. Field names follow the wire protocol where they differ.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topology {
    /// Server protocol version; must equal the client's compiled-in version.
    #[serde(rename = "VERSION")]
    pub version: String,

    /// Master node attribute bag — informational, never reconciled.
    #[serde(default)]
    pub master: serde_json::Value,

    /// Reported worker set (wire field `active_worker`; despite the name the
    /// server includes workers in any status).
    #[serde(rename = "active_worker", default)]
    pub workers: Vec<Worker>,

    /// Group name → group variables document.
    #[serde(default)]
    pub groups_vars: BTreeMap<String, serde_json::Value>,

    /// Hostname → per-host variables document.
    #[serde(default)]
    pub host_entries: BTreeMap<String, serde_json::Value>,

    /// Host → ansible group membership document (wire field `ansible_hosts`).
    #[serde(rename = "ansible_hosts", default)]
    pub groupings: serde_json::Value,

    /// Permitted peer CIDR ranges, order-sensitive.
    #[serde(default)]
    pub cluster_cidrs: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hostname_display() {
        assert_eq!(Hostname::from("worker-1").to_string(), "worker-1");
    }

    #[test]
    fn status_roundtrip() {
        let active: WorkerStatus = serde_json::from_value(json!("ACTIVE")).unwrap();
        assert_eq!(active, WorkerStatus::Active);
        let building: WorkerStatus = serde_json::from_value(json!("BUILDING")).unwrap();
        assert_eq!(building, WorkerStatus::Other("BUILDING".to_owned()));
    }

    #[test]
    fn valid_ip_rejects_out_of_range_octets() {
        let worker: Worker = serde_json::from_value(json!({
            "hostname": "w1",
            "ip": "999.1.1.1",
            "status": "ACTIVE",
        }))
        .unwrap();
        assert!(worker.valid_ip().is_none());
    }

    #[test]
    fn valid_ip_accepts_dotted_quad() {
        let worker: Worker = serde_json::from_value(json!({
            "hostname": "w1",
            "ip": "10.0.0.5",
            "status": "ACTIVE",
        }))
        .unwrap();
        assert_eq!(worker.valid_ip(), Some("10.0.0.5"));
    }

    #[test]
    fn worker_null_ip_deserializes() {
        let worker: Worker = serde_json::from_value(json!({
            "hostname": "w1",
            "ip": null,
            "status": "ACTIVE",
        }))
        .unwrap();
        assert!(worker.ip.is_none());
    }

    #[test]
    fn worker_keeps_provider_metadata() {
        let worker: Worker = serde_json::from_value(json!({
            "hostname": "w1",
            "ip": "10.0.0.5",
            "status": "ACTIVE",
            "memory": 4096,
            "cores": 2,
        }))
        .unwrap();
        assert_eq!(worker.extra.get("memory"), Some(&json!(4096)));
        assert_eq!(worker.extra.get("cores"), Some(&json!(2)));
    }

    #[test]
    fn topology_defaults_for_missing_maps() {
        let topology: Topology = serde_json::from_value(json!({
            "VERSION": "0.8.0",
        }))
        .unwrap();
        assert_eq!(topology.version, "0.8.0");
        assert!(topology.workers.is_empty());
        assert!(topology.groups_vars.is_empty());
        assert!(topology.host_entries.is_empty());
        assert!(topology.groupings.is_null());
        assert!(topology.cluster_cidrs.is_empty());
    }

    #[test]
    fn topology_ignores_unknown_fields() {
        let topology: Topology = serde_json::from_value(json!({
            "VERSION": "0.8.0",
            "some_future_field": {"a": 1},
        }))
        .unwrap();
        assert_eq!(topology.version, "0.8.0");
    }
}
