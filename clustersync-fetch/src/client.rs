//! HTTP client for the control-plane scale-data endpoint.

use std::time::Duration;

use serde::Serialize;

use clustersync_core::Topology;

use crate::error::FetchError;
use crate::PROTOCOL_VERSION;

/// Wire marker retained for protocol compatibility. Modern servers return
/// full bidirectional state regardless of direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalingDirection {
    Up,
    Down,
}

impl ScalingDirection {
    pub fn as_wire(&self) -> &'static str {
        match self {
            ScalingDirection::Up => "scaling_up",
            ScalingDirection::Down => "scaling_down",
        }
    }
}

/// A fully-resolved endpoint URL.
///
/// Computed once at startup from the template and cluster id, then threaded
/// through unchanged — never a mutable global.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint(String);

impl Endpoint {
    /// Substitute `{cluster_id}` in `template`.
    pub fn new(template: &str, cluster_id: &str) -> Self {
        Self(template.replace("{cluster_id}", cluster_id))
    }

    pub fn url(&self) -> &str {
        &self.0
    }
}

/// Cluster id convention: the suffix of the node hostname after the last `-`.
pub fn cluster_id_from_hostname(hostname: &str) -> &str {
    hostname.rsplit('-').next().unwrap_or(hostname)
}

/// Agent with the bounded connect/read timeout used for the single call.
pub fn agent() -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(10))
        .build()
}

#[derive(Debug, Serialize)]
struct ScaleRequest<'a> {
    scaling: &'a str,
    scaling_type: &'a str,
    password: &'a str,
    version: &'a str,
}

/// Fetch the desired topology.
///
/// Single attempt, no retries. On 200, the server's `VERSION` field must
/// equal [`PROTOCOL_VERSION`]; any mismatch is fatal before a single byte is
/// written to disk.
pub fn fetch(
    agent: &ureq::Agent,
    endpoint: &Endpoint,
    secret: &str,
    direction: ScalingDirection,
) -> Result<Topology, FetchError> {
    tracing::debug!("fetching topology from {}", endpoint.url());
    let request = ScaleRequest {
        scaling: direction.as_wire(),
        scaling_type: "manualscaling",
        password: secret,
        version: PROTOCOL_VERSION,
    };

    let response = match agent.post(endpoint.url()).send_json(&request) {
        Ok(response) => response,
        Err(ureq::Error::Status(401, _)) => return Err(FetchError::Auth),
        Err(ureq::Error::Status(status @ (400 | 405), response)) => {
            return Err(FetchError::Protocol(protocol_message(status, response)));
        }
        Err(ureq::Error::Status(status, _)) => {
            return Err(FetchError::Unexpected { status });
        }
        Err(ureq::Error::Transport(transport)) => {
            return Err(FetchError::Transport(transport.to_string()));
        }
    };

    let topology: Topology = response.into_json()?;
    if topology.version != PROTOCOL_VERSION {
        return Err(FetchError::VersionSkew {
            local: PROTOCOL_VERSION.to_owned(),
            server: topology.version,
        });
    }
    tracing::debug!("topology: {} reported workers", topology.workers.len());
    Ok(topology)
}

fn protocol_message(status: u16, response: ureq::Response) -> String {
    let body: Result<serde_json::Value, _> = response.into_json();
    body.ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_owned))
        .unwrap_or_else(|| format!("the cluster endpoint rejected the request (HTTP {status})"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
