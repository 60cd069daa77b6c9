//! Health check types and structures.

use std::collections::BTreeMap;
use std::fmt;

/// Status text of a healthy endpoint, and of the service itself.
pub const OK_STATUS: &str = "ok";

/// Key under which the service reports its own health.
pub const SELF_LABEL: &str = "self";

/// A concrete, individually reachable store location.
///
/// `port` is `None` only for a logical address that could not be split and is
/// probed as written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: Option<u16>,
}

impl Endpoint {
    /// Create an endpoint from a resolved host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port: Some(port),
        }
    }

    /// Endpoint standing for a logical address that is probed unresolved.
    pub fn from_logical(logical_address: &str) -> Self {
        match crate::resolver::split_host_port(logical_address) {
            Ok((host, port)) => match port.parse::<u16>() {
                Ok(port) => Self::new(host, port),
                Err(_) => Self::raw(logical_address),
            },
            Err(_) => Self::raw(logical_address),
        }
    }

    fn raw(address: &str) -> Self {
        Self {
            host: address.to_string(),
            port: None,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) if self.host.contains(':') => write!(f, "[{}]:{}", self.host, port),
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => write!(f, "{}", self.host),
        }
    }
}

/// Endpoints behind one logical address at check time, in resolver order.
pub type ConnectionSet = Vec<Endpoint>;

/// Outcome of probing one endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeStatus {
    /// The endpoint answered the liveness command
    Healthy,
    /// Connecting or probing failed; carries the error description
    Unhealthy(String),
}

impl ProbeStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, ProbeStatus::Healthy)
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeStatus::Healthy => f.write_str(OK_STATUS),
            ProbeStatus::Unhealthy(message) => f.write_str(message),
        }
    }
}

/// A labeled probe result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// `<role identifier>-<index>`
    pub label: String,
    pub status: ProbeStatus,
}

impl ProbeOutcome {
    pub fn new(role_identifier: &str, index: usize, status: ProbeStatus) -> Self {
        Self {
            label: format!("{}-{}", role_identifier, index),
            status,
        }
    }
}

/// Probe results for every endpoint behind one role.
///
/// `healthy_count <= total_checked == outcomes.len()` holds as long as
/// outcomes are only added through [`record`](Self::record) with distinct
/// labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHealthReport {
    /// Host part of the logical address, or the role's default name
    pub role_identifier: String,
    pub total_checked: usize,
    pub healthy_count: usize,
    pub outcomes: BTreeMap<String, ProbeStatus>,
}

impl RoleHealthReport {
    pub fn new(role_identifier: impl Into<String>) -> Self {
        Self {
            role_identifier: role_identifier.into(),
            total_checked: 0,
            healthy_count: 0,
            outcomes: BTreeMap::new(),
        }
    }

    /// Add one probe outcome and update the counts
    pub fn record(&mut self, outcome: ProbeOutcome) {
        self.total_checked += 1;
        if outcome.status.is_healthy() {
            self.healthy_count += 1;
        }
        self.outcomes.insert(outcome.label, outcome.status);
    }
}

/// Health check response body: label -> status text.
pub type AggregateHealth = BTreeMap<String, String>;

/// Merge role reports into the response body.
///
/// Always contains `"self": "ok"`. When two reports share a label the later
/// one wins.
pub fn merge_reports<'a>(reports: impl IntoIterator<Item = &'a RoleHealthReport>) -> AggregateHealth {
    let mut health = AggregateHealth::new();
    health.insert(SELF_LABEL.to_string(), OK_STATUS.to_string());

    for report in reports {
        for (label, status) in &report.outcomes {
            health.insert(label.clone(), status.to_string());
        }
    }

    health
}
