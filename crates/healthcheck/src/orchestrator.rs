//! Health check across both store roles.

use crate::aggregator::RoleAggregator;
use crate::metrics::HealthMetrics;
use crate::resolver::host_from_address;
use crate::types::{AggregateHealth, RoleHealthReport, merge_reports};
use std::sync::Arc;
use store::{RoleConfig, StoreConfig};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Hostname used in metric labels when the real one cannot be read.
pub const UNKNOWN_HOSTNAME: &str = "UNKNOWN";

/// Hostname of this process, or [`UNKNOWN_HOSTNAME`].
pub fn process_hostname() -> String {
    match nix::unistd::gethostname() {
        Ok(name) => name.to_string_lossy().into_owned(),
        Err(e) => {
            warn!(error = %e, "Failed to read hostname");
            UNKNOWN_HOSTNAME.to_string()
        }
    }
}

/// Runs the master and replica checks in parallel and publishes the counts.
pub struct HealthOrchestrator {
    config: StoreConfig,
    aggregator: Arc<RoleAggregator>,
    metrics: Arc<HealthMetrics>,
}

impl HealthOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        config: StoreConfig,
        aggregator: Arc<RoleAggregator>,
        metrics: Arc<HealthMetrics>,
    ) -> Self {
        Self {
            config,
            aggregator,
            metrics,
        }
    }

    /// Get the metrics registry
    pub fn metrics(&self) -> &Arc<HealthMetrics> {
        &self.metrics
    }

    /// Check both roles and return the merged health mapping.
    ///
    /// Never fails: unreachable endpoints show up as error text in the
    /// mapping and as a lower healthy gauge. There is no deadline; callers
    /// that need one must wrap this call.
    pub async fn check_health(&self) -> AggregateHealth {
        let hostname = process_hostname();
        let master_host = host_from_address(&self.config.master.address, &self.config.master.role_name);
        let slave_host = host_from_address(&self.config.slave.address, &self.config.slave.role_name);

        let master = self.spawn_role(master_host.clone(), &hostname, &self.config.master);
        let slave = self.spawn_role(slave_host.clone(), &hostname, &self.config.slave);
        let (master, slave) = tokio::join!(master, slave);

        let mut reports: Vec<RoleHealthReport> = Vec::with_capacity(2);
        for joined in [master, slave] {
            match joined {
                Ok(report) => reports.push(report),
                Err(e) => warn!(error = %e, "Role health task failed"),
            }
        }

        // Matched by identifier: if both roles share a host, the later report wins.
        let version = &self.config.app_version;
        for report in &reports {
            if report.role_identifier == master_host {
                self.metrics
                    .set_masters(&hostname, version, report.total_checked, report.healthy_count);
            }
            if report.role_identifier == slave_host {
                self.metrics
                    .set_slaves(&hostname, version, report.total_checked, report.healthy_count);
            }
        }

        let health = merge_reports(&reports);
        debug!(entries = health.len(), "Health check complete");
        health
    }

    fn spawn_role(
        &self,
        role_identifier: String,
        hostname: &str,
        role: &RoleConfig,
    ) -> JoinHandle<RoleHealthReport> {
        let aggregator = self.aggregator.clone();
        let hostname = hostname.to_string();
        let address = role.address.clone();
        let password = role.password.clone();

        tokio::spawn(async move {
            aggregator
                .aggregate_role(&role_identifier, &hostname, &address, &password)
                .await
        })
    }
}

