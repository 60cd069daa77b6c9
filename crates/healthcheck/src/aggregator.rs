//! Per-role aggregation of probe outcomes.

use crate::checkers::EndpointProber;
use crate::resolver::ConnectionResolver;
use crate::types::{Endpoint, ProbeOutcome, RoleHealthReport};
use std::sync::Arc;
use tracing::{info, warn};

/// Probes every endpoint behind one role and counts the results
pub struct RoleAggregator {
    resolver: ConnectionResolver,
    prober: Arc<dyn EndpointProber>,
}

impl RoleAggregator {
    /// Create a new role aggregator
    pub fn new(resolver: ConnectionResolver, prober: Arc<dyn EndpointProber>) -> Self {
        Self { resolver, prober }
    }

    /// Resolve `logical_address` and probe each endpoint in order.
    ///
    /// When resolution fails the logical address itself is probed as the only
    /// endpoint, so the report always has at least one outcome. Outcomes are
    /// labeled `<role_identifier>-<index>`.
    pub async fn aggregate_role(
        &self,
        role_identifier: &str,
        hostname: &str,
        logical_address: &str,
        password: &str,
    ) -> RoleHealthReport {
        let endpoints = match self.resolver.resolve(logical_address).await {
            Ok(endpoints) => endpoints,
            Err(e) => {
                warn!(
                    role = role_identifier,
                    address = logical_address,
                    error = %e,
                    "Endpoint discovery failed, probing logical address"
                );
                vec![Endpoint::from_logical(logical_address)]
            }
        };

        let mut report = RoleHealthReport::new(role_identifier);
        for (index, endpoint) in endpoints.iter().enumerate() {
            let status = self.prober.probe(endpoint, password).await;
            report.record(ProbeOutcome::new(role_identifier, index, status));
        }

        info!(
            role = role_identifier,
            instance = hostname,
            prober = self.prober.name(),
            total = report.total_checked,
            healthy = report.healthy_count,
            "Role health checked"
        );

        report
    }
}
