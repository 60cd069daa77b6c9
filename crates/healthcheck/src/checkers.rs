//! Liveness probes against single store endpoints.

use crate::types::{Endpoint, ProbeStatus};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use store::Connector;
use tracing::{debug, warn};

/// Probes one concrete endpoint
#[async_trait]
pub trait EndpointProber: Send + Sync {
    /// Probe `endpoint`. Failures are reported in the status, never as an error.
    async fn probe(&self, endpoint: &Endpoint, password: &str) -> ProbeStatus;

    /// Get the name of this prober
    fn name(&self) -> &str;
}

/// Opens a short-lived store connection and issues `PING`
pub struct PingProber {
    connector: Arc<dyn Connector>,
}

impl PingProber {
    /// Create a new ping prober
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }
}

#[async_trait]
impl EndpointProber for PingProber {
    async fn probe(&self, endpoint: &Endpoint, password: &str) -> ProbeStatus {
        let start = Instant::now();
        let address = endpoint.to_string();

        let mut conn = match self.connector.connect(&address, password).await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(endpoint = %address, error = %e, "Store connect failed");
                return ProbeStatus::Unhealthy(e.to_string());
            }
        };

        let result = conn.ping().await;
        conn.close().await;

        match result {
            Ok(()) => {
                debug!(endpoint = %address, duration_ms = start.elapsed().as_millis(), "Ping successful");
                ProbeStatus::Healthy
            }
            Err(e) => {
                warn!(endpoint = %address, error = %e, "Ping failed");
                ProbeStatus::Unhealthy(e.to_string())
            }
        }
    }

    fn name(&self) -> &str {
        "ping"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use store::MemoryConnector;

    #[tokio::test]
    async fn test_ping_healthy() {
        let connector = MemoryConnector::new();
        let prober = PingProber::new(Arc::new(connector.clone()));

        let status = prober.probe(&Endpoint::new("10.0.0.1", 6379), "").await;

        assert_eq!(status, ProbeStatus::Healthy);
        assert_eq!(connector.commands("10.0.0.1:6379"), vec!["PING"]);
        assert_eq!(connector.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_connect_failure_becomes_status() {
        let connector = MemoryConnector::new();
        connector.set_down("10.0.0.1:6379", "dial tcp 10.0.0.1:6379: connect: connection refused");
        let prober = PingProber::new(Arc::new(connector.clone()));

        let status = prober.probe(&Endpoint::new("10.0.0.1", 6379), "").await;

        assert_eq!(
            status,
            ProbeStatus::Unhealthy("dial tcp 10.0.0.1:6379: connect: connection refused".into())
        );
        assert_eq!(status.to_string(), "dial tcp 10.0.0.1:6379: connect: connection refused");
    }

    #[tokio::test]
    async fn test_command_failure_still_releases_connection() {
        let connector = MemoryConnector::new();
        connector.set_failing("10.0.0.1:6379", "NOAUTH Authentication required.");
        let prober = PingProber::new(Arc::new(connector.clone()));

        let status = prober.probe(&Endpoint::new("10.0.0.1", 6379), "").await;

        assert!(!status.is_healthy());
        assert_eq!(connector.connects("10.0.0.1:6379"), 1);
        assert_eq!(connector.open_connections(), 0);
    }

    #[tokio::test]
    async fn test_password_is_passed_through() {
        let connector = MemoryConnector::new();
        connector.require_password("10.0.0.1:6379", "secret");
        let prober = PingProber::new(Arc::new(connector));

        let endpoint = Endpoint::new("10.0.0.1", 6379);
        assert!(prober.probe(&endpoint, "secret").await.is_healthy());
        assert!(!prober.probe(&endpoint, "").await.is_healthy());
    }

    #[tokio::test]
    async fn test_unresolved_endpoint_uses_logical_address() {
        let connector = MemoryConnector::new();
        let prober = PingProber::new(Arc::new(connector.clone()));

        let status = prober.probe(&Endpoint::from_logical("redis-slave:6379"), "").await;

        assert!(status.is_healthy());
        assert_eq!(connector.connects("redis-slave:6379"), 1);
    }

    #[tokio::test]
    async fn test_portless_endpoint_is_unhealthy() {
        let connector = MemoryConnector::new();
        let prober = PingProber::new(Arc::new(connector.clone()));

        let status = prober.probe(&Endpoint::from_logical("redis-slave"), "").await;

        assert_eq!(
            status,
            ProbeStatus::Unhealthy("dial tcp: address redis-slave: missing port in address".into())
        );
        assert_eq!(connector.connects("redis-slave"), 0);
    }
}
