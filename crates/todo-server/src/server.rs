//! Todo server wiring.

use crate::config::{Backend, Config};
use crate::http_server::{AppState, HttpServer};
use healthcheck::{
    ConnectionResolver, DnsLookup, HealthMetrics, HealthOrchestrator, HostLookup, PingProber,
    RoleAggregator,
};
use std::sync::Arc;
use store::{Connector, MemoryConnector, RedisConnector, TodoStore};
use tracing::{info, warn};

/// Todo server
pub struct TodoServer {
    config: Config,
    app_version: String,
}

impl TodoServer {
    /// Create a new todo server
    pub fn new(config: Config, app_version: impl Into<String>) -> Self {
        Self {
            config,
            app_version: app_version.into(),
        }
    }

    /// Build the handler state: connector, store, metrics and orchestrator.
    ///
    /// Metrics are registered here, once per process.
    pub fn build_state(&self) -> AppState {
        let connector: Arc<dyn Connector> = match self.config.store.backend {
            Backend::Redis => Arc::new(RedisConnector::new()),
            Backend::Memory => {
                warn!("Using in-memory store, data is lost on exit");
                Arc::new(MemoryConnector::new())
            }
        };

        let lookup: Arc<dyn HostLookup> = match DnsLookup::from_system_conf() {
            Ok(lookup) => Arc::new(lookup),
            Err(e) => {
                warn!(error = %e, "System resolver configuration unavailable, using defaults");
                Arc::new(DnsLookup::with_defaults())
            }
        };

        let store_config = self.config.to_store_config(&self.app_version);
        info!(
            master = %store_config.master.address,
            slave = %store_config.slave.address,
            version = %store_config.app_version,
            "Store roles configured"
        );

        let metrics = Arc::new(HealthMetrics::new(&self.config.metrics.prefix));
        info!("Registered store metrics");

        let aggregator = Arc::new(RoleAggregator::new(
            ConnectionResolver::new(lookup),
            Arc::new(PingProber::new(connector.clone())),
        ));

        AppState {
            orchestrator: Arc::new(HealthOrchestrator::new(
                store_config.clone(),
                aggregator,
                metrics,
            )),
            store: Arc::new(TodoStore::new(store_config, connector)),
            health_timeout: self.config.server.health_timeout,
        }
    }

    /// Run the server
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("Starting todo server");

        let state = self.build_state();
        HttpServer::new(state, self.config.server.listen_addr.clone())
            .run()
            .await?;

        info!("Todo server stopped");
        Ok(())
    }
}
