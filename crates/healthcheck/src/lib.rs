//! Health monitoring for a master/replica key-value store.
//!
//! A logical address such as `redis-slave:6379` may front several replicas.
//! Each health check:
//! - resolves the logical address to concrete endpoints via DNS
//! - probes every endpoint with `PING`
//! - counts total and healthy endpoints per role
//! - publishes the counts as Prometheus gauges
//! - returns a `label -> status` mapping for the health endpoint
//!
//! # Example
//!
//! ```no_run
//! use healthcheck::{
//!     ConnectionResolver, DnsLookup, HealthMetrics, HealthOrchestrator, PingProber,
//!     RoleAggregator,
//! };
//! use std::sync::Arc;
//! use store::{RedisConnector, StoreConfig};
//!
//! # async fn example() -> common::Result<()> {
//! let resolver = ConnectionResolver::new(Arc::new(DnsLookup::from_system_conf()?));
//! let prober = Arc::new(PingProber::new(Arc::new(RedisConnector::new())));
//! let aggregator = Arc::new(RoleAggregator::new(resolver, prober));
//! let metrics = Arc::new(HealthMetrics::default());
//!
//! let orchestrator = HealthOrchestrator::new(StoreConfig::default(), aggregator, metrics);
//! let health = orchestrator.check_health().await;
//! assert_eq!(health["self"], "ok");
//! # Ok(())
//! # }
//! ```

pub mod aggregator;
pub mod checkers;
pub mod metrics;
pub mod orchestrator;
pub mod resolver;
pub mod types;

pub use aggregator::RoleAggregator;
pub use checkers::{EndpointProber, PingProber};
pub use metrics::HealthMetrics;
pub use orchestrator::{HealthOrchestrator, process_hostname};
pub use resolver::{ConnectionResolver, DnsLookup, HostLookup, StaticLookup};
pub use types::{
    AggregateHealth, ConnectionSet, Endpoint, OK_STATUS, ProbeOutcome, ProbeStatus,
    RoleHealthReport,
};
