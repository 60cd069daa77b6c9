//! Prometheus gauges for store topology health.

use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;

/// Default metric name prefix
pub const DEFAULT_PREFIX: &str = "todoapp";

/// Labels for the per-process store gauges
#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RedisLabels {
    /// Hostname of the process that ran the check
    pub instance: String,
    /// Application version
    pub version: String,
}

impl RedisLabels {
    fn new(instance: &str, version: &str) -> Self {
        Self {
            instance: instance.to_string(),
            version: version.to_string(),
        }
    }
}

/// Registry holding the four store health gauges.
///
/// Created once at startup and shared by reference. Every health check
/// overwrites the gauges for its `(instance, version)` label set.
pub struct HealthMetrics {
    registry: Registry,

    /// Masters discovered on the last check
    masters_total: Family<RedisLabels, Gauge>,
    /// Masters that answered on the last check
    masters_healthy_total: Family<RedisLabels, Gauge>,
    /// Replicas discovered on the last check
    slaves_total: Family<RedisLabels, Gauge>,
    /// Replicas that answered on the last check
    slaves_healthy_total: Family<RedisLabels, Gauge>,
}

impl HealthMetrics {
    /// Create and register the gauges under `prefix`
    pub fn new(prefix: &str) -> Self {
        let mut registry = Registry::with_prefix(prefix);

        let masters_total = Family::<RedisLabels, Gauge>::default();
        registry.register(
            "redis_masters_total",
            "Total count of available redis masters",
            masters_total.clone(),
        );

        let masters_healthy_total = Family::<RedisLabels, Gauge>::default();
        registry.register(
            "redis_masters_healthy_total",
            "Total count of healthy redis masters",
            masters_healthy_total.clone(),
        );

        let slaves_total = Family::<RedisLabels, Gauge>::default();
        registry.register(
            "redis_slaves_total",
            "Total count of available redis slaves",
            slaves_total.clone(),
        );

        let slaves_healthy_total = Family::<RedisLabels, Gauge>::default();
        registry.register(
            "redis_slaves_healthy_total",
            "Total count of healthy redis slaves",
            slaves_healthy_total.clone(),
        );

        Self {
            registry,
            masters_total,
            masters_healthy_total,
            slaves_total,
            slaves_healthy_total,
        }
    }

    /// Get the underlying registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Overwrite the master gauges
    pub fn set_masters(&self, instance: &str, version: &str, total: usize, healthy: usize) {
        let labels = RedisLabels::new(instance, version);
        self.masters_total.get_or_create(&labels).set(total as i64);
        self.masters_healthy_total
            .get_or_create(&labels)
            .set(healthy as i64);
    }

    /// Overwrite the replica gauges
    pub fn set_slaves(&self, instance: &str, version: &str, total: usize, healthy: usize) {
        let labels = RedisLabels::new(instance, version);
        self.slaves_total.get_or_create(&labels).set(total as i64);
        self.slaves_healthy_total
            .get_or_create(&labels)
            .set(healthy as i64);
    }

    /// Current `(total, healthy)` master gauge values, zero when never set.
    /// Reading does not create a series.
    pub fn masters(&self, instance: &str, version: &str) -> (i64, i64) {
        let labels = RedisLabels::new(instance, version);
        (
            read_gauge(&self.masters_total, &labels),
            read_gauge(&self.masters_healthy_total, &labels),
        )
    }

    /// Current `(total, healthy)` replica gauge values, zero when never set.
    pub fn slaves(&self, instance: &str, version: &str) -> (i64, i64) {
        let labels = RedisLabels::new(instance, version);
        (
            read_gauge(&self.slaves_total, &labels),
            read_gauge(&self.slaves_healthy_total, &labels),
        )
    }

    /// Encode all gauges in Prometheus text format
    pub fn encode(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

fn read_gauge(family: &Family<RedisLabels, Gauge>, labels: &RedisLabels) -> i64 {
    family.get(labels).map(|gauge| gauge.get()).unwrap_or(0)
}

impl Default for HealthMetrics {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
