//! Role configuration for the master and replica store addresses.

use std::collections::HashMap;

/// Default logical address of the master role.
pub const DEFAULT_MASTER_ADDRESS: &str = "redis-master:6379";

/// Default logical address of the replica role.
pub const DEFAULT_SLAVE_ADDRESS: &str = "redis-slave:6379";

/// Name used for the master role in reports when its host cannot be extracted.
pub const MASTER_ROLE_NAME: &str = "redis-master";

/// Name used for the replica role in reports when its host cannot be extracted.
pub const SLAVE_ROLE_NAME: &str = "redis-slave";

/// Configuration keys understood by [`StoreConfig::from_map`].
pub const KEY_MASTER: &str = "master";
pub const KEY_MASTER_PASSWORD: &str = "masterPassword";
pub const KEY_SLAVE: &str = "slave";
pub const KEY_SLAVE_PASSWORD: &str = "slavePassword";

/// One configured role (master or replica).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleConfig {
    /// Logical `host:port`, possibly a DNS name fronting several instances
    pub address: String,

    /// Plain password, empty when the store has no auth
    pub password: String,

    /// Role name used in reports when no host can be taken from `address`
    pub role_name: String,
}

impl RoleConfig {
    pub fn new(
        address: impl Into<String>,
        password: impl Into<String>,
        role_name: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            password: password.into(),
            role_name: role_name.into(),
        }
    }
}

/// Store configuration: both roles plus the version used as a metrics label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub master: RoleConfig,
    pub slave: RoleConfig,
    pub app_version: String,
}

impl StoreConfig {
    /// Build the configuration from a string-keyed mapping.
    ///
    /// Absent keys take their defaults; present keys are used as given, even
    /// when empty.
    pub fn from_map(settings: &HashMap<String, String>, app_version: impl Into<String>) -> Self {
        let get = |key: &str, default: &str| {
            settings
                .get(key)
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };

        Self {
            master: RoleConfig::new(
                get(KEY_MASTER, DEFAULT_MASTER_ADDRESS),
                get(KEY_MASTER_PASSWORD, ""),
                MASTER_ROLE_NAME,
            ),
            slave: RoleConfig::new(
                get(KEY_SLAVE, DEFAULT_SLAVE_ADDRESS),
                get(KEY_SLAVE_PASSWORD, ""),
                SLAVE_ROLE_NAME,
            ),
            app_version: app_version.into(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::from_map(&HashMap::new(), env!("CARGO_PKG_VERSION"))
    }
}
