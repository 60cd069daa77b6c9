//! Configuration loading and validation for the todo server

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use store::StoreConfig;
use thiserror::Error;
use validator::{Validate, ValidationError};

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] validator::ValidationErrors),
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub metrics: MetricsSettings,

    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Validate for Config {
    fn validate(&self) -> Result<(), validator::ValidationErrors> {
        self.server.validate()?;
        self.metrics.validate()?;

        if let Err(error) = self.store.validate_values() {
            let mut errors = validator::ValidationErrors::new();
            errors.add("store", error);
            return Err(errors);
        }
        Ok(())
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServerSettings {
    #[validate(custom = "validate_listen_addr")]
    pub listen_addr: String,

    /// Deadline for one `/health` request; unbounded when absent
    #[serde(default, with = "humantime_serde")]
    pub health_timeout: Option<Duration>,
}

/// Which connector backs the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Redis,
    Memory,
}

/// Store settings: the backend plus the role keys (`master`,
/// `masterPassword`, `slave`, `slavePassword`).
///
/// Scalars are read as text, so `masterPassword: 12345` is `"12345"`. YAML
/// drops leading zeros from unquoted numbers; quote such passwords.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: Backend,

    #[serde(flatten)]
    pub settings: HashMap<String, serde_yaml::Value>,
}

impl StoreSettings {
    /// Role keys as text. Null and non-scalar values count as absent.
    pub fn role_settings(&self) -> HashMap<String, String> {
        self.settings
            .iter()
            .filter_map(|(key, value)| scalar_text(value).map(|text| (key.clone(), text)))
            .collect()
    }

    fn validate_values(&self) -> Result<(), ValidationError> {
        for (key, value) in &self.settings {
            if matches!(
                value,
                serde_yaml::Value::Sequence(_)
                    | serde_yaml::Value::Mapping(_)
                    | serde_yaml::Value::Tagged(_)
            ) {
                let mut error = ValidationError::new("store_value_not_scalar");
                error.message = Some(format!("store.{} must be a string", key).into());
                return Err(error);
            }
        }
        Ok(())
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(text) => Some(text.clone()),
        serde_yaml::Value::Number(number) => Some(number.to_string()),
        serde_yaml::Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Metrics settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct MetricsSettings {
    #[validate(length(min = 1))]
    pub prefix: String,
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl LoggingSettings {
    pub fn is_json(&self) -> bool {
        self.format.as_deref() == Some("json")
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            health_timeout: None,
        }
    }
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            prefix: healthcheck::metrics::DEFAULT_PREFIX.to_string(),
        }
    }
}

fn validate_listen_addr(addr: &str) -> Result<(), ValidationError> {
    addr.trim()
        .parse::<SocketAddr>()
        .map(|_| ())
        .map_err(|_| ValidationError::new("listen_addr_invalid"))
}

impl Config {
    /// Load configuration from default search paths
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                Self::load_from_file(&path)
            }
            None => {
                tracing::info!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/todo-server/todo-server.yaml")];

        if let Some(home_path) = Self::home_config_path() {
            paths.push(home_path);
        }

        paths.push(PathBuf::from("./todo-server.yaml"));

        paths.into_iter().find(|p: &PathBuf| p.exists() && p.is_file())
    }

    /// Get home directory config path
    fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/todo-server/todo-server.yaml"))
    }

    /// Role configuration with defaults applied
    pub fn to_store_config(&self, app_version: &str) -> StoreConfig {
        StoreConfig::from_map(&self.store.role_settings(), app_version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.store.backend, Backend::Redis);
        assert_eq!(config.metrics.prefix, "todoapp");
    }

    #[test]
    fn test_valid_yaml_parsing() {
        let yaml = r#"
server:
  listen_addr: "127.0.0.1:3000"
  health_timeout: 5s

store:
  backend: memory
  master: "m:6379"
  masterPassword: "secret"
  slave: "s:6379"

metrics:
  prefix: todo

logging:
  level: debug
  format: json
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:3000");
        assert_eq!(config.server.health_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.store.backend, Backend::Memory);
        assert_eq!(config.metrics.prefix, "todo");
        assert!(config.logging.is_json());

        let store = config.to_store_config("2.0.0");
        assert_eq!(store.master.address, "m:6379");
        assert_eq!(store.master.password, "secret");
        assert_eq!(store.slave.address, "s:6379");
        assert_eq!(store.slave.password, "");
        assert_eq!(store.app_version, "2.0.0");
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let yaml = r#"
server:
  listen_addr: "127.0.0.1:3000"
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.server.health_timeout, None);
        assert_eq!(config.store.backend, Backend::Redis);

        let store = config.to_store_config("dev");
        assert_eq!(store.master.address, "redis-master:6379");
        assert_eq!(store.slave.address, "redis-slave:6379");
    }

    #[test]
    fn test_numeric_password_read_as_text() {
        let yaml = r#"
store:
  master: "m:6379"
  masterPassword: 12345
  slavePassword: true
"#;

        let config = Config::from_yaml(yaml).unwrap();
        let store = config.to_store_config("dev");
        assert_eq!(store.master.address, "m:6379");
        assert_eq!(store.master.password, "12345");
        assert_eq!(store.slave.address, "redis-slave:6379");
        assert_eq!(store.slave.password, "true");
    }

    #[test]
    fn test_null_role_value_uses_default() {
        let yaml = r#"
store:
  slave: ~
"#;

        let config = Config::from_yaml(yaml).unwrap();
        assert_eq!(config.to_store_config("dev").slave.address, "redis-slave:6379");
    }

    #[test]
    fn test_nested_role_value_rejected() {
        let yaml = r#"
store:
  master:
    host: m
    port: 6379
"#;

        assert!(matches!(
            Config::from_yaml(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_invalid_listen_addr() {
        let yaml = r#"
server:
  listen_addr: "localhost"
"#;

        assert!(matches!(
            Config::from_yaml(yaml),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let yaml = r#"
store:
  backend: memcached
"#;

        assert!(matches!(
            Config::from_yaml(yaml),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let yaml = r#"
metrics:
  prefix: ""
"#;

        assert!(Config::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_listen_addr_validation() {
        assert!(validate_listen_addr("0.0.0.0:8080").is_ok());
        assert!(validate_listen_addr("[::]:8080").is_ok());

        assert!(validate_listen_addr("").is_err());
        assert!(validate_listen_addr("8080").is_err());
        assert!(validate_listen_addr("example.com:8080").is_err());
    }
}
