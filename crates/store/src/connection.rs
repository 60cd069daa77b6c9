//! Raw connection abstraction over the key-value store.

use async_trait::async_trait;
use common::{Error, Result};

/// Key holding the todo list.
pub const LIST_KEY: &str = "todo";

/// Range read window: the most recent entries, up to 100.
pub const RANGE_START: isize = -100;
pub const RANGE_STOP: isize = 100;

/// Reject addresses a TCP dialer cannot use: the port must be present and
/// numeric. Nothing is filled in, so `redis-slave` is an error rather than
/// `redis-slave:6379`.
pub fn check_dial_address(address: &str) -> Result<()> {
    let err = |reason: &str| Error::connectivity(format!("dial tcp: address {}: {}", address, reason));

    let port = match address.strip_prefix('[') {
        Some(bracketed) => match bracketed.split_once("]:") {
            Some((_, port)) => port,
            None => return Err(err("missing port in address")),
        },
        None => match address.rsplit_once(':') {
            Some((host, _)) if host.contains(':') => return Err(err("too many colons in address")),
            Some((_, port)) => port,
            None => return Err(err("missing port in address")),
        },
    };

    port.parse::<u16>()
        .map(|_| ())
        .map_err(|_| err("invalid port"))
}

/// An open connection to one store endpoint.
///
/// Connections are acquired per operation and must be closed by the caller
/// before it returns, on success and on failure.
#[async_trait]
pub trait StoreConnection: Send {
    /// Liveness probe (`PING`)
    async fn ping(&mut self) -> Result<()>;

    /// Ranged list read (`LRANGE key start stop`)
    async fn range(&mut self, key: &str, start: isize, stop: isize) -> Result<Vec<String>>;

    /// Append to the tail of the list (`RPUSH key value`)
    async fn push(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove up to `count` entries equal to `value` (`LREM key count value`)
    async fn remove(&mut self, key: &str, count: isize, value: &str) -> Result<()>;

    /// Release the connection. Further commands fail.
    async fn close(&mut self);
}

/// Opens connections to concrete store endpoints.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connect to `address` (`host:port`) authenticating with `password`.
    ///
    /// An empty password means no authentication.
    async fn connect(&self, address: &str, password: &str) -> Result<Box<dyn StoreConnection>>;
}
