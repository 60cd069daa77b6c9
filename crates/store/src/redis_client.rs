//! Redis-backed store connector.

use crate::connection::{Connector, StoreConnection, check_dial_address};
use async_trait::async_trait;
use common::{Error, Result};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, IntoConnectionInfo};
use tracing::debug;

/// Connector that opens one Redis connection per call (database 0).
#[derive(Debug, Clone, Default)]
pub struct RedisConnector;

impl RedisConnector {
    /// Create a new Redis connector
    pub fn new() -> Self {
        Self
    }

    fn client(address: &str, password: &str) -> redis::RedisResult<redis::Client> {
        let mut info = format!("redis://{}/0", address)
            .as_str()
            .into_connection_info()?;
        if !password.is_empty() {
            info.redis.password = Some(password.to_string());
        }
        redis::Client::open(info)
    }
}

#[async_trait]
impl Connector for RedisConnector {
    async fn connect(&self, address: &str, password: &str) -> Result<Box<dyn StoreConnection>> {
        // the URL form would default a missing port to 6379
        check_dial_address(address)?;
        let client = Self::client(address, password).map_err(Error::connectivity)?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(Error::connectivity)?;

        debug!(address, "Redis connection opened");
        Ok(Box::new(RedisConnection {
            address: address.to_string(),
            conn: Some(conn),
        }))
    }
}

/// A single Redis connection. Dropping the inner handle closes the socket.
struct RedisConnection {
    address: String,
    conn: Option<MultiplexedConnection>,
}

impl RedisConnection {
    fn conn(&mut self) -> Result<&mut MultiplexedConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| Error::connectivity("redis: client is closed"))
    }
}

#[async_trait]
impl StoreConnection for RedisConnection {
    async fn ping(&mut self) -> Result<()> {
        let _: String = redis::cmd("PING")
            .query_async(self.conn()?)
            .await
            .map_err(Error::connectivity)?;
        Ok(())
    }

    async fn range(&mut self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        let items: Vec<String> = self
            .conn()?
            .lrange(key, start, stop)
            .await
            .map_err(Error::connectivity)?;
        Ok(items)
    }

    async fn push(&mut self, key: &str, value: &str) -> Result<()> {
        let _: i64 = self
            .conn()?
            .rpush(key, value)
            .await
            .map_err(Error::connectivity)?;
        Ok(())
    }

    async fn remove(&mut self, key: &str, count: isize, value: &str) -> Result<()> {
        let _: i64 = self
            .conn()?
            .lrem(key, count, value)
            .await
            .map_err(Error::connectivity)?;
        Ok(())
    }

    async fn close(&mut self) {
        if self.conn.take().is_some() {
            debug!(address = %self.address, "Redis connection closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_accepts_host_port() {
        assert!(RedisConnector::client("10.0.0.1:6379", "").is_ok());
        assert!(RedisConnector::client("redis-master:6379", "secret").is_ok());
    }

    #[tokio::test]
    async fn test_connect_without_port_fails_before_dialing() {
        let connector = RedisConnector::new();

        match connector.connect("redis-slave", "").await {
            Err(err) => {
                assert!(err.is_connectivity());
                assert_eq!(
                    err.to_string(),
                    "dial tcp: address redis-slave: missing port in address"
                );
            }
            Ok(_) => panic!("expected port-less address to be rejected"),
        }
    }

    #[tokio::test]
    async fn test_connect_refused_is_connectivity_error() {
        let connector = RedisConnector::new();

        // Nothing listens on port 1
        let result = connector.connect("127.0.0.1:1", "").await;
        match result {
            Err(err) => assert!(err.is_connectivity()),
            Ok(_) => panic!("expected connection to 127.0.0.1:1 to fail"),
        }
    }
}
