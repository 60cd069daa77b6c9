//! Todo list access with replica-preferred reads.

use crate::config::{RoleConfig, StoreConfig};
use crate::connection::{Connector, LIST_KEY, RANGE_START, RANGE_STOP};
use common::Result;
use std::sync::Arc;
use tracing::{debug, warn};

/// Reads and writes the todo list against the configured roles.
pub struct TodoStore {
    config: StoreConfig,
    connector: Arc<dyn Connector>,
}

impl TodoStore {
    /// Create a new todo store
    pub fn new(config: StoreConfig, connector: Arc<dyn Connector>) -> Self {
        Self { config, connector }
    }

    /// Get the store configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Read the most recent todos.
    ///
    /// Tries the replica first. On any error the master is asked once and
    /// its result, success or error, is returned as is.
    pub async fn read_all(&self) -> Result<Vec<String>> {
        match self.range(&self.config.slave).await {
            Ok(items) => Ok(items),
            Err(e) => {
                warn!(
                    slave = %self.config.slave.address,
                    error = %e,
                    "Fallback using store master"
                );
                self.range(&self.config.master).await
            }
        }
    }

    /// Append a todo on the master.
    pub async fn append(&self, todo: &str) -> Result<()> {
        let role = &self.config.master;
        let mut conn = self.connector.connect(&role.address, &role.password).await?;
        let result = conn.push(LIST_KEY, todo).await;
        conn.close().await;

        debug!(master = %role.address, ok = result.is_ok(), "Appended todo");
        result
    }

    /// Remove the first todo equal to `todo` on the master.
    pub async fn remove(&self, todo: &str) -> Result<()> {
        let role = &self.config.master;
        let mut conn = self.connector.connect(&role.address, &role.password).await?;
        let result = conn.remove(LIST_KEY, 1, todo).await;
        conn.close().await;

        debug!(master = %role.address, ok = result.is_ok(), "Removed todo");
        result
    }

    async fn range(&self, role: &RoleConfig) -> Result<Vec<String>> {
        let mut conn = self.connector.connect(&role.address, &role.password).await?;
        let result = conn.range(LIST_KEY, RANGE_START, RANGE_STOP).await;
        conn.close().await;
        result
    }
}
