//! Data access for the todo list kept in a master/replica key-value store.
//!
//! The store is only ever touched through the [`Connector`] and
//! [`StoreConnection`] traits:
//! - [`RedisConnector`] talks to a real Redis deployment
//! - [`MemoryConnector`] keeps lists in process, for local runs and tests
//!
//! [`TodoStore`] implements the read/write policy: reads prefer the replica
//! role and fall back to the master exactly once, writes only go to the
//! master.
//!
//! # Example
//!
//! ```no_run
//! use std::collections::HashMap;
//! use std::sync::Arc;
//! use store::{RedisConnector, StoreConfig, TodoStore};
//!
//! # async fn example() -> common::Result<()> {
//! let config = StoreConfig::from_map(&HashMap::new(), "1.0.0");
//! let store = TodoStore::new(config, Arc::new(RedisConnector::new()));
//!
//! store.append("buy milk").await?;
//! let todos = store.read_all().await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod connection;
pub mod memory;
pub mod redis_client;
pub mod todos;

pub use config::{RoleConfig, StoreConfig};
pub use connection::{Connector, StoreConnection};
pub use memory::MemoryConnector;
pub use redis_client::RedisConnector;
pub use todos::TodoStore;
