//! In-process store connector.
//!
//! Lists live in memory, keyed by a backing name. Several addresses can be
//! aliased onto one backing to emulate replicas that mirror a master. Any
//! address can be switched down, after which connects and commands against
//! it fail with the configured message.

use crate::connection::{Connector, StoreConnection, check_dial_address};
use async_trait::async_trait;
use common::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct MemoryState {
    /// backing name -> key -> list
    lists: HashMap<String, HashMap<String, Vec<String>>>,
    /// address -> backing name
    aliases: HashMap<String, String>,
    /// address -> failure message
    down: HashMap<String, String>,
    /// address -> failure message for commands only; connects still succeed
    failing: HashMap<String, String>,
    /// address -> required password
    passwords: HashMap<String, String>,
    /// address -> commands issued, in order
    commands: HashMap<String, Vec<String>>,
    connects: HashMap<String, usize>,
    open: usize,
}

impl MemoryState {
    fn backing(&self, address: &str) -> String {
        self.aliases
            .get(address)
            .cloned()
            .unwrap_or_else(|| address.to_string())
    }

    fn check_up(&self, address: &str) -> Result<()> {
        match self.down.get(address) {
            Some(message) => Err(Error::connectivity(message)),
            None => Ok(()),
        }
    }
}

/// In-memory [`Connector`] with failure injection.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryConnector {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Route `address` to the lists stored under `backing`.
    pub fn alias(&self, address: impl Into<String>, backing: impl Into<String>) {
        self.lock().aliases.insert(address.into(), backing.into());
    }

    /// Make every connect and command against `address` fail with `message`.
    pub fn set_down(&self, address: impl Into<String>, message: impl Into<String>) {
        self.lock().down.insert(address.into(), message.into());
    }

    /// Undo [`set_down`](Self::set_down) and [`set_failing`](Self::set_failing).
    pub fn set_up(&self, address: &str) {
        let mut state = self.lock();
        state.down.remove(address);
        state.failing.remove(address);
    }

    /// Accept connections to `address` but fail every command with `message`.
    pub fn set_failing(&self, address: impl Into<String>, message: impl Into<String>) {
        self.lock().failing.insert(address.into(), message.into());
    }

    /// Require `password` for connections to `address`.
    pub fn require_password(&self, address: impl Into<String>, password: impl Into<String>) {
        self.lock().passwords.insert(address.into(), password.into());
    }

    /// Replace the list stored under `key` for `address`.
    pub fn seed(&self, address: &str, key: &str, values: &[&str]) {
        let mut state = self.lock();
        let backing = state.backing(address);
        state
            .lists
            .entry(backing)
            .or_default()
            .insert(key.to_string(), values.iter().map(|v| v.to_string()).collect());
    }

    /// Current contents of the list under `key` for `address`.
    pub fn list(&self, address: &str, key: &str) -> Vec<String> {
        let state = self.lock();
        let backing = state.backing(address);
        state
            .lists
            .get(&backing)
            .and_then(|lists| lists.get(key))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of successful connects to `address`.
    pub fn connects(&self, address: &str) -> usize {
        self.lock().connects.get(address).copied().unwrap_or(0)
    }

    /// Commands issued against `address`, in order.
    pub fn commands(&self, address: &str) -> Vec<String> {
        self.lock()
            .commands
            .get(address)
            .cloned()
            .unwrap_or_default()
    }

    /// Connections opened and not yet closed.
    pub fn open_connections(&self) -> usize {
        self.lock().open
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, address: &str, password: &str) -> Result<Box<dyn StoreConnection>> {
        let mut state = self.lock();
        state.check_up(address)?;
        check_dial_address(address)?;

        if let Some(required) = state.passwords.get(address) {
            if required != password {
                return Err(Error::connectivity(
                    "WRONGPASS invalid username-password pair or user is disabled.",
                ));
            }
        }

        *state.connects.entry(address.to_string()).or_default() += 1;
        state.open += 1;

        Ok(Box::new(MemoryConnection {
            address: address.to_string(),
            state: self.state.clone(),
            closed: false,
        }))
    }
}

struct MemoryConnection {
    address: String,
    state: Arc<Mutex<MemoryState>>,
    closed: bool,
}

impl MemoryConnection {
    /// Run `f` against this connection's backing lists after recording the
    /// command and checking the address is up.
    fn with_lists<T>(
        &self,
        command: String,
        f: impl FnOnce(&mut HashMap<String, Vec<String>>) -> T,
    ) -> Result<T> {
        if self.closed {
            return Err(Error::connectivity("redis: client is closed"));
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .commands
            .entry(self.address.clone())
            .or_default()
            .push(command);
        state.check_up(&self.address)?;
        if let Some(message) = state.failing.get(&self.address) {
            return Err(Error::connectivity(message));
        }

        let backing = state.backing(&self.address);
        Ok(f(state.lists.entry(backing).or_default()))
    }
}

#[async_trait]
impl StoreConnection for MemoryConnection {
    async fn ping(&mut self) -> Result<()> {
        self.with_lists("PING".to_string(), |_| ())
    }

    async fn range(&mut self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        self.with_lists(format!("LRANGE {} {} {}", key, start, stop), |lists| {
            let list = lists.get(key).map(Vec::as_slice).unwrap_or_default();
            let len = list.len() as isize;
            let start = if start < 0 { (len + start).max(0) } else { start };
            // stop is inclusive
            let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

            if start > stop || start >= len {
                Vec::new()
            } else {
                list[start as usize..=stop as usize].to_vec()
            }
        })
    }

    async fn push(&mut self, key: &str, value: &str) -> Result<()> {
        self.with_lists(format!("RPUSH {} {}", key, value), |lists| {
            lists.entry(key.to_string()).or_default().push(value.to_string());
        })
    }

    async fn remove(&mut self, key: &str, count: isize, value: &str) -> Result<()> {
        self.with_lists(format!("LREM {} {} {}", key, count, value), |lists| {
            let Some(list) = lists.get_mut(key) else {
                return;
            };

            let limit = if count == 0 { usize::MAX } else { count.unsigned_abs() };
            let mut removed = 0;
            if count >= 0 {
                list.retain(|item| {
                    if removed < limit && item == value {
                        removed += 1;
                        false
                    } else {
                        true
                    }
                });
            } else {
                // negative count removes from the tail
                let mut kept: Vec<String> = Vec::with_capacity(list.len());
                for item in list.drain(..).rev() {
                    if removed < limit && item == value {
                        removed += 1;
                    } else {
                        kept.push(item);
                    }
                }
                kept.reverse();
                *list = kept;
            }
        })
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.open = state.open.saturating_sub(1);
        }
    }
}
