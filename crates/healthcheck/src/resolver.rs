//! Discovery of the concrete endpoints behind a logical address.

use crate::types::{ConnectionSet, Endpoint};
use async_trait::async_trait;
use common::{Error, Result};
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::{debug, warn};
use trust_dns_resolver::TokioAsyncResolver;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};

/// Split `host:port` or `[host]:port` into its parts.
pub fn split_host_port(address: &str) -> Result<(&str, &str)> {
    let err = |reason: &str| Error::resolution(format!("address {}: {}", address, reason));

    let (host, rest) = if let Some(bracketed) = address.strip_prefix('[') {
        let end = bracketed.find(']').ok_or_else(|| err("missing ']' in address"))?;
        let (host, rest) = (&bracketed[..end], &bracketed[end + 1..]);
        if host.contains('[') {
            return Err(err("unexpected '[' in address"));
        }
        if rest.contains(']') {
            return Err(err("unexpected ']' in address"));
        }
        (host, rest)
    } else {
        let colon = address.rfind(':').ok_or_else(|| err("missing port in address"))?;
        let host = &address[..colon];
        if host.contains(':') {
            return Err(err("too many colons in address"));
        }
        if address.contains('[') {
            return Err(err("unexpected '[' in address"));
        }
        if address.contains(']') {
            return Err(err("unexpected ']' in address"));
        }
        (host, &address[colon..])
    };

    let port = rest
        .strip_prefix(':')
        .ok_or_else(|| err("missing port in address"))?;
    if port.contains(':') {
        return Err(err("too many colons in address"));
    }

    Ok((host, port))
}

/// Host part of `address`, or `default` when it cannot be split.
pub fn host_from_address(address: &str, default: &str) -> String {
    match split_host_port(address) {
        Ok((host, _)) => host.to_string(),
        Err(e) => {
            warn!(address, default, error = %e, "Using default role name");
            default.to_string()
        }
    }
}

/// Host name to IP address lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostLookup: Send + Sync {
    /// Resolve `host` to its A/AAAA records
    async fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// DNS lookup through the system resolver configuration
pub struct DnsLookup {
    resolver: TokioAsyncResolver,
}

impl DnsLookup {
    /// Create a lookup from `/etc/resolv.conf` (or the platform equivalent)
    pub fn from_system_conf() -> Result<Self> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf().map_err(Error::resolution)?;
        Ok(Self { resolver })
    }

    /// Create a lookup against the resolver library's default upstreams
    pub fn with_defaults() -> Self {
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
        }
    }
}

#[async_trait]
impl HostLookup for DnsLookup {
    async fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>> {
        // IP literals resolve to themselves
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let lookup = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| Error::resolution(format!("lookup {}: {}", host, e)))?;
        Ok(lookup.iter().collect())
    }
}

/// Fixed host table, for tests and local runs without DNS
#[derive(Debug, Clone, Default)]
pub struct StaticLookup {
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `host` with its addresses, in lookup order
    pub fn with_host(mut self, host: impl Into<String>, addrs: Vec<IpAddr>) -> Self {
        self.hosts.insert(host.into(), addrs);
        self
    }
}

#[async_trait]
impl HostLookup for StaticLookup {
    async fn lookup_host(&self, host: &str) -> Result<Vec<IpAddr>> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        self.hosts
            .get(host)
            .cloned()
            .ok_or_else(|| Error::resolution(format!("lookup {}: no such host", host)))
    }
}

/// Expands a logical address into the endpoints behind it
#[derive(Clone)]
pub struct ConnectionResolver {
    lookup: Arc<dyn HostLookup>,
}

impl ConnectionResolver {
    pub fn new(lookup: Arc<dyn HostLookup>) -> Self {
        Self { lookup }
    }

    /// Resolve `logical_address` to one endpoint per looked-up IP, each with
    /// the original port.
    ///
    /// Fails when the address cannot be split, the port is not numeric, or
    /// the lookup errors or comes back empty. Reachability is not checked.
    pub async fn resolve(&self, logical_address: &str) -> Result<ConnectionSet> {
        let (host, port) = split_host_port(logical_address)?;
        let port: u16 = port.parse().map_err(|_| {
            Error::resolution(format!("address {}: invalid port {:?}", logical_address, port))
        })?;

        let addrs = self.lookup.lookup_host(host).await?;
        if addrs.is_empty() {
            return Err(Error::resolution(format!("lookup {}: no addresses", host)));
        }

        debug!(address = logical_address, count = addrs.len(), "Resolved endpoints");
        Ok(addrs
            .into_iter()
            .map(|ip| Endpoint::new(ip.to_string(), port))
            .collect())
    }
}
