//! Process-wide tenant registry.
//!
//! # Responsibilities
//! - Normalize hostnames (strip port, ASCII lower-case)
//! - Create tenants lazily, exactly once per normalized host
//! - Read-only lookup for the capture path
//!
//! # Design Decisions
//! - `DashMap` entry API makes check-then-insert atomic per shard
//! - Tenants are never removed; growth is bounded only by distinct hosts

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::catcher::tenant::Tenant;
use crate::observability::metrics;

/// Lower-cased host with any port removed.
///
/// Handles `name:port`, bare `name`, and bracketed IPv6 (`[::1]:8080`).
pub fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let without_port = if host.starts_with('[') {
        match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        }
    } else {
        match host.rsplit_once(':') {
            Some((name, port)) if port.bytes().all(|b| b.is_ascii_digit()) => name,
            _ => host,
        }
    };
    without_port.to_ascii_lowercase()
}

/// Point-in-time view of one tenant, for the admin surface.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TenantSummary {
    pub host: String,
    pub subscribers: usize,
}

#[derive(Debug, Default)]
pub struct TenantRegistry {
    tenants: DashMap<String, Arc<Tenant>>,
}

impl TenantRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing tenant for `host`, or a freshly created empty one.
    ///
    /// Concurrent first-time callers for the same host all get the same tenant.
    pub fn get_or_create(&self, host: &str) -> Arc<Tenant> {
        let key = normalize_host(host);
        if let Some(tenant) = self.tenants.get(&key) {
            return Arc::clone(tenant.value());
        }

        let tenant = self
            .tenants
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::info!(host = %key, "Tenant created");
                Arc::new(Tenant::new(key))
            })
            .clone();
        metrics::record_tenant_count(self.tenants.len());
        tenant
    }

    /// Existing tenant for `host`. Never creates one.
    pub fn lookup(&self, host: &str) -> Option<Arc<Tenant>> {
        self.tenants
            .get(&normalize_host(host))
            .map(|tenant| Arc::clone(tenant.value()))
    }

    pub fn len(&self) -> usize {
        self.tenants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tenants.is_empty()
    }

    /// Summaries sorted by host.
    pub fn snapshot(&self) -> Vec<TenantSummary> {
        let mut tenants: Vec<TenantSummary> = self
            .tenants
            .iter()
            .map(|entry| TenantSummary {
                host: entry.key().clone(),
                subscribers: entry.value().subscriber_count(),
            })
            .collect();
        tenants.sort_by(|a, b| a.host.cmp(&b.host));
        tenants
    }

    /// Viewers attached across all tenants.
    pub fn total_subscribers(&self) -> usize {
        self.tenants
            .iter()
            .map(|entry| entry.value().subscriber_count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn normalizes_hosts() {
        assert_eq!(normalize_host("Alpha.Example.COM"), "alpha.example.com");
        assert_eq!(normalize_host("alpha.example.com:8080"), "alpha.example.com");
        assert_eq!(normalize_host("localhost"), "localhost");
        assert_eq!(normalize_host("[::1]:3000"), "[::1]");
        assert_eq!(normalize_host("[::1]"), "[::1]");
        assert_eq!(normalize_host("127.0.0.1:80"), "127.0.0.1");
    }

    #[test]
    fn same_tenant_for_equivalent_hosts() {
        let registry = TenantRegistry::new();
        let a = registry.get_or_create("a.example.com");
        let b = registry.get_or_create("A.EXAMPLE.com:9000");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.host(), "a.example.com");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn lookup_never_creates() {
        let registry = TenantRegistry::new();
        assert!(registry.lookup("ghost.example.com").is_none());
        assert!(registry.is_empty());

        let created = registry.get_or_create("ghost.example.com");
        let found = registry.lookup("ghost.example.com:80").unwrap();
        assert!(Arc::ptr_eq(&created, &found));
    }

    #[test]
    fn concurrent_get_or_create_yields_one_tenant() {
        let registry = Arc::new(TenantRegistry::new());
        let handles: Vec<_> = (0..32)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || registry.get_or_create("race.example.com"))
            })
            .collect();

        let tenants: Vec<Arc<Tenant>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(tenants.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn snapshot_sorted() {
        let registry = TenantRegistry::new();
        registry.get_or_create("b.example.com");
        registry.get_or_create("a.example.com");

        let hosts: Vec<String> = registry.snapshot().into_iter().map(|t| t.host).collect();
        assert_eq!(hosts, ["a.example.com", "b.example.com"]);
        assert_eq!(registry.total_subscribers(), 0);
    }
}
