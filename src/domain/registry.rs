//! Metric Registry — Process-wide Counters
//!
//! Holds every counter the service reports: per-endpoint request counts,
//! auth outcomes, active users, latency sums, and pizza sales. Mutated
//! concurrently by request handlers and read once per flush cycle by
//! the exporter.
//!
//! Counters are cumulative since process start and never reset. Each
//! counter is individually atomic; a snapshot may show small skew between
//! counters, which the collector tolerates.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;

/// Identifies one HTTP endpoint as `"[METHOD] /path"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EndpointKey(String);

impl EndpointKey {
    /// Build the key for a method and request path.
    pub fn new(method: &str, path: &str) -> Self {
        Self(format!("[{method}] {path}"))
    }

    /// Rendered key, as reported in the `endpoint` attribute.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EndpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which latency sum a measurement feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyKind {
    /// Time spent serving an HTTP request.
    Request,
    /// Time the pizza factory took to fulfil an order.
    Pizza,
}

/// A user session starting or ending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionChange {
    Login,
    Logout,
}

impl SessionChange {
    /// Signed change to the active-user level.
    pub const fn delta(self) -> i64 {
        match self {
            Self::Login => 1,
            Self::Logout => -1,
        }
    }
}

/// Point-in-time copy of every counter.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySnapshot {
    /// Wall-clock instant the snapshot was taken.
    pub taken_at: DateTime<Utc>,
    /// Request count per endpoint, ordered by key.
    pub requests: BTreeMap<EndpointKey, u64>,
    pub active_users: u64,
    pub auth_successes: u64,
    pub auth_failures: u64,
    /// Sum of request latencies in milliseconds.
    pub request_latency_ms: u64,
    /// Sum of pizza fulfilment latencies in milliseconds.
    pub pizza_latency_ms: u64,
    pub pizzas_sold: u64,
    pub purchase_failures: u64,
    pub revenue: Decimal,
}

/// Shared counters for the whole process.
///
/// Created once at startup and handed out as `Arc<MetricRegistry>`.
/// Every `record_*` method is infallible and lock-free except for the
/// first sighting of an endpoint and the revenue total.
#[derive(Debug, Default)]
pub struct MetricRegistry {
    requests: DashMap<EndpointKey, AtomicU64>,
    active_users: AtomicU64,
    auth_successes: AtomicU64,
    auth_failures: AtomicU64,
    request_latency_ms: AtomicU64,
    pizza_latency_ms: AtomicU64,
    pizzas_sold: AtomicU64,
    purchase_failures: AtomicU64,
    revenue: Mutex<Decimal>,
}

impl MetricRegistry {
    /// Create an empty registry with every counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request against `"[METHOD] /path"`.
    pub fn record_request(&self, method: &str, path: &str) {
        let key = EndpointKey::new(method, path);
        // Fast path: endpoint already seen, only a shard read lock is taken.
        if let Some(counter) = self.requests.get(&key) {
            counter.fetch_add(1, Ordering::Relaxed);
            return;
        }
        self.requests
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(1, Ordering::Relaxed);
    }

    /// Count one authentication attempt.
    pub fn record_auth_result(&self, success: bool) {
        let counter = if success {
            &self.auth_successes
        } else {
            &self.auth_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Move the active-user level up or down by one.
    ///
    /// A logout with no active session leaves the level at zero.
    pub fn record_user_session(&self, change: SessionChange) {
        match change {
            SessionChange::Login => {
                self.active_users.fetch_add(1, Ordering::Relaxed);
            }
            SessionChange::Logout => {
                let _ = self.active_users.fetch_update(
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                    |n| Some(n.saturating_sub(1)),
                );
            }
        }
    }

    /// Add a latency measurement to the matching sum.
    pub fn record_latency(&self, kind: LatencyKind, millis: u64) {
        let sum = match kind {
            LatencyKind::Request => &self.request_latency_ms,
            LatencyKind::Pizza => &self.pizza_latency_ms,
        };
        sum.fetch_add(millis, Ordering::Relaxed);
    }

    /// Record a pizza order attempt.
    ///
    /// Latency, revenue and pizzas sold accumulate on every call; only
    /// the failure count depends on `success`.
    pub fn record_purchase(
        &self,
        success: bool,
        latency_ms: u64,
        price: Decimal,
        item_count: u64,
    ) {
        if !success {
            self.purchase_failures.fetch_add(1, Ordering::Relaxed);
        }
        self.pizza_latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
        self.pizzas_sold.fetch_add(item_count, Ordering::Relaxed);

        // A poisoned lock still holds a valid Decimal.
        let mut revenue = self
            .revenue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *revenue += price;
    }

    /// Current count for one endpoint, `None` if never requested.
    pub fn endpoint_count(&self, method: &str, path: &str) -> Option<u64> {
        self.requests
            .get(&EndpointKey::new(method, path))
            .map(|c| c.load(Ordering::Relaxed))
    }

    /// Copy every counter for the exporter.
    pub fn snapshot(&self) -> RegistrySnapshot {
        let requests = self
            .requests
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
            .collect();

        let revenue = *self
            .revenue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        RegistrySnapshot {
            taken_at: Utc::now(),
            requests,
            active_users: self.active_users.load(Ordering::Relaxed),
            auth_successes: self.auth_successes.load(Ordering::Relaxed),
            auth_failures: self.auth_failures.load(Ordering::Relaxed),
            request_latency_ms: self.request_latency_ms.load(Ordering::Relaxed),
            pizza_latency_ms: self.pizza_latency_ms.load(Ordering::Relaxed),
            pizzas_sold: self.pizzas_sold.load(Ordering::Relaxed),
            purchase_failures: self.purchase_failures.load(Ordering::Relaxed),
            revenue,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_endpoint_key_format() {
        let key = EndpointKey::new("GET", "/api/order/menu");
        assert_eq!(key.as_str(), "[GET] /api/order/menu");
        assert_eq!(key.to_string(), "[GET] /api/order/menu");
    }

    #[test]
    fn test_unseen_endpoint_absent() {
        let registry = MetricRegistry::new();
        assert_eq!(registry.endpoint_count("GET", "/"), None);
        assert!(registry.snapshot().requests.is_empty());
    }

    #[test]
    fn test_request_counts_per_exact_key() {
        let registry = MetricRegistry::new();
        registry.record_request("GET", "/api/franchise");
        registry.record_request("GET", "/api/franchise");
        registry.record_request("POST", "/api/franchise");

        assert_eq!(registry.endpoint_count("GET", "/api/franchise"), Some(2));
        assert_eq!(registry.endpoint_count("POST", "/api/franchise"), Some(1));
        assert_eq!(registry.endpoint_count("DELETE", "/api/franchise"), None);
    }

    #[test]
    fn test_auth_results() {
        let registry = MetricRegistry::new();
        registry.record_auth_result(true);
        registry.record_auth_result(true);
        registry.record_auth_result(false);

        let snap = registry.snapshot();
        assert_eq!(snap.auth_successes, 2);
        assert_eq!(snap.auth_failures, 1);
    }

    #[test]
    fn test_user_sessions_saturate_at_zero() {
        let registry = MetricRegistry::new();
        registry.record_user_session(SessionChange::Logout);
        assert_eq!(registry.snapshot().active_users, 0);

        registry.record_user_session(SessionChange::Login);
        registry.record_user_session(SessionChange::Login);
        registry.record_user_session(SessionChange::Logout);
        assert_eq!(registry.snapshot().active_users, 1);
        assert_eq!(SessionChange::Logout.delta(), -1);
    }

    #[test]
    fn test_latency_sums() {
        let registry = MetricRegistry::new();
        registry.record_latency(LatencyKind::Request, 12);
        registry.record_latency(LatencyKind::Request, 8);
        registry.record_latency(LatencyKind::Pizza, 300);

        let snap = registry.snapshot();
        assert_eq!(snap.request_latency_ms, 20);
        assert_eq!(snap.pizza_latency_ms, 300);
    }

    #[test]
    fn test_failed_purchase_still_accumulates_sales() {
        let registry = MetricRegistry::new();
        registry.record_purchase(false, 50, dec!(10), 2);

        let snap = registry.snapshot();
        assert_eq!(snap.purchase_failures, 1);
        assert_eq!(snap.pizza_latency_ms, 50);
        assert_eq!(snap.revenue, dec!(10));
        assert_eq!(snap.pizzas_sold, 2);
    }

    #[test]
    fn test_successful_purchase_leaves_failures_untouched() {
        let registry = MetricRegistry::new();
        registry.record_purchase(true, 120, dec!(0.0038), 3);
        registry.record_purchase(true, 80, dec!(0.0012), 1);

        let snap = registry.snapshot();
        assert_eq!(snap.purchase_failures, 0);
        assert_eq!(snap.pizza_latency_ms, 200);
        assert_eq!(snap.revenue, dec!(0.0050));
        assert_eq!(snap.pizzas_sold, 4);
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        const THREADS: usize = 8;
        const CALLS: usize = 1_000;

        let registry = Arc::new(MetricRegistry::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..CALLS {
                        registry.record_request("GET", "/api/order");
                        registry.record_purchase(true, 1, dec!(1), 1);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snap = registry.snapshot();
        let total = (THREADS * CALLS) as u64;
        assert_eq!(registry.endpoint_count("GET", "/api/order"), Some(total));
        assert_eq!(snap.pizzas_sold, total);
        assert_eq!(snap.revenue, Decimal::from(total));
    }
}
