//! Client metrics tracking using OpenTelemetry.

use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram, Meter};
use std::time::Instant;

/// Metrics collector for discovery and change dispatch.
///
/// Cloning is cheap; clones report into the same instruments.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_namespaces::metrics::ClientMetrics;
/// use opentelemetry::global;
///
/// let metrics = ClientMetrics::new(global::meter("hotswap-namespaces"));
///
/// let timer = metrics.start_discovery_attempt();
/// // ... fetch from one endpoint ...
/// metrics.record_discovery_attempt(timer, true);
/// ```
#[derive(Clone)]
pub struct ClientMetrics {
    discovery_attempts: Counter<u64>,
    discovery_attempt_failures: Counter<u64>,
    discovery_attempt_duration: Histogram<f64>,
    discovery_exhausted: Counter<u64>,
    dispatch_batches: Counter<u64>,
    listener_invocations: Counter<u64>,
    listener_failures: Counter<u64>,
    active_subscriptions: Gauge<i64>,
}

impl ClientMetrics {
    /// Create a new metrics collector with the provided meter.
    pub fn new(meter: Meter) -> Self {
        let discovery_attempts = meter
            .u64_counter("hotswap_namespaces.discovery.attempts")
            .with_description("Number of per-endpoint discovery attempts")
            .build();

        let discovery_attempt_failures = meter
            .u64_counter("hotswap_namespaces.discovery.attempt_failures")
            .with_description("Number of discovery attempts that failed over to the next endpoint")
            .build();

        let discovery_attempt_duration = meter
            .f64_histogram("hotswap_namespaces.discovery.attempt_duration")
            .with_description("Duration of a single discovery attempt in seconds")
            .with_unit("s")
            .build();

        let discovery_exhausted = meter
            .u64_counter("hotswap_namespaces.discovery.exhausted")
            .with_description("Discoveries where every endpoint failed")
            .build();

        let dispatch_batches = meter
            .u64_counter("hotswap_namespaces.dispatch.batches")
            .with_description("Number of change batches dispatched")
            .build();

        let listener_invocations = meter
            .u64_counter("hotswap_namespaces.dispatch.invocations")
            .with_description("Number of listener invocations")
            .build();

        let listener_failures = meter
            .u64_counter("hotswap_namespaces.dispatch.listener_failures")
            .with_description("Number of listener invocations that failed")
            .build();

        let active_subscriptions = meter
            .i64_gauge("hotswap_namespaces.subscriptions.active")
            .with_description("Number of active subscriptions")
            .build();

        Self {
            discovery_attempts,
            discovery_attempt_failures,
            discovery_attempt_duration,
            discovery_exhausted,
            dispatch_batches,
            listener_invocations,
            listener_failures,
            active_subscriptions,
        }
    }

    /// Start timing one discovery attempt.
    ///
    /// Pass the returned `Instant` to [`record_discovery_attempt`](Self::record_discovery_attempt).
    pub fn start_discovery_attempt(&self) -> Instant {
        self.discovery_attempts.add(1, &[]);
        Instant::now()
    }

    /// Record the outcome of one discovery attempt.
    pub fn record_discovery_attempt(&self, start: Instant, succeeded: bool) {
        let duration = start.elapsed().as_secs_f64();
        let outcome = KeyValue::new("outcome", if succeeded { "success" } else { "failure" });
        self.discovery_attempt_duration.record(duration, &[outcome]);
        if !succeeded {
            self.discovery_attempt_failures.add(1, &[]);
        }
    }

    /// Record a discovery where every endpoint failed.
    pub fn record_discovery_exhausted(&self) {
        self.discovery_exhausted.add(1, &[]);
    }

    /// Record one dispatched batch and how many listeners it woke up.
    pub fn record_dispatch(&self, namespace: &str, invoked: u64, failed: u64) {
        let attrs = [KeyValue::new("namespace", namespace.to_string())];
        self.dispatch_batches.add(1, &attrs);
        self.listener_invocations.add(invoked, &attrs);
        if failed > 0 {
            self.listener_failures.add(failed, &attrs);
        }
    }

    /// Update the number of active subscriptions.
    pub fn update_subscription_count(&self, count: i64) {
        self.active_subscriptions.record(count, &[]);
    }
}
