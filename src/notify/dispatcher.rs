//! Interest-filtered fan-out of change batches.

use crate::error::ConfigError;
use crate::model::ChangeBatch;
use crate::notify::subscriber::{Subscription, SubscriptionRegistry};
use parking_lot::Mutex;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

#[cfg(feature = "metrics")]
use crate::metrics::ClientMetrics;

/// Outcome of dispatching one batch.
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Subscriptions that received the batch without error
    pub delivered: usize,
    /// Subscriptions whose filter matched no record of the batch
    pub skipped: usize,
    /// Listener failures, one [`ConfigError::ListenerInvocationFailed`] each
    pub failures: Vec<ConfigError>,
}

impl DispatchReport {
    /// Number of listeners that were invoked, successfully or not.
    pub fn invoked(&self) -> usize {
        self.delivered + self.failures.len()
    }
}

/// Delivers change batches to the subscriptions registered for their namespace.
///
/// Every subscription whose filter matches at least one record is invoked
/// exactly once with the whole batch. Listeners run outside the registry lock,
/// and a failing listener never stops delivery to the rest.
///
/// Batches for the same namespace are delivered one at a time, in the order
/// `dispatch` was called. Different namespaces dispatch concurrently.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_namespaces::model::{ChangeBatch, ChangeRecord};
/// use hotswap_namespaces::notify::{ChangeDispatcher, InterestFilter, SubscriptionRegistry};
/// use std::sync::Arc;
///
/// # async fn example() -> hotswap_namespaces::error::Result<()> {
/// let registry = SubscriptionRegistry::new();
/// registry
///     .register(
///         "application",
///         Arc::new(|batch: &ChangeBatch| println!("changed: {:?}", batch.changed_keys())),
///         InterestFilter::all().with_keys(["timeout"]),
///     )
///     .await;
///
/// let dispatcher = ChangeDispatcher::new(registry);
/// let batch = ChangeBatch::new(
///     "application",
///     vec![ChangeRecord::modified("application", "timeout", "10", "20")],
/// )?;
/// let report = dispatcher.dispatch(&batch).await;
/// assert_eq!(report.delivered, 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChangeDispatcher {
    registry: SubscriptionRegistry,
    gates: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
    #[cfg(feature = "metrics")]
    metrics: Option<ClientMetrics>,
}

impl ChangeDispatcher {
    /// Create a dispatcher reading from `registry`.
    pub fn new(registry: SubscriptionRegistry) -> Self {
        Self {
            registry,
            gates: Arc::new(Mutex::new(HashMap::new())),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Report dispatch outcomes to `metrics`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: ClientMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The registry this dispatcher reads from.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Deliver `batch` to every interested subscription of its namespace.
    pub async fn dispatch(&self, batch: &ChangeBatch) -> DispatchReport {
        let gate = self.gate(batch.namespace());
        let report = {
            // tokio's mutex is fair, so waiting batches keep their arrival order.
            let _in_order = gate.lock().await;
            self.deliver(batch).await
        };
        self.release_gate(batch.namespace(), gate);
        report
    }

    async fn deliver(&self, batch: &ChangeBatch) -> DispatchReport {
        let subscriptions = self.registry.snapshot(batch.namespace()).await;
        let mut report = DispatchReport::default();

        for subscription in &subscriptions {
            if !subscription.filter().matches_any(batch) {
                report.skipped += 1;
                continue;
            }

            match invoke(subscription, batch) {
                Ok(()) => report.delivered += 1,
                Err(error) => {
                    warn!(
                        namespace = batch.namespace(),
                        subscription = subscription.id(),
                        error = %error,
                        "change listener failed"
                    );
                    report.failures.push(error);
                }
            }
        }

        debug!(
            namespace = batch.namespace(),
            records = batch.len(),
            delivered = report.delivered,
            skipped = report.skipped,
            failed = report.failures.len(),
            "dispatched change batch"
        );

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_dispatch(
                batch.namespace(),
                report.invoked() as u64,
                report.failures.len() as u64,
            );
        }

        report
    }

    fn gate(&self, namespace: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut gates = self.gates.lock();
        Arc::clone(gates.entry(namespace.to_string()).or_default())
    }

    fn release_gate(&self, namespace: &str, gate: Arc<tokio::sync::Mutex<()>>) {
        let mut gates = self.gates.lock();
        // Only the map and this call hold the gate: no dispatch is queued on it.
        if Arc::strong_count(&gate) == 2 {
            gates.remove(namespace);
        }
    }

    #[cfg(test)]
    fn gate_count(&self) -> usize {
        self.gates.lock().len()
    }
}

fn invoke(subscription: &Subscription, batch: &ChangeBatch) -> Result<(), ConfigError> {
    let failed = |reason: String| ConfigError::ListenerInvocationFailed {
        namespace: batch.namespace().to_string(),
        subscription: subscription.id(),
        reason,
    };

    match panic::catch_unwind(AssertUnwindSafe(|| subscription.listener().on_change(batch))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(failed(error.to_string())),
        Err(payload) => Err(failed(format!("panicked: {}", panic_message(&*payload)))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.as_str()
    } else {
        "non-string panic payload"
    }
}
