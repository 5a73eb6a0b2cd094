//! Namespace-scoped subscriptions with key interest filters.

use crate::error::Result;
use crate::model::ChangeBatch;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Receives change batches for the namespaces it is subscribed to.
///
/// Any `Fn(&ChangeBatch) + Send + Sync` closure is a listener. Implement the
/// trait directly to report failures as errors; a listener that returns an
/// error or panics is logged by the dispatcher and does not affect others.
pub trait ChangeListener: Send + Sync {
    /// Handle one batch. Called at most once per batch.
    fn on_change(&self, batch: &ChangeBatch) -> Result<()>;
}

impl<F> ChangeListener for F
where
    F: Fn(&ChangeBatch) + Send + Sync,
{
    fn on_change(&self, batch: &ChangeBatch) -> Result<()> {
        self(batch);
        Ok(())
    }
}

/// The exact keys and key prefixes a subscription cares about.
///
/// With neither keys nor prefixes the filter matches every key. Otherwise a
/// key matches if it is one of the keys or starts with one of the prefixes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterestFilter {
    keys: Option<HashSet<String>>,
    prefixes: Option<HashSet<String>>,
}

impl InterestFilter {
    /// A filter interested in every key.
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a filter from optional key and prefix sets.
    ///
    /// Empty sets are treated the same as absent ones.
    pub fn new(keys: Option<HashSet<String>>, prefixes: Option<HashSet<String>>) -> Self {
        Self {
            keys: keys.filter(|k| !k.is_empty()),
            prefixes: prefixes.filter(|p| !p.is_empty()),
        }
    }

    /// Add exact keys of interest.
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys
            .get_or_insert_with(HashSet::new)
            .extend(keys.into_iter().map(Into::into));
        self.keys = self.keys.take().filter(|k| !k.is_empty());
        self
    }

    /// Add key prefixes of interest.
    pub fn with_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes
            .get_or_insert_with(HashSet::new)
            .extend(prefixes.into_iter().map(Into::into));
        self.prefixes = self.prefixes.take().filter(|p| !p.is_empty());
        self
    }

    /// Whether this filter matches every key.
    pub fn is_catch_all(&self) -> bool {
        self.keys.is_none() && self.prefixes.is_none()
    }

    /// Exact keys of interest, if any.
    pub fn keys(&self) -> Option<&HashSet<String>> {
        self.keys.as_ref()
    }

    /// Key prefixes of interest, if any.
    pub fn prefixes(&self) -> Option<&HashSet<String>> {
        self.prefixes.as_ref()
    }

    /// Whether `key` is of interest.
    pub fn matches(&self, key: &str) -> bool {
        if self.is_catch_all() {
            return true;
        }
        let exact = self.keys.as_ref().is_some_and(|keys| keys.contains(key));
        let prefixed = self
            .prefixes
            .as_ref()
            .is_some_and(|prefixes| prefixes.iter().any(|p| key.starts_with(p.as_str())));
        exact || prefixed
    }

    /// Whether at least one record of `batch` is of interest.
    pub fn matches_any(&self, batch: &ChangeBatch) -> bool {
        batch.iter().any(|record| self.matches(&record.key))
    }
}

/// Token identifying one registration.
///
/// Pass it to [`SubscriptionRegistry::unregister`] to remove the subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    id: u64,
    namespace: String,
}

impl SubscriptionHandle {
    /// Registry-unique id of the subscription.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Namespace the subscription is bound to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// A registered listener with its filter.
pub struct Subscription {
    id: u64,
    namespace: String,
    filter: InterestFilter,
    listener: Arc<dyn ChangeListener>,
}

impl Subscription {
    /// Registry-unique id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Namespace the subscription is bound to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The interest filter fixed at registration.
    pub fn filter(&self) -> &InterestFilter {
        &self.filter
    }

    /// The listener.
    pub fn listener(&self) -> &Arc<dyn ChangeListener> {
        &self.listener
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("namespace", &self.namespace)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Internal registry state.
struct SubscriptionRegistryInner {
    namespaces: HashMap<String, Vec<Arc<Subscription>>>,
    next_id: u64,
}

/// Registry mapping namespaces to their subscriptions.
///
/// Registration, removal and snapshotting are serialized by one lock.
/// Snapshots are cheap `Arc` clones, so listeners run without holding it.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_namespaces::model::ChangeBatch;
/// use hotswap_namespaces::notify::{InterestFilter, SubscriptionRegistry};
/// use std::sync::Arc;
///
/// # async fn example() {
/// let registry = SubscriptionRegistry::new();
///
/// let handle = registry
///     .register(
///         "application",
///         Arc::new(|batch: &ChangeBatch| println!("{} keys changed", batch.len())),
///         InterestFilter::all().with_prefixes(["db."]),
///     )
///     .await;
///
/// registry.unregister(&handle).await;
/// # }
/// ```
pub struct SubscriptionRegistry {
    inner: Arc<RwLock<SubscriptionRegistryInner>>,
}

impl SubscriptionRegistry {
    /// Create a new subscription registry.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(SubscriptionRegistryInner {
                namespaces: HashMap::new(),
                next_id: 0,
            })),
        }
    }

    /// Subscribe `listener` to changes of `namespace` that match `filter`.
    ///
    /// The same listener may be registered any number of times; every call
    /// creates an independent subscription with its own handle.
    pub async fn register(
        &self,
        namespace: impl Into<String>,
        listener: Arc<dyn ChangeListener>,
        filter: InterestFilter,
    ) -> SubscriptionHandle {
        let namespace = namespace.into();
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        inner.next_id += 1;

        inner
            .namespaces
            .entry(namespace.clone())
            .or_default()
            .push(Arc::new(Subscription {
                id,
                namespace: namespace.clone(),
                filter,
                listener,
            }));

        SubscriptionHandle { id, namespace }
    }

    /// Remove the subscription behind `handle`.
    ///
    /// Returns false if it was already removed. A dispatch that snapshotted
    /// the subscription before this call may still deliver to it.
    pub async fn unregister(&self, handle: &SubscriptionHandle) -> bool {
        let mut inner = self.inner.write().await;
        let Some(subscriptions) = inner.namespaces.get_mut(&handle.namespace) else {
            return false;
        };

        let before = subscriptions.len();
        subscriptions.retain(|s| s.id != handle.id);
        let removed = subscriptions.len() != before;

        if subscriptions.is_empty() {
            inner.namespaces.remove(&handle.namespace);
        }
        removed
    }

    /// Current subscriptions of `namespace`, in registration order.
    pub async fn snapshot(&self, namespace: &str) -> Vec<Arc<Subscription>> {
        let inner = self.inner.read().await;
        inner.namespaces.get(namespace).cloned().unwrap_or_default()
    }

    /// Number of subscriptions on `namespace`.
    pub async fn subscription_count(&self, namespace: &str) -> usize {
        let inner = self.inner.read().await;
        inner.namespaces.get(namespace).map_or(0, Vec::len)
    }

    /// Number of subscriptions across all namespaces.
    pub async fn total_subscriptions(&self) -> usize {
        let inner = self.inner.read().await;
        inner.namespaces.values().map(Vec::len).sum()
    }

    /// Namespaces that currently have at least one subscription.
    pub async fn namespaces(&self) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut names: Vec<String> = inner.namespaces.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
impl SubscriptionRegistry {
    pub(crate) fn is_unlocked(&self) -> bool {
        self.inner.try_write().is_ok()
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SubscriptionRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
