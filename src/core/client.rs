//! The client handle tying discovery, resolution and dispatch together.

use crate::core::NamespaceClientBuilder;
use crate::core::settings::DEFAULT_CLUSTER;
use crate::discovery::{NamespaceDiscovery, NamespaceSet, resolve};
use crate::error::Result;
use crate::model::{ChangeBatch, NamespaceDescriptor};
use crate::notify::{
    ChangeDispatcher, DispatchReport, EnvironmentChange, InterestDeclaration, InterestFilter,
    RefreshPublisher, SubscriptionHandle, SubscriptionRegistry,
};
use arc_swap::ArcSwap;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, error, info};

#[cfg(feature = "metrics")]
use crate::metrics::ClientMetrics;

/// Result of one namespace refresh.
#[derive(Debug, Default)]
pub struct NamespaceSnapshot {
    /// Descriptors returned by discovery
    pub discovered: Arc<Vec<NamespaceDescriptor>>,
    /// Static names plus the discovered names
    pub namespaces: Arc<NamespaceSet>,
}

/// Client-side view of an application's namespaces and their listeners.
///
/// Reads of the current namespace set are lock-free; a refresh swaps in a new
/// set atomically. Cloning is cheap and clones share all state.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_namespaces::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let client = NamespaceClient::builder()
///     .with_app_id("100004458")
///     .with_endpoints(["http://config-a:8080", "http://config-b:8080"])
///     .with_static_namespaces(["application"])
///     .build()?;
///
/// // Discovery failures are logged; static namespaces are always kept.
/// let namespaces = client.refresh_namespaces().await;
/// println!("bound to {:?}", namespaces);
///
/// client
///     .bind(
///         &InterestDeclaration::new(|batch: &ChangeBatch| {
///             println!("{} changed", batch.namespace());
///         })
///         .with_key_prefixes(["db."]),
///     )
///     .await;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NamespaceClient {
    app_id: String,
    cluster: String,
    static_namespaces: NamespaceSet,
    fallback_to_default_cluster: bool,
    discovery: NamespaceDiscovery,
    /// Last discovery result and the set resolved from it, swapped together
    state: Arc<ArcSwap<NamespaceSnapshot>>,
    registry: SubscriptionRegistry,
    dispatcher: ChangeDispatcher,
    refresh: Option<Arc<RefreshPublisher>>,
    /// Subscriptions of the refresh publisher attached by `start`
    refresh_handles: Arc<Mutex<Vec<SubscriptionHandle>>>,
    #[cfg(feature = "metrics")]
    metrics: Option<ClientMetrics>,
}

impl NamespaceClient {
    /// Create a new builder for constructing a client.
    pub fn builder() -> NamespaceClientBuilder {
        NamespaceClientBuilder::new()
    }

    pub(crate) fn from_parts(
        app_id: String,
        cluster: String,
        static_namespaces: NamespaceSet,
        fallback_to_default_cluster: bool,
        discovery: NamespaceDiscovery,
        refresh: Option<Arc<RefreshPublisher>>,
    ) -> Self {
        let registry = SubscriptionRegistry::new();
        let dispatcher = ChangeDispatcher::new(registry.clone());
        let state = NamespaceSnapshot {
            discovered: Arc::new(Vec::new()),
            namespaces: Arc::new(static_namespaces.clone()),
        };
        Self {
            state: Arc::new(ArcSwap::from_pointee(state)),
            app_id,
            cluster,
            static_namespaces,
            fallback_to_default_cluster,
            discovery,
            registry,
            dispatcher,
            refresh,
            refresh_handles: Arc::new(Mutex::new(Vec::new())),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    #[cfg(feature = "metrics")]
    pub(crate) fn with_metrics(mut self, metrics: ClientMetrics) -> Self {
        self.discovery = self.discovery.with_metrics(metrics.clone());
        self.dispatcher = self.dispatcher.with_metrics(metrics.clone());
        self.metrics = Some(metrics);
        self
    }

    /// Application id.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Cluster name.
    pub fn cluster(&self) -> &str {
        &self.cluster
    }

    /// Statically declared namespaces.
    pub fn static_namespaces(&self) -> &NamespaceSet {
        &self.static_namespaces
    }

    /// The subscription registry shared with the dispatcher.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// The dispatcher for this client's registry.
    pub fn dispatcher(&self) -> &ChangeDispatcher {
        &self.dispatcher
    }

    /// Discover this application's namespaces once.
    ///
    /// With default-cluster fallback enabled, an empty result for a
    /// non-default cluster is followed by one discovery of the `default`
    /// cluster.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoAvailableEndpoint`](crate::error::ConfigError::NoAvailableEndpoint)
    /// when there are no endpoints at all.
    pub async fn discover(&self) -> Result<Vec<NamespaceDescriptor>> {
        let found = self.discovery.discover(&self.app_id, &self.cluster).await?;
        if found.is_empty() && self.fallback_to_default_cluster && self.cluster != DEFAULT_CLUSTER
        {
            info!(
                app_id = %self.app_id,
                cluster = %self.cluster,
                "no namespaces for cluster, trying the default cluster"
            );
            return self.discovery.discover(&self.app_id, DEFAULT_CLUSTER).await;
        }
        Ok(found)
    }

    /// Re-run discovery and swap in the resolved namespace set.
    ///
    /// Never fails: when discovery errors out the error is logged and only
    /// the static namespaces remain until the next successful refresh.
    pub async fn refresh_namespaces(&self) -> Arc<NamespaceSet> {
        let discovered = match self.discover().await {
            Ok(discovered) => discovered,
            Err(error) => {
                error!(
                    app_id = %self.app_id,
                    cluster = %self.cluster,
                    error = %error,
                    "failed to discover namespaces from config service"
                );
                Vec::new()
            }
        };

        let resolved = Arc::new(resolve(&self.static_namespaces, &discovered));
        self.state.store(Arc::new(NamespaceSnapshot {
            discovered: Arc::new(discovered),
            namespaces: Arc::clone(&resolved),
        }));

        debug!(namespaces = ?resolved, "resolved namespaces");
        resolved
    }

    /// Refresh namespaces and, when refresh publishing is enabled, attach the
    /// publisher to every resolved namespace.
    ///
    /// Calling it again re-runs discovery and moves the publisher onto the new
    /// namespace set; it is never attached twice to one namespace.
    pub async fn start(&self) -> Arc<NamespaceSet> {
        let namespaces = self.refresh_namespaces().await;
        if let Some(publisher) = &self.refresh {
            let mut attached = self.refresh_handles.lock().await;
            self.unbind(&attached).await;
            *attached = self.publish_refreshes(Arc::clone(publisher)).await;
        }
        namespaces
    }

    /// Current namespace set: static names plus the last discovery result.
    pub fn namespaces(&self) -> Arc<NamespaceSet> {
        Arc::clone(&self.state.load().namespaces)
    }

    /// Descriptors from the last discovery.
    pub fn discovered(&self) -> Arc<Vec<NamespaceDescriptor>> {
        Arc::clone(&self.state.load().discovered)
    }

    /// The last discovery result together with the set resolved from it.
    pub fn snapshot(&self) -> Arc<NamespaceSnapshot> {
        self.state.load_full()
    }

    /// Register a declaration's listener on each of its namespaces plus every
    /// discovered namespace.
    ///
    /// Namespaces discovered by later refreshes are not bound retroactively.
    pub async fn bind(&self, declaration: &InterestDeclaration) -> Vec<SubscriptionHandle> {
        let targets = resolve(&declaration.namespaces(), &self.discovered());
        let mut handles = Vec::with_capacity(targets.len());

        for namespace in targets {
            debug!(namespace = %namespace, filter = ?declaration.filter(), "binding listener");
            handles.push(
                self.registry
                    .register(namespace, declaration.listener(), declaration.filter().clone())
                    .await,
            );
        }

        self.report_subscription_count().await;
        handles
    }

    /// Bind several declarations.
    pub async fn bind_all<'a, I>(&self, declarations: I) -> Vec<SubscriptionHandle>
    where
        I: IntoIterator<Item = &'a InterestDeclaration>,
    {
        let mut handles = Vec::new();
        for declaration in declarations {
            handles.extend(self.bind(declaration).await);
        }
        handles
    }

    /// Remove subscriptions. Returns how many were still registered.
    pub async fn unbind(&self, handles: &[SubscriptionHandle]) -> usize {
        let mut removed = 0;
        for handle in handles {
            if self.registry.unregister(handle).await {
                removed += 1;
            }
        }
        self.report_subscription_count().await;
        removed
    }

    /// Deliver a change batch to the interested listeners of its namespace.
    pub async fn dispatch(&self, batch: &ChangeBatch) -> DispatchReport {
        self.dispatcher.dispatch(batch).await
    }

    /// Register `publisher` as a catch-all listener on every current namespace.
    pub async fn publish_refreshes(
        &self,
        publisher: Arc<RefreshPublisher>,
    ) -> Vec<SubscriptionHandle> {
        let mut handles = Vec::new();
        for namespace in self.namespaces().iter() {
            handles.push(
                self.registry
                    .register(namespace.clone(), publisher.clone(), InterestFilter::all())
                    .await,
            );
        }
        self.report_subscription_count().await;
        handles
    }

    /// Receive refresh events, if refresh publishing is enabled.
    pub fn refresh_events(&self) -> Option<broadcast::Receiver<EnvironmentChange>> {
        self.refresh.as_ref().map(|publisher| publisher.subscribe())
    }

    async fn report_subscription_count(&self) {
        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.update_subscription_count(self.registry.total_subscriptions().await as i64);
        }
    }
}
