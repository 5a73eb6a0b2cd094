//! Builder for constructing NamespaceClient instances.

use crate::core::NamespaceClient;
use crate::core::settings::{ClientSettings, DEFAULT_CLUSTER};
use crate::discovery::{DEFAULT_DISCOVERY_TIMEOUT, DEFAULT_NAMESPACE, NamespaceDiscovery, NamespaceSet};
use crate::error::{Result, ValidationError};
use crate::notify::RefreshPublisher;
use crate::sources::{EndpointSource, HttpFetcher, StaticEndpointSource};
use std::sync::Arc;
use std::time::Duration;

#[cfg(feature = "metrics")]
use crate::metrics::ClientMetrics;

/// Buffer size of the refresh event channel.
pub const DEFAULT_REFRESH_CAPACITY: usize = 64;

/// Builder for constructing a [`NamespaceClient`].
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_namespaces::prelude::*;
/// use std::time::Duration;
///
/// # fn example() -> Result<()> {
/// let client = NamespaceClient::builder()
///     .with_app_id("100004458")
///     .with_cluster("east")
///     .with_endpoints(["http://config-a:8080", "http://config-b:8080"])
///     .with_timeout(Duration::from_secs(2))
///     .with_default_cluster_fallback(true)
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct NamespaceClientBuilder {
    app_id: Option<String>,
    cluster: String,
    endpoints: Option<Arc<dyn EndpointSource>>,
    fetcher: Option<Arc<dyn HttpFetcher>>,
    static_namespaces: NamespaceSet,
    timeout: Duration,
    fallback_to_default_cluster: bool,
    refresh_capacity: Option<usize>,
    access_token: Option<String>,
    #[cfg(feature = "metrics")]
    metrics: Option<ClientMetrics>,
}

impl NamespaceClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            app_id: None,
            cluster: DEFAULT_CLUSTER.to_string(),
            endpoints: None,
            fetcher: None,
            static_namespaces: NamespaceSet::from([DEFAULT_NAMESPACE.to_string()]),
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
            fallback_to_default_cluster: false,
            refresh_capacity: None,
            access_token: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Take every field from loaded settings.
    ///
    /// Refresh publishing is enabled when `auto_update_properties` is set.
    pub fn with_settings(mut self, settings: ClientSettings) -> Self {
        self.endpoints = Some(Arc::new(settings.endpoint_source()));
        self.static_namespaces = settings.namespace_set();
        self.timeout = settings.discovery_timeout();
        self.fallback_to_default_cluster = settings.fallback_to_default_cluster;
        self.refresh_capacity = settings
            .auto_update_properties
            .then_some(DEFAULT_REFRESH_CAPACITY);
        self.access_token = settings.access_token;
        self.app_id = Some(settings.app_id);
        self.cluster = settings.cluster;
        self
    }

    /// Set the application id. Required.
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    /// Set the cluster. Default is `default`.
    pub fn with_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.cluster = cluster.into();
        self
    }

    /// Use a fixed, ordered list of configuration-service endpoints.
    pub fn with_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.endpoints = Some(Arc::new(StaticEndpointSource::new(endpoints)));
        self
    }

    /// Use a custom endpoint source, consulted on every discovery.
    pub fn with_endpoint_source(mut self, source: Arc<dyn EndpointSource>) -> Self {
        self.endpoints = Some(source);
        self
    }

    /// Use a custom HTTP fetcher instead of the reqwest one.
    pub fn with_fetcher(mut self, fetcher: Arc<dyn HttpFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Replace the statically declared namespaces. Default is `application`.
    pub fn with_static_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.static_namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-endpoint discovery timeout. Default is 5 seconds.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Retry discovery against the `default` cluster when the configured
    /// cluster has no namespaces. Off by default.
    pub fn with_default_cluster_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_default_cluster = enabled;
        self
    }

    /// Broadcast an [`EnvironmentChange`](crate::notify::EnvironmentChange)
    /// for every dispatched batch once the client is started.
    pub fn with_refresh_events(mut self, capacity: usize) -> Self {
        self.refresh_capacity = Some(capacity);
        self
    }

    /// Bearer token for the default reqwest fetcher.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Record discovery and dispatch metrics.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: ClientMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the client. Performs no I/O.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The app id is missing or blank, or the cluster is blank
    /// - The timeout is zero
    /// - No fetcher was given and the `http` feature is disabled
    pub fn build(self) -> Result<NamespaceClient> {
        let app_id = self
            .app_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ValidationError::invalid_field("app_id", "must not be empty"))?;
        if self.cluster.trim().is_empty() {
            return Err(ValidationError::invalid_field("cluster", "must not be empty").into());
        }
        if self.timeout.is_zero() {
            return Err(ValidationError::invalid_field("timeout", "must be greater than 0").into());
        }

        let fetcher = match self.fetcher {
            Some(fetcher) => fetcher,
            None => default_fetcher(self.access_token, self.timeout)?,
        };
        let endpoints = self
            .endpoints
            .unwrap_or_else(|| Arc::new(StaticEndpointSource::new(Vec::<String>::new())));

        let discovery = NamespaceDiscovery::new(endpoints, fetcher).with_timeout(self.timeout);
        let refresh = self
            .refresh_capacity
            .map(|capacity| Arc::new(RefreshPublisher::new(capacity)));

        let client = NamespaceClient::from_parts(
            app_id,
            self.cluster,
            self.static_namespaces,
            self.fallback_to_default_cluster,
            discovery,
            refresh,
        );

        #[cfg(feature = "metrics")]
        let client = match self.metrics {
            Some(metrics) => client.with_metrics(metrics),
            None => client,
        };

        Ok(client)
    }
}

#[cfg(feature = "http")]
fn default_fetcher(access_token: Option<String>, timeout: Duration) -> Result<Arc<dyn HttpFetcher>> {
    let mut builder = crate::sources::ReqwestFetcher::builder().with_timeout(timeout);
    if let Some(token) = access_token {
        builder = builder.with_auth_token(token);
    }
    Ok(Arc::new(builder.build()?))
}

#[cfg(not(feature = "http"))]
fn default_fetcher(_access_token: Option<String>, _timeout: Duration) -> Result<Arc<dyn HttpFetcher>> {
    Err(crate::error::ConfigError::FeatureNotEnabled("http"))
}

impl Default for NamespaceClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
