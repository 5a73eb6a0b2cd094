//! Namespace discovery with sequential endpoint failover.

use crate::error::{ConfigError, Result};
use crate::model::NamespaceDescriptor;
use crate::sources::{EndpointSource, HttpFetcher};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

#[cfg(feature = "metrics")]
use crate::metrics::ClientMetrics;

/// Default bound on a single discovery attempt.
pub const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Discovers the namespaces of an application/cluster from the configuration service.
///
/// Each call makes one pass over the endpoints returned by the
/// [`EndpointSource`], trying them one at a time in the returned order. The
/// first endpoint that answers with a well-formed namespace list wins. Failed
/// attempts are logged and skipped; if all of them fail the result is empty so
/// callers can carry on with their statically declared namespaces.
///
/// Discovery keeps no state between calls and can be shared freely.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_namespaces::discovery::NamespaceDiscovery;
/// use hotswap_namespaces::sources::{ReqwestFetcher, StaticEndpointSource};
/// use std::sync::Arc;
///
/// # async fn example() -> hotswap_namespaces::error::Result<()> {
/// let discovery = NamespaceDiscovery::new(
///     Arc::new(StaticEndpointSource::new(["http://a:8080", "http://b:8080"])),
///     Arc::new(ReqwestFetcher::builder().build()?),
/// );
///
/// for namespace in discovery.discover("app1", "default").await? {
///     println!("{}", namespace.namespace_name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct NamespaceDiscovery {
    endpoints: Arc<dyn EndpointSource>,
    fetcher: Arc<dyn HttpFetcher>,
    timeout: Duration,
    #[cfg(feature = "metrics")]
    metrics: Option<ClientMetrics>,
}

impl NamespaceDiscovery {
    /// Create a discovery component over explicit collaborators.
    pub fn new(endpoints: Arc<dyn EndpointSource>, fetcher: Arc<dyn HttpFetcher>) -> Self {
        Self {
            endpoints,
            fetcher,
            timeout: DEFAULT_DISCOVERY_TIMEOUT,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Report attempt outcomes to `metrics`.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(mut self, metrics: ClientMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Discover the namespaces visible to `app_id` in `cluster`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidArgument`] if `app_id` or `cluster` is empty,
    ///   `.` or `..`
    /// - [`ConfigError::NoAvailableEndpoint`] if there are no endpoints to try
    ///
    /// Failures of individual endpoints are never returned. When every
    /// endpoint fails the result is `Ok` with an empty list.
    pub async fn discover(&self, app_id: &str, cluster: &str) -> Result<Vec<NamespaceDescriptor>> {
        check_segment("app id", app_id)?;
        check_segment("cluster name", cluster)?;

        let endpoints = self.endpoints.list_endpoints()?;
        if endpoints.is_empty() {
            return Err(ConfigError::NoAvailableEndpoint);
        }

        info!(
            app_id,
            cluster,
            endpoints = endpoints.len(),
            source = %self.endpoints.name(),
            "loading namespaces from config service"
        );

        for endpoint in &endpoints {
            match self.attempt(endpoint, app_id, cluster).await {
                Ok(namespaces) => {
                    debug!(
                        endpoint = %endpoint,
                        count = namespaces.len(),
                        "loaded namespaces from config service"
                    );
                    return Ok(namespaces);
                }
                Err(error) if error.is_attempt_failure() => {
                    warn!(
                        endpoint = %endpoint,
                        error = %error,
                        "failed to load namespaces from config service"
                    );
                }
                Err(error) => {
                    error!(
                        endpoint = %endpoint,
                        error = %error,
                        "unexpected error from namespace fetcher, trying next endpoint"
                    );
                }
            }
        }

        #[cfg(feature = "metrics")]
        if let Some(metrics) = &self.metrics {
            metrics.record_discovery_exhausted();
        }

        warn!(
            app_id,
            cluster,
            attempts = endpoints.len(),
            "every config service endpoint failed, no namespaces discovered"
        );
        Ok(Vec::new())
    }

    async fn attempt(
        &self,
        endpoint: &str,
        app_id: &str,
        cluster: &str,
    ) -> Result<Vec<NamespaceDescriptor>> {
        #[cfg(feature = "metrics")]
        let timer = self.metrics.as_ref().map(|m| m.start_discovery_attempt());

        let result = self.fetch_namespaces(endpoint, app_id, cluster).await;

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            metrics.record_discovery_attempt(timer, result.is_ok());
        }

        result
    }

    async fn fetch_namespaces(
        &self,
        endpoint: &str,
        app_id: &str,
        cluster: &str,
    ) -> Result<Vec<NamespaceDescriptor>> {
        let url = namespaces_url(endpoint, app_id, cluster)?;

        let response = tokio::time::timeout(self.timeout, self.fetcher.get(&url, self.timeout))
            .await
            .map_err(|_| ConfigError::EndpointFetchFailed {
                url: url.to_string(),
                reason: format!("timed out after {:?}", self.timeout),
            })??;

        if !response.is_success() {
            return Err(ConfigError::EndpointFetchFailed {
                url: url.to_string(),
                reason: format!("unexpected status {}", response.status),
            });
        }

        serde_json::from_slice(&response.body).map_err(|e| ConfigError::MalformedResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Build `{endpoint}/namespaces/{app_id}/{cluster}`.
///
/// `app_id` and `cluster` are escaped as path segments. Exactly one `/`
/// separates the endpoint from the path, whether or not the endpoint ends
/// with one.
pub(crate) fn namespaces_url(endpoint: &str, app_id: &str, cluster: &str) -> Result<Url> {
    check_segment("app id", app_id)?;
    check_segment("cluster name", cluster)?;

    let invalid = |reason: String| ConfigError::EndpointFetchFailed {
        url: endpoint.to_string(),
        reason,
    };

    let mut url = Url::parse(endpoint).map_err(|e| invalid(format!("invalid endpoint: {}", e)))?;
    url.path_segments_mut()
        .map_err(|_| invalid("endpoint cannot be a base URL".to_string()))?
        .pop_if_empty()
        .extend(["namespaces", app_id, cluster]);
    Ok(url)
}

/// Reject values that cannot travel as a single path segment.
fn check_segment(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ConfigError::InvalidArgument(format!("{} must not be empty", what)));
    }
    // URL normalization would drop these instead of sending them.
    if value == "." || value == ".." {
        return Err(ConfigError::InvalidArgument(format!(
            "{} must not be '{}'",
            what, value
        )));
    }
    Ok(())
}
