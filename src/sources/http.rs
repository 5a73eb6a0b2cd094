//! HTTP fetch primitive used by namespace discovery.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

#[cfg(feature = "http")]
use crate::error::ConfigError;
#[cfg(feature = "http")]
use reqwest::{Client, header::HeaderValue};

/// Status and raw body of one GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status code
    pub status: u16,
    /// Undecoded response body
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Create a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single GET against a configuration-service URL.
///
/// Discovery enforces its own per-attempt timeout around every call, so an
/// implementation that ignores `timeout` still cannot stall failover.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// Fetch `url`, giving up after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EndpointFetchFailed`](crate::error::ConfigError::EndpointFetchFailed)
    /// on transport failures. Non-2xx statuses are returned as responses.
    async fn get(&self, url: &Url, timeout: Duration) -> Result<FetchResponse>;
}

/// Authentication method for HTTP requests.
#[cfg(feature = "http")]
#[derive(Clone)]
pub enum HttpAuth {
    /// No authentication
    None,
    /// Bearer token authentication
    Bearer(String),
    /// Basic authentication (username, password)
    Basic(String, String),
}

/// [`HttpFetcher`] backed by a shared `reqwest` client.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_namespaces::sources::ReqwestFetcher;
/// use std::time::Duration;
///
/// # fn example() -> hotswap_namespaces::error::Result<()> {
/// let fetcher = ReqwestFetcher::builder()
///     .with_auth_token("secret-token")
///     .with_timeout(Duration::from_secs(5))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "http")]
pub struct ReqwestFetcher {
    client: Client,
    auth: HttpAuth,
}

#[cfg(feature = "http")]
impl ReqwestFetcher {
    /// Create a new builder for constructing a fetcher.
    pub fn builder() -> ReqwestFetcherBuilder {
        ReqwestFetcherBuilder::new()
    }
}

#[cfg(feature = "http")]
#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get(&self, url: &Url, timeout: Duration) -> Result<FetchResponse> {
        let failed = |reason: String| ConfigError::EndpointFetchFailed {
            url: url.to_string(),
            reason,
        };

        let mut request = self.client.get(url.as_str()).timeout(timeout);

        request = match &self.auth {
            HttpAuth::None => request,
            HttpAuth::Bearer(token) => {
                let header_value = HeaderValue::from_str(&format!("Bearer {}", token))
                    .map_err(|e| failed(format!("Invalid bearer token: {}", e)))?;
                request.header("Authorization", header_value)
            }
            HttpAuth::Basic(username, password) => request.basic_auth(username, Some(password)),
        };

        let response = request
            .send()
            .await
            .map_err(|e| failed(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| failed(format!("Failed to read response body: {}", e)))?;

        Ok(FetchResponse::new(status, body.to_vec()))
    }
}

/// Builder for constructing a [`ReqwestFetcher`].
#[cfg(feature = "http")]
pub struct ReqwestFetcherBuilder {
    auth: HttpAuth,
    timeout: Duration,
}

#[cfg(feature = "http")]
impl ReqwestFetcherBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            auth: HttpAuth::None,
            timeout: Duration::from_secs(5),
        }
    }

    /// Set Bearer token authentication.
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth = HttpAuth::Bearer(token.into());
        self
    }

    /// Set Basic authentication.
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.auth = HttpAuth::Basic(username.into(), password.into());
        self
    }

    /// Set the client-wide timeout.
    ///
    /// Default is 5 seconds. Each request is additionally capped by the
    /// timeout passed to [`HttpFetcher::get`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the fetcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<ReqwestFetcher> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ConfigError::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(ReqwestFetcher {
            client,
            auth: self.auth,
        })
    }
}

#[cfg(feature = "http")]
impl Default for ReqwestFetcherBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        assert!(FetchResponse::new(200, "[]").is_success());
        assert!(FetchResponse::new(204, Vec::new()).is_success());
        assert!(!FetchResponse::new(304, Vec::new()).is_success());
        assert!(!FetchResponse::new(503, "unavailable").is_success());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_builder() {
        let fetcher = ReqwestFetcher::builder()
            .with_auth_token("token123")
            .with_timeout(Duration::from_secs(2))
            .build();
        assert!(fetcher.is_ok());
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_builder_with_basic_auth() {
        let fetcher = ReqwestFetcher::builder()
            .with_basic_auth("user", "pass")
            .build();
        assert!(fetcher.is_ok());
    }

    #[cfg(feature = "http")]
    #[tokio::test]
    async fn test_unreachable_endpoint_is_fetch_failure() {
        let fetcher = ReqwestFetcher::builder().build().unwrap();
        // Port 9 (discard) on localhost is expected to refuse connections.
        let url = Url::parse("http://127.0.0.1:9/namespaces/app/default").unwrap();

        let result = fetcher.get(&url, Duration::from_millis(500)).await;
        assert!(matches!(
            result,
            Err(ConfigError::EndpointFetchFailed { .. })
        ));
    }
}
