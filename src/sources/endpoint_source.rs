//! Configuration-service endpoint sources.

use crate::error::{ConfigError, Result};

/// Supplies the configuration-service endpoints for the current environment.
///
/// Implement this trait to plug in a service locator (meta server lookup,
/// DNS, a registry client). The order of the returned endpoints is the order
/// discovery tries them in; implementations are free to shuffle between calls.
pub trait EndpointSource: Send + Sync {
    /// List endpoint base URLs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoAvailableEndpoint`] if there is nothing to offer.
    fn list_endpoints(&self) -> Result<Vec<String>>;

    /// Get a human-readable name for this source (for logging/debugging).
    fn name(&self) -> String {
        "endpoints".to_string()
    }
}

/// A fixed endpoint list, typically taken from settings.
///
/// # Examples
///
/// ```rust
/// use hotswap_namespaces::sources::{EndpointSource, StaticEndpointSource};
///
/// let source = StaticEndpointSource::from_comma_separated("http://a:8080, http://b:8080,");
/// assert_eq!(source.list_endpoints().unwrap(), vec!["http://a:8080", "http://b:8080"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticEndpointSource {
    endpoints: Vec<String>,
}

impl StaticEndpointSource {
    /// Create a source from an ordered endpoint list.
    pub fn new<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated endpoint list.
    ///
    /// Entries are trimmed and blanks are dropped. Order and duplicates are kept.
    pub fn from_comma_separated(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|endpoint| !endpoint.is_empty()),
        )
    }
}

impl EndpointSource for StaticEndpointSource {
    fn list_endpoints(&self) -> Result<Vec<String>> {
        if self.endpoints.is_empty() {
            return Err(ConfigError::NoAvailableEndpoint);
        }
        Ok(self.endpoints.clone())
    }

    fn name(&self) -> String {
        format!("static:{}", self.endpoints.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_source_has_no_endpoint() {
        let source = StaticEndpointSource::new(Vec::<String>::new());
        assert!(matches!(
            source.list_endpoints(),
            Err(ConfigError::NoAvailableEndpoint)
        ));
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let source = StaticEndpointSource::new(["http://b", "http://a", "http://b"]);
        assert_eq!(
            source.list_endpoints().unwrap(),
            vec!["http://b", "http://a", "http://b"]
        );
    }

    #[test]
    fn test_comma_separated_blank_only() {
        let source = StaticEndpointSource::from_comma_separated(" , ,");
        assert!(source.list_endpoints().is_err());
    }

    #[test]
    fn test_name() {
        let source = StaticEndpointSource::new(["http://a", "http://b"]);
        assert_eq!(source.name(), "static:http://a,http://b");
    }
}
