//! Error types for hotswap-namespaces.

use std::fmt;

/// Result type alias for hotswap-namespaces operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while discovering namespaces or dispatching changes.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The endpoint source had no configuration-service endpoints to offer.
    ///
    /// This is the only error that escapes a discovery call. It is distinct from
    /// "every endpoint failed", which degrades to an empty result.
    #[error("No available config service endpoint")]
    NoAvailableEndpoint,

    /// A single discovery attempt against one endpoint failed.
    #[error("Failed to fetch namespaces from {url}: {reason}")]
    EndpointFetchFailed {
        /// The request URL of the failed attempt
        url: String,
        /// What went wrong (network error, timeout, status code)
        reason: String,
    },

    /// An endpoint answered, but the body was not a namespace list.
    #[error("Malformed namespace response from {url}: {reason}")]
    MalformedResponse {
        /// The request URL of the failed attempt
        url: String,
        /// The decoding error
        reason: String,
    },

    /// A listener failed while handling a change batch.
    #[error("Listener {subscription} on namespace '{namespace}' failed: {reason}")]
    ListenerInvocationFailed {
        /// Namespace of the batch being dispatched
        namespace: String,
        /// Id of the failing subscription
        subscription: u64,
        /// The returned error or panic message
        reason: String,
    },

    /// A change batch violated its construction rules.
    #[error("Invalid change batch: {0}")]
    InvalidChangeBatch(String),

    /// A caller supplied an unusable argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Failed to load client settings.
    #[error("Failed to load settings: {0}")]
    LoadError(String),

    /// Failed to deserialize client settings.
    #[error("Failed to deserialize settings: {0}")]
    DeserializationError(String),

    /// Settings validation failed.
    #[error("Settings validation failed: {0}")]
    ValidationError(String),

    /// Attempted to use a feature that is not enabled.
    #[error("Feature not enabled: {0}")]
    FeatureNotEnabled(&'static str),

    /// Generic error for other cases.
    #[error("Configuration error: {0}")]
    Other(String),
}

impl ConfigError {
    /// Returns true for errors that only affect a single discovery attempt.
    ///
    /// The failover loop swallows these and moves on to the next endpoint.
    pub fn is_attempt_failure(&self) -> bool {
        matches!(
            self,
            Self::EndpointFetchFailed { .. } | Self::MalformedResponse { .. }
        )
    }
}

/// Validation error for settings validation.
#[derive(Debug)]
pub enum ValidationError {
    /// Custom validation error with a message.
    Custom(String),

    /// A specific field has an invalid value.
    InvalidField {
        /// The field name/path
        field: String,
        /// The reason why it's invalid
        reason: String,
    },

    /// Multiple validation errors occurred.
    Multiple(Vec<ValidationError>),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create an invalid field error.
    pub fn invalid_field(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom(msg) => write!(f, "{}", msg),
            Self::InvalidField { field, reason } => {
                write!(f, "Field '{}' is invalid: {}", field, reason)
            }
            Self::Multiple(errors) => {
                writeln!(f, "Multiple validation errors:")?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl From<ValidationError> for ConfigError {
    fn from(err: ValidationError) -> Self {
        ConfigError::ValidationError(err.to_string())
    }
}
