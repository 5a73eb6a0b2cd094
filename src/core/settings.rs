//! Client settings and layered settings loading.

use crate::core::Validate;
use crate::discovery::{DEFAULT_DISCOVERY_TIMEOUT, NamespaceSet, parse_namespace_list};
use crate::error::{ConfigError, Result, ValidationError};
use crate::sources::StaticEndpointSource;
use config::{Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Cluster used when none is configured, and the fallback cluster.
pub const DEFAULT_CLUSTER: &str = "default";

fn default_cluster() -> String {
    DEFAULT_CLUSTER.to_string()
}

fn default_namespaces() -> String {
    crate::discovery::DEFAULT_NAMESPACE.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_DISCOVERY_TIMEOUT.as_millis() as u64
}

fn default_true() -> bool {
    true
}

/// Settings for a [`NamespaceClient`](crate::core::NamespaceClient).
///
/// ```yaml
/// app_id: "100004458"
/// cluster: default
/// config_service: http://config-a:8080,http://config-b:8080
/// namespaces: application,FX.apollo
/// discovery_timeout_ms: 3000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSettings {
    /// Application id
    pub app_id: String,
    /// Cluster name
    #[serde(default = "default_cluster")]
    pub cluster: String,
    /// Comma-separated configuration-service endpoints, tried in order
    #[serde(default)]
    pub config_service: String,
    /// Comma-separated namespaces bound regardless of discovery
    #[serde(default = "default_namespaces")]
    pub namespaces: String,
    /// Per-endpoint discovery timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub discovery_timeout_ms: u64,
    /// Retry discovery against the default cluster when the configured one is empty
    #[serde(default)]
    pub fallback_to_default_cluster: bool,
    /// Broadcast refresh events for every change
    #[serde(default = "default_true")]
    pub auto_update_properties: bool,
    /// Bearer token sent to the configuration service
    #[serde(default)]
    pub access_token: Option<String>,
}

impl ClientSettings {
    /// Settings for `app_id` with every other field at its default.
    pub fn new(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            cluster: default_cluster(),
            config_service: String::new(),
            namespaces: default_namespaces(),
            discovery_timeout_ms: default_timeout_ms(),
            fallback_to_default_cluster: false,
            auto_update_properties: true,
            access_token: None,
        }
    }

    /// Endpoints from `config_service`, in order.
    pub fn endpoint_source(&self) -> StaticEndpointSource {
        StaticEndpointSource::from_comma_separated(&self.config_service)
    }

    /// Statically declared namespaces.
    pub fn namespace_set(&self) -> NamespaceSet {
        parse_namespace_list(&self.namespaces)
    }

    /// Per-endpoint discovery timeout.
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.discovery_timeout_ms)
    }
}

impl Validate for ClientSettings {
    fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut errors = Vec::new();
        if self.app_id.trim().is_empty() {
            errors.push(ValidationError::invalid_field("app_id", "must not be empty"));
        }
        if self.cluster.trim().is_empty() {
            errors.push(ValidationError::invalid_field("cluster", "must not be empty"));
        }
        if self.discovery_timeout_ms == 0 {
            errors.push(ValidationError::invalid_field(
                "discovery_timeout_ms",
                "must be greater than 0",
            ));
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ValidationError::Multiple(errors)),
        }
    }
}

/// Loads [`ClientSettings`] from files and environment variables.
///
/// Files are merged in the order they were added, later files overriding
/// earlier ones; environment variables override every file.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_namespaces::core::SettingsLoader;
///
/// # fn example() -> hotswap_namespaces::error::Result<()> {
/// // NS_APP_ID=100004458 NS_CONFIG_SERVICE=http://config:8080
/// let settings = SettingsLoader::new()
///     .with_file("config/client.yaml")
///     .with_env_overrides("NS", "__")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct SettingsLoader {
    file_paths: Vec<PathBuf>,
    env_prefix: Option<String>,
    env_separator: Option<String>,
}

impl SettingsLoader {
    /// Create a loader with no sources.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a settings file. YAML, TOML and JSON are detected by extension.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file_paths.push(path.into());
        self
    }

    /// Read overrides from environment variables starting with `prefix`.
    ///
    /// `separator` splits the prefix from the key, e.g. `NS_APP_ID` with
    /// prefix `NS` sets `app_id`.
    pub fn with_env_overrides(mut self, prefix: &str, separator: &str) -> Self {
        self.env_prefix = Some(prefix.to_string());
        self.env_separator = Some(separator.to_string());
        self
    }

    /// Load, merge and validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No sources were added
    /// - A file cannot be read or parsed
    /// - The merged settings don't deserialize (e.g. `app_id` is missing)
    /// - Validation fails
    pub fn load(&self) -> Result<ClientSettings> {
        if self.file_paths.is_empty() && self.env_prefix.is_none() {
            return Err(ConfigError::LoadError(
                "No settings sources specified".to_string(),
            ));
        }

        let mut builder = config::Config::builder();
        for path in &self.file_paths {
            builder = builder.add_source(File::from(path.as_path()));
        }
        if let (Some(prefix), Some(separator)) = (&self.env_prefix, &self.env_separator) {
            builder = builder.add_source(
                Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator(separator)
                    .try_parsing(true),
            );
        }

        let merged = builder
            .build()
            .map_err(|e| ConfigError::LoadError(format!("Failed to build settings: {}", e)))?;

        let settings: ClientSettings = merged.try_deserialize().map_err(|e| {
            ConfigError::DeserializationError(format!("Failed to deserialize settings: {}", e))
        })?;

        settings.validate()?;
        Ok(settings)
    }
}
