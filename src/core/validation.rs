//! Settings validation support.

use crate::error::ValidationError;

/// Trait for settings validation.
///
/// [`SettingsLoader`](crate::core::SettingsLoader) validates loaded settings
/// before handing them out.
///
/// # Examples
///
/// ```rust
/// use hotswap_namespaces::core::{ClientSettings, Validate};
///
/// let mut settings = ClientSettings::new("100004458");
/// assert!(settings.validate().is_ok());
///
/// settings.discovery_timeout_ms = 0;
/// assert!(settings.validate().is_err());
/// ```
pub trait Validate {
    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Should return a `ValidationError` describing what validation failed.
    fn validate(&self) -> Result<(), ValidationError>;
}
