//! Client construction, settings and the namespace client handle.

mod builder;
mod client;
mod settings;
mod validation;

pub use builder::{DEFAULT_REFRESH_CAPACITY, NamespaceClientBuilder};
pub use client::{NamespaceClient, NamespaceSnapshot};
pub use settings::{ClientSettings, DEFAULT_CLUSTER, SettingsLoader};
pub use validation::Validate;
