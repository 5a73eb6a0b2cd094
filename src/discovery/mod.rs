//! Namespace discovery and namespace set resolution.

mod namespace_discovery;
mod resolver;

pub use namespace_discovery::{DEFAULT_DISCOVERY_TIMEOUT, NamespaceDiscovery};
pub use resolver::{DEFAULT_NAMESPACE, NamespaceSet, parse_namespace_list, resolve};
