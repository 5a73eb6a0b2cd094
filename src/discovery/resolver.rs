//! Merging static and discovered namespace names.

use crate::model::NamespaceDescriptor;
use std::collections::BTreeSet;

/// Namespace a client binds to when nothing else is declared.
pub const DEFAULT_NAMESPACE: &str = "application";

/// A deduplicated set of namespace names.
pub type NamespaceSet = BTreeSet<String>;

/// Union statically declared names with the names of discovered namespaces.
///
/// Pure and idempotent. An empty `discovered` slice (discovery failed or found
/// nothing) simply yields the static names.
///
/// # Examples
///
/// ```rust
/// use hotswap_namespaces::discovery::{resolve, NamespaceSet};
/// use hotswap_namespaces::model::NamespaceDescriptor;
///
/// let declared: NamespaceSet = ["application".to_string()].into();
/// let discovered = vec![
///     NamespaceDescriptor::new(1, "app1", "default", "application"),
///     NamespaceDescriptor::new(2, "app1", "default", "redis"),
/// ];
///
/// let names = resolve(&declared, &discovered);
/// assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["application", "redis"]);
/// ```
pub fn resolve(static_names: &NamespaceSet, discovered: &[NamespaceDescriptor]) -> NamespaceSet {
    static_names
        .iter()
        .cloned()
        .chain(discovered.iter().map(|d| d.namespace_name.clone()))
        .collect()
}

/// Parse a comma-separated namespace list such as `"application, FX.apollo"`.
///
/// Entries are trimmed and blanks dropped.
pub fn parse_namespace_list(list: &str) -> NamespaceSet {
    list.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
