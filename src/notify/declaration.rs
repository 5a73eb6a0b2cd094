//! Plain-data interest declarations supplied by the embedding application.

use crate::discovery::{DEFAULT_NAMESPACE, NamespaceSet};
use crate::notify::subscriber::{ChangeListener, InterestFilter};
use std::fmt;
use std::sync::Arc;

/// A listener together with the namespaces and keys it wants to hear about.
///
/// Declarations are built at startup and handed to
/// [`NamespaceClient::bind`](crate::core::NamespaceClient::bind), which
/// registers the listener once per resolved namespace.
///
/// # Examples
///
/// ```rust
/// use hotswap_namespaces::model::ChangeBatch;
/// use hotswap_namespaces::notify::InterestDeclaration;
///
/// let declaration = InterestDeclaration::new(|batch: &ChangeBatch| {
///     println!("{} changed", batch.namespace());
/// })
/// .with_namespaces(["application", "redis"])
/// .with_key_prefixes(["db."]);
///
/// assert_eq!(declaration.namespaces().len(), 2);
/// ```
#[derive(Clone)]
pub struct InterestDeclaration {
    namespaces: NamespaceSet,
    filter: InterestFilter,
    listener: Arc<dyn ChangeListener>,
}

impl InterestDeclaration {
    /// Declare `listener` for the default namespace with no key filter.
    pub fn new(listener: impl ChangeListener + 'static) -> Self {
        Self::from_shared(Arc::new(listener))
    }

    /// Declare an already shared listener.
    pub fn from_shared(listener: Arc<dyn ChangeListener>) -> Self {
        Self {
            namespaces: NamespaceSet::new(),
            filter: InterestFilter::all(),
            listener,
        }
    }

    /// Replace the declared namespaces.
    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict the declaration to these exact keys.
    pub fn with_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = self.filter.with_keys(keys);
        self
    }

    /// Restrict the declaration to keys starting with these prefixes.
    pub fn with_key_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter = self.filter.with_prefixes(prefixes);
        self
    }

    /// Declared namespaces; `{"application"}` when none were given.
    pub fn namespaces(&self) -> NamespaceSet {
        if self.namespaces.is_empty() {
            NamespaceSet::from([DEFAULT_NAMESPACE.to_string()])
        } else {
            self.namespaces.clone()
        }
    }

    /// The interest filter.
    pub fn filter(&self) -> &InterestFilter {
        &self.filter
    }

    /// The listener.
    pub fn listener(&self) -> Arc<dyn ChangeListener> {
        Arc::clone(&self.listener)
    }
}

impl fmt::Debug for InterestDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterestDeclaration")
            .field("namespaces", &self.namespaces)
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}
