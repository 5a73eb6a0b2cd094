//! Namespace descriptors and change records.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// A namespace visible to an application/cluster, as returned by discovery.
///
/// Only `namespace_name` identifies a namespace. The other fields are
/// informational and never take part in deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceDescriptor {
    /// Server-side id
    pub id: i64,
    /// Owning application
    pub app_id: String,
    /// Cluster the namespace was found in
    pub cluster_name: String,
    /// Namespace name
    pub namespace_name: String,
}

impl NamespaceDescriptor {
    /// Create a descriptor.
    pub fn new(
        id: i64,
        app_id: impl Into<String>,
        cluster_name: impl Into<String>,
        namespace_name: impl Into<String>,
    ) -> Self {
        Self {
            id,
            app_id: app_id.into(),
            cluster_name: cluster_name.into(),
            namespace_name: namespace_name.into(),
        }
    }
}

/// Kind of change applied to a single key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeType {
    /// The key did not exist before
    Added,
    /// The key existed with a different value
    Modified,
    /// The key no longer exists
    Deleted,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Added => write!(f, "ADDED"),
            Self::Modified => write!(f, "MODIFIED"),
            Self::Deleted => write!(f, "DELETED"),
        }
    }
}

/// A change to one key of one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Namespace the key lives in
    pub namespace: String,
    /// The changed key
    pub key: String,
    /// Value before the change
    pub old_value: Option<String>,
    /// Value after the change
    pub new_value: Option<String>,
    /// What happened to the key
    pub change_type: ChangeType,
}

impl ChangeRecord {
    /// A key that appeared with `value`.
    pub fn added(
        namespace: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            old_value: None,
            new_value: Some(value.into()),
            change_type: ChangeType::Added,
        }
    }

    /// A key whose value went from `old` to `new`.
    pub fn modified(
        namespace: impl Into<String>,
        key: impl Into<String>,
        old: impl Into<String>,
        new: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            old_value: Some(old.into()),
            new_value: Some(new.into()),
            change_type: ChangeType::Modified,
        }
    }

    /// A key that was removed while holding `old`.
    pub fn deleted(
        namespace: impl Into<String>,
        key: impl Into<String>,
        old: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            key: key.into(),
            old_value: Some(old.into()),
            new_value: None,
            change_type: ChangeType::Deleted,
        }
    }
}

/// One atomic group of key changes for a single namespace.
///
/// A batch is never empty and every record shares the batch's namespace.
/// Listeners always receive the whole batch, in the order it was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    namespace: String,
    records: Vec<ChangeRecord>,
}

impl ChangeBatch {
    /// Build a batch from records detected in one refresh.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidChangeBatch`] if `records` is empty or a
    /// record belongs to a different namespace.
    pub fn new(namespace: impl Into<String>, records: Vec<ChangeRecord>) -> Result<Self> {
        let namespace = namespace.into();
        if records.is_empty() {
            return Err(ConfigError::InvalidChangeBatch(format!(
                "batch for namespace '{}' has no records",
                namespace
            )));
        }
        if let Some(stray) = records.iter().find(|r| r.namespace != namespace) {
            return Err(ConfigError::InvalidChangeBatch(format!(
                "record for key '{}' belongs to namespace '{}', not '{}'",
                stray.key, stray.namespace, namespace
            )));
        }
        Ok(Self { namespace, records })
    }

    /// Compute the batch that turns `old` into `new`.
    ///
    /// Records are ordered by key. Returns `None` when the snapshots are equal.
    pub fn diff(
        namespace: &str,
        old: &HashMap<String, String>,
        new: &HashMap<String, String>,
    ) -> Option<Self> {
        let keys: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        let records: Vec<ChangeRecord> = keys
            .into_iter()
            .filter_map(|key| match (old.get(key), new.get(key)) {
                (None, Some(value)) => Some(ChangeRecord::added(namespace, key, value)),
                (Some(before), None) => Some(ChangeRecord::deleted(namespace, key, before)),
                (Some(before), Some(after)) if before != after => {
                    Some(ChangeRecord::modified(namespace, key, before, after))
                }
                _ => None,
            })
            .collect();

        if records.is_empty() {
            None
        } else {
            Some(Self {
                namespace: namespace.to_string(),
                records,
            })
        }
    }

    /// Namespace shared by every record.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Records in batch order.
    pub fn records(&self) -> &[ChangeRecord] {
        &self.records
    }

    /// Iterate over the records in batch order.
    pub fn iter(&self) -> std::slice::Iter<'_, ChangeRecord> {
        self.records.iter()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct keys touched by this batch.
    pub fn changed_keys(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.key.as_str()).collect()
    }

    /// Whether `key` was changed in this batch.
    pub fn is_changed(&self, key: &str) -> bool {
        self.records.iter().any(|r| r.key == key)
    }

    /// The last change recorded for `key`, if any.
    pub fn change(&self, key: &str) -> Option<&ChangeRecord> {
        self.records.iter().rev().find(|r| r.key == key)
    }

    /// Snapshot of `key -> new value` for the changed keys, deletions as `None`.
    pub fn new_values(&self) -> BTreeMap<&str, Option<&str>> {
        self.records
            .iter()
            .map(|r| (r.key.as_str(), r.new_value.as_deref()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ChangeBatch {
    type Item = &'a ChangeRecord;
    type IntoIter = std::slice::Iter<'a, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
