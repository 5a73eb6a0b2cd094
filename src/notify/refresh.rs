//! Republishing change batches as host-level refresh events.

use crate::error::Result;
use crate::model::ChangeBatch;
use crate::notify::subscriber::ChangeListener;
use std::collections::BTreeSet;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// "These keys changed" notice for code that re-reads its settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentChange {
    /// Namespace the keys belong to
    pub namespace: String,
    /// Keys changed by one batch
    pub keys: BTreeSet<String>,
}

/// Listener that logs every change and broadcasts an [`EnvironmentChange`].
///
/// Register it like any other listener, usually catch-all on every namespace
/// via [`NamespaceClient::publish_refreshes`](crate::core::NamespaceClient::publish_refreshes).
/// Nobody listening on the channel is not an error.
///
/// # Examples
///
/// ```rust,no_run
/// use hotswap_namespaces::notify::RefreshPublisher;
///
/// # async fn example() {
/// let publisher = RefreshPublisher::new(64);
/// let mut changes = publisher.subscribe();
///
/// while let Ok(change) = changes.recv().await {
///     println!("{}: {:?}", change.namespace, change.keys);
/// }
/// # }
/// ```
pub struct RefreshPublisher {
    sender: broadcast::Sender<EnvironmentChange>,
}

impl RefreshPublisher {
    /// Create a publisher whose channel buffers `capacity` events per receiver.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receive future refresh events.
    pub fn subscribe(&self) -> broadcast::Receiver<EnvironmentChange> {
        self.sender.subscribe()
    }
}

impl ChangeListener for RefreshPublisher {
    fn on_change(&self, batch: &ChangeBatch) -> Result<()> {
        for change in batch {
            info!(
                namespace = %change.namespace,
                key = %change.key,
                old_value = ?change.old_value,
                new_value = ?change.new_value,
                change_type = %change.change_type,
                "found config change"
            );
        }

        let event = EnvironmentChange {
            namespace: batch.namespace().to_string(),
            keys: batch.changed_keys().into_iter().map(str::to_string).collect(),
        };
        if self.sender.send(event).is_err() {
            debug!(namespace = batch.namespace(), "no refresh receivers");
        }
        Ok(())
    }
}
