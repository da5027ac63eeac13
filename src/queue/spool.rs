//! Spool queue over an object store prefix.
//!
//! Each message is one JSON object stored under `<prefix>/`. Producers name
//! entries so that lexicographic order is arrival order ([`SpoolQueue::enqueue`]
//! uses UUIDv7 keys). `pop` takes the smallest key, reads it and deletes it.

use async_trait::async_trait;
use object_store::{ObjectStore, local::LocalFileSystem, memory::InMemory, path::Path as StoragePath};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{MessageQueue, QueueError, Result};

#[derive(Clone)]
pub struct SpoolQueue {
    store: Arc<dyn ObjectStore>,
    prefix: StoragePath,
}

impl SpoolQueue {
    pub fn new(store: Arc<dyn ObjectStore>, prefix: &str) -> Self {
        Self {
            store,
            prefix: StoragePath::from(prefix),
        }
    }

    /// Spool rooted in a local directory, created if missing
    pub fn local(root: impl AsRef<Path>, prefix: &str) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root.join(prefix))?;

        info!(root = %root.display(), prefix, "Opening spool queue");

        let store = LocalFileSystem::new_with_prefix(root)?;
        Ok(Self::new(Arc::new(store), prefix))
    }

    pub fn in_memory(prefix: &str) -> Self {
        Self::new(Arc::new(InMemory::new()), prefix)
    }

    /// Write a message to the spool and return its key
    pub async fn enqueue(&self, message: &Value) -> Result<String> {
        let key = self.prefix.child(format!("{}.json", Uuid::now_v7()));
        let body = serde_json::to_vec(message).map_err(|e| QueueError::Malformed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        self.store.put(&key, body.into()).await?;
        debug!(key = %key, "Message spooled");

        Ok(key.to_string())
    }

    /// Number of entries currently waiting
    pub async fn len(&self) -> Result<usize> {
        let listing = self.store.list_with_delimiter(Some(&self.prefix)).await?;
        Ok(listing.objects.len())
    }

    async fn oldest_entry(&self) -> Result<Option<StoragePath>> {
        let listing = self.store.list_with_delimiter(Some(&self.prefix)).await?;
        Ok(listing
            .objects
            .into_iter()
            .map(|meta| meta.location)
            .min_by_key(|location| location.to_string()))
    }
}

#[async_trait]
impl MessageQueue for SpoolQueue {
    async fn pop(&self) -> Result<Option<Value>> {
        let Some(key) = self.oldest_entry().await? else {
            return Ok(None);
        };

        let body = match self.store.get(&key).await {
            Ok(result) => result.bytes().await?,
            // Taken by another consumer between list and get
            Err(object_store::Error::NotFound { .. }) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // Remove before parsing so a bad entry cannot wedge the queue
        self.store.delete(&key).await?;

        serde_json::from_slice(&body).map(Some).map_err(|e| {
            warn!(key = %key, error = %e, "Dropping malformed spool entry");
            QueueError::Malformed {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })
    }
}
