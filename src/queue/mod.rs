//! Queue gateway: where upscale request messages come from
//!
//! The processing loop only needs "pop one message or none". Two adapters ship
//! with the crate:
//!
//! - [`InMemoryQueue`] - FIFO held in process memory (tests, local runs)
//! - [`SpoolQueue`] - JSON files dropped under an `object_store` prefix

pub mod memory;
pub mod spool;

pub use memory::InMemoryQueue;
pub use spool::SpoolQueue;

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

use crate::config::{QueueConfig, QueueProvider};

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("Object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed message '{key}': {reason}")]
    Malformed { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, QueueError>;

/// Non-blocking message source
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Remove and return the next message, or `None` if the queue is empty
    async fn pop(&self) -> Result<Option<Value>>;
}

/// Build the queue selected in configuration
pub fn from_config(config: &QueueConfig) -> Result<Arc<dyn MessageQueue>> {
    let queue: Arc<dyn MessageQueue> = match config.provider {
        QueueProvider::Memory => {
            tracing::warn!("Using in-memory queue; no messages will arrive from outside the process");
            Arc::new(InMemoryQueue::new())
        }
        QueueProvider::Spool => Arc::new(SpoolQueue::local(&config.root, &config.prefix)?),
    };

    Ok(queue)
}
