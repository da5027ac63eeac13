use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use tokio::sync::Mutex;

use super::{MessageQueue, Result};

/// FIFO queue held in memory
#[derive(Debug, Default)]
pub struct InMemoryQueue {
    messages: Mutex<VecDeque<Value>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_messages(messages: impl IntoIterator<Item = Value>) -> Self {
        Self {
            messages: Mutex::new(messages.into_iter().collect()),
        }
    }

    pub async fn push(&self, message: Value) {
        self.messages.lock().await.push_back(message);
    }

    pub async fn len(&self) -> usize {
        self.messages.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.lock().await.is_empty()
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn pop(&self) -> Result<Option<Value>> {
        Ok(self.messages.lock().await.pop_front())
    }
}
