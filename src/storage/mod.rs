//! Storage gateway for finished images
//! Uses Apache Arrow object_store crate

use async_trait::async_trait;
use bytes::Bytes;
use object_store::{ObjectStore, local::LocalFileSystem, memory::InMemory, path::Path as StoragePath};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{StorageConfig, StorageProvider};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Object store error: {0}")]
    ObjectStoreError(#[from] object_store::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Metadata returned after upload
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub key: String,
    pub etag: Option<String>,
    pub size: usize,
}

/// Destination for upscaled images
#[async_trait]
pub trait ImageSink: Send + Sync {
    async fn post_image(&self, image: Bytes) -> Result<()>;
}

/// Storage client wrapping object_store
#[derive(Clone)]
pub struct StorageClient {
    store: Arc<dyn ObjectStore>,
    key_prefix: String,
}

impl StorageClient {
    /// Create new storage client with any object_store backend
    pub fn new(store: Arc<dyn ObjectStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
        }
    }

    /// Create in-memory storage for testing/development
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), "upscaled")
    }

    /// Store images below a local directory, created if missing
    pub fn local(root: impl AsRef<Path>, key_prefix: impl Into<String>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)?;

        let store = LocalFileSystem::new_with_prefix(root)?;
        Ok(Self::new(Arc::new(store), key_prefix))
    }

    /// Build the backend selected in configuration
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        match config.provider {
            StorageProvider::Memory => {
                tracing::warn!("Using in-memory image storage; images are lost on exit");
                Ok(Self::new(Arc::new(InMemory::new()), config.key_prefix.clone()))
            }
            StorageProvider::Local => {
                tracing::info!(root = %config.root.display(), "Storing images on local filesystem");
                Self::local(&config.root, config.key_prefix.clone())
            }
        }
    }

    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Upload bytes to storage
    pub async fn upload(&self, key: &str, data: Bytes) -> Result<UploadMetadata> {
        let path = StoragePath::from(key);
        let size = data.len();

        let put_result = self.store.put(&path, data.into()).await?;

        tracing::debug!(key, size, "Uploaded to storage");

        Ok(UploadMetadata {
            key: key.to_string(),
            etag: put_result.e_tag.clone(),
            size,
        })
    }

    /// Download from storage
    pub async fn download(&self, key: &str) -> Result<Bytes> {
        let path = StoragePath::from(key);

        let result = match self.store.get(&path).await {
            Ok(result) => result,
            Err(object_store::Error::NotFound { .. }) => {
                return Err(StorageError::NotFound(key.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let bytes = result.bytes().await?;

        tracing::debug!(key, size = bytes.len(), "Downloaded from storage");

        Ok(bytes)
    }

    /// Check if key exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        let path = StoragePath::from(key);

        match self.store.head(&path).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Keys of every stored image, sorted
    pub async fn list_images(&self) -> Result<Vec<String>> {
        let prefix = StoragePath::from(self.key_prefix.as_str());
        let listing = self.store.list_with_delimiter(Some(&prefix)).await?;

        let mut keys: Vec<String> = listing
            .objects
            .into_iter()
            .map(|meta| meta.location.to_string())
            .collect();
        keys.sort();

        Ok(keys)
    }

    /// Store an image under a fresh `<key_prefix>/<uuid-v7>` key
    pub async fn publish(&self, image: Bytes) -> Result<UploadMetadata> {
        let key = self.next_image_key();
        let meta = self.upload(&key, image).await?;

        tracing::info!(
            key = %meta.key,
            etag = meta.etag.as_deref().unwrap_or("-"),
            size = meta.size,
            "Image published"
        );

        Ok(meta)
    }

    fn next_image_key(&self) -> String {
        let id = Uuid::now_v7();
        if self.key_prefix.is_empty() {
            id.to_string()
        } else {
            format!("{}/{}", self.key_prefix.trim_end_matches('/'), id)
        }
    }
}

#[async_trait]
impl ImageSink for StorageClient {
    async fn post_image(&self, image: Bytes) -> Result<()> {
        self.publish(image).await.map(|_| ())
    }
}
