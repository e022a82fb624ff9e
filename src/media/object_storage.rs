//! Object storage for artist images.
//!
//! Callers compute public URLs themselves; the storage only accepts bytes
//! under a bucket-relative key.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{Attribute, Attributes, ObjectStore, PutOptions, PutPayload};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Key written by [`ObjectStorage::probe`].
pub const PROBE_KEY: &str = "test/connection-test.txt";

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key` with the given content type and cache directive.
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
        cache_control: &str,
    ) -> Result<()>;

    /// Write a small marker object to prove the storage accepts writes.
    async fn probe(&self) -> Result<()> {
        let body = format!("connection test at {}", chrono::Utc::now().to_rfc3339());
        self.put(PROBE_KEY, Bytes::from(body), "text/plain", "no-cache")
            .await
    }
}

/// [`ObjectStorage`] over any `object_store` backend.
pub struct ObjectStoreStorage {
    store: Arc<dyn ObjectStore>,
    /// The local filesystem backend rejects object attributes, so they are
    /// only sent to backends that keep them.
    supports_attributes: bool,
}

impl ObjectStoreStorage {
    pub fn new(store: Arc<dyn ObjectStore>, supports_attributes: bool) -> Self {
        Self {
            store,
            supports_attributes,
        }
    }

    /// S3 bucket; credentials are taken from the standard AWS environment.
    pub fn s3(bucket: &str, region: &str, endpoint: Option<&str>) -> Result<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .with_region(region);
        if let Some(endpoint) = endpoint {
            builder = builder.with_endpoint(endpoint);
        }
        let store = builder
            .build()
            .with_context(|| format!("Failed to configure S3 bucket {}", bucket))?;
        Ok(Self::new(Arc::new(store), true))
    }

    pub fn local(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create storage directory {:?}", root))?;
        let store = LocalFileSystem::new_with_prefix(root)
            .with_context(|| format!("Failed to open storage directory {:?}", root))?;
        Ok(Self::new(Arc::new(store), false))
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemory::new()), true)
    }

    pub fn inner(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }
}

#[async_trait]
impl ObjectStorage for ObjectStoreStorage {
    async fn put(
        &self,
        key: &str,
        bytes: Bytes,
        content_type: &str,
        cache_control: &str,
    ) -> Result<()> {
        let location = ObjectPath::from(key);
        let mut attributes = Attributes::new();
        if self.supports_attributes {
            attributes.insert(Attribute::ContentType, content_type.to_string().into());
            attributes.insert(Attribute::CacheControl, cache_control.to_string().into());
        }
        let options = PutOptions {
            attributes,
            ..Default::default()
        };

        let size = bytes.len();
        self.store
            .put_opts(&location, PutPayload::from(bytes), options)
            .await
            .with_context(|| format!("Failed to upload {}", key))?;
        debug!("Uploaded {} ({} bytes, {})", key, size, content_type);
        Ok(())
    }
}
