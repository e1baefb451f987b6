// src/object_store.rs
//
// Pluggable object-store abstraction with consistent URI schemes.
// Supported schemes: s3://bucket, file:///root/dir, mem://
// Every method is blocking; the S3 adapter drives the async SDK on the global
// runtime from s3_client.rs.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::{anyhow, Context};
use aws_sdk_s3::Client;
use bytes::Bytes;

use crate::config::ClientConfig;
use crate::constants::{SCHEME_FILE, SCHEME_MEMORY, SCHEME_S3};
use crate::error::{Error, Result};
use crate::s3_client::{build_client, run_on_global_rt};
use crate::s3_utils;

/// A minimal scheme enum so we can route URIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    S3,
    File,
    Memory,
    Unknown,
}

/// Best-effort scheme inference from a URI.
pub fn infer_scheme(uri: &str) -> Scheme {
    if uri.starts_with(SCHEME_S3) { Scheme::S3 }
    else if uri.starts_with(SCHEME_FILE) { Scheme::File }
    else if uri.starts_with(SCHEME_MEMORY) { Scheme::Memory }
    else { Scheme::Unknown }
}

/// Storage collaborator used by every s3namic operation.
///
/// Keys are bucket-relative (`dir/file.csv`), never full URIs.
pub trait ObjectStore: Send + Sync {
    /// Every key starting with `prefix`, complete and in backend order
    /// (lexicographic for all bundled backends). Pagination is internal.
    fn list(&self, prefix: &str) -> Result<Vec<String>>;

    /// Whole object in memory. [`Error::NotFound`] if absent.
    fn get(&self, key: &str) -> Result<Bytes>;

    /// Create or replace an object from an in-memory buffer.
    fn put(&self, key: &str, data: Bytes) -> Result<()>;

    /// Create or replace an object from a local file.
    fn put_file(&self, key: &str, path: &Path) -> Result<()> {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        self.put(key, Bytes::from(data))
    }

    /// Remove an object. [`Error::NotFound`] if absent.
    fn delete(&self, key: &str) -> Result<()>;

    fn exists(&self, key: &str) -> Result<bool>;

    /// Time-limited GET URL for `key`.
    fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String>;
}


// -----------------------------------------------------------------------------
// S3
// -----------------------------------------------------------------------------

/// S3 adapter bound to one bucket. Cloning is cheap (the SDK client is shared).
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Wrap an existing SDK client.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self { client, bucket: bucket.into() }
    }

    /// Build the SDK client from `cfg` (blocking).
    pub fn from_config(cfg: &ClientConfig) -> Result<Self> {
        let client = build_client(cfg)?;
        Ok(Self::new(client, cfg.bucket.clone()))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

impl ObjectStore for S3ObjectStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let (client, bucket, prefix) = (self.client.clone(), self.bucket.clone(), prefix.to_string());
        run_on_global_rt(async move { s3_utils::list_objects(&client, &bucket, &prefix).await })
    }

    fn get(&self, key: &str) -> Result<Bytes> {
        let (client, bucket, key) = (self.client.clone(), self.bucket.clone(), key.to_string());
        run_on_global_rt(async move { s3_utils::get_object(&client, &bucket, &key).await })
    }

    fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let (client, bucket, key) = (self.client.clone(), self.bucket.clone(), key.to_string());
        run_on_global_rt(async move { s3_utils::put_object(&client, &bucket, &key, data).await })
    }

    fn put_file(&self, key: &str, path: &Path) -> Result<()> {
        let (client, bucket, key) = (self.client.clone(), self.bucket.clone(), key.to_string());
        let path = path.to_path_buf();
        run_on_global_rt(async move {
            s3_utils::put_object_from_path(&client, &bucket, &key, &path).await
        })
    }

    fn delete(&self, key: &str) -> Result<()> {
        let (client, bucket, key) = (self.client.clone(), self.bucket.clone(), key.to_string());
        run_on_global_rt(async move { s3_utils::delete_object(&client, &bucket, &key).await })
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let (client, bucket, key) = (self.client.clone(), self.bucket.clone(), key.to_string());
        run_on_global_rt(async move { s3_utils::object_exists(&client, &bucket, &key).await })
    }

    fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        let (client, bucket, key) = (self.client.clone(), self.bucket.clone(), key.to_string());
        run_on_global_rt(async move {
            s3_utils::presign_get_object(&client, &bucket, &key, expires_in).await
        })
    }
}


// -----------------------------------------------------------------------------
// In-memory
// -----------------------------------------------------------------------------

/// Process-local store backed by a sorted map. Listing order is lexicographic,
/// like S3. Used for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryObjectStore {
    objects: Arc<RwLock<BTreeMap<String, Bytes>>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::Backend(anyhow!("memory store lock poisoned"))
}

impl ObjectStore for MemoryObjectStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let objects = self.objects.read().map_err(poisoned)?;
        Ok(objects
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn get(&self, key: &str) -> Result<Bytes> {
        let objects = self.objects.read().map_err(poisoned)?;
        objects.get(key).cloned().ok_or_else(|| Error::not_found(key))
    }

    fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let mut objects = self.objects.write().map_err(poisoned)?;
        objects.insert(key.to_string(), data);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut objects = self.objects.write().map_err(poisoned)?;
        objects.remove(key).map(|_| ()).ok_or_else(|| Error::not_found(key))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let objects = self.objects.read().map_err(poisoned)?;
        Ok(objects.contains_key(key))
    }

    fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String> {
        if !self.exists(key)? {
            return Err(Error::not_found(key));
        }
        Ok(format!("{SCHEME_MEMORY}{key}?expires_in={}", expires_in.as_secs()))
    }
}


/// Convenience factory that picks a backend from a URI.
///
/// - `s3://bucket` uses [`ClientConfig::from_env`] for everything but the bucket
/// - `file:///path/to/root` treats a local directory as the bucket
/// - `mem://` creates an empty in-memory store
pub fn store_for_uri(uri: &str) -> Result<Arc<dyn ObjectStore>> {
    match infer_scheme(uri) {
        Scheme::S3 => {
            let (bucket, key) = s3_utils::parse_s3_uri(uri)?;
            if !key.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "store URI must name only a bucket, got key '{key}'"
                )));
            }
            let cfg = ClientConfig::from_env(Some(&bucket))?;
            Ok(Arc::new(S3ObjectStore::from_config(&cfg)?))
        }
        Scheme::File => {
            let root = uri.trim_start_matches(SCHEME_FILE);
            Ok(Arc::new(crate::file_store::FileSystemObjectStore::new(root)?))
        }
        Scheme::Memory => Ok(Arc::new(MemoryObjectStore::new())),
        Scheme::Unknown => Err(Error::Backend(anyhow!(
            "Unable to infer backend from URI: {uri}. Supported schemes: s3://, file://, mem://"
        ))),
    }
}
