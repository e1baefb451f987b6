// src/api.rs
//! # s3namic public API
//!
//! [`S3namic`] bundles every file-oriented operation behind one handle bound to
//! a bucket (or any other [`ObjectStore`]): upload, download, typed reads and
//! writes per format, compression, presigned URLs, listing and tree views.
//!
//! ```
//! use std::sync::Arc;
//! use s3namic::{Compression, MemoryObjectStore, ReadOptions, S3namic, WriteOptions};
//!
//! # fn main() -> s3namic::Result<()> {
//! let s3 = S3namic::with_store(Arc::new(MemoryObjectStore::new()));
//! let key = s3.write_txt("notes/hello.txt", "hi", &WriteOptions::default().compression(Compression::Gzip))?;
//! assert_eq!(key, "notes/hello.txt.gz");
//! assert_eq!(s3.read_txt(&key, &ReadOptions::default())?, "hi");
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use tracing::{debug, info};

use crate::compression::Compression;
use crate::config::ClientConfig;
use crate::constants::{DEFAULT_URL_EXPIRY_SECS, KEY_SEPARATOR};
use crate::data_formats::{self, Document, FileFormat, ReadOptions, Table, WriteOptions};
use crate::error::{Error, Result};
use crate::object_store::{ObjectStore, S3ObjectStore};
use crate::reader::{self, ReadManyOptions};
use crate::tree::{build_tree, TreeNode};

/// Upload source: a buffer already in memory, or a file streamed from disk.
#[derive(Debug, Clone)]
pub enum Payload {
    Bytes(Bytes),
    File(PathBuf),
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Bytes(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(v: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(v))
    }
}

impl From<PathBuf> for Payload {
    fn from(p: PathBuf) -> Self {
        Payload::File(p)
    }
}

/// File-oriented handle over one bucket.
#[derive(Clone)]
pub struct S3namic {
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for S3namic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3namic").finish_non_exhaustive()
    }
}

impl S3namic {
    /// Connect to S3 (blocking: builds the SDK client on the global runtime).
    pub fn new(cfg: &ClientConfig) -> Result<Self> {
        debug!(bucket = %cfg.bucket, "connecting to S3");
        Ok(Self::with_store(Arc::new(S3ObjectStore::from_config(cfg)?)))
    }

    /// Bucket from `S3NAMIC_BUCKET` unless given, everything else from env.
    pub fn from_env(bucket: Option<&str>) -> Result<Self> {
        Self::new(&ClientConfig::from_env(bucket)?)
    }

    pub fn with_store(store: Arc<dyn ObjectStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn ObjectStore {
        self.store.as_ref()
    }

    // -------------------------------------------------------------------------
    // Raw objects
    // -------------------------------------------------------------------------

    /// Store `payload` under `key`, compressed when asked. Returns the key the
    /// object was written to (`key` plus `.gz` / `.bz2` when compressed).
    pub fn upload(&self, key: &str, payload: Payload, compression: Compression) -> Result<String> {
        let target = compression.apply_suffix(key);
        match (payload, compression) {
            (Payload::File(path), Compression::None) => {
                self.store.put_file(&target, &path)?;
            }
            (Payload::File(path), c) => {
                let data = fs::read(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                let packed = c.compress(&data).map_err(|e| Error::encode(&target, e))?;
                self.store.put(&target, Bytes::from(packed))?;
            }
            (Payload::Bytes(data), Compression::None) => {
                self.store.put(&target, data)?;
            }
            (Payload::Bytes(data), c) => {
                let packed = c.compress(&data).map_err(|e| Error::encode(&target, e))?;
                self.store.put(&target, Bytes::from(packed))?;
            }
        }
        debug!(key = %target, %compression, "uploaded object");
        Ok(target)
    }

    pub fn upload_file(&self, local_path: impl AsRef<Path>, key: &str) -> Result<()> {
        self.upload(key, Payload::File(local_path.as_ref().to_path_buf()), Compression::None)?;
        Ok(())
    }

    /// Raw object bytes to `local_path`. Parent directories are created.
    pub fn download_file(&self, key: &str, local_path: impl AsRef<Path>) -> Result<()> {
        let path = local_path.as_ref();
        let data = self.store.get(key)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, &data).with_context(|| format!("failed to write {}", path.display()))?;
        debug!(key, path = %path.display(), bytes = data.len(), "downloaded object");
        Ok(())
    }

    pub fn delete_file(&self, key: &str) -> Result<()> {
        self.store.delete(key)?;
        debug!(key, "deleted object");
        Ok(())
    }

    /// Object bytes, decompressed according to the key suffix.
    pub fn read_file(&self, key: &str) -> Result<Bytes> {
        let raw = self.store.get(key)?;
        match Compression::from_key(key) {
            Compression::None => Ok(raw),
            c => c.decompress(&raw).map(Bytes::from).map_err(|e| Error::decode(key, e)),
        }
    }

    /// Object bytes exactly as stored (images and other opaque blobs).
    pub fn read_bytes(&self, key: &str) -> Result<Bytes> {
        self.store.get(key)
    }

    /// Same as [`S3namic::upload`] with an in-memory buffer.
    pub fn write_file(&self, key: &str, data: impl Into<Bytes>, compression: Compression) -> Result<String> {
        self.upload(key, Payload::Bytes(data.into()), compression)
    }

    /// Write a compressed copy of `key` to `key` plus the compression suffix
    /// and return that key. The source object is never overwritten, even when
    /// it already carries the same suffix (`a.gz` becomes `a.gz.gz`).
    pub fn compress(&self, key: &str, compression: Compression) -> Result<String> {
        if !compression.is_enabled() {
            return Err(Error::InvalidArgument("compression must be gzip or bz2".into()));
        }
        let target = format!("{key}{}", compression.suffix());
        let data = self.store.get(key)?;
        let packed = compression.compress(&data).map_err(|e| Error::encode(&target, e))?;
        self.store.put(&target, Bytes::from(packed))?;
        info!("The file {key} was compressed using {compression} and saved as {target}.");
        Ok(target)
    }

    /// Write a decompressed copy of `key` without its `.gz` / `.bz2` suffix.
    /// Returns the new key.
    pub fn decompress(&self, key: &str) -> Result<String> {
        let target = Compression::strip_suffix(key);
        if target == key {
            return Err(Error::InvalidArgument(format!("'{key}' has no compression suffix")));
        }
        let data = self.read_file(key)?;
        self.store.put(target, data)?;
        info!("The file {key} was unzipped and saved as {target}.");
        Ok(target.to_string())
    }

    /// Presigned GET URL, valid for `expires_in` (one hour when `None`).
    pub fn get_file_url(&self, key: &str, expires_in: Option<Duration>) -> Result<String> {
        let expires_in = expires_in.unwrap_or(Duration::from_secs(DEFAULT_URL_EXPIRY_SECS));
        self.store.presign_get(key, expires_in)
    }

    // -------------------------------------------------------------------------
    // Typed readers
    // -------------------------------------------------------------------------

    /// Decode `key` as `format`, or by its extension when `format` is `None`.
    pub fn read_auto(&self, key: &str, format: Option<FileFormat>, opts: &ReadOptions) -> Result<Document> {
        reader::read_object(self.store.as_ref(), key, format, opts)
    }

    pub fn read_csv(&self, key: &str, opts: &ReadOptions) -> Result<Table> {
        match self.read_auto(key, Some(FileFormat::Csv), opts)? {
            Document::Table(t) => Ok(t),
            other => Err(unexpected(key, &other)),
        }
    }

    pub fn read_json(&self, key: &str, opts: &ReadOptions) -> Result<serde_json::Value> {
        match self.read_auto(key, Some(FileFormat::Json), opts)? {
            Document::Json(v) => Ok(v),
            other => Err(unexpected(key, &other)),
        }
    }

    pub fn read_txt(&self, key: &str, opts: &ReadOptions) -> Result<String> {
        match self.read_auto(key, Some(FileFormat::Text), opts)? {
            Document::Text(s) => Ok(s),
            other => Err(unexpected(key, &other)),
        }
    }

    pub fn read_pickle(&self, key: &str) -> Result<serde_pickle::Value> {
        match self.read_auto(key, Some(FileFormat::Pickle), &ReadOptions::default())? {
            Document::Pickle(v) => Ok(v),
            other => Err(unexpected(key, &other)),
        }
    }

    pub fn read_parquet(&self, key: &str) -> Result<Vec<RecordBatch>> {
        match self.read_auto(key, Some(FileFormat::Parquet), &ReadOptions::default())? {
            Document::Parquet(b) => Ok(b),
            other => Err(unexpected(key, &other)),
        }
    }

    pub fn read_excel(&self, key: &str, opts: &ReadOptions) -> Result<Table> {
        match self.read_auto(key, Some(FileFormat::Excel), opts)? {
            Document::Table(t) => Ok(t),
            other => Err(unexpected(key, &other)),
        }
    }

    // -------------------------------------------------------------------------
    // Typed writers. Each returns the key actually written.
    // -------------------------------------------------------------------------

    /// Encode `doc` as `format` and store it, compressed per `opts`.
    pub fn write_document(&self, key: &str, doc: &Document, format: FileFormat, opts: &WriteOptions) -> Result<String> {
        let data = data_formats::encode(key, doc, format, opts)?;
        self.write_file(key, data, opts.compression)
    }

    pub fn write_csv(&self, key: &str, table: &Table, opts: &WriteOptions) -> Result<String> {
        self.write_document(key, &Document::Table(table.clone()), FileFormat::Csv, opts)
    }

    pub fn write_json(&self, key: &str, value: &serde_json::Value, opts: &WriteOptions) -> Result<String> {
        self.write_document(key, &Document::Json(value.clone()), FileFormat::Json, opts)
    }

    pub fn write_txt(&self, key: &str, text: &str, opts: &WriteOptions) -> Result<String> {
        self.write_document(key, &Document::Text(text.to_string()), FileFormat::Text, opts)
    }

    pub fn write_pickle(&self, key: &str, value: &serde_pickle::Value, opts: &WriteOptions) -> Result<String> {
        self.write_document(key, &Document::Pickle(value.clone()), FileFormat::Pickle, opts)
    }

    pub fn write_parquet(&self, key: &str, batches: &[RecordBatch], opts: &WriteOptions) -> Result<String> {
        self.write_document(key, &Document::Parquet(batches.to_vec()), FileFormat::Parquet, opts)
    }

    pub fn write_excel(&self, key: &str, table: &Table, opts: &WriteOptions) -> Result<String> {
        self.write_document(key, &Document::Table(table.clone()), FileFormat::Excel, opts)
    }

    // -------------------------------------------------------------------------
    // Listing
    // -------------------------------------------------------------------------

    /// Extension of `key` ignoring a compression suffix.
    pub fn extension<'a>(&self, key: &'a str) -> Option<&'a str> {
        data_formats::extension(key)
    }

    pub fn list_files(&self, prefix: &str) -> Result<Vec<String>> {
        self.store.list(prefix)
    }

    pub fn make_tree(&self, prefix: &str, with_file_names: bool) -> Result<TreeNode> {
        let keys = self.store.list(prefix)?;
        Ok(build_tree(&keys, with_file_names))
    }

    /// First key under `prefix` matching `name`, in listing order.
    ///
    /// With `contains`, any key holding `name` as a substring matches.
    /// Otherwise the whole key or its final segment must equal `name`.
    pub fn find_file(&self, name: &str, prefix: &str, contains: bool) -> Result<Option<String>> {
        let found = self.store.list(prefix)?.into_iter().find(|key| {
            if contains {
                key.contains(name)
            } else {
                key == name || key.rsplit(KEY_SEPARATOR).next() == Some(name)
            }
        });
        Ok(found)
    }

    /// File keys under `prefix`, directory markers left out.
    pub fn find_files(&self, prefix: &str) -> Result<Vec<String>> {
        let keys = self.store.list(prefix)?;
        let tree = build_tree(&keys, true);
        Ok(tree.files().into_iter().map(str::to_string).collect())
    }

    /// Read every object under `prefix` in parallel. See [`reader::read_many`].
    pub fn read_thread(&self, prefix: &str, opts: &ReadManyOptions) -> Result<Vec<Document>> {
        reader::read_many(self.store.as_ref(), prefix, opts)
    }
}

fn unexpected(key: &str, doc: &Document) -> Error {
    Error::UnsupportedFormat(format!("'{key}' decoded to a {} document", doc.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_store::MemoryObjectStore;

    fn mem() -> S3namic {
        S3namic::with_store(Arc::new(MemoryObjectStore::new()))
    }

    #[test]
    fn compress_then_decompress_keys() {
        let s3 = mem();
        s3.write_file("a/b.txt", Bytes::from_static(b"hello"), Compression::None).unwrap();
        assert_eq!(s3.compress("a/b.txt", Compression::Gzip).unwrap(), "a/b.txt.gz");
        assert_eq!(s3.compress("a/b.txt", Compression::Bz2).unwrap(), "a/b.txt.bz2");

        s3.delete_file("a/b.txt").unwrap();
        assert_eq!(s3.decompress("a/b.txt.bz2").unwrap(), "a/b.txt");
        assert_eq!(s3.read_txt("a/b.txt", &ReadOptions::default()).unwrap(), "hello");
        assert!(matches!(s3.decompress("a/b.txt"), Err(Error::InvalidArgument(_))));
        assert!(matches!(s3.compress("a/b.txt", Compression::None), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn compress_never_overwrites_the_source() {
        let s3 = mem();
        let key = s3.write_file("a.txt", Bytes::from_static(b"hello"), Compression::Gzip).unwrap();
        assert_eq!(key, "a.txt.gz");

        assert_eq!(s3.compress("a.txt.gz", Compression::Gzip).unwrap(), "a.txt.gz.gz");
        assert_eq!(&s3.read_file("a.txt.gz").unwrap()[..], b"hello");

        let twice = s3.read_file("a.txt.gz.gz").unwrap();
        assert_eq!(Compression::Gzip.decompress(&twice).unwrap(), b"hello");
    }

    #[test]
    fn read_file_is_transparent_read_bytes_is_raw() {
        let s3 = mem();
        let key = s3.write_file("x.txt", Bytes::from_static(b"payload"), Compression::Gzip).unwrap();
        assert_eq!(&s3.read_file(&key).unwrap()[..], b"payload");
        assert_ne!(&s3.read_bytes(&key).unwrap()[..], b"payload");
    }

    #[test]
    fn find_file_modes() {
        let s3 = mem();
        for k in ["data/2024/report.csv", "data/2024/report.csv.gz", "data/notes.txt"] {
            s3.write_file(k, Bytes::from_static(b"x"), Compression::None).unwrap();
        }
        assert_eq!(s3.find_file("report", "data/", true).unwrap().as_deref(), Some("data/2024/report.csv"));
        assert_eq!(s3.find_file("notes.txt", "", false).unwrap().as_deref(), Some("data/notes.txt"));
        assert_eq!(s3.find_file("report", "", false).unwrap(), None);
    }

    #[test]
    fn default_url_expiry_is_one_hour() {
        let s3 = mem();
        s3.write_file("k.txt", Bytes::from_static(b"x"), Compression::None).unwrap();
        let url = s3.get_file_url("k.txt", None).unwrap();
        assert!(url.ends_with("expires_in=3600"), "{url}");
        assert!(s3.get_file_url("missing", None).unwrap_err().is_not_found());
    }
}
