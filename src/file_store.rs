// src/file_store.rs
//
// FileSystemObjectStore: a local directory acting as a bucket.
// This provides the same ObjectStore interface for local filesystem operations

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use bytes::Bytes;
use tracing::{debug, trace, warn};

use crate::constants::{KEY_SEPARATOR, SCHEME_FILE};
use crate::error::{Error, Result};
use crate::object_store::ObjectStore;

/// FileSystem adapter that implements ObjectStore for local POSIX file operations.
///
/// Key Mapping:
/// - `dir/file.csv` -> `<root>/dir/file.csv`
/// - `dir/` (directory marker) -> the directory `<root>/dir`
///
/// Listing returns regular files plus empty directories (as `dir/` markers),
/// sorted lexicographically.
#[derive(Debug, Clone)]
pub struct FileSystemObjectStore {
    root: PathBuf,
}

impl FileSystemObjectStore {
    /// Use `root` as the bucket. The directory is created if missing.
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)
            .with_context(|| format!("failed to create store root {}", root.display()))?;
        let root = root
            .canonicalize()
            .with_context(|| format!("failed to resolve store root {}", root.display()))?;
        debug!(root = %root.display(), "opened filesystem object store");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key onto the filesystem, refusing anything that escapes the root.
    fn path_for(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::InvalidArgument(format!("invalid object key '{key}'")));
        }
        Ok(self.root.join(relative))
    }

    /// Object key for `path`. `None` when any component is not valid UTF-8,
    /// since such a path has no key that maps back to it.
    fn key_for(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts = rel
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<Vec<_>>>()?;
        Some(parts.join("/"))
    }

    fn walk(&self, dir: &Path, out: &mut Vec<String>) -> anyhow::Result<()> {
        let mut saw_entry = false;
        for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
            let entry = entry?;
            saw_entry = true;
            let path = entry.path();
            if entry.file_name().to_str().is_none() {
                warn!(path = %path.display(), "skipping entry with a non UTF-8 name");
                continue;
            }
            if entry.file_type()?.is_dir() {
                self.walk(&path, out)?;
            } else if let Some(key) = self.key_for(&path) {
                out.push(key);
            }
        }
        if !saw_entry && dir != self.root {
            if let Some(key) = self.key_for(dir) {
                out.push(format!("{key}{KEY_SEPARATOR}"));
            }
        }
        Ok(())
    }
}

fn map_io(key: &str, err: std::io::Error, what: &str) -> Error {
    if err.kind() == ErrorKind::NotFound {
        Error::not_found(key)
    } else {
        Error::Backend(anyhow::Error::from(err).context(format!("{what} failed for {key}")))
    }
}

impl ObjectStore for FileSystemObjectStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        self.walk(&self.root, &mut keys)?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        trace!(prefix, count = keys.len(), "listed files");
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Bytes> {
        let path = self.path_for(key)?;
        if key.ends_with(KEY_SEPARATOR) {
            return if path.is_dir() { Ok(Bytes::new()) } else { Err(Error::not_found(key)) };
        }
        let data = fs::read(&path).map_err(|e| map_io(key, e, "read"))?;
        Ok(Bytes::from(data))
    }

    fn put(&self, key: &str, data: Bytes) -> Result<()> {
        let path = self.path_for(key)?;
        if key.ends_with(KEY_SEPARATOR) {
            fs::create_dir_all(&path).map_err(|e| map_io(key, e, "mkdir"))?;
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| map_io(key, e, "mkdir"))?;
        }
        fs::write(&path, &data).map_err(|e| map_io(key, e, "write"))?;
        Ok(())
    }

    fn put_file(&self, key: &str, src: &Path) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| map_io(key, e, "mkdir"))?;
        }
        fs::copy(src, &path)
            .with_context(|| format!("failed to copy {} to {}", src.display(), path.display()))?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        let res = if key.ends_with(KEY_SEPARATOR) {
            fs::remove_dir(&path)
        } else {
            fs::remove_file(&path)
        };
        res.map_err(|e| map_io(key, e, "delete"))
    }

    fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        Ok(if key.ends_with(KEY_SEPARATOR) { path.is_dir() } else { path.is_file() })
    }

    /// Local files need no signature; the URL is a plain `file://` URL.
    fn presign_get(&self, key: &str, _expires_in: Duration) -> Result<String> {
        if !self.exists(key)? {
            return Err(Error::not_found(key));
        }
        Ok(format!("{SCHEME_FILE}{}", self.path_for(key)?.display()))
    }
}
