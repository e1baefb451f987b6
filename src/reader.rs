// src/reader.rs
//
// Read and parse every object under a prefix on a bounded rayon pool.

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::compression::Compression;
use crate::constants::{DEFAULT_READ_WORKERS, KEY_SEPARATOR};
use crate::data_formats::{self, Document, FileFormat, ReadOptions};
use crate::error::{Error, Result};
use crate::object_store::ObjectStore;

/// Options for [`read_many`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadManyOptions {
    /// Parse every object as this format instead of going by extension.
    pub format: Option<FileFormat>,
    pub read: ReadOptions,
    /// Number of pool threads, at least 1.
    pub workers: usize,
    /// Keep only keys containing this substring.
    pub name_contains: Option<String>,
}

impl Default for ReadManyOptions {
    fn default() -> Self {
        Self {
            format: None,
            read: ReadOptions::default(),
            workers: DEFAULT_READ_WORKERS,
            name_contains: None,
        }
    }
}

impl ReadManyOptions {
    /// One worker per logical CPU.
    pub fn with_available_parallelism() -> Self {
        Self::default().workers(num_cpus::get())
    }

    pub fn format(mut self, f: FileFormat) -> Self {
        self.format = Some(f);
        self
    }

    pub fn read_options(mut self, read: ReadOptions) -> Self {
        self.read = read;
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.workers = n;
        self
    }

    pub fn name_contains(mut self, s: impl Into<String>) -> Self {
        self.name_contains = Some(s.into());
        self
    }
}

/// Fetch, decompress and decode a single object.
pub(crate) fn read_object(
    store: &dyn ObjectStore,
    key: &str,
    format: Option<FileFormat>,
    opts: &ReadOptions,
) -> Result<Document> {
    let format = FileFormat::resolve(key, format)?;
    let raw = store.get(key)?;
    let data = Compression::from_key(key)
        .decompress(&raw)
        .map_err(|e| Error::decode(key, e))?;
    trace!(key, %format, bytes = data.len(), "decoding object");
    data_formats::decode(key, format, &data, opts)
}

/// Read every object under `prefix`.
///
/// Directory markers are skipped. Results come back in listing order whatever
/// the order of completion. The first failure is returned and the rest of the
/// batch is discarded.
pub fn read_many(
    store: &dyn ObjectStore,
    prefix: &str,
    options: &ReadManyOptions,
) -> Result<Vec<Document>> {
    if options.workers == 0 {
        return Err(Error::InvalidArgument("workers must be at least 1".into()));
    }

    let keys: Vec<String> = store
        .list(prefix)?
        .into_iter()
        .filter(|k| !k.ends_with(KEY_SEPARATOR))
        .filter(|k| match &options.name_contains {
            Some(needle) => k.contains(needle.as_str()),
            None => true,
        })
        .collect();

    if keys.is_empty() {
        debug!(prefix, "nothing to read");
        return Ok(Vec::new());
    }

    debug!(prefix, count = keys.len(), workers = options.workers, "reading objects");

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .build()
        .map_err(|e| Error::Backend(anyhow::Error::new(e).context("failed to create read pool")))?;

    pool.install(|| {
        keys.par_iter()
            .map(|key| read_object(store, key, options.format, &options.read))
            .collect::<Result<Vec<_>>>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_store::MemoryObjectStore;
    use bytes::Bytes;

    fn seeded(n: usize) -> MemoryObjectStore {
        let store = MemoryObjectStore::new();
        for i in 0..n {
            let body = format!("file {i:03}");
            store.put(&format!("logs/{i:03}.txt"), Bytes::from(body)).unwrap();
        }
        store
    }

    #[test]
    fn keeps_listing_order_for_any_pool_size() {
        let store = seeded(40);
        let expected: Vec<String> = (0..40).map(|i| format!("file {i:03}")).collect();
        for workers in [1, 3, 8, 64] {
            let docs = read_many(&store, "logs/", &ReadManyOptions::default().workers(workers)).unwrap();
            let got: Vec<String> = docs.iter().map(|d| d.as_text().unwrap().to_string()).collect();
            assert_eq!(got, expected, "workers = {workers}");
        }
    }

    #[test]
    fn empty_listing_is_empty_result() {
        let store = MemoryObjectStore::new();
        assert!(read_many(&store, "nothing/", &ReadManyOptions::default()).unwrap().is_empty());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let store = seeded(1);
        let err = read_many(&store, "", &ReadManyOptions::default().workers(0)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn one_bad_object_fails_the_batch() {
        let store = seeded(10);
        store.put("logs/005.json", Bytes::from_static(b"{broken")).unwrap();
        let err = read_many(&store, "logs/", &ReadManyOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Decode { ref key, .. } if key == "logs/005.json"));
    }

    #[test]
    fn unknown_extension_without_override() {
        let store = MemoryObjectStore::new();
        store.put("img/cat.png", Bytes::from_static(b"\x89PNG")).unwrap();
        let err = read_many(&store, "img/", &ReadManyOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));

        let docs = read_many(&store, "img/", &ReadManyOptions::default().format(FileFormat::Text));
        assert!(docs.is_err(), "png bytes are not UTF-8");
    }

    #[test]
    fn markers_skipped_and_filter_applied() {
        let store = MemoryObjectStore::new();
        store.put("d/", Bytes::new()).unwrap();
        store.put("d/keep.txt", Bytes::from_static(b"keep")).unwrap();
        store.put("d/skip.txt", Bytes::from_static(b"skip")).unwrap();
        let docs = read_many(&store, "d/", &ReadManyOptions::default().name_contains("keep")).unwrap();
        assert_eq!(docs, vec![Document::Text("keep".into())]);
    }

    #[test]
    fn compressed_objects_are_decompressed() {
        let store = MemoryObjectStore::new();
        let packed = Compression::Gzip.compress(br#"{"a":1}"#).unwrap();
        store.put("j/one.json.gz", Bytes::from(packed)).unwrap();
        let docs = read_many(&store, "j/", &ReadManyOptions::default()).unwrap();
        assert_eq!(docs[0].as_json().unwrap()["a"], 1);
    }
}
