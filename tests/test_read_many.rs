// tests/test_read_many.rs
//
// Batch reads over mixed formats and compressions.

use anyhow::Result;
use s3namic::{
    read_many, Compression, Document, FileFormat, MemoryObjectStore, ObjectStore, ReadManyOptions,
    S3namic, Table, WriteOptions,
};
use std::sync::Arc;

fn mixed() -> Result<(Arc<MemoryObjectStore>, S3namic)> {
    let store = Arc::new(MemoryObjectStore::new());
    let s3 = S3namic::with_store(store.clone());
    let table = Table::new(vec!["k".into()], vec![vec!["v".into()]]);

    s3.write_file("batch/", bytes::Bytes::new(), Compression::None)?;
    s3.write_csv("batch/a.csv", &table, &WriteOptions::default())?;
    s3.write_json("batch/b.json", &serde_json::json!({"b": true}), &WriteOptions::default().compression(Compression::Gzip))?;
    s3.write_txt("batch/c.txt", "see", &WriteOptions::default().compression(Compression::Bz2))?;
    s3.write_pickle("batch/d.pkl", &serde_pickle::Value::I64(4), &WriteOptions::default())?;
    Ok((store, s3))
}

#[test]
fn test_mixed_formats_in_listing_order() -> Result<()> {
    let (_, s3) = mixed()?;
    let docs = s3.read_thread("batch/", &ReadManyOptions::default().workers(2))?;
    let kinds: Vec<&str> = docs.iter().map(Document::kind).collect();
    assert_eq!(kinds, vec!["table", "json", "text", "pickle"]);
    assert_eq!(docs[1].as_json().and_then(|v| v["b"].as_bool()), Some(true));
    assert_eq!(docs[2].as_text(), Some("see"));
    assert_eq!(docs[3].as_pickle(), Some(&serde_pickle::Value::I64(4)));
    Ok(())
}

#[test]
fn test_matches_sequential_reads() -> Result<()> {
    let (store, s3) = mixed()?;
    let parallel = read_many(store.as_ref(), "batch/", &ReadManyOptions::with_available_parallelism())?;

    let mut sequential = Vec::new();
    for key in store.list("batch/")? {
        if key.ends_with('/') {
            continue;
        }
        sequential.push(s3.read_auto(&key, None, &Default::default())?);
    }
    assert_eq!(parallel, sequential);
    Ok(())
}

#[test]
fn test_name_filter_and_override() -> Result<()> {
    let (_, s3) = mixed()?;
    s3.write_txt("batch/e.log", "not an extension we know", &WriteOptions::default())?;

    assert!(s3.read_thread("batch/", &ReadManyOptions::default()).is_err());

    let opts = ReadManyOptions::default().name_contains(".log").format(FileFormat::Text);
    let docs = s3.read_thread("batch/", &opts)?;
    assert_eq!(docs, vec![Document::Text("not an extension we know".into())]);
    Ok(())
}

#[test]
fn test_failure_returns_no_partial_results() -> Result<()> {
    let (store, s3) = mixed()?;
    store.put("batch/z.json", bytes::Bytes::from_static(b"[1, 2"))?;
    let err = s3.read_thread("batch/", &ReadManyOptions::default().workers(8)).unwrap_err();
    assert!(matches!(err, s3namic::Error::Decode { .. }), "{err}");
    Ok(())
}
