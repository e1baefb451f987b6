// tests/test_tree.rs
//
// Path tree construction from real listings (memory and filesystem stores).

use anyhow::Result;
use bytes::Bytes;
use s3namic::{build_tree, Compression, FileSystemObjectStore, MemoryObjectStore, S3namic};
use std::sync::Arc;
use tempfile::TempDir;

fn seed(s3: &S3namic, keys: &[&str]) -> Result<()> {
    for key in keys {
        s3.write_file(key, Bytes::from_static(b"x"), Compression::None)?;
    }
    Ok(())
}

#[test]
fn test_listing_with_and_without_leaves() -> Result<()> {
    let s3 = S3namic::with_store(Arc::new(MemoryObjectStore::new()));
    seed(&s3, &["a/b/c.csv", "x/y/"])?;

    let tree = s3.make_tree("", true)?;
    assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["a/", "x/"]);
    assert!(tree.descend(&["a/", "a/b/", "a/b/c.csv"]).is_some());
    assert!(tree.descend(&["x/", "x/y/"]).is_some_and(|n| n.is_empty()));

    let dirs_only = s3.make_tree("", false)?;
    assert!(dirs_only.descend(&["a/", "a/b/"]).is_some_and(|n| n.is_empty()));
    Ok(())
}

#[test]
fn test_prefix_limits_tree() -> Result<()> {
    let s3 = S3namic::with_store(Arc::new(MemoryObjectStore::new()));
    seed(&s3, &["logs/2024/01.txt", "logs/2024/02.txt", "raw/blob.bin"])?;

    let tree = s3.make_tree("logs/", true)?;
    assert_eq!(tree.keys().collect::<Vec<_>>(), vec!["logs/"]);
    assert_eq!(tree.files(), vec!["logs/2024/01.txt", "logs/2024/02.txt"]);
    assert_eq!(s3.find_files("logs/")?, vec!["logs/2024/01.txt", "logs/2024/02.txt"]);
    Ok(())
}

#[test]
fn test_filesystem_listing_feeds_tree() -> Result<()> {
    let dir = TempDir::new()?;
    let store = FileSystemObjectStore::new(dir.path())?;
    let s3 = S3namic::with_store(Arc::new(store));
    seed(&s3, &["docs/readme.md", "docs/img/", "top.txt"])?;

    let tree = s3.make_tree("", true)?;
    assert!(tree.contains("top.txt"));
    assert!(tree.descend(&["docs/", "docs/img/"]).is_some_and(|n| n.is_empty()));
    assert!(tree.descend(&["docs/", "docs/readme.md"]).is_some());
    assert_eq!(s3.find_files("")?, vec!["docs/readme.md", "top.txt"]);
    Ok(())
}

#[test]
fn test_repeated_listing_is_idempotent() {
    let keys = ["a/", "a/b/c.csv", "a/d.txt", "e/f/", "g.json"];
    let twice: Vec<&str> = keys.iter().chain(keys.iter()).copied().collect();
    assert_eq!(build_tree(keys, true), build_tree(twice, true));
}

#[test]
fn test_tree_serializes_to_json() -> Result<()> {
    let tree = build_tree(["a/b/c.csv", "x/y/"], true);
    let json: serde_json::Value = serde_json::to_value(&tree)?;
    assert_eq!(
        json,
        serde_json::json!({
            "a/": { "a/b/": { "a/b/c.csv": {} } },
            "x/": { "x/y/": {} }
        })
    );
    Ok(())
}
