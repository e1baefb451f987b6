// src/lib.rs
//
// Copyright, 2025.  The s3namic authors.
//
// Crate root: module tree plus the public re-exports.

// ===== Core Public API =====
pub mod api;

pub use api::{Payload, S3namic};

// ===== Building blocks =====

pub mod compression;
pub mod config;
pub mod constants;
pub mod data_formats;
pub mod error;
pub mod file_store;
pub mod object_store;
pub mod reader;
pub mod s3_client;
pub mod s3_utils;
pub mod tree;

pub use compression::Compression;
pub use config::{ClientConfig, StaticCredentials};
pub use data_formats::{encoding_for_label, Document, FileFormat, ReadOptions, Table, WriteOptions};
pub use error::{Error, Result};
pub use file_store::FileSystemObjectStore;
pub use object_store::{infer_scheme, store_for_uri, MemoryObjectStore, ObjectStore, S3ObjectStore, Scheme};
pub use reader::{read_many, ReadManyOptions};
pub use tree::{build_tree, TreeNode};
