//
// Copyright, 2025.  The s3namic authors.
//
// src/s3_utils.rs
//! Async S3 helpers on top of the AWS SDK: paginated listing, GET, PUT,
//! DELETE, HEAD and presigning. `S3ObjectStore` drives these on the global
//! runtime to offer a blocking API.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use crate::error::{Error, Result};

// End imports


/// Error codes S3 and compatible services use for a missing key.
fn is_not_found<E: ProvideErrorMetadata, R>(err: &SdkError<E, R>) -> bool {
    matches!(err.code(), Some("NoSuchKey") | Some("NotFound") | Some("404"))
}

/// Split `s3://bucket/key` → (`bucket`, `key`). `key` may be empty (prefix).
pub fn parse_s3_uri(uri: &str) -> anyhow::Result<(String, String)> {
    let trimmed = uri
        .strip_prefix("s3://")
        .context("URI must start with s3://")?;
    let (bucket, key) = trimmed.split_once('/').unwrap_or((trimmed, ""));
    if bucket.is_empty() {
        bail!("URI has an empty bucket name: {uri}");
    }
    Ok((bucket.to_owned(), key.to_owned()))
}

// -----------------------------------------------------------------------------
//  Listing
// -----------------------------------------------------------------------------

/// List every key that starts with `prefix` (handles pagination).
pub async fn list_objects(client: &Client, bucket: &str, prefix: &str) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut cont: Option<String> = None;
    loop {
        let mut req = client.list_objects_v2().bucket(bucket).prefix(prefix);
        if let Some(token) = &cont {
            req = req.continuation_token(token);
        }
        let resp = req.send().await.context("list_objects_v2 failed")?;
        for obj in resp.contents() {
            if let Some(k) = obj.key() {
                keys.push(k.to_owned());
            }
        }
        match resp.next_continuation_token() {
            Some(token) => cont = Some(token.to_string()),
            None => break,
        }
    }
    debug!(bucket, prefix, count = keys.len(), "listed objects");
    Ok(keys)
}

// ----------------------------
// Get / head
// ----------------------------

/// Download a single object into memory.
pub async fn get_object(client: &Client, bucket: &str, key: &str) -> Result<Bytes> {
    let resp = match client.get_object().bucket(bucket).key(key).send().await {
        Ok(resp) => resp,
        Err(e) if is_not_found(&e) => return Err(Error::not_found(key)),
        Err(e) => return Err(anyhow::Error::from(e).context(format!("get_object failed for {key}")).into()),
    };
    let data = resp
        .body
        .collect()
        .await
        .context("collect body failed")?
        .into_bytes();
    debug!(bucket, key, bytes = data.len(), "GET");
    Ok(data)
}

/// HEAD an object. `Ok(false)` when it does not exist.
pub async fn object_exists(client: &Client, bucket: &str, key: &str) -> Result<bool> {
    match client.head_object().bucket(bucket).key(key).send().await {
        Ok(_) => Ok(true),
        Err(e) if is_not_found(&e) => Ok(false),
        Err(e) => Err(anyhow::Error::from(e).context(format!("head_object failed for {key}")).into()),
    }
}

// ---------------------
// Put / delete
// ---------------------

/// Upload an in-memory buffer.
pub async fn put_object(client: &Client, bucket: &str, key: &str, data: Bytes) -> Result<()> {
    let len = data.len();
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(ByteStream::from(data))
        .send()
        .await
        .with_context(|| format!("put_object failed for {key}"))?;
    debug!(bucket, key, bytes = len, "PUT");
    Ok(())
}

/// Upload a local file, streaming it from disk instead of buffering it.
pub async fn put_object_from_path(client: &Client, bucket: &str, key: &str, path: &Path) -> Result<()> {
    let body = ByteStream::from_path(path)
        .await
        .with_context(|| format!("failed to open {} for upload", path.display()))?;
    client
        .put_object()
        .bucket(bucket)
        .key(key)
        .body(body)
        .send()
        .await
        .with_context(|| format!("put_object failed for {key}"))?;
    debug!(bucket, key, path = %path.display(), "PUT (file)");
    Ok(())
}

/// Delete one object. S3 deletes are idempotent, so existence is checked first
/// to report [`Error::NotFound`].
pub async fn delete_object(client: &Client, bucket: &str, key: &str) -> Result<()> {
    if !object_exists(client, bucket, key).await? {
        return Err(Error::not_found(key));
    }
    client
        .delete_object()
        .bucket(bucket)
        .key(key)
        .send()
        .await
        .with_context(|| format!("delete_object failed for {key}"))?;
    debug!(bucket, key, "DELETE");
    Ok(())
}

// ---------------------
// Presigning
// ---------------------

/// Presigned GET URL valid for `expires_in`.
pub async fn presign_get_object(client: &Client, bucket: &str, key: &str, expires_in: Duration) -> Result<String> {
    let config = PresigningConfig::expires_in(expires_in)
        .map_err(|e| Error::InvalidArgument(format!("invalid presign expiry {expires_in:?}: {e}")))?;
    let presigned = client
        .get_object()
        .bucket(bucket)
        .key(key)
        .presigned(config)
        .await
        .with_context(|| format!("presign failed for {key}"))?;
    Ok(presigned.uri().to_string())
}
