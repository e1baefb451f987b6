// src/s3_client.rs
//
// Copyright, 2025.  The s3namic authors.
//
//! Thread‑safe, blocking bridge around the async AWS Rust SDK.
//! Owns a single global multi-thread Tokio runtime and builds S3 clients from
//! a [`ClientConfig`].
//!

use anyhow::{Context, Result};
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client;
use std::thread;
use tokio::runtime::{Builder as TokioBuilder, Handle};
use tokio::sync::oneshot;
use std::sync::mpsc;
use tracing::debug;

use crate::config::ClientConfig;
use crate::constants::{DEFAULT_REGION, ENV_RT_THREADS};


// -----------------------------------------------------------------------------
// Global runtime (lazy, thread-safe)
// -----------------------------------------------------------------------------
static RT_HANDLE: once_cell::sync::OnceCell<Handle> = once_cell::sync::OnceCell::new();


// Create (once) a background multi-thread Tokio runtime and return its Handle.
fn global_rt_handle() -> &'static Handle {
    RT_HANDLE.get_or_init(|| {
        let (tx, rx) = mpsc::sync_channel(1);
        thread::Builder::new()
            .name("s3namic-rt".to_string())
            .spawn(move || {
                let threads = get_runtime_threads();
                debug!("Creating Tokio runtime with {} worker threads", threads);

                let rt = TokioBuilder::new_multi_thread()
                    .enable_io()
                    .enable_time()
                    .worker_threads(threads)
                    .thread_name("s3namic-rt-worker")
                    .build()
                    .expect("failed to build global tokio runtime");

                // Send a Handle clone back to the creator, then park the runtime forever.
                let handle = rt.handle().clone();
                tx.send(handle).expect("send runtime handle");
                rt.block_on(async { std::future::pending::<()>().await });
            })
            .expect("failed to spawn s3namic runtime thread");

        rx.recv().expect("receive runtime handle")
    })
}

/// Runtime thread count, `S3NAMIC_RT_THREADS` overrides.
fn get_runtime_threads() -> usize {
    std::env::var(ENV_RT_THREADS)
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n: &usize| *n > 0)
        .unwrap_or_else(|| std::cmp::min(std::cmp::max(4, num_cpus::get()), 16))
}


/// Run an async `fut` on the global runtime and block the **current** thread
/// until it completes. Works from plain threads, rayon workers, and from inside
/// another Tokio runtime.
pub fn run_on_global_rt<F, T, E>(fut: F) -> std::result::Result<T, E>
where
    F: std::future::Future<Output = std::result::Result<T, E>> + Send + 'static,
    T: Send + 'static,
    E: From<anyhow::Error> + Send + 'static,
{
    let handle = global_rt_handle().clone();
    match Handle::try_current() {
        Ok(_) => {
            // Inside a runtime: blocking_recv would panic, use a std channel.
            let (tx, rx) = mpsc::channel();
            handle.spawn(async move {
                let _ = tx.send(fut.await);
            });
            rx.recv()
                .map_err(|_| E::from(anyhow::anyhow!("global runtime task crashed: RecvError(())")))?
        }
        Err(_) => {
            let (tx, rx) = oneshot::channel();
            handle.spawn(async move {
                let _ = tx.send(fut.await);
            });
            rx.blocking_recv()
                .map_err(|_| E::from(anyhow::anyhow!("global runtime task crashed: RecvError(())")))?
        }
    }
}


// -----------------------------------------------------------------------------
// Client factory
// -----------------------------------------------------------------------------

/// Blocking client construction, hops onto the global runtime.
pub fn build_client(cfg: &ClientConfig) -> Result<Client> {
    let cfg = cfg.clone();
    run_on_global_rt(async move { build_client_async(&cfg).await })
}

/// Build an S3 client from `cfg`. Safe to call from any async context.
pub async fn build_client_async(cfg: &ClientConfig) -> Result<Client> {
    let region = RegionProviderChain::first_try(cfg.region.clone().map(Region::new))
        .or_default_provider()
        .or_else(Region::new(DEFAULT_REGION));

    let mut loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(creds) = &cfg.credentials {
        loader = loader.credentials_provider(Credentials::new(
            creds.access_key_id.clone(),
            creds.secret_access_key.clone(),
            creds.session_token.clone(),
            None,
            "s3namic-static",
        ));
    }
    if let Some(endpoint) = cfg.endpoint.as_deref().filter(|e| !e.is_empty()) {
        loader = loader.endpoint_url(endpoint);
    }

    let timeout_config = TimeoutConfig::builder()
        .connect_timeout(cfg.connect_timeout)
        .operation_timeout(cfg.operation_timeout)
        .build();
    let retry_config = if cfg.max_attempts <= 1 {
        RetryConfig::disabled()
    } else {
        RetryConfig::standard().with_max_attempts(cfg.max_attempts)
    };

    let sdk_config = loader
        .timeout_config(timeout_config)
        .retry_config(retry_config)
        .load()
        .await;

    debug!(
        bucket = %cfg.bucket,
        endpoint = ?cfg.endpoint,
        path_style = cfg.force_path_style,
        max_attempts = cfg.max_attempts,
        "building S3 client"
    );

    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .force_path_style(cfg.force_path_style)
        .build();
    let client = Client::from_conf(s3_config);
    // Touch the region so misconfiguration fails here, not on first request.
    client
        .config()
        .region()
        .context("S3 client has no region configured")?;
    Ok(client)
}
