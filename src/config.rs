// src/config.rs
//
// Connection settings for the S3 backend.

use std::env;
use std::time::Duration;

use crate::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MAX_ATTEMPTS, DEFAULT_OPERATION_TIMEOUT_SECS,
    ENV_ACCESS_KEY_ID, ENV_BUCKET, ENV_CONNECT_TIMEOUT_SECS, ENV_ENDPOINT_URL, ENV_MAX_ATTEMPTS,
    ENV_OPERATION_TIMEOUT_SECS, ENV_REGION, ENV_SECRET_ACCESS_KEY, ENV_SESSION_TOKEN,
};
use crate::error::{Error, Result};

/// Static credentials handed to the SDK instead of its default provider chain.
#[derive(Clone)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"***")
            .field("session_token", &self.session_token.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Everything needed to build an S3 client bound to one bucket.
///
/// ```
/// use s3namic::ClientConfig;
///
/// let cfg = ClientConfig::new("my-bucket")
///     .region("ap-northeast-2")
///     .credentials("AKIA...", "secret")
///     .max_attempts(3);
/// assert_eq!(cfg.bucket, "my-bucket");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub bucket: String,
    /// `None` falls back to the SDK provider chain, then `us-east-1`.
    pub region: Option<String>,
    /// `None` uses the SDK default credential chain.
    pub credentials: Option<StaticCredentials>,
    /// Custom endpoint for S3-compatible services (MinIO, Ceph, ...).
    pub endpoint: Option<String>,
    /// Path-style addressing. Defaults to true whenever an endpoint is set.
    pub force_path_style: bool,
    pub connect_timeout: Duration,
    pub operation_timeout: Duration,
    /// Attempts per request, including the first. 1 disables retries.
    pub max_attempts: u32,
}

impl ClientConfig {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: None,
            credentials: None,
            endpoint: None,
            force_path_style: false,
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Build a config from the process environment (after loading `.env`).
    ///
    /// `S3NAMIC_BUCKET` is required unless `bucket` is given.
    pub fn from_env(bucket: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let bucket = match bucket {
            Some(b) => b.to_string(),
            None => env::var(ENV_BUCKET).map_err(|_| {
                Error::InvalidArgument(format!("no bucket given and {ENV_BUCKET} is not set"))
            })?,
        };
        let mut cfg = ClientConfig::new(bucket);

        if let Some(region) = non_empty_var(ENV_REGION) {
            cfg = cfg.region(region);
        }
        if let (Some(ak), Some(sk)) = (
            non_empty_var(ENV_ACCESS_KEY_ID),
            non_empty_var(ENV_SECRET_ACCESS_KEY),
        ) {
            cfg = cfg.credentials(ak, sk);
            if let (Some(token), Some(creds)) = (non_empty_var(ENV_SESSION_TOKEN), cfg.credentials.as_mut()) {
                creds.session_token = Some(token);
            }
        }
        if let Some(endpoint) = non_empty_var(ENV_ENDPOINT_URL) {
            cfg = cfg.endpoint(endpoint);
        }
        if let Some(secs) = parse_var::<u64>(ENV_CONNECT_TIMEOUT_SECS)? {
            cfg.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(ENV_OPERATION_TIMEOUT_SECS)? {
            cfg.operation_timeout = Duration::from_secs(secs);
        }
        if let Some(n) = parse_var::<u32>(ENV_MAX_ATTEMPTS)? {
            cfg = cfg.max_attempts(n);
        }
        Ok(cfg)
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn credentials(mut self, access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        self.credentials = Some(StaticCredentials {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        });
        self
    }

    /// Set a custom endpoint. Also switches on path-style addressing.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self.force_path_style = true;
        self
    }

    pub fn force_path_style(mut self, on: bool) -> Self {
        self.force_path_style = on;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn operation_timeout(mut self, timeout: Duration) -> Self {
        self.operation_timeout = timeout;
        self
    }

    /// `0` is treated as `1`.
    pub fn max_attempts(mut self, n: u32) -> Self {
        self.max_attempts = n.max(1);
        self
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match non_empty_var(name) {
        None => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| Error::InvalidArgument(format!("{name}={raw} is not a valid number"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_turns_on_path_style() {
        let cfg = ClientConfig::new("b").endpoint("http://localhost:9000");
        assert!(cfg.force_path_style);
        assert_eq!(cfg.endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn defaults_disable_retries() {
        let cfg = ClientConfig::new("b");
        assert_eq!(cfg.max_attempts, 1);
        assert_eq!(cfg.connect_timeout, Duration::from_secs(3600));
        assert!(cfg.region.is_none());
        assert_eq!(ClientConfig::new("b").max_attempts(0).max_attempts, 1);
    }

    #[test]
    fn debug_hides_secret() {
        let cfg = ClientConfig::new("b").credentials("AKIDEXAMPLE", "topsecret");
        let shown = format!("{cfg:?}");
        assert!(shown.contains("AKIDEXAMPLE"));
        assert!(!shown.contains("topsecret"));
    }
}
