// src/constants.rs
//
// Centralized constants for s3namic to avoid hardcoded values throughout the codebase

/// Region used when neither the config nor the environment names one
pub const DEFAULT_REGION: &str = "us-east-1";

/// Default validity of a presigned URL (1 hour)
pub const DEFAULT_URL_EXPIRY_SECS: u64 = 3600;

/// Default connect timeout for the S3 client (1 hour, long transfers over slow links)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 60 * 60;

/// Default per-operation timeout for the S3 client (1 hour)
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 60 * 60;

/// Default number of attempts per S3 request. 1 disables SDK retries.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;

/// Default worker count for batch reads
pub const DEFAULT_READ_WORKERS: usize = 4;

/// Default CSV delimiter
pub const DEFAULT_DELIMITER: u8 = b',';

/// Object key separator
pub const KEY_SEPARATOR: char = '/';

/// Object key suffixes for compressed objects
pub const GZIP_SUFFIX: &str = ".gz";
pub const BZ2_SUFFIX: &str = ".bz2";

/// URI scheme constants
pub const SCHEME_S3: &str = "s3://";
pub const SCHEME_FILE: &str = "file://";
pub const SCHEME_MEMORY: &str = "mem://";

// =============================================================================
// Environment variables
// =============================================================================

/// Bucket used by `ClientConfig::from_env`
pub const ENV_BUCKET: &str = "S3NAMIC_BUCKET";

pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_SESSION_TOKEN: &str = "AWS_SESSION_TOKEN";
pub const ENV_REGION: &str = "AWS_REGION";
pub const ENV_ENDPOINT_URL: &str = "AWS_ENDPOINT_URL";

pub const ENV_CONNECT_TIMEOUT_SECS: &str = "S3NAMIC_CONNECT_TIMEOUT_SECS";
pub const ENV_OPERATION_TIMEOUT_SECS: &str = "S3NAMIC_OPERATION_TIMEOUT_SECS";
pub const ENV_MAX_ATTEMPTS: &str = "S3NAMIC_MAX_ATTEMPTS";

/// Worker threads of the global Tokio runtime that drives the AWS SDK
pub const ENV_RT_THREADS: &str = "S3NAMIC_RT_THREADS";
