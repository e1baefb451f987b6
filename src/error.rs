// src/error.rs
//
// Crate-wide error type.

use thiserror::Error;

/// Boxed error produced by the format and compression codecs.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors surfaced by every public s3namic operation.
#[derive(Error, Debug)]
pub enum Error {
    /// The key is absent on read or delete.
    #[error("object not found: {key}")]
    NotFound { key: String },

    /// Unrecognized extension with no override, or a document that does not
    /// fit the requested format.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Codec failure on malformed content.
    #[error("failed to decode object '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: BoxError,
    },

    /// Codec failure while serializing a document.
    #[error("failed to encode object '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: BoxError,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Wrapped failure from the storage backend (permissions, network, I/O).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl Error {
    pub fn not_found(key: impl Into<String>) -> Self {
        Error::NotFound { key: key.into() }
    }

    pub fn decode(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Decode { key: key.into(), source: source.into() }
    }

    pub fn encode(key: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Error::Encode { key: key.into(), source: source.into() }
    }

    /// True for [`Error::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Backend(e.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
