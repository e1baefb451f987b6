// src/compression.rs
//
// gzip / bz2 codecs and the object-key suffix convention (`.gz`, `.bz2`).

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;

use crate::constants::{BZ2_SUFFIX, GZIP_SUFFIX};
use crate::error::Error;

/// Compression applied to an object body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Compression {
    #[default]
    None,
    Gzip,
    Bz2,
}

impl Compression {
    /// Detect compression from the key suffix.
    pub fn from_key(key: &str) -> Self {
        if key.ends_with(GZIP_SUFFIX) {
            Compression::Gzip
        } else if key.ends_with(BZ2_SUFFIX) {
            Compression::Bz2
        } else {
            Compression::None
        }
    }

    /// Key suffix, empty for `None`.
    pub fn suffix(&self) -> &'static str {
        match self {
            Compression::None => "",
            Compression::Gzip => GZIP_SUFFIX,
            Compression::Bz2 => BZ2_SUFFIX,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Compression::None)
    }

    /// Append the suffix unless the key already carries it.
    pub fn apply_suffix(&self, key: &str) -> String {
        let suffix = self.suffix();
        if key.ends_with(suffix) {
            key.to_string()
        } else {
            format!("{key}{suffix}")
        }
    }

    /// Drop a trailing `.gz` / `.bz2` from `key`, whichever is present.
    pub fn strip_suffix(key: &str) -> &str {
        key.strip_suffix(GZIP_SUFFIX)
            .or_else(|| key.strip_suffix(BZ2_SUFFIX))
            .unwrap_or(key)
    }

    pub fn compress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        match self {
            Compression::None => Ok(data.to_vec()),
            Compression::Gzip => {
                let mut enc = GzEncoder::new(Vec::with_capacity(data.len() / 2), flate2::Compression::default());
                enc.write_all(data)?;
                enc.finish()
            }
            Compression::Bz2 => {
                let mut enc = BzEncoder::new(Vec::with_capacity(data.len() / 2), bzip2::Compression::default());
                enc.write_all(data)?;
                enc.finish()
            }
        }
    }

    pub fn decompress(&self, data: &[u8]) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::with_capacity(data.len() * 2);
        match self {
            Compression::None => out.extend_from_slice(data),
            Compression::Gzip => {
                MultiGzDecoder::new(data).read_to_end(&mut out)?;
            }
            Compression::Bz2 => {
                BzDecoder::new(data).read_to_end(&mut out)?;
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Compression::None => "none",
            Compression::Gzip => "gzip",
            Compression::Bz2 => "bz2",
        })
    }
}

impl FromStr for Compression {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Compression::None),
            "gzip" | "gz" => Ok(Compression::Gzip),
            "bz2" | "bzip2" => Ok(Compression::Bz2),
            other => Err(Error::UnsupportedFormat(format!(
                "compression '{other}' (expected none, gzip or bz2)"
            ))),
        }
    }
}
