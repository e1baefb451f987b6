// src/data_formats/json.rs

use serde_json::Value;

use super::text::{from_utf8, to_utf8};
use super::{ReadOptions, WriteOptions};
use crate::error::BoxError;

pub fn decode(data: &[u8], opts: &ReadOptions) -> Result<Value, BoxError> {
    Ok(serde_json::from_str(&to_utf8(data, opts.encoding)?)?)
}

/// Non-ASCII characters are written as-is in the target encoding, never
/// escaped.
pub fn encode(value: &Value, opts: &WriteOptions) -> Result<Vec<u8>, BoxError> {
    let bytes = if opts.pretty {
        serde_json::to_vec_pretty(value)?
    } else {
        serde_json::to_vec(value)?
    };
    from_utf8(std::str::from_utf8(&bytes)?, opts.encoding)
}
