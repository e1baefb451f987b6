// src/data_formats/text.rs
//
// Plain text plus the transcoding helpers shared by the CSV and JSON codecs.
// Decoding is strict: malformed input is an error, never replaced.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

use super::{ReadOptions, WriteOptions};
use crate::error::BoxError;

/// `data` in `encoding` as UTF-8. Borrows when the input is already UTF-8.
pub(crate) fn to_utf8<'a>(data: &'a [u8], encoding: &'static Encoding) -> Result<Cow<'a, str>, BoxError> {
    encoding
        .decode_without_bom_handling_and_without_replacement(data)
        .ok_or_else(|| format!("input is not valid {}", encoding.name()).into())
}

/// UTF-8 `text` re-encoded as `encoding`. Characters the encoding cannot
/// represent are an error. UTF-16 labels encode as UTF-8, as in encoding_rs.
pub(crate) fn from_utf8(text: &str, encoding: &'static Encoding) -> Result<Vec<u8>, BoxError> {
    if encoding == UTF_8 {
        return Ok(text.as_bytes().to_vec());
    }
    let (bytes, used, unmappable) = encoding.encode(text);
    if unmappable {
        return Err(format!("text has characters not representable in {}", used.name()).into());
    }
    Ok(bytes.into_owned())
}

pub fn decode(data: &[u8], opts: &ReadOptions) -> Result<String, BoxError> {
    Ok(to_utf8(data, opts.encoding)?.into_owned())
}

pub fn encode(text: &str, opts: &WriteOptions) -> Result<Vec<u8>, BoxError> {
    from_utf8(text, opts.encoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::EUC_KR;

    #[test]
    fn invalid_utf8_is_rejected() {
        let opts = ReadOptions::default();
        assert!(decode(&[0xff, 0xfe, 0x00], &opts).is_err());
        assert_eq!(decode("héllo".as_bytes(), &opts).unwrap(), "héllo");
    }

    #[test]
    fn euc_kr_round_trip() {
        let bytes = encode("안녕하세요", &WriteOptions::default().encoding(EUC_KR)).unwrap();
        assert_eq!(bytes.len(), 10);
        assert!(std::str::from_utf8(&bytes).is_err());
        assert_eq!(decode(&bytes, &ReadOptions::default().encoding(EUC_KR)).unwrap(), "안녕하세요");
    }

    #[test]
    fn unmappable_characters_fail_to_encode() {
        assert!(encode("emoji 🦀", &WriteOptions::default().encoding(EUC_KR)).is_err());
    }
}
