// src/data_formats/mod.rs
//
// Supported object formats, the extension dispatch table, and the codecs that
// turn object bytes into a `Document` and back.

pub mod csv;
pub mod excel;
pub mod json;
pub mod parquet;
pub mod pickle;
pub mod text;

use std::fmt;
use std::str::FromStr;

use arrow::record_batch::RecordBatch;
use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;

use crate::compression::Compression;
use crate::constants::{DEFAULT_DELIMITER, KEY_SEPARATOR};
use crate::error::{Error, Result};

/// Formats s3namic can read and write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Csv,
    Json,
    Pickle,
    Text,
    Parquet,
    Excel,
}

/// Extension → format. Anything not listed is unsupported.
const EXTENSION_TABLE: &[(&str, FileFormat)] = &[
    ("csv", FileFormat::Csv),
    ("json", FileFormat::Json),
    ("pkl", FileFormat::Pickle),
    ("pickle", FileFormat::Pickle),
    ("txt", FileFormat::Text),
    ("text", FileFormat::Text),
    ("sql", FileFormat::Text),
    ("parquet", FileFormat::Parquet),
    ("xlsx", FileFormat::Excel),
    ("xls", FileFormat::Excel),
];

impl FileFormat {
    pub fn from_extension(ext: &str) -> Result<Self> {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        EXTENSION_TABLE
            .iter()
            .find(|(e, _)| *e == ext)
            .map(|(_, f)| *f)
            .ok_or_else(|| Error::UnsupportedFormat(format!("extension '{ext}'")))
    }

    /// Format of `key`, looking past a `.gz` / `.bz2` suffix.
    pub fn from_key(key: &str) -> Result<Self> {
        match extension(key) {
            Some(ext) => Self::from_extension(ext),
            None => Err(Error::UnsupportedFormat(format!("'{key}' has no extension"))),
        }
    }

    /// Explicit override wins, otherwise detect from the key.
    pub fn resolve(key: &str, override_format: Option<FileFormat>) -> Result<Self> {
        match override_format {
            Some(f) => Ok(f),
            None => Self::from_key(key),
        }
    }

    /// Canonical extension used when writing.
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::Pickle => "pkl",
            FileFormat::Text => "txt",
            FileFormat::Parquet => "parquet",
            FileFormat::Excel => "xlsx",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileFormat::Csv => "csv",
            FileFormat::Json => "json",
            FileFormat::Pickle => "pickle",
            FileFormat::Text => "text",
            FileFormat::Parquet => "parquet",
            FileFormat::Excel => "excel",
        })
    }
}

impl FromStr for FileFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "excel" => Ok(FileFormat::Excel),
            other => FileFormat::from_extension(other),
        }
    }
}

/// Extension of the last path segment of `key`, after dropping a compression
/// suffix. `None` if that segment has no `.`.
///
/// ```
/// use s3namic::data_formats::extension;
///
/// assert_eq!(extension("logs/2024/app.json.gz"), Some("json"));
/// assert_eq!(extension("README"), None);
/// ```
pub fn extension(key: &str) -> Option<&str> {
    let key = Compression::strip_suffix(key);
    let name = key.rsplit(KEY_SEPARATOR).next().unwrap_or(key);
    name.rsplit_once('.').map(|(_, ext)| ext).filter(|ext| !ext.is_empty())
}

/// Row-oriented table: CSV files and Excel worksheets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a header, if present.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

/// Decoded object content.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Table(Table),
    Json(serde_json::Value),
    Pickle(serde_pickle::Value),
    Text(String),
    Parquet(Vec<RecordBatch>),
}

impl Document {
    /// Short name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Document::Table(_) => "table",
            Document::Json(_) => "json",
            Document::Pickle(_) => "pickle",
            Document::Text(_) => "text",
            Document::Parquet(_) => "parquet",
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self { Document::Table(t) => Some(t), _ => None }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self { Document::Json(v) => Some(v), _ => None }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self { Document::Text(s) => Some(s), _ => None }
    }

    pub fn as_pickle(&self) -> Option<&serde_pickle::Value> {
        match self { Document::Pickle(v) => Some(v), _ => None }
    }

    pub fn as_batches(&self) -> Option<&[RecordBatch]> {
        match self { Document::Parquet(b) => Some(b), _ => None }
    }
}

/// Options consumed by the decoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    /// CSV field delimiter.
    pub delimiter: u8,
    /// Treat the first CSV row / worksheet row as headers.
    pub has_headers: bool,
    /// Excel worksheet name, first sheet when `None`.
    pub sheet: Option<String>,
    /// Character encoding of text, CSV and JSON objects.
    pub encoding: &'static Encoding,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self { delimiter: DEFAULT_DELIMITER, has_headers: true, sheet: None, encoding: UTF_8 }
    }
}

impl ReadOptions {
    pub fn delimiter(mut self, d: u8) -> Self {
        self.delimiter = d;
        self
    }

    pub fn has_headers(mut self, yes: bool) -> Self {
        self.has_headers = yes;
        self
    }

    pub fn sheet(mut self, name: impl Into<String>) -> Self {
        self.sheet = Some(name.into());
        self
    }

    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Encoding for a WHATWG label such as `utf-8`, `euc-kr` or `cp949`.
pub fn encoding_for_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::InvalidArgument(format!("unknown encoding '{label}'")))
}

/// Options consumed by the encoders and the writers in `api`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    pub compression: Compression,
    pub delimiter: u8,
    /// Excel worksheet name.
    pub sheet: Option<String>,
    /// Indent JSON output.
    pub pretty: bool,
    /// Character encoding of text, CSV and JSON output.
    pub encoding: &'static Encoding,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression: Compression::None,
            delimiter: DEFAULT_DELIMITER,
            sheet: None,
            pretty: false,
            encoding: UTF_8,
        }
    }
}

impl WriteOptions {
    pub fn compression(mut self, c: Compression) -> Self {
        self.compression = c;
        self
    }

    pub fn delimiter(mut self, d: u8) -> Self {
        self.delimiter = d;
        self
    }

    pub fn sheet(mut self, name: impl Into<String>) -> Self {
        self.sheet = Some(name.into());
        self
    }

    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    pub fn encoding(mut self, encoding: &'static Encoding) -> Self {
        self.encoding = encoding;
        self
    }
}

/// Decode uncompressed object bytes. `key` is only used for error context.
pub fn decode(key: &str, format: FileFormat, data: &[u8], opts: &ReadOptions) -> Result<Document> {
    let decoded = match format {
        FileFormat::Csv => csv::decode(data, opts).map(Document::Table),
        FileFormat::Excel => excel::decode(data, opts).map(Document::Table),
        FileFormat::Json => json::decode(data, opts).map(Document::Json),
        FileFormat::Pickle => pickle::decode(data).map(Document::Pickle),
        FileFormat::Text => text::decode(data, opts).map(Document::Text),
        FileFormat::Parquet => parquet::decode(data).map(Document::Parquet),
    };
    decoded.map_err(|e| Error::decode(key, e))
}

/// Encode a document as `format`. The pairing must make sense (a table can be
/// CSV or Excel, text can be written as text only, and so on).
pub fn encode(key: &str, doc: &Document, format: FileFormat, opts: &WriteOptions) -> Result<Vec<u8>> {
    let encoded = match (format, doc) {
        (FileFormat::Csv, Document::Table(t)) => csv::encode(t, opts),
        (FileFormat::Excel, Document::Table(t)) => excel::encode(t, opts),
        (FileFormat::Json, Document::Json(v)) => json::encode(v, opts),
        (FileFormat::Pickle, Document::Pickle(v)) => pickle::encode(v),
        (FileFormat::Text, Document::Text(s)) => text::encode(s, opts),
        (FileFormat::Parquet, Document::Parquet(b)) => parquet::encode(b),
        (format, doc) => {
            return Err(Error::UnsupportedFormat(format!(
                "cannot write a {} document as {format}",
                doc.kind()
            )))
        }
    };
    encoded.map_err(|e| Error::encode(key, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_skips_compression_suffix() {
        assert_eq!(extension("a/b/c.csv"), Some("csv"));
        assert_eq!(extension("a/b/c.csv.gz"), Some("csv"));
        assert_eq!(extension("a/b/c.tar.bz2"), Some("tar"));
        assert_eq!(extension("a.d/file"), None);
        assert_eq!(extension("trailing."), None);
    }

    #[test]
    fn dispatch_table() {
        assert_eq!(FileFormat::from_key("x.csv").unwrap(), FileFormat::Csv);
        assert_eq!(FileFormat::from_key("x.JSON").unwrap(), FileFormat::Json);
        assert_eq!(FileFormat::from_key("x.pkl.bz2").unwrap(), FileFormat::Pickle);
        assert_eq!(FileFormat::from_key("q.sql").unwrap(), FileFormat::Text);
        assert_eq!(FileFormat::from_key("t.parquet").unwrap(), FileFormat::Parquet);
        assert_eq!(FileFormat::from_key("book.xlsx").unwrap(), FileFormat::Excel);
        assert!(matches!(FileFormat::from_key("img.png"), Err(Error::UnsupportedFormat(_))));
        assert!(matches!(FileFormat::from_key("Makefile"), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn override_beats_extension() {
        assert_eq!(FileFormat::resolve("img.png", Some(FileFormat::Text)).unwrap(), FileFormat::Text);
        assert_eq!("excel".parse::<FileFormat>().unwrap(), FileFormat::Excel);
    }

    #[test]
    fn mismatched_document_is_rejected() {
        let doc = Document::Text("hi".into());
        let err = encode("k", &doc, FileFormat::Csv, &WriteOptions::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));
    }

    #[test]
    fn encoding_labels() {
        assert_eq!(encoding_for_label("cp949").unwrap(), encoding_rs::EUC_KR);
        assert_eq!(encoding_for_label(" UTF-8 ").unwrap(), UTF_8);
        assert!(matches!(encoding_for_label("klingon"), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn text_decoding_follows_encoding() {
        let bytes = encode("k", &Document::Text("한글".into()), FileFormat::Text,
            &WriteOptions::default().encoding(encoding_rs::EUC_KR)).unwrap();
        let err = decode("k", FileFormat::Text, &bytes, &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Decode { .. }));
        let doc = decode("k", FileFormat::Text, &bytes,
            &ReadOptions::default().encoding(encoding_rs::EUC_KR)).unwrap();
        assert_eq!(doc.as_text(), Some("한글"));
    }

    #[test]
    fn unmappable_text_is_an_encode_error_with_key() {
        let opts = WriteOptions::default().encoding(encoding_rs::EUC_KR);
        let err = encode("out/crab.txt", &Document::Text("🦀".into()), FileFormat::Text, &opts).unwrap_err();
        assert!(matches!(err, Error::Encode { ref key, .. } if key == "out/crab.txt"));
    }

    #[test]
    fn malformed_content_is_a_decode_error() {
        let err = decode("bad.json", FileFormat::Json, b"{not json", &ReadOptions::default()).unwrap_err();
        assert!(matches!(err, Error::Decode { ref key, .. } if key == "bad.json"));
    }
}
