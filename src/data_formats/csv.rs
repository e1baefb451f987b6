// src/data_formats/csv.rs
//
// Delimited text <-> Table. Rows may be ragged; every field stays a string.

use super::text::{from_utf8, to_utf8};
use super::{ReadOptions, Table, WriteOptions};
use crate::error::BoxError;

pub fn decode(data: &[u8], opts: &ReadOptions) -> Result<Table, BoxError> {
    let text = to_utf8(data, opts.encoding)?;
    let mut rdr = ::csv::ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .has_headers(opts.has_headers)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = if opts.has_headers {
        rdr.headers()?.iter().map(str::to_string).collect()
    } else {
        Vec::new()
    };

    let mut rows = Vec::new();
    for record in rdr.records() {
        rows.push(record?.iter().map(str::to_string).collect());
    }
    Ok(Table { headers, rows })
}

pub fn encode(table: &Table, opts: &WriteOptions) -> Result<Vec<u8>, BoxError> {
    let mut wtr = ::csv::WriterBuilder::new()
        .delimiter(opts.delimiter)
        .flexible(true)
        .from_writer(Vec::new());

    if !table.headers.is_empty() {
        wtr.write_record(&table.headers)?;
    }
    for row in &table.rows {
        wtr.write_record(row)?;
    }
    let buf = wtr.into_inner().map_err(|e| e.into_error())?;
    from_utf8(std::str::from_utf8(&buf)?, opts.encoding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_and_rows() {
        let t = decode(b"id,name\n1,kim\n2,lee\n", &ReadOptions::default()).unwrap();
        assert_eq!(t.headers, vec!["id", "name"]);
        assert_eq!(t.rows, vec![vec!["1", "kim"], vec!["2", "lee"]]);
        assert_eq!(t.column("name"), Some(1));
    }

    #[test]
    fn custom_delimiter_without_header() {
        let opts = ReadOptions::default().delimiter(b'\t').has_headers(false);
        let t = decode(b"a\tb\nc\td\n", &opts).unwrap();
        assert!(t.headers.is_empty());
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[1], vec!["c", "d"]);
    }

    #[test]
    fn quoted_fields_survive_encoding() {
        let t = Table::new(
            vec!["k".into(), "v".into()],
            vec![vec!["1".into(), "hello, \"world\"".into()]],
        );
        let bytes = encode(&t, &WriteOptions::default()).unwrap();
        assert_eq!(decode(&bytes, &ReadOptions::default()).unwrap(), t);
    }

    #[test]
    fn cp949_round_trip() {
        let t = Table::new(
            vec!["이름".into(), "도시".into()],
            vec![vec!["김철수".into(), "서울".into()]],
        );
        let enc = encoding_rs::EUC_KR;
        let bytes = encode(&t, &WriteOptions::default().encoding(enc)).unwrap();
        assert!(std::str::from_utf8(&bytes).is_err());
        assert_eq!(decode(&bytes, &ReadOptions::default().encoding(enc)).unwrap(), t);
        assert!(decode(&bytes, &ReadOptions::default()).is_err());
    }

    #[test]
    fn empty_input_is_empty_table() {
        let t = decode(b"", &ReadOptions::default()).unwrap();
        assert!(t.headers.is_empty());
        assert!(t.is_empty());
    }
}
