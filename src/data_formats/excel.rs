// src/data_formats/excel.rs
//
// Excel workbooks <-> Table. Reading accepts xlsx/xls/xlsb/ods through
// calamine; writing always produces xlsx. Every cell is read back as its
// display string.

use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Reader};
use rust_xlsxwriter::Workbook;

use super::{ReadOptions, Table, WriteOptions};
use crate::error::BoxError;

pub fn decode(data: &[u8], opts: &ReadOptions) -> Result<Table, BoxError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))?;
    let range = match &opts.sheet {
        Some(name) => workbook.worksheet_range(name)?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or("workbook has no worksheets")??,
    };

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect::<Vec<_>>());
    let headers = if opts.has_headers {
        rows.next().unwrap_or_default()
    } else {
        Vec::new()
    };
    Ok(Table { headers, rows: rows.collect() })
}

pub fn encode(table: &Table, opts: &WriteOptions) -> Result<Vec<u8>, BoxError> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    if let Some(name) = &opts.sheet {
        sheet.set_name(name)?;
    }

    let body_start = if table.headers.is_empty() { 0 } else { 1 };
    for (col, header) in table.headers.iter().enumerate() {
        sheet.write_string(0, col_index(col)?, header)?;
    }
    for (r, row) in table.rows.iter().enumerate() {
        let r = u32::try_from(r + body_start)?;
        for (col, cell) in row.iter().enumerate() {
            sheet.write_string(r, col_index(col)?, cell)?;
        }
    }
    Ok(workbook.save_to_buffer()?)
}

fn col_index(col: usize) -> Result<u16, BoxError> {
    Ok(u16::try_from(col)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(
            vec!["city".into(), "population".into()],
            vec![
                vec!["Seoul".into(), "9411000".into()],
                vec!["Busan".into(), "3349000".into()],
            ],
        )
    }

    #[test]
    fn workbook_round_trip() {
        let bytes = encode(&table(), &WriteOptions::default()).unwrap();
        assert_eq!(&bytes[..2], b"PK");
        assert_eq!(decode(&bytes, &ReadOptions::default()).unwrap(), table());
    }

    #[test]
    fn named_sheet() {
        let bytes = encode(&table(), &WriteOptions::default().sheet("cities")).unwrap();
        let t = decode(&bytes, &ReadOptions::default().sheet("cities")).unwrap();
        assert_eq!(t.rows.len(), 2);
        assert!(decode(&bytes, &ReadOptions::default().sheet("missing")).is_err());
    }

    #[test]
    fn not_a_workbook() {
        assert!(decode(b"plain text", &ReadOptions::default()).is_err());
    }
}
