// src/data_formats/parquet.rs
//
// Parquet <-> Arrow record batches, fully in memory.

use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;

use crate::error::BoxError;

pub fn decode(data: &[u8]) -> Result<Vec<RecordBatch>, BoxError> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(Bytes::copy_from_slice(data))?.build()?;
    Ok(reader.collect::<Result<Vec<_>, ArrowError>>()?)
}

/// All batches must share the schema of the first one.
pub fn encode(batches: &[RecordBatch]) -> Result<Vec<u8>, BoxError> {
    let schema = batches
        .first()
        .map(|b| b.schema())
        .ok_or("cannot write parquet without at least one record batch")?;

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, schema, None)?;
    for batch in batches {
        writer.write(batch)?;
    }
    writer.close()?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Int64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use std::sync::Arc;

    fn sample() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int64, false),
            Field::new("name", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int64Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec![Some("a"), None, Some("c")])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn batches_round_trip() {
        let batch = sample();
        let bytes = encode(std::slice::from_ref(&batch)).unwrap();
        assert_eq!(&bytes[..4], b"PAR1");

        let read = decode(&bytes).unwrap();
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].num_rows(), 3);
        assert_eq!(read[0].schema().fields(), batch.schema().fields());
        assert_eq!(read[0].columns(), batch.columns());
    }

    #[test]
    fn empty_batch_list_is_an_error() {
        assert!(encode(&[]).is_err());
    }

    #[test]
    fn not_parquet() {
        assert!(decode(b"id,name\n1,a\n").is_err());
    }
}
