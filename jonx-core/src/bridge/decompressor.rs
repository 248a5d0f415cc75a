// In: src/bridge/decompressor.rs

//! Eager reconstruction of a whole container into records.

use log::debug;

use crate::bridge::format::DecodedDocument;
use crate::container::reader::JonxFile;
use crate::error::{JonxError, Result};
use crate::types::Record;

/// Decompresses every column and rebuilds one record per row, keys in schema
/// order.
pub(crate) fn decode_document(file: &JonxFile) -> Result<DecodedDocument> {
    let (num_rows, columns) = file.read_columns()?;
    let fields = file.fields();

    let mut columns: Vec<_> = columns
        .into_iter()
        .map(|column| column.into_values().into_iter())
        .collect();

    let mut records = Vec::with_capacity(num_rows);
    for row in 0..num_rows {
        let mut record = Record::with_capacity(fields.len());
        for (field, values) in fields.iter().zip(columns.iter_mut()) {
            let value = values.next().ok_or_else(|| {
                JonxError::SchemaMismatch(format!("column '{}' ends before row {}", field, row))
            })?;
            record.insert(field.clone(), value);
        }
        records.push(record);
    }
    debug!("Rebuilt {} records from {} columns", num_rows, fields.len());

    Ok(DecodedDocument {
        version: file.version(),
        fields: fields.to_vec(),
        types: file.schema().types.clone(),
        num_rows,
        records,
    })
}
