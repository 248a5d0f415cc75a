// In: src/bridge/compressor.rs

//! Turns a record sequence into `ContainerParts`.
//!
//! Records are transposed into borrowed columns, then every column runs
//! detect -> pack -> compress (and index -> compress for numeric types). The
//! column phase is independent per column and can run on the rayon pool.

use log::{debug, info};
use rayon::prelude::*;
use serde_json::Value;

use crate::codec::detector::detect_column;
use crate::codec::index::{build_index, encode_index};
use crate::config::JonxConfig;
use crate::container::format::Schema;
use crate::container::writer::ContainerParts;
use crate::error::{JonxError, Result};
use crate::kernels::ZstdCodec;
use crate::types::{Record, StorageType};

/// The compressed output of one column.
#[derive(Debug)]
struct EncodedColumn {
    storage_type: StorageType,
    block: Vec<u8>,
    index_block: Option<Vec<u8>>,
}

/// Checks that `records` is non-empty and uniformly keyed, then transposes it
/// into one borrowed column per field of the first record.
fn collect_columns(records: &[Record]) -> Result<(Vec<&str>, Vec<Vec<&Value>>)> {
    let first = records.first().ok_or_else(|| {
        JonxError::InvalidInput("cannot encode an empty record sequence".to_string())
    })?;
    if first.is_empty() {
        return Err(JonxError::InvalidInput(
            "records must have at least one field".to_string(),
        ));
    }

    let fields: Vec<&str> = first.keys().map(String::as_str).collect();
    let mut columns: Vec<Vec<&Value>> = vec![Vec::with_capacity(records.len()); fields.len()];

    for (row, record) in records.iter().enumerate() {
        if record.len() != fields.len() {
            return Err(JonxError::InvalidInput(format!(
                "record {} has {} fields, expected {}",
                row,
                record.len(),
                fields.len()
            )));
        }
        for (field, column) in fields.iter().zip(columns.iter_mut()) {
            let value = record.get(*field).ok_or_else(|| {
                JonxError::InvalidInput(format!("record {} is missing field '{}'", row, field))
            })?;
            column.push(value);
        }
    }
    Ok((fields, columns))
}

fn encode_column(
    name: &str,
    values: &[&Value],
    codec: ZstdCodec,
    build_indexes: bool,
) -> Result<EncodedColumn> {
    let column = detect_column(values)?;
    let packed = column.pack()?;
    let block = codec.compress(&packed)?;

    let index_block = if build_indexes {
        build_index(&column)
            .map(|index| codec.compress(&encode_index(&index)?))
            .transpose()?
    } else {
        None
    };

    debug!(
        "Column '{}': {} rows as {}, {} -> {} bytes{}",
        name,
        column.len(),
        column.storage_type(),
        packed.len(),
        block.len(),
        if index_block.is_some() { ", indexed" } else { "" }
    );
    Ok(EncodedColumn {
        storage_type: column.storage_type(),
        block,
        index_block,
    })
}

/// Runs detection, packing, indexing and compression for every column.
pub(crate) fn build_container_parts(
    records: &[Record],
    config: &JonxConfig,
) -> Result<ContainerParts> {
    config.validate()?;
    let codec = ZstdCodec::new(config.zstd_level());
    let (fields, columns) = collect_columns(records)?;

    let encoded: Vec<EncodedColumn> = if config.parallel_columns {
        fields
            .par_iter()
            .zip(columns.par_iter())
            .map(|(name, values)| encode_column(name, values, codec, config.build_indexes))
            .collect::<Result<Vec<_>>>()?
    } else {
        fields
            .iter()
            .zip(columns.iter())
            .map(|(name, values)| encode_column(name, values, codec, config.build_indexes))
            .collect::<Result<Vec<_>>>()?
    };

    let schema = Schema::from_columns(
        fields
            .iter()
            .zip(&encoded)
            .map(|(name, column)| (*name, column.storage_type)),
    );
    let schema_block = codec.compress(&schema.to_block()?)?;

    let mut column_blocks = Vec::with_capacity(encoded.len());
    let mut index_blocks = Vec::new();
    for (name, column) in fields.iter().zip(encoded) {
        column_blocks.push(column.block);
        if let Some(block) = column.index_block {
            index_blocks.push((name.to_string(), block));
        }
    }

    info!(
        "Encoded {} records: {} columns, {} indexes, zstd level {}",
        records.len(),
        column_blocks.len(),
        index_blocks.len(),
        codec.level()
    );
    Ok(ContainerParts {
        schema,
        schema_block,
        column_blocks,
        index_blocks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_columns_follow_first_record_key_order() {
        let records = vec![
            record(json!({"b": 1, "a": "x"})),
            record(json!({"a": "y", "b": 2})),
        ];
        let (fields, columns) = collect_columns(&records).unwrap();
        assert_eq!(fields, vec!["b", "a"]);
        assert_eq!(columns[0], vec![&json!(1), &json!(2)]);
        assert_eq!(columns[1], vec![&json!("x"), &json!("y")]);
    }

    #[test]
    fn test_non_uniform_keys_are_rejected() {
        let extra = vec![record(json!({"a": 1})), record(json!({"a": 2, "b": 3}))];
        assert!(matches!(
            collect_columns(&extra),
            Err(JonxError::InvalidInput(msg)) if msg.contains("record 1")
        ));

        let renamed = vec![record(json!({"a": 1})), record(json!({"c": 2}))];
        assert!(matches!(
            collect_columns(&renamed),
            Err(JonxError::InvalidInput(msg)) if msg.contains("'a'")
        ));
    }

    #[test]
    fn test_records_without_fields_are_rejected() {
        assert!(matches!(
            collect_columns(&[Record::new()]),
            Err(JonxError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_disabling_indexes_leaves_the_table_empty() {
        let records = vec![record(json!({"n": 5})), record(json!({"n": 1}))];
        let config = JonxConfig {
            build_indexes: false,
            ..JonxConfig::default()
        };
        let parts = build_container_parts(&records, &config).unwrap();
        assert!(parts.index_blocks.is_empty());
        assert_eq!(parts.schema.storage_type("n"), Some(StorageType::Int16));
    }

    #[test]
    fn test_invalid_level_is_rejected_before_encoding() {
        let records = vec![record(json!({"n": 5}))];
        let config = JonxConfig::default().with_compression_level(1000);
        assert!(matches!(
            build_container_parts(&records, &config),
            Err(JonxError::InvalidInput(_))
        ));
    }
}
