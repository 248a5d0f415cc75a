// In: src/bridge/stateless_api.rs

use log::info;
use serde_json::Value;

use crate::bridge::compressor::build_container_parts;
use crate::bridge::decompressor::decode_document;
use crate::bridge::format::{DecodedDocument, PreviewReport};
use crate::config::JonxConfig;
use crate::container::format::FILE_FORMAT_VERSION;
use crate::container::reader::JonxFile;
use crate::container::writer::to_bytes;
use crate::error::{JonxError, Result};
use crate::types::Record;

/// Encodes a non-empty, uniformly keyed record sequence with the default
/// configuration.
pub fn encode(records: &[Record]) -> Result<Vec<u8>> {
    encode_with_config(records, &JonxConfig::default())
}

/// Encodes a record sequence into a JONX container.
pub fn encode_with_config(records: &[Record], config: &JonxConfig) -> Result<Vec<u8>> {
    let parts = build_container_parts(records, config)?;
    let bytes = to_bytes(&parts)?;
    info!("Wrote {} byte container", bytes.len());
    Ok(bytes)
}

/// Decodes a container into its schema and records.
///
/// No partial output is produced: any structural, compression or row-count
/// problem fails the whole call.
pub fn decode(bytes: &[u8]) -> Result<DecodedDocument> {
    let file = JonxFile::from_bytes(bytes.to_vec())?;
    decode_document(&file)
}

/// Reports the schema and exact container size `encode` would produce.
pub fn preview(records: &[Record]) -> Result<PreviewReport> {
    preview_with_config(records, &JonxConfig::default())
}

/// Like `preview`, under an explicit configuration.
pub fn preview_with_config(records: &[Record], config: &JonxConfig) -> Result<PreviewReport> {
    let parts = build_container_parts(records, config)?;
    Ok(PreviewReport {
        version: FILE_FORMAT_VERSION,
        estimated_size_bytes: parts.serialized_len(),
        num_rows: records.len(),
        fields: parts.schema.fields,
        types: parts.schema.types,
    })
}

/// Parses a JSON document whose top level is a non-empty array of objects.
pub fn records_from_json_slice(bytes: &[u8]) -> Result<Vec<Record>> {
    let items = match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(items) => items,
        other => {
            return Err(JonxError::InvalidInput(format!(
                "expected an array of records, found {}",
                json_kind(&other)
            )))
        }
    };
    if items.is_empty() {
        return Err(JonxError::InvalidInput(
            "cannot encode an empty record sequence".to_string(),
        ));
    }
    items
        .into_iter()
        .enumerate()
        .map(|(row, item)| match item {
            Value::Object(record) => Ok(record),
            other => Err(JonxError::InvalidInput(format!(
                "element {} is {}, not a record",
                row,
                json_kind(&other)
            ))),
        })
        .collect()
}

/// Parses a JSON document and encodes it.
pub fn encode_json_slice(bytes: &[u8], config: &JonxConfig) -> Result<Vec<u8>> {
    encode_with_config(&records_from_json_slice(bytes)?, config)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_from_json_slice_accepts_array_of_objects() {
        let records = records_from_json_slice(br#"[{"a": 1}, {"a": 2}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["a"], Value::from(2));
    }

    #[test]
    fn test_records_from_json_slice_rejects_other_shapes() {
        assert!(matches!(
            records_from_json_slice(br#"{"a": 1}"#),
            Err(JonxError::InvalidInput(msg)) if msg.contains("an object")
        ));
        assert!(matches!(
            records_from_json_slice(b"[]"),
            Err(JonxError::InvalidInput(_))
        ));
        assert!(matches!(
            records_from_json_slice(br#"[{"a": 1}, 3]"#),
            Err(JonxError::InvalidInput(msg)) if msg.contains("element 1")
        ));
        assert!(matches!(
            records_from_json_slice(b"[{"),
            Err(JonxError::SerdeJson(_))
        ));
    }

    #[test]
    fn test_encode_json_slice_decodes_back() {
        let bytes = encode_json_slice(br#"[{"x": true}]"#, &JonxConfig::default()).unwrap();
        let document = decode(&bytes).unwrap();
        assert_eq!(document.num_rows, 1);
        assert_eq!(document.records[0]["x"], Value::Bool(true));
    }
}
