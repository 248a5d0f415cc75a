// In: src/container/format.rs

//! Defines all on-disk structures and constants for the JONX container.
//!
//! ```text
//! bytes 0..4    magic = "JONX"
//! bytes 4..8    version (u32 LE)
//! u32           schema_block_len
//! bytes         schema_block       zstd(JSON {"fields": [...], "types": {...}})
//! per field, in schema order:
//!   u32         column_block_len
//!   bytes       column_block       zstd(packed column)
//! u32           num_indexes
//! per index:
//!   u32         name_len
//!   bytes       name (utf-8)
//!   u32         index_block_len
//!   bytes       index_block        zstd(JSON array of row positions)
//! ```
//!
//! Every integer is an unsigned 32-bit little-endian value.

use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{JonxError, Result};
use crate::types::StorageType;

//==================================================================================
// I. Format Constants
//==================================================================================

/// The magic tag at the start of every container.
pub const FILE_MAGIC: &[u8; 4] = b"JONX";
/// The current (and only) version of the container format.
pub const FILE_FORMAT_VERSION: u32 = 1;
/// Magic plus version.
pub const HEADER_SIZE: usize = 8;
/// Width of every length prefix and count.
pub const LEN_PREFIX_SIZE: usize = 4;

//==================================================================================
// II. Schema
//==================================================================================

/// The ordered field list and the storage type of each field.
///
/// Field order is authoritative for both column blocks and reconstructed rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub fields: Vec<String>,
    pub types: BTreeMap<String, StorageType>,
}

/// The schema block exactly as it is stored, before type names are checked.
#[derive(Deserialize)]
struct RawSchema {
    fields: Vec<String>,
    types: BTreeMap<String, String>,
}

impl Schema {
    /// Builds a schema from `(field, type)` pairs in column order.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, StorageType)>,
        S: Into<String>,
    {
        let mut fields = Vec::new();
        let mut types = BTreeMap::new();
        for (name, ty) in columns {
            let name = name.into();
            types.insert(name.clone(), ty);
            fields.push(name);
        }
        Self { fields, types }
    }

    pub fn num_fields(&self) -> usize {
        self.fields.len()
    }

    /// The storage type of `field`, if it is part of the schema.
    pub fn storage_type(&self, field: &str) -> Option<StorageType> {
        self.types.get(field).copied()
    }

    /// Schema position of `field`.
    pub fn position(&self, field: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == field)
    }

    /// `(field, type)` pairs in schema order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, StorageType)> + '_ {
        self.fields
            .iter()
            .filter_map(move |f| self.types.get(f).map(|ty| (f.as_str(), *ty)))
    }

    /// Serializes the schema block. `types` keeps the field order.
    pub fn to_block(&self) -> Result<Vec<u8>> {
        let mut types = Map::with_capacity(self.fields.len());
        for (name, ty) in self.columns() {
            types.insert(name.to_string(), Value::String(ty.as_str().to_string()));
        }
        let mut block = Map::with_capacity(2);
        block.insert("fields".to_string(), Value::from(self.fields.clone()));
        block.insert("types".to_string(), Value::Object(types));
        Ok(serde_json::to_vec(&Value::Object(block))?)
    }

    /// Parses and validates a (decompressed) schema block.
    pub fn from_block(bytes: &[u8]) -> Result<Self> {
        let raw: RawSchema = serde_json::from_slice(bytes)
            .map_err(|e| JonxError::Format(format!("schema block is malformed: {}", e)))?;

        let mut seen = HashSet::with_capacity(raw.fields.len());
        let mut types = BTreeMap::new();
        for field in &raw.fields {
            if !seen.insert(field.as_str()) {
                return Err(JonxError::Format(format!(
                    "schema lists field '{}' twice",
                    field
                )));
            }
            let name = raw.types.get(field).ok_or_else(|| {
                JonxError::Format(format!("schema has no type for field '{}'", field))
            })?;
            types.insert(field.clone(), name.parse::<StorageType>()?);
        }
        Ok(Self {
            fields: raw.fields,
            types,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_schema() -> Schema {
        Schema::from_columns([("id", StorageType::Int16), ("price", StorageType::Float16)])
    }

    #[test]
    fn test_schema_block_keeps_field_order() {
        let schema = Schema::from_columns([("z", StorageType::Str), ("a", StorageType::Bool)]);
        let block = schema.to_block().unwrap();
        assert_eq!(
            String::from_utf8(block).unwrap(),
            r#"{"fields":["z","a"],"types":{"z":"str","a":"bool"}}"#
        );
    }

    #[test]
    fn test_schema_block_roundtrip() {
        let schema = sample_schema();
        let parsed = Schema::from_block(&schema.to_block().unwrap()).unwrap();
        assert_eq!(parsed, schema);
        assert_eq!(parsed.position("price"), Some(1));
        assert_eq!(parsed.storage_type("id"), Some(StorageType::Int16));
    }

    #[test]
    fn test_unknown_type_name_is_unsupported() {
        let block = br#"{"fields":["a"],"types":{"a":"int64"}}"#;
        assert!(matches!(
            Schema::from_block(block),
            Err(JonxError::UnsupportedType(name)) if name == "int64"
        ));
    }

    #[test]
    fn test_structural_problems_are_format_errors() {
        let missing = br#"{"fields":["a","b"],"types":{"a":"bool"}}"#;
        assert!(matches!(Schema::from_block(missing), Err(JonxError::Format(_))));

        let duplicate = br#"{"fields":["a","a"],"types":{"a":"bool"}}"#;
        assert!(matches!(Schema::from_block(duplicate), Err(JonxError::Format(_))));

        assert!(matches!(Schema::from_block(b"[]"), Err(JonxError::Format(_))));
    }
}
