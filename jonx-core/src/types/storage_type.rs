//! This module defines the canonical, type-safe representation of the storage
//! types a JONX column can be written as.

use crate::error::JonxError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The physical representation chosen for one column.
///
/// The serialized names (`"int16"`, `"str"`, ...) are part of the on-disk schema
/// block and must not change.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StorageType {
    Bool,
    Int16,
    Int32,
    Float16,
    Float32,
    Str,
    Json,
}

impl StorageType {
    /// Every storage type, in schema-name order of the format description.
    pub const ALL: [StorageType; 7] = [
        Self::Bool,
        Self::Int16,
        Self::Int32,
        Self::Float16,
        Self::Float32,
        Self::Str,
        Self::Json,
    ];

    /// The name written into the schema block.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Str => "str",
            Self::Json => "json",
        }
    }

    /// Returns `true` for the types that get a sort index.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int16 | Self::Int32 | Self::Float16 | Self::Float32
        )
    }

}

impl FromStr for StorageType {
    type Err = JonxError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == name)
            .ok_or_else(|| JonxError::UnsupportedType(name.to_string()))
    }
}

/// Provides the canonical string representation for a `StorageType`.
impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
