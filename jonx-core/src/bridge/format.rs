// In: src/bridge/format.rs

//! The public result shapes returned by the stateless API.
//!
//! Both derive `Serialize` so a front end can hand them straight to a JSON
//! response without an intermediate model.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::types::{Record, StorageType};

/// A fully reconstructed container.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DecodedDocument {
    pub version: u32,
    /// Field order as stored in the schema.
    pub fields: Vec<String>,
    pub types: BTreeMap<String, StorageType>,
    pub num_rows: usize,
    /// One record per row, keys in `fields` order.
    pub records: Vec<Record>,
}

/// What `encode` would produce, without the container bytes.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PreviewReport {
    pub version: u32,
    pub fields: Vec<String>,
    pub types: BTreeMap<String, StorageType>,
    pub num_rows: usize,
    /// Exactly `encode(records).len()` under the same configuration.
    pub estimated_size_bytes: usize,
}
