//! This module defines the core, strongly-typed data representations used
//! throughout the codec.
//!
//! It includes the canonical `StorageType` enum, which replaces the string type
//! names stored in the container schema with a safe, serializable enum, and the
//! `Record` alias for one input row.

pub mod storage_type;

pub use storage_type::StorageType;

/// One input row: an ordered mapping from field name to a JSON value.
///
/// Key order is preserved, so the first record's order defines the schema.
pub type Record = serde_json::Map<String, serde_json::Value>;
