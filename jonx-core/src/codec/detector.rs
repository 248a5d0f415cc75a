//! Storage type detection.
//!
//! The first value picks the family (bool, integer, float, string, anything
//! else). The whole column then decides the width, and every value is checked
//! against the chosen packer while it is converted into `ColumnData`. A column
//! whose later values do not fit the first value's family is stored as `json`
//! instead of being mis-packed.

use std::borrow::Borrow;

use log::{debug, warn};
use serde_json::Value;

use crate::codec::column::{as_finite_f32, as_float16, as_narrow_int, convert_all, ColumnData};
use crate::error::{JonxError, Result};
use crate::types::StorageType;

pub use crate::codec::column::FLOAT16_MAX;

/// The family the first value of a column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Bool,
    Integer,
    Float,
    Str,
    Other,
}

fn family_of(value: &Value) -> Family {
    match value {
        Value::Bool(_) => Family::Bool,
        Value::Number(n) if n.is_f64() => Family::Float,
        Value::Number(_) => Family::Integer,
        Value::String(_) => Family::Str,
        _ => Family::Other,
    }
}

/// Detects the storage type of a column and converts it in one pass.
pub fn detect_column<V: Borrow<Value>>(values: &[V]) -> Result<ColumnData> {
    let first = values.first().ok_or_else(|| {
        JonxError::InvalidInput("Cannot detect the type of an empty column".to_string())
    })?;
    let family = family_of(Borrow::<Value>::borrow(first));

    let detected = match family {
        Family::Bool => convert_all(values, Value::as_bool).ok().map(ColumnData::Bool),
        Family::Integer => detect_integer(values),
        Family::Float => detect_float(values),
        Family::Str => convert_all(values, |v| v.as_str().map(str::to_owned))
            .ok()
            .map(ColumnData::Str),
        Family::Other => None,
    };

    let column = match detected {
        Some(column) => column,
        None => {
            if family != Family::Other {
                warn!(
                    "Column starting with {:?} holds values of another kind; storing as json",
                    family
                );
            }
            ColumnData::try_from_values(values, StorageType::Json)?
        }
    };
    debug!(
        "Detected {} for a column of {} values",
        column.storage_type(),
        column.len()
    );
    Ok(column)
}

/// Detects the storage type of a column.
///
/// This is a pure function of the values: the same column always yields the
/// same type.
pub fn detect_type<V: Borrow<Value>>(values: &[V]) -> Result<StorageType> {
    Ok(detect_column(values)?.storage_type())
}

fn detect_integer<V: Borrow<Value>>(values: &[V]) -> Option<ColumnData> {
    if let Ok(narrow) = convert_all(values, as_narrow_int::<i16>) {
        return Some(ColumnData::Int16(narrow));
    }
    convert_all(values, as_narrow_int::<i32>)
        .ok()
        .map(ColumnData::Int32)
}

fn detect_float<V: Borrow<Value>>(values: &[V]) -> Option<ColumnData> {
    if let Ok(half) = convert_all(values, as_float16) {
        return Some(ColumnData::Float16(half));
    }
    convert_all(values, as_finite_f32)
        .ok()
        .map(ColumnData::Float32)
}
