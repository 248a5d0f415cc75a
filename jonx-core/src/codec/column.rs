//! The column codec: the typed `ColumnData` representation and the packing
//! rules that turn it into a column blob and back.
//!
//! | type    | blob                                   |
//! |---------|----------------------------------------|
//! | int16   | i16 little-endian words                |
//! | int32   | i32 little-endian words                |
//! | float16 | IEEE-754 binary16, little-endian       |
//! | float32 | IEEE-754 binary32, little-endian       |
//! | bool    | one byte per value, `1`/`0`            |
//! | str     | the whole column as one JSON array     |
//! | json    | the whole column as one JSON array     |

use std::borrow::Borrow;

use half::f16;
use serde_json::Value;

use crate::error::{JonxError, Result};
use crate::kernels::fixed_width;
use crate::types::StorageType;

/// A column after type detection: one variant per storage type.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Bool(Vec<bool>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Float16(Vec<f16>),
    Float32(Vec<f32>),
    Str(Vec<String>),
    Json(Vec<Value>),
}

impl ColumnData {
    pub fn storage_type(&self) -> StorageType {
        match self {
            ColumnData::Bool(_) => StorageType::Bool,
            ColumnData::Int16(_) => StorageType::Int16,
            ColumnData::Int32(_) => StorageType::Int32,
            ColumnData::Float16(_) => StorageType::Float16,
            ColumnData::Float32(_) => StorageType::Float32,
            ColumnData::Str(_) => StorageType::Str,
            ColumnData::Json(_) => StorageType::Json,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Bool(v) => v.len(),
            ColumnData::Int16(v) => v.len(),
            ColumnData::Int32(v) => v.len(),
            ColumnData::Float16(v) => v.len(),
            ColumnData::Float32(v) => v.len(),
            ColumnData::Str(v) => v.len(),
            ColumnData::Json(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts JSON values into the given storage type, checking every value.
    ///
    /// Fails with `InvalidInput` on the first value that does not fit. Integers
    /// are accepted in float columns; nothing else is coerced.
    pub fn try_from_values<V: Borrow<Value>>(values: &[V], ty: StorageType) -> Result<Self> {
        let mismatch = |row: usize| {
            JonxError::InvalidInput(format!(
                "Value at row {} does not fit storage type {}: {}",
                row,
                ty,
                Borrow::<Value>::borrow(&values[row])
            ))
        };

        let column = match ty {
            StorageType::Bool => {
                ColumnData::Bool(convert_all(values, Value::as_bool).map_err(mismatch)?)
            }
            StorageType::Int16 => {
                ColumnData::Int16(convert_all(values, as_narrow_int::<i16>).map_err(mismatch)?)
            }
            StorageType::Int32 => {
                ColumnData::Int32(convert_all(values, as_narrow_int::<i32>).map_err(mismatch)?)
            }
            StorageType::Float16 => {
                ColumnData::Float16(convert_all(values, as_float16).map_err(mismatch)?)
            }
            StorageType::Float32 => {
                ColumnData::Float32(convert_all(values, as_finite_f32).map_err(mismatch)?)
            }
            StorageType::Str => ColumnData::Str(
                convert_all(values, |v| v.as_str().map(str::to_owned)).map_err(mismatch)?,
            ),
            StorageType::Json => {
                let cloned = values.iter().map(|v| Borrow::<Value>::borrow(v).clone());
                ColumnData::Json(cloned.collect())
            }
        };
        Ok(column)
    }

    /// Packs the column into its blob.
    pub fn pack(&self) -> Result<Vec<u8>> {
        match self {
            ColumnData::Bool(v) => Ok(v.iter().map(|&b| b as u8).collect()),
            ColumnData::Int16(v) => Ok(fixed_width::encode(v)),
            ColumnData::Int32(v) => Ok(fixed_width::encode(v)),
            ColumnData::Float16(v) => fixed_width::encode_bitcast::<f16, u16>(v),
            ColumnData::Float32(v) => fixed_width::encode_bitcast::<f32, u32>(v),
            ColumnData::Str(v) => Ok(serde_json::to_vec(v)?),
            ColumnData::Json(v) => Ok(serde_json::to_vec(v)?),
        }
    }

    /// Unpacks a blob. The row count is whatever the blob holds.
    pub fn unpack(bytes: &[u8], ty: StorageType) -> Result<Self> {
        let column = match ty {
            StorageType::Bool => ColumnData::Bool(bytes.iter().map(|&b| b != 0).collect()),
            StorageType::Int16 => ColumnData::Int16(fixed_width::decode::<i16>(bytes)?),
            StorageType::Int32 => ColumnData::Int32(fixed_width::decode::<i32>(bytes)?),
            StorageType::Float16 => {
                ColumnData::Float16(fixed_width::decode_bitcast::<u16, f16>(bytes)?)
            }
            StorageType::Float32 => {
                ColumnData::Float32(fixed_width::decode_bitcast::<u32, f32>(bytes)?)
            }
            StorageType::Str => {
                let strings: Vec<String> = serde_json::from_slice(bytes).map_err(|e| {
                    JonxError::SchemaMismatch(format!(
                        "str column is not an array of strings: {}",
                        e
                    ))
                })?;
                ColumnData::Str(strings)
            }
            StorageType::Json => {
                let values: Vec<Value> = serde_json::from_slice(bytes).map_err(|e| {
                    JonxError::SchemaMismatch(format!("json column is not an array: {}", e))
                })?;
                ColumnData::Json(values)
            }
        };
        Ok(column)
    }

    /// The value at `row` as JSON. float16 is widened through float32.
    pub fn value_at(&self, row: usize) -> Option<Value> {
        match self {
            ColumnData::Bool(v) => v.get(row).map(|&b| Value::Bool(b)),
            ColumnData::Int16(v) => v.get(row).map(|&i| Value::from(i)),
            ColumnData::Int32(v) => v.get(row).map(|&i| Value::from(i)),
            ColumnData::Float16(v) => v.get(row).map(|&f| Value::from(f64::from(f.to_f32()))),
            ColumnData::Float32(v) => v.get(row).map(|&f| Value::from(f64::from(f))),
            ColumnData::Str(v) => v.get(row).map(|s| Value::String(s.clone())),
            ColumnData::Json(v) => v.get(row).cloned(),
        }
    }

    /// Converts the whole column to JSON values, in row order.
    pub fn into_values(self) -> Vec<Value> {
        match self {
            ColumnData::Bool(v) => v.into_iter().map(Value::Bool).collect(),
            ColumnData::Int16(v) => v.into_iter().map(Value::from).collect(),
            ColumnData::Int32(v) => v.into_iter().map(Value::from).collect(),
            ColumnData::Float16(v) => v
                .into_iter()
                .map(|f| Value::from(f64::from(f.to_f32())))
                .collect(),
            ColumnData::Float32(v) => v.into_iter().map(|f| Value::from(f64::from(f))).collect(),
            ColumnData::Str(v) => v.into_iter().map(Value::String).collect(),
            ColumnData::Json(v) => v,
        }
    }
}

//==================================================================================
// Value conversions (shared with the detector)
//==================================================================================

/// Applies `convert` to every value; on failure returns the first failing row.
pub(crate) fn convert_all<V, T, F>(values: &[V], convert: F) -> std::result::Result<Vec<T>, usize>
where
    V: Borrow<Value>,
    F: Fn(&Value) -> Option<T>,
{
    values
        .iter()
        .enumerate()
        .map(|(row, v)| convert(Borrow::<Value>::borrow(v)).ok_or(row))
        .collect()
}

/// An integer value that fits `T` without loss. Floats never qualify.
pub(crate) fn as_narrow_int<T: num_traits::NumCast>(value: &Value) -> Option<T> {
    value.as_i64().and_then(<T as num_traits::NumCast>::from)
}

/// Largest finite binary16 magnitude.
pub const FLOAT16_MAX: f64 = 65504.0;

/// `round(v, 3) == v`.
fn has_at_most_3_decimals(v: f64) -> bool {
    (v * 1000.0).round() / 1000.0 == v
}

/// A number in the binary16 range with at most three decimals, rounded to the
/// nearest binary16 value.
pub(crate) fn as_float16(value: &Value) -> Option<f16> {
    let v = value.as_f64()?;
    let in_range = (-FLOAT16_MAX..=FLOAT16_MAX).contains(&v);
    (in_range && has_at_most_3_decimals(v)).then(|| f16::from_f64(v))
}

/// A number inside the binary32 range.
pub(crate) fn as_finite_f32(value: &Value) -> Option<f32> {
    let v = value.as_f64()?;
    let narrowed = v as f32;
    narrowed.is_finite().then_some(narrowed)
}

//==================================================================================
// Public codec API
//==================================================================================

/// Packs `values` as `ty`. Every value must fit the type.
pub fn pack<V: Borrow<Value>>(values: &[V], ty: StorageType) -> Result<Vec<u8>> {
    ColumnData::try_from_values(values, ty)?.pack()
}

/// Unpacks a blob of `ty` that must hold exactly `count` rows.
pub fn unpack(bytes: &[u8], ty: StorageType, count: usize) -> Result<Vec<Value>> {
    Ok(unpack_column(bytes, ty, count)?.into_values())
}

/// Like `unpack`, but keeps the typed representation.
pub fn unpack_column(bytes: &[u8], ty: StorageType, count: usize) -> Result<ColumnData> {
    let column = ColumnData::unpack(bytes, ty)?;
    if column.len() != count {
        return Err(JonxError::SchemaMismatch(format!(
            "{} column holds {} rows, expected {}",
            ty,
            column.len(),
            count
        )));
    }
    Ok(column)
}
