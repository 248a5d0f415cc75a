//! Sort indexes for numeric columns.
//!
//! An index is the stable ascending permutation of a column's row positions.
//! It is derived data: the reader never reconstructs rows from it, it only
//! answers order queries such as the minimum without sorting.

use std::cmp::Ordering;

use bitvec::prelude::*;
use serde_json::Value;

use crate::codec::column::ColumnData;
use crate::error::{JonxError, Result};

/// Row positions such that `values[index[0]] <= values[index[1]] <= ...`.
pub type SortIndex = Vec<u32>;

/// Stable argsort. Equal values keep their original row order.
fn stable_argsort<T: PartialOrd>(values: &[T]) -> SortIndex {
    let mut positions: Vec<u32> = (0..values.len() as u32).collect();
    // `sort_by` is stable; JSON numbers are never NaN, so `Equal` is only a tie.
    positions.sort_by(|&a, &b| {
        values[a as usize]
            .partial_cmp(&values[b as usize])
            .unwrap_or(Ordering::Equal)
    });
    positions
}

/// Builds the sort index of a numeric column.
///
/// Returns `None` for `bool`, `str` and `json` columns, and for columns with
/// more rows than a `u32` position can address.
pub fn build_index(column: &ColumnData) -> Option<SortIndex> {
    if column.len() > u32::MAX as usize {
        return None;
    }
    match column {
        ColumnData::Int16(v) => Some(stable_argsort(v)),
        ColumnData::Int32(v) => Some(stable_argsort(v)),
        ColumnData::Float16(v) => Some(stable_argsort(v)),
        ColumnData::Float32(v) => Some(stable_argsort(v)),
        ColumnData::Bool(_) | ColumnData::Str(_) | ColumnData::Json(_) => None,
    }
}

/// Serializes an index into its (uncompressed) block: a JSON array of positions.
pub fn encode_index(index: &[u32]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(index)?)
}

/// Parses an index block.
pub fn decode_index(bytes: &[u8]) -> Result<SortIndex> {
    serde_json::from_slice(bytes).map_err(|e| {
        JonxError::SchemaMismatch(format!("index block is not an array of row positions: {}", e))
    })
}

/// Checks that `index` is a permutation of `0..num_rows`.
pub fn validate_index(index: &[u32], num_rows: usize) -> Result<()> {
    if index.len() != num_rows {
        return Err(JonxError::SchemaMismatch(format!(
            "index holds {} positions for a column of {} rows",
            index.len(),
            num_rows
        )));
    }
    let mut seen = bitvec![0; num_rows];
    for &position in index {
        let position = position as usize;
        if position >= num_rows || seen[position] {
            return Err(JonxError::SchemaMismatch(format!(
                "index position {} is out of range or repeated",
                position
            )));
        }
        seen.set(position, true);
    }
    Ok(())
}

/// The minimum value of a column.
///
/// With an index, this is `column[index[0]]`. Without one it is a linear scan
/// (first minimum wins on ties). Empty columns have no minimum.
pub fn find_min(column: &ColumnData, index: Option<&[u32]>) -> Result<Option<Value>> {
    if let Some(index) = index {
        return match index.first() {
            None => Ok(None),
            Some(&row) => column.value_at(row as usize).map(Some).ok_or_else(|| {
                JonxError::SchemaMismatch(format!(
                    "index points at row {} of a {}-row column",
                    row,
                    column.len()
                ))
            }),
        };
    }

    let row = match column {
        ColumnData::Bool(v) => min_position(v),
        ColumnData::Int16(v) => min_position(v),
        ColumnData::Int32(v) => min_position(v),
        ColumnData::Float16(v) => min_position(v),
        ColumnData::Float32(v) => min_position(v),
        ColumnData::Str(v) => min_position(v),
        ColumnData::Json(_) => {
            return Err(JonxError::UnsupportedType(
                "json columns have no ordering".to_string(),
            ))
        }
    };
    Ok(row.and_then(|r| column.value_at(r)))
}

fn min_position<T: PartialOrd>(values: &[T]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (row, value) in values.iter().enumerate() {
        match best {
            Some(b) if values[b] <= *value => {}
            _ => best = Some(row),
        }
    }
    best
}
