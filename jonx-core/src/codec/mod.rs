//! The per-column codec: type detection, packing/unpacking and sort indexes.
//!
//! Encode order for one column is `detector` -> `column` (pack) -> `index`.
//! Decode runs `column` (unpack) alone; indexes are only read for order queries.

pub mod column;
pub mod detector;
pub mod index;

pub use column::{pack, unpack, unpack_column, ColumnData};
pub use detector::{detect_column, detect_type};
pub use index::{build_index, find_min, SortIndex};
