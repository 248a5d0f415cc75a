// In: src/container/reader.rs

//! Parsing of JONX containers and lazy, per-column access.
//!
//! `ContainerParser` walks the buffer once with a `ByteCursor`, moving through
//! `Unopened -> HeaderParsed -> SchemaParsed -> ColumnsIndexed -> Ready`. Only
//! the schema block is decompressed while parsing; column and index blocks are
//! recorded as byte ranges. A failure at any step moves the parser to `Failed`
//! and it refuses further steps.
//!
//! `JonxFile` owns the buffer and the parsed layout. Columns and indexes are
//! decompressed on every request and never cached.

use std::ops::Range;
use std::path::Path;

use hashbrown::HashMap;
use log::{debug, info};
use serde_json::Value;

use crate::codec::column::{unpack_column, ColumnData};
use crate::codec::index::{self, SortIndex};
use crate::container::cursor::ByteCursor;
use crate::container::format::{Schema, FILE_FORMAT_VERSION, FILE_MAGIC, LEN_PREFIX_SIZE};
use crate::error::{JonxError, Result};
use crate::kernels::zstd;
use crate::types::StorageType;

//==================================================================================
// I. Parser State Machine
//==================================================================================

/// The parse progress of a container buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Unopened,
    HeaderParsed,
    SchemaParsed,
    ColumnsIndexed,
    Ready,
    /// Terminal: a step failed and the parser cannot be reused.
    Failed,
}

/// The layout of a fully parsed container.
#[derive(Debug, Clone)]
struct ParsedLayout {
    version: u32,
    schema: Schema,
    columns: Vec<Range<usize>>,
    indexes: Vec<(String, Range<usize>)>,
}

pub struct ContainerParser<'a> {
    cursor: ByteCursor<'a>,
    state: ReaderState,
    version: u32,
    schema: Option<Schema>,
    columns: Vec<Range<usize>>,
    indexes: Vec<(String, Range<usize>)>,
}

impl<'a> ContainerParser<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            cursor: ByteCursor::new(buf),
            state: ReaderState::Unopened,
            version: 0,
            schema: None,
            columns: Vec::new(),
            indexes: Vec::new(),
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Performs the next transition and returns the new state.
    pub fn step(&mut self) -> Result<ReaderState> {
        let result = match self.state {
            ReaderState::Unopened => self.parse_header().map(|_| ReaderState::HeaderParsed),
            ReaderState::HeaderParsed => self.parse_schema().map(|_| ReaderState::SchemaParsed),
            ReaderState::SchemaParsed => self.index_columns().map(|_| ReaderState::ColumnsIndexed),
            ReaderState::ColumnsIndexed => self.parse_indexes().map(|_| ReaderState::Ready),
            ReaderState::Ready => Ok(ReaderState::Ready),
            ReaderState::Failed => {
                return Err(JonxError::Format(
                    "parser failed earlier and cannot be reused".to_string(),
                ))
            }
        };
        match result {
            Ok(next) => {
                self.state = next;
                Ok(next)
            }
            Err(e) => {
                self.state = ReaderState::Failed;
                Err(e)
            }
        }
    }

    /// Steps until `Ready`.
    fn run(mut self) -> Result<ParsedLayout> {
        while self.state != ReaderState::Ready {
            self.step()?;
        }
        let schema = self.schema.ok_or_else(|| {
            JonxError::Format("parser reached Ready without a schema".to_string())
        })?;
        Ok(ParsedLayout {
            version: self.version,
            schema,
            columns: self.columns,
            indexes: self.indexes,
        })
    }

    fn parse_header(&mut self) -> Result<()> {
        // A buffer shorter than the magic is not a container at all.
        let available = FILE_MAGIC.len().min(self.cursor.remaining());
        let magic = self.cursor.take(available, "magic")?;
        if magic != FILE_MAGIC {
            return Err(JonxError::Format(
                "buffer does not start with the JONX magic tag".to_string(),
            ));
        }
        let version = self.cursor.read_u32_le("format version")?;
        if version != FILE_FORMAT_VERSION {
            return Err(JonxError::Format(format!(
                "Unsupported format version: expected {}, got {}",
                FILE_FORMAT_VERSION, version
            )));
        }
        self.version = version;
        Ok(())
    }

    fn parse_schema(&mut self) -> Result<()> {
        let block = self.cursor.read_block("schema block")?;
        let schema = Schema::from_block(&zstd::decode(block)?)?;
        debug!("Parsed schema with {} fields", schema.num_fields());
        self.schema = Some(schema);
        Ok(())
    }

    fn index_columns(&mut self) -> Result<()> {
        let schema = self.schema.as_ref().ok_or_else(|| {
            JonxError::Format("column blocks read before the schema".to_string())
        })?;
        let mut columns = Vec::with_capacity(schema.num_fields());
        for field in &schema.fields {
            let what = format!("column block '{}'", field);
            columns.push(self.cursor.read_block_range(&what)?);
        }
        self.columns = columns;
        Ok(())
    }

    fn parse_indexes(&mut self) -> Result<()> {
        let schema = self
            .schema
            .as_ref()
            .ok_or_else(|| JonxError::Format("indexes read before the schema".to_string()))?;
        let count = self.cursor.read_u32_le("index count")? as usize;

        // Each entry carries at least its two length prefixes.
        let minimum = count.saturating_mul(2 * LEN_PREFIX_SIZE);
        if minimum > self.cursor.remaining() {
            return Err(JonxError::TruncatedData {
                what: format!("{} index entries", count),
                offset: self.cursor.position(),
                needed: minimum,
                remaining: self.cursor.remaining(),
            });
        }

        let mut indexes: Vec<(String, Range<usize>)> = Vec::with_capacity(count);
        for _ in 0..count {
            let name_bytes = self.cursor.read_block("index name")?;
            let name = std::str::from_utf8(name_bytes)
                .map_err(|e| JonxError::Format(format!("index name is not UTF-8: {}", e)))?
                .to_string();
            match schema.storage_type(&name) {
                Some(ty) if ty.is_numeric() => {}
                Some(ty) => {
                    return Err(JonxError::Format(format!(
                        "index '{}' is attached to a {} column",
                        name, ty
                    )))
                }
                None => {
                    return Err(JonxError::Format(format!(
                        "index '{}' does not name a schema field",
                        name
                    )))
                }
            }
            if indexes.iter().any(|(existing, _)| *existing == name) {
                return Err(JonxError::Format(format!("index '{}' appears twice", name)));
            }
            let range = self
                .cursor
                .read_block_range(&format!("index block '{}'", name))?;
            indexes.push((name, range));
        }

        if !self.cursor.is_at_end() {
            return Err(JonxError::Format(format!(
                "{} trailing bytes after the index table",
                self.cursor.remaining()
            )));
        }
        self.indexes = indexes;
        Ok(())
    }
}

//==================================================================================
// II. Lazy File Reader
//==================================================================================

/// A parsed container with lazy, per-column decompression.
#[derive(Debug, Clone)]
pub struct JonxFile {
    data: Vec<u8>,
    version: u32,
    schema: Schema,
    columns: Vec<Range<usize>>,
    positions: HashMap<String, usize>,
    indexes: HashMap<String, Range<usize>>,
    index_order: Vec<String>,
}

impl JonxFile {
    /// Reads a whole file and parses it.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        info!(
            "Opening JONX file {} ({} bytes)",
            path.as_ref().display(),
            data.len()
        );
        Self::from_bytes(data)
    }

    /// Parses a container, taking ownership of the buffer.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let layout = ContainerParser::new(&data).run()?;

        let positions = layout
            .schema
            .fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.clone(), i))
            .collect();
        let index_order = layout.indexes.iter().map(|(n, _)| n.clone()).collect();
        let indexes = layout.indexes.into_iter().collect();

        Ok(Self {
            data,
            version: layout.version,
            schema: layout.schema,
            columns: layout.columns,
            positions,
            indexes,
            index_order,
        })
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn fields(&self) -> &[String] {
        &self.schema.fields
    }

    pub fn storage_type(&self, field: &str) -> Result<StorageType> {
        self.schema
            .storage_type(field)
            .ok_or_else(|| JonxError::FieldNotFound(field.to_string()))
    }

    fn position(&self, field: &str) -> Result<usize> {
        self.positions
            .get(field)
            .copied()
            .ok_or_else(|| JonxError::FieldNotFound(field.to_string()))
    }

    /// The still-compressed block of `field`.
    pub fn compressed_column(&self, field: &str) -> Result<&[u8]> {
        let range = self.columns[self.position(field)?].clone();
        Ok(&self.data[range])
    }

    /// Decompresses and unpacks one column.
    ///
    /// Only this column's block is touched, so its row count is not compared
    /// with the other columns. Use `get_column_checked` for that.
    pub fn column_data(&self, field: &str) -> Result<ColumnData> {
        let ty = self.storage_type(field)?;
        let packed = zstd::decode(self.compressed_column(field)?)?;
        ColumnData::unpack(&packed, ty)
    }

    /// Decompresses one column into JSON values.
    pub fn get_column(&self, field: &str) -> Result<Vec<Value>> {
        Ok(self.column_data(field)?.into_values())
    }

    /// Like `get_column`, but fails with `SchemaMismatch` when the column does
    /// not hold `num_rows()` values.
    pub fn get_column_checked(&self, field: &str) -> Result<Vec<Value>> {
        let ty = self.storage_type(field)?;
        let packed = zstd::decode(self.compressed_column(field)?)?;
        Ok(unpack_column(&packed, ty, self.num_rows()?)?.into_values())
    }

    /// Number of rows, taken from the first column. Zero fields means zero rows.
    pub fn num_rows(&self) -> Result<usize> {
        match self.schema.fields.first() {
            Some(first) => Ok(self.column_data(first)?.len()),
            None => Ok(0),
        }
    }

    /// Decompresses every column, checking that they agree on the row count.
    pub fn read_columns(&self) -> Result<(usize, Vec<ColumnData>)> {
        let mut columns: Vec<ColumnData> = Vec::with_capacity(self.columns.len());
        let mut num_rows: Option<usize> = None;
        for (field, ty) in self.schema.columns() {
            let packed = zstd::decode(self.compressed_column(field)?)?;
            let column = match num_rows {
                None => ColumnData::unpack(&packed, ty)?,
                Some(expected) => unpack_column(&packed, ty, expected).map_err(|e| match e {
                    JonxError::SchemaMismatch(msg) => {
                        JonxError::SchemaMismatch(format!("column '{}': {}", field, msg))
                    }
                    other => other,
                })?,
            };
            num_rows.get_or_insert(column.len());
            columns.push(column);
        }
        Ok((num_rows.unwrap_or(0), columns))
    }

    /// Names of the indexed fields, in container order.
    pub fn index_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.index_order.iter().map(String::as_str)
    }

    pub fn has_index(&self, field: &str) -> bool {
        self.indexes.contains_key(field)
    }

    fn read_index(&self, field: &str) -> Result<Option<SortIndex>> {
        self.position(field)?;
        match self.indexes.get(field) {
            None => Ok(None),
            Some(range) => {
                let bytes = zstd::decode(&self.data[range.clone()])?;
                Ok(Some(index::decode_index(&bytes)?))
            }
        }
    }

    /// Decompresses the index of `field`, if the container has one, and checks
    /// that it is a permutation of the column's rows.
    pub fn get_index(&self, field: &str) -> Result<Option<SortIndex>> {
        let sort_index = match self.read_index(field)? {
            Some(sort_index) => sort_index,
            None => return Ok(None),
        };
        index::validate_index(&sort_index, self.column_data(field)?.len())?;
        Ok(Some(sort_index))
    }

    /// The minimum of `field`.
    ///
    /// With `use_index` and an index present, the answer is `column[index[0]]`
    /// after a length check. Otherwise the decompressed column is scanned.
    pub fn find_min(&self, field: &str, use_index: bool) -> Result<Option<Value>> {
        let column = self.column_data(field)?;
        if use_index {
            if let Some(sort_index) = self.read_index(field)? {
                if sort_index.len() != column.len() {
                    return Err(JonxError::SchemaMismatch(format!(
                        "index of '{}' holds {} positions for {} rows",
                        field,
                        sort_index.len(),
                        column.len()
                    )));
                }
                return index::find_min(&column, Some(&sort_index));
            }
        }
        index::find_min(&column, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_machine_walks_through_every_state() {
        let bytes = crate::bridge::encode(&[serde_json::json!({"a": 1})
            .as_object()
            .cloned()
            .unwrap()])
        .unwrap();

        let mut parser = ContainerParser::new(&bytes);
        assert_eq!(parser.state(), ReaderState::Unopened);
        assert_eq!(parser.step().unwrap(), ReaderState::HeaderParsed);
        assert_eq!(parser.step().unwrap(), ReaderState::SchemaParsed);
        assert_eq!(parser.step().unwrap(), ReaderState::ColumnsIndexed);
        assert_eq!(parser.step().unwrap(), ReaderState::Ready);
        assert_eq!(parser.step().unwrap(), ReaderState::Ready);
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut parser = ContainerParser::new(b"NOPE\x01\x00\x00\x00");
        assert!(matches!(parser.step(), Err(JonxError::Format(_))));
        assert_eq!(parser.state(), ReaderState::Failed);
        assert!(matches!(parser.step(), Err(JonxError::Format(_))));
        assert_eq!(parser.state(), ReaderState::Failed);
    }

    #[test]
    fn test_short_buffer_is_a_format_error() {
        assert!(matches!(JonxFile::from_bytes(Vec::new()), Err(JonxError::Format(_))));
        assert!(matches!(JonxFile::from_bytes(b"JO".to_vec()), Err(JonxError::Format(_))));
    }

    #[test]
    fn test_unknown_version_is_a_format_error() {
        let mut bytes = b"JONX".to_vec();
        bytes.extend_from_slice(&2u32.to_le_bytes());
        let err = JonxFile::from_bytes(bytes).unwrap_err();
        assert!(matches!(err, JonxError::Format(msg) if msg.contains("version")));
    }
}
