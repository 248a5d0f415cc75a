// In: src/container/writer.rs

//! The authoritative writer for the JONX container.
//!
//! The writer receives blocks that are already compressed and only lays them
//! out: header, schema block, one column block per field in schema order, then
//! the index table. It never reorders or drops a column.

use std::io::Write;

use log::debug;

use crate::container::format::{
    Schema, FILE_FORMAT_VERSION, FILE_MAGIC, HEADER_SIZE, LEN_PREFIX_SIZE,
};
use crate::error::{JonxError, Result};

/// Everything a container holds, with every block already compressed.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerParts {
    /// The schema the blocks were produced for.
    pub schema: Schema,
    /// zstd(schema JSON).
    pub schema_block: Vec<u8>,
    /// One zstd block per schema field, in schema order.
    pub column_blocks: Vec<Vec<u8>>,
    /// `(field, zstd(index JSON))`, in schema order.
    pub index_blocks: Vec<(String, Vec<u8>)>,
}

impl ContainerParts {
    /// The exact number of bytes `write_container` will produce.
    pub fn serialized_len(&self) -> usize {
        let columns: usize = self
            .column_blocks
            .iter()
            .map(|block| LEN_PREFIX_SIZE + block.len())
            .sum();
        let indexes: usize = self
            .index_blocks
            .iter()
            .map(|(name, block)| 2 * LEN_PREFIX_SIZE + name.len() + block.len())
            .sum();
        HEADER_SIZE
            + LEN_PREFIX_SIZE
            + self.schema_block.len()
            + columns
            + LEN_PREFIX_SIZE
            + indexes
    }

    /// Checks the invariants the byte layout relies on.
    fn validate(&self) -> Result<()> {
        if self.column_blocks.len() != self.schema.num_fields() {
            return Err(JonxError::Format(format!(
                "{} column blocks for a schema of {} fields",
                self.column_blocks.len(),
                self.schema.num_fields()
            )));
        }
        for (name, _) in &self.index_blocks {
            if self.schema.storage_type(name).is_none() {
                return Err(JonxError::Format(format!(
                    "index '{}' does not name a schema field",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Converts a block length into its on-disk `u32` prefix.
fn len_prefix(len: usize, what: &str) -> Result<[u8; LEN_PREFIX_SIZE]> {
    let len = u32::try_from(len).map_err(|_| {
        JonxError::Format(format!(
            "{} is {} bytes, larger than a u32 length prefix allows",
            what, len
        ))
    })?;
    Ok(len.to_le_bytes())
}

/// Writes containers into any `Write` sink.
pub struct ContainerWriter<W: Write> {
    out: W,
    written: usize,
}

impl<W: Write> ContainerWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Writes one complete container and returns its size.
    pub fn write_container(&mut self, parts: &ContainerParts) -> Result<usize> {
        parts.validate()?;
        let start = self.written;

        self.write_raw(FILE_MAGIC)?;
        self.write_raw(&FILE_FORMAT_VERSION.to_le_bytes())?;
        self.write_block(&parts.schema_block, "schema block")?;

        for (field, block) in parts.schema.fields.iter().zip(&parts.column_blocks) {
            self.write_block(block, field)?;
        }

        self.write_raw(&len_prefix(parts.index_blocks.len(), "index count")?)?;
        for (name, block) in &parts.index_blocks {
            self.write_block(name.as_bytes(), "index name")?;
            self.write_block(block, name)?;
        }

        let size = self.written - start;
        debug!(
            "Wrote container: {} columns, {} indexes, {} bytes",
            parts.column_blocks.len(),
            parts.index_blocks.len(),
            size
        );
        Ok(size)
    }

    fn write_block(&mut self, block: &[u8], what: &str) -> Result<()> {
        self.write_raw(&len_prefix(block.len(), what)?)?;
        self.write_raw(block)
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes)?;
        self.written += bytes.len();
        Ok(())
    }
}

/// Serializes a container into a fresh buffer.
pub fn to_bytes(parts: &ContainerParts) -> Result<Vec<u8>> {
    let mut writer = ContainerWriter::new(Vec::with_capacity(parts.serialized_len()));
    writer.write_container(parts)?;
    Ok(writer.into_inner())
}
