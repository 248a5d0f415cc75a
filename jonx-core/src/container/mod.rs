// In: src/container/mod.rs

//! The JONX binary container: byte layout, writer and reader.
//!
//! `format` owns the constants and the schema block, `writer` lays compressed
//! blocks out, and `reader` parses them back through the bounds-checked
//! `cursor`. None of these know how a column is packed.

pub(crate) mod cursor;
pub mod format;
pub mod reader;
pub mod writer;

pub use format::{Schema, FILE_FORMAT_VERSION, FILE_MAGIC};
pub use reader::{ContainerParser, JonxFile, ReaderState};
pub use writer::{to_bytes, ContainerParts, ContainerWriter};

#[cfg(test)]
mod tests;
