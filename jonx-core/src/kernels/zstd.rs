//! This module contains the stateless kernel for Zstandard compression and
//! decompression of container blocks.
//!
//! Every block (schema, column, index) is one standalone zstd frame with the
//! content size recorded in the frame header, so a block is self-describing and
//! needs no side information to decompress. This module is a safe, panic-free
//! wrapper around the `zstd` crate.

use crate::error::{JonxError, Result};

//==================================================================================
// 1. Core Logic (The "Engine")
//==================================================================================

/// Compresses a byte slice into a single zstd frame.
fn compress_slice(input_bytes: &[u8], level: i32) -> Result<Vec<u8>> {
    // The bulk API writes the content size into the frame header.
    zstd::bulk::compress(input_bytes, level).map_err(|e| JonxError::Compression(e.to_string()))
}

/// Decompresses a zstd-compressed byte slice, writing to an output buffer.
fn decompress_slice(input_bytes: &[u8], output_buf: &mut Vec<u8>) -> Result<()> {
    // The streaming decoder grows the buffer as needed and reports an
    // incomplete frame as an error instead of returning short output.
    zstd::stream::copy_decode(input_bytes, output_buf)
        .map_err(|e| JonxError::Compression(e.to_string()))
}

//==================================================================================
// 2. Public API
//==================================================================================

/// An explicitly constructed block compressor.
///
/// It holds nothing but the level, so it is `Copy`, reentrant and safe to use
/// from several rayon workers at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    pub fn new(level: i32) -> Self {
        Self { level }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    /// Wraps a byte blob into one zstd frame.
    pub fn compress(&self, input_bytes: &[u8]) -> Result<Vec<u8>> {
        compress_slice(input_bytes, self.level)
    }

    /// Unwraps a zstd frame produced by `compress` at any level.
    pub fn decompress(&self, input_bytes: &[u8]) -> Result<Vec<u8>> {
        decode(input_bytes)
    }
}

/// The public-facing decode function. Decompression does not depend on the level.
pub fn decode(input_bytes: &[u8]) -> Result<Vec<u8>> {
    if input_bytes.is_empty() {
        return Err(JonxError::Compression(
            "Empty block cannot contain a zstd frame.".to_string(),
        ));
    }
    let mut output_buf = Vec::with_capacity(input_bytes.len() * 4);
    decompress_slice(input_bytes, &mut output_buf)?;
    Ok(output_buf)
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
