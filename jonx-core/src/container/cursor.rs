//! A bounds-checked, forward-only reader over a byte buffer.
//!
//! Every read checks the remaining length before a slice is taken, so a
//! truncated or lying length prefix becomes `TruncatedData` instead of a panic.

use std::ops::Range;

use crate::container::format::LEN_PREFIX_SIZE;
use crate::error::{JonxError, Result};

#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Offset of the next unread byte.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Consumes exactly `len` bytes and returns their range in the buffer.
    pub fn take_range(&mut self, len: usize, what: &str) -> Result<Range<usize>> {
        if len > self.remaining() {
            return Err(JonxError::TruncatedData {
                what: what.to_string(),
                offset: self.pos,
                needed: len,
                remaining: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(start..self.pos)
    }

    /// Consumes exactly `len` bytes.
    pub fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        let range = self.take_range(len, what)?;
        Ok(&self.buf[range])
    }

    pub fn read_u32_le(&mut self, what: &str) -> Result<u32> {
        let bytes = self.take(LEN_PREFIX_SIZE, what)?;
        let mut word = [0u8; LEN_PREFIX_SIZE];
        word.copy_from_slice(bytes);
        Ok(u32::from_le_bytes(word))
    }

    /// Reads a `u32` length prefix followed by that many bytes, returning the
    /// range of the payload.
    pub fn read_block_range(&mut self, what: &str) -> Result<Range<usize>> {
        let len = self.read_u32_le(what)? as usize;
        self.take_range(len, what)
    }

    /// Reads a `u32` length prefix followed by that many bytes.
    pub fn read_block(&mut self, what: &str) -> Result<&'a [u8]> {
        let range = self.read_block_range(what)?;
        Ok(&self.buf[range])
    }
}
