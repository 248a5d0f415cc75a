//! This module contains the pure, stateless kernel for fixed-width little-endian
//! packing.
//!
//! Integers are written through `PrimInt::to_le` and reinterpreted as bytes with
//! `bytemuck`, so the on-disk layout is little-endian on every target. Floats are
//! first bit-cast to the unsigned word of the same width (`f32` -> `u32`,
//! `f16` -> `u16`) and then take the integer path.

use bytemuck::Pod;
use num_traits::PrimInt;

use crate::error::{JonxError, Result};

//==================================================================================
// 1. Private Core Logic
//==================================================================================

fn check_word_multiple<W>(bytes: &[u8]) -> Result<usize> {
    let width = std::mem::size_of::<W>();
    if bytes.len() % width != 0 {
        return Err(JonxError::SchemaMismatch(format!(
            "Buffer length mismatch: expected a multiple of {}, got {}",
            width,
            bytes.len()
        )));
    }
    Ok(bytes.len() / width)
}

//==================================================================================
// 2. Public API (Generic, Decoupled)
//==================================================================================

/// Serializes integer words as little-endian bytes.
pub fn encode<W>(words: &[W]) -> Vec<u8>
where
    W: PrimInt + Pod,
{
    let le_words: Vec<W> = words.iter().map(|w| w.to_le()).collect();
    bytemuck::cast_slice::<W, u8>(&le_words).to_vec()
}

/// Parses little-endian bytes back into integer words.
///
/// The input needs no particular alignment.
pub fn decode<W>(bytes: &[u8]) -> Result<Vec<W>>
where
    W: PrimInt + Pod,
{
    let count = check_word_multiple::<W>(bytes)?;
    let width = std::mem::size_of::<W>();
    let mut words = Vec::with_capacity(count);
    for chunk in bytes.chunks_exact(width) {
        words.push(W::from_le(bytemuck::pod_read_unaligned::<W>(chunk)));
    }
    Ok(words)
}

/// Bit-casts a slice of floats to words of the same width and packs them.
pub fn encode_bitcast<F, W>(values: &[F]) -> Result<Vec<u8>>
where
    F: Pod,
    W: PrimInt + Pod,
{
    // Critical safety check: the types must be the same size for a bit-cast.
    if std::mem::size_of::<F>() != std::mem::size_of::<W>() {
        return Err(JonxError::Format(format!(
            "Bit-cast size mismatch: Cannot cast from {} ({} bytes) to {} ({} bytes)",
            std::any::type_name::<F>(),
            std::mem::size_of::<F>(),
            std::any::type_name::<W>(),
            std::mem::size_of::<W>()
        )));
    }
    let words: Vec<W> = values.iter().map(|v| bytemuck::cast::<F, W>(*v)).collect();
    Ok(encode(&words))
}

/// The inverse of `encode_bitcast`.
pub fn decode_bitcast<W, F>(bytes: &[u8]) -> Result<Vec<F>>
where
    W: PrimInt + Pod,
    F: Pod,
{
    if std::mem::size_of::<F>() != std::mem::size_of::<W>() {
        return Err(JonxError::Format(format!(
            "Bit-cast size mismatch: Cannot cast from {} to {}",
            std::any::type_name::<W>(),
            std::any::type_name::<F>()
        )));
    }
    let words = decode::<W>(bytes)?;
    Ok(words.into_iter().map(bytemuck::cast::<W, F>).collect())
}

//==================================================================================
// 3. Unit Tests
//==================================================================================
