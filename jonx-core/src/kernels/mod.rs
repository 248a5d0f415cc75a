//! Stateless byte-level kernels shared by the column codec and the container.
//!
//! - `zstd`: block compression (the compression adapter).
//! - `fixed_width`: little-endian packing of fixed-width numeric words.

pub mod fixed_width;
pub mod zstd;

pub use self::zstd::ZstdCodec;
