// In: src/bridge/mod.rs

// ====================================================================================
// ARCHITECTURAL OVERVIEW: The Bridge Layer
// ====================================================================================
//
// The `bridge` is the sole public-facing API of the jonx library. Front ends (an
// HTTP service, a CLI, a viewer) call only these functions; everything below it
// is an implementation detail.
//
// Data Flow (Encode):
//
//   1. [Stateless API (encode / preview)]   -> Receives `&[Record]` + `&JonxConfig`
//         |
//         `-> calls ->
//
//   2. [Compressor (build_container_parts)] -> transposes records into columns,
//         |                                    then per column (optionally on rayon):
//         |                                    detect -> pack -> zstd, index -> zstd
//         `-> Returns `ContainerParts`
//
//   3. [Container Writer]                   -> lays parts out as bytes
//                                              (preview only asks for the length)
//
// Data Flow (Decode):
//
//   1. [Container Reader (JonxFile)]        -> bounds-checked parse into block ranges
//         |
//   2. [Decompressor (decode_document)]     -> zstd -> unpack every column,
//                                              rebuild records in schema order
//
// ====================================================================================
pub(crate) mod compressor;
pub(crate) mod decompressor;
pub mod format;
pub mod stateless_api;

pub(crate) use compressor::build_container_parts;
pub use format::{DecodedDocument, PreviewReport};
pub use stateless_api::{
    decode, encode, encode_json_slice, encode_with_config, preview, preview_with_config,
    records_from_json_slice,
};
