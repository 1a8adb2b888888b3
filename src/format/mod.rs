//! Binary container format: codec, random access and on-disk mutation

/// Little-endian field cursor
pub mod bytes;
/// Container layout encoding and decoding
pub mod codec;
/// Byte compression used for payloads
pub mod compression;
/// Adding and removing variants in existing files
pub mod mutator;
/// Single-variant random access
pub mod reader;

pub use codec::{ContainerHeader, deserialize, parse_header_and_index, serialize};
pub use compression::{Compressor, Zlib};
pub use reader::{ContainerFile, extract_variant};
