//! Lossless byte compression applied to the base image and every patch payload

use crate::io::configuration::{DEFAULT_COMPRESSION_LEVEL, MAX_COMPRESSION_LEVEL};
use crate::io::error::{PackError, Result, corrupt, invalid_parameter};
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

/// Deterministic, lossless byte transform used inside the container
///
/// Swapping implementations changes the stored bytes, so an incompatible
/// compressor must come with a new container version.
pub trait Compressor {
    /// Compress a payload
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Compression`] if the encoder fails
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Restore a payload produced by [`Compressor::compress`]
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Compression`] if the input is not a valid stream
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Restore a payload that must not exceed `limit` bytes
    ///
    /// Decoding stops one byte past `limit`, so a hostile stream cannot
    /// inflate without bound.
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Compression`] if the input is not a valid stream,
    /// or [`PackError::CorruptData`] if it inflates past `limit`
    fn decompress_bounded(&self, data: &[u8], limit: usize) -> Result<Vec<u8>>;
}

/// zlib (DEFLATE) compression
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Zlib {
    level: u32,
}

impl Default for Zlib {
    fn default() -> Self {
        Self {
            level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl Zlib {
    /// Create a compressor with an explicit level (0 = store, 9 = best)
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidParameter`] if `level` exceeds 9
    pub fn new(level: u32) -> Result<Self> {
        if level > MAX_COMPRESSION_LEVEL {
            return Err(invalid_parameter(
                "level",
                &level,
                &format!("must be between 0 and {MAX_COMPRESSION_LEVEL}"),
            ));
        }
        Ok(Self { level })
    }

    /// Configured compression level
    pub const fn level(&self) -> u32 {
        self.level
    }
}

impl Compressor for Zlib {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(
            Vec::with_capacity(data.len() / 2),
            Compression::new(self.level),
        );
        encoder
            .write_all(data)
            .and_then(|()| encoder.finish())
            .map_err(|source| PackError::Compression {
                operation: "compress",
                source,
            })
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data);
        let mut output = Vec::new();
        decoder
            .read_to_end(&mut output)
            .map_err(|source| PackError::Compression {
                operation: "decompress",
                source,
            })?;
        Ok(output)
    }

    fn decompress_bounded(&self, data: &[u8], limit: usize) -> Result<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(data).take((limit as u64).saturating_add(1));
        let mut output = Vec::new();
        decoder
            .read_to_end(&mut output)
            .map_err(|source| PackError::Compression {
                operation: "decompress",
                source,
            })?;
        if output.len() > limit {
            return Err(corrupt(&format!(
                "payload inflates past the expected {limit} bytes"
            )));
        }
        Ok(output)
    }
}
