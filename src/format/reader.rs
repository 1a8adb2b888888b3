//! Single-variant lookup that touches only the header, index and one block

use crate::diff::patch::apply_patches;
use crate::format::bytes::ByteReader;
use crate::format::codec::{
    ContainerHeader, block_slice, parse_header_and_index, read_header_and_index,
};
use crate::format::compression::Compressor;
use crate::io::error::{IoContext, Result};
use crate::model::{PixelBuffer, Variant, VariantIndexEntry};
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Decode one variant's patch list from an in-memory container
///
/// Only the header, the index and the variant's own byte range are parsed.
///
/// # Errors
///
/// Returns an error if:
/// - The header is invalid (see [`parse_header_and_index`])
/// - No variant has this name ([`crate::PackError::VariantNotFound`])
/// - The block is truncated or corrupt
pub fn read_variant(bytes: &[u8], name: &str, compressor: &impl Compressor) -> Result<Variant> {
    let header = parse_header_and_index(bytes)?;
    let entry = header.find(name)?;
    header.decode_block(name, block_slice(bytes, entry)?, compressor)
}

/// Rebuild one variant's image from an in-memory container
///
/// # Errors
///
/// See [`read_variant`]; also fails if the base image cannot be decoded
pub fn extract_variant(
    bytes: &[u8],
    name: &str,
    compressor: &impl Compressor,
) -> Result<PixelBuffer> {
    let header = parse_header_and_index(bytes)?;
    let entry = header.find(name)?;
    let variant = header.decode_block(name, block_slice(bytes, entry)?, compressor)?;
    apply_patches(&header.decode_base(compressor)?, &variant.patches)
}

/// Container on disk, opened by reading only its header and index
///
/// Variant blocks are fetched on demand with a seek and a read of exactly
/// the indexed byte range.
#[derive(Debug)]
pub struct ContainerFile {
    path: PathBuf,
    header: ContainerHeader,
}

impl ContainerFile {
    /// Read the header and index of a container file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or its header is invalid
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).io_context("open", path)?;
        let mut reader = ByteReader::new(BufReader::new(file)).with_origin(path);
        let header = read_header_and_index(&mut reader)?;

        debug!(
            path = %path.display(),
            variants = header.index.len(),
            header_bytes = reader.position(),
            "Opened container"
        );
        Ok(Self {
            path: path.to_path_buf(),
            header,
        })
    }

    /// Path the container was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Parsed header and index
    pub const fn header(&self) -> &ContainerHeader {
        &self.header
    }

    /// Index entries in stored order
    pub fn entries(&self) -> &[VariantIndexEntry] {
        &self.header.index
    }

    /// Variant names in stored order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.header.names()
    }

    /// Decompress the base image
    ///
    /// # Errors
    ///
    /// Returns an error if the payload is corrupt
    pub fn base_image(&self, compressor: &impl Compressor) -> Result<PixelBuffer> {
        self.header.decode_base(compressor)
    }

    /// Read the raw bytes of one indexed block
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or ends inside the block
    pub fn read_block(&self, entry: &VariantIndexEntry) -> Result<Vec<u8>> {
        let mut file = File::open(&self.path).io_context("open", &self.path)?;
        file.seek(SeekFrom::Start(u64::from(entry.offset)))
            .io_context("seek", &self.path)?;
        ByteReader::new(file)
            .with_origin(&self.path)
            .read_bytes(entry.size as usize, "variant block")
    }

    /// Decode one variant's patch list
    ///
    /// # Errors
    ///
    /// Returns [`crate::PackError::VariantNotFound`] for unknown names, or an
    /// error if the block cannot be read or decoded
    pub fn read_variant(&self, name: &str, compressor: &impl Compressor) -> Result<Variant> {
        let entry = self.header.find(name)?;
        let block = self.read_block(entry)?;
        self.header.decode_block(name, &block, compressor)
    }

    /// Rebuild one variant's image
    ///
    /// # Errors
    ///
    /// See [`ContainerFile::read_variant`]
    pub fn extract_variant(&self, name: &str, compressor: &impl Compressor) -> Result<PixelBuffer> {
        let variant = self.read_variant(name, compressor)?;
        apply_patches(&self.base_image(compressor)?, &variant.patches)
    }
}
