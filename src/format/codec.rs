//! Binary container layout
//!
//! ```text
//! magic[4]="CHPK" version:u32 width:u32 height:u32 channels:u8
//! base_size:u32 base_bytes[base_size]
//! variant_count:u32
//! variant_count x { name_len:u32 name[name_len] offset:u32 size:u32 }
//! variant blocks, each: patch_count:u32
//!     patch_count x { x:u32 y:u32 w:u32 h:u32 size:u32 bytes[size] }
//! ```
//!
//! All integers are unsigned little-endian. Block offsets are absolute from
//! the start of the container. The base image and every patch payload are
//! compressed independently.

use crate::format::bytes::{ByteReader, ByteWriter, to_u32};
use crate::format::compression::Compressor;
use crate::io::configuration::{FORMAT_VERSION, MAGIC};
use crate::io::error::{PackError, Result, corrupt};
use crate::model::pixels::byte_len;
use crate::model::{Container, Patch, PixelBuffer, Rectangle, Variant, VariantIndexEntry};
use std::collections::HashSet;
use std::io::Read;

/// Fixed-size prefix: magic, version, width, height, channels
const FIXED_HEADER_LEN: usize = 4 + 4 + 4 + 4 + 1;

/// Everything in front of the variant blocks
///
/// The base image is kept compressed so listing a container or locating a
/// single variant never pays for decompressing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Format revision
    pub version: u32,
    /// Image width shared by all variants
    pub width: u32,
    /// Image height shared by all variants
    pub height: u32,
    /// Channels per pixel shared by all variants
    pub channels: u8,
    /// Compressed base image bytes
    pub base_payload: Vec<u8>,
    /// Variant directory in stored order
    pub index: Vec<VariantIndexEntry>,
}

impl ContainerHeader {
    /// Size of this header and index once encoded
    pub fn encoded_len(&self) -> usize {
        FIXED_HEADER_LEN
            + 4
            + self.base_payload.len()
            + 4
            + self
                .index
                .iter()
                .map(VariantIndexEntry::encoded_len)
                .sum::<usize>()
    }

    /// Encode the header and index table
    ///
    /// # Errors
    ///
    /// Returns [`PackError::Overflow`] if a length does not fit in 32 bits
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = ByteWriter::with_capacity(self.encoded_len());
        writer.put_bytes(&MAGIC);
        writer.put_le(self.version);
        writer.put_le(self.width);
        writer.put_le(self.height);
        writer.put_le(self.channels);
        writer.put_len(self.base_payload.len(), "base image size")?;
        writer.put_bytes(&self.base_payload);
        writer.put_len(self.index.len(), "variant count")?;
        for entry in &self.index {
            writer.put_string(&entry.name, "variant name length")?;
            writer.put_le(entry.offset);
            writer.put_le(entry.size);
        }
        Ok(writer.into_inner())
    }

    /// Variant names in stored order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.index.iter().map(|entry| entry.name.as_str())
    }

    /// Find a variant's index entry
    ///
    /// # Errors
    ///
    /// Returns [`PackError::VariantNotFound`] if no entry has this name
    pub fn find(&self, name: &str) -> Result<&VariantIndexEntry> {
        self.index
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| PackError::VariantNotFound {
                name: name.to_string(),
            })
    }

    /// Decompress the base image
    ///
    /// # Errors
    ///
    /// Returns an error if decompression fails or the result has the wrong size
    pub fn decode_base(&self, compressor: &impl Compressor) -> Result<PixelBuffer> {
        let expected = byte_len(self.width, self.height, self.channels);
        let data = compressor.decompress_bounded(&self.base_payload, expected)?;
        if data.len() != expected {
            return Err(corrupt(&format!(
                "base image decompressed to {} bytes, expected {expected}",
                data.len()
            )));
        }
        PixelBuffer::new(self.width, self.height, self.channels, data)
    }

    /// Parse one variant block
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The block ends early ([`PackError::TruncatedData`])
    /// - A patch lies outside the image, decompresses to the wrong size, or the
    ///   block has trailing bytes ([`PackError::CorruptData`])
    /// - A payload cannot be decompressed ([`PackError::Compression`])
    pub fn decode_block(
        &self,
        name: &str,
        block: &[u8],
        compressor: &impl Compressor,
    ) -> Result<Variant> {
        let mut reader = ByteReader::new(block);
        let patch_count = reader.read_len("patch count")?;

        let mut patches = Vec::new();
        for index in 0..patch_count {
            let rect = Rectangle::new(
                reader.read_le("patch x")?,
                reader.read_le("patch y")?,
                reader.read_le("patch width")?,
                reader.read_le("patch height")?,
            );
            if !rect.fits_within(self.width, self.height) {
                return Err(corrupt(&format!(
                    "patch {index} of '{name}' at {rect:?} exceeds {}x{} image",
                    self.width, self.height
                )));
            }

            let size = reader.read_len("patch size")?;
            let payload = reader.read_bytes(size, "patch payload")?;
            let expected = byte_len(rect.width, rect.height, self.channels);
            let patch = Patch {
                rect,
                data: compressor.decompress_bounded(&payload, expected)?,
            };
            if patch.data.len() != expected {
                return Err(corrupt(&format!(
                    "patch {index} of '{name}' decompressed to {} bytes, expected {expected}",
                    patch.data.len()
                )));
            }
            patches.push(patch);
        }

        if !reader.is_exhausted()? {
            return Err(corrupt(&format!(
                "variant block of '{name}' has trailing bytes"
            )));
        }

        Ok(Variant::new(name, patches))
    }
}

/// A variant block that is already encoded, ready to be laid out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedVariant {
    /// Variant name
    pub name: String,
    /// Encoded block bytes
    pub block: Vec<u8>,
}

/// Encode a variant's patch list, compressing every payload
///
/// # Errors
///
/// Returns an error if compression fails or a size overflows 32 bits
pub fn encode_variant_block(variant: &Variant, compressor: &impl Compressor) -> Result<Vec<u8>> {
    let mut writer = ByteWriter::with_capacity(4 + variant.patches.len() * 20);
    writer.put_len(variant.patches.len(), "patch count")?;
    for patch in &variant.patches {
        let payload = compressor.compress(&patch.data)?;
        writer.put_le(patch.rect.x);
        writer.put_le(patch.rect.y);
        writer.put_le(patch.rect.width);
        writer.put_le(patch.rect.height);
        writer.put_len(payload.len(), "patch size")?;
        writer.put_bytes(&payload);
    }
    Ok(writer.into_inner())
}

/// Lay out a container from a header and pre-encoded blocks
///
/// Any index already present in `header` is replaced. The index size is
/// known up front, so the first block starts at `header.encoded_len()` and
/// each following block starts where the previous one ended.
///
/// # Errors
///
/// Returns [`PackError::Overflow`] if an offset or size does not fit in 32 bits
pub fn assemble(
    mut header: ContainerHeader,
    variants: &[EncodedVariant],
) -> Result<(ContainerHeader, Vec<u8>)> {
    header.index = variants
        .iter()
        .map(|variant| -> Result<VariantIndexEntry> {
            Ok(VariantIndexEntry {
                name: variant.name.clone(),
                offset: 0,
                size: to_u32(variant.block.len(), "variant block size")?,
            })
        })
        .collect::<Result<_>>()?;

    let mut offset = header.encoded_len();
    for (entry, variant) in header.index.iter_mut().zip(variants) {
        entry.offset = to_u32(offset, "variant block offset")?;
        offset += variant.block.len();
    }

    let mut bytes = header.encode()?;
    bytes.reserve(offset - bytes.len());
    for variant in variants {
        bytes.extend_from_slice(&variant.block);
    }
    Ok((header, bytes))
}

/// Serialize a full container
///
/// # Errors
///
/// Returns an error if compression fails or the container exceeds the 32-bit layout
pub fn serialize(container: &Container, compressor: &impl Compressor) -> Result<Vec<u8>> {
    let header = ContainerHeader {
        version: container.version,
        width: container.width(),
        height: container.height(),
        channels: container.channels(),
        base_payload: compressor.compress(container.base().data())?,
        index: Vec::new(),
    };

    let variants = container
        .variants()
        .iter()
        .map(|variant| -> Result<EncodedVariant> {
            Ok(EncodedVariant {
                name: variant.name.clone(),
                block: encode_variant_block(variant, compressor)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let (_, bytes) = assemble(header, &variants)?;
    Ok(bytes)
}

/// Read the header and index table from a byte source, stopping before any variant block
///
/// # Errors
///
/// Returns an error if:
/// - The magic bytes are wrong ([`PackError::MagicMismatch`])
/// - The version is not supported ([`PackError::UnsupportedVersion`])
/// - The source ends early ([`PackError::TruncatedData`])
/// - The shape or index is inconsistent ([`PackError::CorruptData`],
///   [`PackError::DuplicateVariantName`])
pub fn read_header_and_index<R: Read>(reader: &mut ByteReader<R>) -> Result<ContainerHeader> {
    let mut magic = [0u8; 4];
    reader.fill(&mut magic, "magic bytes")?;
    if magic != MAGIC {
        return Err(PackError::MagicMismatch { found: magic });
    }

    let version: u32 = reader.read_le("version")?;
    if version != FORMAT_VERSION {
        return Err(PackError::UnsupportedVersion { found: version });
    }

    let width: u32 = reader.read_le("width")?;
    let height: u32 = reader.read_le("height")?;
    let channels: u8 = reader.read_le("channels")?;
    if width == 0 || height == 0 || !matches!(channels, 3 | 4) {
        return Err(corrupt(&format!(
            "invalid image shape {width}x{height}x{channels}"
        )));
    }

    let base_size = reader.read_len("base image size")?;
    let base_payload = reader.read_bytes(base_size, "base image")?;

    let variant_count = reader.read_len("variant count")?;
    let mut index = Vec::new();
    let mut seen = HashSet::new();
    for _ in 0..variant_count {
        let name = reader.read_string("variant name")?;
        let offset = reader.read_le("variant block offset")?;
        let size = reader.read_le("variant block size")?;
        if name.is_empty() {
            return Err(corrupt(&"index contains an empty variant name"));
        }
        if !seen.insert(name.clone()) {
            return Err(PackError::DuplicateVariantName { name });
        }
        index.push(VariantIndexEntry { name, offset, size });
    }

    let header = ContainerHeader {
        version,
        width,
        height,
        channels,
        base_payload,
        index,
    };
    validate_index(&header, reader.position())?;
    Ok(header)
}

/// Read the header and index table from the front of an in-memory container
///
/// # Errors
///
/// See [`read_header_and_index`]
pub fn parse_header_and_index(bytes: &[u8]) -> Result<ContainerHeader> {
    read_header_and_index(&mut ByteReader::new(bytes))
}

// Blocks must start after the index and must not share bytes
fn validate_index(header: &ContainerHeader, header_len: u64) -> Result<()> {
    let mut ranges: Vec<&VariantIndexEntry> = header.index.iter().collect();
    ranges.sort_by_key(|entry| entry.offset);

    let mut previous_end = header_len;
    for entry in ranges {
        if u64::from(entry.offset) < previous_end {
            return Err(corrupt(&format!(
                "block of '{}' at offset {} overlaps the header or another block",
                entry.name, entry.offset
            )));
        }
        previous_end = entry.end();
    }
    Ok(())
}

/// Borrow a variant's block out of a full container
///
/// # Errors
///
/// Returns [`PackError::TruncatedData`] if the block extends past the end of `bytes`
pub fn block_slice<'a>(bytes: &'a [u8], entry: &VariantIndexEntry) -> Result<&'a [u8]> {
    bytes
        .get(entry.offset as usize..entry.end() as usize)
        .ok_or(PackError::TruncatedData {
            context: "variant block",
        })
}

/// Parse a complete container, decompressing the base image and every variant
///
/// Blocks are located through the index, so unreferenced gaps are skipped.
///
/// # Errors
///
/// Returns the first error found; no partially filled container is returned
pub fn deserialize(bytes: &[u8], compressor: &impl Compressor) -> Result<Container> {
    let header = parse_header_and_index(bytes)?;
    let mut container = Container::new(header.decode_base(compressor)?);
    container.version = header.version;

    for entry in &header.index {
        let block = block_slice(bytes, entry)?;
        container.push_variant(header.decode_block(&entry.name, block, compressor)?)?;
    }
    Ok(container)
}
