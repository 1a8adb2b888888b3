//! Adding variants to and removing variants from containers on disk
//!
//! Both operations validate everything before the first byte is written, so
//! a rejected request leaves the file untouched. Adding rewrites the whole
//! file (existing blocks are copied byte for byte, never re-diffed). Removing
//! rewrites only the header and index in place; the removed blocks stay in
//! the file unreferenced until the next full rewrite.

use crate::diff::blocks::DiffOptions;
use crate::diff::pack::diff_variant;
use crate::format::bytes::ByteReader;
use crate::format::codec::{
    ContainerHeader, EncodedVariant, assemble, block_slice, encode_variant_block,
    parse_header_and_index, read_header_and_index,
};
use crate::format::compression::Compressor;
use crate::io::error::{IoContext, PackError, Result};
use crate::model::{PixelBuffer, VariantIndexEntry};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{info, warn};

/// Diff new images against a container's base image and append them
///
/// Returns the rewritten index.
///
/// # Errors
///
/// Returns an error, without touching the file, if:
/// - The container cannot be read or is invalid
/// - `images` is empty ([`PackError::EmptyInput`])
/// - A name is empty ([`PackError::InvalidVariantName`])
/// - A name is already used in the file or repeated in `images`
///   ([`PackError::DuplicateVariantName`])
/// - An image's shape differs from the container's
pub fn add_variants(
    path: &Path,
    images: &[(String, PixelBuffer)],
    options: &DiffOptions,
    compressor: &impl Compressor,
) -> Result<Vec<VariantIndexEntry>> {
    if images.is_empty() {
        return Err(PackError::EmptyInput);
    }
    options.validate()?;

    let bytes = std::fs::read(path).io_context("read", path)?;
    let header = parse_header_and_index(&bytes)?;

    let mut names: HashSet<&str> = header.names().collect();
    for (name, _) in images {
        if name.is_empty() {
            return Err(PackError::InvalidVariantName { name: name.clone() });
        }
        if !names.insert(name.as_str()) {
            return Err(PackError::DuplicateVariantName { name: name.clone() });
        }
    }

    let base = header.decode_base(compressor)?;
    for (_, image) in images {
        base.ensure_same_shape(image)?;
    }

    let mut variants = header
        .index
        .iter()
        .map(|entry| -> Result<EncodedVariant> {
            Ok(EncodedVariant {
                name: entry.name.clone(),
                block: block_slice(&bytes, entry)?.to_vec(),
            })
        })
        .collect::<Result<Vec<_>>>()?;
    let live_bytes: usize = variants.iter().map(|variant| variant.block.len()).sum();
    let reclaimed = bytes.len() - header.encoded_len() - live_bytes;

    for (name, image) in images {
        let variant = diff_variant(&base, name, image, options)?;
        variants.push(EncodedVariant {
            name: name.clone(),
            block: encode_variant_block(&variant, compressor)?,
        });
    }

    let (rewritten, output) = assemble(header, &variants)?;
    write_container_file(path, &output)?;

    info!(
        path = %path.display(),
        added = images.len(),
        variants = rewritten.index.len(),
        reclaimed_bytes = reclaimed,
        "Added variants"
    );
    Ok(rewritten.index)
}

/// Drop variants from a container's index
///
/// Returns the remaining index. The dropped blocks stay in the file.
///
/// # Errors
///
/// Returns an error, without touching the file, if:
/// - The container cannot be read or is invalid
/// - A name is not in the container ([`PackError::VariantNotFound`])
/// - No variant would remain ([`PackError::CannotRemoveAllVariants`])
pub fn remove_variants<S: AsRef<str>>(
    path: &Path,
    names: &[S],
) -> Result<Vec<VariantIndexEntry>> {
    let file = File::open(path).io_context("open", path)?;
    let mut reader = ByteReader::new(BufReader::new(file)).with_origin(path);
    let header = read_header_and_index(&mut reader)?;
    drop(reader);

    for name in names {
        header.find(name.as_ref())?;
    }
    let doomed: HashSet<&str> = names.iter().map(AsRef::as_ref).collect();

    let remaining: Vec<VariantIndexEntry> = header
        .index
        .iter()
        .filter(|entry| !doomed.contains(entry.name.as_str()))
        .cloned()
        .collect();
    if remaining.is_empty() {
        return Err(PackError::CannotRemoveAllVariants);
    }

    let stale_bytes: u64 = header
        .index
        .iter()
        .filter(|entry| doomed.contains(entry.name.as_str()))
        .map(|entry| u64::from(entry.size))
        .sum();

    let rewritten = ContainerHeader {
        index: remaining,
        ..header
    };
    // Fewer entries always encode shorter, so the blocks are never overwritten
    let encoded = rewritten.encode()?;

    let mut file = OpenOptions::new()
        .write(true)
        .open(path)
        .io_context("open for writing", path)?;
    file.seek(SeekFrom::Start(0)).io_context("seek", path)?;
    file.write_all(&encoded).io_context("write", path)?;
    file.sync_all().io_context("sync", path)?;

    info!(
        path = %path.display(),
        removed = doomed.len(),
        variants = rewritten.index.len(),
        "Removed variants"
    );
    warn!(
        path = %path.display(),
        stale_bytes,
        "Removed variant blocks remain in the file until it is rewritten"
    );
    Ok(rewritten.index)
}

/// Write a complete container, replacing any existing file atomically
///
/// The bytes go to a temporary file in the destination directory which is
/// then renamed over `path`, so readers never observe a half-written file.
///
/// # Errors
///
/// Returns [`PackError::FileSystem`] if the temporary file cannot be written or persisted
pub fn write_container_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp =
        NamedTempFile::new_in(directory).io_context("create temporary file", directory)?;
    temp.write_all(bytes).io_context("write", path)?;
    temp.as_file().sync_all().io_context("sync", path)?;
    temp.persist(path).map_err(|e| PackError::FileSystem {
        path: path.to_path_buf(),
        operation: "replace",
        source: e.error,
    })?;
    Ok(())
}
