//! In-memory container: a base image and named patch lists against it

use crate::diff::patch::apply_patches;
use crate::io::configuration::FORMAT_VERSION;
use crate::io::error::{PackError, Result, corrupt};
use crate::model::geometry::Patch;
use crate::model::pixels::PixelBuffer;

/// One named image, stored as the patches that turn the base into it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Variant {
    /// Unique, non-empty name within the container
    pub name: String,
    /// Patches in insertion order
    pub patches: Vec<Patch>,
}

impl Variant {
    /// Create a variant from its name and patches
    pub fn new(name: impl Into<String>, patches: Vec<Patch>) -> Self {
        Self {
            name: name.into(),
            patches,
        }
    }

    /// Total uncompressed patch bytes
    pub fn payload_len(&self) -> usize {
        self.patches.iter().map(|patch| patch.data.len()).sum()
    }

    /// Check every patch lies inside the image and carries a full payload
    ///
    /// # Errors
    ///
    /// Returns [`PackError::CorruptData`] naming the first offending patch
    pub fn validate_patches(&self, width: u32, height: u32, channels: u8) -> Result<()> {
        for (index, patch) in self.patches.iter().enumerate() {
            if !patch.rect.fits_within(width, height) {
                return Err(corrupt(&format!(
                    "patch {index} of '{}' at {:?} exceeds {width}x{height} image",
                    self.name, patch.rect
                )));
            }
            let expected = patch.expected_len(channels);
            if patch.data.len() != expected {
                return Err(corrupt(&format!(
                    "patch {index} of '{}' holds {} bytes, expected {expected}",
                    self.name,
                    patch.data.len()
                )));
            }
        }
        Ok(())
    }
}

/// Location of one variant block inside a serialized container
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VariantIndexEntry {
    /// Variant name
    pub name: String,
    /// Absolute byte offset of the block from the start of the container
    pub offset: u32,
    /// Length of the block in bytes
    pub size: u32,
}

impl VariantIndexEntry {
    /// One past the last byte of the block
    pub const fn end(&self) -> u64 {
        self.offset as u64 + self.size as u64
    }

    /// Bytes this entry occupies in the index table
    pub const fn encoded_len(&self) -> usize {
        4 + self.name.len() + 4 + 4
    }
}

/// Base image plus named variants sharing its width, height and channels
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    /// Format revision this container was read from or will be written as
    pub version: u32,
    base: PixelBuffer,
    variants: Vec<Variant>,
}

impl Container {
    /// Start an empty container around a base image
    pub const fn new(base: PixelBuffer) -> Self {
        Self {
            version: FORMAT_VERSION,
            base,
            variants: Vec::new(),
        }
    }

    /// The full-resolution reference image
    pub const fn base(&self) -> &PixelBuffer {
        &self.base
    }

    /// Width shared by every variant
    pub const fn width(&self) -> u32 {
        self.base.width()
    }

    /// Height shared by every variant
    pub const fn height(&self) -> u32 {
        self.base.height()
    }

    /// Channel count shared by every variant
    pub const fn channels(&self) -> u8 {
        self.base.channels()
    }

    /// Variants in insertion order
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Variant names in insertion order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.variants.iter().map(|variant| variant.name.as_str())
    }

    /// Look up a variant by name
    pub fn variant(&self, name: &str) -> Option<&Variant> {
        self.variants.iter().find(|variant| variant.name == name)
    }

    /// Append a variant after validating its name and patches
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The name is empty ([`PackError::InvalidVariantName`])
    /// - The name is already used ([`PackError::DuplicateVariantName`])
    /// - A patch falls outside the image or has the wrong size ([`PackError::CorruptData`])
    pub fn push_variant(&mut self, variant: Variant) -> Result<()> {
        if variant.name.is_empty() {
            return Err(PackError::InvalidVariantName { name: variant.name });
        }
        if self.variant(&variant.name).is_some() {
            return Err(PackError::DuplicateVariantName { name: variant.name });
        }
        variant.validate_patches(self.width(), self.height(), self.channels())?;
        self.variants.push(variant);
        Ok(())
    }

    /// Rebuild the full image of a variant
    ///
    /// # Errors
    ///
    /// Returns [`PackError::VariantNotFound`] if no variant has this name
    pub fn reconstruct(&self, name: &str) -> Result<PixelBuffer> {
        let variant = self
            .variant(name)
            .ok_or_else(|| PackError::VariantNotFound {
                name: name.to_string(),
            })?;
        apply_patches(&self.base, &variant.patches)
    }
}
