//! Shared data model passed between the differencer, patch code and codec

/// Named variants, index entries and the in-memory container
pub mod container;
/// Rectangles and pixel patches
pub mod geometry;
/// Owned interleaved rasters
pub mod pixels;

pub use container::{Container, Variant, VariantIndexEntry};
pub use geometry::{Patch, Rectangle};
pub use pixels::PixelBuffer;
