//! Multi-variant image container built on block-level differencing
//!
//! Many near-identical images (character poses, UI skins, sprite variants) are
//! stored as one base image plus, for each variant, only the rectangles where
//! it differs. Any single variant can be rebuilt by reading the header, the
//! index and that variant's own block.

#![forbid(unsafe_code)]

/// Difference detection, rectangle merging and patch handling
pub mod diff;
/// Binary container encoding, random access and in-place editing
pub mod format;
/// Input/output operations and error handling
pub mod io;
/// Pixel buffers, rectangles, patches and containers
pub mod model;

pub use io::error::{PackError, Result};
