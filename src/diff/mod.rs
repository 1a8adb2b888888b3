//! Difference detection, rectangle merging and patch handling

/// Block-level difference detection under configurable tolerances
pub mod blocks;
/// Greedy rectangle coalescing
pub mod merge;
/// Building variants and containers from images
pub mod pack;
/// Patch extraction and application
pub mod patch;

pub use blocks::{DiffOptions, PixelTolerance};
