//! Grid-based difference detection between a base image and a variant
//!
//! Both images are cut into `block_size x block_size` cells (edge cells are
//! clipped, never padded). Each cell is compared pixel by pixel under a
//! [`PixelTolerance`] and flagged once its count of changed pixels exceeds the
//! allowance given by [`DiffOptions::tolerance_ratio`].

use crate::io::configuration::{
    DEFAULT_BLOCK_SIZE, DEFAULT_COLOR_DISTANCE, DEFAULT_DIFF_THRESHOLD, DEFAULT_TOLERANCE_RATIO,
};
use crate::io::error::{Result, invalid_parameter};
use crate::model::pixels::rect_axis_slice;
use crate::model::{PixelBuffer, Rectangle};
use bitvec::prelude::*;
use ndarray::{ArrayView1, ArrayView3};

/// Rule deciding whether a single pixel changed
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PixelTolerance {
    /// Changed if any channel (alpha included) moves by more than `threshold`
    PerChannel {
        /// Largest per-channel difference still treated as equal
        threshold: u8,
    },
    /// Changed if the Euclidean RGB distance exceeds `threshold`; alpha is ignored
    ColorDistance {
        /// Largest RGB distance still treated as equal
        threshold: f64,
    },
}

impl PixelTolerance {
    /// Compare two pixels given as channel vectors
    pub fn differs(&self, a: ArrayView1<'_, u8>, b: ArrayView1<'_, u8>) -> bool {
        match *self {
            Self::PerChannel { threshold } => a
                .iter()
                .zip(b.iter())
                .any(|(&x, &y)| x.abs_diff(y) > threshold),
            Self::ColorDistance { threshold } => {
                let squared: u32 = a
                    .iter()
                    .zip(b.iter())
                    .take(3)
                    .map(|(&x, &y)| u32::from(x.abs_diff(y)).pow(2))
                    .sum();
                f64::from(squared).sqrt() > threshold
            }
        }
    }
}

/// Parameters for block differencing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiffOptions {
    /// Edge length of the scanned cells in pixels
    pub block_size: u32,
    /// Per-pixel comparison rule
    pub tolerance: PixelTolerance,
    /// Fraction of a cell's pixels that may change before the cell is reported
    pub tolerance_ratio: f64,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self::from_thresholds(
            DEFAULT_BLOCK_SIZE,
            DEFAULT_DIFF_THRESHOLD,
            DEFAULT_COLOR_DISTANCE,
            DEFAULT_TOLERANCE_RATIO,
        )
    }
}

impl DiffOptions {
    /// Build options from raw thresholds
    ///
    /// A non-zero `color_distance` takes precedence over `diff_threshold`.
    pub fn from_thresholds(
        block_size: u32,
        diff_threshold: u8,
        color_distance: f64,
        tolerance_ratio: f64,
    ) -> Self {
        let tolerance = if color_distance.abs() < f64::EPSILON {
            PixelTolerance::PerChannel {
                threshold: diff_threshold,
            }
        } else {
            PixelTolerance::ColorDistance {
                threshold: color_distance,
            }
        };

        Self {
            block_size,
            tolerance,
            tolerance_ratio,
        }
    }

    /// Strict comparison: any changed byte marks its block
    pub const fn strict(block_size: u32) -> Self {
        Self {
            block_size,
            tolerance: PixelTolerance::PerChannel { threshold: 0 },
            tolerance_ratio: 0.0,
        }
    }

    /// Check the options describe a usable scan
    ///
    /// # Errors
    ///
    /// Returns [`crate::PackError::InvalidParameter`] if:
    /// - `block_size` is zero
    /// - `tolerance_ratio` is not a finite value in `[0, 1]`
    /// - The colour distance threshold is negative or not finite
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(invalid_parameter(
                "block_size",
                &self.block_size,
                &"must be at least 1",
            ));
        }
        if !(0.0..=1.0).contains(&self.tolerance_ratio) {
            return Err(invalid_parameter(
                "tolerance_ratio",
                &self.tolerance_ratio,
                &"must be between 0 and 1",
            ));
        }
        if let PixelTolerance::ColorDistance { threshold } = self.tolerance {
            if !threshold.is_finite() || threshold < 0.0 {
                return Err(invalid_parameter(
                    "color_distance",
                    &threshold,
                    &"must be a finite, non-negative distance",
                ));
            }
        }
        Ok(())
    }

    /// Changed pixels a cell of `cell_pixels` may hold and still be identical
    pub fn allowance(&self, cell_pixels: usize) -> usize {
        (cell_pixels as f64 * self.tolerance_ratio).floor() as usize
    }
}

/// Per-cell verdicts of one scan, stored row-major
#[derive(Clone, Debug)]
pub struct BlockMask {
    block_size: u32,
    width: u32,
    height: u32,
    columns: usize,
    rows: usize,
    bits: BitVec,
}

impl BlockMask {
    /// Scan two images cell by cell
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The options are invalid
    /// - The images differ in width or height ([`crate::PackError::DimensionMismatch`])
    /// - The images differ in channel count ([`crate::PackError::ChannelMismatch`])
    pub fn scan(base: &PixelBuffer, target: &PixelBuffer, options: &DiffOptions) -> Result<Self> {
        options.validate()?;
        base.ensure_same_shape(target)?;

        let block_size = options.block_size;
        let columns = base.width().div_ceil(block_size) as usize;
        let rows = base.height().div_ceil(block_size) as usize;
        let mut bits = bitvec![0; columns * rows];

        let base_view = base.view()?;
        let target_view = target.view()?;

        for row in 0..rows {
            for column in 0..columns {
                let cell = cell_rect(column, row, block_size, base.width(), base.height());
                let limit = options.allowance(cell.area() as usize);

                let differs = cell_differs(
                    base_view.slice_each_axis(|axis| rect_axis_slice(cell, axis)),
                    target_view.slice_each_axis(|axis| rect_axis_slice(cell, axis)),
                    &options.tolerance,
                    limit,
                );
                bits.set(row * columns + column, differs);
            }
        }

        Ok(Self {
            block_size,
            width: base.width(),
            height: base.height(),
            columns,
            rows,
            bits,
        })
    }

    /// Cells per grid row
    pub const fn columns(&self) -> usize {
        self.columns
    }

    /// Cells per grid column
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Number of cells flagged as different
    pub fn differing_count(&self) -> usize {
        self.bits.count_ones()
    }

    /// Whether no cell differs
    pub fn is_clean(&self) -> bool {
        self.bits.not_any()
    }

    /// Verdict for one cell, `None` outside the grid
    pub fn is_different(&self, column: usize, row: usize) -> Option<bool> {
        if column >= self.columns || row >= self.rows {
            return None;
        }
        self.bits.get(row * self.columns + column).map(|bit| *bit)
    }

    /// Pixel rectangles of the flagged cells, top-to-bottom then left-to-right
    pub fn rectangles(&self) -> Vec<Rectangle> {
        self.bits
            .iter_ones()
            .map(|index| {
                cell_rect(
                    index % self.columns,
                    index / self.columns,
                    self.block_size,
                    self.width,
                    self.height,
                )
            })
            .collect()
    }
}

/// Rectangles of every differing block between `base` and `target`, in row-major order
///
/// # Errors
///
/// Returns an error if the options are invalid or the images differ in shape
pub fn difference_blocks(
    base: &PixelBuffer,
    target: &PixelBuffer,
    options: &DiffOptions,
) -> Result<Vec<Rectangle>> {
    Ok(BlockMask::scan(base, target, options)?.rectangles())
}

fn cell_rect(column: usize, row: usize, block_size: u32, width: u32, height: u32) -> Rectangle {
    let x = column as u32 * block_size;
    let y = row as u32 * block_size;
    Rectangle::new(x, y, block_size.min(width - x), block_size.min(height - y))
}

// Stops scanning as soon as the allowance is exceeded
fn cell_differs(
    base: ArrayView3<'_, u8>,
    target: ArrayView3<'_, u8>,
    tolerance: &PixelTolerance,
    limit: usize,
) -> bool {
    let mut changed = 0usize;
    for (a, b) in base.rows().into_iter().zip(target.rows()) {
        if tolerance.differs(a, b) {
            changed += 1;
            if changed > limit {
                return true;
            }
        }
    }
    false
}
