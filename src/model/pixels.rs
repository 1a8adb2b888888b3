//! Owned raster shared between the differencer, patch code and codec

use crate::io::error::{PackError, Result};
use crate::model::geometry::Rectangle;
use ndarray::{ArrayView3, ArrayViewMut3, AxisDescription, Slice};

/// Interleaved 8-bit raster with 3 (RGB) or 4 (RGBA) channels
///
/// Rows are stored top to bottom with no padding, so
/// `data.len() == width * height * channels` always holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw pixel bytes after checking they describe a full raster
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidPixelBuffer`] if:
    /// - Either dimension is zero
    /// - The channel count is not 3 or 4
    /// - The byte count does not equal `width * height * channels`
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PackError::InvalidPixelBuffer {
                reason: format!("dimensions {width}x{height} must be non-zero"),
            });
        }
        if !matches!(channels, 3 | 4) {
            return Err(PackError::InvalidPixelBuffer {
                reason: format!("{channels} channels given, expected 3 or 4"),
            });
        }
        let expected = byte_len(width, height, channels);
        if data.len() != expected {
            return Err(PackError::InvalidPixelBuffer {
                reason: format!(
                    "{} bytes given, {width}x{height}x{channels} needs {expected}",
                    data.len()
                ),
            });
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Create a raster where every pixel has the same value
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidPixelBuffer`] if the dimensions are zero or
    /// the pixel does not have 3 or 4 channels
    pub fn filled(width: u32, height: u32, pixel: &[u8]) -> Result<Self> {
        let channels = u8::try_from(pixel.len()).unwrap_or(0);
        let pixel_count = width as usize * height as usize;
        Self::new(width, height, channels, pixel.repeat(pixel_count))
    }

    /// Image width in pixels
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per pixel
    pub const fn channels(&self) -> u8 {
        self.channels
    }

    /// Whether the last channel is alpha
    pub const fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    /// Raw interleaved bytes
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Consume the buffer and return its bytes
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Bytes in one row of pixels
    pub const fn stride(&self) -> usize {
        self.width as usize * self.channels as usize
    }

    /// Rectangle covering the whole image
    pub const fn bounds(&self) -> Rectangle {
        Rectangle::new(0, 0, self.width, self.height)
    }

    /// Channel values of one pixel, if it lies inside the image
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let channels = self.channels as usize;
        let start = y as usize * self.stride() + x as usize * channels;
        self.data.get(start..start + channels)
    }

    /// Paint every pixel under `rect` (clipped to the image) with `pixel`
    ///
    /// Pixels shorter than the channel count leave the remaining channels untouched.
    pub fn fill_rect(&mut self, rect: Rectangle, pixel: &[u8]) {
        let Some(clipped) = rect.clip_to(self.width, self.height) else {
            return;
        };
        let stride = self.stride();
        let channels = self.channels as usize;
        let count = channels.min(pixel.len());
        for y in clipped.y..clipped.bottom() {
            for x in clipped.x..clipped.right() {
                let start = y as usize * stride + x as usize * channels;
                if let (Some(target), Some(source)) =
                    (self.data.get_mut(start..start + count), pixel.get(..count))
                {
                    target.copy_from_slice(source);
                }
            }
        }
    }

    /// Check that `other` has the same width, height and channel count
    ///
    /// # Errors
    ///
    /// Returns [`PackError::DimensionMismatch`] when width or height differ,
    /// and [`PackError::ChannelMismatch`] when the channel counts differ
    pub fn ensure_same_shape(&self, other: &Self) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(PackError::DimensionMismatch {
                expected: (self.width, self.height),
                found: (other.width, other.height),
            });
        }
        if self.channels != other.channels {
            return Err(PackError::ChannelMismatch {
                expected: self.channels,
                found: other.channels,
            });
        }
        Ok(())
    }

    /// View the raster as a `(height, width, channels)` array
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidPixelBuffer`] if the data no longer matches the shape
    pub fn view(&self) -> Result<ArrayView3<'_, u8>> {
        ArrayView3::from_shape(self.shape(), &self.data).map_err(|e| shape_error(&e))
    }

    /// Mutable `(height, width, channels)` view of the raster
    ///
    /// # Errors
    ///
    /// Returns [`PackError::InvalidPixelBuffer`] if the data no longer matches the shape
    pub fn view_mut(&mut self) -> Result<ArrayViewMut3<'_, u8>> {
        let shape = self.shape();
        ArrayViewMut3::from_shape(shape, &mut self.data).map_err(|e| shape_error(&e))
    }

    const fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}

fn shape_error(error: &ndarray::ShapeError) -> PackError {
    PackError::InvalidPixelBuffer {
        reason: error.to_string(),
    }
}

/// Range selecting `rect` along one axis of a `(height, width, channels)` view
///
/// Meant for `slice_each_axis`; the channel axis is kept whole.
pub fn rect_axis_slice(rect: Rectangle, axis: AxisDescription) -> Slice {
    match axis.axis.index() {
        0 => Slice::from(rect.y as usize..rect.bottom() as usize),
        1 => Slice::from(rect.x as usize..rect.right() as usize),
        _ => Slice::from(..),
    }
}

/// Number of bytes a raster of the given shape occupies
pub const fn byte_len(width: u32, height: u32, channels: u8) -> usize {
    width as usize * height as usize * channels as usize
}
