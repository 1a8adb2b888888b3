//! Conversion between encoded images (PNG, JPEG, WebP) and pixel buffers

use crate::io::error::{PackError, Result};
use crate::model::PixelBuffer;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Channel layout images are decoded into
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ChannelLayout {
    /// Four channels, alpha last
    #[default]
    Rgba,
    /// Three channels, alpha discarded
    Rgb,
}

impl ChannelLayout {
    /// Bytes per pixel for this layout
    pub const fn channels(self) -> u8 {
        match self {
            Self::Rgba => 4,
            Self::Rgb => 3,
        }
    }
}

fn from_dynamic(image: &DynamicImage, layout: ChannelLayout) -> Result<PixelBuffer> {
    let (width, height) = (image.width(), image.height());
    let data = match layout {
        ChannelLayout::Rgba => image.to_rgba8().into_raw(),
        ChannelLayout::Rgb => image.to_rgb8().into_raw(),
    };
    PixelBuffer::new(width, height, layout.channels(), data)
}

fn to_dynamic(buffer: &PixelBuffer) -> Result<DynamicImage> {
    let (width, height) = (buffer.width(), buffer.height());
    let data = buffer.data().to_vec();
    let image = if buffer.has_alpha() {
        RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8)
    } else {
        RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
    };
    image.ok_or_else(|| PackError::InvalidPixelBuffer {
        reason: format!("{width}x{height} buffer does not match its data length"),
    })
}

// JPEG has no alpha channel
fn prepare_for_format(image: DynamicImage, format: ImageFormat) -> DynamicImage {
    if format == ImageFormat::Jpeg && image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    }
}

/// Decode an encoded image held in memory
///
/// # Errors
///
/// Returns [`PackError::ImageLoad`] if the bytes are not a supported image
pub fn decode_pixel_buffer(bytes: &[u8], layout: ChannelLayout) -> Result<PixelBuffer> {
    let image = image::load_from_memory(bytes).map_err(|e| PackError::ImageLoad {
        path: "<memory>".into(),
        source: e,
    })?;
    from_dynamic(&image, layout)
}

/// Encode a pixel buffer in the given format
///
/// # Errors
///
/// Returns [`PackError::ImageExport`] if encoding fails
pub fn encode_pixel_buffer(buffer: &PixelBuffer, format: ImageFormat) -> Result<Vec<u8>> {
    let image = prepare_for_format(to_dynamic(buffer)?, format);
    let mut cursor = Cursor::new(Vec::new());
    image
        .write_to(&mut cursor, format)
        .map_err(|e| PackError::ImageExport {
            path: "<memory>".into(),
            source: e,
        })?;
    Ok(cursor.into_inner())
}

/// Load an image file into a pixel buffer
///
/// # Errors
///
/// Returns [`PackError::ImageLoad`] if the file cannot be opened or decoded
pub fn load_pixel_buffer(path: &Path, layout: ChannelLayout) -> Result<PixelBuffer> {
    let image = image::open(path).map_err(|e| PackError::ImageLoad {
        path: path.to_path_buf(),
        source: e,
    })?;
    from_dynamic(&image, layout)
}

/// Save a pixel buffer, choosing the format from the file extension
///
/// # Errors
///
/// Returns an error if:
/// - The extension does not name a supported format
/// - The parent directory cannot be created
/// - Encoding or writing fails
pub fn save_pixel_buffer(buffer: &PixelBuffer, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path).map_err(|e| PackError::ImageExport {
        path: path.to_path_buf(),
        source: e,
    })?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| PackError::FileSystem {
                path: parent.to_path_buf(),
                operation: "create directory",
                source: e,
            })?;
        }
    }

    prepare_for_format(to_dynamic(buffer)?, format)
        .save_with_format(path, format)
        .map_err(|e| PackError::ImageExport {
            path: path.to_path_buf(),
            source: e,
        })
}
