//! Copying pixel data out of rectangles and overlaying it back onto a base image

use crate::io::error::{Result, corrupt};
use crate::model::pixels::rect_axis_slice;
use crate::model::{Patch, PixelBuffer, Rectangle};
use ndarray::ArrayView3;

/// Copy the pixels under `rect` out of `image`, row by row
///
/// # Errors
///
/// Returns [`crate::PackError::CorruptData`] if `rect` does not fit inside the image
pub fn extract_patch(image: &PixelBuffer, rect: Rectangle) -> Result<Patch> {
    if !rect.fits_within(image.width(), image.height()) {
        return Err(corrupt(&format!(
            "rectangle {rect:?} exceeds {}x{} image",
            image.width(),
            image.height()
        )));
    }

    let view = image.view()?;
    let region = view.slice_each_axis(|axis| rect_axis_slice(rect, axis));

    // Logical iteration order is row-major, matching the stored layout
    let data = region.iter().copied().collect();
    Ok(Patch { rect, data })
}

/// Extract one patch per rectangle, preserving order
///
/// # Errors
///
/// Returns an error if any rectangle falls outside the image
pub fn extract_patches(image: &PixelBuffer, rects: &[Rectangle]) -> Result<Vec<Patch>> {
    rects
        .iter()
        .map(|&rect| extract_patch(image, rect))
        .collect()
}

/// Reconstruct a variant by overlaying `patches` onto a copy of `base`
///
/// Patches are written in order, so later patches win where they overlap.
/// The base buffer itself is never modified.
///
/// # Errors
///
/// Returns [`crate::PackError::CorruptData`] if a patch lies outside the image
/// or its payload size does not match its rectangle
pub fn apply_patches(base: &PixelBuffer, patches: &[Patch]) -> Result<PixelBuffer> {
    let mut output = base.clone();
    let channels = output.channels();
    let (width, height) = (output.width(), output.height());

    {
        let mut view = output.view_mut()?;
        for patch in patches {
            let rect = patch.rect;
            if !rect.fits_within(width, height) {
                return Err(corrupt(&format!(
                    "patch {rect:?} exceeds {width}x{height} image"
                )));
            }
            if patch.data.len() != patch.expected_len(channels) {
                return Err(corrupt(&format!(
                    "patch {rect:?} holds {} bytes, expected {}",
                    patch.data.len(),
                    patch.expected_len(channels)
                )));
            }
            let source = ArrayView3::from_shape(
                (
                    rect.height as usize,
                    rect.width as usize,
                    channels as usize,
                ),
                &patch.data,
            )
            .map_err(|e| corrupt(&e))?;

            view.slice_each_axis_mut(|axis| rect_axis_slice(rect, axis))
                .assign(&source);
        }
    }

    Ok(output)
}
