//! Pack pipeline: difference, merge and extract each variant against the base image

use crate::diff::blocks::{BlockMask, DiffOptions};
use crate::diff::merge::merge_rectangles;
use crate::diff::patch::extract_patches;
use crate::io::error::{PackError, Result};
use crate::model::{Container, PixelBuffer, Variant};
use tracing::{debug, info};

/// Turn one target image into a variant of patches against `base`
///
/// # Errors
///
/// Returns an error if:
/// - The options are invalid
/// - `target` differs from `base` in dimensions or channel count
pub fn diff_variant(
    base: &PixelBuffer,
    name: &str,
    target: &PixelBuffer,
    options: &DiffOptions,
) -> Result<Variant> {
    let mask = BlockMask::scan(base, target, options)?;
    let blocks = mask.rectangles();
    let block_count = blocks.len();
    let rects = merge_rectangles(blocks);
    let patches = extract_patches(target, &rects)?;

    let variant = Variant::new(name, patches);
    debug!(
        variant = name,
        blocks = block_count,
        patches = variant.patches.len(),
        payload_bytes = variant.payload_len(),
        "Differenced variant"
    );
    Ok(variant)
}

/// Build a container from named images, using the first image as the base
///
/// The base image is also stored as a variant of its own, with no patches.
///
/// # Errors
///
/// Returns an error if:
/// - `images` is empty ([`PackError::EmptyInput`])
/// - A name is empty or repeated
/// - Any image differs from the first in dimensions or channel count
pub fn pack_images(images: Vec<(String, PixelBuffer)>, options: &DiffOptions) -> Result<Container> {
    pack_images_with(images, options, |_| {})
}

/// Same as [`pack_images`], calling `on_variant` after each variant is added
///
/// # Errors
///
/// See [`pack_images`]
pub fn pack_images_with<F>(
    images: Vec<(String, PixelBuffer)>,
    options: &DiffOptions,
    mut on_variant: F,
) -> Result<Container>
where
    F: FnMut(&Variant),
{
    options.validate()?;

    let mut images = images.into_iter();
    let (base_name, base) = images.next().ok_or(PackError::EmptyInput)?;

    let mut container = Container::new(base);
    container.push_variant(Variant::new(base_name, Vec::new()))?;
    report_last(&container, &mut on_variant);

    for (name, image) in images {
        if container.variant(&name).is_some() {
            return Err(PackError::DuplicateVariantName { name });
        }
        let variant = diff_variant(container.base(), &name, &image, options)?;
        container.push_variant(variant)?;
        report_last(&container, &mut on_variant);
    }

    info!(
        variants = container.variants().len(),
        width = container.width(),
        height = container.height(),
        channels = container.channels(),
        "Packed container"
    );
    Ok(container)
}

fn report_last<F: FnMut(&Variant)>(container: &Container, on_variant: &mut F) {
    if let Some(variant) = container.variants().last() {
        on_variant(variant);
    }
}
