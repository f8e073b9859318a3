//! Illustration/photograph classification.
//!
//! Decides whether an image is cartoon-like content (icons, logos,
//! illustrations) rather than a banner, product shot or photo. The verdict
//! drives the lossy-vs-lossless choice when converting PNG sources to a
//! next-gen format, and is only ever computed for PNG sources.
//!
//! Illustrations concentrate most of their pixel mass in very few flat
//! colors; photographs spread it across many similar colors. The test walks
//! the color histogram in descending frequency and counts how many distinct
//! colors it takes to cover half the pixels, with a dominant background
//! color excluded from the mass it has to cover.

use crate::codec::{CodecBackend, CodecError};
use crate::types::{Image, Info};
use image::DynamicImage;
use std::collections::HashMap;

/// PNGs below this byte size are overwhelmingly icons and illustrations.
const SMALL_IMAGE_BYTES: u64 = 20 * 1024;

/// PNGs above this byte size are overwhelmingly photographic.
const LARGE_IMAGE_BYTES: u64 = 1024 * 1024;

/// A byte-per-pixel density above this implies photographic detail.
const MAX_ILLUSTRATION_DENSITY: f64 = 1.0;

/// Pixel count above which the image is downscaled before the histogram is
/// computed. Bounds histogram cost only; the verdict is insensitive to it.
const MAX_HISTOGRAM_PIXELS: u64 = 500 * 500;

/// Working width for the bounded downscale.
const SCALED_WIDTH: u32 = 500;

/// More distinct colors than this is never a flat illustration.
const MAX_ILLUSTRATION_COLORS: usize = 30_000;

/// Classify the image. `info` must be the identify result for `image`.
pub fn is_illustration<B: CodecBackend + ?Sized>(
    backend: &B,
    image: &Image,
    info: &Info,
) -> Result<bool, CodecError> {
    let byte_size = image.data.len() as u64;
    if byte_size < SMALL_IMAGE_BYTES {
        return Ok(true);
    }
    if byte_size > LARGE_IMAGE_BYTES {
        return Ok(false);
    }
    if byte_size as f64 / info.pixel_area() as f64 > MAX_ILLUSTRATION_DENSITY {
        return Ok(false);
    }

    let mut decoded = backend.decode(image)?;
    if info.pixel_area() > MAX_HISTOGRAM_PIXELS {
        let aspect = f64::from(info.width) / f64::from(info.height);
        let height = ((f64::from(SCALED_WIDTH) / aspect) as u32).max(1);
        decoded = decoded.thumbnail_exact(SCALED_WIDTH, height);
    }

    let counts = color_counts(&decoded);
    if counts.len() > MAX_ILLUSTRATION_COLORS {
        return Ok(false);
    }

    let total_pixels = u64::from(decoded.width()) * u64::from(decoded.height());
    let mut sorted: Vec<u64> = counts.into_values().collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    Ok(concentrates_in_few_colors(&sorted, total_pixels))
}

/// Per-color pixel counts over the RGBA pixels.
fn color_counts(decoded: &DynamicImage) -> HashMap<[u8; 4], u64> {
    let rgba = decoded.to_rgba8();
    let mut counts: HashMap<[u8; 4], u64> = HashMap::new();
    for pixel in rgba.pixels() {
        *counts.entry(pixel.0).or_insert(0) += 1;
    }
    counts
}

/// The coverage walk over per-color pixel counts, sorted descending.
///
/// If the most frequent color covers at least 10% of the pixels it is
/// treated as a background: it is excluded from the accumulated coverage and
/// the 50% threshold is recomputed over the remaining pixel mass. The image
/// is an illustration when fewer than 10 colors reach the threshold, or when
/// that count is at most 2% of all distinct colors.
fn concentrates_in_few_colors(counts: &[u64], total_pixels: u64) -> bool {
    if counts.is_empty() {
        return false;
    }

    let total = total_pixels as f64;
    let ten_percent = (total * 0.1) as u64;
    let mut half = (total * 0.5) as u64;
    let mut has_background = false;
    let mut covered: u64 = 0;
    let mut last_index = 0;

    for (index, &count) in counts.iter().enumerate() {
        last_index = index;
        if index == 0 && count >= ten_percent {
            has_background = true;
            half = ((total - count as f64) * 0.5) as u64;
            continue;
        }
        if covered > half {
            break;
        }
        covered += count;
    }

    let mut colors_in_half = last_index + 1;
    if has_background {
        colors_in_half -= 1;
    }

    colors_in_half < 10
        || colors_in_half as f64 / counts.len() as f64 <= 0.02
}
