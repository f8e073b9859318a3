//! Target-size computation from a size specification and source dimensions.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! A size specification is `W`, `WxH` or `xH`: optional width digits, an
//! optional literal `x`, optional height digits. Two policies interpret it:
//!
//! - [`resize_target`]: aspect-ratio preserving. Width wins; the other
//!   dimension is derived from the source aspect ratio.
//! - [`fit_target`]: exact-fit crop. Both dimensions are mandatory.

use crate::types::Info;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static SIZE_SPEC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d*)(?:x(\d*))?$").unwrap());

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SizeSpecError {
    #[error("could not parse dimensions from size [{0}]")]
    NoDimensions(String),
    #[error("size param should be in format WxH")]
    MissingDimension,
}

/// Split a size spec into its optional width and height components.
///
/// `None` for a component means it was absent or unparseable; `Some(0)` is
/// preserved so callers can apply their own positivity rules.
fn parse_spec(spec: &str) -> Option<(Option<u32>, Option<u32>)> {
    let captures = SIZE_SPEC.captures(spec)?;
    let dimension = |idx: usize| {
        captures
            .get(idx)
            .map(|m| m.as_str())
            .filter(|s| !s.is_empty())
            .and_then(|s| s.parse::<u32>().ok())
    };
    Some((dimension(1), dimension(2)))
}

/// Compute an aspect-ratio-preserving resize target.
///
/// If the spec names a positive width, the height is derived as
/// `width / aspect` and any explicit height is discarded; a height-only spec
/// derives the width as `height * aspect`. The aspect ratio is computed as a
/// real-valued division before the final rounding so iterative resizes do not
/// compound truncation error. The derived dimension is floored at 1: extreme
/// aspect ratios can round it to zero.
pub fn resize_target(source: &Info, spec: &str) -> Result<(u32, u32), SizeSpecError> {
    let (width, height) =
        parse_spec(spec).ok_or_else(|| SizeSpecError::NoDimensions(spec.to_string()))?;

    let aspect = f64::from(source.width) / f64::from(source.height);
    if let Some(w) = width.filter(|&w| w > 0) {
        let h = (f64::from(w) / aspect).round() as u32;
        Ok((w, h.max(1)))
    } else if let Some(h) = height.filter(|&h| h > 0) {
        let w = (f64::from(h) * aspect).round() as u32;
        Ok((w.max(1), h))
    } else {
        Err(SizeSpecError::NoDimensions(spec.to_string()))
    }
}

/// Compute an exact-fit crop target. The spec must name both dimensions.
pub fn fit_target(spec: &str) -> Result<(u32, u32), SizeSpecError> {
    let (width, height) = parse_spec(spec).ok_or(SizeSpecError::MissingDimension)?;
    match (
        width.filter(|&w| w > 0),
        height.filter(|&h| h > 0),
    ) {
        (Some(w), Some(h)) => Ok((w, h)),
        _ => Err(SizeSpecError::MissingDimension),
    }
}
