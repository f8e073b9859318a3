//! Shared value types passed between the orchestrator, the codec backend and
//! the heuristics.
//!
//! [`Image`] and [`Info`] are read-only once built: the orchestrator borrows
//! the caller's `Image`, derives an `Info` from the codec's identify call and
//! threads both through the decision functions without mutation. The one
//! exception is [`Info::illustration`], which is filled in during info
//! loading for PNG sources only (see [`crate::classify`]).

/// A source image: raw encoded bytes plus an opaque identifier used to
/// correlate log lines and errors with the originating request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub id: String,
    pub data: Vec<u8>,
}

impl Image {
    pub fn new(id: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Metadata derived from an image by the codec's identify call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Info {
    /// Codec format token, e.g. "PNG", "JPEG", "GIF".
    pub format: String,
    /// Encoding quality 0-100. Format-dependent meaning; 100 is treated as
    /// "unspecified/lossless source" by the quality heuristic.
    pub quality: u32,
    /// True when the image has no transparent pixels.
    pub opaque: bool,
    pub width: u32,
    pub height: u32,
    /// Encoded size in bytes.
    pub size: u64,
    /// Flat/graphic-art content (icons, logos, cartoons) as opposed to
    /// photographic content. Only ever computed for PNG sources; false for
    /// everything else.
    pub illustration: bool,
}

impl Info {
    /// Pixel area. Zero when either dimension is unknown.
    pub fn pixel_area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// The outcome of a transformation: output bytes plus the MIME type the
/// caller should advertise. `None` means the source format was retained and
/// the caller should fall back to whatever it already knows about the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformResult {
    pub data: Vec<u8>,
    pub mime_type: Option<&'static str>,
}
