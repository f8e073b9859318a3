//! Output-format negotiation.
//!
//! Decides between the next-gen formats and keeping the source format, from
//! the source properties, the computed target size and the client's declared
//! support set. Also derives the per-format encode directives that are
//! independent of the format choice itself.

use crate::codec::Directive;
use crate::types::Info;

/// WebP hard encoder limit on each axis.
pub const MAX_WEBP_WIDTH: u32 = 16383;
pub const MAX_WEBP_HEIGHT: u32 = 16383;

/// Maximum target pixel area eligible for AVIF output. Encode cost and
/// memory grow steeply with resolution, and past this point WebP wins on
/// quality per byte.
pub const MAX_AVIF_TARGET_AREA: u64 = 2000 * 2000;

/// The negotiated output format for a transformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Avif,
    Webp,
    /// Re-encode in the source's native format.
    Source,
}

impl OutputFormat {
    /// The MIME type the caller should advertise. `None` means the source
    /// format was retained.
    pub fn mime_type(self) -> Option<&'static str> {
        match self {
            OutputFormat::Avif => Some("image/avif"),
            OutputFormat::Webp => Some("image/webp"),
            OutputFormat::Source => None,
        }
    }
}

/// Output formats the client declared support for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupportedFormats {
    pub avif: bool,
    pub webp: bool,
}

impl SupportedFormats {
    /// Build from a list of MIME types, e.g. an Accept header split on
    /// commas. Unknown types are ignored.
    pub fn from_mime_types<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut supported = Self::default();
        for mime in types {
            match mime.as_ref().trim() {
                "image/avif" => supported.avif = true,
                "image/webp" => supported.webp = true,
                _ => {}
            }
        }
        supported
    }
}

/// Pick the output format, in priority order: AVIF, WebP, source format.
///
/// AVIF is excluded for GIF sources (animation), illustration-classified
/// sources (lossless WebP beats lossy AVIF there) and targets at or above
/// [`MAX_AVIF_TARGET_AREA`] or with an unknown size. WebP is excluded when
/// either source axis reaches the encoder's hard dimension limit.
pub fn choose_output_format(
    source: &Info,
    target: &Info,
    supported: &SupportedFormats,
) -> OutputFormat {
    let target_area = target.pixel_area();
    let avif = supported.avif
        && source.format != "GIF"
        && !source.illustration
        && target_area != 0
        && target_area < MAX_AVIF_TARGET_AREA;
    let webp =
        supported.webp && source.width < MAX_WEBP_WIDTH && source.height < MAX_WEBP_HEIGHT;

    if avif {
        OutputFormat::Avif
    } else if webp {
        OutputFormat::Webp
    } else {
        OutputFormat::Source
    }
}

/// Encode directives derived from the source alone, independent of the
/// negotiated format: lossless output for illustrations, and the heavier
/// (better compressing) WebP effort method for everything that is not an
/// animated GIF.
pub fn encode_directives(source: &Info) -> Vec<Directive> {
    let mut directives = Vec::new();
    if source.illustration {
        directives.push(Directive::new("-define", "webp:lossless=true"));
    }
    if source.format != "GIF" {
        directives.push(Directive::new("-define", "webp:method=6"));
    }
    directives
}
