//! Codec invocation abstraction.
//!
//! The [`CodecBackend`] trait defines the three operations the engine needs
//! from an external image toolkit: identify, transform and decode. The
//! production implementation is [`MagickCodec`](magick::MagickCodec), which
//! spawns the ImageMagick `convert`/`identify` binaries; tests use a
//! recording mock.
//!
//! Transformations are expressed as an ordered list of [`Directive`]s.
//! Ordering is preserved exactly through to the external process: codecs
//! are order-sensitive, and later directives override earlier ones for the
//! same option.

pub mod magick;

use crate::format::OutputFormat;
use crate::types::{Image, Info};
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("codec binary not found: {0}")]
    BinaryNotFound(String),
    #[error("[{id}] failed to run {command}: {source}")]
    Exec {
        id: String,
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("[{id}] {command} exited with {status}: {stderr}")]
    Failed {
        id: String,
        command: String,
        status: String,
        stderr: String,
    },
    #[error("[{id}] unexpected identify output: {output}")]
    Metadata { id: String, output: String },
    #[error("[{id}] decode failed: {reason}")]
    Decode { id: String, reason: String },
}

/// A single codec-facing instruction: an option name plus an optional value,
/// e.g. `-resize 300x200` or the bare `-strip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub value: Option<String>,
}

impl Directive {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }

    /// Append this directive's argv tokens in order.
    pub fn push_args(&self, args: &mut Vec<String>) {
        args.push(self.name.clone());
        if let Some(value) = &self.value {
            args.push(value.clone());
        }
    }
}

/// Quality- and format-neutral tuning applied to every transformation.
const BASELINE: &[(&str, &str)] = &[
    ("-dither", "None"),
    ("-define", "jpeg:fancy-upsampling=off"),
    ("-define", "png:compression-filter=5"),
    ("-define", "png:compression-level=9"),
    ("-define", "png:compression-strategy=0"),
    (
        "-define",
        "png:exclude-chunk=bKGD,cHRM,EXIF,gAMA,iCCP,iTXt,sRGB,tEXt,zCCP,zTXt,date",
    ),
    ("-define", "heic:speed=6"),
    ("-interlace", "None"),
    ("-colorspace", "sRGB"),
    ("-sampling-factor", "4:2:0"),
    ("+profile", "!icc,*"),
];

/// The static baseline tuning directive set, in emission order.
pub fn baseline_directives() -> Vec<Directive> {
    BASELINE
        .iter()
        .map(|&(name, value)| Directive::new(name, value))
        .collect()
}

/// An external image codec.
///
/// Implementations must be usable from multiple threads at once: each call
/// is independent and blocking, and callers wanting concurrency run separate
/// transformations on separate threads against one shared backend.
pub trait CodecBackend: Sync {
    /// Read format, quality, opacity and dimensions from the encoded bytes.
    fn identify(&self, image: &Image) -> Result<Info, CodecError>;

    /// Run the transformation described by `directives`, re-encoding into
    /// `output`, and return the produced bytes.
    fn transform(
        &self,
        image: &Image,
        directives: &[Directive],
        output: OutputFormat,
    ) -> Result<Vec<u8>, CodecError>;

    /// Decode the image into pixels. Used by the illustration classifier.
    fn decode(&self, image: &Image) -> Result<DynamicImage, CodecError>;
}
