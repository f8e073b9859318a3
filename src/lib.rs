//! # optimg
//!
//! An image-optimisation decision engine. Given a source image and a target
//! size/quality intent, it decides *what* transformation to perform (resize,
//! crop-to-fit, or optimise-only), *which* output format and encoding
//! quality to use, and drives an external image codec to carry it out.
//!
//! The interesting work is not the pixel pushing (that is delegated to
//! ImageMagick) but the heuristics around it: geometry from loose size
//! specs, next-gen format eligibility, quality derivation, and the
//! color-histogram test that separates illustrations from photographs to
//! pick lossless or lossy encoding for PNG sources.
//!
//! # Pipeline
//!
//! ```text
//! identify → Info → { geometry, format negotiation (+ classifier for PNG),
//!                     quality heuristic } → directive list → transform
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`transform`] | The orchestrator: `Resize`, `FitToSize`, `Optimise` behind one [`Operation`] enum |
//! | [`geometry`] | Pure target-size math: aspect-preserving resize and exact-fit crop |
//! | [`format`] | AVIF/WebP/source-format negotiation and per-format encode directives |
//! | [`quality`] | Quality tiers and the output-quality heuristic |
//! | [`classify`] | Illustration/photograph classifier over the color histogram |
//! | [`codec`] | The [`CodecBackend`] seam and the ImageMagick process backend |
//! | [`types`] | Shared value types: [`Image`], [`Info`], [`TransformResult`] |
//!
//! # Design Decisions
//!
//! ## Process-Spawned Codec Behind a Trait
//!
//! All pixel work runs in external `convert`/`identify` processes, reached
//! through the [`CodecBackend`] trait. The orchestrator only builds ordered
//! directive lists, so every decision path is unit-testable against a
//! recording mock, and a different toolkit can slot in behind the same
//! seam. The one in-process exception is decoding for classification, where
//! a subprocess round-trip per histogram would cost more than the histogram.
//!
//! ## Stateless Calls, Injected Configuration
//!
//! A [`Processor`] holds a backend plus immutable [`TransformOptions`];
//! each call reads a request-scoped [`TransformationConfig`] and touches no
//! shared mutable state. Concurrency, timeouts and retries belong to the
//! caller: run independent transformations on separate threads against one
//! shared processor.
//!
//! # Example
//!
//! ```no_run
//! use optimg::{
//!     MagickCodec, Processor, QualityTier, SupportedFormats, TransformationConfig, Image,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let codec = MagickCodec::new("convert", "identify")?;
//! let processor = Processor::new(codec);
//!
//! let source = Image::new("product-42", std::fs::read("product.jpg")?);
//! let supported = SupportedFormats::from_mime_types(["image/avif", "image/webp"]);
//! let result = processor.process(&TransformationConfig::resize(
//!     &source,
//!     "300x200",
//!     QualityTier::Default,
//!     supported,
//! ))?;
//!
//! // result.data holds the encoded output; result.mime_type is
//! // Some("image/avif"), Some("image/webp") or None (source format kept).
//! # Ok(())
//! # }
//! ```

pub mod classify;
pub mod codec;
pub mod format;
pub mod geometry;
pub mod quality;
pub mod transform;
pub mod types;

pub use codec::magick::MagickCodec;
pub use codec::{CodecBackend, CodecError, Directive};
pub use format::{OutputFormat, SupportedFormats};
pub use geometry::SizeSpecError;
pub use quality::{Quality, QualityTier};
pub use transform::{
    ExtensionContext, ExtensionHook, Operation, OperationKind, Processor, TransformError,
    TransformOptions, TransformationConfig,
};
pub use types::{Image, Info, TransformResult};
