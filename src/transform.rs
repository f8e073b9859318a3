//! Transformation orchestration.
//!
//! [`Processor`] composes the decision functions (geometry, format
//! negotiation, quality heuristic, classification) into a single codec
//! invocation per call. Three operations exist, expressed as one exhaustive
//! [`Operation`] enum: aspect-preserving resize, exact-fit crop, and
//! optimise-only re-encoding.
//!
//! Every call is stateless: the orchestrator reads the request-scoped
//! [`TransformationConfig`], derives an [`Info`] from the codec, builds an
//! ordered directive list and hands it to the backend. No locks are held
//! across the codec call and nothing is retried.

use crate::classify;
use crate::codec::{self, CodecBackend, CodecError, Directive};
use crate::format::{OutputFormat, SupportedFormats, choose_output_format, encode_directives};
use crate::geometry::{self, SizeSpecError};
use crate::quality::{QualityTier, output_quality};
use crate::types::{Image, Info, TransformResult};
use log::warn;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransformError {
    /// The size specification cannot be used for the requested operation.
    /// Returned before any codec invocation.
    #[error(transparent)]
    Input(#[from] SizeSpecError),
    /// The external codec failed during identify or transform.
    #[error(transparent)]
    Processing(#[from] CodecError),
}

/// The requested transformation, with its operation-specific payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Resize preserving the source aspect ratio. The size spec is `W`,
    /// `WxH` or `xH`; width wins when both are given.
    Resize { size: String },
    /// Resize to the exact size, center-cropping whatever falls outside the
    /// bound. The size spec must be `WxH`.
    FitToSize { size: String },
    /// Re-encode only, keeping the source dimensions.
    Optimise,
}

/// Operation discriminant handed to extension hooks and used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Resize,
    FitToSize,
    Optimise,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Resize => "resize",
            OperationKind::FitToSize => "fit",
            OperationKind::Optimise => "optimise",
        }
    }
}

/// A request-scoped transformation description. Constructed per call,
/// read-only, discarded after the call.
#[derive(Debug, Clone)]
pub struct TransformationConfig<'a> {
    pub src: &'a Image,
    pub operation: Operation,
    pub tier: QualityTier,
    pub supported: SupportedFormats,
}

impl<'a> TransformationConfig<'a> {
    pub fn resize(
        src: &'a Image,
        size: impl Into<String>,
        tier: QualityTier,
        supported: SupportedFormats,
    ) -> Self {
        Self {
            src,
            operation: Operation::Resize { size: size.into() },
            tier,
            supported,
        }
    }

    pub fn fit_to_size(
        src: &'a Image,
        size: impl Into<String>,
        tier: QualityTier,
        supported: SupportedFormats,
    ) -> Self {
        Self {
            src,
            operation: Operation::FitToSize { size: size.into() },
            tier,
            supported,
        }
    }

    pub fn optimise(src: &'a Image, tier: QualityTier, supported: SupportedFormats) -> Self {
        Self {
            src,
            operation: Operation::Optimise,
            tier,
            supported,
        }
    }
}

/// Everything an extension hook may inspect when contributing directives.
/// Target fields are filled on a best-effort basis; Optimise copies the
/// source dimensions and a failed resize parse leaves them zero.
pub struct ExtensionContext<'a> {
    pub operation: OperationKind,
    pub image: &'a Image,
    pub source: &'a Info,
    pub target: &'a Info,
}

/// Caller-supplied hook returning extra directives per invocation.
pub type ExtensionHook = Box<dyn Fn(&ExtensionContext<'_>) -> Vec<Directive> + Send + Sync>;

/// Process-wide orchestrator configuration, injected at construction and
/// immutable afterwards.
#[derive(Default)]
pub struct TransformOptions {
    /// Static directives appended to every invocation, in order, after the
    /// quality directive.
    pub additional_directives: Vec<Directive>,
    /// Optional per-invocation directive hook, appended after
    /// `additional_directives`.
    pub extension: Option<ExtensionHook>,
}

/// The transformation orchestrator.
pub struct Processor<B> {
    backend: B,
    options: TransformOptions,
}

impl<B: CodecBackend> Processor<B> {
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, TransformOptions::default())
    }

    pub fn with_options(backend: B, options: TransformOptions) -> Self {
        Self { backend, options }
    }

    /// The injected codec backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run the configured operation and return the output bytes plus the
    /// MIME type the caller should advertise.
    pub fn process(
        &self,
        config: &TransformationConfig<'_>,
    ) -> Result<TransformResult, TransformError> {
        match &config.operation {
            Operation::Resize { size } => self.resize(config, size),
            Operation::FitToSize { size } => self.fit_to_size(config, size),
            Operation::Optimise => self.optimise(config),
        }
    }

    fn resize(
        &self,
        config: &TransformationConfig<'_>,
        size: &str,
    ) -> Result<TransformResult, TransformError> {
        let source = self.load_info(config.src)?;

        // A spec that fails to parse still goes to the codec as-is; the
        // codec's own rejection surfaces as a processing error. Revisit if
        // this should fail closed instead.
        let target = match geometry::resize_target(&source, size) {
            Ok((width, height)) => Info {
                opaque: source.opaque,
                width,
                height,
                ..Info::default()
            },
            Err(err) => {
                warn!(
                    "[{}] could not calculate target size for [{size}]: {err}",
                    config.src.id
                );
                Info {
                    opaque: source.opaque,
                    ..Info::default()
                }
            }
        };

        let output = choose_output_format(&source, &target, &config.supported);

        let mut directives = vec![Directive::new("-resize", size)];
        directives.extend(self.shared_directives(
            OperationKind::Resize,
            config,
            &source,
            &target,
            output,
        ));
        directives.extend(encode_directives(&source));

        let data = self.backend.transform(config.src, &directives, output)?;
        Ok(TransformResult {
            data,
            mime_type: output.mime_type(),
        })
    }

    fn fit_to_size(
        &self,
        config: &TransformationConfig<'_>,
        size: &str,
    ) -> Result<TransformResult, TransformError> {
        // Exact-fit needs both dimensions; reject before touching the codec.
        let (width, height) = geometry::fit_target(size)?;

        let source = self.load_info(config.src)?;
        let target = Info {
            opaque: source.opaque,
            width,
            height,
            ..Info::default()
        };
        let output = choose_output_format(&source, &target, &config.supported);
        let extent = format!("{width}x{height}");

        let mut directives = vec![Directive::new("-resize", format!("{extent}^"))];
        directives.extend(self.shared_directives(
            OperationKind::FitToSize,
            config,
            &source,
            &target,
            output,
        ));
        directives.push(Directive::new("-gravity", "center"));
        directives.push(Directive::new("-extent", extent));
        directives.extend(encode_directives(&source));

        let data = self.backend.transform(config.src, &directives, output)?;
        Ok(TransformResult {
            data,
            mime_type: output.mime_type(),
        })
    }

    fn optimise(
        &self,
        config: &TransformationConfig<'_>,
    ) -> Result<TransformResult, TransformError> {
        let source = self.load_info(config.src)?;
        let target = Info {
            opaque: source.opaque,
            width: source.width,
            height: source.height,
            ..Info::default()
        };
        let output = choose_output_format(&source, &target, &config.supported);

        let mut directives = self.shared_directives(
            OperationKind::Optimise,
            config,
            &source,
            &target,
            output,
        );
        directives.extend(encode_directives(&source));

        let data = self.backend.transform(config.src, &directives, output)?;

        // Never degrade the payload: an optimised result that grew is
        // discarded in favour of the original bytes.
        if data.len() > config.src.data.len() {
            warn!(
                "[{}] optimised size [{}] is larger than original [{}], falling back to original",
                config.src.id,
                data.len(),
                config.src.data.len()
            );
            return Ok(TransformResult {
                data: config.src.data.clone(),
                mime_type: None,
            });
        }

        Ok(TransformResult {
            data,
            mime_type: output.mime_type(),
        })
    }

    /// Identify the source and apply the PNG rules: identify reports the
    /// encoder default quality for PNG, which reads as "unspecified", and
    /// PNG is the one format where the lossless-vs-lossy decision needs the
    /// illustration verdict.
    fn load_info(&self, image: &Image) -> Result<Info, CodecError> {
        let mut info = self.backend.identify(image)?;
        if info.format == "PNG" {
            info.quality = 100;
            info.illustration = classify::is_illustration(&self.backend, image, &info)?;
        }
        Ok(info)
    }

    /// The directive tail shared by all operations: quality, static extras,
    /// hook extras, then the baseline tuning set. Ordering matters: later
    /// directives override earlier ones for the same option.
    fn shared_directives(
        &self,
        operation: OperationKind,
        config: &TransformationConfig<'_>,
        source: &Info,
        target: &Info,
        output: OutputFormat,
    ) -> Vec<Directive> {
        let mut directives = Vec::new();
        if let Some(quality) = output_quality(source, config.tier, output) {
            directives.push(Directive::new("-quality", quality.value().to_string()));
        }
        directives.extend(self.options.additional_directives.iter().cloned());
        if let Some(hook) = &self.options.extension {
            let context = ExtensionContext {
                operation,
                image: config.src,
                source,
                target,
            };
            directives.extend(hook(&context));
        }
        directives.extend(codec::baseline_directives());
        directives
    }
}
