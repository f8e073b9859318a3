//! ImageMagick process backend.
//!
//! Spawns the external `convert` and `identify` binaries, streaming the
//! image bytes over stdin and capturing stdout/stderr in full. Both binary
//! paths are resolved at construction so a missing installation fails fast
//! instead of on the first request.
//!
//! Decoding for the illustration classifier stays in-process via the
//! `image` crate; a subprocess round-trip per histogram would dwarf the
//! histogram itself.

use super::{CodecBackend, CodecError, Directive};
use crate::format::OutputFormat;
use crate::types::{Image, Info};
use image::DynamicImage;
use log::debug;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Identify format string: format token, quality, opacity, width, height.
const IDENTIFY_FORMAT: &str = "%m %Q %[opaque] %w %h";

#[derive(Debug)]
pub struct MagickCodec {
    convert_cmd: PathBuf,
    identify_cmd: PathBuf,
}

impl MagickCodec {
    /// Create a backend from the `convert` and `identify` command names or
    /// paths. Bare names are resolved against `PATH`.
    pub fn new(convert: &str, identify: &str) -> Result<Self, CodecError> {
        Ok(Self {
            convert_cmd: resolve_binary(convert)?,
            identify_cmd: resolve_binary(identify)?,
        })
    }

    fn run(
        &self,
        command: &Path,
        args: &[String],
        input: &[u8],
        id: &str,
    ) -> Result<Vec<u8>, CodecError> {
        let command_name = command.display().to_string();
        debug!("[{id}] running {command_name}, args {args:?}");

        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CodecError::Exec {
                id: id.to_string(),
                command: command_name.clone(),
                source,
            })?;

        // stdin is always piped; the take can only fail if it was consumed.
        let mut stdin = child.stdin.take().ok_or_else(|| CodecError::Exec {
            id: id.to_string(),
            command: command_name.clone(),
            source: std::io::Error::other("stdin unavailable"),
        })?;

        // Feed stdin from a scoped thread while draining stdout, otherwise a
        // large image can deadlock both pipes. A write error (e.g. the codec
        // exiting early) is reported through the exit status instead.
        let output = std::thread::scope(|scope| {
            scope.spawn(move || {
                let _ = stdin.write_all(input);
            });
            child.wait_with_output()
        })
        .map_err(|source| CodecError::Exec {
            id: id.to_string(),
            command: command_name.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(CodecError::Failed {
                id: id.to_string(),
                command: command_name,
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }
}

impl CodecBackend for MagickCodec {
    fn identify(&self, image: &Image) -> Result<Info, CodecError> {
        let args = vec![
            "-format".to_string(),
            IDENTIFY_FORMAT.to_string(),
            "-".to_string(),
        ];
        let stdout = self.run(&self.identify_cmd, &args, &image.data, &image.id)?;
        let raw = String::from_utf8_lossy(&stdout);

        parse_identify_output(&raw, image.data.len() as u64).ok_or_else(|| {
            CodecError::Metadata {
                id: image.id.clone(),
                output: raw.trim().to_string(),
            }
        })
    }

    fn transform(
        &self,
        image: &Image,
        directives: &[Directive],
        output: OutputFormat,
    ) -> Result<Vec<u8>, CodecError> {
        let args = transform_args(directives, output);
        self.run(&self.convert_cmd, &args, &image.data, &image.id)
    }

    fn decode(&self, image: &Image) -> Result<DynamicImage, CodecError> {
        image::load_from_memory(&image.data).map_err(|e| CodecError::Decode {
            id: image.id.clone(),
            reason: e.to_string(),
        })
    }
}

/// Assemble the `convert` argument list: stdin marker, the directives in
/// their given order, and the output token last.
fn transform_args(directives: &[Directive], output: OutputFormat) -> Vec<String> {
    let mut args = Vec::with_capacity(directives.len() * 2 + 2);
    args.push("-".to_string());
    for directive in directives {
        directive.push_args(&mut args);
    }
    args.push(output_token(output).to_string());
    args
}

/// The `convert` output argument: an explicit format prefix on stdout, or
/// bare stdout to keep the source format.
fn output_token(output: OutputFormat) -> &'static str {
    match output {
        OutputFormat::Avif => "avif:-",
        OutputFormat::Webp => "webp:-",
        OutputFormat::Source => "-",
    }
}

/// Parse identify's `%m %Q %[opaque] %w %h` output. Multi-frame sources
/// (animated GIFs) repeat the group once per frame; only the leading frame
/// is read.
fn parse_identify_output(raw: &str, byte_size: u64) -> Option<Info> {
    let mut fields = raw.split_whitespace();
    let format = fields.next()?.to_string();
    let quality = fields.next()?.parse().ok()?;
    let opaque = parse_bool(fields.next()?)?;
    let width = fields.next()?.parse().ok()?;
    let height = fields.next()?.parse().ok()?;

    Some(Info {
        format,
        quality,
        opaque,
        width,
        height,
        size: byte_size,
        illustration: false,
    })
}

fn parse_bool(token: &str) -> Option<bool> {
    if token.eq_ignore_ascii_case("true") {
        Some(true)
    } else if token.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Resolve a command name to an existing file, searching `PATH` for bare
/// names the way the shell would.
fn resolve_binary(command: &str) -> Result<PathBuf, CodecError> {
    if command.is_empty() {
        return Err(CodecError::BinaryNotFound(
            "path to codec binary must be provided".to_string(),
        ));
    }

    let candidate = Path::new(command);
    if command.chars().any(std::path::is_separator) {
        if candidate.is_file() {
            return Ok(candidate.to_path_buf());
        }
        return Err(CodecError::BinaryNotFound(command.to_string()));
    }

    std::env::var_os("PATH")
        .and_then(|path| {
            std::env::split_paths(&path)
                .map(|dir| dir.join(command))
                .find(|p| p.is_file())
        })
        .ok_or_else(|| CodecError::BinaryNotFound(command.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_identify_single_frame() {
        let info = parse_identify_output("JPEG 93 True 1280 720", 4096).unwrap();
        assert_eq!(info.format, "JPEG");
        assert_eq!(info.quality, 93);
        assert!(info.opaque);
        assert_eq!((info.width, info.height), (1280, 720));
        assert_eq!(info.size, 4096);
        assert!(!info.illustration);
    }

    #[test]
    fn parse_identify_multi_frame_reads_leading_frame() {
        let raw = "GIF 0 True 120 80 GIF 0 True 120 80 GIF 0 True 120 80";
        let info = parse_identify_output(raw, 1000).unwrap();
        assert_eq!(info.format, "GIF");
        assert_eq!((info.width, info.height), (120, 80));
    }

    #[test]
    fn parse_identify_lowercase_bool() {
        let info = parse_identify_output("PNG 92 false 10 10", 100).unwrap();
        assert!(!info.opaque);
    }

    #[test]
    fn parse_identify_rejects_garbage() {
        assert!(parse_identify_output("no image data here at all", 0).is_none());
        assert!(parse_identify_output("", 0).is_none());
        assert!(parse_identify_output("PNG 92 True 10", 0).is_none());
    }

    #[test]
    fn transform_args_wrap_directives() {
        let directives = vec![
            Directive::new("-resize", "300x200"),
            Directive::new("-quality", "82"),
        ];
        assert_eq!(
            transform_args(&directives, OutputFormat::Webp),
            vec!["-", "-resize", "300x200", "-quality", "82", "webp:-"]
        );
    }

    #[test]
    fn transform_args_source_format_uses_bare_stdout() {
        let args = transform_args(&[], OutputFormat::Source);
        assert_eq!(args, vec!["-", "-"]);
    }

    #[test]
    fn output_tokens() {
        assert_eq!(output_token(OutputFormat::Avif), "avif:-");
        assert_eq!(output_token(OutputFormat::Webp), "webp:-");
        assert_eq!(output_token(OutputFormat::Source), "-");
    }

    #[test]
    fn resolve_rejects_empty_command() {
        assert!(matches!(
            resolve_binary(""),
            Err(CodecError::BinaryNotFound(_))
        ));
    }

    #[test]
    fn resolve_rejects_missing_binary() {
        assert!(resolve_binary("definitely-not-a-real-binary-7f3a").is_err());
        assert!(resolve_binary("/nonexistent/dir/convert").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn resolve_accepts_absolute_path() {
        assert_eq!(resolve_binary("/bin/sh").unwrap(), PathBuf::from("/bin/sh"));
    }

    #[cfg(unix)]
    #[test]
    fn new_validates_both_binaries() {
        assert!(MagickCodec::new("/bin/sh", "/bin/sh").is_ok());
        assert!(MagickCodec::new("/bin/sh", "").is_err());
        assert!(MagickCodec::new("missing-convert-xyz", "/bin/sh").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn decode_reads_png_bytes() {
        let pixels = image::RgbImage::from_pixel(10, 8, image::Rgb([200, 10, 10]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(pixels)
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let codec = MagickCodec::new("/bin/sh", "/bin/sh").unwrap();
        let decoded = codec.decode(&Image::new("png-1", bytes)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (10, 8));
    }

    #[cfg(unix)]
    #[test]
    fn decode_rejects_garbage_bytes() {
        let codec = MagickCodec::new("/bin/sh", "/bin/sh").unwrap();
        let err = codec
            .decode(&Image::new("garbage", vec![0, 1, 2, 3]))
            .unwrap_err();
        assert!(matches!(err, CodecError::Decode { .. }));
    }
}
