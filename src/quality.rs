//! Output-quality heuristic.
//!
//! Derives the numeric quality directive from the source quality, the
//! requested [`QualityTier`] and the negotiated output format. `None` means
//! "emit no quality directive and let the codec default decide".

use crate::format::OutputFormat;
use crate::types::Info;

/// Coarse client-requested quality reduction, applied on top of the
/// heuristic value. Ordering: `Default` > `Low` > `Lower` in resulting
/// quality.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QualityTier {
    #[default]
    Default,
    Low,
    Lower,
}

/// Quality setting for lossy image encoding (1-100). Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Derive the output quality directive.
///
/// AVIF reaches visually-equivalent results at substantially lower numeric
/// quality than legacy formats, so source quality is mapped down by band.
/// A source quality of 100 is treated as "unspecified/lossless source"
/// (notably PNG) and re-encoded at 82. Otherwise a non-default tier starts
/// from the source's own quality, and the default tier emits nothing.
pub fn output_quality(source: &Info, tier: QualityTier, output: OutputFormat) -> Option<Quality> {
    let mut quality: i64 = if output == OutputFormat::Avif {
        if source.quality > 85 {
            70
        } else if source.quality > 75 {
            60
        } else {
            50
        }
    } else if source.quality == 100 {
        82
    } else if tier != QualityTier::Default {
        i64::from(source.quality)
    } else {
        0
    };

    if quality == 0 {
        return None;
    }
    if quality != 100 {
        match tier {
            QualityTier::Default => {}
            QualityTier::Low => quality -= 10,
            QualityTier::Lower => quality -= 20,
        }
    }

    Some(Quality::new(quality.max(1) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(quality: u32) -> Info {
        Info {
            quality,
            ..Info::default()
        }
    }

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn avif_maps_quality_by_band() {
        let tier = QualityTier::Default;
        assert_eq!(
            output_quality(&source(90), tier, OutputFormat::Avif).map(Quality::value),
            Some(70)
        );
        assert_eq!(
            output_quality(&source(80), tier, OutputFormat::Avif).map(Quality::value),
            Some(60)
        );
        assert_eq!(
            output_quality(&source(70), tier, OutputFormat::Avif).map(Quality::value),
            Some(50)
        );
    }

    #[test]
    fn avif_band_boundaries() {
        let tier = QualityTier::Default;
        // 85 is not > 85, 75 is not > 75
        assert_eq!(
            output_quality(&source(86), tier, OutputFormat::Avif).map(Quality::value),
            Some(70)
        );
        assert_eq!(
            output_quality(&source(85), tier, OutputFormat::Avif).map(Quality::value),
            Some(60)
        );
        assert_eq!(
            output_quality(&source(75), tier, OutputFormat::Avif).map(Quality::value),
            Some(50)
        );
    }

    #[test]
    fn lossless_source_targets_82() {
        assert_eq!(
            output_quality(&source(100), QualityTier::Default, OutputFormat::Webp)
                .map(Quality::value),
            Some(82)
        );
    }

    #[test]
    fn lossless_source_with_tier_adjusts_from_82() {
        assert_eq!(
            output_quality(&source(100), QualityTier::Low, OutputFormat::Webp)
                .map(Quality::value),
            Some(72)
        );
    }

    #[test]
    fn default_tier_with_ordinary_source_emits_nothing() {
        assert_eq!(
            output_quality(&source(85), QualityTier::Default, OutputFormat::Webp),
            None
        );
        assert_eq!(
            output_quality(&source(85), QualityTier::Default, OutputFormat::Source),
            None
        );
    }

    #[test]
    fn non_default_tier_reuses_source_quality() {
        assert_eq!(
            output_quality(&source(85), QualityTier::Low, OutputFormat::Webp)
                .map(Quality::value),
            Some(75)
        );
        assert_eq!(
            output_quality(&source(85), QualityTier::Lower, OutputFormat::Source)
                .map(Quality::value),
            Some(65)
        );
    }

    #[test]
    fn lower_tier_applies_to_avif_bands() {
        assert_eq!(
            output_quality(&source(90), QualityTier::Lower, OutputFormat::Avif)
                .map(Quality::value),
            Some(50)
        );
    }

    #[test]
    fn degraded_quality_is_floored_at_one() {
        // Source quality 15 at LOWER would go negative; emitted value clamps
        assert_eq!(
            output_quality(&source(15), QualityTier::Lower, OutputFormat::Webp)
                .map(Quality::value),
            Some(1)
        );
    }
}
