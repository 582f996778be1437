//! Quality scoring weights and score functions

use crate::core::format::VideoFormat;
use serde::{Deserialize, Serialize};

/// Codec families recognised by the scorer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CodecFamily {
    Av1,
    Hevc,
    Vp9,
    H264,
    Other,
}

impl CodecFamily {
    /// Detect the codec family from a provider codec string
    pub fn detect(codec: &str) -> Self {
        let codec = codec.to_lowercase();
        if codec.contains("av01") || codec.contains("av1") {
            CodecFamily::Av1
        } else if codec.contains("hvc1")
            || codec.contains("hev1")
            || codec.contains("hevc")
            || codec.contains("h265")
        {
            CodecFamily::Hevc
        } else if codec.contains("vp09") || codec.contains("vp9") {
            CodecFamily::Vp9
        } else if codec.contains("avc") || codec.contains("h264") {
            CodecFamily::H264
        } else {
            CodecFamily::Other
        }
    }
}

/// Bonus per codec family
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CodecBonus {
    pub av1: f64,
    pub hevc: f64,
    pub vp9: f64,
    pub h264: f64,
}

impl CodecBonus {
    /// Bonus for a codec string
    pub fn for_codec(&self, codec: &str) -> f64 {
        match CodecFamily::detect(codec) {
            CodecFamily::Av1 => self.av1,
            CodecFamily::Hevc => self.hevc,
            CodecFamily::Vp9 => self.vp9,
            CodecFamily::H264 => self.h264,
            CodecFamily::Other => 0.0,
        }
    }
}

/// Weights for the primary and refinement quality scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Bonus when the height equals the requested height
    pub exact_match: f64,
    /// Frame-rate tiers as (minimum fps, bonus), highest first
    pub fps_tiers: Vec<(f64, f64)>,
    /// Codec bonus in the primary score
    pub codec: CodecBonus,
    /// Maximum size bonus, one point per megabyte
    pub size_cap: f64,
    /// Maximum width bonus, one point per 100 pixels
    pub width_cap: f64,
    /// Codec bonus in the refinement score
    pub refine_codec: CodecBonus,
    /// Points per frame in the refinement score
    pub refine_fps_factor: f64,
    /// Minimum fps for a refinement candidate
    pub refine_min_fps: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            exact_match: 10_000.0,
            fps_tiers: vec![(60.0, 1000.0), (30.0, 500.0), (25.0, 250.0)],
            codec: CodecBonus {
                av1: 800.0,
                hevc: 700.0,
                vp9: 600.0,
                h264: 400.0,
            },
            size_cap: 1000.0,
            width_cap: 500.0,
            refine_codec: CodecBonus {
                av1: 1000.0,
                hevc: 600.0,
                vp9: 800.0,
                h264: 400.0,
            },
            refine_fps_factor: 10.0,
            refine_min_fps: 30.0,
        }
    }
}

/// Whole megabytes of a byte size
fn size_mb(filesize: u64) -> f64 {
    (filesize / 1_000_000) as f64
}

impl ScoreWeights {
    /// Primary quality score used to pick among candidates
    pub fn primary_score(&self, format: &VideoFormat, target_height: Option<u32>) -> f64 {
        let mut score = 0.0;

        if target_height == Some(format.height) {
            score += self.exact_match;
        }

        if let Some((_, bonus)) = self.fps_tiers.iter().find(|(min, _)| format.fps >= *min) {
            score += bonus;
        }

        score += self.codec.for_codec(&format.vcodec);
        score += size_mb(format.filesize).min(self.size_cap);
        score += ((format.width / 100) as f64).min(self.width_cap);

        score
    }

    /// Alternate score used by the same-height refinement pass
    pub fn refinement_score(&self, format: &VideoFormat) -> f64 {
        size_mb(format.filesize)
            + format.fps * self.refine_fps_factor
            + self.refine_codec.for_codec(&format.vcodec)
    }

    /// Check if a format may take part in the refinement pass
    pub fn is_refinement_candidate(&self, format: &VideoFormat, target_height: u32) -> bool {
        format.height == target_height && format.filesize > 0 && format.fps >= self.refine_min_fps
    }
}

/// Coarse quality tier derived from a score without the exact-match bonus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub fn from_score(score: f64) -> Self {
        if score > 1000.0 {
            QualityTier::High
        } else if score > 500.0 {
            QualityTier::Medium
        } else {
            QualityTier::Low
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QualityTier::High => "High",
            QualityTier::Medium => "Medium",
            QualityTier::Low => "Low",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video(vcodec: &str, height: u32, width: u32, fps: f64, filesize: u64) -> VideoFormat {
        VideoFormat {
            id: "v".to_string(),
            ext: "mp4".to_string(),
            height,
            width,
            fps,
            tbr: 0.0,
            vbr: 0.0,
            abr: 0.0,
            vcodec: vcodec.to_string(),
            acodec: None,
            filesize,
            has_audio: false,
            resolution_precise: String::new(),
            resolution_standard: String::new(),
            format_note: String::new(),
        }
    }

    #[test]
    fn test_codec_family_detection() {
        assert_eq!(CodecFamily::detect("av01.0.08M.08"), CodecFamily::Av1);
        assert_eq!(CodecFamily::detect("hvc1.1.6.L120.90"), CodecFamily::Hevc);
        assert_eq!(CodecFamily::detect("H265"), CodecFamily::Hevc);
        assert_eq!(CodecFamily::detect("vp09.00.40.08"), CodecFamily::Vp9);
        assert_eq!(CodecFamily::detect("vp9"), CodecFamily::Vp9);
        assert_eq!(CodecFamily::detect("avc1.640028"), CodecFamily::H264);
        assert_eq!(CodecFamily::detect("theora"), CodecFamily::Other);
    }

    #[test]
    fn test_primary_score_components() {
        let weights = ScoreWeights::default();
        // exact + 60fps + av1 + 250MB + 1920/100
        let format = video("av01.0.08M.08", 1080, 1920, 60.0, 250_000_000);
        assert_eq!(
            weights.primary_score(&format, Some(1080)),
            10_000.0 + 1000.0 + 800.0 + 250.0 + 19.0
        );
        // no exact match, 25fps tier, h264, size capped, width capped
        let format = video("avc1", 4320, 76_800, 25.0, 5_000_000_000);
        assert_eq!(
            weights.primary_score(&format, Some(2160)),
            250.0 + 400.0 + 1000.0 + 500.0
        );
        let format = video("theora", 360, 0, 24.0, 0);
        assert_eq!(weights.primary_score(&format, None), 0.0);
    }

    #[test]
    fn test_refinement_score() {
        let weights = ScoreWeights::default();
        let format = video("vp9", 1080, 1920, 30.0, 120_500_000);
        assert_eq!(weights.refinement_score(&format), 120.0 + 300.0 + 800.0);
        assert!(weights.is_refinement_candidate(&format, 1080));
        assert!(!weights.is_refinement_candidate(&format, 720));
        assert!(!weights.is_refinement_candidate(&video("vp9", 1080, 1920, 25.0, 1), 1080));
        assert!(!weights.is_refinement_candidate(&video("vp9", 1080, 1920, 30.0, 0), 1080));
    }

    #[test]
    fn test_quality_tier() {
        assert_eq!(QualityTier::from_score(1500.0), QualityTier::High);
        assert_eq!(QualityTier::from_score(1000.0), QualityTier::Medium);
        assert_eq!(QualityTier::from_score(500.0), QualityTier::Low);
        assert_eq!(QualityTier::High.to_string(), "High");
    }
}
