//! Quality label resolution

use crate::core::format::{combine_selector, AudioFormat, VideoFormat};
use crate::core::manifest::Manifest;
use crate::error::YtselError;
use crate::select::classify::classify_streams;
use crate::select::rank::best_audio;
use crate::select::score::{QualityTier, ScoreWeights};
use crate::select::validate::{selector_ids, validate_selector};
use tracing::{debug, info};

/// Parse a quality label ("1080p", "1920x1080", "4K", "8K") into a height
pub fn parse_target_height(label: &str) -> Option<u32> {
    let label = label.trim();

    if let Some(height) = label.strip_suffix('p').or_else(|| label.strip_suffix('P')) {
        return height.parse().ok();
    }

    if let Some((_, height)) = label.split_once(['x', 'X']) {
        return height.parse().ok();
    }

    match label.to_uppercase().as_str() {
        "4K" => Some(2160),
        "8K" => Some(4320),
        _ => None,
    }
}

/// Check if a string looks like a quality label rather than a selector
pub fn is_quality_label(label: &str) -> bool {
    parse_target_height(label).is_some()
}

/// Outcome of resolving a label against one manifest snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// Selector for the media fetcher
    pub selector: String,
    pub video_id: String,
    pub audio_id: Option<String>,
    /// Height of the chosen video, 0 when unknown
    pub height: u32,
    /// Whether the chosen height equals the requested height
    pub exact_match: bool,
    /// Whether the refinement pass replaced the primary choice
    pub refined: bool,
}

/// One candidate in a quality analysis
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFormat {
    pub format: VideoFormat,
    pub score: f64,
    pub tier: QualityTier,
}

/// Per-candidate breakdown for one requested quality
#[derive(Debug, Clone, PartialEq)]
pub struct QualityAnalysis {
    pub label: String,
    pub target_height: u32,
    /// Same-height candidates, best first
    pub candidates: Vec<ScoredFormat>,
    /// Audio that would be added to a video-only recommendation
    pub companion_audio: Option<AudioFormat>,
}

impl QualityAnalysis {
    /// Recommended candidate
    pub fn recommended(&self) -> Option<&ScoredFormat> {
        self.candidates.first()
    }
}

/// Stateless resolver from quality labels to selectors
#[derive(Debug, Clone)]
pub struct QualityResolver {
    weights: ScoreWeights,
    refine: bool,
}

impl QualityResolver {
    /// Create a resolver with default weights and refinement enabled
    pub fn new() -> Self {
        Self {
            weights: ScoreWeights::default(),
            refine: true,
        }
    }

    /// Set scoring weights
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Enable or disable the same-height refinement pass
    pub fn with_refinement(mut self, refine: bool) -> Self {
        self.refine = refine;
        self
    }

    /// Resolve a label or selector against a manifest snapshot
    pub fn resolve(&self, manifest: &Manifest, label: &str) -> Result<Resolution, YtselError> {
        let label = label.trim();

        // A selector that already names streams of this snapshot passes through
        if validate_selector(label, manifest).available {
            let (video_id, audio_id) = selector_ids(label);
            let height = manifest
                .stream(video_id)
                .and_then(|s| s.height)
                .unwrap_or(0);
            debug!("Label {} is an existing selector", label);
            return Ok(Resolution {
                selector: label.to_string(),
                video_id: video_id.to_string(),
                audio_id: audio_id.map(str::to_string),
                height,
                exact_match: height > 0 && parse_target_height(label) == Some(height),
                refined: false,
            });
        }

        let classified = classify_streams(&manifest.streams);
        self.resolve_in(&classified.videos, &classified.audios, label)
    }

    /// Resolve a label against classified formats in manifest order
    pub fn resolve_in(
        &self,
        videos: &[VideoFormat],
        audios: &[AudioFormat],
        label: &str,
    ) -> Result<Resolution, YtselError> {
        let target = parse_target_height(label);
        let mut candidates = match_candidates(videos, label, target);
        if candidates.is_empty() {
            return Err(YtselError::UnresolvableQuality(label.to_string()));
        }

        candidates.sort_by(|a, b| {
            self.weights
                .primary_score(b, target)
                .total_cmp(&self.weights.primary_score(a, target))
        });
        let mut chosen = candidates[0];
        let mut refined = false;

        if self.refine {
            if let Some(better) = target.and_then(|h| self.refine_choice(videos, chosen, h)) {
                info!(
                    "Refinement replaced format {} with {} (score {} > {})",
                    chosen.id,
                    better.id,
                    self.weights.refinement_score(better),
                    self.weights.refinement_score(chosen)
                );
                chosen = better;
                refined = true;
            }
        }

        let audio = if chosen.is_video_only() {
            best_audio(audios)
        } else {
            None
        };
        let selector = match audio {
            Some(audio) => combine_selector(&chosen.id, &audio.id),
            None => chosen.id.clone(),
        };

        info!(
            "Resolved quality {} to {} ({} {} {}fps)",
            label, selector, chosen.resolution_precise, chosen.vcodec, chosen.fps
        );

        Ok(Resolution {
            selector,
            video_id: chosen.id.clone(),
            audio_id: audio.map(|a| a.id.clone()),
            height: chosen.height,
            exact_match: target == Some(chosen.height),
            refined,
        })
    }

    /// Look for a strictly better encode at the target height
    fn refine_choice<'a>(
        &self,
        videos: &'a [VideoFormat],
        chosen: &VideoFormat,
        target_height: u32,
    ) -> Option<&'a VideoFormat> {
        if chosen.height != target_height {
            return None;
        }

        let best = videos
            .iter()
            .filter(|v| self.weights.is_refinement_candidate(v, target_height))
            .min_by(|a, b| {
                self.weights
                    .refinement_score(b)
                    .total_cmp(&self.weights.refinement_score(a))
            })?;

        (self.weights.refinement_score(best) > self.weights.refinement_score(chosen))
            .then_some(best)
    }

    /// Score every same-height candidate for a quality label
    pub fn analyze(&self, manifest: &Manifest, label: &str) -> Result<QualityAnalysis, YtselError> {
        let target_height = parse_target_height(label)
            .ok_or_else(|| YtselError::UnresolvableQuality(label.to_string()))?;
        let classified = classify_streams(&manifest.streams);

        let mut candidates: Vec<ScoredFormat> = classified
            .videos
            .iter()
            .filter(|v| v.height == target_height)
            .map(|v| {
                let score = self.weights.primary_score(v, None);
                ScoredFormat {
                    format: v.clone(),
                    score,
                    tier: QualityTier::from_score(score),
                }
            })
            .collect();
        if candidates.is_empty() {
            return Err(YtselError::UnresolvableQuality(label.to_string()));
        }
        candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

        let companion_audio = if candidates[0].format.is_video_only() {
            best_audio(&classified.audios).cloned()
        } else {
            None
        };

        Ok(QualityAnalysis {
            label: label.to_string(),
            target_height,
            candidates,
            companion_audio,
        })
    }
}

impl Default for QualityResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact-height matches, or the single nearest height when none match
fn match_candidates<'a>(
    videos: &'a [VideoFormat],
    label: &str,
    target: Option<u32>,
) -> Vec<&'a VideoFormat> {
    let sized = videos.iter().filter(|v| v.height > 0);

    let Some(target) = target else {
        return sized
            .filter(|v| v.resolution_standard == label || v.resolution_precise == label)
            .collect();
    };

    let exact: Vec<&VideoFormat> = sized.clone().filter(|v| v.height == target).collect();
    if !exact.is_empty() {
        return exact;
    }

    // First-encountered wins on equal distance
    sized
        .min_by_key(|v| v.height.abs_diff(target))
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::StreamDescriptor;

    fn manifest(streams: Vec<StreamDescriptor>) -> Manifest {
        Manifest::new("test", streams)
    }

    fn audio_stream(id: &str, abr: f64) -> StreamDescriptor {
        StreamDescriptor::new(id, "m4a")
            .with_codecs("none", "mp4a.40.2")
            .with_abr(abr)
    }

    #[test]
    fn test_parse_target_height() {
        assert_eq!(parse_target_height("1080p"), Some(1080));
        assert_eq!(parse_target_height("720P"), Some(720));
        assert_eq!(parse_target_height("1920x1080"), Some(1080));
        assert_eq!(parse_target_height("4K"), Some(2160));
        assert_eq!(parse_target_height("4k"), Some(2160));
        assert_eq!(parse_target_height("8K"), Some(4320));
        assert_eq!(parse_target_height("best"), None);
        assert_eq!(parse_target_height("abcp"), None);
        assert_eq!(parse_target_height("137+251"), None);
    }

    #[test]
    fn test_exact_height_match_with_audio() {
        let m = manifest(vec![
            StreamDescriptor::new("136", "mp4")
                .with_dimensions(1280, 720)
                .with_fps(30.0)
                .with_codecs("avc1", "none"),
            StreamDescriptor::new("137", "mp4")
                .with_dimensions(1920, 1080)
                .with_fps(30.0)
                .with_codecs("avc1", "none"),
            audio_stream("140", 128.0),
        ]);
        let resolution = QualityResolver::new().resolve(&m, "1080p").unwrap();
        assert_eq!(resolution.selector, "137+140");
        assert_eq!(resolution.height, 1080);
        assert!(resolution.exact_match);
    }

    #[test]
    fn test_nearest_height_fallback() {
        let m = manifest(vec![
            StreamDescriptor::new("271", "webm")
                .with_dimensions(2560, 1440)
                .with_fps(30.0)
                .with_codecs("vp9", "none"),
            StreamDescriptor::new("137", "mp4")
                .with_dimensions(1920, 1080)
                .with_codecs("avc1", "none"),
            audio_stream("251", 160.0),
        ]);
        let resolution = QualityResolver::new().resolve(&m, "4K").unwrap();
        assert_eq!(resolution.video_id, "271");
        assert_eq!(resolution.selector, "271+251");
        assert!(!resolution.exact_match);
    }

    #[test]
    fn test_nearest_height_ties_first_in_manifest_order() {
        let m = manifest(vec![
            StreamDescriptor::new("low", "mp4")
                .with_dimensions(1280, 700)
                .with_codecs("avc1", "mp4a.40.2"),
            StreamDescriptor::new("high", "mp4")
                .with_dimensions(1280, 740)
                .with_codecs("avc1", "mp4a.40.2"),
        ]);
        let resolution = QualityResolver::new().resolve(&m, "720p").unwrap();
        assert_eq!(resolution.selector, "low");
    }

    #[test]
    fn test_primary_score_prefers_codec_and_fps() {
        let m = manifest(vec![
            StreamDescriptor::new("137", "mp4")
                .with_dimensions(1920, 1080)
                .with_fps(30.0)
                .with_codecs("avc1.640028", "none"),
            StreamDescriptor::new("399", "mp4")
                .with_dimensions(1920, 1080)
                .with_fps(30.0)
                .with_codecs("av01.0.08M.08", "none"),
            StreamDescriptor::new("22", "mp4")
                .with_dimensions(1280, 720)
                .with_fps(60.0)
                .with_codecs("avc1", "mp4a.40.2"),
        ]);
        let resolution = QualityResolver::new()
            .with_refinement(false)
            .resolve(&m, "1080p")
            .unwrap();
        // No audio-only streams, so the video id is used alone
        assert_eq!(resolution.selector, "399");
    }

    #[test]
    fn test_refinement_picks_better_same_height_encode() {
        // Primary score favours the wide, large h264 stream; the refinement
        // score favours the 60fps VP9 stream.
        let m = manifest(vec![
            StreamDescriptor::new("a", "mp4")
                .with_dimensions(1920, 1080)
                .with_fps(30.0)
                .with_codecs("avc1", "none")
                .with_filesize(898_000_000),
            StreamDescriptor::new("b", "webm")
                .with_dimensions(1440, 1080)
                .with_fps(60.0)
                .with_codecs("vp9", "none")
                .with_filesize(200_000_000),
            StreamDescriptor::new("c", "mp4")
                .with_dimensions(1280, 720)
                .with_fps(60.0)
                .with_codecs("av01", "none")
                .with_filesize(999_000_000),
            audio_stream("140", 128.0),
        ]);
        let resolver = QualityResolver::new();

        let plain = resolver
            .clone()
            .with_refinement(false)
            .resolve(&m, "1080p")
            .unwrap();
        assert_eq!(plain.video_id, "a");

        let refined = resolver.resolve(&m, "1080p").unwrap();
        assert_eq!(refined.video_id, "b");
        assert_eq!(refined.selector, "b+140");
        assert_eq!(refined.height, 1080);
        assert!(refined.refined);
    }

    #[test]
    fn test_refinement_never_changes_height() {
        let m = manifest(vec![
            StreamDescriptor::new("a", "mp4")
                .with_dimensions(1920, 1080)
                .with_fps(24.0)
                .with_codecs("avc1", "mp4a.40.2"),
            StreamDescriptor::new("c", "mp4")
                .with_dimensions(1280, 720)
                .with_fps(60.0)
                .with_codecs("av01", "none")
                .with_filesize(999_000_000),
        ]);
        let resolution = QualityResolver::new().resolve(&m, "1080p").unwrap();
        assert_eq!(resolution.selector, "a");
        assert!(!resolution.refined);
    }

    #[test]
    fn test_existing_selector_passes_through() {
        let m = manifest(vec![
            StreamDescriptor::new("137", "mp4")
                .with_dimensions(1920, 1080)
                .with_codecs("avc1", "none"),
            audio_stream("140", 128.0),
        ]);
        let resolution = QualityResolver::new().resolve(&m, "137+140").unwrap();
        assert_eq!(resolution.selector, "137+140");
        assert_eq!(resolution.audio_id.as_deref(), Some("140"));
    }

    #[test]
    fn test_existing_selector_shaped_like_label_passes_through() {
        let m = manifest(vec![
            StreamDescriptor::new("hls-1280x720", "mp4")
                .with_dimensions(1280, 720)
                .with_fps(30.0)
                .with_codecs("avc1", "mp4a.40.2"),
            StreamDescriptor::new("dash-720", "mp4")
                .with_dimensions(1280, 720)
                .with_fps(60.0)
                .with_codecs("av01", "mp4a.40.2"),
        ]);
        let resolution = QualityResolver::new().resolve(&m, "hls-1280x720").unwrap();
        assert_eq!(resolution.selector, "hls-1280x720");
        assert_eq!(resolution.height, 720);
        assert!(resolution.exact_match);

        // the same string names nothing in a snapshot without that id
        let other = manifest(vec![m.streams[1].clone()]);
        let resolution = QualityResolver::new().resolve(&other, "hls-1280x720").unwrap();
        assert_eq!(resolution.selector, "dash-720");
    }

    #[test]
    fn test_pass_through_reports_stream_height() {
        let m = manifest(vec![
            StreamDescriptor::new("137", "mp4")
                .with_dimensions(1920, 1080)
                .with_codecs("avc1", "none"),
            audio_stream("140", 128.0),
        ]);
        let resolution = QualityResolver::new().resolve(&m, "137+140").unwrap();
        assert_eq!(resolution.height, 1080);
        assert!(!resolution.exact_match);

        let audio_only = QualityResolver::new().resolve(&m, "140").unwrap();
        assert_eq!(audio_only.height, 0);
        assert!(!audio_only.exact_match);
    }

    #[test]
    fn test_default_resolver_refines() {
        let m = manifest(vec![
            StreamDescriptor::new("a", "mp4")
                .with_dimensions(1920, 1080)
                .with_fps(30.0)
                .with_codecs("hvc1", "mp4a.40.2")
                .with_filesize(100_000_000),
            StreamDescriptor::new("b", "webm")
                .with_dimensions(1920, 1080)
                .with_fps(30.0)
                .with_codecs("vp09", "opus")
                .with_filesize(100_000_000),
        ]);
        let from_new = QualityResolver::new().resolve(&m, "1080p").unwrap();
        let from_default = QualityResolver::default().resolve(&m, "1080p").unwrap();
        assert_eq!(from_default, from_new);
        assert_eq!(from_default.selector, "b");
        assert!(from_default.refined);
    }

    #[test]
    fn test_string_label_match_and_unresolvable() {
        let m = manifest(vec![StreamDescriptor::new("x", "mp4")
            .with_dimensions(1920, 1080)
            .with_codecs("avc1", "mp4a.40.2")]);
        let resolver = QualityResolver::new();
        assert!(matches!(
            resolver.resolve(&m, "best-ish"),
            Err(YtselError::UnresolvableQuality(_))
        ));

        let empty = manifest(vec![audio_stream("140", 128.0)]);
        assert!(matches!(
            resolver.resolve(&empty, "1080p"),
            Err(YtselError::UnresolvableQuality(_))
        ));
    }

    #[test]
    fn test_analyze_quality() {
        let m = manifest(vec![
            StreamDescriptor::new("137", "mp4")
                .with_dimensions(1920, 1080)
                .with_fps(30.0)
                .with_codecs("avc1", "none"),
            StreamDescriptor::new("303", "webm")
                .with_dimensions(1920, 1080)
                .with_fps(60.0)
                .with_codecs("vp9", "none"),
            audio_stream("251", 160.0),
        ]);
        let analysis = QualityResolver::new().analyze(&m, "1080p").unwrap();
        assert_eq!(analysis.target_height, 1080);
        assert_eq!(analysis.candidates.len(), 2);
        let best = analysis.recommended().unwrap();
        assert_eq!(best.format.id, "303");
        assert_eq!(best.tier, QualityTier::High);
        assert_eq!(analysis.companion_audio.unwrap().id, "251");

        assert!(QualityResolver::new().analyze(&m, "720p").is_err());
        assert!(QualityResolver::new().analyze(&m, "best").is_err());
    }
}
