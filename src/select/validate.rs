//! Availability validation and fallback selection against a fresh manifest

use crate::core::format::combine_selector;
use crate::core::manifest::Manifest;
use crate::error::YtselError;
use crate::select::classify::classify_streams;
use crate::select::rank::{best_audio, rank_videos};
use tracing::{debug, info, warn};

/// Split a selector into its video (or only) id and optional audio id
pub fn selector_ids(selector: &str) -> (&str, Option<&str>) {
    match selector.split_once('+') {
        Some((video, audio)) => (video, Some(audio)),
        None => (selector, None),
    }
}

/// Result of checking a selector against a manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub available: bool,
    /// Identifiers referenced by the selector but absent from the manifest
    pub missing: Vec<String>,
}

/// Check that every identifier a selector references exists in the manifest
pub fn validate_selector(selector: &str, manifest: &Manifest) -> Availability {
    let ids = manifest.identifiers();
    let (video, audio) = selector_ids(selector);

    let missing: Vec<String> = std::iter::once(video)
        .chain(audio)
        .filter(|id| id.is_empty() || !ids.contains(id))
        .map(str::to_string)
        .collect();

    Availability {
        available: missing.is_empty(),
        missing,
    }
}

/// What the caller is downloading, which decides the fallback strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackKind {
    Audio,
    Video,
}

/// Best-effort replacement selector from a fresh manifest
pub fn find_fallback(manifest: &Manifest, kind: FallbackKind) -> Option<String> {
    let classified = classify_streams(&manifest.streams);

    match kind {
        FallbackKind::Audio => best_audio(&classified.audios)
            .map(|audio| audio.id.clone())
            .or_else(|| {
                manifest
                    .streams
                    .iter()
                    .find(|s| !s.id.is_empty() && s.is_muxed())
                    .map(|s| s.id.clone())
            }),
        FallbackKind::Video => {
            let ranked = rank_videos(&classified.videos);
            ranked
                .iter()
                .find(|v| v.has_audio)
                .or_else(|| ranked.first())
                .map(|v| v.id.clone())
        }
    }
}

/// A selector that is valid for a fresh manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub selector: String,
    /// Original selector when a substitute had to be chosen
    pub substituted_from: Option<String>,
}

impl Reconciled {
    fn unchanged(selector: &str) -> Self {
        Self {
            selector: selector.to_string(),
            substituted_from: None,
        }
    }

    fn substitute(original: &str, selector: String) -> Self {
        Self {
            selector,
            substituted_from: Some(original.to_string()),
        }
    }
}

/// Re-check a selector against a fresh manifest and substitute a fallback
/// when the referenced streams vanished.
///
/// When only the audio half of a combined selector vanished, the surviving
/// video is re-paired with the current best audio; with no fresh audio at
/// all the selector is unrecoverable.
pub fn reconcile(
    selector: &str,
    manifest: &Manifest,
    kind: FallbackKind,
) -> Result<Reconciled, YtselError> {
    let availability = validate_selector(selector, manifest);
    if availability.available {
        debug!("Format {} is available", selector);
        return Ok(Reconciled::unchanged(selector));
    }

    warn!(
        "Requested format {} is not available (missing: {})",
        selector,
        availability.missing.join(", ")
    );
    let unavailable = || YtselError::FormatNoLongerAvailable {
        selector: selector.to_string(),
    };

    let (video_id, audio_id) = selector_ids(selector);
    let video_survived = !availability.missing.iter().any(|id| id == video_id);

    let replacement = if kind == FallbackKind::Video && audio_id.is_some() && video_survived {
        let classified = classify_streams(&manifest.streams);
        let audio = best_audio(&classified.audios).ok_or_else(unavailable)?;
        combine_selector(video_id, &audio.id)
    } else {
        find_fallback(manifest, kind).ok_or_else(unavailable)?
    };

    info!("Using fallback format {} instead of {}", replacement, selector);
    Ok(Reconciled::substitute(selector, replacement))
}

/// Upgrade a simple selector naming a video-only stream to a merge selector
/// with the best audio of the same manifest.
pub fn attach_best_audio(selector: &str, manifest: &Manifest) -> String {
    if selector_ids(selector).1.is_some() {
        return selector.to_string();
    }

    let video_only = manifest
        .stream(selector)
        .map(|s| s.has_video() && !s.has_audio())
        .unwrap_or(false);
    if !video_only {
        return selector.to_string();
    }

    let classified = classify_streams(&manifest.streams);
    match best_audio(&classified.audios) {
        Some(audio) => {
            let combined = combine_selector(selector, &audio.id);
            info!("Auto-adding audio: {}", combined);
            combined
        }
        None => selector.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::manifest::StreamDescriptor;

    fn video_only(id: &str, height: u32) -> StreamDescriptor {
        StreamDescriptor::new(id, "mp4")
            .with_dimensions(height * 16 / 9, height)
            .with_fps(30.0)
            .with_codecs("avc1", "none")
    }

    fn muxed(id: &str, height: u32) -> StreamDescriptor {
        StreamDescriptor::new(id, "mp4")
            .with_dimensions(height * 16 / 9, height)
            .with_fps(30.0)
            .with_codecs("avc1", "mp4a.40.2")
    }

    fn audio(id: &str, abr: f64) -> StreamDescriptor {
        StreamDescriptor::new(id, "m4a")
            .with_codecs("none", "mp4a.40.2")
            .with_abr(abr)
    }

    #[test]
    fn test_selector_ids() {
        assert_eq!(selector_ids("137+251"), ("137", Some("251")));
        assert_eq!(selector_ids("22"), ("22", None));
    }

    #[test]
    fn test_validate_selector() {
        let m = Manifest::new("t", vec![video_only("137", 1080), audio("140", 128.0)]);
        assert!(validate_selector("137", &m).available);
        assert!(validate_selector("137+140", &m).available);

        let result = validate_selector("137+251", &m);
        assert!(!result.available);
        assert_eq!(result.missing, vec!["251".to_string()]);

        let result = validate_selector("299+251", &m);
        assert_eq!(result.missing.len(), 2);
    }

    #[test]
    fn test_audio_fallback() {
        let m = Manifest::new(
            "t",
            vec![muxed("18", 360), audio("139", 48.0), audio("140", 128.0)],
        );
        assert_eq!(find_fallback(&m, FallbackKind::Audio).as_deref(), Some("140"));

        let muxed_only = Manifest::new("t", vec![video_only("137", 1080), muxed("18", 360)]);
        assert_eq!(
            find_fallback(&muxed_only, FallbackKind::Audio).as_deref(),
            Some("18")
        );

        let nothing = Manifest::new("t", vec![video_only("137", 1080)]);
        assert_eq!(find_fallback(&nothing, FallbackKind::Audio), None);
    }

    #[test]
    fn test_video_fallback() {
        let m = Manifest::new(
            "t",
            vec![video_only("137", 1080), muxed("18", 360), muxed("22", 720)],
        );
        assert_eq!(find_fallback(&m, FallbackKind::Video).as_deref(), Some("22"));

        let silent = Manifest::new("t", vec![video_only("136", 720), video_only("137", 1080)]);
        assert_eq!(
            find_fallback(&silent, FallbackKind::Video).as_deref(),
            Some("137")
        );

        assert_eq!(
            find_fallback(&Manifest::new("t", vec![]), FallbackKind::Video),
            None
        );
    }

    #[test]
    fn test_reconcile_available_is_unchanged() {
        let m = Manifest::new("t", vec![video_only("137", 1080), audio("140", 128.0)]);
        let reconciled = reconcile("137+140", &m, FallbackKind::Video).unwrap();
        assert_eq!(reconciled, Reconciled::unchanged("137+140"));
    }

    #[test]
    fn test_reconcile_replaces_vanished_audio() {
        let fresh = Manifest::new(
            "t",
            vec![video_only("137", 1080), audio("139", 48.0), audio("140", 128.0)],
        );
        let reconciled = reconcile("137+251", &fresh, FallbackKind::Video).unwrap();
        assert_eq!(reconciled.selector, "137+140");
        assert_eq!(reconciled.substituted_from.as_deref(), Some("137+251"));
    }

    #[test]
    fn test_reconcile_fails_without_fresh_audio() {
        let fresh = Manifest::new("t", vec![video_only("137", 1080), muxed("18", 360)]);
        assert!(matches!(
            reconcile("137+251", &fresh, FallbackKind::Video),
            Err(YtselError::FormatNoLongerAvailable { selector }) if selector == "137+251"
        ));
    }

    #[test]
    fn test_reconcile_vanished_video_uses_video_fallback() {
        let fresh = Manifest::new("t", vec![muxed("22", 720), audio("140", 128.0)]);
        let reconciled = reconcile("137+140", &fresh, FallbackKind::Video).unwrap();
        assert_eq!(reconciled.selector, "22");
    }

    #[test]
    fn test_reconcile_audio_request() {
        let fresh = Manifest::new("t", vec![audio("140", 128.0)]);
        let reconciled = reconcile("251", &fresh, FallbackKind::Audio).unwrap();
        assert_eq!(reconciled.selector, "140");

        let empty = Manifest::new("t", vec![video_only("137", 1080)]);
        assert!(reconcile("251", &empty, FallbackKind::Audio).is_err());
    }

    #[test]
    fn test_attach_best_audio() {
        let m = Manifest::new(
            "t",
            vec![video_only("137", 1080), muxed("22", 720), audio("140", 128.0)],
        );
        assert_eq!(attach_best_audio("137", &m), "137+140");
        assert_eq!(attach_best_audio("22", &m), "22");
        assert_eq!(attach_best_audio("137+140", &m), "137+140");

        let silent = Manifest::new("t", vec![video_only("137", 1080)]);
        assert_eq!(attach_best_audio("137", &silent), "137");
    }
}
