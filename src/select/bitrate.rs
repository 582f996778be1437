//! Audio bitrate inference from provider fields and free-text notes

use regex::Regex;
use std::sync::OnceLock;

/// Where an inferred bitrate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitrateSource {
    /// Provider reported the bitrate directly
    Provider,
    /// Parsed from a "<n>kbps" substring in the note
    NoteKbps,
    /// Mapped from a quality keyword in the note
    NoteKeyword,
    /// Guessed from a well-known placeholder identifier
    Identifier,
    /// Nothing matched
    Unknown,
}

/// Keyword rules, checked in order against the lowercased note
pub const NOTE_KEYWORDS: &[(&str, f64)] = &[
    ("low", 64.0),
    ("high", 128.0),
    ("medium", 96.0),
    ("default", 96.0),
];

/// Placeholder identifiers known to carry audio of a nominal bitrate
pub const AUDIO_PLACEHOLDER_IDS: &[&str] = &["233", "234"];

fn kbps_regex() -> &'static Regex {
    static KBPS: OnceLock<Regex> = OnceLock::new();
    KBPS.get_or_init(|| {
        Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*k(?:bps|b/s)").expect("kbps pattern is valid")
    })
}

/// Extract a bitrate from a "kbps" substring of a note
pub fn parse_note_kbps(note: &str) -> Option<f64> {
    kbps_regex()
        .captures(note)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|kbps| *kbps > 0.0)
}

/// Map a quality keyword in a note to a nominal bitrate
pub fn keyword_bitrate(note: &str) -> Option<f64> {
    let note = note.to_lowercase();
    NOTE_KEYWORDS
        .iter()
        .find(|(keyword, _)| note.contains(keyword))
        .map(|(_, kbps)| *kbps)
}

/// Infer an audio bitrate in kbps.
///
/// Rules apply in order: provider value, "kbps" substring in the note,
/// note keyword, and finally 0 for unknown.
pub fn infer_audio_bitrate(provider_abr: Option<f64>, note: &str) -> (f64, BitrateSource) {
    if let Some(abr) = provider_abr.filter(|abr| *abr > 0.0) {
        return (abr, BitrateSource::Provider);
    }
    if let Some(kbps) = parse_note_kbps(note) {
        return (kbps, BitrateSource::NoteKbps);
    }
    if let Some(kbps) = keyword_bitrate(note) {
        return (kbps, BitrateSource::NoteKeyword);
    }
    (0.0, BitrateSource::Unknown)
}

/// Nominal bitrate for a well-known placeholder identifier
pub fn identifier_bitrate(id: &str, note: &str) -> Option<f64> {
    if !AUDIO_PLACEHOLDER_IDS.contains(&id.trim()) {
        return None;
    }
    let note = note.to_lowercase();
    Some(if note.contains("low") {
        64.0
    } else if note.contains("high") {
        128.0
    } else {
        96.0
    })
}

/// Infer the bitrate of an "audio only" placeholder.
///
/// Same rules as [`infer_audio_bitrate`], with the identifier guess as the
/// last step before unknown.
pub fn infer_placeholder_bitrate(
    id: &str,
    provider_abr: Option<f64>,
    note: &str,
) -> (f64, BitrateSource) {
    match infer_audio_bitrate(provider_abr, note) {
        (_, BitrateSource::Unknown) => identifier_bitrate(id, note)
            .map(|kbps| (kbps, BitrateSource::Identifier))
            .unwrap_or((0.0, BitrateSource::Unknown)),
        inferred => inferred,
    }
}
