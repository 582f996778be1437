//! Provider manifest structures

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Placeholder the provider uses for "this codec type is absent"
pub const NONE_SENTINEL: &str = "none";

/// Resolution string the provider assigns to audio-only placeholder entries
pub const AUDIO_ONLY_RESOLUTION: &str = "audio only";

/// Check whether a codec field carries a usable codec name
pub fn codec_present(codec: Option<&str>) -> bool {
    matches!(codec, Some(c) if !c.trim().is_empty() && c != NONE_SENTINEL)
}

/// One stream entry as received from the manifest provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamDescriptor {
    /// Opaque stream identifier
    #[serde(rename = "format_id", deserialize_with = "string_or_number")]
    pub id: String,
    /// Container extension
    pub ext: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Frame rate
    pub fps: Option<f64>,
    /// Total bitrate in kbps
    pub tbr: Option<f64>,
    /// Video bitrate in kbps
    pub vbr: Option<f64>,
    /// Audio bitrate in kbps
    pub abr: Option<f64>,
    /// Video codec, or the none-sentinel
    pub vcodec: Option<String>,
    /// Audio codec, or the none-sentinel
    pub acodec: Option<String>,
    /// Exact size in bytes
    pub filesize: Option<u64>,
    /// Estimated size in bytes when the exact size is unknown
    pub filesize_approx: Option<u64>,
    /// Free-text note (e.g. "medium", "1080p60", "48kbps")
    pub format_note: Option<String>,
    /// Provider resolution string (e.g. "1920x1080", "audio only")
    pub resolution: Option<String>,
    /// Provider-assigned quality score, not used for ranking
    pub quality: Option<f64>,
}

impl StreamDescriptor {
    /// Create a descriptor with only an identifier and extension set
    pub fn new(id: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ext: Some(ext.into()),
            ..Default::default()
        }
    }

    /// Set video dimensions
    pub fn with_dimensions(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set frame rate
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = Some(fps);
        self
    }

    /// Set video and audio codecs
    pub fn with_codecs(mut self, vcodec: &str, acodec: &str) -> Self {
        self.vcodec = Some(vcodec.to_string());
        self.acodec = Some(acodec.to_string());
        self
    }

    /// Set audio bitrate
    pub fn with_abr(mut self, abr: f64) -> Self {
        self.abr = Some(abr);
        self
    }

    /// Set total bitrate
    pub fn with_tbr(mut self, tbr: f64) -> Self {
        self.tbr = Some(tbr);
        self
    }

    /// Set byte size
    pub fn with_filesize(mut self, filesize: u64) -> Self {
        self.filesize = Some(filesize);
        self
    }

    /// Set format note
    pub fn with_note(mut self, note: &str) -> Self {
        self.format_note = Some(note.to_string());
        self
    }

    /// Set provider resolution string
    pub fn with_resolution(mut self, resolution: &str) -> Self {
        self.resolution = Some(resolution.to_string());
        self
    }

    /// Usable video codec, if any
    pub fn video_codec(&self) -> Option<&str> {
        self.vcodec.as_deref().filter(|c| codec_present(Some(c)))
    }

    /// Usable audio codec, if any
    pub fn audio_codec(&self) -> Option<&str> {
        self.acodec.as_deref().filter(|c| codec_present(Some(c)))
    }

    /// Check if stream carries video
    pub fn has_video(&self) -> bool {
        self.video_codec().is_some()
    }

    /// Check if stream carries audio
    pub fn has_audio(&self) -> bool {
        self.audio_codec().is_some()
    }

    /// Check if stream is muxed (video+audio combined)
    pub fn is_muxed(&self) -> bool {
        self.has_video() && self.has_audio()
    }

    /// Byte size, preferring the exact size over the estimate
    pub fn size(&self) -> u64 {
        self.filesize.or(self.filesize_approx).unwrap_or(0)
    }

    /// Format note, empty when absent
    pub fn note(&self) -> &str {
        self.format_note.as_deref().unwrap_or("")
    }
}

/// Stream list plus resource metadata for one resource at one point in time
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Manifest {
    /// Provider identifier of the resource
    pub id: Option<String>,
    pub title: String,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    /// Upload date as YYYYMMDD
    pub upload_date: Option<String>,
    /// Available streams
    #[serde(rename = "formats", alias = "streams")]
    pub streams: Vec<StreamDescriptor>,
}

impl Manifest {
    /// Create a manifest from a title and a stream list
    pub fn new(title: impl Into<String>, streams: Vec<StreamDescriptor>) -> Self {
        Self {
            title: title.into(),
            streams,
            ..Default::default()
        }
    }

    /// Parse a manifest from provider JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Identifiers of every referenceable stream
    pub fn identifiers(&self) -> HashSet<&str> {
        self.streams
            .iter()
            .map(|s| s.id.as_str())
            .filter(|id| !id.is_empty())
            .collect()
    }

    /// Look up a stream by identifier
    pub fn stream(&self, id: &str) -> Option<&StreamDescriptor> {
        self.streams.iter().find(|s| s.id == id)
    }

    /// Check if the manifest has any stream at all
    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Resource metadata summary
    pub fn info(&self) -> VideoInfo {
        VideoInfo {
            id: self.id.clone(),
            title: self.title.clone(),
            duration: self.duration,
            uploader: self.uploader.clone(),
            view_count: self.view_count,
            upload_date: self
                .upload_date
                .as_deref()
                .and_then(|d| NaiveDate::parse_from_str(d, "%Y%m%d").ok()),
            stream_count: self.streams.len(),
        }
    }
}

/// Video metadata shown alongside the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: Option<String>,
    pub title: String,
    /// Duration in seconds
    pub duration: Option<f64>,
    pub uploader: Option<String>,
    pub view_count: Option<u64>,
    pub upload_date: Option<NaiveDate>,
    /// Number of raw streams in the manifest
    pub stream_count: usize,
}

impl VideoInfo {
    /// Get human-readable duration string
    pub fn duration_string(&self) -> String {
        match self.duration {
            Some(secs) if secs > 0.0 => Duration::try_from_secs_f64(secs)
                .map(crate::core::progress::format_duration)
                .unwrap_or_else(|_| "Unknown".to_string()),
            _ => "Unknown".to_string(),
        }
    }

    /// Get human-readable view count string
    pub fn view_count_string(&self) -> String {
        match self.view_count {
            Some(views) => {
                let digits = views.to_string();
                let mut out = String::with_capacity(digits.len() + digits.len() / 3);
                for (i, c) in digits.chars().enumerate() {
                    if i > 0 && (digits.len() - i) % 3 == 0 {
                        out.push(',');
                    }
                    out.push(c);
                }
                out
            }
            None => "Unknown".to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Id {
        Text(String),
        Int(i64),
        Float(f64),
    }

    Ok(match Option::<Id>::deserialize(deserializer)? {
        Some(Id::Text(s)) => s,
        Some(Id::Int(n)) => n.to_string(),
        Some(Id::Float(n)) => n.to_string(),
        None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "id": "abc123",
        "title": "Sample Video",
        "duration": 213.0,
        "uploader": "Someone",
        "view_count": 1234567,
        "upload_date": "20240315",
        "formats": [
            {"format_id": "sb0", "ext": "mhtml", "vcodec": "none", "acodec": "none", "format_note": "storyboard"},
            {"format_id": "140", "ext": "m4a", "vcodec": "none", "acodec": "mp4a.40.2", "abr": 129.5, "filesize": 3456789},
            {"format_id": "137", "ext": "mp4", "width": 1920, "height": 1080, "fps": 30, "vcodec": "avc1.640028", "acodec": "none", "tbr": 4400.1},
            {"format_id": 22, "ext": "mp4", "width": 1280, "height": 720, "vcodec": "avc1.64001F", "acodec": "mp4a.40.2", "unknown_field": true}
        ]
    }"#;

    #[test]
    fn test_manifest_from_json() {
        let manifest = Manifest::from_json(SAMPLE).unwrap();
        assert_eq!(manifest.title, "Sample Video");
        assert_eq!(manifest.streams.len(), 4);
        assert_eq!(manifest.streams[3].id, "22");
        assert_eq!(manifest.streams[2].height, Some(1080));
        assert_eq!(manifest.streams[1].abr, Some(129.5));
    }

    #[test]
    fn test_codec_presence() {
        assert!(!codec_present(None));
        assert!(!codec_present(Some("")));
        assert!(!codec_present(Some("none")));
        assert!(codec_present(Some("opus")));

        let manifest = Manifest::from_json(SAMPLE).unwrap();
        let storyboard = &manifest.streams[0];
        assert!(!storyboard.has_video());
        assert!(!storyboard.has_audio());
        assert!(manifest.streams[3].is_muxed());
        assert!(manifest.streams[2].has_video() && !manifest.streams[2].has_audio());
    }

    #[test]
    fn test_manifest_identifiers_skip_empty() {
        let manifest = Manifest::new(
            "t",
            vec![
                StreamDescriptor::new("18", "mp4"),
                StreamDescriptor::new("", "mp4"),
            ],
        );
        let ids = manifest.identifiers();
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("18"));
        assert!(manifest.stream("18").is_some());
    }

    #[test]
    fn test_video_info() {
        let info = Manifest::from_json(SAMPLE).unwrap().info();
        assert_eq!(info.title, "Sample Video");
        assert_eq!(info.upload_date, NaiveDate::from_ymd_opt(2024, 3, 15));
        assert_eq!(info.duration_string(), "3m 33s");
        assert_eq!(info.view_count_string(), "1,234,567");
        assert_eq!(info.stream_count, 4);
    }

    #[test]
    fn test_out_of_range_duration_is_unknown() {
        let json = r#"{"title": "Endless", "duration": 1e30, "formats": []}"#;
        let info = Manifest::from_json(json).unwrap().info();
        assert_eq!(info.duration_string(), "Unknown");
    }

    #[test]
    fn test_stream_size_prefers_exact() {
        let mut stream = StreamDescriptor::new("1", "mp4");
        assert_eq!(stream.size(), 0);
        stream.filesize_approx = Some(500);
        assert_eq!(stream.size(), 500);
        stream.filesize = Some(700);
        assert_eq!(stream.size(), 700);
    }
}
