//! Classified format structures

use crate::core::manifest::VideoInfo;
use serde::{Deserialize, Serialize};

/// Container used when a video-only stream is merged with an audio stream
pub const DEFAULT_MERGE_FORMAT: &str = "mp4";

/// Codec string used for audio placeholders without codec info
pub const UNKNOWN_CODEC: &str = "unknown";

/// A stream carrying video, with or without built-in audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoFormat {
    pub id: String,
    pub ext: String,
    /// Height in pixels, 0 when unknown
    pub height: u32,
    /// Width in pixels, 0 when unknown
    pub width: u32,
    pub fps: f64,
    /// Total bitrate in kbps
    pub tbr: f64,
    /// Video bitrate in kbps
    pub vbr: f64,
    /// Audio bitrate in kbps
    pub abr: f64,
    pub vcodec: String,
    pub acodec: Option<String>,
    /// Byte size, 0 when unknown
    pub filesize: u64,
    pub has_audio: bool,
    /// Exact dimensions, e.g. "1920x1080"
    pub resolution_precise: String,
    /// Quality bucket, e.g. "1080p" or "4K"
    pub resolution_standard: String,
    pub format_note: String,
}

impl VideoFormat {
    /// Check if the format needs an audio companion
    pub fn is_video_only(&self) -> bool {
        !self.has_audio
    }

    /// Get human-readable size string
    pub fn size_string(&self) -> String {
        if self.filesize > 0 {
            crate::core::progress::format_bytes(self.filesize)
        } else {
            "Unknown".to_string()
        }
    }
}

/// An audio-only stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub id: String,
    pub ext: String,
    /// Byte size, 0 when unknown
    pub filesize: u64,
    /// Audio codec, or "unknown" for placeholders
    pub acodec: String,
    /// Bitrate in kbps, 0 when unknown
    pub abr: f64,
    pub format_note: String,
}

impl AudioFormat {
    /// Get human-readable bitrate string
    pub fn bitrate_string(&self) -> String {
        bitrate_label(self.abr)
    }
}

/// How a downloadable entry is fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadType {
    /// Muxed stream downloaded as-is
    Single,
    /// Video-only stream merged with an audio stream
    Combined,
}

/// An entry of the downloadable catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadableFormat {
    /// Selector passed to the media fetcher ("22" or "137+251")
    pub selector: String,
    pub download_type: DownloadType,
    pub video_id: String,
    pub audio_id: Option<String>,
    /// Output container
    pub ext: String,
    pub audio_ext: Option<String>,
    pub resolution_standard: String,
    pub resolution_precise: String,
    pub height: u32,
    pub width: u32,
    pub fps: f64,
    pub vcodec: String,
    pub acodec: Option<String>,
    pub filesize: u64,
    pub tbr: f64,
    /// Audio bitrate in kbps
    pub abr: f64,
    pub description: String,
}

impl DownloadableFormat {
    /// Build a single-format entry from a muxed video format
    pub fn single(video: &VideoFormat) -> Self {
        Self {
            selector: video.id.clone(),
            download_type: DownloadType::Single,
            video_id: video.id.clone(),
            audio_id: None,
            ext: video.ext.clone(),
            audio_ext: None,
            resolution_standard: video.resolution_standard.clone(),
            resolution_precise: video.resolution_precise.clone(),
            height: video.height,
            width: video.width,
            fps: video.fps,
            vcodec: video.vcodec.clone(),
            acodec: video.acodec.clone(),
            filesize: video.filesize,
            tbr: video.tbr,
            abr: video.abr,
            description: format!(
                "{} with audio ({})",
                video.resolution_standard, video.resolution_precise
            ),
        }
    }

    /// Build a combined entry from a video-only format and its audio companion
    pub fn combined(video: &VideoFormat, audio: &AudioFormat, merge_format: &str) -> Self {
        Self {
            selector: combine_selector(&video.id, &audio.id),
            download_type: DownloadType::Combined,
            video_id: video.id.clone(),
            audio_id: Some(audio.id.clone()),
            ext: merge_format.to_string(),
            audio_ext: Some(audio.ext.clone()),
            resolution_standard: video.resolution_standard.clone(),
            resolution_precise: video.resolution_precise.clone(),
            height: video.height,
            width: video.width,
            fps: video.fps,
            vcodec: video.vcodec.clone(),
            acodec: Some(audio.acodec.clone()),
            filesize: video.filesize,
            tbr: video.tbr,
            abr: audio.abr,
            description: format!(
                "{} + {} audio ({})",
                video.resolution_standard,
                bitrate_label(audio.abr),
                video.resolution_precise
            ),
        }
    }

    /// Check if the entry merges two streams
    pub fn is_combined(&self) -> bool {
        self.download_type == DownloadType::Combined
    }
}

/// Immutable snapshot of everything derived from one manifest fetch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalog {
    /// Video formats, best first
    pub videos: Vec<VideoFormat>,
    /// Audio-only formats, best first
    pub audios: Vec<AudioFormat>,
    /// Downloadable entries, best first
    pub downloadable: Vec<DownloadableFormat>,
    pub info: VideoInfo,
}

/// Join a video and an audio identifier into a merge selector
pub fn combine_selector(video_id: &str, audio_id: &str) -> String {
    format!("{}+{}", video_id, audio_id)
}

/// Format an audio bitrate in kbps, "unknown" when zero
pub fn bitrate_label(abr: f64) -> String {
    if abr > 0.0 {
        format!("{}kbps", abr.round() as u64)
    } else {
        "unknown".to_string()
    }
}
