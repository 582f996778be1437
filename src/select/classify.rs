//! Stream classification into video and audio formats

use crate::core::format::{AudioFormat, VideoFormat, UNKNOWN_CODEC};
use crate::core::manifest::{StreamDescriptor, AUDIO_ONLY_RESOLUTION};
use crate::select::bitrate::{infer_audio_bitrate, infer_placeholder_bitrate};
use tracing::debug;

/// Video and audio formats derived from one stream list, in manifest order
#[derive(Debug, Clone, Default)]
pub struct Classified {
    pub videos: Vec<VideoFormat>,
    pub audios: Vec<AudioFormat>,
}

/// Quality bucket label for a height
pub fn standard_label(height: u32) -> String {
    if height >= 4320 {
        "8K".to_string()
    } else if height >= 2160 {
        "4K".to_string()
    } else {
        format!("{}p", height)
    }
}

/// Precise and standard resolution labels for a stream
pub fn resolution_labels(
    width: Option<u32>,
    height: Option<u32>,
    provider_resolution: Option<&str>,
) -> (String, String) {
    let width = width.filter(|w| *w > 0);
    let height = height.filter(|h| *h > 0);

    match (width, height) {
        (Some(w), Some(h)) => (format!("{}x{}", w, h), standard_label(h)),
        (None, Some(h)) => {
            let label = standard_label(h);
            (label.clone(), label)
        }
        _ => {
            let label = provider_resolution
                .filter(|r| !r.is_empty())
                .unwrap_or("unknown")
                .to_string();
            (label.clone(), label)
        }
    }
}

/// Classify a single stream as a video format
pub fn classify_video(stream: &StreamDescriptor) -> Option<VideoFormat> {
    let vcodec = stream.video_codec()?;
    let (resolution_precise, resolution_standard) =
        resolution_labels(stream.width, stream.height, stream.resolution.as_deref());

    Some(VideoFormat {
        id: stream.id.clone(),
        ext: stream.ext.clone().unwrap_or_else(|| "unknown".to_string()),
        height: stream.height.unwrap_or(0),
        width: stream.width.unwrap_or(0),
        fps: stream.fps.unwrap_or(0.0),
        tbr: stream.tbr.unwrap_or(0.0),
        vbr: stream.vbr.unwrap_or(0.0),
        abr: stream.abr.unwrap_or(0.0),
        vcodec: vcodec.to_string(),
        acodec: stream.audio_codec().map(str::to_string),
        filesize: stream.size(),
        has_audio: stream.has_audio(),
        resolution_precise,
        resolution_standard,
        format_note: stream.note().to_string(),
    })
}

/// Classify a single stream as an audio-only format
pub fn classify_audio(stream: &StreamDescriptor) -> Option<AudioFormat> {
    if stream.has_video() {
        return None;
    }

    let (acodec, (abr, source)) = match stream.audio_codec() {
        Some(codec) => (
            codec.to_string(),
            infer_audio_bitrate(stream.abr, stream.note()),
        ),
        // Placeholders labelled "audio only" without codec info
        None if stream.resolution.as_deref() == Some(AUDIO_ONLY_RESOLUTION) => (
            UNKNOWN_CODEC.to_string(),
            infer_placeholder_bitrate(&stream.id, stream.abr, stream.note()),
        ),
        None => return None,
    };

    debug!(
        "Audio format {}: {} kbps ({:?})",
        stream.id, abr, source
    );

    Some(AudioFormat {
        id: stream.id.clone(),
        ext: stream.ext.clone().unwrap_or_else(|| "unknown".to_string()),
        filesize: stream.size(),
        acodec,
        abr,
        format_note: stream.note().to_string(),
    })
}

/// Partition a raw stream list into video and audio formats.
///
/// Entries without an identifier are skipped; they could never be
/// referenced by a selector.
pub fn classify_streams(streams: &[StreamDescriptor]) -> Classified {
    let mut classified = Classified::default();

    for stream in streams.iter().filter(|s| !s.id.trim().is_empty()) {
        if let Some(video) = classify_video(stream) {
            classified.videos.push(video);
        }
        if let Some(audio) = classify_audio(stream) {
            classified.audios.push(audio);
        }
    }

    debug!(
        "Classified {} streams into {} video and {} audio formats",
        streams.len(),
        classified.videos.len(),
        classified.audios.len()
    );
    classified
}
