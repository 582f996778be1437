//! Pairing of video formats with audio and catalog construction

use crate::core::format::{AudioFormat, Catalog, DownloadableFormat, VideoFormat};
use crate::core::manifest::Manifest;
use crate::error::YtselError;
use crate::select::classify::classify_streams;
use crate::select::rank::{best_audio, compare_downloadable, rank_audios, rank_videos};
use tracing::debug;

/// Turn one video format into a downloadable entry.
///
/// Muxed formats are reused as-is; video-only formats are combined with the
/// best-ranked audio format.
pub fn pair_with_audio(
    video: &VideoFormat,
    audios: &[AudioFormat],
    merge_format: &str,
) -> Result<DownloadableFormat, YtselError> {
    if video.has_audio {
        return Ok(DownloadableFormat::single(video));
    }

    best_audio(audios)
        .map(|audio| DownloadableFormat::combined(video, audio, merge_format))
        .ok_or_else(|| YtselError::NoCompatibleAudio(video.id.clone()))
}

/// Build downloadable entries for every pairable video format, best first
pub fn downloadable_formats(
    videos: &[VideoFormat],
    audios: &[AudioFormat],
    merge_format: &str,
) -> Vec<DownloadableFormat> {
    let mut formats: Vec<DownloadableFormat> = videos
        .iter()
        .filter_map(|video| match pair_with_audio(video, audios, merge_format) {
            Ok(format) => Some(format),
            Err(e) => {
                debug!("Excluding from catalog: {}", e);
                None
            }
        })
        .collect();

    formats.sort_by(compare_downloadable);
    formats
}

/// Classify, rank, and pair one manifest snapshot
pub fn build_catalog(manifest: &Manifest, merge_format: &str) -> Catalog {
    let classified = classify_streams(&manifest.streams);
    let videos = rank_videos(&classified.videos);
    let audios = rank_audios(&classified.audios);
    let downloadable = downloadable_formats(&videos, &audios, merge_format);

    Catalog {
        videos,
        audios,
        downloadable,
        info: manifest.info(),
    }
}
