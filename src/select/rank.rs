//! Quality ranking of classified formats

use crate::core::format::{AudioFormat, DownloadableFormat, VideoFormat};
use std::cmp::Ordering;

/// Descending order by (height, fps, total bitrate)
pub fn compare_videos(a: &VideoFormat, b: &VideoFormat) -> Ordering {
    b.height
        .cmp(&a.height)
        .then_with(|| b.fps.total_cmp(&a.fps))
        .then_with(|| b.tbr.total_cmp(&a.tbr))
}

/// Descending order with known bitrates first, then by bitrate
pub fn compare_audios(a: &AudioFormat, b: &AudioFormat) -> Ordering {
    (b.abr > 0.0)
        .cmp(&(a.abr > 0.0))
        .then_with(|| b.abr.total_cmp(&a.abr))
}

/// Descending order by (height, fps)
pub fn compare_downloadable(a: &DownloadableFormat, b: &DownloadableFormat) -> Ordering {
    b.height
        .cmp(&a.height)
        .then_with(|| b.fps.total_cmp(&a.fps))
}

/// Video formats sorted best first; ties keep manifest order
pub fn rank_videos(videos: &[VideoFormat]) -> Vec<VideoFormat> {
    let mut ranked = videos.to_vec();
    ranked.sort_by(compare_videos);
    ranked
}

/// Audio formats sorted best first; ties keep manifest order
pub fn rank_audios(audios: &[AudioFormat]) -> Vec<AudioFormat> {
    let mut ranked = audios.to_vec();
    ranked.sort_by(compare_audios);
    ranked
}

/// Highest-ranked audio format, first in manifest order on ties
pub fn best_audio(audios: &[AudioFormat]) -> Option<&AudioFormat> {
    audios.iter().min_by(|a, b| compare_audios(a, b))
}

/// Highest-ranked video format, first in manifest order on ties
pub fn best_video(videos: &[VideoFormat]) -> Option<&VideoFormat> {
    videos.iter().min_by(|a, b| compare_videos(a, b))
}
