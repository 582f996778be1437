//! Resource reference checks performed before asking the provider

use crate::error::YtselError;
use url::Url;

/// Hosts that serve single videos on the main supported platform
const VIDEO_HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com", "youtu.be"];

/// Check if a string is a bare 11-character video identifier
pub fn is_bare_video_id(reference: &str) -> bool {
    reference.len() == 11
        && reference
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Validate a resource reference and return it trimmed.
///
/// Accepts http(s) URLs with a host and bare video identifiers; the manifest
/// provider decides whether the site is actually supported.
pub fn validate_resource(reference: &str) -> Result<String, YtselError> {
    let reference = reference.trim();
    if reference.is_empty() {
        return Err(YtselError::InvalidUrl("empty resource reference".to_string()));
    }

    if is_bare_video_id(reference) {
        return Ok(reference.to_string());
    }

    let parsed = Url::parse(reference)?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(YtselError::InvalidUrl(format!(
            "unsupported scheme '{}'",
            parsed.scheme()
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(YtselError::InvalidUrl("missing host".to_string()));
    }

    Ok(reference.to_string())
}

/// Check if URL points at the main supported video platform
pub fn is_video_url(reference: &str) -> bool {
    Url::parse(reference)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_lowercase))
        .map_or(false, |host| VIDEO_HOSTS.contains(&host.as_str()))
}

/// Check if URL also references a playlist (only the single video is fetched)
pub fn is_playlist_url(reference: &str) -> bool {
    Url::parse(reference)
        .map(|parsed| parsed.query_pairs().any(|(key, _)| key == "list"))
        .unwrap_or(false)
}
