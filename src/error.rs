//! Error types for ytsel

use thiserror::Error;

/// Main error type for ytsel operations
#[derive(Debug, Error)]
pub enum YtselError {
    #[error("Video information unavailable: {0}")]
    ManifestUnavailable(String),

    #[error("No compatible audio stream for video format {0}")]
    NoCompatibleAudio(String),

    #[error("Cannot resolve quality '{0}' to an available format")]
    UnresolvableQuality(String),

    #[error("Format {selector} is no longer available and no suitable fallback was found")]
    FormatNoLongerAvailable { selector: String },

    #[error("Could not verify audio in merged output: {0}")]
    MergeVerificationInconclusive(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Required tool not found: {0}")]
    ToolNotFound(String),

    #[error("Timeout error: {0}")]
    TimeoutError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("Generic error: {0}")]
    Generic(String),
}

impl YtselError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            YtselError::TimeoutError(_) | YtselError::ManifestUnavailable(_)
        )
    }

    /// Check if error should be surfaced as a warning rather than a failure
    pub fn is_warning(&self) -> bool {
        matches!(self, YtselError::MergeVerificationInconclusive(_))
    }
}
