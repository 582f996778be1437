//! Progress events forwarded from the media fetcher

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Structured progress event emitted while fetching media
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    /// Bytes are being transferred
    Downloading {
        downloaded_bytes: u64,
        /// Exact total size, when the fetcher knows it
        total_bytes: Option<u64>,
        /// Estimated total size, when only an estimate is known
        total_bytes_estimate: Option<u64>,
        /// Speed in bytes per second
        speed: Option<f64>,
        /// Estimated time remaining
        eta: Option<Duration>,
    },
    /// A file was written
    Finished { filename: PathBuf },
}

/// Callback receiving progress events
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

impl ProgressEvent {
    /// Total size, falling back to the estimate
    pub fn total(&self) -> Option<u64> {
        match self {
            ProgressEvent::Downloading {
                total_bytes,
                total_bytes_estimate,
                ..
            } => total_bytes.or(*total_bytes_estimate),
            ProgressEvent::Finished { .. } => None,
        }
    }

    /// Download progress as a percentage (0.0 to 100.0)
    pub fn percent(&self) -> Option<f64> {
        match self {
            ProgressEvent::Downloading {
                downloaded_bytes, ..
            } => self
                .total()
                .filter(|total| *total > 0)
                .map(|total| (*downloaded_bytes as f64 / total as f64 * 100.0).min(100.0)),
            ProgressEvent::Finished { .. } => Some(100.0),
        }
    }

    /// Check if the event marks a finished file
    pub fn is_finished(&self) -> bool {
        matches!(self, ProgressEvent::Finished { .. })
    }

    /// Get human-readable speed string
    pub fn speed_string(&self) -> String {
        match self {
            ProgressEvent::Downloading {
                speed: Some(speed), ..
            } => format_bytes_per_second(*speed),
            _ => "Unknown".to_string(),
        }
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: f64 = 1024.0;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let bytes_f64 = bytes as f64;
    let exp = (bytes_f64.ln() / THRESHOLD.ln()).floor() as usize;
    let exp = exp.min(UNITS.len() - 1);

    let value = bytes_f64 / THRESHOLD.powi(exp as i32);

    if exp == 0 {
        format!("{} {}", bytes, UNITS[exp])
    } else {
        format!("{:.1} {}", value, UNITS[exp])
    }
}

/// Format bytes per second as human-readable string
pub fn format_bytes_per_second(bytes_per_second: f64) -> String {
    format!("{}/s", format_bytes(bytes_per_second as u64))
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    if total_seconds < 60 {
        format!("{}s", total_seconds)
    } else if total_seconds < 3600 {
        let minutes = total_seconds / 60;
        let seconds = total_seconds % 60;
        if seconds == 0 {
            format!("{}m", minutes)
        } else {
            format!("{}m {}s", minutes, seconds)
        }
    } else {
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        if minutes == 0 {
            format!("{}h", hours)
        } else {
            format!("{}h {}m", hours, minutes)
        }
    }
}
