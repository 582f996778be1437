//! Post-download inspection of merged files

use crate::error::YtselError;
use crate::platform::tools::run_with_timeout;
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Checks whether a media file carries an audio stream
#[async_trait]
pub trait AudioProbe: Send + Sync {
    /// `Ok(false)` means the file was read and has no audio. Any failure to
    /// read it is reported as `MergeVerificationInconclusive`.
    async fn has_audio_stream(&self, path: &Path) -> Result<bool, YtselError>;
}

/// Settings for the ffmpeg executable
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub ffmpeg: PathBuf,
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Probe that reads stream headers through `ffmpeg -i`
#[derive(Debug, Clone, Default)]
pub struct FfmpegProbe {
    config: ProbeConfig,
}

impl FfmpegProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ProbeConfig) -> Self {
        Self { config }
    }
}

fn audio_stream_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*Stream #\d+:\d+.*:\s*Audio:").expect("audio stream pattern is valid"))
}

/// Check ffmpeg's stream listing for an audio stream
pub fn lists_audio_stream(ffmpeg_output: &str) -> bool {
    audio_stream_regex().is_match(ffmpeg_output)
}

#[async_trait]
impl AudioProbe for FfmpegProbe {
    async fn has_audio_stream(&self, path: &Path) -> Result<bool, YtselError> {
        if !path.is_file() {
            return Err(YtselError::MergeVerificationInconclusive(format!(
                "{} does not exist",
                path.display()
            )));
        }

        let mut command = Command::new(&self.config.ffmpeg);
        command
            .arg("-hide_banner")
            .arg("-i")
            .arg(path)
            .args(["-f", "null", "-"]);

        let output = run_with_timeout(&mut command, self.config.timeout)
            .await
            .map_err(|e| YtselError::MergeVerificationInconclusive(e.to_string()))?;

        if !output.status.success() {
            return Err(YtselError::MergeVerificationInconclusive(format!(
                "ffmpeg exited with {}",
                output.status
            )));
        }

        let listing = String::from_utf8_lossy(&output.stderr);
        let has_audio = lists_audio_stream(&listing);
        debug!("{} has audio stream: {}", path.display(), has_audio);
        Ok(has_audio)
    }
}
