//! Lookup and invocation of external command-line tools

use crate::error::YtselError;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

/// Resolve a tool name or path to an executable path
pub fn locate(binary: &Path) -> Result<PathBuf, YtselError> {
    which::which(binary).map_err(|_| YtselError::ToolNotFound(binary.display().to_string()))
}

/// Availability of the external tools the pipeline relies on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependencies {
    pub yt_dlp: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
}

impl Dependencies {
    /// Check if manifests and media can be fetched
    pub fn can_fetch(&self) -> bool {
        self.yt_dlp.is_some()
    }

    /// Check if streams can be merged, converted, and probed
    pub fn can_post_process(&self) -> bool {
        self.ffmpeg.is_some()
    }
}

/// Look up every external tool
pub fn check_dependencies(yt_dlp: &Path, ffmpeg: &Path) -> Dependencies {
    Dependencies {
        yt_dlp: locate(yt_dlp).ok(),
        ffmpeg: locate(ffmpeg).ok(),
    }
}

/// Run a command to completion, killing it when the timeout expires
pub async fn run_with_timeout(
    command: &mut Command,
    timeout: Duration,
) -> Result<Output, YtselError> {
    let program = format!("{:?}", command.as_std().get_program());
    debug!("Running {} with timeout {:?}", program, timeout);

    command.kill_on_drop(true);
    match tokio::time::timeout(timeout, command.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(spawn_error(&program, e)),
        Err(_) => Err(YtselError::TimeoutError(format!(
            "{} did not finish within {:?}",
            program, timeout
        ))),
    }
}

/// Translate a spawn failure, reporting a missing binary as such
pub fn spawn_error(program: &str, error: std::io::Error) -> YtselError {
    if error.kind() == std::io::ErrorKind::NotFound {
        YtselError::ToolNotFound(program.trim_matches('"').to_string())
    } else {
        YtselError::IoError(error)
    }
}

/// Last non-empty line of a process stream, for error messages
pub fn last_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .lines()
        .rev()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("no output")
        .to_string()
}
