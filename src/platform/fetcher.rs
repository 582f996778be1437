//! Media fetchers: download the streams a selector names

use crate::core::{ProgressCallback, ProgressEvent};
use crate::error::YtselError;
use crate::platform::provider::YtDlpConfig;
use crate::platform::tools::spawn_error;
use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, SystemTime};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const PROGRESS_TAG: &str = "[ytsel:progress]";
const FILE_TAG: &str = "[ytsel:file]";

/// What happens to the fetched streams after download
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostProcessing {
    /// Keep the stream exactly as served
    None,
    /// Merge video and audio into `container`, copying both streams
    Merge { container: String },
    /// Extract and transcode the audio track
    ExtractAudio { codec: String, quality: String },
}

impl PostProcessing {
    /// Extension the final file is expected to carry, when known in advance
    pub fn expected_extension(&self) -> Option<&str> {
        match self {
            PostProcessing::None => None,
            PostProcessing::Merge { container } => Some(container.as_str()),
            PostProcessing::ExtractAudio { codec, .. } => Some(codec.as_str()),
        }
    }
}

/// A single fetch job
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub resource: String,
    pub selector: String,
    pub output_dir: PathBuf,
    /// Filename template, e.g. `%(title)s.%(ext)s`
    pub output_template: String,
    pub post_processing: PostProcessing,
}

impl FetchRequest {
    pub fn output_path_template(&self) -> PathBuf {
        self.output_dir.join(&self.output_template)
    }
}

/// Result of a finished fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchOutcome {
    /// Final file on disk, when it could be determined
    pub output: Option<PathBuf>,
}

/// Executor that downloads the streams named by a selector
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<FetchOutcome, YtselError>;
}

/// Fetcher backed by the yt-dlp executable
#[derive(Debug, Clone, Default)]
pub struct YtDlpFetcher {
    config: YtDlpConfig,
}

impl YtDlpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: YtDlpConfig) -> Self {
        Self { config }
    }

    /// Arguments for a fetch job
    pub fn fetch_args(&self, request: &FetchRequest) -> Vec<String> {
        let mut args = vec![
            "--no-playlist".to_string(),
            "--newline".to_string(),
            "--progress".to_string(),
            "--progress-template".to_string(),
            format!(
                "download:{} %(progress.status)s %(progress.downloaded_bytes)s \
                 %(progress.total_bytes)s %(progress.total_bytes_estimate)s \
                 %(progress.speed)s %(progress.eta)s",
                PROGRESS_TAG
            ),
            "--print".to_string(),
            format!("after_move:{} %(filepath)s", FILE_TAG),
            "-f".to_string(),
            request.selector.clone(),
            "-o".to_string(),
            request.output_path_template().to_string_lossy().into_owned(),
        ];

        match &request.post_processing {
            PostProcessing::None => {}
            PostProcessing::Merge { container } => {
                args.extend([
                    "--merge-output-format".to_string(),
                    container.clone(),
                    "--remux-video".to_string(),
                    container.clone(),
                    "--postprocessor-args".to_string(),
                    "ffmpeg:-c:v copy -c:a copy".to_string(),
                ]);
            }
            PostProcessing::ExtractAudio { codec, quality } => {
                args.extend([
                    "-x".to_string(),
                    "--audio-format".to_string(),
                    codec.clone(),
                    "--audio-quality".to_string(),
                    quality.clone(),
                ]);
            }
        }

        args.extend(self.config.common_args());
        args.push(request.resource.clone());
        args
    }
}

/// A line of fetcher output that carries information
#[derive(Debug, Clone, PartialEq)]
pub enum FetcherLine {
    Progress(ProgressEvent),
    File(PathBuf),
}

fn progress_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[ytsel:progress\]\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)\s+(\S+)")
            .expect("valid progress regex")
    })
}

fn number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|n| n.is_finite() && *n >= 0.0)
}

/// Parse one line of fetcher output
pub fn parse_fetcher_line(line: &str) -> Option<FetcherLine> {
    let line = line.trim();

    if let Some(path) = line.strip_prefix(FILE_TAG) {
        let path = path.trim();
        return (!path.is_empty()).then(|| FetcherLine::File(PathBuf::from(path)));
    }

    let caps = progress_regex().captures(line)?;
    if &caps[1] != "downloading" {
        return None;
    }

    Some(FetcherLine::Progress(ProgressEvent::Downloading {
        downloaded_bytes: number(&caps[2]).map(|n| n as u64).unwrap_or(0),
        total_bytes: number(&caps[3]).map(|n| n as u64),
        total_bytes_estimate: number(&caps[4]).map(|n| n as u64),
        speed: number(&caps[5]),
        eta: number(&caps[6]).and_then(|secs| Duration::try_from_secs_f64(secs).ok()),
    }))
}

/// Most recently modified file under `dir`, optionally restricted to an extension
pub fn newest_file(dir: &Path, extension: Option<&str>) -> Option<PathBuf> {
    WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            extension.map_or(true, |ext| {
                entry
                    .path()
                    .extension()
                    .map_or(false, |e| e.eq_ignore_ascii_case(ext))
            })
        })
        .filter_map(|entry| {
            let modified = entry.metadata().ok()?.modified().ok()?;
            Some((modified, entry.into_path()))
        })
        .max_by_key(|(modified, _)| *modified)
        .map(|(_, path)| path)
}

async fn pump_lines<R>(
    reader: R,
    progress: Option<ProgressCallback>,
    reported: Arc<Mutex<Option<PathBuf>>>,
) -> Vec<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    let mut other = Vec::new();

    while let Ok(Some(line)) = lines.next_line().await {
        match parse_fetcher_line(&line) {
            Some(FetcherLine::Progress(event)) => {
                if let Some(callback) = &progress {
                    callback(event);
                }
            }
            Some(FetcherLine::File(path)) => {
                if let Ok(mut slot) = reported.lock() {
                    *slot = Some(path);
                }
            }
            None => other.push(line),
        }
    }
    other
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(
        &self,
        request: &FetchRequest,
        progress: Option<ProgressCallback>,
    ) -> Result<FetchOutcome, YtselError> {
        tokio::fs::create_dir_all(&request.output_dir).await?;

        let args = self.fetch_args(request);
        info!("Fetching {} with format {}", request.resource, request.selector);
        debug!("yt-dlp arguments: {:?}", args);

        let started = SystemTime::now();
        let mut child = Command::new(&self.config.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&self.config.binary.display().to_string(), e))?;

        let reported = Arc::new(Mutex::new(None));
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| YtselError::Generic("fetcher stdout unavailable".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| YtselError::Generic("fetcher stderr unavailable".to_string()))?;

        // progress may arrive on either stream depending on yt-dlp's quiet mode
        let (_, errors, status) = tokio::join!(
            pump_lines(stdout, progress.clone(), reported.clone()),
            pump_lines(stderr, progress.clone(), reported.clone()),
            child.wait(),
        );
        let status = status?;

        if !status.success() {
            let message = errors
                .iter()
                .rev()
                .find(|l| l.contains("ERROR"))
                .or_else(|| errors.last())
                .cloned()
                .unwrap_or_else(|| format!("yt-dlp exited with {}", status));
            return Err(YtselError::DownloadFailed(message));
        }

        let reported = reported.lock().ok().and_then(|slot| slot.clone());
        let output = match reported {
            Some(path) => Some(path),
            None => {
                warn!("yt-dlp did not report the output path; scanning output directory");
                newest_file(
                    &request.output_dir,
                    request.post_processing.expected_extension(),
                )
                .filter(|path| {
                    std::fs::metadata(path)
                        .and_then(|m| m.modified())
                        .map_or(false, |modified| modified >= started)
                })
            }
        };

        if let (Some(path), Some(callback)) = (&output, &progress) {
            callback(ProgressEvent::Finished {
                filename: path.clone(),
            });
        }

        Ok(FetchOutcome { output })
    }
}
