//! Command line argument parsing

use crate::core::{DownloadKind, DEFAULT_MERGE_FORMAT};
use crate::platform::{ProbeConfig, YtDlpConfig};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// YTSEL - pick the best formats of a video and download them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Video URL or ID
    pub url: String,

    /// Quality label ('1080p', '4K', '1920x1080') or format selector ('137+140')
    #[arg(short, long, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Output filename template
    #[arg(long, value_name = "TEMPLATE")]
    pub output_template: Option<String>,

    /// List downloadable formats and exit
    #[arg(short = 'F', long)]
    pub list_formats: bool,

    /// List every stream of the manifest and exit
    #[arg(long)]
    pub raw: bool,

    /// Show the scored candidates for the requested quality and exit
    #[arg(long, requires = "format")]
    pub analyze: bool,

    /// Print the resolved format selector and exit (no download)
    #[arg(short = 'g', long)]
    pub print_selector: bool,

    /// Extract audio only
    #[arg(short = 'x', long, conflicts_with = "raw_audio")]
    pub audio: bool,

    /// Download audio only, without conversion
    #[arg(long)]
    pub raw_audio: bool,

    /// Codec for extracted audio
    #[arg(long, value_name = "CODEC", default_value = "mp3")]
    pub audio_format: String,

    /// Quality for extracted audio (kbps or VBR level)
    #[arg(long, value_name = "QUALITY", default_value = "192")]
    pub audio_quality: String,

    /// Container for merged video and audio
    #[arg(long, value_name = "EXT", default_value = DEFAULT_MERGE_FORMAT)]
    pub merge_format: String,

    /// Skip the same-height refinement when resolving quality labels
    #[arg(long)]
    pub no_refine: bool,

    /// Skip the audio check of merged files
    #[arg(long)]
    pub no_verify: bool,

    /// Disable progress output
    #[arg(long)]
    pub no_progress: bool,

    /// Manifest fetch timeout (e.g., 30s, 1m)
    #[arg(long, value_name = "DURATION", default_value = "60s")]
    pub timeout: humantime::Duration,

    /// Manifest fetch retries for transient errors
    #[arg(long, default_value = "3")]
    pub retries: u32,

    /// Path to the yt-dlp executable
    #[arg(long, value_name = "PATH", default_value = "yt-dlp")]
    pub yt_dlp: PathBuf,

    /// Path to the ffmpeg executable
    #[arg(long, value_name = "PATH", default_value = "ffmpeg")]
    pub ffmpeg: PathBuf,

    /// Override User-Agent header
    #[arg(long, value_name = "USER_AGENT")]
    pub user_agent: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet output (only errors)
    #[arg(short, long)]
    pub quiet: bool,
}

/// What the invocation should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    ListFormats,
    RawFormats,
    Analyze,
    PrintSelector,
    Download,
}

impl Args {
    /// Get manifest fetch timeout as Duration
    pub fn timeout_duration(&self) -> Duration {
        self.timeout.into()
    }

    /// Get output verbosity level
    pub fn verbosity_level(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    /// Default log filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }

    pub fn mode(&self) -> Mode {
        if self.raw {
            Mode::RawFormats
        } else if self.list_formats {
            Mode::ListFormats
        } else if self.analyze {
            Mode::Analyze
        } else if self.print_selector {
            Mode::PrintSelector
        } else {
            Mode::Download
        }
    }

    pub fn download_kind(&self) -> DownloadKind {
        if self.raw_audio {
            DownloadKind::RawAudio
        } else if self.audio {
            DownloadKind::Audio {
                codec: self.audio_format.clone(),
                quality: self.audio_quality.clone(),
            }
        } else {
            DownloadKind::Video
        }
    }

    pub fn yt_dlp_config(&self) -> YtDlpConfig {
        let mut config = YtDlpConfig::default()
            .with_binary(self.yt_dlp.clone())
            .with_timeout(self.timeout_duration())
            .with_max_retries(self.retries);
        if let Some(user_agent) = &self.user_agent {
            config = config.with_user_agent(user_agent.clone());
        }
        config
    }

    pub fn probe_config(&self) -> ProbeConfig {
        ProbeConfig {
            ffmpeg: self.ffmpeg.clone(),
            ..ProbeConfig::default()
        }
    }
}

/// Output verbosity level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityLevel {
    /// Quiet (only errors)
    Quiet,
    /// Normal
    Normal,
    /// Verbose (debug info)
    Verbose,
}

// Implement Default for Args to make tests work
impl Default for Args {
    fn default() -> Self {
        Self {
            url: String::new(),
            format: None,
            output: None,
            output_template: None,
            list_formats: false,
            raw: false,
            analyze: false,
            print_selector: false,
            audio: false,
            raw_audio: false,
            audio_format: "mp3".to_string(),
            audio_quality: "192".to_string(),
            merge_format: DEFAULT_MERGE_FORMAT.to_string(),
            no_refine: false,
            no_verify: false,
            no_progress: false,
            timeout: humantime::Duration::from(Duration::from_secs(60)),
            retries: 3,
            yt_dlp: PathBuf::from("yt-dlp"),
            ffmpeg: PathBuf::from("ffmpeg"),
            user_agent: None,
            verbose: false,
            quiet: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command_line() {
        let args = Args::try_parse_from([
            "ytsel",
            "-f",
            "1080p",
            "-o",
            "/tmp/videos",
            "--timeout",
            "2m",
            "--no-refine",
            "https://youtu.be/dQw4w9WgXcQ",
        ])
        .unwrap();

        assert_eq!(args.url, "https://youtu.be/dQw4w9WgXcQ");
        assert_eq!(args.format.as_deref(), Some("1080p"));
        assert_eq!(args.output, Some(PathBuf::from("/tmp/videos")));
        assert_eq!(args.timeout_duration(), Duration::from_secs(120));
        assert!(args.no_refine);
        assert_eq!(args.mode(), Mode::Download);
    }

    #[test]
    fn test_analyze_requires_format() {
        assert!(Args::try_parse_from(["ytsel", "--analyze", "dQw4w9WgXcQ"]).is_err());
        assert!(Args::try_parse_from(["ytsel", "--analyze", "-f", "4K", "dQw4w9WgXcQ"]).is_ok());
    }

    #[test]
    fn test_audio_flags_conflict() {
        assert!(Args::try_parse_from(["ytsel", "-x", "--raw-audio", "dQw4w9WgXcQ"]).is_err());
    }

    #[test]
    fn test_args_verbosity_level() {
        let args = Args {
            quiet: true,
            ..Default::default()
        };
        assert_eq!(args.verbosity_level(), VerbosityLevel::Quiet);
        assert_eq!(args.log_filter(), "warn");

        let args = Args {
            verbose: true,
            ..Default::default()
        };
        assert_eq!(args.verbosity_level(), VerbosityLevel::Verbose);
        assert_eq!(args.log_filter(), "debug");

        assert_eq!(Args::default().verbosity_level(), VerbosityLevel::Normal);
    }

    #[test]
    fn test_mode_precedence() {
        let args = Args {
            raw: true,
            list_formats: true,
            ..Default::default()
        };
        assert_eq!(args.mode(), Mode::RawFormats);

        let args = Args {
            list_formats: true,
            print_selector: true,
            ..Default::default()
        };
        assert_eq!(args.mode(), Mode::ListFormats);

        let args = Args {
            print_selector: true,
            ..Default::default()
        };
        assert_eq!(args.mode(), Mode::PrintSelector);
    }

    #[test]
    fn test_download_kind() {
        assert_eq!(Args::default().download_kind(), DownloadKind::Video);

        let args = Args {
            audio: true,
            audio_format: "opus".to_string(),
            ..Default::default()
        };
        assert_eq!(
            args.download_kind(),
            DownloadKind::Audio {
                codec: "opus".to_string(),
                quality: "192".to_string()
            }
        );

        let args = Args {
            raw_audio: true,
            ..Default::default()
        };
        assert_eq!(args.download_kind(), DownloadKind::RawAudio);
    }

    #[test]
    fn test_collaborator_configs() {
        let args = Args {
            yt_dlp: PathBuf::from("/opt/yt-dlp"),
            ffmpeg: PathBuf::from("/opt/ffmpeg"),
            retries: 5,
            user_agent: Some("Custom Agent".to_string()),
            ..Default::default()
        };

        let config = args.yt_dlp_config();
        assert_eq!(config.binary, PathBuf::from("/opt/yt-dlp"));
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent.as_deref(), Some("Custom Agent"));

        assert_eq!(args.probe_config().ffmpeg, PathBuf::from("/opt/ffmpeg"));
    }

    #[test]
    fn test_args_default_values() {
        let args = Args::default();
        assert_eq!(args.url, "");
        assert_eq!(args.format, None);
        assert_eq!(args.output, None);
        assert_eq!(args.audio_format, "mp3");
        assert_eq!(args.audio_quality, "192");
        assert_eq!(args.merge_format, "mp4");
        assert_eq!(args.retries, 3);
        assert!(!args.no_progress);
        assert!(!args.no_verify);
        assert_eq!(args.mode(), Mode::Download);
    }
}
