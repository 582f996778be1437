//! Output formatting and progress display

use crate::cli::args::VerbosityLevel;
use crate::core::progress::{format_bytes, format_duration};
use crate::core::{
    AudioFormat, Catalog, DownloadReport, DownloadableFormat, Manifest, ProgressCallback,
    ProgressEvent, StreamDescriptor, VideoInfo,
};
use crate::select::QualityAnalysis;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

/// Output formatter for ytsel
pub struct OutputFormatter {
    verbosity: VerbosityLevel,
    progress_bar: Option<ProgressBar>,
}

impl OutputFormatter {
    /// Create a new output formatter
    pub fn new(verbosity: VerbosityLevel) -> Self {
        Self {
            verbosity,
            progress_bar: None,
        }
    }

    /// Create a progress bar for downloads; the length is set by the first event
    pub fn create_progress_bar(&mut self) -> Option<ProgressBar> {
        if self.verbosity == VerbosityLevel::Quiet {
            return None;
        }

        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");

        let progress_bar = ProgressBar::new(0);
        progress_bar.set_style(style);
        progress_bar.set_message("Downloading...");

        self.progress_bar = Some(progress_bar.clone());
        Some(progress_bar)
    }

    /// Update progress bar
    pub fn update_progress(&self, event: &ProgressEvent) {
        let Some(progress_bar) = &self.progress_bar else {
            return;
        };

        match event {
            ProgressEvent::Downloading {
                downloaded_bytes, ..
            } => {
                if let Some(total) = event.total() {
                    progress_bar.set_length(total);
                }
                progress_bar.set_position(*downloaded_bytes);
                progress_bar.set_message(event.speed_string());
            }
            ProgressEvent::Finished { filename } => {
                progress_bar.set_message(format!("{}", filename.display()));
            }
        }
    }

    /// Finish progress bar
    pub fn finish_progress(&self, message: &str) {
        if let Some(progress_bar) = &self.progress_bar {
            progress_bar.finish_with_message(message.to_string());
        }
    }

    /// Print info message
    pub fn info(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Print success message
    pub fn success(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            println!("✅ {}", message);
        }
    }

    /// Print warning message
    pub fn warning(&self, message: &str) {
        if self.verbosity != VerbosityLevel::Quiet {
            eprintln!("⚠️  {}", message.yellow());
        }
    }

    /// Print error message
    pub fn error(&self, message: &str) {
        eprintln!("❌ {}", message.red());
    }

    /// Print debug message
    pub fn debug(&self, message: &str) {
        if self.verbosity == VerbosityLevel::Verbose {
            println!("🐛 {}", message);
        }
    }

    /// Print video information
    pub fn print_video_info(&self, info: &VideoInfo) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!("📹 {}", info.title.bold());
        if let Some(uploader) = &info.uploader {
            println!("👤 {}", uploader);
        }
        println!("⏱️  {}", info.duration_string());
        println!("👁️  {} views", info.view_count_string());
        if let Some(date) = info.upload_date {
            println!("📅 {}", date.format("%Y-%m-%d"));
        }
        println!("📊 {} streams available", info.stream_count);
        println!();
    }

    /// Print the downloadable catalog, best first
    pub fn print_catalog(&self, catalog: &Catalog) {
        self.print_video_info(&catalog.info);

        println!("{}", "Downloadable formats".bold().underline());
        if catalog.downloadable.is_empty() {
            println!("  (none)");
        }
        for format in &catalog.downloadable {
            println!("  {}", downloadable_row(format));
        }

        if self.verbosity == VerbosityLevel::Verbose {
            println!();
            println!("{}", "Audio formats".bold().underline());
            for audio in &catalog.audios {
                println!("  {}", audio_row(audio));
            }
        }
    }

    /// Print every manifest stream as received
    pub fn print_raw_formats(&self, manifest: &Manifest) {
        println!(
            "{}",
            format!(
                "{:<10} {:<6} {:<12} {:>6} {:<16} {:<16} {:>10}  NOTE",
                "ID", "EXT", "RESOLUTION", "FPS", "VCODEC", "ACODEC", "SIZE"
            )
            .bold()
        );
        for stream in &manifest.streams {
            println!("{}", raw_row(stream));
        }
    }

    /// Print a quality analysis
    pub fn print_quality_analysis(&self, analysis: &QualityAnalysis) {
        println!(
            "{} {} ({}p)",
            "Quality analysis for".bold(),
            analysis.label,
            analysis.target_height
        );

        for (index, candidate) in analysis.candidates.iter().enumerate() {
            let format = &candidate.format;
            let marker = if index == 0 { "★" } else { " " };
            println!(
                "  {} {:<8} {:<10} {:>5.0}fps {:<14} {:>10}  score {:>7.0}  {}",
                marker,
                format.id,
                format.resolution_precise,
                format.fps,
                format.vcodec,
                format.size_string(),
                candidate.score,
                candidate.tier
            );
        }

        if let Some(recommended) = analysis.recommended() {
            let audio = analysis
                .companion_audio
                .as_ref()
                .map(|a| format!(" + audio {} ({})", a.id, a.bitrate_string()))
                .unwrap_or_default();
            println!();
            println!(
                "{} {}{}",
                "Recommended:".green().bold(),
                recommended.format.id,
                audio
            );
        }
    }

    /// Print download start message
    pub fn print_download_start(&self, url: &str, request: &str) {
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!("🚀 Starting download...");
        println!("🔗 URL: {}", url);
        println!("🎞️  Format: {}", request);
        println!();
    }

    /// Print download complete message
    pub fn print_download_complete(&self, report: &DownloadReport, duration: Duration) {
        for warning in &report.warnings {
            self.warning(warning);
        }
        if self.verbosity == VerbosityLevel::Quiet {
            return;
        }

        println!();
        println!("✅ Download completed!");
        if let Some(original) = &report.substituted_from {
            println!(
                "🔁 Format {} was unavailable, used {}",
                original, report.selector
            );
        } else {
            println!("🎞️  Format: {}", report.selector);
        }
        if let Some(output) = &report.output {
            println!("💾 Saved to: {}", output.display());
        }
        println!("⏱️  Time: {}", format_duration(duration));
    }

    /// Print how to get a missing external tool
    pub fn print_missing_tool(&self, tool: &str) {
        self.error(&format!("{} was not found", tool));
        eprintln!("   Install it and make sure it is on PATH, or pass its location:");
        eprintln!("   ytsel --{} /path/to/{} URL", tool, tool);
    }
}

/// Create a progress callback for the downloader
pub fn create_progress_callback(formatter: Arc<OutputFormatter>) -> ProgressCallback {
    Arc::new(move |event: ProgressEvent| {
        formatter.update_progress(&event);
    })
}

/// One catalog line: selector, description, codecs, size
pub fn downloadable_row(format: &DownloadableFormat) -> String {
    let size = if format.filesize > 0 {
        format_bytes(format.filesize)
    } else {
        "-".to_string()
    };
    format!(
        "{:<12} {:<36} {:>5.0}fps {:<14} {:>10}  .{}",
        format.selector,
        format.description,
        format.fps,
        format.vcodec,
        size,
        format.ext
    )
}

/// One audio line: id, bitrate, codec
pub fn audio_row(audio: &AudioFormat) -> String {
    format!(
        "{:<12} {:>8} {:<14} .{}",
        audio.id,
        audio.bitrate_string(),
        audio.acodec,
        audio.ext
    )
}

/// One raw manifest line
pub fn raw_row(stream: &StreamDescriptor) -> String {
    let resolution = match (stream.width, stream.height) {
        (Some(w), Some(h)) => format!("{}x{}", w, h),
        _ => stream.resolution.clone().unwrap_or_else(|| "-".to_string()),
    };
    let fps = stream
        .fps
        .map(|f| format!("{:.0}", f))
        .unwrap_or_else(|| "-".to_string());
    let size = match stream.size() {
        0 => "-".to_string(),
        bytes => format_bytes(bytes),
    };

    format!(
        "{:<10} {:<6} {:<12} {:>6} {:<16} {:<16} {:>10}  {}",
        stream.id,
        stream.ext.as_deref().unwrap_or("-"),
        resolution,
        fps,
        stream.vcodec.as_deref().unwrap_or("-"),
        stream.acodec.as_deref().unwrap_or("-"),
        size,
        stream.note()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DownloadType, Manifest, StreamDescriptor};
    use crate::select::build_catalog;
    use std::path::PathBuf;

    fn sample_catalog() -> Catalog {
        let manifest = Manifest::new(
            "Clip",
            vec![
                StreamDescriptor::new("137", "mp4")
                    .with_dimensions(1920, 1080)
                    .with_fps(30.0)
                    .with_codecs("avc1.640028", "none")
                    .with_filesize(52_428_800),
                StreamDescriptor::new("140", "m4a")
                    .with_codecs("none", "mp4a.40.2")
                    .with_abr(129.5),
            ],
        );
        build_catalog(&manifest, "mp4")
    }

    #[test]
    fn test_output_formatter_creation() {
        let formatter = OutputFormatter::new(VerbosityLevel::Normal);
        assert_eq!(formatter.verbosity, VerbosityLevel::Normal);
        assert!(formatter.progress_bar.is_none());
    }

    #[test]
    fn test_create_progress_bar_quiet_mode() {
        let mut formatter = OutputFormatter::new(VerbosityLevel::Quiet);
        assert!(formatter.create_progress_bar().is_none());
    }

    #[test]
    fn test_create_progress_bar_normal_mode() {
        let mut formatter = OutputFormatter::new(VerbosityLevel::Normal);
        assert!(formatter.create_progress_bar().is_some());
        assert!(formatter.progress_bar.is_some());
    }

    #[test]
    fn test_update_progress() {
        let mut formatter = OutputFormatter::new(VerbosityLevel::Normal);
        let bar = formatter.create_progress_bar().unwrap();

        formatter.update_progress(&ProgressEvent::Downloading {
            downloaded_bytes: 500,
            total_bytes: None,
            total_bytes_estimate: Some(1000),
            speed: Some(100.0),
            eta: None,
        });
        assert_eq!(bar.position(), 500);
        assert_eq!(bar.length(), Some(1000));

        formatter.update_progress(&ProgressEvent::Finished {
            filename: PathBuf::from("out/clip.mp4"),
        });
        formatter.finish_progress("Download completed!");
        assert!(bar.is_finished());
    }

    #[test]
    fn test_progress_callback_without_bar() {
        let formatter = Arc::new(OutputFormatter::new(VerbosityLevel::Quiet));
        let callback = create_progress_callback(formatter);
        callback(ProgressEvent::Finished {
            filename: PathBuf::from("clip.mp4"),
        });
    }

    #[test]
    fn test_downloadable_row() {
        let catalog = sample_catalog();
        assert_eq!(catalog.downloadable[0].download_type, DownloadType::Combined);

        let row = downloadable_row(&catalog.downloadable[0]);
        assert!(row.starts_with("137+140"));
        assert!(row.contains("1080p + 130kbps audio (1920x1080)"));
        assert!(row.contains("50.0 MB"));
        assert!(row.ends_with(".mp4"));
    }

    #[test]
    fn test_audio_row() {
        let catalog = sample_catalog();
        let row = audio_row(&catalog.audios[0]);
        assert!(row.starts_with("140"));
        assert!(row.contains("130kbps"));
        assert!(row.contains("mp4a.40.2"));
    }

    #[test]
    fn test_raw_row() {
        let stream = StreamDescriptor::new("251", "webm")
            .with_codecs("none", "opus")
            .with_resolution("audio only")
            .with_note("medium");
        let row = raw_row(&stream);
        assert!(row.starts_with("251"));
        assert!(row.contains("audio only"));
        assert!(row.contains("opus"));
        assert!(row.ends_with("medium"));
    }

    #[test]
    fn test_printing_does_not_panic() {
        let formatter = OutputFormatter::new(VerbosityLevel::Verbose);
        let catalog = sample_catalog();
        formatter.print_catalog(&catalog);
        formatter.print_raw_formats(&Manifest::new("Clip", vec![]));
        formatter.print_download_complete(
            &DownloadReport {
                selector: "137+140".to_string(),
                substituted_from: Some("137+251".to_string()),
                output: Some(PathBuf::from("out/clip.mp4")),
                warnings: vec!["Could not verify audio".to_string()],
            },
            Duration::from_secs(42),
        );
        formatter.print_missing_tool("ffmpeg");
    }
}
