//! Main entry point for ytsel CLI

use anyhow::{bail, Context};
use clap::Parser;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ytsel::cli::{create_progress_callback, Args, Mode, OutputFormatter};
use ytsel::core::{DownloadKind, Downloader};
use ytsel::platform::check_dependencies;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    init_logging(args.log_filter())?;
    info!("Starting ytsel with args: {:?}", args);

    let mut formatter = OutputFormatter::new(args.verbosity_level());

    let tools = check_dependencies(&args.yt_dlp, &args.ffmpeg);
    debug!("External tools: {:?}", tools);
    if !tools.can_fetch() {
        formatter.print_missing_tool("yt-dlp");
        bail!("yt-dlp is required");
    }

    // Create downloader
    let mut downloader = Downloader::new()
        .with_yt_dlp(args.yt_dlp_config())
        .with_probe_config(args.probe_config())
        .with_merge_format(&args.merge_format)
        .with_audio(&args.audio_format, &args.audio_quality)
        .with_refinement(!args.no_refine)
        .with_verification(!args.no_verify && tools.can_post_process());

    if let Some(output) = &args.output {
        downloader = downloader.with_output_dir(output);
    }
    if let Some(template) = &args.output_template {
        downloader = downloader.with_output_template(template);
    }

    match args.mode() {
        Mode::RawFormats => {
            let manifest = downloader.fetch_manifest(&args.url).await?;
            formatter.print_video_info(&manifest.info());
            formatter.print_raw_formats(&manifest);
        }
        Mode::ListFormats => {
            let catalog = downloader.build_catalog(&args.url).await?;
            formatter.print_catalog(&catalog);
        }
        Mode::Analyze => {
            let label = args.format.as_deref().context("--analyze needs --format")?;
            let analysis = downloader.analyze_quality(&args.url, label).await?;
            formatter.print_quality_analysis(&analysis);
        }
        Mode::PrintSelector => {
            let selector = match &args.format {
                Some(format) => downloader.resolve_quality(&args.url, format).await?.selector,
                None => requested_format(&downloader, &args).await?,
            };
            println!("{}", selector);
        }
        Mode::Download => {
            if !tools.can_post_process() && args.download_kind() != DownloadKind::RawAudio {
                formatter.warning("ffmpeg not found; merging and audio conversion will fail");
            }

            let request = requested_format(&downloader, &args).await?;
            formatter.print_download_start(&args.url, &request);

            if !args.no_progress {
                formatter.create_progress_bar();
            }
            let formatter = Arc::new(formatter);
            let callback = (!args.no_progress).then(|| create_progress_callback(formatter.clone()));

            let start_time = Instant::now();
            let report = downloader
                .download(&args.url, &request, args.download_kind(), callback)
                .await;
            formatter.finish_progress("done");

            let report = report?;
            info!("Download completed with format {}", report.selector);
            formatter.print_download_complete(&report, start_time.elapsed());
        }
    }

    Ok(())
}

/// Format to request: the -f value, else the best format for the download kind
async fn requested_format(downloader: &Downloader, args: &Args) -> anyhow::Result<String> {
    match &args.format {
        Some(format) => Ok(format.clone()),
        None => Ok(downloader
            .default_selector(&args.url, &args.download_kind())
            .await?),
    }
}

/// Initialize logging system
fn init_logging(default_level: &str) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init()?;

    Ok(())
}
