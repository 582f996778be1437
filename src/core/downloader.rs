//! Main downloader implementation

use crate::core::format::{Catalog, DEFAULT_MERGE_FORMAT};
use crate::core::manifest::Manifest;
use crate::core::progress::ProgressCallback;
use crate::error::YtselError;
use crate::platform::{
    AudioProbe, FetchRequest, FfmpegProbe, ManifestProvider, MediaFetcher, PostProcessing,
    ProbeConfig, YtDlpConfig, YtDlpFetcher, YtDlpProvider,
};
use crate::select::{
    attach_best_audio, build_catalog, find_fallback, is_quality_label, reconcile, selector_ids,
    validate_selector, FallbackKind, QualityAnalysis, QualityResolver, Resolution, ScoreWeights,
};
use crate::utils::{is_playlist_url, validate_resource};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Main downloader configuration
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOptions {
    /// Container for merged video and audio
    pub merge_format: String,
    /// Output filename template
    pub output_template: String,
    /// Output directory
    pub output_dir: PathBuf,
    /// Codec for audio extraction
    pub audio_codec: String,
    /// Quality for audio extraction (bitrate in kbps or a VBR level)
    pub audio_quality: String,
    /// Run the same-height refinement pass when resolving labels
    pub refine_quality: bool,
    /// Probe merged output for an audio stream
    pub verify_merge: bool,
    /// Quality score weights
    pub weights: ScoreWeights,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            merge_format: DEFAULT_MERGE_FORMAT.to_string(),
            output_template: "%(title)s.%(ext)s".to_string(),
            output_dir: PathBuf::from("downloads"),
            audio_codec: "mp3".to_string(),
            audio_quality: "192".to_string(),
            refine_quality: true,
            verify_merge: true,
            weights: ScoreWeights::default(),
        }
    }
}

/// What to produce from the selected streams
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadKind {
    /// Video, merged with audio when the selector names two streams
    Video,
    /// Audio converted to `codec` at `quality`
    Audio { codec: String, quality: String },
    /// Audio kept in its original encoding
    RawAudio,
}

impl DownloadKind {
    fn fallback_kind(&self) -> FallbackKind {
        match self {
            DownloadKind::Video => FallbackKind::Video,
            DownloadKind::Audio { .. } | DownloadKind::RawAudio => FallbackKind::Audio,
        }
    }

    fn post_processing(&self, merge_format: &str) -> PostProcessing {
        match self {
            DownloadKind::Video => PostProcessing::Merge {
                container: merge_format.to_string(),
            },
            DownloadKind::Audio { codec, quality } => PostProcessing::ExtractAudio {
                codec: codec.clone(),
                quality: quality.clone(),
            },
            DownloadKind::RawAudio => PostProcessing::None,
        }
    }
}

/// Outcome of a finished download
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DownloadReport {
    /// Selector actually handed to the fetcher
    pub selector: String,
    /// Requested selector when a fallback replaced it
    pub substituted_from: Option<String>,
    /// Final file, when the fetcher could report it
    pub output: Option<PathBuf>,
    /// Non-fatal problems, e.g. an inconclusive merge check
    pub warnings: Vec<String>,
}

impl DownloadReport {
    pub fn used_fallback(&self) -> bool {
        self.substituted_from.is_some()
    }
}

/// Main downloader struct
///
/// Every operation fetches its own manifest snapshot; nothing is cached
/// between calls.
#[derive(Clone)]
pub struct Downloader {
    options: DownloadOptions,
    provider: Arc<dyn ManifestProvider>,
    fetcher: Arc<dyn MediaFetcher>,
    probe: Arc<dyn AudioProbe>,
}

impl Default for Downloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader {
    /// Create a new downloader backed by yt-dlp and ffmpeg
    pub fn new() -> Self {
        Self {
            options: DownloadOptions::default(),
            provider: Arc::new(YtDlpProvider::new()),
            fetcher: Arc::new(YtDlpFetcher::new()),
            probe: Arc::new(FfmpegProbe::new()),
        }
    }

    /// Replace all options
    pub fn with_options(mut self, options: DownloadOptions) -> Self {
        self.options = options;
        self
    }

    /// Use a yt-dlp configuration for both manifest and media fetching
    pub fn with_yt_dlp(mut self, config: YtDlpConfig) -> Self {
        self.provider = Arc::new(YtDlpProvider::with_config(config.clone()));
        self.fetcher = Arc::new(YtDlpFetcher::with_config(config));
        self
    }

    /// Use an ffmpeg configuration for merge verification
    pub fn with_probe_config(mut self, config: ProbeConfig) -> Self {
        self.probe = Arc::new(FfmpegProbe::with_config(config));
        self
    }

    pub fn with_provider(mut self, provider: impl ManifestProvider + 'static) -> Self {
        self.provider = Arc::new(provider);
        self
    }

    pub fn with_fetcher(mut self, fetcher: impl MediaFetcher + 'static) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    pub fn with_probe(mut self, probe: impl AudioProbe + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    /// Set output directory
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.options.output_dir = dir.into();
        self
    }

    /// Set output filename template
    pub fn with_output_template(mut self, template: impl Into<String>) -> Self {
        self.options.output_template = template.into();
        self
    }

    /// Set container for merged downloads
    pub fn with_merge_format(mut self, container: impl Into<String>) -> Self {
        self.options.merge_format = container.into();
        self
    }

    /// Set audio extraction codec and quality
    pub fn with_audio(mut self, codec: impl Into<String>, quality: impl Into<String>) -> Self {
        self.options.audio_codec = codec.into();
        self.options.audio_quality = quality.into();
        self
    }

    /// Enable or disable the refinement pass
    pub fn with_refinement(mut self, refine: bool) -> Self {
        self.options.refine_quality = refine;
        self
    }

    /// Enable or disable merge verification
    pub fn with_verification(mut self, verify: bool) -> Self {
        self.options.verify_merge = verify;
        self
    }

    /// Set quality score weights
    pub fn with_weights(mut self, weights: ScoreWeights) -> Self {
        self.options.weights = weights;
        self
    }

    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    fn resolver(&self) -> QualityResolver {
        QualityResolver::new()
            .with_weights(self.options.weights.clone())
            .with_refinement(self.options.refine_quality)
    }

    /// Fetch a fresh manifest, translating provider failures
    pub async fn fetch_manifest(&self, resource: &str) -> Result<Manifest, YtselError> {
        let resource = validate_resource(resource)?;
        if is_playlist_url(&resource) {
            info!("Playlist reference ignored; only the single video is used");
        }

        let manifest = self
            .provider
            .fetch_manifest(&resource)
            .await
            .map_err(|e| match e {
                YtselError::ManifestUnavailable(_) => e,
                other => YtselError::ManifestUnavailable(other.to_string()),
            })?;

        if manifest.is_empty() {
            return Err(YtselError::ManifestUnavailable(format!(
                "no streams listed for {}",
                resource
            )));
        }
        Ok(manifest)
    }

    /// Classify, rank, and pair the streams of a fresh manifest
    pub async fn build_catalog(&self, resource: &str) -> Result<Catalog, YtselError> {
        let manifest = self.fetch_manifest(resource).await?;
        let catalog = build_catalog(&manifest, &self.options.merge_format);
        info!(
            "Catalog for '{}': {} video, {} audio, {} downloadable",
            catalog.info.title,
            catalog.videos.len(),
            catalog.audios.len(),
            catalog.downloadable.len()
        );
        Ok(catalog)
    }

    /// Resolve a quality label (or existing selector) against a fresh manifest
    pub async fn resolve_quality(
        &self,
        resource: &str,
        label: &str,
    ) -> Result<Resolution, YtselError> {
        let manifest = self.fetch_manifest(resource).await?;
        self.resolver().resolve(&manifest, label)
    }

    /// Best selector for a download kind when the caller named none
    pub async fn default_selector(
        &self,
        resource: &str,
        kind: &DownloadKind,
    ) -> Result<String, YtselError> {
        let manifest = self.fetch_manifest(resource).await?;
        let selector = match kind {
            DownloadKind::Video => build_catalog(&manifest, &self.options.merge_format)
                .downloadable
                .into_iter()
                .next()
                .map(|best| best.selector),
            DownloadKind::Audio { .. } | DownloadKind::RawAudio => {
                find_fallback(&manifest, FallbackKind::Audio)
            }
        };

        let selector =
            selector.ok_or_else(|| YtselError::UnresolvableQuality("best".to_string()))?;
        debug!("Defaulting to format {}", selector);
        Ok(selector)
    }

    /// Score every candidate for a quality label against a fresh manifest
    pub async fn analyze_quality(
        &self,
        resource: &str,
        label: &str,
    ) -> Result<QualityAnalysis, YtselError> {
        let manifest = self.fetch_manifest(resource).await?;
        self.resolver().analyze(&manifest, label)
    }

    /// Download a video by quality label or selector
    pub async fn download_video(
        &self,
        resource: &str,
        selector_or_label: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<DownloadReport, YtselError> {
        self.download(resource, selector_or_label, DownloadKind::Video, progress)
            .await
    }

    /// Download audio, converted with the configured codec and quality
    pub async fn download_audio(
        &self,
        resource: &str,
        selector: &str,
        progress: Option<ProgressCallback>,
    ) -> Result<DownloadReport, YtselError> {
        let kind = DownloadKind::Audio {
            codec: self.options.audio_codec.clone(),
            quality: self.options.audio_quality.clone(),
        };
        self.download(resource, selector, kind, progress).await
    }

    /// Work out the selector to fetch from a fresh manifest
    fn select_for_download(
        &self,
        manifest: &Manifest,
        selector_or_label: &str,
        kind: &DownloadKind,
    ) -> Result<(String, Option<String>), YtselError> {
        let requested = selector_or_label.trim();

        let selector = if kind == &DownloadKind::Video
            && is_quality_label(requested)
            && !validate_selector(requested, manifest).available
        {
            self.resolver().resolve(manifest, requested)?.selector
        } else {
            requested.to_string()
        };

        let reconciled = reconcile(&selector, manifest, kind.fallback_kind())?;
        let mut chosen = reconciled.selector;
        if kind == &DownloadKind::Video {
            chosen = attach_best_audio(&chosen, manifest);
        }

        Ok((chosen, reconciled.substituted_from))
    }

    /// Download with a fresh manifest, falling back when the requested
    /// streams are gone.
    pub async fn download(
        &self,
        resource: &str,
        selector_or_label: &str,
        kind: DownloadKind,
        progress: Option<ProgressCallback>,
    ) -> Result<DownloadReport, YtselError> {
        let manifest = self.fetch_manifest(resource).await?;
        let (selector, substituted_from) =
            self.select_for_download(&manifest, selector_or_label, &kind)?;

        if let Some(original) = &substituted_from {
            warn!("Format {} unavailable, downloading {} instead", original, selector);
        }
        info!("Downloading '{}' with format {}", manifest.title, selector);

        let request = FetchRequest {
            resource: validate_resource(resource)?,
            selector: selector.clone(),
            output_dir: self.options.output_dir.clone(),
            output_template: self.options.output_template.clone(),
            post_processing: kind.post_processing(&self.options.merge_format),
        };

        let outcome = self
            .fetcher
            .fetch(&request, progress)
            .await
            .map_err(|e| match e {
                YtselError::IoError(io) => YtselError::DownloadFailed(io.to_string()),
                other => other,
            })?;
        debug!("Fetcher reported output {:?}", outcome.output);

        let mut report = DownloadReport {
            selector,
            substituted_from,
            output: outcome.output,
            warnings: Vec::new(),
        };

        let merged = kind == DownloadKind::Video && selector_ids(&report.selector).1.is_some();
        if merged && self.options.verify_merge {
            if let Some(warning) = self.verify_merge(report.output.as_deref()).await {
                warn!("{}", warning);
                report.warnings.push(warning);
            }
        }

        Ok(report)
    }

    /// Probe merged output; returns a warning when audio could not be confirmed
    async fn verify_merge(&self, output: Option<&std::path::Path>) -> Option<String> {
        let Some(path) = output else {
            return Some(
                YtselError::MergeVerificationInconclusive("output file unknown".to_string())
                    .to_string(),
            );
        };

        match self.probe.has_audio_stream(path).await {
            Ok(true) => {
                info!("Merged output {} has audio", path.display());
                None
            }
            Ok(false) => Some(format!(
                "Merged output {} has no audio stream; video and audio may not have been merged",
                path.display()
            )),
            Err(e) if e.is_warning() => Some(e.to_string()),
            Err(e) => Some(YtselError::MergeVerificationInconclusive(e.to_string()).to_string()),
        }
    }
}
