//! Manifest providers: where the list of available streams comes from

use crate::core::Manifest;
use crate::download::{RetryConfig, RetryExecutor};
use crate::error::YtselError;
use crate::platform::tools::{last_line, run_with_timeout};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Source of stream manifests for a resource
///
/// Every call returns a fresh snapshot. Implementations never cache, since
/// stream identifiers expire between calls.
#[async_trait]
pub trait ManifestProvider: Send + Sync {
    async fn fetch_manifest(&self, resource: &str) -> Result<Manifest, YtselError>;
}

/// User agent sent with every yt-dlp request unless overridden
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Settings for the yt-dlp executable
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    pub binary: PathBuf,
    pub timeout: Duration,
    pub max_retries: u32,
    pub user_agent: Option<String>,
    pub extra_args: Vec<String>,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("yt-dlp"),
            timeout: Duration::from_secs(60),
            max_retries: 3,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
            extra_args: Vec::new(),
        }
    }
}

impl YtDlpConfig {
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Arguments shared by every invocation
    pub fn common_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(user_agent) = &self.user_agent {
            args.push("--user-agent".to_string());
            args.push(user_agent.clone());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }

    pub fn with_extra_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }
}

/// Provider that asks `yt-dlp -J` for the manifest
#[derive(Debug, Clone)]
pub struct YtDlpProvider {
    config: YtDlpConfig,
    retry: RetryExecutor,
}

impl Default for YtDlpProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlpProvider {
    pub fn new() -> Self {
        Self::with_config(YtDlpConfig::default())
    }

    pub fn with_config(config: YtDlpConfig) -> Self {
        let retry =
            RetryExecutor::with_config(RetryConfig::default().with_max_retries(config.max_retries));
        Self { config, retry }
    }

    pub fn config(&self) -> &YtDlpConfig {
        &self.config
    }

    /// Arguments for a single manifest request
    pub fn manifest_args(&self, resource: &str) -> Vec<String> {
        let mut args = vec![
            "-J".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
        ];
        args.extend(self.config.common_args());
        args.push(resource.to_string());
        args
    }

    async fn fetch_once(&self, resource: &str) -> Result<Manifest, YtselError> {
        let mut command = Command::new(&self.config.binary);
        command.args(self.manifest_args(resource));

        let output = run_with_timeout(&mut command, self.config.timeout).await?;
        if !output.status.success() {
            return Err(YtselError::ManifestUnavailable(last_line(&output.stderr)));
        }

        parse_manifest(&output.stdout)
    }
}

/// Parse `yt-dlp -J` output, rejecting manifests without streams
pub fn parse_manifest(bytes: &[u8]) -> Result<Manifest, YtselError> {
    let text = String::from_utf8_lossy(bytes);
    let manifest = Manifest::from_json(&text)
        .map_err(|e| YtselError::ManifestUnavailable(format!("malformed manifest: {}", e)))?;

    if manifest.is_empty() {
        return Err(YtselError::ManifestUnavailable(
            "manifest lists no streams".to_string(),
        ));
    }

    Ok(manifest)
}

#[async_trait]
impl ManifestProvider for YtDlpProvider {
    async fn fetch_manifest(&self, resource: &str) -> Result<Manifest, YtselError> {
        info!("Fetching manifest for {}", resource);

        let result = self
            .retry
            .execute_when(
                || self.fetch_once(resource),
                // a missing binary or a bad request will not improve on retry
                |e| matches!(e, YtselError::TimeoutError(_)),
            )
            .await;

        match &result {
            Ok(manifest) => debug!(
                "Manifest for {} lists {} streams",
                resource,
                manifest.streams.len()
            ),
            Err(e) => warn!("Manifest fetch for {} failed: {}", resource, e),
        }
        result
    }
}

/// Provider serving prepared manifests in order
///
/// Each fetch consumes the next snapshot; the last one is served repeatedly.
/// Useful for replaying a captured manifest or for simulating streams that
/// expire between listing and download.
#[derive(Debug, Default)]
pub struct StaticProvider {
    snapshots: Mutex<VecDeque<Manifest>>,
}

impl StaticProvider {
    pub fn new(manifest: Manifest) -> Self {
        Self::with_snapshots(vec![manifest])
    }

    pub fn with_snapshots(snapshots: Vec<Manifest>) -> Self {
        Self {
            snapshots: Mutex::new(snapshots.into()),
        }
    }

    /// Number of snapshots still queued, including the repeating last one
    pub fn remaining(&self) -> usize {
        self.snapshots.lock().map(|s| s.len()).unwrap_or(0)
    }
}

#[async_trait]
impl ManifestProvider for StaticProvider {
    async fn fetch_manifest(&self, resource: &str) -> Result<Manifest, YtselError> {
        let mut snapshots = self
            .snapshots
            .lock()
            .map_err(|_| YtselError::Generic("manifest store poisoned".to_string()))?;

        let manifest = if snapshots.len() > 1 {
            snapshots.pop_front()
        } else {
            snapshots.front().cloned()
        };

        manifest.ok_or_else(|| {
            YtselError::ManifestUnavailable(format!("no manifest prepared for {}", resource))
        })
    }
}
