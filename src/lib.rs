//! # ytsel - format selection for remote video downloads
//!
//! Resolves, ranks, and selects downloadable media formats from a provider
//! manifest, then drives an external fetcher to download and merge them.
//!
//! ## Features
//!
//! - Stream classification with bitrate inference from format notes
//! - Quality ranking and video/audio pairing
//! - Quality label resolution ("1080p", "4K", "1920x1080")
//! - Re-validation against a fresh manifest with graceful fallback
//! - Post-download audio verification of merged files
//!
//! ## Example
//!
//! ```rust,no_run
//! use ytsel::Downloader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Downloader::new().with_output_dir("./downloads");
//!
//!     let catalog = downloader.build_catalog("VIDEO_URL").await?;
//!     for format in &catalog.downloadable {
//!         println!("{} {}", format.selector, format.description);
//!     }
//!
//!     let report = downloader.download_video("VIDEO_URL", "1080p", None).await?;
//!     println!("Downloaded with format {}", report.selector);
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod core;
pub mod download;
pub mod error;
pub mod platform;
pub mod select;
pub mod utils;

// Re-export main types
pub use crate::core::{
    AudioFormat, Catalog, DownloadKind, DownloadOptions, DownloadReport, DownloadType,
    DownloadableFormat, Downloader, Manifest, ProgressEvent, StreamDescriptor, VideoFormat,
    VideoInfo,
};
pub use error::YtselError;

/// Result type alias for ytsel operations
pub type Result<T> = std::result::Result<T, YtselError>;
