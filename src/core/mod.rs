//! Core functionality for ytsel

pub mod downloader;
pub mod format;
pub mod manifest;
pub mod progress;

pub use downloader::*;
pub use format::*;
pub use manifest::*;
pub use progress::*;
