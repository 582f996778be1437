//! Utility functions for ytsel

pub mod url;

pub use url::*;
