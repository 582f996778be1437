//! Retry policy for external collaborator calls

pub mod retry;

pub use retry::*;
