//! External collaborators: manifest provider, media fetcher, and audio probe

pub mod fetcher;
pub mod probe;
pub mod provider;
pub mod tools;

pub use fetcher::*;
pub use probe::*;
pub use provider::*;
pub use tools::*;
