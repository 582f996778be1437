//! Format selection engine: classification, ranking, pairing, resolution, validation

pub mod bitrate;
pub mod classify;
pub mod pair;
pub mod rank;
pub mod resolve;
pub mod score;
pub mod validate;

pub use bitrate::*;
pub use classify::*;
pub use pair::*;
pub use rank::*;
pub use resolve::*;
pub use score::*;
pub use validate::*;
