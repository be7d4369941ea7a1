//! Content classification.
//!
//! Fixed-formula classifiers over visual signals. Nothing here is learned:
//! every weight is a named constant and every threshold comes from
//! [`ThresholdConfig`](crate::config::ThresholdConfig).

mod category;
pub mod game;
pub mod nsfw;
mod outcome;

pub use category::{NsfwCategory, NsfwResult};
pub use game::{GameResult, UNKNOWN_GAME};
pub use outcome::DetectorOutcome;
