//! Historical game-log data for NBA points prediction.
//!
//! Loads the per-game CSV once, groups it into chronologically ordered
//! [`PlayerTimeline`]s, and derives the rolling features each record carries.

pub mod dataset;
pub mod error;
pub mod rolling;
pub mod team;
pub mod timeline;

pub use dataset::{Dataset, PlayerSummary};
pub use error::DatasetError;
pub use rolling::RollingMean;
pub use team::team_for_player;
pub use timeline::{PlayerTimeline, LONG_ROLLING_WINDOW, SHORT_ROLLING_WINDOW};
