//! CLI commands for the prediction backend.

pub mod bootstrap;
pub mod players;
pub mod predict;
pub mod serve;

pub use players::run_players;
pub use predict::{run_predict, run_recent_games, PlayerArgs};
pub use serve::{run_serve, ServeArgs};
