//! Error types for the prediction path.
//!
//! Numeric edge cases are never errors; they are guarded where they occur.
//! The variants here cover data availability and inference failures only.

use thiserror::Error;

use crate::types::PlayerId;

/// Errors surfaced by prediction and recent-game lookups.
#[derive(Debug, Error)]
pub enum PredictionError {
    /// The historical dataset failed to load or is empty.
    #[error("dataset not loaded")]
    DatasetUnavailable,

    /// No timeline exists for the requested player.
    #[error("player not found: {player_id}")]
    PlayerNotFound {
        /// The requested player.
        player_id: PlayerId,
    },

    /// The player's timeline holds no games.
    #[error("player {player_id} has no game data")]
    NoGameData {
        /// The requested player.
        player_id: PlayerId,
    },

    /// The player has fewer games than the operation needs.
    #[error("player {player_id} has fewer than {required} games ({available} available)")]
    InsufficientGames {
        /// The requested player.
        player_id: PlayerId,
        /// Games on record.
        available: usize,
        /// Games required.
        required: usize,
    },

    /// The model failed to produce a prediction. Not retried.
    #[error("model prediction failed: {0}")]
    ModelInferenceFailed(String),
}

impl PredictionError {
    /// Creates a player not found error.
    #[must_use]
    pub const fn player_not_found(player_id: PlayerId) -> Self {
        Self::PlayerNotFound { player_id }
    }

    /// Creates a no game data error.
    #[must_use]
    pub const fn no_game_data(player_id: PlayerId) -> Self {
        Self::NoGameData { player_id }
    }

    /// Creates an insufficient games error.
    #[must_use]
    pub const fn insufficient_games(player_id: PlayerId, available: usize, required: usize) -> Self {
        Self::InsufficientGames {
            player_id,
            available,
            required,
        }
    }

    /// Creates an inference failure from any displayable cause.
    pub fn inference(cause: impl std::fmt::Display) -> Self {
        Self::ModelInferenceFailed(cause.to_string())
    }

    /// Returns true if the caller can fix the request (unknown player, too little history).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::PlayerNotFound { .. } | Self::NoGameData { .. } | Self::InsufficientGames { .. }
        )
    }
}

/// Result type alias for prediction operations.
pub type Result<T> = std::result::Result<T, PredictionError>;
