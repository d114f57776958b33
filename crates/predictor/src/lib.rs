//! Next-game points prediction.
//!
//! [`PredictionService`] engineers features from a player's recent games,
//! scales them, runs the sequence model, blends the de-scaled output with
//! recent form, and attaches confidence and form labels.

pub mod blend;
pub mod fallback;
pub mod features;
pub mod orchestrator;
pub mod synthesis;

pub use blend::{blend, MODEL_WEIGHT, RECENT_FORM_WEIGHT};
pub use fallback::{build_fallback_sequence, fallback_rows, FALLBACK_COLUMNS};
pub use features::{engineer_features, EngineeredFeatureVector, FeatureWindow, FEATURE_WINDOW};
pub use orchestrator::{PredictionService, PredictionStage};
pub use synthesis::{avg_error_last_10, synthesize, Synthesis};
