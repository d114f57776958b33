pub mod config;
pub mod config_loader;
pub mod error;
pub mod traits;
pub mod types;

pub use config::{
    AppConfig, DatasetConfig, InsightsConfig, ModelConfig, ServerConfig, UpstreamConfig,
};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_PATH};
pub use error::PredictionError;
pub use traits::InsightGenerator;
pub use types::{
    round_to, Confidence, ConfidenceLabel, FormSummary, GameRecord, InputPath, InsightGame,
    MinutesStability, PlayerId, PredictionResult, PredictionSummary, RecentGame, RollingFeatures,
    TeamInfo, TrendLabel,
};
