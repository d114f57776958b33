//! Upstream data sources for the prediction service.
//!
//! [`NbaDataService`] wraps the NBA stats endpoints (standings, scoreboard,
//! season aggregates) with per-source TTL caches. The insights module talks
//! to a text-generation API and degrades to fixed bullets on any failure.

pub mod clock;
pub mod error;
pub mod insights;
pub mod service;
pub mod stats;
pub mod ttl_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{InsightError, Result, UpstreamError};
pub use insights::{
    build_prompt, generate_insights, insight_generator_from_config, FallbackInsights,
    GeminiInsightGenerator, StaticInsightGenerator, MAX_BULLETS,
};
pub use service::{sample_games, NbaDataService, StandingsResponse};
pub use stats::{LiveGame, SeasonStats, Standings, StandingsEntry, StatsClient};
pub use ttl_cache::{Cached, TtlCache};
