use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub type PlayerId = i64;

/// One player-game observation. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub player_id: PlayerId,
    pub game_date: NaiveDate,
    pub pts: u32,
    /// Minutes played; `None` when the source left it blank.
    pub min: Option<f64>,
    pub fg_pct: Option<f64>,
    pub home: bool,
    pub opp_def_rating: Option<f64>,
    /// Player was absent or limited in the immediately preceding game.
    pub injury_flag: bool,
}

/// Trailing means attached to a record, computed from its own history only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RollingFeatures {
    pub pts_rolling_5: Option<f64>,
    pub pts_rolling_10: Option<f64>,
    pub min_rolling_5: Option<f64>,
}

/// Compact per-game view returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentGame {
    pub date: NaiveDate,
    pub pts: u32,
    pub min: Option<f64>,
    pub fg_pct: Option<f64>,
}

impl From<&GameRecord> for RecentGame {
    fn from(record: &GameRecord) -> Self {
        Self {
            date: record.game_date,
            pts: record.pts,
            min: record.min,
            fg_pct: record.fg_pct,
        }
    }
}

/// Loosely-typed game entry supplied by clients when asking for insights.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightGame {
    #[serde(default, alias = "game_date")]
    pub date: Option<String>,
    #[serde(default)]
    pub pts: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub fg_pct: Option<f64>,
}

impl From<&RecentGame> for InsightGame {
    fn from(game: &RecentGame) -> Self {
        Self {
            date: Some(game.date.format("%Y-%m-%d").to_string()),
            pts: Some(f64::from(game.pts)),
            min: game.min,
            fg_pct: game.fg_pct,
        }
    }
}

/// Which model input the prediction was produced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPath {
    /// Scaled 1x1x7 engineered feature vector.
    Engineered,
    /// Raw 1x5x6 per-game sequence, used when the scaler does not fit the engineered vector.
    FallbackSequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLabel {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrendLabel {
    Improving,
    Declining,
    Flat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MinutesStability {
    Stable,
    Volatile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub avg_pts_5: f64,
    pub avg_min_5: f64,
    pub pts_trend: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    pub band: f64,
    pub std: f64,
    pub label: ConfidenceLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSummary {
    pub avg_pts_5: f64,
    pub minutes_stability: MinutesStability,
    pub scoring_trend: TrendLabel,
}

/// Static team metadata; every field is null for players without a mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub team_name: Option<String>,
    pub city: Option<String>,
    pub conference: Option<String>,
    pub abbreviation: Option<String>,
    pub colors: Option<Vec<String>>,
    pub logo_url: Option<String>,
}

/// Response of a next-game prediction. Built per request, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub player_id: PlayerId,
    pub predicted_points: f64,
    pub model_prediction: f64,
    pub recent_avg_points: Option<f64>,
    pub recent_games: Vec<RecentGame>,
    pub summary: PredictionSummary,
    pub confidence: Confidence,
    pub explanation: String,
    pub form_summary: FormSummary,
    pub avg_error_last_10: Option<f64>,
    pub team: TeamInfo,
    pub input_path: InputPath,
}

/// Rounds to `places` decimal digits, half away from zero.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}
