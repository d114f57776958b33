use axum::{
    extract::{Path, State},
    Json,
};
use hoops_core::{InsightGame, PlayerId, PredictionResult, RecentGame};
use hoops_data::PlayerSummary;
use hoops_upstream::{generate_insights, LiveGame, SeasonStats, StandingsResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::state::AppState;

/// One of the player's most recent games as served over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentGameResponse {
    pub game_date: String,
    pub pts: u32,
    pub min: Option<f64>,
    pub fg_pct: Option<f64>,
}

impl From<RecentGame> for RecentGameResponse {
    fn from(game: RecentGame) -> Self {
        Self {
            game_date: game.date.format("%Y-%m-%d").to_string(),
            pts: game.pts,
            min: game.min,
            fg_pct: game.fg_pct,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct InsightsRequest {
    #[serde(default)]
    pub predicted_points: Option<f64>,
    #[serde(default, alias = "recentGames")]
    pub recent_games: Vec<InsightGame>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub insights: Vec<String>,
}

pub async fn root() -> Json<Value> {
    Json(json!({ "status": "NBA prediction backend running" }))
}

/// Distinct players in dataset order; empty when the dataset failed to load.
pub async fn list_players(State(state): State<AppState>) -> Json<Vec<PlayerSummary>> {
    Json(state.predictions.players().to_vec())
}

/// # Errors
/// Returns 502 if standings cannot be fetched.
pub async fn standings(State(state): State<AppState>) -> Result<Json<StandingsResponse>, ApiError> {
    state
        .upstream
        .standings()
        .await
        .map(Json)
        .map_err(|e| ApiError::standings(&e))
}

/// Live scoreboard around today. Never fails.
pub async fn games(State(state): State<AppState>) -> Json<Vec<LiveGame>> {
    Json(state.upstream.games().await)
}

/// # Errors
/// Returns 504 on upstream timeout, 429 when rate limited, 502 otherwise.
pub async fn season_stats(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<SeasonStats>, ApiError> {
    state
        .upstream
        .season_stats(player_id)
        .await
        .map(Json)
        .map_err(|e| ApiError::season_stats(&e))
}

/// Predicts the player's points in their next game.
///
/// # Errors
/// Returns 500 if the dataset is not loaded or inference fails, 404 for an
/// unknown player, and 400 for a player without games.
pub async fn predict_player(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<PredictionResult>, ApiError> {
    let result = state.predictions.predict_next_game(player_id)?;
    Ok(Json(result))
}

/// The player's last five games.
///
/// # Errors
/// Returns 400 when the player has fewer than five games.
pub async fn recent_games(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
) -> Result<Json<Vec<RecentGameResponse>>, ApiError> {
    let games = state.predictions.recent_games(player_id)?;
    Ok(Json(games.into_iter().map(RecentGameResponse::from).collect()))
}

/// Natural-language bullets for a prediction. Never fails; generator errors
/// become fallback bullets. A missing or unparseable body is treated as empty.
pub async fn player_insights(
    State(state): State<AppState>,
    Path(player_id): Path<PlayerId>,
    body: Option<Json<InsightsRequest>>,
) -> Json<InsightsResponse> {
    let request = body.map(|Json(request)| request).unwrap_or_default();
    let insights = generate_insights(
        state.insights.as_ref(),
        player_id,
        request.predicted_points,
        &request.recent_games,
    )
    .await;
    Json(InsightsResponse { insights })
}
