//! Mapping from domain errors to HTTP responses.
//!
//! Every error body is `{"detail": "..."}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hoops_core::PredictionError;
use hoops_upstream::UpstreamError;
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Any standings failure is a bad gateway.
    #[must_use]
    pub fn standings(error: &UpstreamError) -> Self {
        tracing::warn!(error = %error, "Standings unavailable");
        Self::new(StatusCode::BAD_GATEWAY, "Failed to fetch standings from NBA API")
    }

    #[must_use]
    pub fn season_stats(error: &UpstreamError) -> Self {
        tracing::warn!(error = %error, "Season stats unavailable");
        match error {
            UpstreamError::Timeout(_) => Self::new(StatusCode::GATEWAY_TIMEOUT, "nba_api timeout"),
            UpstreamError::RateLimited { .. } => {
                Self::new(StatusCode::TOO_MANY_REQUESTS, "nba_api rate limit")
            }
            UpstreamError::Http { .. } => Self::new(StatusCode::BAD_GATEWAY, "nba_api HTTP error"),
            other => Self::new(StatusCode::BAD_GATEWAY, format!("nba_api error: {other}")),
        }
    }
}

impl From<PredictionError> for ApiError {
    fn from(error: PredictionError) -> Self {
        match error {
            PredictionError::DatasetUnavailable => {
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Dataset not loaded")
            }
            PredictionError::PlayerNotFound { .. } => {
                Self::new(StatusCode::NOT_FOUND, "Player not found")
            }
            PredictionError::NoGameData { .. } => {
                Self::new(StatusCode::BAD_REQUEST, "Player has no game data")
            }
            PredictionError::InsufficientGames { required, .. } => Self::new(
                StatusCode::BAD_REQUEST,
                format!("Player has fewer than {required} games"),
            ),
            PredictionError::ModelInferenceFailed(cause) => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Model prediction failed: {cause}"),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_error_mapping() {
        let cases = [
            (PredictionError::DatasetUnavailable, 500, "Dataset not loaded"),
            (PredictionError::player_not_found(1), 404, "Player not found"),
            (PredictionError::no_game_data(1), 400, "Player has no game data"),
            (
                PredictionError::insufficient_games(1, 3, 5),
                400,
                "Player has fewer than 5 games",
            ),
            (
                PredictionError::inference("non-finite output"),
                500,
                "Model prediction failed: non-finite output",
            ),
        ];
        for (error, status, detail) in cases {
            let api = ApiError::from(error);
            assert_eq!(api.status.as_u16(), status);
            assert_eq!(api.detail, detail);
        }
    }

    #[test]
    fn test_season_stats_mapping() {
        assert_eq!(
            ApiError::season_stats(&UpstreamError::Timeout("slow".into())).status,
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::season_stats(&UpstreamError::RateLimited {
                retry_after_secs: Some(5)
            })
            .status,
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::season_stats(&UpstreamError::http(500, "boom")).detail,
            "nba_api HTTP error"
        );
        let parse = ApiError::season_stats(&UpstreamError::parse("no rows"));
        assert_eq!(parse.status, StatusCode::BAD_GATEWAY);
        assert!(parse.detail.starts_with("nba_api error: "));
    }

    #[test]
    fn test_standings_mapping() {
        let api = ApiError::standings(&UpstreamError::Network("refused".into()));
        assert_eq!(api.status, StatusCode::BAD_GATEWAY);
        assert_eq!(api.detail, "Failed to fetch standings from NBA API");
    }
}
