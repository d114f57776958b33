use std::future::Future;

use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

pub struct ApiServer {
    state: AppState,
    cors_origins: Vec<String>,
}

impl ApiServer {
    #[must_use]
    pub const fn new(state: AppState, cors_origins: Vec<String>) -> Self {
        Self {
            state,
            cors_origins,
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(handlers::root))
            .route("/players", get(handlers::list_players))
            .route("/standings", get(handlers::standings))
            .route("/api/games", get(handlers::games))
            .route(
                "/api/nba/player/:player_id/season-stats",
                get(handlers::season_stats),
            )
            .route("/predict/player/:player_id", post(handlers::predict_player))
            .route("/player/:player_id/recent-games", get(handlers::recent_games))
            .route("/insights/player/:player_id", post(handlers::player_insights))
            .layer(self.cors())
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    fn cors(&self) -> CorsLayer {
        let origins: Vec<HeaderValue> = self
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(%origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        // An empty list allows any origin.
        let allow_origin = if origins.is_empty() {
            AllowOrigin::any()
        } else {
            AllowOrigin::list(origins)
        };

        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
    }

    /// Serves until `shutdown` resolves.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve<F>(self, addr: &str, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Web API listening on {}", addr);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("Web API stopped");
        Ok(())
    }
}
