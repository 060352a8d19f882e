//! HTTP API: solo results, the leaderboard, and a health check.

use std::sync::Arc;

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use tower_http::cors::CorsLayer;
use typerace_solo::{LeaderboardEntry, SoloResult, SoloStore, TOP_RESULTS, leaderboard};

/// Builds the HTTP router. CORS is wide open, as browser clients are
/// served from a different origin.
pub fn router<S: SoloStore>(store: Arc<S>) -> Router {
    Router::new()
        .route("/api/solo-results", get(solo_results::<S>))
        .route("/api/leaderboard", get(get_leaderboard))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .with_state(store)
}

/// The best solo attempts.
async fn solo_results<S: SoloStore>(
    State(store): State<Arc<S>>,
) -> Result<Json<Vec<SoloResult>>, (StatusCode, Json<serde_json::Value>)> {
    match store.top(TOP_RESULTS).await {
        Ok(results) => Ok(Json(results)),
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch solo results");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to fetch solo results" })),
            ))
        }
    }
}

async fn get_leaderboard() -> Json<Vec<LeaderboardEntry>> {
    Json(leaderboard())
}

/// Health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
