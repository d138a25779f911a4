//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::Serialize;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::app::AppState;
use crate::game::{GameSnapshot, PlayerId, PlayerSnapshot};
use crate::util::time::uptime_secs;

/// Build the status router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/state", get(state_handler))
        .route("/state/:player", get(player_handler))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
    })
}

// ============================================================================
// Session state
// ============================================================================

async fn state_handler(State(state): State<AppState>) -> Json<GameSnapshot> {
    Json(state.snapshot())
}

async fn player_handler(
    State(state): State<AppState>,
    Path(player): Path<String>,
) -> Result<Json<PlayerSnapshot>, AppError> {
    let id: PlayerId = player
        .parse()
        .map_err(|e: crate::game::InvalidPlayerId| AppError::NotFound(e.to_string()))?;
    Ok(Json(*state.snapshot().player(id)))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tokio::sync::watch;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::game::PlayerState;

    fn app(snapshot: GameSnapshot) -> (Router, watch::Sender<GameSnapshot>) {
        let (tx, rx) = watch::channel(snapshot);
        let config = Config::from_lookup(|_| None).unwrap();
        (build_router(AppState::new(config, rx)), tx)
    }

    fn fresh() -> GameSnapshot {
        GameSnapshot {
            p1: PlayerState::new(PlayerId::One).snapshot(),
            p2: PlayerState::new(PlayerId::Two).snapshot(),
        }
    }

    async fn get_json(router: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (router, _tx) = app(fresh());
        let (status, body) = get_json(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert!(body["uptime_secs"].is_u64());
    }

    #[tokio::test]
    async fn state_follows_latest_publish() {
        let (router, tx) = app(fresh());
        let mut next = fresh();
        next.p2.hp = 95;
        next.p1.bullets = 5;
        tx.send_replace(next);

        let (status, body) = get_json(router, "/state").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["p1"]["bullets"], 5);
        assert_eq!(body["p2"]["hp"], 95);
    }

    #[tokio::test]
    async fn single_player_lookup() {
        let (router, _tx) = app(fresh());
        let (status, body) = get_json(router.clone(), "/state/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["shields"], 3);

        let (status, body) = get_json(router, "/state/3").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("invalid player id"));
    }
}
