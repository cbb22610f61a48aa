//! Health check endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use touchid_common::HealthResponse;

use crate::challenge::ChallengeStore;
use crate::state::AppState;

/// Basic health check (is the server running?)
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

#[derive(Serialize)]
pub struct ReadyResponse {
    status: &'static str,
    store: bool,
    admission_tokens: u64,
}

/// Readiness check (does the store answer?)
pub async fn ready_check<S: ChallengeStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<ReadyResponse>, StatusCode> {
    match state.store().ping().await {
        Ok(()) => Ok(Json(ReadyResponse {
            status: "ready",
            store: true,
            admission_tokens: state.admission.available(),
        })),
        Err(e) => {
            tracing::warn!(error = %e, "Store not ready");
            // Return 503 if not ready
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
