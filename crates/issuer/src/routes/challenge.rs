//! Challenge issuance endpoint.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use touchid_common::{ChallengeRequest, ChallengeResponse, ErrorResponse, TouchIdError};
use crate::challenge::ChallengeStore;
use crate::state::AppState;

/// Maps core errors onto HTTP answers at the transport boundary
pub struct ApiError(pub TouchIdError);

impl From<TouchIdError> for ApiError {
    fn from(err: TouchIdError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}

/// Issue a new challenge for `userId`
pub async fn issue_challenge<S: ChallengeStore>(
    State(state): State<AppState<S>>,
    Json(payload): Json<ChallengeRequest>,
) -> Result<Json<ChallengeResponse>, ApiError> {
    let challenge = state.challenges.issue(payload).await?;
    Ok(Json(challenge.into()))
}
