//! Admission control.
//!
//! A single token bucket gates every inbound request before routing. There
//! is no per-user or per-address partitioning.

mod bucket;

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use touchid_common::TouchIdError;
use touchid_common::constants::RATE_LIMIT_MESSAGE;

pub use bucket::{Admission, TokenBucket};

/// Middleware: consume one token or answer 429
pub async fn admit(
    State(bucket): State<Arc<TokenBucket>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    match bucket.try_acquire() {
        Admission::Admitted { remaining } => {
            tracing::trace!(remaining, path = %req.uri().path(), "Request admitted");
            next.run(req).await
        }
        Admission::Rejected { retry_after } => {
            let retry_secs = retry_after.as_secs_f64().ceil().max(1.0) as u64;
            let err = TouchIdError::RateLimited(format!("retry after {retry_secs}s"));
            rejection(err, retry_secs, req.uri().path())
        }
    }
}

/// 429 with a plain-text body; the status comes from the shared error taxonomy
fn rejection(err: TouchIdError, retry_secs: u64, path: &str) -> Response {
    tracing::warn!(path = %path, error = %err, "Request rejected by admission control");
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::TOO_MANY_REQUESTS);
    (
        status,
        [(header::RETRY_AFTER, retry_secs.to_string())],
        RATE_LIMIT_MESSAGE,
    )
        .into_response()
}
