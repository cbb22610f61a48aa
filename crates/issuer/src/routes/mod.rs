//! HTTP route handlers for the issuer.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use touchid_common::constants::MAX_BODY_BYTES;

use crate::admission;
use crate::challenge::ChallengeStore;
use crate::state::AppState;

mod challenge;
mod health;

/// Create the main application router.
///
/// Layers, outermost first: request tracing, admission control, CORS, body
/// limit, security headers.
pub fn create_router<S: ChallengeStore>(state: AppState<S>) -> Router {
    let bucket = state.admission.clone();

    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check::<S>))

        // Challenge issuance
        .route("/challenge", post(challenge::issue_challenge::<S>))

        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_XSS_PROTECTION,
            HeaderValue::from_static("1; mode=block"),
        ))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers(Any),
        )
        .layer(middleware::from_fn_with_state(bucket, admission::admit))
        .layer(TraceLayer::new_for_http())

        // Add shared state
        .with_state(state)
}
