use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::ApiError;
use crate::rate_limit::{limit_by_client_ip, RateLimiter};
use crate::schema::{validate_request, InviteSchema};
use crate::state::AppState;
use crate::{admin, handler};

/// Public API: health plus the per-invite endpoints, behind the rate
/// limiter. Request validation only wraps the invite routes.
pub fn public_router(
    state: AppState,
    schema: Arc<InviteSchema>,
    limiter: Arc<RateLimiter>,
) -> Router {
    let invites = Router::new()
        .route(
            "/invites/:id",
            get(handler::get_invite).put(handler::put_invite),
        )
        .route_layer(from_fn_with_state(schema, validate_request));

    Router::new()
        .route("/health", get(handler::health))
        .merge(invites)
        .fallback(route_not_found)
        .layer(from_fn_with_state(limiter, limit_by_client_ip))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Admin API. Serve it on its own listener.
pub fn admin_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/admin/invites",
            get(admin::get_admin_invites).put(admin::put_admin_invites),
        )
        .fallback(route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn route_not_found() -> ApiError {
    ApiError::new(axum::http::StatusCode::NOT_FOUND, "route not found")
}
