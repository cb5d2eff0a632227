mod middleware;
mod routes;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full route tree: concurrency-gate middleware (outermost,
/// process-wide) -> auth middleware (role-checked per route) -> rate-limit
/// middleware (query route only) -> handler.
pub fn router(state: AppState) -> Router {
    let pics = Router::new()
        .route("/pics", get(routes::pics))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), middleware::rate_limit))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), middleware::require_user));

    let update = Router::new()
        .route("/update", post(routes::update))
        .route_layer(axum::middleware::from_fn_with_state(state.clone(), middleware::require_admin));

    let login = Router::new().route("/login", post(routes::login));

    Router::new()
        .merge(login)
        .merge(update)
        .merge(pics)
        .layer(axum::middleware::from_fn_with_state(state.clone(), middleware::concurrency_gate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
