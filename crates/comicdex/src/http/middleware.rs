use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use comicdex_core::domain::User;
use serde_json::json;

use crate::error::ApiError;
use crate::state::{AppState, ROLE_ADMIN, ROLE_USER};

/// Outermost gate: a process-wide, non-blocking admission semaphore.
/// Holds the permit for the lifetime of the request by attaching it as a
/// request extension so it drops (and frees its slot) when the response
/// completes.
pub async fn concurrency_gate(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    match state.concurrency_gate.try_acquire() {
        Some(permit) => {
            req.extensions_mut().insert(permit);
            next.run(req).await
        }
        None => {
            log::warn!("[ http.concurrency_gate ] rejected: at capacity");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "service unavailable, try again later" })),
            )
                .into_response()
        }
    }
}

pub async fn require_admin(state: State<AppState>, req: Request, next: Next) -> Response {
    require_role(ROLE_ADMIN, state, req, next).await
}

pub async fn require_user(state: State<AppState>, req: Request, next: Next) -> Response {
    require_role(ROLE_USER, state, req, next).await
}

/// Validates the bearer token, resolves it to a `User`, and injects the
/// user as a request extension for handlers and the rate-limit middleware
/// downstream.
async fn require_role(required_role: i64, State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let token = match bearer_token(&req) {
        Some(token) => token,
        None => return unauthorized(),
    };

    let user = match state.auth.authenticate(&token).await {
        Ok(user) => user,
        Err(err) => return ApiError::from(err).into_response(),
    };

    if !user.has_role(required_role) {
        return (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" }))).into_response();
    }

    req.extensions_mut().insert(user);
    next.run(req).await
}

fn bearer_token(req: &Request) -> Option<String> {
    req.headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(axum::http::header::WWW_AUTHENTICATE, "Bearer")],
        Json(json!({ "error": "unauthorized" })),
    )
        .into_response()
}

/// Per-user rate limiting, applied only to the query route. Requires
/// [`require_user`] to have already injected the resolved `User`.
pub async fn rate_limit(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let user = req
        .extensions()
        .get::<User>()
        .cloned()
        .expect("rate_limit must run after require_user");

    if !state.rate_limiter.take(&user.username) {
        log::warn!("[ http.rate_limit ] rate limit exceeded for '{}'", user.username);
        return (StatusCode::TOO_MANY_REQUESTS, Json(json!({ "error": "request limit exceeded" }))).into_response();
    }

    next.run(req).await
}
