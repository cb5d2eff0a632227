use axum::extract::{Extension, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use comicdex_core::domain::User;
use comicdex_core::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    token: String,
}

/// `POST /login`. 200 -> `{token}`. 401 on wrong credentials. 400 on
/// missing username.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginRequest>) -> axum::response::Response {
    if body.username.is_empty() {
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": "username required" }))).into_response();
    }

    match state.auth.login(&body.username, &body.password).await {
        Ok(token) => Json(LoginResponse { token }).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[derive(Serialize)]
pub struct UpdateResponse {
    total: i64,
}

/// `POST /update`. Requires admin role. 200 -> `{total}`. 202 -> single-flight
/// rejection.
pub async fn update(State(state): State<AppState>) -> axum::response::Response {
    let cancel = tokio_util::sync::CancellationToken::new();

    match state.updater.update(&cancel).await {
        Ok(total) => Json(UpdateResponse { total }).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

#[derive(Deserialize)]
pub struct PicsQuery {
    search: Option<String>,
}

/// `GET /pics?search=...`. Requires user role, rate-limited per user,
/// concurrency-gated globally. 200 -> image URLs truncated to
/// `scan_limit`. 400 if `search` absent. 504 on scan timeout.
pub async fn pics(
    State(state): State<AppState>,
    Extension(_user): Extension<User>,
    Query(query): Query<PicsQuery>,
) -> axum::response::Response {
    let search = match query.search {
        Some(search) if !search.is_empty() => search,
        _ => return (StatusCode::BAD_REQUEST, Json(json!({ "error": "search param required" }))).into_response(),
    };

    let scan_timeout = state.scan_timeout;
    let scan_limit = state.scan_limit;
    let scanner = state.scanner.clone();

    let cancel = tokio_util::sync::CancellationToken::new();
    let timeout_guard = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(scan_timeout).await;
        timeout_guard.cancel();
    });

    match scanner.scan(&search, true, &cancel).await {
        Ok(mut urls) => {
            urls.truncate(scan_limit);
            Json(urls).into_response()
        }
        Err(Error::Cancelled) => ApiError::from(Error::Cancelled).into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}
