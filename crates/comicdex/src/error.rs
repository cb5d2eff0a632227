use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use comicdex_core::error::Error;
use serde_json::json;

/// The only boundary that maps core error kinds to HTTP status codes.
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            Error::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            Error::Transient(_) | Error::Internal(_) => {
                log::error!("[ http ] internal error: {:?}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
            Error::UpdateInProgress => (StatusCode::ACCEPTED, "update in progress".to_string()),
            Error::WrongCredentials => (StatusCode::UNAUTHORIZED, "wrong credentials".to_string()),
            Error::BadToken => (StatusCode::UNAUTHORIZED, "bad token".to_string()),
            Error::Cancelled => (StatusCode::GATEWAY_TIMEOUT, "scan timeout exceeded".to_string()),
        };

        let body = Json(json!({ "error": message }));

        if matches!(self.0, Error::BadToken) {
            return (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response();
        }

        (status, body).into_response()
    }
}
