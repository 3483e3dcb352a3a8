use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use polypath_core::PathError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("{message}")]
    Unprocessable { code: &'static str, message: String },
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<PathError> for AppError {
    fn from(e: PathError) -> Self {
        if e.is_input_error() {
            AppError::Unprocessable { code: e.code(), message: e.to_string() }
        } else {
            AppError::Internal(anyhow::Error::new(e))
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: ErrorPayload<'a>,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    code: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            AppError::Unprocessable { code, message } => (StatusCode::UNPROCESSABLE_ENTITY, code, message),
            AppError::Internal(e) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", e.to_string()),
        };
        (status, Json(ErrorBody { error: ErrorPayload { code, message } })).into_response()
    }
}
