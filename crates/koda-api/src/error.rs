//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<koda_core::Error> for ApiError {
  fn from(err: koda_core::Error) -> Self {
    match err {
      koda_core::Error::DurationOutOfRange(_) => {
        ApiError::BadRequest(err.to_string())
      }
      koda_core::Error::UserNotFound(_) => ApiError::NotFound(err.to_string()),
      koda_core::Error::Store(inner) => ApiError::Store(inner),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let body = Json(json!({ "error": message }));
    if matches!(self, ApiError::Unauthorized) {
      return (
        status,
        [(header::WWW_AUTHENTICATE, "Basic realm=\"koda\"")],
        body,
      )
        .into_response();
    }
    (status, body).into_response()
  }
}
