//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use maturity_core::store::StoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store error: rejected input is a 400, a missing row a 404,
  /// anything else a 500.
  pub fn from_store<E: StoreError>(err: E) -> Self {
    match err.as_core() {
      Some(core) if core.is_validation() => Self::BadRequest(core.to_string()),
      Some(core) if core.is_not_found() => Self::NotFound(core.to_string()),
      _ => Self::Store(Box::new(err)),
    }
  }

  pub fn invalid_json() -> Self { Self::BadRequest("Invalid JSON payload".to_owned()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => {
        error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
