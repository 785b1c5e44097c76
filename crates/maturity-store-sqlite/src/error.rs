//! Error type for `maturity-store-sqlite`.

use std::sync::Arc;

use maturity_core::store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] maturity_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("sqlite error: {0}")]
  Sqlite(#[from] rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A survey load failed while other callers were waiting on the same
  /// cache entry.
  #[error("{0}")]
  Shared(Arc<Error>),
}

impl StoreError for Error {
  fn as_core(&self) -> Option<&maturity_core::Error> {
    match self {
      Self::Core(e) => Some(e),
      Self::Shared(inner) => inner.as_core(),
      _ => None,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
