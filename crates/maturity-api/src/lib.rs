//! JSON REST API for the maturity assessment.
//!
//! Exposes an axum [`Router`] backed by any [`maturity_core::store::SurveyStore`]
//! and any [`maturity_core::notify::Notifier`]. TLS and transport concerns
//! are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", maturity_api::api_router(store.clone(), notifier, ApiOptions::default()))
//! ```

pub mod error;
pub mod score;
pub mod submit;
pub mod survey;

mod cookies;
mod notify;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use maturity_core::{notify::Notifier, store::SurveyStore};

pub use error::ApiError;

/// Settings that do not belong to the store or the notifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiOptions {
  /// Mark tracking cookies `Secure`.
  pub secure_cookies: bool,
}

/// Shared handler state.
pub struct ApiState<S, N> {
  pub store:    Arc<S>,
  pub notifier: Arc<N>,
  pub options:  ApiOptions,
}

impl<S, N> Clone for ApiState<S, N> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      notifier: Arc::clone(&self.notifier),
      options:  self.options,
    }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S, N>(store: Arc<S>, notifier: Arc<N>, options: ApiOptions) -> Router<()>
where
  S: SurveyStore + 'static,
  N: Notifier + 'static,
{
  Router::new()
    .route("/survey/active", get(survey::active::<S, N>))
    .route("/score", post(score::handler::<S, N>))
    .route(
      "/submit",
      post(submit::assessment::<S, N>)
        .put(submit::market_research::<S, N>)
        .patch(submit::email::<S, N>),
    )
    .with_state(ApiState { store, notifier, options })
}

#[cfg(test)]
mod tests;
