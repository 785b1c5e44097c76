//! The `SurveyStore` trait and supporting option types.
//!
//! Implemented by storage backends (e.g. `maturity-store-sqlite`). The HTTP
//! layer and the server binary depend on this abstraction, not on a concrete
//! backend.

use std::{collections::BTreeMap, future::Future, sync::Arc};

use uuid::Uuid;

use crate::{
  assessment::AssessmentData,
  legacy::BackfillReport,
  submission::{MarketResearchResponse, NewSubmission, SubmissionCreated, SubmissionRecord},
  survey::{ImportSummary, SurveyDefinition},
};

/// How [`SurveyStore::active_survey`] resolves the active version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
  /// Import the bundled question bank when no survey is active yet.
  pub bootstrap_from_bundled: bool,
  /// Serve from and populate the short-lived definition cache.
  pub use_cache:              bool,
}

impl Default for ReadOptions {
  fn default() -> Self { Self { bootstrap_from_bundled: true, use_cache: true } }
}

/// Lets callers recover the domain error behind a backend error.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn as_core(&self) -> Option<&crate::Error>;

  fn is_validation(&self) -> bool { self.as_core().is_some_and(crate::Error::is_validation) }

  fn is_not_found(&self) -> bool { self.as_core().is_some_and(crate::Error::is_not_found) }
}

/// Abstraction over a survey store backend.
///
/// Survey versions are immutable once imported; only their status changes.
/// Submissions are written in stages (assessment, market research, email)
/// and every stage is idempotent for the rows it owns.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait SurveyStore: Send + Sync {
  type Error: StoreError;

  // ── Schema ────────────────────────────────────────────────────────────

  /// Create all tables and indexes if absent. Safe to call repeatedly and
  /// concurrently; every other method awaits it first.
  fn ensure_schema(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Surveys ───────────────────────────────────────────────────────────

  /// Snapshot `bank` as a new active survey version, archiving the previous
  /// one. All-or-nothing.
  fn import_survey(
    &self,
    bank: AssessmentData,
    source: String,
    name: String,
  ) -> impl Future<Output = Result<ImportSummary, Self::Error>> + Send + '_;

  /// The active survey version, or `None` when there is none.
  fn active_survey(
    &self,
    options: ReadOptions,
  ) -> impl Future<Output = Result<Option<Arc<SurveyDefinition>>, Self::Error>> + Send + '_;

  /// A specific survey version, regardless of its status.
  fn survey_by_id(
    &self,
    survey_id: Uuid,
    use_cache: bool,
  ) -> impl Future<Output = Result<Option<Arc<SurveyDefinition>>, Self::Error>> + Send + '_;

  // ── Submissions ───────────────────────────────────────────────────────

  /// Record screening and maturity answers with their scores against the
  /// active survey.
  fn create_submission(
    &self,
    submission: NewSubmission,
  ) -> impl Future<Output = Result<SubmissionCreated, Self::Error>> + Send + '_;

  /// Replace the market-research answers for each given question key.
  /// Returns the number of keys touched.
  fn update_market_research(
    &self,
    submission_id: Uuid,
    responses: BTreeMap<String, MarketResearchResponse>,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  fn update_email(
    &self,
    submission_id: Uuid,
    email: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// A submission with its answers and scores, or `None` when unknown.
  fn submission_record(
    &self,
    submission_id: Uuid,
  ) -> impl Future<Output = Result<Option<SubmissionRecord>, Self::Error>> + Send + '_;

  // ── Migration ─────────────────────────────────────────────────────────

  /// Copy legacy rows into the normalized tables and validate the result.
  fn backfill(&self) -> impl Future<Output = Result<BackfillReport, Self::Error>> + Send + '_;
}
