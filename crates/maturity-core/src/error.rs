//! Error types for `maturity-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("screening_answer must be 'yes' or 'no', got {0:?}")]
  InvalidScreeningAnswer(String),

  #[error("invalid email address")]
  InvalidEmail,

  #[error("screening option {0:?} is not part of the active survey")]
  InvalidScreeningOption(String),

  #[error("submission not found: {0}")]
  SubmissionNotFound(Uuid),

  #[error("survey not found: {0}")]
  SurveyNotFound(Uuid),

  #[error("no active survey is configured")]
  NoActiveSurvey,

  #[error("active survey is missing its screening question")]
  MissingScreeningQuestion,

  #[error("survey defines no archetypes")]
  NoArchetypes,

  #[error("unknown {kind} discriminant: {value:?}")]
  UnknownDiscriminant { kind: &'static str, value: String },

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Malformed caller input, rejected before any storage access.
  pub fn is_validation(&self) -> bool {
    matches!(
      self,
      Self::InvalidScreeningAnswer(_) | Self::InvalidEmail | Self::InvalidScreeningOption(_)
    )
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::SubmissionNotFound(_) | Self::SurveyNotFound(_) | Self::NoActiveSurvey)
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
