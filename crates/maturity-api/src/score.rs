//! `POST /score`: score answers without persisting them.

use axum::{Json, body::Bytes, extract::State};
use maturity_core::{
  notify::Notifier,
  scoring::{self, AssessmentResult},
  store::{ReadOptions, SurveyStore},
};
use serde_json::Value;

use crate::{ApiState, error::ApiError};

/// Body: `{"answers": {"Q1": 3, ...}}`. Non-numeric answers are ignored.
pub async fn handler<S, N>(
  State(state): State<ApiState<S, N>>,
  body: Bytes,
) -> Result<Json<AssessmentResult>, ApiError>
where
  S: SurveyStore,
  N: Notifier,
{
  let body: Value = serde_json::from_slice(&body).map_err(|_| ApiError::invalid_json())?;
  let answers = body
    .get("answers")
    .filter(|a| a.is_object())
    .ok_or_else(|| ApiError::BadRequest("Missing or invalid answers".to_owned()))?;
  let answers = scoring::parse_maturity_answers(answers);

  let definition = state
    .store
    .active_survey(ReadOptions::default())
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound("No active survey is configured".to_owned()))?;

  let result = scoring::score(&answers, &definition.assessment)
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(result))
}
