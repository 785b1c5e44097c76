//! `GET /survey/active`

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use maturity_core::{
  assessment::AssessmentData,
  notify::Notifier,
  store::{ReadOptions, SurveyStore},
  survey::SurveyStatus,
};
use serde::Serialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySummary {
  pub id:              Uuid,
  pub version_number:  u32,
  pub name:            String,
  pub status:          SurveyStatus,
  pub activated_at:    Option<DateTime<Utc>>,
  pub source_checksum: String,
}

#[derive(Debug, Serialize)]
pub struct ActiveSurvey {
  pub survey: SurveySummary,
  pub data:   AssessmentData,
}

/// The active survey version and its question bank view. Bootstraps from the
/// bundled bank when the store is empty.
pub async fn active<S, N>(
  State(state): State<ApiState<S, N>>,
) -> Result<Json<ActiveSurvey>, ApiError>
where
  S: SurveyStore,
  N: Notifier,
{
  let definition = state
    .store
    .active_survey(ReadOptions::default())
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound("No active survey is configured".to_owned()))?;

  let header = &definition.header;
  Ok(Json(ActiveSurvey {
    survey: SurveySummary {
      id:              header.survey_id,
      version_number:  header.version_number,
      name:            header.name.clone(),
      status:          header.status,
      activated_at:    header.activated_at,
      source_checksum: header.source_checksum.clone(),
    },
    data:   definition.assessment.clone(),
  }))
}
