//! Handlers for the three `/submit` stages.
//!
//! | Method  | Body | Notes |
//! |---------|------|-------|
//! | `POST`  | `{"screening_answer", "answers"}` | Creates the submission; sets both tracking cookies |
//! | `PUT`   | `{"assessmentId", "marketResearch"}` | Replaces answers per `M<n>` key |
//! | `PATCH` | `{"assessmentId", "email"}` | Records the respondent email |
//!
//! `PUT` and `PATCH` accept `assessment_id` too, and fall back to the
//! `assessment_id` cookie when the body carries neither.

use axum::{
  Json,
  body::Bytes,
  extract::State,
  http::{
    HeaderMap,
    header::{REFERER, SET_COOKIE, USER_AGENT},
  },
  response::{AppendHeaders, IntoResponse, Response},
};
use maturity_core::{
  notify::{Notifier, SubmissionEvent},
  scoring,
  store::SurveyStore,
  submission::{self, NewSubmission},
};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{ApiState, cookies, error::ApiError, notify};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
  pub ok:             bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub question_count: Option<usize>,
  pub submission_id:  String,
  pub assessment_id:  String,
}

impl SubmitResponse {
  fn new(submission_id: &str, question_count: Option<usize>) -> Self {
    Self {
      ok: true,
      question_count,
      submission_id: submission_id.to_owned(),
      assessment_id: submission_id.to_owned(),
    }
  }
}

fn parse_body(body: &Bytes) -> Result<Value, ApiError> {
  serde_json::from_slice(body).map_err(|_| ApiError::invalid_json())
}

fn header(headers: &HeaderMap, name: axum::http::HeaderName) -> Option<String> {
  headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_owned)
}

/// The raw submission id from the body (`assessmentId`, then
/// `assessment_id`), else from the cookie.
fn raw_submission_id(body: &Value, headers: &HeaderMap) -> Result<String, ApiError> {
  ["assessmentId", "assessment_id"]
    .iter()
    .filter_map(|key| body.get(*key).and_then(Value::as_str))
    .find(|value| !value.trim().is_empty())
    .map(str::to_owned)
    .or_else(|| cookies::read(headers, cookies::ASSESSMENT_ID))
    .map(|raw| raw.trim().to_owned())
    .ok_or_else(|| ApiError::BadRequest("Missing assessmentId".to_owned()))
}

/// An id that cannot exist cannot be found either.
fn parse_submission_id(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| {
    ApiError::NotFound("Submission not found for provided assessmentId".to_owned())
  })
}

/// `POST /submit`
pub async fn assessment<S, N>(
  State(state): State<ApiState<S, N>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Response, ApiError>
where
  S: SurveyStore,
  N: Notifier,
{
  let body = parse_body(&body)?;
  let input = NewSubmission {
    screening_answer: body
      .get("screening_answer")
      .and_then(Value::as_str)
      .unwrap_or_default()
      .to_owned(),
    answers:          scoring::parse_maturity_answers(body.get("answers").unwrap_or(&Value::Null)),
    session_id:       cookies::read(&headers, cookies::SESSION_ID),
    user_agent:       header(&headers, USER_AGENT),
    referrer:         header(&headers, REFERER),
  };

  let created = state.store.create_submission(input).await.map_err(ApiError::from_store)?;
  notify::submission_summary(&state, SubmissionEvent::Assessment, created.submission_id).await;

  let id = created.submission_id.to_string();
  Ok(
    (
      AppendHeaders([
        (SET_COOKIE, cookies::assessment(&id, state.options)),
        (SET_COOKIE, cookies::session(&created.session_id, state.options)),
      ]),
      Json(SubmitResponse::new(&id, None)),
    )
      .into_response(),
  )
}

/// `PUT /submit`
pub async fn market_research<S, N>(
  State(state): State<ApiState<S, N>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Response, ApiError>
where
  S: SurveyStore,
  N: Notifier,
{
  let body = parse_body(&body)?;
  let raw_id = raw_submission_id(&body, &headers)?;
  let responses = body
    .get("marketResearch")
    .filter(|v| v.is_object())
    .map(submission::parse_market_research)
    .ok_or_else(|| ApiError::BadRequest("marketResearch must be an object".to_owned()))?;

  // Nothing to record: acknowledge without looking the submission up.
  if responses.is_empty() {
    return Ok(
      (
        AppendHeaders([(SET_COOKIE, cookies::assessment(&raw_id, state.options))]),
        Json(SubmitResponse::new(&raw_id, Some(0))),
      )
        .into_response(),
    );
  }

  let submission_id = parse_submission_id(&raw_id)?;
  let question_count = state
    .store
    .update_market_research(submission_id, responses)
    .await
    .map_err(ApiError::from_store)?;
  if question_count > 0 {
    notify::submission_summary(&state, SubmissionEvent::MarketResearch, submission_id).await;
  }

  Ok(
    (
      AppendHeaders([(SET_COOKIE, cookies::assessment(&raw_id, state.options))]),
      Json(SubmitResponse::new(&raw_id, Some(question_count))),
    )
      .into_response(),
  )
}

/// `PATCH /submit`
pub async fn email<S, N>(
  State(state): State<ApiState<S, N>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<Response, ApiError>
where
  S: SurveyStore,
  N: Notifier,
{
  let body = parse_body(&body)?;
  let raw_id = raw_submission_id(&body, &headers)?;
  let submission_id = parse_submission_id(&raw_id)?;
  let email = body.get("email").and_then(Value::as_str).unwrap_or_default().to_owned();

  state
    .store
    .update_email(submission_id, email)
    .await
    .map_err(ApiError::from_store)?;
  notify::submission_summary(&state, SubmissionEvent::EmailCapture, submission_id).await;

  Ok(
    (
      AppendHeaders([(SET_COOKIE, cookies::assessment(&raw_id, state.options))]),
      Json(SubmitResponse::new(&raw_id, None)),
    )
      .into_response(),
  )
}
