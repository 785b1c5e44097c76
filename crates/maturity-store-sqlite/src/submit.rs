//! Submission writes and reads.

use std::collections::BTreeMap;

use maturity_core::{
  scoring::{self, AssessmentResult},
  submission::{
    AnswerKind, AnswerValue, MarketResearchResponse, NewAnswer, NewSubmission, ScoreScope,
    ScreeningAnswer, SubmissionRecord,
  },
  survey::{Section, SurveyDefinition, SurveyOption, SurveyQuestion},
};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{RawAnswer, RawScore, RawSubmission, decode_uuid, encode_uuid},
};

// ─── Row writers ─────────────────────────────────────────────────────────────

/// Insert or overwrite the answer occupying the same
/// (question, kind, option, index) slot.
pub fn upsert_answer(
  conn: &Connection,
  submission_id: Uuid,
  answer: &NewAnswer,
  now: &str,
) -> Result<()> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO survey_submission_answer (
       answer_id, submission_id, map_id, question_id, option_id,
       answer_kind, answer_text, answer_numeric, answer_index, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
     ON CONFLICT (submission_id, question_id, answer_kind, COALESCE(option_id, ''), answer_index)
     DO UPDATE SET
       map_id         = excluded.map_id,
       option_id      = excluded.option_id,
       answer_text    = excluded.answer_text,
       answer_numeric = excluded.answer_numeric,
       created_at     = excluded.created_at",
  )?;
  stmt.execute(params![
    encode_uuid(Uuid::new_v4()),
    encode_uuid(submission_id),
    encode_uuid(answer.map_id),
    encode_uuid(answer.question_id),
    answer.value.option_id().map(encode_uuid),
    answer.value.kind().as_str(),
    answer.value.text(),
    answer.value.numeric(),
    answer.index,
    now,
  ])?;
  Ok(())
}

pub fn upsert_score(
  conn: &Connection,
  submission_id: Uuid,
  scope: ScoreScope,
  scope_key: &str,
  value: f64,
  now: &str,
) -> Result<()> {
  let mut stmt = conn.prepare_cached(
    "INSERT INTO survey_submission_score (
       score_id, submission_id, score_scope, scope_key, score_value, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
     ON CONFLICT (submission_id, score_scope, scope_key) DO UPDATE SET
       score_value = excluded.score_value,
       created_at  = excluded.created_at",
  )?;
  stmt.execute(params![
    encode_uuid(Uuid::new_v4()),
    encode_uuid(submission_id),
    scope.as_str(),
    scope_key,
    value,
    now,
  ])?;
  Ok(())
}

/// The screening answer row for `question`.
pub fn screening_answer(
  question: &SurveyQuestion,
  option: Option<&SurveyOption>,
  value: ScreeningAnswer,
) -> NewAnswer {
  NewAnswer {
    question_id: question.question_id,
    map_id:      question.map_id,
    index:       0,
    value:       AnswerValue::Screening { option_id: option.map(|o| o.option_id), value },
  }
}

/// One answer and one question score per maturity question with a level in
/// `answers`. Returns the number of questions written.
pub fn write_maturity_answers(
  conn: &Connection,
  submission_id: Uuid,
  definition: &SurveyDefinition,
  answers: &scoring::MaturityAnswers,
  now: &str,
) -> Result<usize> {
  let mut written = 0;
  for question in definition.questions_in(Section::Maturity) {
    let Some(&level) = answers.get(&question.key) else {
      continue;
    };
    if !level.is_finite() {
      continue;
    }
    upsert_answer(conn, submission_id, &NewAnswer::maturity(question, level), now)?;
    upsert_score(
      conn,
      submission_id,
      ScoreScope::Question,
      &question.key,
      scoring::question_score_from_level(level),
      now,
    )?;
    written += 1;
  }
  Ok(written)
}

/// Delete then rewrite the market-research answers of one question.
pub fn replace_market_research(
  conn: &Connection,
  submission_id: Uuid,
  question: &SurveyQuestion,
  response: &MarketResearchResponse,
  now: &str,
) -> Result<()> {
  conn.execute(
    "DELETE FROM survey_submission_answer
     WHERE submission_id = ?1 AND question_id = ?2 AND answer_kind IN (?3, ?4, ?5)",
    params![
      encode_uuid(submission_id),
      encode_uuid(question.question_id),
      AnswerKind::SelectedOption.as_str(),
      AnswerKind::OtherText.as_str(),
      AnswerKind::OpenText.as_str(),
    ],
  )?;
  for answer in response.answers(question) {
    upsert_answer(conn, submission_id, &answer, now)?;
  }
  Ok(())
}

// ─── Stage writes ────────────────────────────────────────────────────────────

/// Everything the first submission stage writes, resolved ahead of the
/// transaction.
pub struct AssessmentWrite {
  pub submission_id: Uuid,
  pub session_id:    String,
  pub screening:     NewAnswer,
  pub input:         NewSubmission,
  pub result:        AssessmentResult,
}

pub fn write_assessment(
  conn: &Connection,
  definition: &SurveyDefinition,
  write: &AssessmentWrite,
  now: &str,
) -> Result<()> {
  conn.execute(
    "INSERT INTO survey_submission (
       submission_id, survey_id, session_id, user_agent, referrer,
       respondent_email, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?6)",
    params![
      encode_uuid(write.submission_id),
      encode_uuid(definition.survey_id()),
      write.session_id,
      write.input.user_agent,
      write.input.referrer,
      now,
    ],
  )?;

  upsert_answer(conn, write.submission_id, &write.screening, now)?;
  write_maturity_answers(conn, write.submission_id, definition, &write.input.answers, now)?;

  upsert_score(
    conn,
    write.submission_id,
    ScoreScope::Overall,
    "overall",
    write.result.overall_score as f64,
    now,
  )?;
  for capability in &write.result.capability_scores {
    upsert_score(
      conn,
      write.submission_id,
      ScoreScope::Capability,
      &capability.id,
      capability.score as f64,
      now,
    )?;
  }
  Ok(())
}

/// Rewrite the market-research answers of every key that resolves in the
/// survey's market-research section. Unknown keys are skipped.
pub fn write_market_research(
  conn: &Connection,
  definition: &SurveyDefinition,
  submission_id: Uuid,
  responses: &BTreeMap<String, MarketResearchResponse>,
  now: &str,
) -> Result<()> {
  for (key, response) in responses {
    let Some(question) = definition.find_question_by_key(key, Some(Section::MarketResearch))
    else {
      continue;
    };
    replace_market_research(conn, submission_id, question, response, now)?;
  }
  conn.execute(
    "UPDATE survey_submission SET updated_at = ?2 WHERE submission_id = ?1",
    params![encode_uuid(submission_id), now],
  )?;
  Ok(())
}

/// Returns `false` when the submission does not exist.
pub fn set_email(conn: &Connection, submission_id: Uuid, email: &str, now: &str) -> Result<bool> {
  let updated = conn.execute(
    "UPDATE survey_submission SET respondent_email = ?2, updated_at = ?3
     WHERE submission_id = ?1",
    params![encode_uuid(submission_id), email, now],
  )?;
  Ok(updated > 0)
}

// ─── Reads ───────────────────────────────────────────────────────────────────

pub fn submission_survey_id(conn: &Connection, submission_id: Uuid) -> Result<Option<Uuid>> {
  let survey_id: Option<String> = conn
    .query_row(
      "SELECT survey_id FROM survey_submission WHERE submission_id = ?1",
      params![encode_uuid(submission_id)],
      |row| row.get(0),
    )
    .optional()?;
  survey_id.as_deref().map(decode_uuid).transpose()
}

pub fn load_record(conn: &Connection, submission_id: Uuid) -> Result<Option<SubmissionRecord>> {
  let id = encode_uuid(submission_id);

  let raw = conn
    .query_row(
      "SELECT submission_id, survey_id, session_id, user_agent, referrer,
              respondent_email, created_at
       FROM survey_submission WHERE submission_id = ?1",
      params![id],
      RawSubmission::from_row,
    )
    .optional()?;
  let Some(raw) = raw else {
    return Ok(None);
  };
  let submission = raw.into_submission()?;

  let mut stmt = conn.prepare_cached(
    "SELECT a.question_id, a.answer_kind, a.answer_index, a.option_id,
            o.option_key, o.option_label, o.maturity_level, a.answer_text, a.answer_numeric
     FROM survey_submission_answer a
     LEFT JOIN question_option o ON o.option_id = a.option_id
     WHERE a.submission_id = ?1
     ORDER BY a.question_id, a.answer_index, a.created_at",
  )?;
  let answers = stmt
    .query_map(params![id], RawAnswer::from_row)?
    .map(|raw| raw?.into_answer())
    .collect::<Result<Vec<_>>>()?;

  let mut stmt = conn.prepare_cached(
    "SELECT score_scope, scope_key, score_value
     FROM survey_submission_score
     WHERE submission_id = ?1
     ORDER BY score_scope, scope_key",
  )?;
  let scores = stmt
    .query_map(params![id], |row| {
      Ok(RawScore { score_scope: row.get(0)?, scope_key: row.get(1)?, score_value: row.get(2)? })
    })?
    .map(|raw| raw?.into_score())
    .collect::<Result<Vec<_>>>()?;

  Ok(Some(SubmissionRecord { submission, answers, scores }))
}
