//! Copying the legacy flat tables into the normalized schema.

use maturity_core::{
  legacy::{LegacyAssessment, ValidationReport},
  scoring,
  submission::{AnswerKind, MarketResearchResponse, ScoreScope},
  survey::{Section, SurveyDefinition},
};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{encode_dt, encode_uuid},
  legacy,
  submit,
};

const SPOT_CHECK_SAMPLE: u32 = 20;

/// Row counts written by [`backfill_rows`].
pub struct BackfillCounts {
  pub submissions:    u64,
  pub market_answers: u64,
}

fn upsert_submission(
  conn: &Connection,
  survey_id: Uuid,
  row: &LegacyAssessment,
  now: &str,
) -> Result<()> {
  conn.execute(
    "INSERT INTO survey_submission (
       submission_id, survey_id, session_id, user_agent, referrer,
       respondent_email, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
     ON CONFLICT (submission_id) DO UPDATE SET
       survey_id        = excluded.survey_id,
       session_id       = COALESCE(survey_submission.session_id, excluded.session_id),
       user_agent       = COALESCE(survey_submission.user_agent, excluded.user_agent),
       referrer         = COALESCE(survey_submission.referrer, excluded.referrer),
       respondent_email = COALESCE(survey_submission.respondent_email, excluded.respondent_email),
       updated_at       = excluded.updated_at",
    params![
      encode_uuid(row.id),
      encode_uuid(survey_id),
      row.session_id,
      row.user_agent,
      row.referrer,
      row.email,
      encode_dt(row.created_at),
      now,
    ],
  )?;
  Ok(())
}

fn backfill_assessment(
  conn: &Connection,
  definition: &SurveyDefinition,
  row: &LegacyAssessment,
  now: &str,
) -> Result<()> {
  upsert_submission(conn, definition.survey_id(), row, now)?;
  let at = encode_dt(row.created_at);

  if let Some(question) = definition.screening_question() {
    let option = question.find_option_by_value(row.screening_answer.as_str());
    let answer = submit::screening_answer(question, option, row.screening_answer);
    submit::upsert_answer(conn, row.id, &answer, &at)?;
  }

  let answers = scoring::parse_maturity_answers(&row.answers);
  submit::write_maturity_answers(conn, row.id, definition, &answers, &at)?;

  if let Some(overall) = row.scores.overall {
    submit::upsert_score(conn, row.id, ScoreScope::Overall, "overall", overall as f64, &at)?;
  }
  for (capability, score) in row.scores.capabilities() {
    if let Some(score) = score {
      submit::upsert_score(conn, row.id, ScoreScope::Capability, capability, score as f64, &at)?;
    }
  }
  Ok(())
}

/// Copy every legacy row into `definition`'s survey. Runs inside the
/// caller's transaction; re-running converges on the same rows.
pub fn backfill_rows(
  conn: &Connection,
  definition: &SurveyDefinition,
  now: &str,
) -> Result<BackfillCounts> {
  let assessments = legacy::load_assessments(conn)?;
  for row in &assessments {
    backfill_assessment(conn, definition, row, now)?;
  }

  let mut market_answers = 0;
  for row in legacy::load_market_research(conn)? {
    let Some(question) =
      definition.find_question_by_key(&row.question_key, Some(Section::MarketResearch))
    else {
      continue;
    };
    let response = MarketResearchResponse::from_value(&row.response);
    submit::replace_market_research(
      conn,
      row.assessment_id,
      question,
      &response,
      &encode_dt(row.created_at),
    )?;
    market_answers += 1;
  }

  Ok(BackfillCounts { submissions: assessments.len() as u64, market_answers })
}

fn count(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<u64> {
  let n: i64 = conn.query_row(sql, params, |row| row.get(0))?;
  Ok(u64::try_from(n).unwrap_or_default())
}

/// Compare legacy and normalized row counts and spot-check a random sample
/// of maturity answers.
pub fn validate(conn: &Connection, survey_id: Uuid) -> Result<ValidationReport> {
  let survey_id = encode_uuid(survey_id);

  let mut report = ValidationReport {
    legacy_submission_count: count(conn, "SELECT COUNT(*) FROM assessments", [])?,
    normalized_submission_count: count(
      conn,
      "SELECT COUNT(*) FROM survey_submission WHERE survey_id = ?1",
      params![survey_id],
    )?,
    missing_submission_count: count(
      conn,
      "SELECT COUNT(*) FROM assessments a
       LEFT JOIN survey_submission s ON s.submission_id = a.id
       WHERE s.submission_id IS NULL",
      [],
    )?,
    legacy_market_research_rows: count(conn, "SELECT COUNT(*) FROM market_research_responses", [])?,
    normalized_market_research_rows: count(
      conn,
      "SELECT COUNT(*) FROM survey_submission_answer a
       JOIN question q ON q.question_id = a.question_id
       JOIN survey_submission s ON s.submission_id = a.submission_id
       WHERE q.question_group = 'market-research' AND s.survey_id = ?1",
      params![survey_id],
    )?,
    ..ValidationReport::default()
  };

  let mut sample = conn.prepare(
    "SELECT id, answers FROM assessments ORDER BY random() LIMIT ?1",
  )?;
  let rows = sample
    .query_map(params![SPOT_CHECK_SAMPLE], |row| {
      Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  for (id, answers) in rows {
    let answers: serde_json::Value =
      serde_json::from_str(&answers).unwrap_or(serde_json::Value::Null);
    let expected = scoring::parse_maturity_answers(&answers).len() as u64;
    let actual = count(
      conn,
      "SELECT COUNT(*) FROM survey_submission_answer a
       JOIN question q ON q.question_id = a.question_id
       WHERE a.submission_id = ?1 AND q.question_group = 'maturity' AND a.answer_kind = ?2",
      params![id, AnswerKind::SelectedOption.as_str()],
    )?;
    report.random_spot_checks += 1;
    if expected != actual {
      report.random_spot_check_mismatches += 1;
    }
  }

  Ok(report)
}
