//! Reads and writes against the flat pre-normalization tables.

use maturity_core::{
  legacy::{LegacyAssessment, LegacyMarketResearch, LegacyScores},
  submission::ScreeningAnswer,
};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{decode_dt, decode_uuid, encode_dt, encode_uuid},
};

struct RawAssessment {
  id:               String,
  screening_answer: String,
  answers:          String,
  scores:           LegacyScores,
  archetype_id:     Option<String>,
  created_at:       String,
  user_agent:       Option<String>,
  referrer:         Option<String>,
  session_id:       Option<String>,
  email:            Option<String>,
}

impl RawAssessment {
  fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:               row.get(0)?,
      screening_answer: row.get(1)?,
      answers:          row.get(2)?,
      scores:           LegacyScores {
        overall:      row.get(3)?,
        specs:        row.get(4)?,
        context:      row.get(5)?,
        agents:       row.get(6)?,
        feedback:     row.get(7)?,
        governance:   row.get(8)?,
        delivery:     row.get(9)?,
        organization: row.get(10)?,
      },
      archetype_id:     row.get(11)?,
      created_at:       row.get(12)?,
      user_agent:       row.get(13)?,
      referrer:         row.get(14)?,
      session_id:       row.get(15)?,
      email:            row.get(16)?,
    })
  }

  fn into_assessment(self) -> Result<LegacyAssessment> {
    Ok(LegacyAssessment {
      id:               decode_uuid(&self.id)?,
      screening_answer: ScreeningAnswer::parse(&self.screening_answer)?,
      // Unreadable answer blobs migrate as empty.
      answers:          serde_json::from_str(&self.answers).unwrap_or(serde_json::Value::Null),
      scores:           self.scores,
      archetype_id:     self.archetype_id,
      created_at:       decode_dt(&self.created_at)?,
      user_agent:       self.user_agent,
      referrer:         self.referrer,
      session_id:       self.session_id,
      email:            self.email,
    })
  }
}

/// Insert or update an `assessments` row. Tracking columns that are already
/// set are kept when the new value is absent.
pub fn upsert_assessment(conn: &Connection, row: &LegacyAssessment) -> Result<()> {
  let scores = &row.scores;
  conn.execute(
    "INSERT INTO assessments (
       id, screening_answer, answers, score_overall, score_specs, score_context,
       score_agents, score_feedback, score_governance, score_delivery,
       score_organization, archetype_id, created_at, user_agent, referrer,
       session_id, email
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)
     ON CONFLICT (id) DO UPDATE SET
       screening_answer   = excluded.screening_answer,
       answers            = excluded.answers,
       score_overall      = excluded.score_overall,
       score_specs        = excluded.score_specs,
       score_context      = excluded.score_context,
       score_agents       = excluded.score_agents,
       score_feedback     = excluded.score_feedback,
       score_governance   = excluded.score_governance,
       score_delivery     = excluded.score_delivery,
       score_organization = excluded.score_organization,
       archetype_id       = excluded.archetype_id,
       user_agent         = COALESCE(excluded.user_agent, assessments.user_agent),
       referrer           = COALESCE(excluded.referrer, assessments.referrer),
       session_id         = COALESCE(excluded.session_id, assessments.session_id),
       email              = COALESCE(excluded.email, assessments.email)",
    params![
      encode_uuid(row.id),
      row.screening_answer.as_str(),
      row.answers.to_string(),
      scores.overall,
      scores.specs,
      scores.context,
      scores.agents,
      scores.feedback,
      scores.governance,
      scores.delivery,
      scores.organization,
      row.archetype_id,
      encode_dt(row.created_at),
      row.user_agent,
      row.referrer,
      row.session_id,
      row.email,
    ],
  )?;
  Ok(())
}

pub fn upsert_market_research(conn: &Connection, row: &LegacyMarketResearch) -> Result<()> {
  conn.execute(
    "INSERT INTO market_research_responses (id, assessment_id, question_key, response, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)
     ON CONFLICT (assessment_id, question_key) DO UPDATE SET
       response   = excluded.response,
       created_at = excluded.created_at",
    params![
      encode_uuid(Uuid::new_v4()),
      encode_uuid(row.assessment_id),
      row.question_key,
      row.response.to_string(),
      encode_dt(row.created_at),
    ],
  )?;
  Ok(())
}

/// Every legacy assessment, oldest first.
pub fn load_assessments(conn: &Connection) -> Result<Vec<LegacyAssessment>> {
  let mut stmt = conn.prepare(
    "SELECT id, screening_answer, answers, score_overall, score_specs, score_context,
            score_agents, score_feedback, score_governance, score_delivery,
            score_organization, archetype_id, created_at, user_agent, referrer,
            session_id, email
     FROM assessments
     ORDER BY created_at ASC",
  )?;
  stmt
    .query_map([], RawAssessment::from_row)?
    .map(|raw| raw?.into_assessment())
    .collect()
}

/// Every legacy market-research row, oldest first.
pub fn load_market_research(conn: &Connection) -> Result<Vec<LegacyMarketResearch>> {
  let mut stmt = conn.prepare(
    "SELECT assessment_id, question_key, response, created_at
     FROM market_research_responses
     ORDER BY created_at ASC",
  )?;
  stmt
    .query_map([], |row| {
      Ok((
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get::<_, String>(2)?,
        row.get::<_, String>(3)?,
      ))
    })?
    .map(|raw| {
      let (assessment_id, question_key, response, created_at) = raw?;
      Ok(LegacyMarketResearch {
        assessment_id: decode_uuid(&assessment_id)?,
        question_key,
        response: serde_json::from_str(&response).unwrap_or(serde_json::Value::Null),
        created_at: decode_dt(&created_at)?,
      })
    })
    .collect()
}
