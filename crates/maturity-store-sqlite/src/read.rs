//! Loading survey versions with their questions and current options.

use std::collections::HashMap;

use maturity_core::survey::{SurveyHeader, SurveyOption, SurveyQuestion};
use rusqlite::{Connection, OptionalExtension as _, params};
use uuid::Uuid;

use crate::{
  Result,
  cache::SurveyKey,
  encode::{RawMappedQuestion, RawOption, RawSurvey, decode_uuid, encode_uuid},
};

pub fn load_header(conn: &Connection, key: SurveyKey) -> Result<Option<SurveyHeader>> {
  let raw = match key {
    SurveyKey::Active => conn
      .query_row(
        &format!(
          "SELECT {} FROM survey WHERE status = 'active' ORDER BY version_number DESC LIMIT 1",
          RawSurvey::COLUMNS
        ),
        [],
        RawSurvey::from_row,
      )
      .optional()?,
    SurveyKey::Id(id) => conn
      .query_row(
        &format!("SELECT {} FROM survey WHERE survey_id = ?1", RawSurvey::COLUMNS),
        params![encode_uuid(id)],
        RawSurvey::from_row,
      )
      .optional()?,
  };
  raw.map(RawSurvey::into_header).transpose()
}

/// Enabled questions of a survey, each with its current options in order.
pub fn load_questions(conn: &Connection, survey_id: Uuid) -> Result<Vec<SurveyQuestion>> {
  let survey_id = encode_uuid(survey_id);

  let mut stmt = conn.prepare_cached(
    "SELECT o.question_id, o.option_id, o.option_key, o.option_label,
            o.maturity_level, o.option_order, o.is_other
     FROM question_option o
     JOIN survey_question_map m ON m.question_id = o.question_id
     WHERE m.survey_id = ?1 AND m.is_enabled = 1 AND o.retired_at IS NULL
     ORDER BY o.question_id, o.option_order",
  )?;
  let mut options: HashMap<Uuid, Vec<SurveyOption>> = HashMap::new();
  for raw in stmt.query_map(params![survey_id], RawOption::from_row)? {
    let (question_id, option) = raw?.into_option()?;
    options.entry(question_id).or_default().push(option);
  }

  let mut stmt = conn.prepare_cached(
    "SELECT m.map_id, m.survey_id, m.section, m.question_order, m.is_scored, m.is_enabled,
            q.question_id, q.question_key, q.question_type, q.capability_id, q.prompt,
            q.allow_other, q.is_required, q.metadata
     FROM survey_question_map m
     JOIN question q ON q.question_id = m.question_id
     WHERE m.survey_id = ?1 AND m.is_enabled = 1
     ORDER BY m.section, m.question_order",
  )?;
  let raws = stmt
    .query_map(params![survey_id], RawMappedQuestion::from_row)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  raws
    .into_iter()
    .map(|raw| {
      let question_id = decode_uuid(&raw.question_id)?;
      raw.into_question(options.remove(&question_id).unwrap_or_default())
    })
    .collect()
}

/// The header and questions of a survey, or `None` when it does not exist.
pub fn load_survey(
  conn: &Connection,
  key: SurveyKey,
) -> Result<Option<(SurveyHeader, Vec<SurveyQuestion>)>> {
  let Some(header) = load_header(conn, key)? else {
    return Ok(None);
  };
  let questions = load_questions(conn, header.survey_id)?;
  Ok(Some((header, questions)))
}
