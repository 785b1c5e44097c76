//! Question bank → survey version.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use maturity_core::{
  assessment::AssessmentData,
  survey::{ImportSummary, QuestionSettings, QuestionType, Section, SurveyMetadata},
};
use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::{
  Result,
  encode::{decode_uuid, encode_dt, encode_question_type, encode_section, encode_uuid},
};

struct OptionSeed {
  key:   String,
  label: String,
  level: Option<u8>,
  order: u32,
}

/// One question as it will be written, before ids are known.
struct QuestionSeed {
  key:           String,
  section:       Section,
  question_type: QuestionType,
  capability_id: Option<String>,
  prompt:        String,
  settings:      QuestionSettings,
  options:       Vec<OptionSeed>,
}

fn ordered<T>(items: impl IntoIterator<Item = T>, f: impl Fn(T, u32) -> OptionSeed) -> Vec<OptionSeed> {
  items.into_iter().zip(1..).map(|(item, order)| f(item, order)).collect()
}

fn question_seeds(bank: &AssessmentData) -> Vec<QuestionSeed> {
  let mut seeds = Vec::with_capacity(
    1 + bank.maturity_questions.len() + bank.market_research_questions.len(),
  );

  let screening = &bank.screening;
  let proceed_by_value: BTreeMap<String, bool> =
    screening.options.iter().map(|o| (o.value.clone(), o.proceed)).collect();
  seeds.push(QuestionSeed {
    key:           screening.id.clone(),
    section:       Section::Screening,
    question_type: QuestionType::SingleSelect,
    capability_id: None,
    prompt:        screening.prompt.clone(),
    settings:      QuestionSettings::Screening {
      proceed_by_value,
      fallback_result: Some(screening.fallback_result.clone()),
    },
    options:       ordered(&screening.options, |o, order| OptionSeed {
      key: o.value.clone(),
      label: o.label.clone(),
      level: None,
      order,
    }),
  });

  for question in &bank.maturity_questions {
    seeds.push(QuestionSeed {
      key:           question.id.clone(),
      section:       Section::Maturity,
      question_type: QuestionType::SingleSelect,
      capability_id: Some(question.capability.clone()),
      prompt:        question.prompt.clone(),
      settings:      QuestionSettings::Maturity,
      options:       ordered(&question.answers, |a, order| OptionSeed {
        key: format!("L{}", a.level),
        label: a.text.clone(),
        level: Some(a.level),
        order,
      }),
    });
  }

  for question in &bank.market_research_questions {
    seeds.push(QuestionSeed {
      key:           question.id.clone(),
      section:       Section::MarketResearch,
      question_type: question.question_type,
      capability_id: None,
      prompt:        question.prompt.clone(),
      settings:      QuestionSettings::for_market_research(question),
      options:       ordered(question.options.iter().flatten(), |label, order| OptionSeed {
        key: format!("opt-{order}"),
        label: label.clone(),
        level: None,
        order,
      }),
    });
  }

  seeds
}

/// Upsert the question row and replace its current options. Returns the
/// question id.
fn upsert_question(conn: &Connection, seed: &QuestionSeed, now: &str) -> Result<Uuid> {
  let metadata = seed.settings.to_metadata().to_string();
  let question_id: String = conn.query_row(
    "INSERT INTO question (
       question_id, question_key, question_group, question_type, capability_id,
       prompt, allow_other, is_required, metadata, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
     ON CONFLICT (question_key) DO UPDATE SET
       question_group = excluded.question_group,
       question_type  = excluded.question_type,
       capability_id  = excluded.capability_id,
       prompt         = excluded.prompt,
       allow_other    = excluded.allow_other,
       is_required    = excluded.is_required,
       metadata       = excluded.metadata,
       updated_at     = excluded.updated_at
     RETURNING question_id",
    params![
      encode_uuid(Uuid::new_v4()),
      seed.key,
      encode_section(seed.section),
      encode_question_type(seed.question_type),
      seed.capability_id,
      seed.prompt,
      seed.settings.allow_other(),
      seed.settings.is_required(),
      metadata,
      now,
    ],
    |row| row.get(0),
  )?;

  // Every current option is retired; the ones still in the bank are revived
  // below. A question left with no options keeps none.
  conn.execute(
    "UPDATE question_option SET retired_at = ?2, updated_at = ?2
     WHERE question_id = ?1 AND retired_at IS NULL",
    params![question_id, now],
  )?;
  if seed.options.is_empty() {
    return decode_uuid(&question_id);
  }

  let mut upsert = conn.prepare_cached(
    "INSERT INTO question_option (
       option_id, question_id, option_key, option_label, maturity_level,
       option_order, is_other, retired_at, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL, ?7, ?7)
     ON CONFLICT (question_id, option_key) DO UPDATE SET
       option_label   = excluded.option_label,
       maturity_level = excluded.maturity_level,
       option_order   = excluded.option_order,
       is_other       = excluded.is_other,
       retired_at     = NULL,
       updated_at     = excluded.updated_at",
  )?;
  for option in &seed.options {
    upsert.execute(params![
      encode_uuid(Uuid::new_v4()),
      question_id,
      option.key,
      option.label,
      option.level,
      option.order,
      now,
    ])?;
  }

  decode_uuid(&question_id)
}

/// Write a complete survey version from `bank`. Runs inside the caller's
/// transaction.
pub fn write_survey(
  conn: &Connection,
  bank: &AssessmentData,
  source: &str,
  name: &str,
  checksum: &str,
  now: DateTime<Utc>,
) -> Result<ImportSummary> {
  let now_str = encode_dt(now);
  let seeds = question_seeds(bank);

  let mut question_ids = HashMap::with_capacity(seeds.len());
  for seed in &seeds {
    question_ids.insert(seed.key.as_str(), upsert_question(conn, seed, &now_str)?);
  }

  let version_number: u32 = conn.query_row(
    "SELECT COALESCE(MAX(version_number), 0) + 1 FROM survey",
    [],
    |row| row.get(0),
  )?;

  conn.execute("UPDATE survey SET status = 'archived' WHERE status = 'active'", [])?;

  let survey_id = Uuid::new_v4();
  let metadata = serde_json::to_string(&SurveyMetadata::from_assessment(bank))?;
  conn.execute(
    "INSERT INTO survey (
       survey_id, version_number, name, status, source, source_checksum,
       metadata, created_at, activated_at
     ) VALUES (?1, ?2, ?3, 'active', ?4, ?5, ?6, ?7, ?7)",
    params![encode_uuid(survey_id), version_number, name, source, checksum, metadata, now_str],
  )?;

  let mut next_order: HashMap<Section, u32> = HashMap::new();
  let mut insert_map = conn.prepare_cached(
    "INSERT INTO survey_question_map (
       map_id, survey_id, question_id, section, question_order, is_scored, is_enabled
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)",
  )?;
  for seed in &seeds {
    let order = next_order.entry(seed.section).or_insert(0);
    *order += 1;
    insert_map.execute(params![
      encode_uuid(Uuid::new_v4()),
      encode_uuid(survey_id),
      encode_uuid(question_ids[seed.key.as_str()]),
      encode_section(seed.section),
      *order,
      seed.section == Section::Maturity,
    ])?;
  }

  Ok(ImportSummary { survey_id, version_number, source_checksum: checksum.to_owned() })
}
