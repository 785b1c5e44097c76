//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings and UUIDs as hyphenated
//! lowercase strings. Metadata blobs are compact JSON; they are decoded
//! leniently into typed settings when rows are read.

use chrono::{DateTime, Utc};
use maturity_core::{
  submission::{
    AnswerKind, ScoreScope, Submission, SubmissionAnswer, SubmissionScore,
  },
  survey::{
    QuestionSettings, QuestionType, Section, SurveyHeader, SurveyMetadata, SurveyOption,
    SurveyQuestion, SurveyStatus,
  },
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enumerations ────────────────────────────────────────────────────────────

fn unknown(kind: &'static str, value: &str) -> Error {
  maturity_core::Error::UnknownDiscriminant { kind, value: value.to_owned() }.into()
}

pub fn encode_section(s: Section) -> &'static str { s.as_str() }

pub fn decode_section(s: &str) -> Result<Section> {
  match s {
    "screening" => Ok(Section::Screening),
    "maturity" => Ok(Section::Maturity),
    "market-research" => Ok(Section::MarketResearch),
    other => Err(unknown("section", other)),
  }
}

pub fn encode_question_type(t: QuestionType) -> &'static str { t.as_str() }

pub fn decode_question_type(s: &str) -> Result<QuestionType> {
  match s {
    "single-select" => Ok(QuestionType::SingleSelect),
    "multi-select" => Ok(QuestionType::MultiSelect),
    "open-text" => Ok(QuestionType::OpenText),
    other => Err(unknown("question type", other)),
  }
}

pub fn encode_status(s: SurveyStatus) -> &'static str {
  match s {
    SurveyStatus::Draft => "draft",
    SurveyStatus::Active => "active",
    SurveyStatus::Archived => "archived",
  }
}

pub fn decode_status(s: &str) -> Result<SurveyStatus> {
  match s {
    "draft" => Ok(SurveyStatus::Draft),
    "active" => Ok(SurveyStatus::Active),
    "archived" => Ok(SurveyStatus::Archived),
    other => Err(unknown("survey status", other)),
  }
}

pub fn decode_answer_kind(s: &str) -> Result<AnswerKind> { Ok(s.parse()?) }

pub fn decode_score_scope(s: &str) -> Result<ScoreScope> { Ok(s.parse()?) }

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read from a `survey` row.
pub struct RawSurvey {
  pub survey_id:       String,
  pub version_number:  i64,
  pub name:            String,
  pub status:          String,
  pub source:          String,
  pub source_checksum: String,
  pub metadata:        String,
  pub created_at:      String,
  pub activated_at:    Option<String>,
}

impl RawSurvey {
  pub const COLUMNS: &'static str = "survey_id, version_number, name, status, source, source_checksum, \
                             metadata, created_at, activated_at";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      survey_id:       row.get(0)?,
      version_number:  row.get(1)?,
      name:            row.get(2)?,
      status:          row.get(3)?,
      source:          row.get(4)?,
      source_checksum: row.get(5)?,
      metadata:        row.get(6)?,
      created_at:      row.get(7)?,
      activated_at:    row.get(8)?,
    })
  }

  pub fn into_header(self) -> Result<SurveyHeader> {
    Ok(SurveyHeader {
      survey_id:       decode_uuid(&self.survey_id)?,
      version_number:  u32::try_from(self.version_number).unwrap_or_default(),
      name:            self.name,
      status:          decode_status(&self.status)?,
      source:          self.source,
      source_checksum: self.source_checksum,
      created_at:      decode_dt(&self.created_at)?,
      activated_at:    self.activated_at.as_deref().map(decode_dt).transpose()?,
      metadata:        SurveyMetadata::decode(&self.metadata),
    })
  }
}

/// Raw values from `survey_question_map` joined with `question`.
pub struct RawMappedQuestion {
  pub map_id:         String,
  pub survey_id:      String,
  pub section:        String,
  pub question_order: i64,
  pub is_scored:      bool,
  pub is_enabled:     bool,
  pub question_id:    String,
  pub question_key:   String,
  pub question_type:  String,
  pub capability_id:  Option<String>,
  pub prompt:         String,
  pub allow_other:    bool,
  pub is_required:    bool,
  pub metadata:       String,
}

impl RawMappedQuestion {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      map_id:         row.get(0)?,
      survey_id:      row.get(1)?,
      section:        row.get(2)?,
      question_order: row.get(3)?,
      is_scored:      row.get(4)?,
      is_enabled:     row.get(5)?,
      question_id:    row.get(6)?,
      question_key:   row.get(7)?,
      question_type:  row.get(8)?,
      capability_id:  row.get(9)?,
      prompt:         row.get(10)?,
      allow_other:    row.get(11)?,
      is_required:    row.get(12)?,
      metadata:       row.get(13)?,
    })
  }

  pub fn into_question(self, options: Vec<SurveyOption>) -> Result<SurveyQuestion> {
    let section = decode_section(&self.section)?;
    let question_type = decode_question_type(&self.question_type)?;
    // A malformed blob reads as empty; defaults apply.
    let metadata: serde_json::Value =
      serde_json::from_str(&self.metadata).unwrap_or(serde_json::Value::Null);
    let settings = QuestionSettings::decode(
      section,
      question_type,
      self.allow_other,
      self.is_required,
      &metadata,
    );

    Ok(SurveyQuestion {
      map_id: decode_uuid(&self.map_id)?,
      survey_id: decode_uuid(&self.survey_id)?,
      section,
      order: u32::try_from(self.question_order).unwrap_or_default(),
      is_scored: self.is_scored,
      is_enabled: self.is_enabled,
      question_id: decode_uuid(&self.question_id)?,
      key: self.question_key,
      question_type,
      capability_id: self.capability_id,
      prompt: self.prompt,
      settings,
      options,
    })
  }
}

/// Raw values read from a `question_option` row.
pub struct RawOption {
  pub question_id:    String,
  pub option_id:      String,
  pub option_key:     Option<String>,
  pub option_label:   String,
  pub maturity_level: Option<i64>,
  pub option_order:   i64,
  pub is_other:       bool,
}

impl RawOption {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      question_id:    row.get(0)?,
      option_id:      row.get(1)?,
      option_key:     row.get(2)?,
      option_label:   row.get(3)?,
      maturity_level: row.get(4)?,
      option_order:   row.get(5)?,
      is_other:       row.get(6)?,
    })
  }

  pub fn into_option(self) -> Result<(Uuid, SurveyOption)> {
    let option = SurveyOption {
      option_id:      decode_uuid(&self.option_id)?,
      option_key:     self.option_key,
      label:          self.option_label,
      maturity_level: self.maturity_level.and_then(|l| u8::try_from(l).ok()),
      order:          u32::try_from(self.option_order).unwrap_or_default(),
      is_other:       self.is_other,
    };
    Ok((decode_uuid(&self.question_id)?, option))
  }
}

/// Raw values read from a `survey_submission` row.
pub struct RawSubmission {
  pub submission_id:    String,
  pub survey_id:        String,
  pub session_id:       Option<String>,
  pub user_agent:       Option<String>,
  pub referrer:         Option<String>,
  pub respondent_email: Option<String>,
  pub created_at:       String,
}

impl RawSubmission {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      submission_id:    row.get(0)?,
      survey_id:        row.get(1)?,
      session_id:       row.get(2)?,
      user_agent:       row.get(3)?,
      referrer:         row.get(4)?,
      respondent_email: row.get(5)?,
      created_at:       row.get(6)?,
    })
  }

  pub fn into_submission(self) -> Result<Submission> {
    Ok(Submission {
      submission_id:    decode_uuid(&self.submission_id)?,
      survey_id:        decode_uuid(&self.survey_id)?,
      session_id:       self.session_id,
      user_agent:       self.user_agent,
      referrer:         self.referrer,
      respondent_email: self.respondent_email,
      created_at:       decode_dt(&self.created_at)?,
    })
  }
}

/// Raw values from `survey_submission_answer` left-joined with its option.
pub struct RawAnswer {
  pub question_id:    String,
  pub answer_kind:    String,
  pub answer_index:   i64,
  pub option_id:      Option<String>,
  pub option_key:     Option<String>,
  pub option_label:   Option<String>,
  pub maturity_level: Option<i64>,
  pub answer_text:    Option<String>,
  pub answer_numeric: Option<f64>,
}

impl RawAnswer {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      question_id:    row.get(0)?,
      answer_kind:    row.get(1)?,
      answer_index:   row.get(2)?,
      option_id:      row.get(3)?,
      option_key:     row.get(4)?,
      option_label:   row.get(5)?,
      maturity_level: row.get(6)?,
      answer_text:    row.get(7)?,
      answer_numeric: row.get(8)?,
    })
  }

  pub fn into_answer(self) -> Result<SubmissionAnswer> {
    Ok(SubmissionAnswer {
      question_id:    decode_uuid(&self.question_id)?,
      kind:           decode_answer_kind(&self.answer_kind)?,
      index:          u32::try_from(self.answer_index).unwrap_or_default(),
      option_id:      self.option_id.as_deref().map(decode_uuid).transpose()?,
      option_key:     self.option_key,
      option_label:   self.option_label,
      maturity_level: self.maturity_level.and_then(|l| u8::try_from(l).ok()),
      text:           self.answer_text,
      numeric:        self.answer_numeric,
    })
  }
}

/// Raw values read from a `survey_submission_score` row.
pub struct RawScore {
  pub score_scope: String,
  pub scope_key:   String,
  pub score_value: f64,
}

impl RawScore {
  pub fn into_score(self) -> Result<SubmissionScore> {
    Ok(SubmissionScore {
      scope:     decode_score_scope(&self.score_scope)?,
      scope_key: self.scope_key,
      value:     self.score_value,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn enumerations_decode_their_encodings() {
    for section in Section::ALL {
      assert_eq!(decode_section(encode_section(section)).unwrap(), section);
    }
    for t in [QuestionType::SingleSelect, QuestionType::MultiSelect, QuestionType::OpenText] {
      assert_eq!(decode_question_type(encode_question_type(t)).unwrap(), t);
    }
    for s in [SurveyStatus::Draft, SurveyStatus::Active, SurveyStatus::Archived] {
      assert_eq!(decode_status(encode_status(s)).unwrap(), s);
    }
  }

  #[test]
  fn unknown_discriminants_are_core_errors() {
    let err = decode_section("bonus").unwrap_err();
    assert!(matches!(
      err,
      Error::Core(maturity_core::Error::UnknownDiscriminant { kind: "section", .. })
    ));
    assert!(decode_answer_kind("vote").is_err());
    assert!(decode_score_scope("team").is_err());
  }

  #[test]
  fn timestamps_keep_their_instant() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }
}
