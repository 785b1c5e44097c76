//! Submissions, their answers and derived scores.

use std::{
  collections::BTreeMap,
  fmt,
  str::FromStr,
  sync::LazyLock,
};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{
  Error, Result,
  scoring::{AssessmentResult, MaturityAnswers},
  survey::{Section, SurveyQuestion},
};

static EMAIL_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

static MARKET_RESEARCH_KEY: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^M\d+$").expect("market research key pattern is valid"));

// ─── Input validation ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreeningAnswer {
  Yes,
  No,
}

impl ScreeningAnswer {
  /// Accepts exactly `"yes"` or `"no"`.
  pub fn parse(value: &str) -> Result<Self> {
    match value {
      "yes" => Ok(Self::Yes),
      "no" => Ok(Self::No),
      other => Err(Error::InvalidScreeningAnswer(other.to_owned())),
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Yes => "yes",
      Self::No => "no",
    }
  }
}

/// Trim and validate an email address, returning the trimmed form.
pub fn validate_email(raw: &str) -> Result<String> {
  let email = raw.trim();
  if EMAIL_PATTERN.is_match(email) {
    Ok(email.to_owned())
  } else {
    Err(Error::InvalidEmail)
  }
}

pub fn is_market_research_key(key: &str) -> bool { MARKET_RESEARCH_KEY.is_match(key) }

// ─── Answers ─────────────────────────────────────────────────────────────────

/// The stored discriminant of a submission answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
  SelectedOption,
  OtherText,
  OpenText,
  Screening,
}

impl AnswerKind {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::SelectedOption => "selected_option",
      Self::OtherText => "other_text",
      Self::OpenText => "open_text",
      Self::Screening => "screening",
    }
  }
}

impl fmt::Display for AnswerKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for AnswerKind {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "selected_option" => Ok(Self::SelectedOption),
      "other_text" => Ok(Self::OtherText),
      "open_text" => Ok(Self::OpenText),
      "screening" => Ok(Self::Screening),
      other => Err(Error::UnknownDiscriminant { kind: "answer kind", value: other.to_owned() }),
    }
  }
}

/// What a single answer row records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerValue {
  /// A chosen option. `option_id` is `None` when the value did not resolve
  /// to a current option; `text` then carries the raw value.
  Selection {
    option_id: Option<Uuid>,
    text:      Option<String>,
    level:     Option<f64>,
  },
  OtherText(String),
  OpenText(String),
  Screening {
    option_id: Option<Uuid>,
    value:     ScreeningAnswer,
  },
}

impl AnswerValue {
  pub fn kind(&self) -> AnswerKind {
    match self {
      Self::Selection { .. } => AnswerKind::SelectedOption,
      Self::OtherText(_) => AnswerKind::OtherText,
      Self::OpenText(_) => AnswerKind::OpenText,
      Self::Screening { .. } => AnswerKind::Screening,
    }
  }

  pub fn option_id(&self) -> Option<Uuid> {
    match self {
      Self::Selection { option_id, .. } | Self::Screening { option_id, .. } => *option_id,
      _ => None,
    }
  }

  pub fn text(&self) -> Option<&str> {
    match self {
      Self::Selection { text, .. } => text.as_deref(),
      Self::OtherText(text) | Self::OpenText(text) => Some(text),
      Self::Screening { value, .. } => Some(value.as_str()),
    }
  }

  pub fn numeric(&self) -> Option<f64> {
    match self {
      Self::Selection { level, .. } => *level,
      _ => None,
    }
  }
}

/// An answer row ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAnswer {
  pub question_id: Uuid,
  pub map_id:      Uuid,
  pub index:       u32,
  pub value:       AnswerValue,
}

impl NewAnswer {
  /// The maturity answer for `question` at `level`; the option is resolved by
  /// level and left empty when none matches.
  pub fn maturity(question: &SurveyQuestion, level: f64) -> Self {
    let option = question.find_option_by_maturity_level(level);
    Self {
      question_id: question.question_id,
      map_id:      question.map_id,
      index:       0,
      value:       AnswerValue::Selection {
        option_id: option.map(|o| o.option_id),
        text:      option.map(|o| o.label.clone()),
        level:     Some(level),
      },
    }
  }
}

/// A respondent's answer to one market-research question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketResearchResponse {
  #[serde(default)]
  pub selected: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub other:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub text:     Option<String>,
}

fn non_blank(value: Option<&Value>) -> Option<&str> {
  value.and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

impl MarketResearchResponse {
  /// Tolerant decode of a `{selected, other, text}` object.
  ///
  /// `selected` may be a list (blank entries dropped, others kept verbatim)
  /// or a single string (trimmed). `other` and `text` are trimmed; blank
  /// values are absent. Anything that is not an object yields an empty
  /// response.
  pub fn from_value(value: &Value) -> Self {
    let selected = match value.get("selected") {
      Some(Value::Array(items)) => items
        .iter()
        .filter_map(|item| non_blank(Some(item)))
        .map(str::to_owned)
        .collect(),
      Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_owned()],
      _ => Vec::new(),
    };
    Self {
      selected,
      other: non_blank(value.get("other")).map(|s| s.trim().to_owned()),
      text: non_blank(value.get("text")).map(|s| s.trim().to_owned()),
    }
  }

  /// Answer rows for this response.
  ///
  /// Selections take indices `0..k`; other text follows at `k`; open text
  /// follows at `k`, or `k + 1` when other text is present.
  pub fn answers(&self, question: &SurveyQuestion) -> Vec<NewAnswer> {
    let row = |index: usize, value: AnswerValue| NewAnswer {
      question_id: question.question_id,
      map_id: question.map_id,
      index: u32::try_from(index).unwrap_or(u32::MAX),
      value,
    };

    let mut rows: Vec<NewAnswer> = self
      .selected
      .iter()
      .enumerate()
      .map(|(index, value)| {
        let option = question.find_option_by_value(value);
        row(index, AnswerValue::Selection {
          option_id: option.map(|o| o.option_id),
          text:      Some(option.map_or_else(|| value.clone(), |o| o.label.clone())),
          level:     None,
        })
      })
      .collect();

    let mut next = self.selected.len();
    if let Some(other) = self.other.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
      rows.push(row(next, AnswerValue::OtherText(other.to_owned())));
      next += 1;
    }
    if let Some(text) = self.text.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
      rows.push(row(next, AnswerValue::OpenText(text.to_owned())));
    }
    rows
  }
}

/// Keep the market-research keys of a raw `marketResearch` object.
///
/// Keys that do not look like `M<n>` are dropped.
pub fn parse_market_research(value: &Value) -> BTreeMap<String, MarketResearchResponse> {
  value
    .as_object()
    .map(|map| {
      map
        .iter()
        .filter(|(key, _)| is_market_research_key(key))
        .map(|(key, response)| (key.clone(), MarketResearchResponse::from_value(response)))
        .collect()
    })
    .unwrap_or_default()
}

// ─── Scores ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreScope {
  Overall,
  Capability,
  Question,
}

impl ScoreScope {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Overall => "overall",
      Self::Capability => "capability",
      Self::Question => "question",
    }
  }
}

impl FromStr for ScoreScope {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "overall" => Ok(Self::Overall),
      "capability" => Ok(Self::Capability),
      "question" => Ok(Self::Question),
      other => Err(Error::UnknownDiscriminant { kind: "score scope", value: other.to_owned() }),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionScore {
  pub scope:     ScoreScope,
  pub scope_key: String,
  pub value:     f64,
}

// ─── Records ─────────────────────────────────────────────────────────────────

/// Input for the first stage of a submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewSubmission {
  /// Raw screening answer; validated to `yes` or `no` before any write.
  pub screening_answer: String,
  pub answers:          MaturityAnswers,
  /// Reused when present, generated otherwise.
  pub session_id:       Option<String>,
  pub user_agent:       Option<String>,
  pub referrer:         Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionCreated {
  pub submission_id: Uuid,
  pub survey_id:     Uuid,
  pub session_id:    String,
  pub result:        AssessmentResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
  pub submission_id:    Uuid,
  pub survey_id:        Uuid,
  pub session_id:       Option<String>,
  pub user_agent:       Option<String>,
  pub referrer:         Option<String>,
  pub respondent_email: Option<String>,
  pub created_at:       DateTime<Utc>,
}

/// A stored answer joined with the option it references, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionAnswer {
  pub question_id:    Uuid,
  pub kind:           AnswerKind,
  pub index:          u32,
  pub option_id:      Option<Uuid>,
  pub option_key:     Option<String>,
  pub option_label:   Option<String>,
  pub maturity_level: Option<u8>,
  pub text:           Option<String>,
  pub numeric:        Option<f64>,
}

impl SubmissionAnswer {
  /// How the answer reads in a summary: the option label (with its level in
  /// the maturity section), else the answer text, else the option key.
  pub fn display_label(&self, section: Section) -> String {
    if let Some(label) = &self.option_label {
      return match (section, self.maturity_level) {
        (Section::Maturity, Some(level)) => format!("L{level}: {label}"),
        _ => label.clone(),
      };
    }
    if let Some(text) = self.text.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
      return text.to_owned();
    }
    self.option_key.clone().unwrap_or_else(|| "(unknown option)".to_owned())
  }
}

/// A submission with everything recorded against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
  pub submission: Submission,
  pub answers:    Vec<SubmissionAnswer>,
  pub scores:     Vec<SubmissionScore>,
}

impl SubmissionRecord {
  pub fn answers_for(&self, question_id: Uuid) -> impl Iterator<Item = &SubmissionAnswer> {
    self.answers.iter().filter(move |a| a.question_id == question_id)
  }

  pub fn score(&self, scope: ScoreScope, key: &str) -> Option<f64> {
    self
      .scores
      .iter()
      .find(|s| s.scope == scope && s.scope_key == key)
      .map(|s| s.value)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;
  use crate::survey::{QuestionSettings, QuestionType, ResearchAttributes, SurveyOption};

  fn research_question() -> SurveyQuestion {
    let option = |key: &str, label: &str, order| SurveyOption {
      option_id: Uuid::new_v4(),
      option_key: Some(key.to_owned()),
      label: label.to_owned(),
      maturity_level: None,
      order,
      is_other: false,
    };
    SurveyQuestion {
      map_id:        Uuid::new_v4(),
      survey_id:     Uuid::new_v4(),
      section:       Section::MarketResearch,
      order:         1,
      is_scored:     false,
      is_enabled:    true,
      question_id:   Uuid::new_v4(),
      key:           "M1".into(),
      question_type: QuestionType::MultiSelect,
      capability_id: None,
      prompt:        "Which tools?".into(),
      settings:      QuestionSettings::MultiSelect {
        max_selections: Some(3),
        allow_other:    true,
        attributes:     ResearchAttributes::default(),
      },
      options:       vec![option("opt-1", "A", 1), option("opt-2", "B", 2)],
    }
  }

  #[test]
  fn screening_answer_is_exact() {
    assert_eq!(ScreeningAnswer::parse("yes").unwrap(), ScreeningAnswer::Yes);
    assert_eq!(ScreeningAnswer::parse("no").unwrap(), ScreeningAnswer::No);
    for bad in ["maybe", "Yes", " yes", ""] {
      assert!(matches!(ScreeningAnswer::parse(bad), Err(Error::InvalidScreeningAnswer(_))));
    }
  }

  #[test]
  fn email_is_trimmed_and_validated() {
    assert_eq!(validate_email("  a@b.co ").unwrap(), "a@b.co");
    for bad in ["", "a@b", "a b@c.d", "@b.co", "a@@b.co"] {
      assert!(matches!(validate_email(bad), Err(Error::InvalidEmail)), "{bad}");
    }
  }

  #[test]
  fn market_research_keys() {
    assert!(is_market_research_key("M1"));
    assert!(is_market_research_key("M12"));
    assert!(!is_market_research_key("Q1"));
    assert!(!is_market_research_key("M"));
    assert!(!is_market_research_key("M1a"));
  }

  #[test]
  fn answer_kind_parses_stored_strings() {
    for kind in [
      AnswerKind::SelectedOption,
      AnswerKind::OtherText,
      AnswerKind::OpenText,
      AnswerKind::Screening,
    ] {
      assert_eq!(kind.as_str().parse::<AnswerKind>().unwrap(), kind);
    }
    assert!("bogus".parse::<AnswerKind>().is_err());
  }

  #[test]
  fn response_decode_is_tolerant() {
    let response = MarketResearchResponse::from_value(&json!({
      "selected": [" A ", "", 3, "B"],
      "other": "  C  ",
      "text": "   ",
    }));
    assert_eq!(response.selected, [" A ", "B"]);
    assert_eq!(response.other.as_deref(), Some("C"));
    assert_eq!(response.text, None);

    let single = MarketResearchResponse::from_value(&json!({ "selected": "  B " }));
    assert_eq!(single.selected, ["B"]);

    assert_eq!(MarketResearchResponse::from_value(&json!("A")), MarketResearchResponse::default());
  }

  #[test]
  fn answers_follow_index_rule() {
    let question = research_question();
    let response = MarketResearchResponse {
      selected: vec!["A".into(), "B".into()],
      other:    Some("C".into()),
      text:     Some("D".into()),
    };
    let rows = response.answers(&question);
    let shape: Vec<(u32, AnswerKind, Option<&str>)> =
      rows.iter().map(|r| (r.index, r.value.kind(), r.value.text())).collect();
    assert_eq!(shape, [
      (0, AnswerKind::SelectedOption, Some("A")),
      (1, AnswerKind::SelectedOption, Some("B")),
      (2, AnswerKind::OtherText, Some("C")),
      (3, AnswerKind::OpenText, Some("D")),
    ]);

    let text_only = MarketResearchResponse { text: Some("D".into()), ..Default::default() };
    let rows = text_only.answers(&question);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].index, 0);
  }

  #[test]
  fn unknown_selection_keeps_raw_text_without_option() {
    let question = research_question();
    let response = MarketResearchResponse { selected: vec!["Zed".into(), "opt-2".into()], ..Default::default() };
    let rows = response.answers(&question);
    assert_eq!(rows[0].value.option_id(), None);
    assert_eq!(rows[0].value.text(), Some("Zed"));
    assert_eq!(rows[1].value.option_id(), Some(question.options[1].option_id));
    assert_eq!(rows[1].value.text(), Some("B"));
  }

  #[test]
  fn parse_market_research_drops_foreign_keys() {
    let parsed = parse_market_research(&json!({
      "M1": { "selected": ["A"] },
      "Q1": { "selected": ["A"] },
      "M2": null,
    }));
    assert_eq!(parsed.keys().map(String::as_str).collect::<Vec<_>>(), ["M1", "M2"]);
    assert_eq!(parsed["M2"], MarketResearchResponse::default());
  }

  #[test]
  fn display_label_prefers_option_label() {
    let answer = SubmissionAnswer {
      question_id:    Uuid::nil(),
      kind:           AnswerKind::SelectedOption,
      index:          0,
      option_id:      None,
      option_key:     Some("L3".into()),
      option_label:   Some("Often".into()),
      maturity_level: Some(3),
      text:           None,
      numeric:        Some(3.0),
    };
    assert_eq!(answer.display_label(Section::Maturity), "L3: Often");
    assert_eq!(answer.display_label(Section::MarketResearch), "Often");

    let raw = SubmissionAnswer { option_label: None, text: Some(" raw ".into()), ..answer.clone() };
    assert_eq!(raw.display_label(Section::Maturity), "raw");

    let bare = SubmissionAnswer { option_label: None, text: None, option_key: None, ..answer };
    assert_eq!(bare.display_label(Section::Maturity), "(unknown option)");
  }
}
