//! Survey versions and their normalized question/option structure.
//!
//! A [`SurveyDefinition`] is one immutable numbered snapshot, loaded from the
//! normalized tables together with its ordered questions and current options.
//! The denormalized [`AssessmentData`] view is rebuilt from those rows when the
//! definition is assembled.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::assessment::{
  AssessmentData, AssessmentMetadata, Archetype, Capability, FallbackResult,
  MarketResearchQuestion, MaturityAnswer, MaturityQuestion, Screening, ScreeningOption,
  default_category,
};

// ─── Enumerations ────────────────────────────────────────────────────────────

/// The section of a survey a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
  Screening,
  Maturity,
  MarketResearch,
}

impl Section {
  pub const ALL: [Section; 3] = [Self::Screening, Self::Maturity, Self::MarketResearch];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Screening => "screening",
      Self::Maturity => "maturity",
      Self::MarketResearch => "market-research",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionType {
  SingleSelect,
  MultiSelect,
  OpenText,
}

impl QuestionType {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::SingleSelect => "single-select",
      Self::MultiSelect => "multi-select",
      Self::OpenText => "open-text",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
  Draft,
  Active,
  Archived,
}

// ─── Per-question settings ───────────────────────────────────────────────────

/// Attributes shared by every market-research question type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchAttributes {
  pub required:      bool,
  pub enriches_card: bool,
  pub card_display:  Option<String>,
  pub category:      String,
}

impl Default for ResearchAttributes {
  fn default() -> Self {
    Self {
      required:      false,
      enriches_card: false,
      card_display:  None,
      category:      default_category(),
    }
  }
}

/// Type-specific settings of a question, decoded once from the stored
/// metadata blob. Fields absent or mistyped in storage resolve to defaults at
/// decode time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuestionSettings {
  Screening {
    /// Option value → whether the respondent continues.
    proceed_by_value: BTreeMap<String, bool>,
    fallback_result:  Option<FallbackResult>,
  },
  Maturity,
  SingleSelect {
    allow_other: bool,
    attributes:  ResearchAttributes,
  },
  MultiSelect {
    max_selections: Option<u32>,
    allow_other:    bool,
    attributes:     ResearchAttributes,
  },
  OpenText {
    placeholder: Option<String>,
    max_length:  Option<u32>,
    attributes:  ResearchAttributes,
  },
}

impl QuestionSettings {
  /// Settings for a market-research question from the question bank.
  pub fn for_market_research(question: &MarketResearchQuestion) -> Self {
    let attributes = ResearchAttributes {
      required:      question.required.unwrap_or(false),
      enriches_card: question.enriches_card.unwrap_or(false),
      card_display:  question.card_display.clone(),
      category:      question.category.clone(),
    };
    let allow_other = question.allow_other.unwrap_or(false);
    match question.question_type {
      QuestionType::SingleSelect => Self::SingleSelect { allow_other, attributes },
      QuestionType::MultiSelect => Self::MultiSelect {
        max_selections: question.max_selections,
        allow_other,
        attributes,
      },
      QuestionType::OpenText => Self::OpenText {
        placeholder: question.placeholder.clone(),
        max_length: question.max_length,
        attributes,
      },
    }
  }

  pub fn allow_other(&self) -> bool {
    match self {
      Self::SingleSelect { allow_other, .. } | Self::MultiSelect { allow_other, .. } => *allow_other,
      _ => false,
    }
  }

  pub fn is_required(&self) -> bool {
    match self {
      Self::Screening { .. } | Self::Maturity => true,
      Self::SingleSelect { attributes, .. }
      | Self::MultiSelect { attributes, .. }
      | Self::OpenText { attributes, .. } => attributes.required,
    }
  }

  pub fn attributes(&self) -> Option<&ResearchAttributes> {
    match self {
      Self::SingleSelect { attributes, .. }
      | Self::MultiSelect { attributes, .. }
      | Self::OpenText { attributes, .. } => Some(attributes),
      _ => None,
    }
  }

  /// Flat camelCase JSON written to the `question.metadata` column.
  pub fn to_metadata(&self) -> Value {
    match self {
      Self::Screening { proceed_by_value, fallback_result } => json!({
        "proceedByValue": proceed_by_value,
        "fallbackResult": fallback_result,
      }),
      Self::Maturity => json!({}),
      Self::SingleSelect { allow_other, attributes } => {
        research_metadata(attributes, *allow_other, None, None, None)
      }
      Self::MultiSelect { max_selections, allow_other, attributes } => {
        research_metadata(attributes, *allow_other, *max_selections, None, None)
      }
      Self::OpenText { placeholder, max_length, attributes } => {
        research_metadata(attributes, false, None, placeholder.as_deref(), *max_length)
      }
    }
  }

  /// Decode stored metadata into typed settings.
  ///
  /// `allow_other` and `is_required` are the dedicated column values; they
  /// are used when the blob does not carry its own flag.
  pub fn decode(
    section: Section,
    question_type: QuestionType,
    allow_other: bool,
    is_required: bool,
    metadata: &Value,
  ) -> Self {
    let flag = |key: &str, fallback: bool| metadata.get(key).and_then(Value::as_bool).unwrap_or(fallback);
    let positive = |key: &str| {
      metadata
        .get(key)
        .and_then(Value::as_u64)
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())
    };
    let text = |key: &str| {
      metadata
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned)
    };

    match section {
      Section::Screening => {
        let proceed_by_value = metadata
          .get("proceedByValue")
          .and_then(Value::as_object)
          .map(|map| {
            map
              .iter()
              .filter_map(|(k, v)| v.as_bool().map(|b| (k.clone(), b)))
              .collect()
          })
          .unwrap_or_default();
        let fallback_result = metadata
          .get("fallbackResult")
          .cloned()
          .and_then(|v| serde_json::from_value(v).ok());
        Self::Screening { proceed_by_value, fallback_result }
      }
      Section::Maturity => Self::Maturity,
      Section::MarketResearch => {
        let attributes = ResearchAttributes {
          required:      flag("required", is_required),
          enriches_card: flag("enrichesCard", false),
          card_display:  text("cardDisplay"),
          category:      text("category")
            .or_else(|| text("fabriqaCategory"))
            .unwrap_or_else(default_category),
        };
        let allow_other = flag("allowOther", allow_other);
        match question_type {
          QuestionType::SingleSelect => Self::SingleSelect { allow_other, attributes },
          QuestionType::MultiSelect => Self::MultiSelect {
            max_selections: positive("maxSelections"),
            allow_other,
            attributes,
          },
          QuestionType::OpenText => Self::OpenText {
            placeholder: text("placeholder"),
            max_length: positive("maxLength"),
            attributes,
          },
        }
      }
    }
  }
}

fn research_metadata(
  attributes: &ResearchAttributes,
  allow_other: bool,
  max_selections: Option<u32>,
  placeholder: Option<&str>,
  max_length: Option<u32>,
) -> Value {
  json!({
    "maxSelections": max_selections,
    "allowOther": allow_other,
    "required": attributes.required,
    "enrichesCard": attributes.enriches_card,
    "cardDisplay": attributes.card_display,
    "placeholder": placeholder,
    "maxLength": max_length,
    "category": attributes.category,
  })
}

// ─── Survey metadata ─────────────────────────────────────────────────────────

/// The per-version configuration stored in `survey.metadata`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SurveyMetadata {
  pub assessment_version:        Option<String>,
  pub assessment_metadata:       Option<AssessmentMetadata>,
  pub capabilities:              Option<Vec<Capability>>,
  pub archetypes:                Option<Vec<Archetype>>,
  pub screening_fallback_result: Option<FallbackResult>,
}

impl SurveyMetadata {
  pub fn from_assessment(data: &AssessmentData) -> Self {
    Self {
      assessment_version:        Some(data.version.clone()),
      assessment_metadata:       Some(data.metadata.clone()),
      capabilities:              Some(data.capabilities.clone()),
      archetypes:                Some(data.archetypes.clone()),
      screening_fallback_result: Some(data.screening.fallback_result.clone()),
    }
  }

  /// Lenient decode: a blob that is not a valid metadata object is treated as
  /// empty so that bundled defaults apply.
  pub fn decode(raw: &str) -> Self { serde_json::from_str(raw).unwrap_or_default() }
}

// ─── Options and questions ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyOption {
  pub option_id:      Uuid,
  pub option_key:     Option<String>,
  pub label:          String,
  pub maturity_level: Option<u8>,
  pub order:          u32,
  pub is_other:       bool,
}

impl SurveyOption {
  /// The maturity level this option stands for: the stored level, else the
  /// digits of its key (`"L3"` → 3), else 1.
  pub fn level(&self) -> u8 {
    self.maturity_level.unwrap_or_else(|| {
      self
        .option_key
        .as_deref()
        .map(|key| key.chars().filter(char::is_ascii_digit).collect::<String>())
        .and_then(|digits| digits.parse::<u8>().ok())
        .filter(|level| *level != 0)
        .unwrap_or(1)
    })
  }

  /// Label as shown in summaries; maturity options carry their level.
  pub fn display_label(&self) -> String {
    match self.maturity_level {
      Some(level) => format!("L{level}: {}", self.label),
      None => self.label.clone(),
    }
  }
}

/// One question as placed in a specific survey version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyQuestion {
  pub map_id:        Uuid,
  pub survey_id:     Uuid,
  pub section:       Section,
  pub order:         u32,
  pub is_scored:     bool,
  pub is_enabled:    bool,
  pub question_id:   Uuid,
  pub key:           String,
  pub question_type: QuestionType,
  pub capability_id: Option<String>,
  pub prompt:        String,
  pub settings:      QuestionSettings,
  /// Current options in display order.
  pub options:       Vec<SurveyOption>,
}

impl SurveyQuestion {
  /// Match on option key or label, trimmed and case-insensitive.
  pub fn find_option_by_value(&self, value: &str) -> Option<&SurveyOption> {
    let normalized = value.trim().to_lowercase();
    self.options.iter().find(|option| {
      option
        .option_key
        .as_deref()
        .is_some_and(|key| key.to_lowercase() == normalized)
        || option.label.trim().to_lowercase() == normalized
    })
  }

  pub fn find_option_by_maturity_level(&self, level: f64) -> Option<&SurveyOption> {
    self
      .options
      .iter()
      .find(|option| option.maturity_level.is_some_and(|l| f64::from(l) == level))
  }

  /// `"<key>. <prompt>"` followed by one line per option.
  pub fn summarize(&self) -> String {
    let prefix = format!("{}. {}", self.key, self.prompt);
    if self.options.is_empty() {
      return prefix;
    }
    let lines: Vec<String> =
      self.options.iter().map(|o| format!("- {}", o.display_label())).collect();
    format!("{prefix}\n{}", lines.join("\n"))
  }
}

// ─── SurveyDefinition ────────────────────────────────────────────────────────

/// The `survey` row of a version, without its questions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyHeader {
  pub survey_id:       Uuid,
  pub version_number:  u32,
  pub name:            String,
  pub status:          SurveyStatus,
  pub source:          String,
  pub source_checksum: String,
  pub created_at:      DateTime<Utc>,
  pub activated_at:    Option<DateTime<Utc>>,
  pub metadata:        SurveyMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyDefinition {
  pub header:     SurveyHeader,
  /// Enabled questions ordered by section, then by order within the section.
  pub questions:  Vec<SurveyQuestion>,
  pub assessment: AssessmentData,
}

/// Result of a successful survey import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
  pub survey_id:       Uuid,
  pub version_number:  u32,
  pub source_checksum: String,
}

impl SurveyDefinition {
  /// Assemble a definition and rebuild its denormalized view. `fallback`
  /// supplies values for anything the stored metadata lacks.
  pub fn assemble(
    header: SurveyHeader,
    mut questions: Vec<SurveyQuestion>,
    fallback: &AssessmentData,
  ) -> Self {
    questions.sort_by_key(|q| (q.section, q.order));
    for question in &mut questions {
      question.options.sort_by_key(|o| o.order);
    }
    let assessment = build_assessment(&header, &questions, fallback);
    Self { header, questions, assessment }
  }

  pub fn survey_id(&self) -> Uuid { self.header.survey_id }

  pub fn version_number(&self) -> u32 { self.header.version_number }

  pub fn questions_in(&self, section: Section) -> impl Iterator<Item = &SurveyQuestion> {
    self.questions.iter().filter(move |q| q.section == section)
  }

  pub fn find_question_by_key(&self, key: &str, section: Option<Section>) -> Option<&SurveyQuestion> {
    self
      .questions
      .iter()
      .find(|q| q.key == key && section.is_none_or(|s| q.section == s))
  }

  pub fn screening_question(&self) -> Option<&SurveyQuestion> {
    self.find_question_by_key(&self.assessment.screening.id, Some(Section::Screening))
  }
}

fn build_assessment(
  header: &SurveyHeader,
  questions: &[SurveyQuestion],
  fallback: &AssessmentData,
) -> AssessmentData {
  let meta = &header.metadata;

  let screening_question = questions.iter().find(|q| q.section == Section::Screening);
  let (proceed_by_value, stored_fallback) = match screening_question.map(|q| &q.settings) {
    Some(QuestionSettings::Screening { proceed_by_value, fallback_result }) => {
      (proceed_by_value.clone(), fallback_result.clone())
    }
    _ => (BTreeMap::new(), None),
  };

  let screening = match screening_question {
    Some(question) => Screening {
      id:              question.key.clone(),
      prompt:          question.prompt.clone(),
      options:         question
        .options
        .iter()
        .map(|option| {
          let value = option
            .option_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .unwrap_or_else(|| option.label.clone());
          let proceed = proceed_by_value
            .get(&value)
            .copied()
            .unwrap_or_else(|| value.eq_ignore_ascii_case("yes"));
          ScreeningOption { value, label: option.label.clone(), proceed }
        })
        .collect(),
      fallback_result: meta
        .screening_fallback_result
        .clone()
        .or(stored_fallback)
        .unwrap_or_else(|| fallback.screening.fallback_result.clone()),
    },
    None => fallback.screening.clone(),
  };

  let maturity_questions = questions
    .iter()
    .filter(|q| q.section == Section::Maturity)
    .map(|q| MaturityQuestion {
      id:         q.key.clone(),
      capability: q.capability_id.clone().unwrap_or_else(|| "unknown".to_owned()),
      prompt:     q.prompt.clone(),
      answers:    q
        .options
        .iter()
        .map(|o| MaturityAnswer { level: o.level(), text: o.label.clone() })
        .collect(),
    })
    .collect();

  let market_research_questions = questions
    .iter()
    .filter(|q| q.section == Section::MarketResearch)
    .map(market_research_view)
    .collect();

  AssessmentData {
    version: meta
      .assessment_version
      .clone()
      .filter(|v| !v.trim().is_empty())
      .unwrap_or_else(|| format!("survey-v{}", header.version_number)),
    metadata: meta
      .assessment_metadata
      .clone()
      .unwrap_or_else(|| fallback.metadata.clone()),
    screening,
    capabilities: meta
      .capabilities
      .clone()
      .unwrap_or_else(|| fallback.capabilities.clone()),
    archetypes: meta
      .archetypes
      .clone()
      .unwrap_or_else(|| fallback.archetypes.clone()),
    maturity_questions,
    market_research_questions,
  }
}

fn market_research_view(question: &SurveyQuestion) -> MarketResearchQuestion {
  let options: Vec<String> = question.options.iter().map(|o| o.label.clone()).collect();
  let attributes = question.settings.attributes().cloned().unwrap_or_default();
  let (max_selections, placeholder, max_length) = match &question.settings {
    QuestionSettings::MultiSelect { max_selections, .. } => (*max_selections, None, None),
    QuestionSettings::OpenText { placeholder, max_length, .. } => {
      (None, placeholder.clone(), *max_length)
    }
    _ => (None, None, None),
  };

  MarketResearchQuestion {
    id: question.key.clone(),
    question_type: question.question_type,
    prompt: question.prompt.clone(),
    options: (!options.is_empty()).then_some(options),
    max_selections,
    allow_other: question.settings.allow_other().then_some(true),
    required: attributes.required.then_some(true),
    enriches_card: attributes.enriches_card.then_some(true),
    card_display: attributes.card_display,
    placeholder,
    max_length,
    category: attributes.category,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn option(key: Option<&str>, label: &str, level: Option<u8>, order: u32) -> SurveyOption {
    SurveyOption {
      option_id: Uuid::new_v4(),
      option_key: key.map(str::to_owned),
      label: label.to_owned(),
      maturity_level: level,
      order,
      is_other: false,
    }
  }

  fn question(section: Section, key: &str, order: u32, options: Vec<SurveyOption>) -> SurveyQuestion {
    SurveyQuestion {
      map_id: Uuid::new_v4(),
      survey_id: Uuid::nil(),
      section,
      order,
      is_scored: section == Section::Maturity,
      is_enabled: true,
      question_id: Uuid::new_v4(),
      key: key.to_owned(),
      question_type: QuestionType::SingleSelect,
      capability_id: (section == Section::Maturity).then(|| "specs".to_owned()),
      prompt: format!("prompt {key}"),
      settings: match section {
        Section::Screening => QuestionSettings::Screening {
          proceed_by_value: BTreeMap::new(),
          fallback_result:  None,
        },
        Section::Maturity => QuestionSettings::Maturity,
        Section::MarketResearch => QuestionSettings::SingleSelect {
          allow_other: false,
          attributes:  ResearchAttributes::default(),
        },
      },
      options,
    }
  }

  fn header(metadata: SurveyMetadata) -> SurveyHeader {
    SurveyHeader {
      survey_id: Uuid::nil(),
      version_number: 3,
      name: "test".into(),
      status: SurveyStatus::Active,
      source: "test".into(),
      source_checksum: "abc".into(),
      created_at: Utc::now(),
      activated_at: None,
      metadata,
    }
  }

  #[test]
  fn find_option_by_value_matches_key_or_label_case_insensitively() {
    let q = question(Section::MarketResearch, "M1", 1, vec![
      option(Some("opt-1"), "Cursor", None, 1),
      option(Some("opt-2"), "  GitHub Copilot ", None, 2),
    ]);
    assert_eq!(q.find_option_by_value("OPT-1").unwrap().label, "Cursor");
    assert_eq!(q.find_option_by_value(" github copilot").unwrap().order, 2);
    assert!(q.find_option_by_value("Vim").is_none());
  }

  #[test]
  fn find_option_by_maturity_level_returns_none_when_absent() {
    let q = question(Section::Maturity, "Q1", 1, vec![
      option(Some("L1"), "one", Some(1), 1),
      option(Some("L2"), "two", Some(2), 2),
    ]);
    assert_eq!(q.find_option_by_maturity_level(2.0).unwrap().label, "two");
    assert!(q.find_option_by_maturity_level(4.0).is_none());
    assert!(q.find_option_by_maturity_level(1.5).is_none());
  }

  #[test]
  fn option_level_falls_back_to_key_digits() {
    assert_eq!(option(Some("L4"), "x", None, 1).level(), 4);
    assert_eq!(option(Some("L2"), "x", Some(5), 1).level(), 5);
    assert_eq!(option(Some("none"), "x", None, 1).level(), 1);
    assert_eq!(option(None, "x", None, 1).level(), 1);
  }

  #[test]
  fn summarize_includes_maturity_levels() {
    let q = question(Section::Maturity, "Q1", 1, vec![
      option(Some("L1"), "never", Some(1), 1),
      option(Some("L2"), "sometimes", Some(2), 2),
    ]);
    assert_eq!(q.summarize(), "Q1. prompt Q1\n- L1: never\n- L2: sometimes");

    let bare = question(Section::MarketResearch, "M5", 1, vec![]);
    assert_eq!(bare.summarize(), "M5. prompt M5");
  }

  #[test]
  fn decode_applies_defaults_for_missing_and_mistyped_fields() {
    let settings = QuestionSettings::decode(
      Section::MarketResearch,
      QuestionType::MultiSelect,
      true,
      false,
      &json!({ "maxSelections": "three", "required": true, "category": "" }),
    );
    assert_eq!(settings, QuestionSettings::MultiSelect {
      max_selections: None,
      allow_other:    true,
      attributes:     ResearchAttributes {
        required:      true,
        enriches_card: false,
        card_display:  None,
        category:      "general".into(),
      },
    });
  }

  #[test]
  fn settings_survive_metadata_roundtrip() {
    let data = AssessmentData::bundled().unwrap();
    for mr in &data.market_research_questions {
      let settings = QuestionSettings::for_market_research(mr);
      let decoded = QuestionSettings::decode(
        Section::MarketResearch,
        mr.question_type,
        false,
        false,
        &settings.to_metadata(),
      );
      assert_eq!(decoded, settings, "{}", mr.id);
    }
  }

  #[test]
  fn assemble_orders_questions_and_uses_fallback_metadata() {
    let fallback = AssessmentData::bundled().unwrap();
    let questions = vec![
      question(Section::Maturity, "Q2", 2, vec![option(Some("L3"), "c", Some(3), 1)]),
      question(Section::MarketResearch, "M1", 1, vec![]),
      question(Section::Maturity, "Q1", 1, vec![
        option(Some("L2"), "b", Some(2), 2),
        option(Some("L1"), "a", Some(1), 1),
      ]),
      question(Section::Screening, "S1", 1, vec![
        option(Some("yes"), "Yes", None, 1),
        option(Some("no"), "No", None, 2),
      ]),
    ];

    let def = SurveyDefinition::assemble(header(SurveyMetadata::default()), questions, &fallback);
    let keys: Vec<&str> = def.questions.iter().map(|q| q.key.as_str()).collect();
    assert_eq!(keys, ["S1", "Q1", "Q2", "M1"]);

    let data = &def.assessment;
    assert_eq!(data.version, "survey-v3");
    assert_eq!(data.capabilities, fallback.capabilities);
    assert_eq!(data.screening.id, "S1");
    assert!(data.screening.options[0].proceed);
    assert!(!data.screening.options[1].proceed);
    assert_eq!(data.maturity_questions[0].answers[0].text, "a");
    assert!(data.market_research_questions[0].options.is_none());
    assert!(def.screening_question().is_some());
  }

  #[test]
  fn find_question_by_key_respects_section() {
    let fallback = AssessmentData::bundled().unwrap();
    let def = SurveyDefinition::assemble(
      header(SurveyMetadata::default()),
      vec![question(Section::Maturity, "Q1", 1, vec![])],
      &fallback,
    );
    assert!(def.find_question_by_key("Q1", None).is_some());
    assert!(def.find_question_by_key("Q1", Some(Section::Maturity)).is_some());
    assert!(def.find_question_by_key("Q1", Some(Section::MarketResearch)).is_none());
    assert!(def.find_question_by_key("Q9", None).is_none());
  }

  #[test]
  fn survey_metadata_decode_is_lenient() {
    assert_eq!(SurveyMetadata::decode("not json"), SurveyMetadata::default());
    assert_eq!(SurveyMetadata::decode("{}"), SurveyMetadata::default());
  }
}
