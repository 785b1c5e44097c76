//! The question bank document and its denormalized read model.
//!
//! [`AssessmentData`] is both the import format (a question bank snapshot fed
//! to the survey importer) and the view reconstructed from the normalized
//! tables for the respondent-facing surface. Field names follow the camelCase
//! JSON of the bank file.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Result, survey::QuestionType};

const BUNDLED_QUESTION_BANK: &str = include_str!("../assets/questions.json");

// ─── Metadata ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentMetadata {
  pub title:                           String,
  pub description:                     String,
  pub estimated_minutes:               u32,
  pub total_maturity_questions:        u32,
  pub total_market_research_questions: u32,
  pub answers_per_maturity_question:   u32,
  pub shuffle_answers:                 bool,
  pub framing_text:                    String,
}

// ─── Screening ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningOption {
  pub value:   String,
  pub label:   String,
  /// Whether choosing this option continues into the maturity questions.
  pub proceed: bool,
}

/// The result shown to respondents who do not proceed past screening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackResult {
  pub archetype:   String,
  pub name:        String,
  pub tagline:     String,
  pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screening {
  pub id:              String,
  pub prompt:          String,
  pub options:         Vec<ScreeningOption>,
  pub fallback_result: FallbackResult,
}

// ─── Capabilities and archetypes ─────────────────────────────────────────────

/// A competency axis that maturity questions are grouped under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capability {
  pub id:             String,
  pub name:           String,
  pub radar_label:    String,
  pub description:    String,
  pub question_count: u32,
}

/// A named bucket of overall scores; both bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Archetype {
  pub id:           String,
  pub name:         String,
  pub score_min:    i64,
  pub score_max:    i64,
  pub tagline:      String,
  pub description:  String,
  pub growth_focus: String,
}

impl Archetype {
  pub fn contains(&self, score: i64) -> bool {
    score >= self.score_min && score <= self.score_max
  }
}

// ─── Questions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaturityAnswer {
  pub level: u8,
  pub text:  String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaturityQuestion {
  pub id:         String,
  pub capability: String,
  pub prompt:     String,
  pub answers:    Vec<MaturityAnswer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketResearchQuestion {
  pub id:             String,
  #[serde(rename = "type")]
  pub question_type:  QuestionType,
  pub prompt:         String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub options:        Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_selections: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub allow_other:    Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub required:       Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub enriches_card:  Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub card_display:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub placeholder:    Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub max_length:     Option<u32>,
  /// Research bucket the answers are filed under.
  #[serde(default = "default_category", alias = "fabriqaCategory")]
  pub category:       String,
}

pub(crate) fn default_category() -> String { "general".to_owned() }

// ─── AssessmentData ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentData {
  pub version:                   String,
  pub metadata:                  AssessmentMetadata,
  pub screening:                 Screening,
  pub capabilities:              Vec<Capability>,
  pub archetypes:                Vec<Archetype>,
  pub maturity_questions:        Vec<MaturityQuestion>,
  pub market_research_questions: Vec<MarketResearchQuestion>,
}

impl AssessmentData {
  /// The question bank compiled into the binary; used to bootstrap an empty
  /// store and as the source of defaults for absent survey metadata.
  pub fn bundled() -> Result<Self> { Self::from_json(BUNDLED_QUESTION_BANK) }

  pub fn from_json(raw: &str) -> Result<Self> { Ok(serde_json::from_str(raw)?) }

  /// SHA-256 hex digest of the serialised document.
  ///
  /// Serialisation follows struct field order, so equal documents always
  /// hash equally regardless of the key order in the source file.
  pub fn checksum(&self) -> Result<String> {
    let serialized = serde_json::to_vec(self)?;
    Ok(hex::encode(Sha256::digest(&serialized)))
  }

  pub fn capability(&self, id: &str) -> Option<&Capability> {
    self.capabilities.iter().find(|c| c.id == id)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bundled_bank_parses() {
    let data = AssessmentData::bundled().unwrap();
    assert_eq!(data.screening.options.len(), 2);
    assert_eq!(data.maturity_questions.len(), 14);
    assert!(data.market_research_questions.iter().all(|q| q.id.starts_with('M')));
    for question in &data.maturity_questions {
      assert!(data.capability(&question.capability).is_some(), "{}", question.id);
    }
  }

  #[test]
  fn checksum_is_stable_and_content_sensitive() {
    let data = AssessmentData::bundled().unwrap();
    let first = data.checksum().unwrap();
    assert_eq!(first, data.clone().checksum().unwrap());
    assert_eq!(first.len(), 64);

    let mut changed = data;
    changed.metadata.title.push('!');
    assert_ne!(first, changed.checksum().unwrap());
  }

  #[test]
  fn legacy_category_alias_is_accepted() {
    let question: MarketResearchQuestion = serde_json::from_value(serde_json::json!({
      "id": "M9",
      "type": "open-text",
      "prompt": "Anything else?",
      "fabriqaCategory": "misc"
    }))
    .unwrap();
    assert_eq!(question.category, "misc");
    assert_eq!(question.question_type, QuestionType::OpenText);
  }

  #[test]
  fn archetype_bounds_are_inclusive() {
    let data = AssessmentData::bundled().unwrap();
    let first = &data.archetypes[0];
    assert!(first.contains(first.score_min));
    assert!(first.contains(first.score_max));
    assert!(!first.contains(first.score_max + 1));
  }
}
