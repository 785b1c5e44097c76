//! Maturity scoring.
//!
//! Levels run from 1 to 5 and map linearly onto 0–100. Capability and overall
//! scores are whole numbers; per-question scores keep two decimals.

use std::{collections::BTreeMap, ops::RangeInclusive};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
  Error, Result,
  assessment::{Archetype, AssessmentData},
};

/// Question key → chosen maturity level.
pub type MaturityAnswers = BTreeMap<String, f64>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityScore {
  pub id:          String,
  pub name:        String,
  pub radar_label: String,
  pub score:       i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResult {
  pub overall_score:       i64,
  pub capability_scores:   Vec<CapabilityScore>,
  pub archetype:           Archetype,
  pub lowest_capabilities: Vec<CapabilityScore>,
}

/// Round half up, the way browsers round for display.
pub fn round_half_up(value: f64) -> f64 { (value + 0.5).floor() }

fn round_to_int(value: f64) -> i64 { round_half_up(value) as i64 }

fn percent_of_range(level: f64) -> f64 { (level - 1.0) / 4.0 * 100.0 }

/// Score of a single maturity answer, rounded to two decimals.
pub fn question_score_from_level(level: f64) -> f64 {
  round_half_up(percent_of_range(level) * 100.0) / 100.0
}

/// Score a set of maturity answers against a question bank.
///
/// Unanswered questions count as level 1. A capability with no questions
/// scores 0. Fails only when the bank defines no archetypes.
pub fn score(answers: &MaturityAnswers, data: &AssessmentData) -> Result<AssessmentResult> {
  let capability_scores: Vec<CapabilityScore> = data
    .capabilities
    .iter()
    .map(|capability| {
      let levels: Vec<f64> = data
        .maturity_questions
        .iter()
        .filter(|q| q.capability == capability.id)
        .map(|q| answers.get(&q.id).copied().unwrap_or(1.0))
        .collect();

      let score = if levels.is_empty() {
        0
      } else {
        let mean = levels.iter().sum::<f64>() / levels.len() as f64;
        round_to_int(percent_of_range(mean))
      };

      CapabilityScore {
        id: capability.id.clone(),
        name: capability.name.clone(),
        radar_label: capability.radar_label.clone(),
        score,
      }
    })
    .collect();

  let total: i64 = capability_scores.iter().map(|c| c.score).sum();
  let overall_score = round_to_int(total as f64 / capability_scores.len().max(1) as f64);

  let archetype = data
    .archetypes
    .iter()
    .find(|a| a.contains(overall_score))
    .or_else(|| data.archetypes.first())
    .cloned()
    .ok_or(Error::NoArchetypes)?;

  // `sort_by_key` is stable, so ties keep capability order.
  let mut lowest_capabilities = capability_scores.clone();
  lowest_capabilities.sort_by_key(|c| c.score);
  lowest_capabilities.truncate(2);

  Ok(AssessmentResult { overall_score, capability_scores, archetype, lowest_capabilities })
}

/// Maturity levels a respondent can pick.
pub const MATURITY_LEVELS: RangeInclusive<f64> = 1.0..=5.0;

/// Keep only the numeric entries of a JSON object that are valid maturity
/// levels. Everything else is treated as unanswered.
pub fn parse_maturity_answers(value: &Value) -> MaturityAnswers {
  value
    .as_object()
    .map(|map| {
      map
        .iter()
        .filter_map(|(key, v)| {
          v.as_f64().filter(|n| MATURITY_LEVELS.contains(n)).map(|n| (key.clone(), n))
        })
        .collect()
    })
    .unwrap_or_default()
}

pub fn growth_recommendation(capability_id: &str) -> &'static str {
  match capability_id {
    "specs" => {
      "Write a structured spec for your next feature before touching code. Include acceptance \
       criteria that AI can use to generate tests."
    }
    "context" => {
      "Set up persistent context for your AI tools: project rules files, architecture docs, or \
       memory features. Stop starting from zero every session."
    }
    "agents" => {
      "Try delegating a multi-step task to AI agents instead of doing each step yourself. Start \
       with a well-defined task like writing tests for existing code."
    }
    "feedback" => {
      "Start tracking one metric about AI effectiveness: acceptance rate, rework frequency, or \
       time saved. You can't improve what you don't measure."
    }
    "governance" => {
      "Add one automated quality check to your AI workflow, such as a linter rule, a test \
       coverage gate, or a security scan that runs on all code."
    }
    "delivery" => {
      "Connect your specs to your CI/CD pipeline. Start by making specs machine-readable so \
       automation can consume them."
    }
    "organization" => {
      "Share one AI workflow with your team this week. Start a channel or doc where people post \
       AI tips; making sharing normal is the first step."
    }
    _ => "Explore how AI can enhance this area of your workflow.",
  }
}
