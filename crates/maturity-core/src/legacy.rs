//! Rows of the pre-normalization tables and the backfill report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::{scoring::AssessmentResult, submission::ScreeningAnswer};

/// The fixed capability columns of the legacy `assessments` table.
pub const LEGACY_CAPABILITIES: [&str; 7] =
  ["specs", "context", "agents", "feedback", "governance", "delivery", "organization"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegacyScores {
  pub overall:      Option<i64>,
  pub specs:        Option<i64>,
  pub context:      Option<i64>,
  pub agents:       Option<i64>,
  pub feedback:     Option<i64>,
  pub governance:   Option<i64>,
  pub delivery:     Option<i64>,
  pub organization: Option<i64>,
}

impl LegacyScores {
  /// Flatten a scoring result into the legacy columns. Capabilities without
  /// a column are dropped.
  pub fn from_result(result: &AssessmentResult) -> Self {
    let capability = |id: &str| {
      result
        .capability_scores
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.score)
    };
    Self {
      overall:      Some(result.overall_score),
      specs:        capability("specs"),
      context:      capability("context"),
      agents:       capability("agents"),
      feedback:     capability("feedback"),
      governance:   capability("governance"),
      delivery:     capability("delivery"),
      organization: capability("organization"),
    }
  }

  /// Capability id and column value, in column order.
  pub fn capabilities(&self) -> [(&'static str, Option<i64>); 7] {
    [
      (LEGACY_CAPABILITIES[0], self.specs),
      (LEGACY_CAPABILITIES[1], self.context),
      (LEGACY_CAPABILITIES[2], self.agents),
      (LEGACY_CAPABILITIES[3], self.feedback),
      (LEGACY_CAPABILITIES[4], self.governance),
      (LEGACY_CAPABILITIES[5], self.delivery),
      (LEGACY_CAPABILITIES[6], self.organization),
    ]
  }
}

/// A row of the legacy `assessments` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyAssessment {
  pub id:               Uuid,
  pub screening_answer: ScreeningAnswer,
  /// Question key → level, as submitted. Non-numeric entries are kept here
  /// and skipped on migration.
  pub answers:          Value,
  pub scores:           LegacyScores,
  pub archetype_id:     Option<String>,
  pub created_at:       DateTime<Utc>,
  pub user_agent:       Option<String>,
  pub referrer:         Option<String>,
  pub session_id:       Option<String>,
  pub email:            Option<String>,
}

/// A row of the legacy `market_research_responses` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyMarketResearch {
  pub assessment_id: Uuid,
  pub question_key:  String,
  /// `{selected, other, text}` as submitted.
  pub response:      Value,
  pub created_at:    DateTime<Utc>,
}

/// Read-only consistency check run after a backfill.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
  pub legacy_submission_count:         u64,
  pub normalized_submission_count:     u64,
  pub missing_submission_count:        u64,
  pub legacy_market_research_rows:     u64,
  pub normalized_market_research_rows: u64,
  pub random_spot_checks:              u64,
  pub random_spot_check_mismatches:    u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackfillReport {
  pub survey_id:                  Uuid,
  pub survey_version:             u32,
  pub submission_rows_backfilled: u64,
  pub market_rows_backfilled:     u64,
  pub validation:                 ValidationReport,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{assessment::AssessmentData, scoring};

  #[test]
  fn scores_flatten_into_columns() {
    let data = AssessmentData::bundled().unwrap();
    let answers = [("Q1".to_owned(), 5.0), ("Q2".to_owned(), 5.0)].into_iter().collect();
    let result = scoring::score(&answers, &data).unwrap();

    let scores = LegacyScores::from_result(&result);
    assert_eq!(scores.overall, Some(14));
    assert_eq!(scores.specs, Some(100));
    assert_eq!(scores.organization, Some(0));

    let ids: Vec<&str> = scores.capabilities().iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, LEGACY_CAPABILITIES);
  }
}
