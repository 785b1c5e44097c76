//! Submission summaries and the notification sink they are sent through.

use std::{collections::BTreeSet, fmt::Write as _, future::Future};

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::{
  submission::{AnswerKind, ScoreScope, SubmissionRecord},
  survey::{Section, SurveyDefinition, SurveyQuestion},
};

/// The stage of a submission that triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionEvent {
  Assessment,
  MarketResearch,
  EmailCapture,
}

impl SubmissionEvent {
  pub fn title(self) -> &'static str {
    match self {
      Self::Assessment => "Assessment submission",
      Self::MarketResearch => "Market research submission",
      Self::EmailCapture => "Email capture submission",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
  pub subject:   String,
  pub text_body: String,
  pub html_body: String,
}

/// A sink for submission summaries.
///
/// Delivery is best-effort; callers log failures and carry on.
pub trait Notifier: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn send(
    &self,
    notification: Notification,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

pub fn escape_html(value: &str) -> String {
  let mut out = String::with_capacity(value.len());
  for c in value.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#039;"),
      _ => out.push(c),
    }
  }
  out
}

fn lines_to_html(lines: &[String]) -> String {
  let items: String = lines.iter().map(|l| format!("<li>{}</li>", escape_html(l))).collect();
  format!("<ul>{items}</ul>")
}

/// Whole numbers print without a fractional part.
fn format_score(value: Option<f64>) -> String {
  match value {
    Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{}", v as i64),
    Some(v) => format!("{v}"),
    None => "n/a".to_owned(),
  }
}

fn option_label(question: &SurveyQuestion, label: &str, level: Option<u8>) -> String {
  match (question.section, level) {
    (Section::Maturity, Some(level)) => format!("L{level}: {label}"),
    _ => label.to_owned(),
  }
}

struct QuestionSummary<'a> {
  question: &'a SurveyQuestion,
  selected: Vec<String>,
  other:    Vec<String>,
  open:     Vec<String>,
  chosen:   BTreeSet<uuid::Uuid>,
}

impl<'a> QuestionSummary<'a> {
  fn collect(question: &'a SurveyQuestion, record: &SubmissionRecord) -> Self {
    let mut answers: Vec<_> = record.answers_for(question.question_id).collect();
    answers.sort_by_key(|a| a.index);

    let trimmed = |kind: AnswerKind| -> Vec<String> {
      answers
        .iter()
        .filter(|a| a.kind == kind)
        .filter_map(|a| a.text.as_deref().map(str::trim).filter(|t| !t.is_empty()))
        .map(str::to_owned)
        .collect()
    };

    let choices: Vec<_> = answers
      .iter()
      .filter(|a| matches!(a.kind, AnswerKind::SelectedOption | AnswerKind::Screening))
      .collect();

    Self {
      question,
      selected: choices.iter().map(|a| a.display_label(question.section)).collect(),
      other: trimmed(AnswerKind::OtherText),
      open: trimmed(AnswerKind::OpenText),
      chosen: choices.iter().filter_map(|a| a.option_id).collect(),
    }
  }

  fn selected_line(&self) -> String {
    if self.selected.is_empty() {
      "No selection".to_owned()
    } else {
      self.selected.join(", ")
    }
  }

  fn heading(&self) -> String { format!("{}. {}", self.question.key, self.question.prompt) }
}

/// Render the plain-text and HTML summary of a submission.
pub fn render_summary(
  event: SubmissionEvent,
  record: &SubmissionRecord,
  definition: &SurveyDefinition,
) -> Notification {
  let submission = &record.submission;
  let title = event.title();
  let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| "n/a".to_owned());

  let header = vec![
    format!("submissionId: {}", submission.submission_id),
    format!("surveyId: {}", submission.survey_id),
    format!("surveyVersion: {}", definition.version_number()),
    format!(
      "submittedAt: {}",
      submission.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ),
    format!("respondentEmail: {}", or_na(&submission.respondent_email)),
    format!("sessionId: {}", or_na(&submission.session_id)),
    format!("referrer: {}", or_na(&submission.referrer)),
    format!("userAgent: {}", or_na(&submission.user_agent)),
  ];

  let mut text = vec![title.to_owned()];
  text.extend(header.iter().cloned());
  text.push(String::new());
  text.push("Responses:".to_owned());

  let mut html = vec![
    format!("<h2>{}</h2>", escape_html(title)),
    lines_to_html(&header),
    "<h3>Responses</h3>".to_owned(),
  ];

  for question in &definition.questions {
    let summary = QuestionSummary::collect(question, record);

    text.push(summary.heading());
    text.push(format!("Type: {}", question.question_type.as_str()));
    text.push(format!("Selected: {}", summary.selected_line()));
    if !summary.other.is_empty() {
      text.push(format!("Other text: {}", summary.other.join(" | ")));
    }
    if !summary.open.is_empty() {
      text.push(format!("Open text: {}", summary.open.join(" | ")));
    }
    if !question.options.is_empty() {
      text.push("Options:".to_owned());
      for option in &question.options {
        let marker = if summary.chosen.contains(&option.option_id) { " [selected]" } else { "" };
        text.push(format!(
          "- {}{marker}",
          option_label(question, &option.label, option.maturity_level)
        ));
      }
    }
    text.push(String::new());

    let mut section = String::from("<section>\n");
    let _ = writeln!(section, "<h4>{}</h4>", escape_html(&summary.heading()));
    let _ = writeln!(
      section,
      "<p><strong>Type:</strong> {}</p>",
      escape_html(question.question_type.as_str())
    );
    let _ = writeln!(
      section,
      "<p><strong>Selected:</strong> {}</p>",
      escape_html(&summary.selected_line())
    );
    if !summary.other.is_empty() {
      let _ = writeln!(
        section,
        "<p><strong>Other text:</strong> {}</p>",
        escape_html(&summary.other.join(" | "))
      );
    }
    if !summary.open.is_empty() {
      let _ = writeln!(
        section,
        "<p><strong>Open text:</strong> {}</p>",
        escape_html(&summary.open.join(" | "))
      );
    }
    if !question.options.is_empty() {
      let items: String = question
        .options
        .iter()
        .map(|option| {
          let marker = if summary.chosen.contains(&option.option_id) {
            " <strong>(selected)</strong>"
          } else {
            ""
          };
          format!(
            "<li>{}{marker}</li>",
            escape_html(&option_label(question, &option.label, option.maturity_level))
          )
        })
        .collect();
      let _ = writeln!(section, "<p><strong>Options:</strong></p><ul>{items}</ul>");
    }
    section.push_str("</section>");
    html.push(section);
  }

  let overall = format!("Overall: {}", format_score(record.score(ScoreScope::Overall, "overall")));
  let capability_lines: Vec<String> = definition
    .assessment
    .capabilities
    .iter()
    .filter_map(|c| {
      record
        .score(ScoreScope::Capability, &c.id)
        .map(|v| format!("{}: {}", c.name, format_score(Some(v))))
    })
    .collect();
  let question_lines: Vec<String> = definition
    .questions_in(Section::Maturity)
    .filter_map(|q| {
      record
        .score(ScoreScope::Question, &q.key)
        .map(|v| format!("{}: {}", q.key, format_score(Some(v))))
    })
    .collect();

  text.push("Scores:".to_owned());
  text.push(overall.clone());
  if !capability_lines.is_empty() {
    text.push("Capability scores:".to_owned());
    text.extend(capability_lines.iter().map(|l| format!("- {l}")));
  }
  if !question_lines.is_empty() {
    text.push("Question scores:".to_owned());
    text.extend(question_lines.iter().map(|l| format!("- {l}")));
  }

  let mut score_lines = vec![overall];
  score_lines.extend(capability_lines);
  html.push("<h3>Scores</h3>".to_owned());
  html.push(lines_to_html(&score_lines));

  Notification {
    subject:   format!("{title}: {}", submission.submission_id),
    text_body: text.join("\n"),
    html_body: html.join("\n"),
  }
}

#[cfg(test)]
mod tests {
  use std::collections::BTreeMap;

  use chrono::{TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::{
    assessment::AssessmentData,
    submission::{Submission, SubmissionAnswer, SubmissionScore},
    survey::{
      QuestionSettings, QuestionType, ResearchAttributes, SurveyHeader, SurveyMetadata,
      SurveyOption, SurveyStatus,
    },
  };

  fn option(label: &str, level: Option<u8>, order: u32) -> SurveyOption {
    SurveyOption {
      option_id: Uuid::new_v4(),
      option_key: None,
      label: label.to_owned(),
      maturity_level: level,
      order,
      is_other: false,
    }
  }

  fn definition() -> SurveyDefinition {
    let header = SurveyHeader {
      survey_id:       Uuid::nil(),
      version_number:  2,
      name:            "test".into(),
      status:          SurveyStatus::Active,
      source:          "test".into(),
      source_checksum: "abc".into(),
      created_at:      Utc::now(),
      activated_at:    None,
      metadata:        SurveyMetadata::default(),
    };
    let base = |section: Section,
                key: &str,
                question_type: QuestionType,
                settings: QuestionSettings,
                options: Vec<SurveyOption>| SurveyQuestion {
      map_id: Uuid::new_v4(),
      survey_id: Uuid::nil(),
      section,
      order: 1,
      is_scored: section == Section::Maturity,
      is_enabled: true,
      question_id: Uuid::new_v4(),
      key: key.to_owned(),
      question_type,
      capability_id: Some("specs".into()),
      prompt: format!("<{key}>"),
      settings,
      options,
    };
    let questions = vec![
      base(
        Section::Screening,
        "S1",
        QuestionType::SingleSelect,
        QuestionSettings::Screening { proceed_by_value: BTreeMap::new(), fallback_result: None },
        vec![option("Yes", None, 1), option("No", None, 2)],
      ),
      base(
        Section::Maturity,
        "Q1",
        QuestionType::SingleSelect,
        QuestionSettings::Maturity,
        vec![option("Low", Some(1), 1), option("High", Some(5), 2)],
      ),
      base(
        Section::MarketResearch,
        "M1",
        QuestionType::MultiSelect,
        QuestionSettings::MultiSelect {
          max_selections: None,
          allow_other:    true,
          attributes:     ResearchAttributes::default(),
        },
        vec![option("A", None, 1), option("B", None, 2)],
      ),
    ];
    SurveyDefinition::assemble(header, questions, &AssessmentData::bundled().unwrap())
  }

  fn answer(question: &SurveyQuestion, kind: AnswerKind, index: u32) -> SubmissionAnswer {
    SubmissionAnswer {
      question_id: question.question_id,
      kind,
      index,
      option_id: None,
      option_key: None,
      option_label: None,
      maturity_level: None,
      text: None,
      numeric: None,
    }
  }

  fn record(def: &SurveyDefinition) -> SubmissionRecord {
    let q1 = def.find_question_by_key("Q1", None).unwrap();
    let m1 = def.find_question_by_key("M1", None).unwrap();
    let high = &q1.options[1];
    SubmissionRecord {
      submission: Submission {
        submission_id:    Uuid::nil(),
        survey_id:        Uuid::nil(),
        session_id:       Some("sess".into()),
        user_agent:       None,
        referrer:         None,
        respondent_email: None,
        created_at:       Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
      },
      answers:    vec![
        SubmissionAnswer {
          option_id: Some(high.option_id),
          option_label: Some(high.label.clone()),
          maturity_level: Some(5),
          numeric: Some(5.0),
          ..answer(q1, AnswerKind::SelectedOption, 0)
        },
        SubmissionAnswer { text: Some("Zed".into()), ..answer(m1, AnswerKind::SelectedOption, 0) },
        SubmissionAnswer { text: Some(" mine ".into()), ..answer(m1, AnswerKind::OtherText, 1) },
      ],
      scores:     vec![
        SubmissionScore { scope: ScoreScope::Overall, scope_key: "overall".into(), value: 14.0 },
        SubmissionScore { scope: ScoreScope::Capability, scope_key: "specs".into(), value: 100.0 },
        SubmissionScore { scope: ScoreScope::Question, scope_key: "Q1".into(), value: 100.0 },
      ],
    }
  }

  #[test]
  fn escape_html_covers_markup_characters() {
    assert_eq!(escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
      "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#039;Jerry&#039;&lt;/a&gt;");
  }

  #[test]
  fn format_score_drops_trailing_zeroes() {
    assert_eq!(format_score(Some(75.0)), "75");
    assert_eq!(format_score(Some(12.5)), "12.5");
    assert_eq!(format_score(None), "n/a");
  }

  #[test]
  fn text_summary_lists_answers_options_and_scores() {
    let def = definition();
    let n = render_summary(SubmissionEvent::Assessment, &record(&def), &def);

    assert_eq!(n.subject, format!("Assessment submission: {}", Uuid::nil()));
    let text = &n.text_body;
    assert!(text.starts_with("Assessment submission\nsubmissionId: "));
    assert!(text.contains("surveyVersion: 2\n"));
    assert!(text.contains("submittedAt: 2026-01-02T03:04:05.000Z\n"));
    assert!(text.contains("respondentEmail: n/a\nsessionId: sess\n"));
    assert!(text.contains("S1. <S1>\nType: single-select\nSelected: No selection\n"));
    assert!(text.contains("Q1. <Q1>\nType: single-select\nSelected: L5: High\nOptions:\n- L1: Low\n- L5: High [selected]\n"));
    assert!(text.contains("M1. <M1>\nType: multi-select\nSelected: Zed\nOther text: mine\nOptions:\n- A\n- B\n"));
    assert!(text.contains("Scores:\nOverall: 14\nCapability scores:\n- Specifications: 100\nQuestion scores:\n- Q1: 100"));
  }

  #[test]
  fn html_summary_escapes_content() {
    let def = definition();
    let n = render_summary(SubmissionEvent::MarketResearch, &record(&def), &def);
    assert!(n.html_body.starts_with("<h2>Market research submission</h2>\n<ul><li>submissionId: "));
    assert!(n.html_body.contains("<h4>Q1. &lt;Q1&gt;</h4>"));
    assert!(n.html_body.contains("<li>L5: High <strong>(selected)</strong></li>"));
    assert!(n.html_body.ends_with("<h3>Scores</h3>\n<ul><li>Overall: 14</li><li>Specifications: 100</li></ul>"));
  }
}
