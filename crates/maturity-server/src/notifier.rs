//! Delivery of submission summaries.

use std::time::Duration;

use maturity_core::notify::{Notification, Notifier};
use reqwest::Client;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::config::ServerConfig;

const RESEND_ENDPOINT: &str = "https://api.resend.com/emails";

#[derive(Debug, Error)]
pub enum NotifyError {
  #[error("email request failed: {0}")]
  Http(#[from] reqwest::Error),

  #[error("email provider responded {status}: {body}")]
  Rejected { status: reqwest::StatusCode, body: String },
}

/// Sends summaries through the Resend email API.
#[derive(Clone)]
pub struct ResendNotifier {
  client:  Client,
  api_key: String,
  from:    String,
  to:      String,
}

impl ResendNotifier {
  pub fn new(api_key: String, from: String, to: String) -> reqwest::Result<Self> {
    let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
    Ok(Self { client, api_key, from, to })
  }

  async fn post(&self, notification: Notification) -> Result<(), NotifyError> {
    let resp = self
      .client
      .post(RESEND_ENDPOINT)
      .bearer_auth(&self.api_key)
      .json(&json!({
        "from": self.from,
        "to": [self.to],
        "subject": notification.subject,
        "text": notification.text_body,
        "html": notification.html_body,
      }))
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      return Err(NotifyError::Rejected { status, body });
    }
    Ok(())
  }
}

/// The configured summary sink.
pub enum SummaryNotifier {
  Resend(ResendNotifier),
  /// No API key configured; summaries are logged and dropped.
  Log,
}

impl SummaryNotifier {
  pub fn from_config(cfg: &ServerConfig) -> reqwest::Result<Self> {
    match cfg.resend_api_key.as_deref().map(str::trim) {
      Some(key) if !key.is_empty() => Ok(Self::Resend(ResendNotifier::new(
        key.to_owned(),
        cfg.results_from_email.clone(),
        cfg.results_to_email.clone(),
      )?)),
      _ => Ok(Self::Log),
    }
  }
}

impl Notifier for SummaryNotifier {
  type Error = NotifyError;

  async fn send(&self, notification: Notification) -> Result<(), NotifyError> {
    match self {
      Self::Resend(resend) => resend.post(notification).await,
      Self::Log => {
        info!(subject = %notification.subject, "email delivery not configured; summary not sent");
        Ok(())
      }
    }
  }
}
