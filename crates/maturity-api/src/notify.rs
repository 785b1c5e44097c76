//! Best-effort submission summaries sent after each write.

use std::error::Error;

use maturity_core::{
  notify::{Notifier, SubmissionEvent, render_summary},
  store::SurveyStore,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::ApiState;

/// Render and send the summary of `submission_id`. Failures are logged and
/// never surface to the caller.
pub async fn submission_summary<S, N>(
  state: &ApiState<S, N>,
  event: SubmissionEvent,
  submission_id: Uuid,
) where
  S: SurveyStore,
  N: Notifier,
{
  if let Err(err) = send_summary(state, event, submission_id).await {
    warn!(%submission_id, event = event.title(), error = %err, "failed to send submission summary");
  }
}

async fn send_summary<S, N>(
  state: &ApiState<S, N>,
  event: SubmissionEvent,
  submission_id: Uuid,
) -> Result<(), Box<dyn Error + Send + Sync>>
where
  S: SurveyStore,
  N: Notifier,
{
  let Some(record) = state.store.submission_record(submission_id).await? else {
    debug!(%submission_id, "submission vanished before its summary was sent");
    return Ok(());
  };
  let Some(definition) = state.store.survey_by_id(record.submission.survey_id, true).await? else {
    debug!(%submission_id, "survey vanished before its summary was sent");
    return Ok(());
  };

  let notification = render_summary(event, &record, &definition);
  state.notifier.send(notification).await?;
  Ok(())
}
