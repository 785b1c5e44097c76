//! [`SqliteStore`], the SQLite implementation of [`SurveyStore`].

use std::{collections::BTreeMap, path::Path, sync::Arc};

use chrono::Utc;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};
use uuid::Uuid;

use maturity_core::{
  assessment::AssessmentData,
  legacy::{BackfillReport, LegacyAssessment, LegacyMarketResearch},
  scoring,
  store::{ReadOptions, SurveyStore},
  submission::{
    self, MarketResearchResponse, NewSubmission, ScreeningAnswer, SubmissionCreated,
    SubmissionRecord,
  },
  survey::{ImportSummary, SurveyDefinition},
};

use crate::{
  Error, Result, backfill,
  cache::{SURVEY_CACHE_TTL, SurveyCache, SurveyKey},
  encode::encode_dt,
  import, legacy, read,
  schema::SCHEMA,
  submit::{self, AssessmentWrite},
};

/// `source` recorded for surveys imported from the compiled-in bank.
pub const BUNDLED_SOURCE: &str = "questions.json";
pub const BUNDLED_NAME: &str = "AI-Native Engineering Maturity Assessment";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A survey store backed by a single SQLite file.
///
/// Cloning is cheap; clones share the connection, the schema latch, the
/// definition cache and the bootstrap lock.
#[derive(Clone)]
pub struct SqliteStore {
  conn:      tokio_rusqlite::Connection,
  schema:    Arc<OnceCell<()>>,
  cache:     SurveyCache,
  bundled:   Arc<AssessmentData>,
  bootstrap: Arc<Mutex<()>>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    Self::from_connection(conn).await
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    Self::from_connection(conn).await
  }

  async fn from_connection(conn: tokio_rusqlite::Connection) -> Result<Self> {
    let store = Self::unprepared(conn)?;
    store.ensure_schema().await?;
    Ok(store)
  }

  /// Wrap `conn` without creating the schema yet.
  pub(crate) fn unprepared(conn: tokio_rusqlite::Connection) -> Result<Self> {
    Ok(Self {
      conn,
      schema: Arc::new(OnceCell::new()),
      cache: SurveyCache::new(SURVEY_CACHE_TTL),
      bundled: Arc::new(AssessmentData::bundled()?),
      bootstrap: Arc::new(Mutex::new(())),
    })
  }

  /// Replace the bank used for bootstrapping and as the source of defaults
  /// for absent survey metadata.
  pub fn with_default_bank(mut self, bank: AssessmentData) -> Self {
    self.bundled = Arc::new(bank);
    self
  }

  /// Run `f` on the connection thread.
  pub(crate) async fn call<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&mut rusqlite::Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self.conn.call(move |conn| Ok(f(conn))).await?
  }

  /// Run `f` on the connection thread inside one transaction. Any error
  /// rolls the whole call back.
  async fn transaction<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&rusqlite::Transaction<'_>) -> Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .call(move |conn| {
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
      })
      .await
  }

  async fn load_definition(&self, key: SurveyKey) -> Result<Option<SurveyDefinition>> {
    let loaded = self.call(move |conn| read::load_survey(conn, key)).await?;
    Ok(loaded.map(|(header, questions)| {
      SurveyDefinition::assemble(header, questions, &self.bundled)
    }))
  }

  async fn read_survey(
    &self,
    key: SurveyKey,
    use_cache: bool,
  ) -> Result<Option<Arc<SurveyDefinition>>> {
    if use_cache {
      self.cache.get_or_load(key, || self.load_definition(key)).await
    } else {
      Ok(self.load_definition(key).await?.map(Arc::new))
    }
  }

  async fn import_bank(
    &self,
    bank: AssessmentData,
    source: String,
    name: String,
  ) -> Result<ImportSummary> {
    self.ensure_schema().await?;
    let checksum = bank.checksum()?;
    let summary = self
      .transaction(move |tx| {
        import::write_survey(tx, &bank, &source, &name, &checksum, Utc::now())
      })
      .await?;
    self.cache.invalidate_all();
    info!(
      survey_id = %summary.survey_id,
      version = summary.version_number,
      checksum = %summary.source_checksum,
      "imported survey"
    );
    Ok(summary)
  }

  async fn resolve_active(&self, options: ReadOptions) -> Result<Option<Arc<SurveyDefinition>>> {
    self.ensure_schema().await?;
    if let Some(definition) = self.read_survey(SurveyKey::Active, options.use_cache).await? {
      return Ok(Some(definition));
    }
    if !options.bootstrap_from_bundled {
      return Ok(None);
    }

    // Concurrent first readers must not each import a version.
    let _guard = self.bootstrap.lock().await;
    if let Some(definition) = self.read_survey(SurveyKey::Active, false).await? {
      return Ok(Some(definition));
    }
    debug!("no active survey; importing the bundled question bank");
    self
      .import_bank(
        AssessmentData::clone(&self.bundled),
        BUNDLED_SOURCE.to_owned(),
        BUNDLED_NAME.to_owned(),
      )
      .await?;
    self.read_survey(SurveyKey::Active, options.use_cache).await
  }

  // ── Legacy tables ─────────────────────────────────────────────────────────

  /// Write a row in the flat legacy `assessments` table.
  pub async fn record_legacy_assessment(&self, row: LegacyAssessment) -> Result<()> {
    self.ensure_schema().await?;
    self.call(move |conn| legacy::upsert_assessment(conn, &row)).await
  }

  pub async fn record_legacy_market_research(&self, row: LegacyMarketResearch) -> Result<()> {
    self.ensure_schema().await?;
    self.call(move |conn| legacy::upsert_market_research(conn, &row)).await
  }
}

// ─── SurveyStore impl ────────────────────────────────────────────────────────

impl SurveyStore for SqliteStore {
  type Error = Error;

  async fn ensure_schema(&self) -> Result<()> {
    self
      .schema
      .get_or_try_init(|| async {
        self
          .conn
          .call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
          })
          .await
          .map_err(Error::from)
      })
      .await?;
    Ok(())
  }

  // ── Surveys ───────────────────────────────────────────────────────────────

  async fn import_survey(
    &self,
    bank: AssessmentData,
    source: String,
    name: String,
  ) -> Result<ImportSummary> {
    self.import_bank(bank, source, name).await
  }

  async fn active_survey(&self, options: ReadOptions) -> Result<Option<Arc<SurveyDefinition>>> {
    self.resolve_active(options).await
  }

  async fn survey_by_id(
    &self,
    survey_id: Uuid,
    use_cache: bool,
  ) -> Result<Option<Arc<SurveyDefinition>>> {
    self.ensure_schema().await?;
    self.read_survey(SurveyKey::Id(survey_id), use_cache).await
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn create_submission(&self, mut input: NewSubmission) -> Result<SubmissionCreated> {
    let answer = ScreeningAnswer::parse(&input.screening_answer)?;
    input.answers.retain(|_, level| scoring::MATURITY_LEVELS.contains(level));

    let definition = self
      .resolve_active(ReadOptions::default())
      .await?
      .ok_or(maturity_core::Error::NoActiveSurvey)?;
    let question = definition
      .screening_question()
      .ok_or(maturity_core::Error::MissingScreeningQuestion)?;
    let option = question
      .find_option_by_value(answer.as_str())
      .ok_or_else(|| maturity_core::Error::InvalidScreeningOption(answer.as_str().to_owned()))?;

    let result = scoring::score(&input.answers, &definition.assessment)?;
    let write = AssessmentWrite {
      submission_id: Uuid::new_v4(),
      session_id:    input.session_id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
      screening:     submit::screening_answer(question, Some(option), answer),
      input,
      result,
    };

    let created = SubmissionCreated {
      submission_id: write.submission_id,
      survey_id:     definition.survey_id(),
      session_id:    write.session_id.clone(),
      result:        write.result.clone(),
    };
    let now = encode_dt(Utc::now());
    self
      .transaction(move |tx| submit::write_assessment(tx, &definition, &write, &now))
      .await?;

    info!(
      submission_id = %created.submission_id,
      survey_id = %created.survey_id,
      overall = created.result.overall_score,
      "recorded assessment"
    );
    Ok(created)
  }

  async fn update_market_research(
    &self,
    submission_id: Uuid,
    mut responses: BTreeMap<String, MarketResearchResponse>,
  ) -> Result<usize> {
    responses.retain(|key, _| submission::is_market_research_key(key));
    if responses.is_empty() {
      return Ok(0);
    }
    self.ensure_schema().await?;

    let survey_id = self
      .call(move |conn| submit::submission_survey_id(conn, submission_id))
      .await?
      .ok_or(maturity_core::Error::SubmissionNotFound(submission_id))?;
    let definition = self
      .read_survey(SurveyKey::Id(survey_id), true)
      .await?
      .ok_or(maturity_core::Error::SurveyNotFound(survey_id))?;

    let touched = responses.len();
    let now = encode_dt(Utc::now());
    self
      .transaction(move |tx| {
        if submit::submission_survey_id(tx, submission_id)?.is_none() {
          return Err(maturity_core::Error::SubmissionNotFound(submission_id).into());
        }
        submit::write_market_research(tx, &definition, submission_id, &responses, &now)
      })
      .await?;

    debug!(%submission_id, touched, "recorded market research");
    Ok(touched)
  }

  async fn update_email(&self, submission_id: Uuid, email: String) -> Result<()> {
    let email = submission::validate_email(&email)?;
    self.ensure_schema().await?;

    let now = encode_dt(Utc::now());
    let updated = self
      .call(move |conn| submit::set_email(conn, submission_id, &email, &now))
      .await?;
    if !updated {
      return Err(maturity_core::Error::SubmissionNotFound(submission_id).into());
    }
    debug!(%submission_id, "recorded email");
    Ok(())
  }

  async fn submission_record(&self, submission_id: Uuid) -> Result<Option<SubmissionRecord>> {
    self.ensure_schema().await?;
    self.call(move |conn| submit::load_record(conn, submission_id)).await
  }

  // ── Migration ─────────────────────────────────────────────────────────────

  async fn backfill(&self) -> Result<BackfillReport> {
    let definition = self
      .resolve_active(ReadOptions { bootstrap_from_bundled: true, use_cache: false })
      .await?
      .ok_or(maturity_core::Error::NoActiveSurvey)?;
    let survey_id = definition.survey_id();
    let survey_version = definition.version_number();

    let now = encode_dt(Utc::now());
    let counts = self
      .transaction(move |tx| backfill::backfill_rows(tx, &definition, &now))
      .await?;
    let validation = self.call(move |conn| backfill::validate(conn, survey_id)).await?;

    let report = BackfillReport {
      survey_id,
      survey_version,
      submission_rows_backfilled: counts.submissions,
      market_rows_backfilled: counts.market_answers,
      validation,
    };
    info!(
      %survey_id,
      survey_version,
      submissions = report.submission_rows_backfilled,
      market_rows = report.market_rows_backfilled,
      missing = report.validation.missing_submission_count,
      mismatches = report.validation.random_spot_check_mismatches,
      "backfill complete"
    );
    Ok(report)
  }
}
