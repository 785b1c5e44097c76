//! `maturity`: assessment API server and survey maintenance commands.
//!
//! Reads `maturity.toml` (or the path given with `--config`) layered with
//! `MATURITY_*` environment variables, and opens an in-process SQLite store.
//!
//! ```text
//! maturity serve
//! maturity import --file questions.json --name "Spring refresh"
//! maturity backfill
//! ```

mod config;
mod notifier;

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use axum::Router;
use clap::{Parser, Subcommand};
use maturity_api::ApiOptions;
use maturity_core::{
  assessment::AssessmentData,
  store::{ReadOptions, SurveyStore},
};
use maturity_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;

use crate::{config::ServerConfig, notifier::SummaryNotifier};

#[derive(Parser)]
#[command(author, version, about = "AI-native engineering maturity assessment")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "maturity.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
  /// Serve the HTTP API (default).
  Serve,
  /// Import a question bank as the new active survey version.
  Import {
    /// Question bank JSON; defaults to `question_bank` from the config, then
    /// the bundled bank.
    #[arg(short, long)]
    file: Option<PathBuf>,
    /// Display name of the new version.
    #[arg(short, long, default_value = "AI-Native Engineering Maturity Assessment")]
    name: String,
  },
  /// Copy legacy assessment rows into the normalized tables.
  Backfill,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = ServerConfig::load(&cli.config)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command.unwrap_or(Command::Serve) {
    Command::Serve => serve(cfg, store).await,
    Command::Import { file, name } => import(&cfg, &store, file, name).await,
    Command::Backfill => {
      let report = store.backfill().await.context("backfill failed")?;
      println!("{}", serde_json::to_string_pretty(&report)?);
      Ok(())
    }
  }
}

async fn serve(cfg: ServerConfig, store: SqliteStore) -> anyhow::Result<()> {
  let active = store
    .active_survey(ReadOptions::default())
    .await
    .context("failed to load the active survey")?;
  if let Some(definition) = active {
    info!(
      survey_id = %definition.survey_id(),
      version = definition.version_number(),
      "active survey"
    );
  }

  let notifier = SummaryNotifier::from_config(&cfg).context("failed to build HTTP client")?;
  if matches!(notifier, SummaryNotifier::Log) {
    info!("no resend_api_key configured; submission summaries will only be logged");
  }

  let api = maturity_api::api_router(
    Arc::new(store),
    Arc::new(notifier),
    ApiOptions { secure_cookies: cfg.secure_cookies },
  );
  let app = Router::new().nest("/api", api).layer(TraceLayer::new_for_http());

  let address = format!("{}:{}", cfg.host, cfg.port);
  info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn import(
  cfg: &ServerConfig,
  store: &SqliteStore,
  file: Option<PathBuf>,
  name: String,
) -> anyhow::Result<()> {
  let (bank, source) = match file.or_else(|| cfg.question_bank.clone()) {
    Some(path) => {
      let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("reading question bank {}", path.display()))?;
      let bank = AssessmentData::from_json(&raw)
        .with_context(|| format!("parsing question bank {}", path.display()))?;
      (bank, path.display().to_string())
    }
    None => (AssessmentData::bundled()?, "questions.json".to_owned()),
  };

  let summary = store
    .import_survey(bank, source, name)
    .await
    .context("import failed")?;
  println!("{}", serde_json::to_string_pretty(&summary)?);
  Ok(())
}
