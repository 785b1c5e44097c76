//! Runtime configuration: an optional TOML file layered with `MATURITY_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

pub const DEFAULT_RESULTS_TO_EMAIL: &str = "results@example.com";
pub const DEFAULT_RESULTS_FROM_EMAIL: &str = "AI Native Engineering <onboarding@resend.dev>";

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:               String,
  #[serde(default = "default_port")]
  pub port:               u16,
  #[serde(default = "default_store_path")]
  pub store_path:         PathBuf,
  /// Summaries are only logged when unset.
  #[serde(default)]
  pub resend_api_key:     Option<String>,
  #[serde(default = "default_results_to_email")]
  pub results_to_email:   String,
  #[serde(default = "default_results_from_email")]
  pub results_from_email: String,
  /// Question bank used by `import` instead of the bundled one.
  #[serde(default)]
  pub question_bank:      Option<PathBuf>,
  #[serde(default)]
  pub secure_cookies:     bool,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 3000 }

fn default_store_path() -> PathBuf { PathBuf::from("maturity.db") }

fn default_results_to_email() -> String { DEFAULT_RESULTS_TO_EMAIL.to_owned() }

fn default_results_from_email() -> String { DEFAULT_RESULTS_FROM_EMAIL.to_owned() }

impl ServerConfig {
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("MATURITY"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    cfg.question_bank = cfg.question_bank.as_deref().map(expand_tilde);
    Ok(cfg)
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
