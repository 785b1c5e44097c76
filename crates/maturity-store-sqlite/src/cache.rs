//! Short-lived cache of assembled survey definitions.
//!
//! Entries are keyed by "the active survey" and by survey id. Concurrent
//! misses on the same key share one load. Every entry records the cache
//! generation its load started in; an entry older than the latest
//! [`SurveyCache::invalidate_all`] is discarded and reloaded, so a load racing
//! an import never outlives it.

use std::{
  future::Future,
  sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
  },
  time::Duration,
};

use maturity_core::survey::SurveyDefinition;
use moka::future::Cache;
use uuid::Uuid;

use crate::{Error, Result};

pub const SURVEY_CACHE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurveyKey {
  Active,
  Id(Uuid),
}

#[derive(Clone)]
struct Entry {
  generation: u64,
  definition: Arc<SurveyDefinition>,
}

#[derive(Clone)]
pub struct SurveyCache {
  inner:      Cache<SurveyKey, Entry>,
  generation: Arc<AtomicU64>,
}

impl SurveyCache {
  pub fn new(ttl: Duration) -> Self {
    Self {
      inner:      Cache::builder().max_capacity(64).time_to_live(ttl).build(),
      generation: Arc::new(AtomicU64::new(0)),
    }
  }

  /// Return the cached definition for `key`, loading it with `load` on a
  /// miss. A load that finds nothing is not cached.
  pub async fn get_or_load<F, Fut>(
    &self,
    key: SurveyKey,
    load: F,
  ) -> Result<Option<Arc<SurveyDefinition>>>
  where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Option<SurveyDefinition>>>,
  {
    loop {
      let generation = self.generation.load(Ordering::Acquire);
      let loaded = self
        .inner
        .try_get_with(key, async {
          match load().await? {
            Some(definition) => Ok(Entry { generation, definition: Arc::new(definition) }),
            None => Err(Error::Core(match key {
              SurveyKey::Active => maturity_core::Error::NoActiveSurvey,
              SurveyKey::Id(id) => maturity_core::Error::SurveyNotFound(id),
            })),
          }
        })
        .await;

      match loaded {
        Ok(entry) if entry.generation == self.generation.load(Ordering::Acquire) => {
          return Ok(Some(entry.definition));
        }
        Ok(_) => self.inner.invalidate(&key).await,
        Err(err) if is_absent(&err) => return Ok(None),
        Err(err) => return Err(Error::Shared(err)),
      }
    }
  }

  /// Drop every entry, and every load still in flight. Called after each
  /// successful import.
  pub fn invalidate_all(&self) {
    self.generation.fetch_add(1, Ordering::AcqRel);
    self.inner.invalidate_all();
  }
}

fn is_absent(err: &Error) -> bool {
  matches!(
    err,
    Error::Core(maturity_core::Error::NoActiveSurvey | maturity_core::Error::SurveyNotFound(_))
  )
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::AtomicU32;

  use chrono::Utc;
  use maturity_core::{
    assessment::AssessmentData,
    survey::{SurveyHeader, SurveyMetadata, SurveyStatus},
  };
  use tokio::sync::Notify;

  use super::*;

  fn definition(version_number: u32) -> SurveyDefinition {
    let header = SurveyHeader {
      survey_id: Uuid::new_v4(),
      version_number,
      name: "test".into(),
      status: SurveyStatus::Active,
      source: "test".into(),
      source_checksum: String::new(),
      created_at: Utc::now(),
      activated_at: None,
      metadata: SurveyMetadata::default(),
    };
    SurveyDefinition::assemble(header, Vec::new(), &AssessmentData::bundled().unwrap())
  }

  #[tokio::test]
  async fn hits_skip_the_loader() {
    let cache = SurveyCache::new(SURVEY_CACHE_TTL);
    let calls = AtomicU32::new(0);
    let load = || {
      calls.fetch_add(1, Ordering::SeqCst);
      async { Ok(Some(definition(1))) }
    };
    cache.get_or_load(SurveyKey::Active, load).await.unwrap();
    cache.get_or_load(SurveyKey::Active, load).await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn absent_results_are_not_cached() {
    let cache = SurveyCache::new(SURVEY_CACHE_TTL);
    let found = cache.get_or_load(SurveyKey::Active, || async { Ok(None) }).await.unwrap();
    assert!(found.is_none());
    let found =
      cache.get_or_load(SurveyKey::Active, || async { Ok(Some(definition(1))) }).await.unwrap();
    assert_eq!(found.unwrap().version_number(), 1);
  }

  #[tokio::test]
  async fn load_started_before_invalidation_is_reloaded() {
    let cache = SurveyCache::new(SURVEY_CACHE_TTL);
    let gate = Arc::new(Notify::new());
    let calls = Arc::new(AtomicU32::new(0));

    let pending = {
      let (cache, gate, calls) = (cache.clone(), Arc::clone(&gate), Arc::clone(&calls));
      tokio::spawn(async move {
        cache
          .get_or_load(SurveyKey::Active, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            let gate = Arc::clone(&gate);
            async move {
              if attempt == 1 {
                gate.notified().await;
              }
              Ok(Some(definition(attempt)))
            }
          })
          .await
      })
    };

    while calls.load(Ordering::SeqCst) == 0 {
      tokio::task::yield_now().await;
    }
    // An import commits while the first load is still reading.
    cache.invalidate_all();
    gate.notify_one();

    let loaded = pending.await.unwrap().unwrap().unwrap();
    assert_eq!(loaded.version_number(), 2);

    let cached =
      cache.get_or_load(SurveyKey::Active, || async { Ok(Some(definition(99))) }).await.unwrap();
    assert_eq!(cached.unwrap().version_number(), 2);
  }
}
