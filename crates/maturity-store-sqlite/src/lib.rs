//! SQLite backend for the maturity survey store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Multi-statement writes run inside a
//! single rusqlite transaction per call.

mod backfill;
mod cache;
mod encode;
mod import;
mod legacy;
mod read;
mod schema;
mod store;
mod submit;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
