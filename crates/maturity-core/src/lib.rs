//! Core types and trait definitions for the maturity assessment store.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Every other crate depends on it: the question bank format, survey
//! definitions, scoring, submission types and the [`store::SurveyStore`]
//! abstraction all live here.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod assessment;
pub mod error;
pub mod legacy;
pub mod notify;
pub mod scoring;
pub mod store;
pub mod submission;
pub mod survey;

pub use error::{Error, Result};
