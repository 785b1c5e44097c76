//! The two tracking cookies set by `/submit`.

use axum::http::{HeaderMap, header::COOKIE};

use crate::ApiOptions;

pub const ASSESSMENT_ID: &str = "assessment_id";
pub const SESSION_ID: &str = "assessment_session_id";

const ASSESSMENT_MAX_AGE: u64 = 60 * 60 * 24 * 30;
const SESSION_MAX_AGE: u64 = 60 * 60 * 24 * 365;

/// The value of cookie `name` in the request, if present and non-empty.
pub fn read(headers: &HeaderMap, name: &str) -> Option<String> {
  headers
    .get_all(COOKIE)
    .iter()
    .filter_map(|value| value.to_str().ok())
    .flat_map(|value| value.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .find(|(key, _)| *key == name)
    .map(|(_, value)| value.trim().to_owned())
    .filter(|value| !value.is_empty())
}

fn set_cookie(name: &str, value: &str, max_age: u64, options: ApiOptions) -> String {
  let secure = if options.secure_cookies { "; Secure" } else { "" };
  format!("{name}={value}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Lax{secure}")
}

pub fn assessment(submission_id: &str, options: ApiOptions) -> String {
  set_cookie(ASSESSMENT_ID, submission_id, ASSESSMENT_MAX_AGE, options)
}

pub fn session(session_id: &str, options: ApiOptions) -> String {
  set_cookie(SESSION_ID, session_id, SESSION_MAX_AGE, options)
}
