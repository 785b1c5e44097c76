//! Router tests against an in-memory `SqliteStore`.

use std::{
  convert::Infallible,
  sync::{Arc, Mutex},
};

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode, header},
  response::Response,
};
use maturity_core::{
  notify::{Notification, Notifier},
  store::SurveyStore,
  submission::ScoreScope,
};
use maturity_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiOptions, api_router};

#[derive(Default)]
struct RecordingNotifier {
  sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
  fn subjects(&self) -> Vec<String> {
    self.sent.lock().unwrap().iter().map(|n| n.subject.clone()).collect()
  }
}

impl Notifier for RecordingNotifier {
  type Error = Infallible;

  async fn send(&self, notification: Notification) -> Result<(), Infallible> {
    self.sent.lock().unwrap().push(notification);
    Ok(())
  }
}

/// A sink whose every delivery fails.
struct FailingNotifier;

impl Notifier for FailingNotifier {
  type Error = std::io::Error;

  async fn send(&self, _notification: Notification) -> Result<(), std::io::Error> {
    Err(std::io::Error::other("mail relay unavailable"))
  }
}

async fn app() -> (Router, Arc<RecordingNotifier>) {
  let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
  let notifier = Arc::new(RecordingNotifier::default());
  (api_router(store, Arc::clone(&notifier), ApiOptions::default()), notifier)
}

fn request(method: Method, uri: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method(method)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> Response {
  app.clone().oneshot(req).await.unwrap()
}

async fn json_body(response: Response) -> Value {
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  serde_json::from_slice(&bytes).unwrap()
}

fn set_cookies(response: &Response) -> Vec<String> {
  response
    .headers()
    .get_all(header::SET_COOKIE)
    .iter()
    .map(|v| v.to_str().unwrap().to_owned())
    .collect()
}

async fn submit_assessment(app: &Router) -> String {
  let response = send(
    app,
    request(Method::POST, "/submit", json!({ "screening_answer": "yes", "answers": { "Q1": 3 } })),
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  json_body(response).await["submissionId"].as_str().unwrap().to_owned()
}

// ─── Survey ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn active_survey_bootstraps_and_describes_version() {
  let (app, _) = app().await;
  let response = send(&app, Request::get("/survey/active").body(Body::empty()).unwrap()).await;
  assert_eq!(response.status(), StatusCode::OK);

  let body = json_body(response).await;
  assert_eq!(body["survey"]["versionNumber"], 1);
  assert_eq!(body["survey"]["status"], "active");
  assert!(body["survey"]["sourceChecksum"].as_str().is_some_and(|c| c.len() == 64));
  assert_eq!(body["data"]["screening"]["id"], "S1");
  assert_eq!(body["data"]["maturityQuestions"].as_array().unwrap().len(), 14);
}

// ─── Score ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn score_returns_result_without_persisting() {
  let (app, notifier) = app().await;
  let response =
    send(&app, request(Method::POST, "/score", json!({ "answers": { "Q1": 5, "Q2": 5 } }))).await;
  assert_eq!(response.status(), StatusCode::OK);

  let body = json_body(response).await;
  assert_eq!(body["overallScore"], 14);
  assert_eq!(body["capabilityScores"][0]["id"], "specs");
  assert_eq!(body["capabilityScores"][0]["score"], 100);
  assert!(notifier.subjects().is_empty());
}

#[tokio::test]
async fn score_requires_answers_object() {
  let (app, _) = app().await;
  let response = send(&app, request(Method::POST, "/score", json!({ "answers": [1, 2] }))).await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(response).await["error"], "Missing or invalid answers");
}

// ─── Submit ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn post_submit_sets_cookies_and_notifies() {
  let (app, notifier) = app().await;
  let response = send(
    &app,
    request(Method::POST, "/submit", json!({ "screening_answer": "yes", "answers": { "Q1": 4 } })),
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);

  let cookies = set_cookies(&response);
  assert_eq!(cookies.len(), 2);
  assert!(cookies[0].starts_with("assessment_id="));
  assert!(cookies[1].starts_with("assessment_session_id="));
  assert!(cookies.iter().all(|c| c.contains("HttpOnly") && c.contains("SameSite=Lax")));

  let body = json_body(response).await;
  assert_eq!(body["ok"], true);
  assert_eq!(body["submissionId"], body["assessmentId"]);
  let id = body["submissionId"].as_str().unwrap();
  assert_eq!(notifier.subjects(), vec![format!("Assessment submission: {id}")]);
}

#[tokio::test]
async fn post_submit_reuses_session_cookie() {
  let (app, _) = app().await;
  let req = Request::builder()
    .method(Method::POST)
    .uri("/submit")
    .header(header::COOKIE, "assessment_session_id=returning-visitor")
    .body(Body::from(json!({ "screening_answer": "no" }).to_string()))
    .unwrap();
  let response = send(&app, req).await;
  assert_eq!(response.status(), StatusCode::OK);
  assert!(
    set_cookies(&response)
      .iter()
      .any(|c| c.starts_with("assessment_session_id=returning-visitor;"))
  );
}

#[tokio::test]
async fn post_submit_rejects_bad_screening_answer() {
  let (app, notifier) = app().await;
  let response =
    send(&app, request(Method::POST, "/submit", json!({ "screening_answer": "maybe" }))).await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert!(json_body(response).await["error"].as_str().unwrap().contains("'yes' or 'no'"));
  assert!(notifier.subjects().is_empty());
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
  let (app, _) = app().await;
  let req = Request::builder()
    .method(Method::PATCH)
    .uri("/submit")
    .body(Body::from("{not json"))
    .unwrap();
  let response = send(&app, req).await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(response).await["error"], "Invalid JSON payload");
}

#[tokio::test]
async fn put_submit_records_market_research() {
  let (app, notifier) = app().await;
  let id = submit_assessment(&app).await;

  let response = send(
    &app,
    request(
      Method::PUT,
      "/submit",
      json!({
        "assessmentId": id,
        "marketResearch": { "M1": { "selected": ["Cursor"] }, "M5": { "text": "flaky" }, "X1": {} }
      }),
    ),
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(set_cookies(&response).len(), 1);

  let body = json_body(response).await;
  assert_eq!(body["questionCount"], 2);
  assert_eq!(body["assessmentId"], id.as_str());
  assert_eq!(notifier.subjects().len(), 2);
  assert_eq!(notifier.subjects()[1], format!("Market research submission: {id}"));
}

#[tokio::test]
async fn put_submit_reads_id_from_cookie() {
  let (app, _) = app().await;
  let id = submit_assessment(&app).await;

  let req = Request::builder()
    .method(Method::PUT)
    .uri("/submit")
    .header(header::COOKIE, format!("assessment_id={id}"))
    .body(Body::from(json!({ "marketResearch": { "M2": { "selected": "2-10" } } }).to_string()))
    .unwrap();
  let response = send(&app, req).await;
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(json_body(response).await["questionCount"], 1);
}

#[tokio::test]
async fn put_submit_validates_payload() {
  let (app, _) = app().await;

  let response = send(&app, request(Method::PUT, "/submit", json!({ "marketResearch": {} }))).await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(response).await["error"], "Missing assessmentId");

  let id = submit_assessment(&app).await;
  let response = send(
    &app,
    request(Method::PUT, "/submit", json!({ "assessmentId": id, "marketResearch": "M1" })),
  )
  .await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
  assert_eq!(json_body(response).await["error"], "marketResearch must be an object");
}

#[tokio::test]
async fn put_submit_unknown_submission_is_not_found() {
  let (app, _) = app().await;
  let response = send(
    &app,
    request(
      Method::PUT,
      "/submit",
      json!({
        "assessment_id": "00000000-0000-0000-0000-000000000000",
        "marketResearch": { "M1": { "selected": ["Cursor"] } }
      }),
    ),
  )
  .await;
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn put_submit_without_market_keys_skips_lookup() {
  let (app, notifier) = app().await;
  let response = send(
    &app,
    request(
      Method::PUT,
      "/submit",
      json!({ "assessmentId": "not-a-uuid", "marketResearch": { "X1": {} } }),
    ),
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  assert!(set_cookies(&response)[0].starts_with("assessment_id=not-a-uuid;"));

  let body = json_body(response).await;
  assert_eq!(body["questionCount"], 0);
  assert_eq!(body["submissionId"], "not-a-uuid");
  assert!(notifier.subjects().is_empty());
}

#[tokio::test]
async fn put_submit_with_market_keys_and_bad_id_is_not_found() {
  let (app, _) = app().await;
  let response = send(
    &app,
    request(
      Method::PUT,
      "/submit",
      json!({ "assessmentId": "not-a-uuid", "marketResearch": { "M1": { "selected": ["Cursor"] } } }),
    ),
  )
  .await;
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_submit_records_email() {
  let (app, notifier) = app().await;
  let id = submit_assessment(&app).await;

  let response = send(
    &app,
    request(Method::PATCH, "/submit", json!({ "assessmentId": id, "email": " dev@example.com " })),
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(json_body(response).await["ok"], true);
  assert_eq!(notifier.subjects()[1], format!("Email capture submission: {id}"));
  assert!(notifier.sent.lock().unwrap()[1].text_body.contains("dev@example.com"));
}

#[tokio::test]
async fn patch_submit_rejects_invalid_email() {
  let (app, _) = app().await;
  let id = submit_assessment(&app).await;
  let response = send(
    &app,
    request(Method::PATCH, "/submit", json!({ "assessmentId": id, "email": "nope" })),
  )
  .await;
  assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn patch_submit_unknown_submission_is_not_found() {
  let (app, notifier) = app().await;
  let response = send(
    &app,
    request(
      Method::PATCH,
      "/submit",
      json!({ "assessmentId": uuid::Uuid::new_v4(), "email": "dev@example.com" }),
    ),
  )
  .await;
  assert_eq!(response.status(), StatusCode::NOT_FOUND);
  assert!(notifier.subjects().is_empty());
}

// ─── Notification failures ───────────────────────────────────────────────────

#[tokio::test]
async fn failed_notifications_do_not_fail_writes() {
  let store = Arc::new(SqliteStore::open_in_memory().await.expect("in-memory store"));
  let app = api_router(Arc::clone(&store), Arc::new(FailingNotifier), ApiOptions::default());

  let response = send(
    &app,
    request(Method::POST, "/submit", json!({ "screening_answer": "yes", "answers": { "Q1": 3 } })),
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);
  assert_eq!(set_cookies(&response).len(), 2);
  let id = json_body(response).await["submissionId"].as_str().unwrap().to_owned();
  let submission_id = uuid::Uuid::parse_str(&id).unwrap();

  let response = send(
    &app,
    request(
      Method::PUT,
      "/submit",
      json!({ "assessmentId": id, "marketResearch": { "M1": { "selected": ["Cursor"] } } }),
    ),
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);

  let response = send(
    &app,
    request(Method::PATCH, "/submit", json!({ "assessmentId": id, "email": "dev@example.com" })),
  )
  .await;
  assert_eq!(response.status(), StatusCode::OK);

  let record = store.submission_record(submission_id).await.unwrap().unwrap();
  assert_eq!(record.submission.respondent_email.as_deref(), Some("dev@example.com"));
  assert!(record.answers.iter().any(|a| a.text.as_deref() == Some("Cursor")));
  assert!(record.score(ScoreScope::Question, "Q1").is_some());
}
