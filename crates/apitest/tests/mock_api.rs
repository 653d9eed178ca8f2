//! Harness behavior against an in-process mock of the API
//!
//! These tests exercise the token acquisition gate, resource tracking
//! with double-delete semantics, and the permission status classes
//! without a live backend.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use thesistrack_apitest::report::SuiteKind;
use thesistrack_apitest::setup::SeedData;
use thesistrack_apitest::suites::{self, SuiteCx};
use thesistrack_apitest::{auth, HarnessRunner, ResourceKind, ResourceTracker};
use thesistrack_common::{ApiClient, HarnessConfig, Role};

const ALL_ACCOUNTS: [&str; 4] = [
    "student@uni.edu",
    "professor@uni.edu",
    "admin@uni.edu",
    "president@uni.edu",
];

#[derive(Default)]
struct MockState {
    /// Usernames whose login is rejected, to exercise partial and
    /// empty token maps
    rejected_users: HashSet<String>,
    /// Let students list tribunals, simulating a broken authorization
    /// layer; permission-negative tests must then record a failure
    lenient_tribunals: bool,
    next_id: AtomicU64,
    deleted: Mutex<HashSet<u64>>,
}

type Shared = Arc<MockState>;

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let username = body["username"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();
    let known = username.ends_with("@uni.edu") && username != "nobody@uni.edu";
    if state.rejected_users.contains(username) || !known || password != "123456" {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid credentials."})),
        );
    }
    let short = username.split('@').next().unwrap_or(username);
    (
        StatusCode::OK,
        Json(json!({
            "token": format!("tok-{short}"),
            "refresh_token": format!("refresh-{short}"),
        })),
    )
}

async fn refresh(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    match body["refresh_token"].as_str() {
        Some(r) if r.starts_with("refresh-") => {
            (StatusCode::OK, Json(json!({"token": "tok-refreshed"})))
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Invalid refresh token."})),
        ),
    }
}

async fn create_submission(State(state): State<Shared>) -> (StatusCode, Json<Value>) {
    let id = state.next_id.fetch_add(1, Ordering::SeqCst) + 1;
    (StatusCode::CREATED, Json(json!({"id": id})))
}

async fn delete_submission(State(state): State<Shared>, Path(id): Path<u64>) -> Response {
    let mut deleted = state.deleted.lock().unwrap();
    if deleted.insert(id) {
        StatusCode::NO_CONTENT.into_response()
    } else {
        (StatusCode::NOT_FOUND, Json(json!({"message": "Not found"}))).into_response()
    }
}

async fn list_tribunals(
    State(state): State<Shared>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));
    match bearer {
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "JWT token not found"})),
        ),
        Some("tok-student") if !state.lenient_tribunals => (
            StatusCode::FORBIDDEN,
            Json(json!({"message": "Access denied"})),
        ),
        Some(_) => (StatusCode::OK, Json(json!({"data": []}))),
    }
}

/// Creation endpoint that violates the contract: 201 without an id
async fn create_defense_without_id() -> (StatusCode, Json<Value>) {
    (StatusCode::CREATED, Json(json!({"status": "scheduled"})))
}

/// Serve the mock on an ephemeral port; returns a config pointing at it
async fn spawn_mock(rejected_users: &[&str]) -> (HarnessConfig, tempfile::TempDir) {
    spawn_mock_with(MockState {
        rejected_users: rejected_users.iter().map(|u| u.to_string()).collect(),
        ..Default::default()
    })
    .await
}

async fn spawn_mock_with(state: MockState) -> (HarnessConfig, tempfile::TempDir) {
    let state = Arc::new(state);
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/submissions", post(create_submission))
        .route("/api/submissions/:id", delete(delete_submission))
        .route("/api/tribunals", get(list_tribunals))
        .route("/api/defenses", post(create_defense_without_id))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let dir = tempfile::tempdir().unwrap();
    let config = HarnessConfig {
        base_url: format!("http://{addr}"),
        report_dir: dir.path().to_path_buf(),
        state_dir: dir.path().to_path_buf(),
        ..Default::default()
    };
    (config, dir)
}

#[tokio::test]
async fn test_acquire_builds_token_per_role() {
    let (config, _dir) = spawn_mock(&[]).await;
    let client = ApiClient::new(&config).unwrap();

    let (tokens, report) = auth::acquire(&client, &config).await;

    assert_eq!(tokens.len(), 4);
    assert_eq!(tokens.bearer(Role::Student), Some("tok-student"));
    assert_eq!(tokens.bearer(Role::Admin), Some("tok-admin"));
    assert_eq!(tokens.refresh_token(Role::Student), Some("refresh-student"));
    // 4 logins + invalid-credentials probe + refresh, all green
    assert_eq!(report.total(), 6);
    assert_eq!(report.passed(), 6);
}

#[tokio::test]
async fn test_acquire_with_one_failing_role_keeps_the_rest() {
    let (config, _dir) = spawn_mock(&["professor@uni.edu"]).await;
    let client = ApiClient::new(&config).unwrap();

    let (tokens, report) = auth::acquire(&client, &config).await;

    // One role down must not block the other three
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens.bearer(Role::Professor), None);
    assert_eq!(tokens.bearer(Role::Admin), Some("tok-admin"));
    assert_eq!(report.passed(), 5);
    assert_eq!(report.total(), 6);
}

#[tokio::test]
async fn test_acquire_with_rejecting_backend_yields_empty_map() {
    let (config, _dir) = spawn_mock(&ALL_ACCOUNTS).await;
    let client = ApiClient::new(&config).unwrap();

    let (tokens, report) = auth::acquire(&client, &config).await;

    assert!(tokens.is_empty());
    // The invalid-credentials probe still passes; every login fails,
    // and the refresh test fails for lack of a refresh token.
    assert_eq!(report.passed(), 1);
    assert_eq!(report.total(), 6);
}

#[tokio::test]
async fn test_cleanup_deletes_once_then_reports_absent() {
    let (config, _dir) = spawn_mock(&[]).await;
    let client = ApiClient::new(&config).unwrap();

    let resp = client
        .post_json("/api/submissions", &json!({}), Some("tok-admin"))
        .await
        .unwrap();
    assert_eq!(resp.status.as_u16(), 201);
    let id = resp.created_id().unwrap();

    let mut tracker = ResourceTracker::new();
    tracker.record(ResourceKind::Submission, id);

    let first = tracker.cleanup(&client, Some("tok-admin")).await;
    assert_eq!(first.deleted, 1);
    assert_eq!(first.failed, 0);

    // A second pass over the same tracker must treat the resource as gone
    let second = tracker.cleanup(&client, Some("tok-admin")).await;
    assert_eq!(second.deleted, 0);
    assert_eq!(second.already_absent, 1);
    assert_eq!(second.failed, 0);
}

#[tokio::test]
async fn test_cleanup_without_admin_token_fails_all() {
    let (config, _dir) = spawn_mock(&[]).await;
    let client = ApiClient::new(&config).unwrap();

    let mut tracker = ResourceTracker::new();
    tracker.record(ResourceKind::Submission, 12);
    tracker.record(ResourceKind::Tribunal, 34);

    let stats = tracker.cleanup(&client, None).await;
    assert_eq!(stats.deleted, 0);
    assert_eq!(stats.failed, 2);
}

#[tokio::test]
async fn test_run_with_no_tokens_aborts_before_any_suite() {
    let (config, _dir) = spawn_mock(&ALL_ACCOUNTS).await;
    let report_dir = config.report_dir.clone();
    let runner = HarnessRunner::new(config).unwrap();

    let report = runner.run().await.unwrap();

    assert!(report.aborted);
    assert!(!report.success());
    assert_eq!(report.suites.len(), 1);
    assert_eq!(report.suites[0].suite, SuiteKind::Auth);

    // The aborted run still persists its report
    let written = std::fs::read_dir(&report_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.file_name()
                .to_string_lossy()
                .starts_with("thesistrack_report_")
        })
        .count();
    assert_eq!(written, 1);
}

#[tokio::test]
async fn test_forbidden_listing_accepted_with_200_is_a_failure() {
    let (config, _dir) = spawn_mock_with(MockState {
        lenient_tribunals: true,
        ..Default::default()
    })
    .await;
    let client = ApiClient::new(&config).unwrap();
    let (tokens, _) = auth::acquire(&client, &config).await;

    let cx = SuiteCx::new(&client, &tokens, &config);
    let (report, _tracker) = suites::tribunals::run(cx).await;

    let forbidden = report
        .results
        .iter()
        .find(|r| r.name == "list tribunals as student (forbidden)")
        .expect("permission-negative case is recorded");
    assert!(!forbidden.passed, "a 200 must fail the permission-negative test");

    let admin = report
        .results
        .iter()
        .find(|r| r.name == "list tribunals as admin")
        .unwrap();
    assert!(admin.passed);
}

#[tokio::test]
async fn test_conflict_check_fails_when_creation_has_no_id() {
    let (config, _dir) = spawn_mock(&[]).await;
    let client = ApiClient::new(&config).unwrap();
    let (tokens, _) = auth::acquire(&client, &config).await;

    let seed = SeedData {
        submission_id: 1,
        tribunal_id: 1,
    };
    let cx = SuiteCx::new(&client, &tokens, &config);
    let (report, tracker) = suites::defenses::run(cx, Some(seed)).await;

    // The mock answers 201 without an id; nothing may be tracked and
    // the conflict test must record the contract violation
    let conflict = report
        .results
        .iter()
        .find(|r| r.name == "schedule two defenses in the same slot")
        .unwrap();
    assert!(!conflict.passed);
    assert_eq!(conflict.detail, "201 without a numeric id");
    assert!(tracker.is_empty());
}

#[tokio::test]
async fn test_role_gated_listing_status_classes() {
    let (config, _dir) = spawn_mock(&[]).await;
    let client = ApiClient::new(&config).unwrap();

    let anonymous = client.get("/api/tribunals", None).await.unwrap();
    assert_eq!(anonymous.status.as_u16(), 401);

    let student = client
        .get("/api/tribunals", Some("tok-student"))
        .await
        .unwrap();
    assert_eq!(student.status.as_u16(), 403);

    let admin = client
        .get("/api/tribunals", Some("tok-admin"))
        .await
        .unwrap();
    assert!(admin.is_success());
}
