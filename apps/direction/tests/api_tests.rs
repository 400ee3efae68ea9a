//! Integration tests for the Direction Companion HTTP API.
//!
//! Uses axum-test to exercise the router without binding a socket.

// Holding the env mutex across awaits is intentional: the auth middleware
// reads DIRECTION_API_KEY per request.
#![allow(clippy::unwrap_used, clippy::panic, clippy::await_holding_lock)]

use axum::http::{HeaderValue, StatusCode, header};
use axum_test::TestServer;
use calamine::{Reader, Xlsx, open_workbook_from_rs};
use direction::api::{
    AppState, CreateReflectionResponse, DiagnosticsResponse, EmailResponse, ErrorResponse,
    HealthResponse, ReflectionResponse, RootResponse, create_router, create_router_with,
};
use direction::config::SecurityConfig;
use direction_core::{Session, guidance};
use serde_json::{Value, json};
use std::sync::Mutex;

/// Serializes tests that read or write process environment variables.
static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

/// Holds the env mutex and clears the API key on drop.
struct TestGuard {
    _guard: std::sync::MutexGuard<'static, ()>,
}

impl Drop for TestGuard {
    fn drop(&mut self) {
        // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
        unsafe { std::env::remove_var("DIRECTION_API_KEY") };
    }
}

fn lock_env() -> TestGuard {
    let guard = ENV_TEST_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::remove_var("DIRECTION_API_KEY") };
    TestGuard { _guard: guard }
}

fn unlimited() -> SecurityConfig {
    SecurityConfig {
        cors_origins: None,
        rate_limit: Some(0),
    }
}

fn server_for(session: Session) -> (TestServer, TestGuard) {
    let guard = lock_env();
    let router = create_router_with(AppState::new(session), &unlimited());
    (TestServer::new(router).unwrap(), guard)
}

fn create_test_server() -> (TestServer, TestGuard) {
    server_for(Session::new())
}

fn example_body() -> Value {
    json!({
        "feeling": "stuck",
        "area": "career",
        "challenge": "no clarity",
        "desired_outcome": "a plan",
        "action_timeline": "this week"
    })
}

async fn create_example(server: &TestServer) -> CreateReflectionResponse {
    let response = server.post("/api/reflections").json(&example_body()).await;
    response.assert_status_ok();
    response.json()
}

const UNKNOWN_ID: &str = "000000000000000000000000";

// =============================================================================
// ROOT / HEALTH / DIAGNOSTICS
// =============================================================================

#[tokio::test]
async fn test_root_message() {
    let (server, _guard) = create_test_server();

    let response = server.get("/").await;

    response.assert_status_ok();
    let root: RootResponse = response.json();
    assert_eq!(root.message, "Direction Companion API is running");
}

#[tokio::test]
async fn test_health_endpoint() {
    let (server, _guard) = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[tokio::test]
async fn test_diagnostics_memory_store() {
    let (server, _guard) = create_test_server();
    create_example(&server).await;

    let response = server.get("/test").await;

    response.assert_status_ok();
    let report: DiagnosticsResponse = response.json();
    assert_eq!(report.backend, "running");
    assert_eq!(report.connection_status, "Connected");
    assert_eq!(report.store, "memory");
    assert_eq!(report.collections, vec!["reflection".to_string()]);
    assert_eq!(report.record_count, Some(1));
}

#[tokio::test]
async fn test_diagnostics_redb_store_reports_location() {
    let temp = tempfile::tempdir().unwrap();
    let session = Session::with_redb(temp.path().join("api.redb")).unwrap();
    let (server, _guard) = server_for(session);

    let report: DiagnosticsResponse = server.get("/test").await.json();

    assert_eq!(report.store, "redb");
    assert_eq!(report.database_name.as_deref(), Some("api"));
    assert!(report.database_path.unwrap().ends_with("api.redb"));
}

#[tokio::test]
async fn test_diagnostics_unavailable_store() {
    let (server, _guard) = server_for(Session::unavailable("connection refused"));

    let response = server.get("/test").await;

    response.assert_status_ok();
    let report: DiagnosticsResponse = response.json();
    assert_eq!(report.connection_status, "Not Connected");
    assert!(report.database.contains("connection refused"));
    assert!(report.collections.is_empty());
}

// =============================================================================
// CREATE
// =============================================================================

#[tokio::test]
async fn test_create_worked_example() {
    let (server, _guard) = create_test_server();

    let created = create_example(&server).await;

    assert_eq!(created.id.len(), 24);
    assert_eq!(
        created.summary.distilled,
        "You're feeling stuck and seeking direction in career. The core block seems to be: \
         no clarity. You hope to come away with: a plan."
    );
    assert_eq!(created.summary.guidance.len(), 3);
    assert_eq!(created.summary.guidance[2], guidance::URGENT_NUDGE);
    assert_eq!(created.summary.message, guidance::REASSURANCE_MESSAGE);
    assert_eq!(created.summary.emailed_to, None);
    assert_eq!(created.summary.feeling, "stuck");
}

#[tokio::test]
async fn test_create_ids_are_unique() {
    let (server, _guard) = create_test_server();

    let first = create_example(&server).await;
    let second = create_example(&server).await;

    assert_ne!(first.id, second.id);
}

#[tokio::test]
async fn test_create_missing_field_rejected() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/reflections")
        .json(&json!({"feeling": "stuck", "area": "career"}))
        .await;

    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_create_oversized_answer_rejected() {
    let (server, _guard) = create_test_server();
    let mut body = example_body();
    body["challenge"] = json!("x".repeat(direction::api::MAX_ANSWER_LENGTH + 1));

    let response = server.post("/api/reflections").json(&body).await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let error: ErrorResponse = response.json();
    assert!(error.detail.contains("challenge"));
}

#[tokio::test]
async fn test_create_without_store_is_500() {
    let (server, _guard) = server_for(Session::unavailable("down"));

    let response = server.post("/api/reflections").json(&example_body()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let error: ErrorResponse = response.json();
    assert!(error.detail.contains("down"));
}

// =============================================================================
// READ
// =============================================================================

#[tokio::test]
async fn test_get_returns_stored_record() {
    let (server, _guard) = create_test_server();
    let created = create_example(&server).await;

    let response = server.get(&format!("/api/reflections/{}", created.id)).await;

    response.assert_status_ok();
    let record: ReflectionResponse = response.json();
    assert_eq!(record.id, created.id);
    assert_eq!(record.summary, created.summary);
    assert!(record.created_at.ends_with('Z'));
    assert_eq!(record.created_at, record.updated_at);
}

#[tokio::test]
async fn test_get_flattens_fields_at_top_level() {
    let (server, _guard) = create_test_server();
    let created = create_example(&server).await;

    let body: Value = server
        .get(&format!("/api/reflections/{}", created.id))
        .await
        .json();

    assert_eq!(body["area"], "career");
    assert!(body["guidance"].is_array());
    assert!(body.get("summary").is_none());
}

#[tokio::test]
async fn test_get_malformed_id_is_400() {
    let (server, _guard) = create_test_server();

    let response = server.get("/api/reflections/123").await;

    response.assert_status_bad_request();
    let error: ErrorResponse = response.json();
    assert!(error.detail.contains("123"));
}

#[tokio::test]
async fn test_get_unknown_id_is_404() {
    let (server, _guard) = create_test_server();

    let response = server.get(&format!("/api/reflections/{}", UNKNOWN_ID)).await;

    response.assert_status_not_found();
}

// =============================================================================
// EMAIL
// =============================================================================

#[tokio::test]
async fn test_email_is_simulated_and_recorded() {
    let (server, _guard) = create_test_server();
    let created = create_example(&server).await;

    let response = server
        .post(&format!("/api/reflections/{}/email", created.id))
        .json(&json!({"email": "me@example.com"}))
        .await;

    response.assert_status_ok();
    let ack: EmailResponse = response.json();
    assert_eq!(ack.status, "queued");
    assert_eq!(ack.message, "Email scheduled (simulated)");
    assert_eq!(ack.to, "me@example.com");

    let record: ReflectionResponse = server
        .get(&format!("/api/reflections/{}", created.id))
        .await
        .json();
    assert_eq!(record.summary.emailed_to.as_deref(), Some("me@example.com"));
    assert_eq!(record.summary.guidance, created.summary.guidance);
}

#[tokio::test]
async fn test_email_invalid_address_is_422() {
    let (server, _guard) = create_test_server();
    let created = create_example(&server).await;

    let response = server
        .post(&format!("/api/reflections/{}/email", created.id))
        .json(&json!({"email": "not-an-email"}))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_email_malformed_id_is_400() {
    let (server, _guard) = create_test_server();

    let response = server
        .post("/api/reflections/nope/email")
        .json(&json!({"email": "me@example.com"}))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_email_unknown_id_is_404() {
    let (server, _guard) = create_test_server();

    let response = server
        .post(&format!("/api/reflections/{}/email", UNKNOWN_ID))
        .json(&json!({"email": "me@example.com"}))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn test_email_without_store_is_400() {
    let (server, _guard) = server_for(Session::unavailable("down"));

    let response = server
        .post(&format!("/api/reflections/{}/email", UNKNOWN_ID))
        .json(&json!({"email": "me@example.com"}))
        .await;

    response.assert_status_bad_request();
}

// =============================================================================
// EXPORT
// =============================================================================

#[tokio::test]
async fn test_export_pdf_by_default() {
    let (server, _guard) = create_test_server();
    let created = create_example(&server).await;

    let response = server
        .get(&format!("/api/reflections/{}/export", created.id))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_TYPE), "application/pdf");
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        format!("attachment; filename=direction-summary-{}.pdf", created.id).as_str()
    );
    assert!(response.as_bytes().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_export_xlsx() {
    let (server, _guard) = create_test_server();
    let created = create_example(&server).await;

    let response = server
        .get(&format!("/api/reflections/{}/export", created.id))
        .add_query_param("format", "xlsx")
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header(header::CONTENT_TYPE),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert_eq!(
        response.header(header::CONTENT_DISPOSITION),
        format!("attachment; filename=direction-summary-{}.xlsx", created.id).as_str()
    );
    assert!(response.as_bytes().starts_with(b"PK"));

    let mut workbook: Xlsx<_> =
        open_workbook_from_rs(std::io::Cursor::new(response.as_bytes().to_vec())).unwrap();
    assert_eq!(workbook.sheet_names(), vec!["Direction Summary".to_string()]);
    let range = workbook.worksheet_range("Direction Summary").unwrap();
    let rows: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(ToString::to_string).collect())
        .collect();
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[0], vec!["Feeling".to_string(), "stuck".to_string()]);
    assert_eq!(rows[5][1], created.summary.distilled);
    let guidance_block: String = created
        .summary
        .guidance
        .iter()
        .map(|g| format!("\n- {}", g))
        .collect();
    assert_eq!(rows[6], vec!["Guidance".to_string(), guidance_block]);
    assert_eq!(rows[7], vec!["Message".to_string(), created.summary.message.clone()]);
}

#[tokio::test]
async fn test_export_unknown_format_falls_back_to_pdf() {
    let (server, _guard) = create_test_server();
    let created = create_example(&server).await;

    let response = server
        .get(&format!("/api/reflections/{}/export", created.id))
        .add_query_param("format", "docx")
        .await;

    response.assert_status_ok();
    assert_eq!(response.header(header::CONTENT_TYPE), "application/pdf");
}

#[tokio::test]
async fn test_export_errors() {
    let (server, _guard) = create_test_server();

    server
        .get("/api/reflections/zzz/export")
        .await
        .assert_status_bad_request();
    server
        .get(&format!("/api/reflections/{}/export", UNKNOWN_ID))
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_export_without_store_is_500() {
    let (server, _guard) = server_for(Session::unavailable("down"));

    let response = server
        .get(&format!("/api/reflections/{}/export", UNKNOWN_ID))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

// =============================================================================
// RATE LIMITING
// =============================================================================

#[tokio::test]
async fn test_rate_limit_rejects_burst() {
    let _guard = lock_env();
    let security = SecurityConfig {
        cors_origins: None,
        rate_limit: Some(1),
    };
    let router = create_router_with(AppState::new(Session::new()), &security);
    let server = TestServer::new(router).unwrap();

    server.get("/health").await.assert_status_ok();
    let second = server.get("/health").await;

    assert_eq!(second.status_code(), StatusCode::TOO_MANY_REQUESTS);
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

/// Create a server with authentication enabled. The returned guard keeps
/// the key set until it is dropped.
fn create_auth_test_server(api_key: &str) -> (TestServer, TestGuard) {
    let guard = lock_env();
    // SAFETY: Tests run sequentially under ENV_TEST_MUTEX, so no concurrent env access.
    unsafe { std::env::set_var("DIRECTION_API_KEY", api_key) };
    let router = create_router(AppState::new(Session::new()));
    (TestServer::new(router).unwrap(), guard)
}

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let (server, _guard) = create_auth_test_server(api_key);

    let response = server
        .get("/test")
        .add_header(
            header::AUTHORIZATION,
            format!("Bearer {}", api_key)
                .parse::<HeaderValue>()
                .unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let api_key = "test-raw-key-67890";
    let (server, _guard) = create_auth_test_server(api_key);

    let response = server
        .post("/api/reflections")
        .add_header(header::AUTHORIZATION, api_key.parse::<HeaderValue>().unwrap())
        .json(&example_body())
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let (server, _guard) = create_auth_test_server("correct-key");

    let response = server
        .get("/test")
        .add_header(
            header::AUTHORIZATION,
            "Bearer wrong-key".parse::<HeaderValue>().unwrap(),
        )
        .await;

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Invalid token should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let (server, _guard) = create_auth_test_server("required-key");

    let response = server.post("/api/reflections").json(&example_body()).await;

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Missing Authorization header should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_public_paths_bypass_auth() {
    let (server, _guard) = create_auth_test_server("secret-key-for-bypass-test");

    server.get("/").await.assert_status_ok();
    let health: HealthResponse = server.get("/health").await.json();
    assert_eq!(health.status, "ok");
}
