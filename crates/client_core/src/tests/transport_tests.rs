use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use serde_json::{json, Value};
use shared::{
    directory,
    domain::{FlagKey, FlagValue, FlagValueMap, OrgId},
    error::{ApiError, ErrorCode},
    protocol::{OrgListQuery, OrgListResponse},
};
use tokio::{net::TcpListener, sync::Mutex};

use super::*;

#[derive(Clone, Default)]
struct StubState {
    writes: Arc<Mutex<Vec<(String, String, Value)>>>,
    org_queries: Arc<Mutex<Vec<(Option<u32>, Option<u32>)>>>,
    flag_reads: Arc<Mutex<Vec<String>>>,
}

async fn stub_flags(
    State(state): State<StubState>,
    Path(org_id): Path<String>,
) -> Json<Option<FlagValueMap>> {
    state.flag_reads.lock().await.push(org_id.clone());
    if org_id == "org-missing" {
        return Json(None);
    }
    let mut values = FlagValueMap::new();
    values.insert(FlagKey::DarkMode.as_str().to_string(), FlagValue::Bool(true));
    values.insert(
        FlagKey::DashboardRefreshSeconds.as_str().to_string(),
        FlagValue::from(30),
    );
    Json(Some(values))
}

async fn stub_update(
    State(state): State<StubState>,
    Path((org_id, flag_key)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, Json<ApiError>)> {
    state
        .writes
        .lock()
        .await
        .push((org_id.clone(), flag_key, body.clone()));
    if org_id == "org-locked" {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(ErrorCode::Validation, "Invalid flag key")),
        ));
    }
    Ok(Json(json!({ "success": true, "value": body["value"] })))
}

async fn stub_orgs(
    State(state): State<StubState>,
    Query(query): Query<OrgListQuery>,
) -> Json<OrgListResponse> {
    state
        .org_queries
        .lock()
        .await
        .push((query.page, query.page_size));
    let page = query.page.unwrap_or(0);
    let page_size = query.page_size.unwrap_or(100);
    Json(OrgListResponse {
        data: vec![OrgId::from("org-aaaaaa"), OrgId::from("org-bbbbbb")],
        total: 1000,
        page,
        page_size,
    })
}

async fn stub_broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

async fn spawn_stub_server() -> (String, StubState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = StubState::default();
    let routes = Router::new()
        .route("/flags/:org_id", get(stub_flags))
        .route("/flags/:org_id/:flag_key", put(stub_update))
        .route("/orgs", get(stub_orgs))
        .route(
            "/flag-definitions",
            get(|| async { Json(directory::definitions().to_vec()) }),
        )
        .route(
            "/health",
            get(|| async { Json(json!({ "status": "ok", "timestamp": "2026-01-01T00:00:00Z" })) }),
        );
    let app = Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .route("/broken/flags/:org_id", get(stub_broken))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), state)
}

#[tokio::test]
async fn fetch_flags_returns_stored_values() {
    let (url, _state) = spawn_stub_server().await;
    let client = HttpFlagsClient::new(&url).expect("client");

    let values = client
        .fetch_flags(&OrgId::from("org-abc123"))
        .await
        .expect("flags");

    assert_eq!(values.get("DARK_MODE"), Some(&FlagValue::Bool(true)));
    assert_eq!(
        values.get("DASHBOARD_REFRESH_SECONDS"),
        Some(&FlagValue::from(30))
    );
}

#[tokio::test]
async fn null_flag_body_is_a_network_error() {
    let (url, _state) = spawn_stub_server().await;
    let client = HttpFlagsClient::new(&url).expect("client");

    let err = client
        .fetch_flags(&OrgId::from("org-missing"))
        .await
        .expect_err("null body must fail");

    assert!(matches!(
        err,
        ClientError::Network {
            operation: Operation::FetchFlags,
            ..
        }
    ));
    assert!(err
        .to_string()
        .starts_with("Error fetching feature flags: "));
}

#[tokio::test]
async fn non_success_status_is_a_fetch_error() {
    let (url, _state) = spawn_stub_server().await;
    let client = HttpFlagsClient::new(&format!("{url}/broken")).expect("client");

    let err = client
        .fetch_flags(&OrgId::from("org-abc123"))
        .await
        .expect_err("500 must fail");

    assert_eq!(err.status(), Some(500));
    assert_eq!(
        err.to_string(),
        "Error fetching feature flags: Failed to fetch flags: 500 Internal Server Error"
    );
}

#[tokio::test]
async fn unreachable_store_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let client = HttpFlagsClient::new(&format!("http://{addr}")).expect("client");

    let err = client
        .fetch_org_page(0, 20)
        .await
        .expect_err("connection refused");

    assert_eq!(err.operation(), Some(Operation::FetchOrgs));
    assert_eq!(err.status(), None);
    assert!(err.to_string().starts_with("Error fetching organizations: "));
}

#[tokio::test]
async fn update_flag_sends_one_put_with_the_new_value() {
    let (url, state) = spawn_stub_server().await;
    let client = HttpFlagsClient::new(&url).expect("client");

    client
        .update_flag(
            &OrgId::from("org-abc123"),
            FlagKey::DarkMode,
            &FlagValue::Bool(false),
        )
        .await
        .expect("update");

    let writes = state.writes.lock().await;
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0].0, "org-abc123");
    assert_eq!(writes[0].1, "DARK_MODE");
    assert_eq!(writes[0].2, json!({ "value": false }));
}

#[tokio::test]
async fn rejected_update_carries_the_store_message() {
    let (url, _state) = spawn_stub_server().await;
    let client = HttpFlagsClient::new(&url).expect("client");

    let err = client
        .update_flag(
            &OrgId::from("org-locked"),
            FlagKey::DarkMode,
            &FlagValue::Bool(true),
        )
        .await
        .expect_err("400 must fail");

    assert_eq!(err.status(), Some(400));
    assert_eq!(
        err.to_string(),
        "Error updating feature flag: Failed to update flag: 400 Bad Request (Invalid flag key)"
    );
}

#[tokio::test]
async fn org_page_sends_page_and_page_size() {
    let (url, state) = spawn_stub_server().await;
    let client = HttpFlagsClient::new(&url).expect("client");

    let page = client.fetch_org_page(3, 20).await.expect("page");

    assert_eq!(page.total, 1000);
    assert_eq!(page.page, 3);
    assert_eq!(page.page_size, 20);
    assert_eq!(page.ids.len(), 2);
    assert_eq!(*state.org_queries.lock().await, vec![(Some(3), Some(20))]);
}

#[tokio::test]
async fn zero_page_size_is_rejected_before_any_request() {
    let (url, state) = spawn_stub_server().await;
    let client = HttpFlagsClient::new(&url).expect("client");

    let err = client.fetch_org_page(0, 0).await.expect_err("invalid size");

    assert!(matches!(err, ClientError::Validation(_)));
    assert!(state.org_queries.lock().await.is_empty());
}

#[tokio::test]
async fn base_url_path_prefix_is_kept() {
    let (url, state) = spawn_stub_server().await;
    let client = HttpFlagsClient::new(&format!("{url}/api/")).expect("client");

    let definitions = client.fetch_definitions().await.expect("definitions");
    client
        .fetch_flags(&OrgId::from("org-abc123"))
        .await
        .expect("flags");

    assert_eq!(definitions.len(), directory::definitions().len());
    assert_eq!(*state.flag_reads.lock().await, vec!["org-abc123".to_string()]);
}

#[tokio::test]
async fn org_ids_are_percent_encoded_in_paths() {
    let (url, state) = spawn_stub_server().await;
    let client = HttpFlagsClient::new(&url).expect("client");

    client
        .fetch_flags(&OrgId::from("acme corp"))
        .await
        .expect("flags");

    assert_eq!(*state.flag_reads.lock().await, vec!["acme corp".to_string()]);
}

#[tokio::test]
async fn health_reports_status() {
    let (url, _state) = spawn_stub_server().await;
    let client = HttpFlagsClient::new(&url).expect("client");

    let health = client.health().await.expect("health");

    assert_eq!(health.status, "ok");
}

#[test]
fn non_http_base_url_is_rejected() {
    let err = HttpFlagsClient::new("ftp://example.com").expect_err("scheme");
    assert!(matches!(err, ClientError::Validation(_)));
    assert!(HttpFlagsClient::new("not a url").is_err());
}
