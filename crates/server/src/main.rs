use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use server_api::{flag_definitions, get_flags, health, list_orgs, update_flag, ApiContext};
use shared::{
    domain::{FlagDefinition, FlagValueMap, OrgId},
    error::{ApiError, ErrorCode},
    protocol::{HealthResponse, OrgListQuery, OrgListResponse, UpdateFlagRequest, UpdateFlagResponse},
};
use storage::FlagStore;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;

use app_state::AppState;
use config::load_settings;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = load_settings()?;
    let store = FlagStore::seeded(&settings.seed_options());
    let api = ApiContext {
        store,
        latency: settings.latency(),
    };
    let (sample, total) = api.store.list_org_ids(0, 5).await;
    let app = build_router(Arc::new(AppState { api }));

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(
        %addr,
        org_count = total,
        sample_orgs = ?sample,
        read_delay_ms = settings.read_delay_ms,
        write_delay_ms = settings.write_delay_ms,
        "flag store listening: GET /flags/:org_id, PUT /flags/:org_id/:flag_key, GET /flag-definitions, GET /orgs, GET /health"
    );
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(http_health))
        .route("/orgs", get(http_list_orgs))
        .route("/flags/:org_id", get(http_get_flags))
        .route("/flags/:org_id/:flag_key", put(http_update_flag))
        .route("/flag-definitions", get(http_flag_definitions))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
    }
}

fn reject(err: ApiError) -> (StatusCode, Json<ApiError>) {
    (status_for(err.code), Json(err))
}

async fn http_health() -> Json<HealthResponse> {
    Json(health())
}

async fn http_list_orgs(
    State(state): State<Arc<AppState>>,
    query: Result<Query<OrgListQuery>, QueryRejection>,
) -> ApiResult<OrgListResponse> {
    let Query(q) = query.map_err(|rejection| {
        warn!(error = %rejection, "rejected org list query");
        reject(ApiError::new(
            ErrorCode::Validation,
            format!("Invalid query: {}", rejection.body_text()),
        ))
    })?;
    let response = list_orgs(&state.api, q).await.map_err(reject)?;
    Ok(Json(response))
}

/// Responds with JSON `null` for an organization the store does not know.
async fn http_get_flags(
    State(state): State<Arc<AppState>>,
    Path(org_id): Path<String>,
) -> Json<Option<FlagValueMap>> {
    Json(get_flags(&state.api, &OrgId(org_id)).await)
}

async fn http_update_flag(
    State(state): State<Arc<AppState>>,
    Path((org_id, flag_key)): Path<(String, String)>,
    payload: Result<Json<UpdateFlagRequest>, JsonRejection>,
) -> ApiResult<UpdateFlagResponse> {
    let Json(req) = payload.map_err(|rejection| {
        warn!(%org_id, %flag_key, error = %rejection, "rejected flag update body");
        reject(ApiError::new(
            ErrorCode::Validation,
            format!("Invalid request body: {}", rejection.body_text()),
        ))
    })?;

    let response = update_flag(&state.api, &OrgId(org_id.clone()), &flag_key, req.value)
        .await
        .map_err(|err| {
            warn!(%org_id, %flag_key, error = %err.message, "rejected flag update");
            reject(err)
        })?;
    Ok(Json(response))
}

async fn http_flag_definitions() -> Json<Vec<FlagDefinition>> {
    Json(flag_definitions())
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
