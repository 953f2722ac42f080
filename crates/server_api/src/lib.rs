use std::time::Duration;

use chrono::Utc;
use shared::{
    directory,
    domain::{FlagDefinition, FlagKey, FlagValue, FlagValueMap, OrgId},
    error::{ApiError, ErrorCode},
    protocol::{
        HealthResponse, OrgListQuery, OrgListResponse, UpdateFlagResponse, DEFAULT_ORG_PAGE_SIZE,
    },
};
use storage::FlagStore;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub store: FlagStore,
    pub latency: SimulatedLatency,
}

/// Artificial response delays that make loading states observable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedLatency {
    pub read: Duration,
    pub write: Duration,
}

impl SimulatedLatency {
    pub const NONE: SimulatedLatency = SimulatedLatency {
        read: Duration::ZERO,
        write: Duration::ZERO,
    };
}

impl Default for SimulatedLatency {
    fn default() -> Self {
        Self {
            read: Duration::from_millis(200),
            write: Duration::from_millis(150),
        }
    }
}

pub async fn list_orgs(ctx: &ApiContext, query: OrgListQuery) -> Result<OrgListResponse, ApiError> {
    let page = query.page.unwrap_or(0);
    let page_size = query.page_size.unwrap_or(DEFAULT_ORG_PAGE_SIZE);
    if page_size == 0 {
        return Err(ApiError::new(
            ErrorCode::Validation,
            "pageSize must be greater than zero",
        ));
    }

    let offset = (page as usize).saturating_mul(page_size as usize);
    let (ids, total) = ctx.store.list_org_ids(offset, page_size as usize).await;
    Ok(OrgListResponse {
        data: ids,
        total: total as u64,
        page,
        page_size,
    })
}

/// `None` for an organization the store has never seen.
pub async fn get_flags(ctx: &ApiContext, org_id: &OrgId) -> Option<FlagValueMap> {
    let flags = ctx.store.load_flags(org_id).await;
    info!(
        %org_id,
        found = flags.is_some(),
        flag_count = flags.as_ref().map_or(0, |f| f.len()),
        "GET /flags"
    );
    pause(ctx.latency.read).await;
    flags
}

pub async fn update_flag(
    ctx: &ApiContext,
    org_id: &OrgId,
    raw_key: &str,
    value: FlagValue,
) -> Result<UpdateFlagResponse, ApiError> {
    let key = validate_flag_write(raw_key, &value)?;
    let outcome = ctx.store.store_flag(org_id, key, value.clone()).await;
    info!(
        %org_id,
        flag = %key,
        %value,
        created_org = outcome.created_org,
        "PUT /flags updated"
    );
    pause(ctx.latency.write).await;
    Ok(UpdateFlagResponse {
        success: true,
        value,
    })
}

/// Checks a write against the directory: the key must be known and the
/// value must carry the flag's declared type.
pub fn validate_flag_write(raw_key: &str, value: &FlagValue) -> Result<FlagKey, ApiError> {
    let definition = directory::find_definition(raw_key)
        .ok_or_else(|| ApiError::new(ErrorCode::Validation, "Invalid flag key"))?;

    if value.value_type() != definition.value_type {
        return Err(ApiError::new(
            ErrorCode::Validation,
            format!(
                "Invalid value type. Expected {}, got {}",
                definition.value_type,
                value.value_type()
            ),
        ));
    }

    Ok(definition.key)
}

pub fn flag_definitions() -> Vec<FlagDefinition> {
    directory::definitions().to_vec()
}

pub fn health() -> HealthResponse {
    HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
