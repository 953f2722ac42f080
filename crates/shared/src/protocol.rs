use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{FlagValue, OrgId, OrgPage};

pub const DEFAULT_ORG_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgListResponse {
    pub data: Vec<OrgId>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl From<OrgListResponse> for OrgPage {
    fn from(value: OrgListResponse) -> Self {
        Self {
            ids: value.data,
            total: value.total,
            page: value.page,
            page_size: value.page_size,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFlagRequest {
    pub value: FlagValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateFlagResponse {
    pub success: bool,
    pub value: FlagValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}
