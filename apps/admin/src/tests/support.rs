use std::collections::HashMap;

use async_trait::async_trait;
use client_core::{ClientError, FlagsApi, Operation};
use shared::{
    directory,
    domain::{FlagKey, FlagValue, FlagValueMap, OrgId, OrgPage},
};
use tokio::sync::Mutex;

/// In-memory store that checks writes against the directory like the real
/// one does.
#[derive(Default)]
pub struct MemoryApi {
    pub orgs: Vec<OrgId>,
    pub flags: Mutex<HashMap<OrgId, FlagValueMap>>,
    pub page_requests: Mutex<Vec<(u32, u32)>>,
    pub writes: Mutex<Vec<(OrgId, FlagKey, FlagValue)>>,
    pub reject_writes: Mutex<bool>,
    pub fail_pages: Mutex<bool>,
}

impl MemoryApi {
    pub fn with_orgs(count: usize) -> Self {
        Self {
            orgs: (0..count).map(|i| OrgId::new(format!("org-{i:06}"))).collect(),
            ..Self::default()
        }
    }

    pub async fn set_flag(&self, org_id: &str, key: &str, value: FlagValue) {
        self.flags
            .lock()
            .await
            .entry(OrgId::from(org_id))
            .or_default()
            .insert(key.to_string(), value);
    }
}

#[async_trait]
impl FlagsApi for MemoryApi {
    async fn fetch_flags(&self, org_id: &OrgId) -> Result<FlagValueMap, ClientError> {
        self.flags
            .lock()
            .await
            .get(org_id)
            .cloned()
            .ok_or_else(|| ClientError::Network {
                operation: Operation::FetchFlags,
                message: "malformed response body".to_string(),
            })
    }

    async fn update_flag(
        &self,
        org_id: &OrgId,
        key: FlagKey,
        value: &FlagValue,
    ) -> Result<(), ClientError> {
        self.writes
            .lock()
            .await
            .push((org_id.clone(), key, value.clone()));
        let expected = directory::definition(key).value_type;
        if *self.reject_writes.lock().await || value.value_type() != expected {
            return Err(ClientError::Fetch {
                operation: Operation::UpdateFlag,
                status: 400,
                message: "Failed to update flag: 400 Bad Request".to_string(),
            });
        }
        self.set_flag(org_id.as_str(), key.as_str(), value.clone())
            .await;
        Ok(())
    }

    async fn fetch_org_page(&self, page: u32, page_size: u32) -> Result<OrgPage, ClientError> {
        self.page_requests.lock().await.push((page, page_size));
        if *self.fail_pages.lock().await {
            return Err(ClientError::Network {
                operation: Operation::FetchOrgs,
                message: "connection refused".to_string(),
            });
        }
        let start = (page as usize * page_size as usize).min(self.orgs.len());
        let end = (start + page_size as usize).min(self.orgs.len());
        Ok(OrgPage {
            ids: self.orgs[start..end].to_vec(),
            total: self.orgs.len() as u64,
            page,
            page_size,
        })
    }
}
