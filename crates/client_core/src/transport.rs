use async_trait::async_trait;
use reqwest::{Client, Response};
use shared::{
    domain::{FlagDefinition, FlagKey, FlagValue, FlagValueMap, OrgId, OrgPage},
    error::ApiError,
    protocol::{HealthResponse, OrgListQuery, OrgListResponse, UpdateFlagRequest},
};
use tracing::{debug, warn};
use url::Url;

use crate::{ClientError, FlagsApi, Operation};

/// Flag store client over HTTP.
///
/// The base URL is fixed at construction. Path segments such as organization
/// ids are percent-encoded before they reach the wire.
#[derive(Clone, Debug)]
pub struct HttpFlagsClient {
    http: Client,
    base_url: Url,
}

impl HttpFlagsClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url)
            .map_err(|err| ClientError::Validation(format!("invalid api url '{base_url}': {err}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ClientError::Validation(
                "api url must start with http:// or https://".to_string(),
            ));
        }
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn fetch_definitions(&self) -> Result<Vec<FlagDefinition>, ClientError> {
        let op = Operation::FetchDefinitions;
        let response = self
            .http
            .get(self.endpoint(&["flag-definitions"]))
            .send()
            .await
            .map_err(|err| network(op, err))?;
        checked(op, response)
            .await?
            .json()
            .await
            .map_err(|err| network(op, err))
    }

    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let op = Operation::Health;
        let response = self
            .http
            .get(self.endpoint(&["health"]))
            .send()
            .await
            .map_err(|err| network(op, err))?;
        checked(op, response)
            .await?
            .json()
            .await
            .map_err(|err| network(op, err))
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // http(s) urls always have a path, checked in `with_client`.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

#[async_trait]
impl FlagsApi for HttpFlagsClient {
    async fn fetch_flags(&self, org_id: &OrgId) -> Result<FlagValueMap, ClientError> {
        let op = Operation::FetchFlags;
        debug!(org_id = %org_id, "fetching feature flags");
        let response = self
            .http
            .get(self.endpoint(&["flags", org_id.as_str()]))
            .send()
            .await
            .map_err(|err| network(op, err))?;
        let body: Option<FlagValueMap> = checked(op, response)
            .await?
            .json()
            .await
            .map_err(|err| network(op, err))?;
        body.ok_or_else(|| {
            warn!(org_id = %org_id, "flag store returned an empty flag body");
            ClientError::Network {
                operation: op,
                message: format!("malformed response body: no flags stored for {org_id}"),
            }
        })
    }

    async fn update_flag(
        &self,
        org_id: &OrgId,
        key: FlagKey,
        value: &FlagValue,
    ) -> Result<(), ClientError> {
        let op = Operation::UpdateFlag;
        debug!(org_id = %org_id, flag = %key, value = %value, "updating feature flag");
        let response = self
            .http
            .put(self.endpoint(&["flags", org_id.as_str(), key.as_str()]))
            .json(&UpdateFlagRequest {
                value: value.clone(),
            })
            .send()
            .await
            .map_err(|err| network(op, err))?;
        checked(op, response).await?;
        Ok(())
    }

    async fn fetch_org_page(&self, page: u32, page_size: u32) -> Result<OrgPage, ClientError> {
        if page_size == 0 {
            return Err(ClientError::Validation(
                "page size must be greater than zero".to_string(),
            ));
        }
        let op = Operation::FetchOrgs;
        let response = self
            .http
            .get(self.endpoint(&["orgs"]))
            .query(&OrgListQuery {
                page: Some(page),
                page_size: Some(page_size),
            })
            .send()
            .await
            .map_err(|err| network(op, err))?;
        let body: OrgListResponse = checked(op, response)
            .await?
            .json()
            .await
            .map_err(|err| network(op, err))?;
        Ok(body.into())
    }
}

fn network(operation: Operation, err: reqwest::Error) -> ClientError {
    warn!(%operation, error = %err, "flag store request failed");
    ClientError::Network {
        operation,
        message: err.to_string(),
    }
}

/// Passes success responses through and turns anything else into
/// [`ClientError::Fetch`], keeping the store's own message when it sent one.
async fn checked(operation: Operation, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response
        .text()
        .await
        .ok()
        .and_then(|body| serde_json::from_str::<ApiError>(&body).ok())
        .map(|api_error| api_error.message);
    let reason = status.canonical_reason().unwrap_or("Unknown Status");
    let mut message = format!("{}: {} {reason}", operation.failure(), status.as_u16());
    if let Some(detail) = detail {
        message.push_str(&format!(" ({detail})"));
    }
    warn!(%operation, status = status.as_u16(), "flag store rejected request");
    Err(ClientError::Fetch {
        operation,
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
