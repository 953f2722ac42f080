use async_trait::async_trait;
use shared::domain::{FlagKey, FlagValue, FlagValueMap, OrgId, OrgPage};

pub mod error;
pub mod session;
pub mod transport;

pub use error::{ClientError, Operation};
pub use session::{FlagSession, SessionEvent, SessionPhase, SessionSnapshot, NO_ORGANIZATION_SELECTED};
pub use transport::HttpFlagsClient;

/// Request/response contract of the flag store as seen by the client.
///
/// Implementations never retry. The first failure is returned to the caller.
#[async_trait]
pub trait FlagsApi: Send + Sync {
    async fn fetch_flags(&self, org_id: &OrgId) -> Result<FlagValueMap, ClientError>;
    async fn update_flag(
        &self,
        org_id: &OrgId,
        key: FlagKey,
        value: &FlagValue,
    ) -> Result<(), ClientError>;
    /// `page_size` must be positive.
    async fn fetch_org_page(&self, page: u32, page_size: u32) -> Result<OrgPage, ClientError>;
}
