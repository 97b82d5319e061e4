//! External collaborator contracts
//!
//! Every network-facing dependency of the job is expressed as an
//! object-safe trait so the orchestrator can receive fakes in tests. The
//! concrete AWS and Slack implementations live in the submodules.

pub mod aws;
pub mod slack;

use crate::{
    billing::{AccountDirectory, CostAmount, Dimension},
    period::BillingPeriod,
    Result,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Organization identifier and display name resolved at the start of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgIdentity {
    pub id: String,
    pub name: String,
}

impl OrgIdentity {
    /// Placeholder identity used when the lookup degrades
    pub fn unknown() -> Self {
        Self {
            id: "Unknown".to_string(),
            name: "AWS Organization".to_string(),
        }
    }
}

/// Read-only cost analytics queries for a billing period
#[async_trait]
pub trait CostApi: Send + Sync {
    /// Total unblended cost over the period
    async fn total_cost(&self, period: &BillingPeriod) -> Result<CostAmount>;

    /// Cost grouped by the given dimension, in API order
    async fn cost_by_dimension(
        &self,
        period: &BillingPeriod,
        dimension: Dimension,
    ) -> Result<Vec<(String, f64)>>;

    /// Projected cost for a not-yet-complete period
    async fn forecast(&self, period: &BillingPeriod) -> Result<CostAmount>;
}

/// Resolves the organization the report is generated for
#[async_trait]
pub trait IdentityApi: Send + Sync {
    async fn organization(&self) -> Result<OrgIdentity>;
}

/// Resolves account ids to display names for all known accounts
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn account_names(&self) -> Result<AccountDirectory>;
}

/// Persists the rendered document and returns a shareable URL
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, bytes: &[u8], key: &str) -> Result<String>;
}

/// Posts the digest to a chat channel
#[async_trait]
pub trait NotificationTransport: Send + Sync {
    /// Post a plain text message
    async fn post_message(&self, text: &str) -> Result<()>;

    /// Post a message with the document attached. Implementations without
    /// attachment support return a notification error; the caller falls back
    /// to `post_message` with a link.
    async fn post_file(&self, text: &str, bytes: &[u8], filename: &str) -> Result<()>;
}
