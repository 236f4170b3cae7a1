//! Remote agent directory
//!
//! [`AgentDirectory`] is the seam between the synchronization engine and the
//! hosted agent service. [`FoundryClient`] talks to an Azure AI Foundry
//! project over HTTPS.

mod credential;
mod error;
mod foundry;

pub use credential::{
    AccessToken, AzureCliCredential, CredentialError, FOUNDRY_RESOURCE, StaticTokenCredential,
    TokenCredential, default_credential,
};
pub use error::{DirectoryError, FailureClass};
pub use foundry::FoundryClient;

use crate::domain::types::{AgentRecord, AgentResponse};
use async_trait::async_trait;
use futures::stream::BoxStream;

#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// Streams the full roster, fetching further pages as it is consumed.
    fn list_agents(&self) -> BoxStream<'_, Result<AgentRecord, DirectoryError>>;

    /// Sends one request to the named agent and returns its raw response.
    async fn create_response(
        &self,
        agent_name: &str,
        input: &str,
    ) -> Result<AgentResponse, DirectoryError>;
}
