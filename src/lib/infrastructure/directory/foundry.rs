//! Azure AI Foundry project client

use super::credential::TokenCredential;
use super::error::DirectoryError;
use super::AgentDirectory;
use crate::domain::types::{AgentRecord, AgentResponse};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

const PAGE_SIZE: &str = "100";
const MAX_ERROR_BODY: usize = 512;

/// HTTP client for the agents and responses endpoints of a Foundry project.
#[derive(Clone)]
pub struct FoundryClient {
    endpoint: String,
    api_version: String,
    credential: Arc<dyn TokenCredential>,
    http: Client,
}

#[derive(Deserialize)]
struct AgentPage {
    #[serde(default)]
    data: Vec<Value>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    last_id: Option<String>,
}

#[derive(Serialize)]
struct ResponseRequest<'a> {
    input: &'a str,
    agent: AgentReference<'a>,
}

#[derive(Serialize)]
struct AgentReference<'a> {
    name: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
}

enum PageCursor {
    Start,
    After(String),
    Done,
}

impl FoundryClient {
    pub fn new(
        endpoint: impl Into<String>,
        api_version: impl Into<String>,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, DirectoryError> {
        let endpoint = endpoint.into();
        Url::parse(&endpoint)
            .map_err(|err| DirectoryError::Client(format!("invalid endpoint '{endpoint}': {err}")))?;
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| DirectoryError::Client(err.to_string()))?;
        Ok(Self {
            endpoint,
            api_version: api_version.into(),
            credential,
            http,
        })
    }

    /// Build URL from endpoint and path
    fn build_url(&self, path: &str) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        format!("{base}/{path}")
    }

    async fn send_json<T>(
        &self,
        request: RequestBuilder,
        resource: &str,
        context: &str,
    ) -> Result<T, DirectoryError>
    where
        T: DeserializeOwned,
    {
        let token = self.credential.token().await?;
        let response = request
            .bearer_auth(token.token)
            .query(&[("api-version", self.api_version.as_str())])
            .send()
            .await
            .map_err(DirectoryError::network)?;

        let status = response.status();
        let body = response.bytes().await.map_err(DirectoryError::network)?;
        if status == StatusCode::NOT_FOUND {
            return Err(DirectoryError::not_found(resource));
        }
        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(DirectoryError::status(status, truncate(&text)));
        }

        serde_json::from_slice(&body).map_err(|source| DirectoryError::decode(context, source))
    }

    async fn next_page(
        &self,
        cursor: PageCursor,
    ) -> Result<Option<(Vec<AgentRecord>, PageCursor)>, DirectoryError> {
        let after = match cursor {
            PageCursor::Done => return Ok(None),
            PageCursor::Start => None,
            PageCursor::After(id) => Some(id),
        };

        let mut request = self
            .http
            .get(self.build_url("agents"))
            .query(&[("limit", PAGE_SIZE)]);
        if let Some(after) = after.as_deref() {
            request = request.query(&[("after", after)]);
        }

        debug!(after = ?after, "Fetching agent page");
        let page: AgentPage = self.send_json(request, "agents", "agent list").await?;
        let next = match (page.has_more, page.last_id) {
            (true, Some(id)) => PageCursor::After(id),
            _ => PageCursor::Done,
        };

        let records = page
            .data
            .into_iter()
            .filter_map(|raw| match serde_json::from_value::<AgentRecord>(raw) {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(%err, "Skipping agent entry without a usable name");
                    None
                }
            })
            .collect();

        Ok(Some((records, next)))
    }
}

#[async_trait]
impl AgentDirectory for FoundryClient {
    fn list_agents(&self) -> BoxStream<'_, Result<AgentRecord, DirectoryError>> {
        stream::try_unfold(PageCursor::Start, move |cursor| self.next_page(cursor))
            .map_ok(|records| stream::iter(records.into_iter().map(Ok::<_, DirectoryError>)))
            .try_flatten()
            .boxed()
    }

    async fn create_response(
        &self,
        agent_name: &str,
        input: &str,
    ) -> Result<AgentResponse, DirectoryError> {
        let body = ResponseRequest {
            input,
            agent: AgentReference {
                name: agent_name,
                kind: "agent_reference",
            },
        };
        let request = self
            .http
            .post(self.build_url("openai/responses"))
            .json(&body);
        self.send_json(request, agent_name, "agent response").await
    }
}

fn truncate(text: &str) -> String {
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text.to_string(),
    }
}
