use crate::application::invocation::InvocationClient;
use crate::domain::types::AgentBinding;
use crate::server::tools::{ToolCallError, ToolHandler, ToolOutput};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{error, info};

/// MCP tool forwarding `query` to one remote agent.
pub struct AgentTool {
    binding: AgentBinding,
    invoker: Arc<InvocationClient>,
}

impl AgentTool {
    pub fn new(binding: AgentBinding, invoker: Arc<InvocationClient>) -> Self {
        Self { binding, invoker }
    }
}

#[async_trait]
impl ToolHandler for AgentTool {
    async fn call(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolCallError> {
        let query = match arguments.get("query") {
            Some(Value::String(query)) if !query.trim().is_empty() => query,
            _ => {
                return Err(ToolCallError::InvalidArguments(
                    "arguments.query must be a non-empty string".to_string(),
                ));
            }
        };

        let agent = &self.binding.agent_name;
        info!(agent = %agent, "Tool invoked");
        match self.invoker.invoke(agent, query).await {
            Ok(text) => Ok(ToolOutput::text(format!(
                "## Response from {agent} Agent\n\n{text}"
            ))),
            Err(err) => {
                error!(agent = %agent, error = %err, "Agent tool failed");
                Ok(ToolOutput::error(format!("Error querying {agent} agent: {err}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::invocation::RetryPolicy;
    use crate::domain::types::{AgentRecord, AgentResponse};
    use crate::infrastructure::directory::{AgentDirectory, DirectoryError};
    use futures::stream::{self, BoxStream, StreamExt};
    use serde_json::json;
    use std::time::Duration;
    use tokio::sync::Mutex;

    struct Recording {
        calls: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait]
    impl AgentDirectory for Recording {
        fn list_agents(&self) -> BoxStream<'_, Result<AgentRecord, DirectoryError>> {
            stream::empty().boxed()
        }

        async fn create_response(
            &self,
            agent_name: &str,
            input: &str,
        ) -> Result<AgentResponse, DirectoryError> {
            self.calls
                .lock()
                .await
                .push((agent_name.to_string(), input.to_string()));
            if self.fail {
                return Err(DirectoryError::Client("boom".into()));
            }
            Ok(AgentResponse {
                output_text: Some("42".into()),
                ..AgentResponse::default()
            })
        }
    }

    fn tool(fail: bool) -> (AgentTool, Arc<Recording>) {
        let directory = Arc::new(Recording {
            calls: Mutex::new(Vec::new()),
            fail,
        });
        let invoker = InvocationClient::with_policy(
            directory.clone(),
            RetryPolicy {
                max_attempts: 1,
                base_delay: Duration::ZERO,
            },
        );
        let tool = AgentTool::new(AgentBinding::new("Sales Bot", "desc"), Arc::new(invoker));
        (tool, directory)
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[tokio::test]
    async fn wraps_agent_text_in_heading() {
        let (tool, directory) = tool(false);
        let output = tool
            .call(&args(json!({"query": "meaning of life"})))
            .await
            .expect("output");

        assert_eq!(output.text, "## Response from Sales Bot Agent\n\n42");
        assert!(!output.is_error);
        assert_eq!(
            directory.calls.lock().await.as_slice(),
            &[("Sales Bot".to_string(), "meaning of life".to_string())]
        );
    }

    #[tokio::test]
    async fn hard_failure_is_error_output() {
        let (tool, _) = tool(true);
        let output = tool.call(&args(json!({"query": "q"}))).await.expect("output");
        assert!(output.is_error);
        assert!(output.text.starts_with("Error querying Sales Bot agent: "));
    }

    #[tokio::test]
    async fn rejects_missing_or_blank_query() {
        let (tool, directory) = tool(false);
        for arguments in [json!({}), json!({"query": "  "}), json!({"query": 7})] {
            assert!(matches!(
                tool.call(&args(arguments)).await,
                Err(ToolCallError::InvalidArguments(_))
            ));
        }
        assert!(directory.calls.lock().await.is_empty());
    }
}
