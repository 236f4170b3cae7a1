use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;

/// Callable behind a registered tool name.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: &Map<String, Value>) -> Result<ToolOutput, ToolCallError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ToolCallError {
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDefinition {
    /// Tool taking a single required string argument named `query`.
    pub fn query_tool(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "The question or request to send to the agent"
                    }
                },
                "required": ["query"]
            }),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("tool name '{name}' is invalid")]
    InvalidName { name: String },
    #[error("tool '{name}' is not registered")]
    UnknownTool { name: String },
}

#[derive(Clone)]
pub struct RegisteredHandler {
    pub definition: ToolDefinition,
    pub handler: Arc<dyn ToolHandler>,
}

/// Live set of tools served to MCP clients.
///
/// Every mutation bumps a revision counter so transports can emit
/// `notifications/tools/list_changed`.
pub struct ToolRouter {
    tools: RwLock<BTreeMap<String, RegisteredHandler>>,
    revision: watch::Sender<u64>,
}

impl Default for ToolRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRouter {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            tools: RwLock::new(BTreeMap::new()),
            revision,
        }
    }

    /// Adds a tool, replacing any tool already registered under the same name.
    pub fn add_tool(
        &self,
        definition: ToolDefinition,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RouterError> {
        if !is_valid_name(&definition.name) {
            return Err(RouterError::InvalidName {
                name: definition.name,
            });
        }
        let name = definition.name.clone();
        let replaced = self
            .tools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.clone(), RegisteredHandler { definition, handler })
            .is_some();
        debug!(tool = %name, replaced, "Tool added to router");
        self.bump();
        Ok(())
    }

    pub fn remove_tool(&self, name: &str) -> Result<(), RouterError> {
        let removed = self
            .tools
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(name);
        match removed {
            Some(_) => {
                debug!(tool = %name, "Tool removed from router");
                self.bump();
                Ok(())
            }
            None => Err(RouterError::UnknownTool {
                name: name.to_string(),
            }),
        }
    }

    pub fn list(&self) -> Vec<ToolDefinition> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|entry| entry.definition.clone())
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<RegisteredHandler> {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
}
