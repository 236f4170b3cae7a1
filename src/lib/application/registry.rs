//! Bookkeeping of which remote agents currently have a tool

use crate::application::agent_tool::AgentTool;
use crate::application::invocation::InvocationClient;
use crate::domain::types::{AgentBinding, RegisteredTool};
use crate::server::tools::{RouterError, ToolDefinition, ToolRouter};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error, PartialEq, Eq)]
#[error("tool registry update failed: {0}")]
pub struct RegistryError(#[from] pub RouterError);

/// Agent name → registered tool.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AgentRegistry {
    entries: BTreeMap<String, RegisteredTool>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, agent_name: &str) -> Option<&RegisteredTool> {
        self.entries.get(agent_name)
    }

    pub fn contains(&self, agent_name: &str) -> bool {
        self.entries.contains_key(agent_name)
    }

    pub fn insert(&mut self, entry: RegisteredTool) -> Option<RegisteredTool> {
        self.entries.insert(entry.agent_name.clone(), entry)
    }

    pub fn remove(&mut self, agent_name: &str) -> Option<RegisteredTool> {
        self.entries.remove(agent_name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn agent_names(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Agent currently holding `identifier`, if any.
    pub fn owner_of(&self, identifier: &str) -> Option<&str> {
        self.entries
            .values()
            .find(|entry| entry.identifier == identifier)
            .map(|entry| entry.agent_name.as_str())
    }
}

/// Keeps the tool router and the registry in step.
pub struct ToolRegistryAdapter {
    router: Arc<ToolRouter>,
    invoker: Arc<InvocationClient>,
    registry: AgentRegistry,
}

impl ToolRegistryAdapter {
    pub fn new(router: Arc<ToolRouter>, invoker: Arc<InvocationClient>) -> Self {
        Self {
            router,
            invoker,
            registry: AgentRegistry::new(),
        }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn router(&self) -> &Arc<ToolRouter> {
        &self.router
    }

    /// Publishes a tool bound to `binding` under `identifier`.
    pub fn register(&mut self, identifier: &str, binding: AgentBinding) -> Result<(), RegistryError> {
        let definition = ToolDefinition::query_tool(identifier, binding.description.clone());
        let handler = AgentTool::new(binding.clone(), self.invoker.clone());
        self.router.add_tool(definition, Arc::new(handler))?;

        info!(agent = %binding.agent_name, identifier, "Registered agent tool");
        self.registry.insert(RegisteredTool {
            agent_name: binding.agent_name,
            description: binding.description,
            identifier: identifier.to_string(),
        });
        Ok(())
    }

    /// Withdraws the tool for `agent_name` and forgets the agent.
    ///
    /// The registry entry is dropped even when the router refuses, so a
    /// later pass re-registers the agent from scratch.
    pub fn unregister(&mut self, agent_name: &str) -> Result<Option<RegisteredTool>, RegistryError> {
        let Some(entry) = self.registry.remove(agent_name) else {
            debug!(agent = agent_name, "Agent has no registered tool");
            return Ok(None);
        };
        self.router.remove_tool(&entry.identifier)?;
        info!(agent = agent_name, identifier = %entry.identifier, "Unregistered agent tool");
        Ok(Some(entry))
    }

    #[cfg(test)]
    pub(crate) fn registry_mut(&mut self) -> &mut AgentRegistry {
        &mut self.registry
    }
}
