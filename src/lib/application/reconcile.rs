//! Synchronizes published tools with the remote agent roster

use crate::application::registry::{AgentRegistry, RegistryError, ToolRegistryAdapter};
use crate::domain::naming::{to_identifier, with_suffix};
use crate::domain::types::{AgentBinding, AgentRecord};
use crate::infrastructure::directory::{AgentDirectory, DirectoryError};
use futures::TryStreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyncOutcome {
    Added,
    Updated,
    Unchanged,
}

#[derive(Debug, Default)]
struct PassSummary {
    added: usize,
    updated: usize,
    unchanged: usize,
    removed: usize,
    failed: usize,
}

impl PassSummary {
    fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Added => self.added += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

pub struct Reconciler {
    directory: Arc<dyn AgentDirectory>,
    tools: ToolRegistryAdapter,
}

impl Reconciler {
    pub fn new(directory: Arc<dyn AgentDirectory>, tools: ToolRegistryAdapter) -> Self {
        Self { directory, tools }
    }

    pub fn registry(&self) -> &AgentRegistry {
        self.tools.registry()
    }

    /// Runs one reconciliation pass and returns the roster it saw.
    ///
    /// A roster that cannot be fetched completely leaves every tool in place
    /// and yields an empty list.
    pub async fn reconcile(&mut self) -> Vec<AgentRecord> {
        info!("Updating agent tools");
        let roster = match self.fetch_roster().await {
            Ok(roster) => roster,
            Err(err) => {
                error!(error = %err, "Failed to fetch agent roster; keeping current tools");
                return Vec::new();
            }
        };

        if roster.is_empty() {
            warn!("No agents found in the project");
            return roster;
        }
        info!(count = roster.len(), "Fetched agent roster");

        let mut summary = PassSummary::default();
        for agent in &roster {
            match self.sync_agent(agent) {
                Ok(outcome) => summary.record(outcome),
                Err(err) => {
                    error!(agent = %agent.name, error = %err, "Failed to sync agent tool");
                    summary.failed += 1;
                }
            }
        }

        let present: HashSet<&str> = roster.iter().map(|agent| agent.name.as_str()).collect();
        for name in self.tools.registry().agent_names() {
            if present.contains(name.as_str()) {
                continue;
            }
            match self.tools.unregister(&name) {
                Ok(_) => {
                    info!(agent = %name, "Removed tool for deleted agent");
                    summary.removed += 1;
                }
                Err(err) => {
                    error!(agent = %name, error = %err, "Failed to remove tool for deleted agent");
                    summary.failed += 1;
                }
            }
        }

        info!(
            added = summary.added,
            updated = summary.updated,
            unchanged = summary.unchanged,
            removed = summary.removed,
            failed = summary.failed,
            registered = self.tools.registry().len(),
            "Agent tools updated"
        );
        roster
    }

    /// Collects every page; a later duplicate name replaces the earlier entry in place.
    async fn fetch_roster(&self) -> Result<Vec<AgentRecord>, DirectoryError> {
        let mut agents = self.directory.list_agents();
        let mut roster: Vec<AgentRecord> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        while let Some(agent) = agents.try_next().await? {
            match positions.get(&agent.name) {
                Some(&index) => {
                    warn!(agent = %agent.name, "Duplicate agent name in roster; keeping the latest");
                    roster[index] = agent;
                }
                None => {
                    positions.insert(agent.name.clone(), roster.len());
                    roster.push(agent);
                }
            }
        }
        Ok(roster)
    }

    fn sync_agent(&mut self, agent: &AgentRecord) -> Result<SyncOutcome, RegistryError> {
        let description = agent.tool_description();
        let unchanged = self
            .tools
            .registry()
            .get(&agent.name)
            .map(|existing| existing.description == description);

        let outcome = match unchanged {
            Some(true) => return Ok(SyncOutcome::Unchanged),
            Some(false) => {
                debug!(agent = %agent.name, "Agent description changed");
                self.tools.unregister(&agent.name)?;
                SyncOutcome::Updated
            }
            None => SyncOutcome::Added,
        };

        let identifier = self.allocate_identifier(&agent.name);
        self.tools
            .register(&identifier, AgentBinding::new(agent.name.clone(), description))?;
        Ok(outcome)
    }

    fn allocate_identifier(&self, agent_name: &str) -> String {
        let base = to_identifier(agent_name);
        let mut n = 1;
        loop {
            let candidate = with_suffix(&base, n);
            let taken = self.tools.registry().owner_of(&candidate).is_some()
                || self.tools.router().contains(&candidate);
            if !taken {
                if n > 1 {
                    warn!(agent = agent_name, identifier = %candidate, "Identifier collision; using suffix");
                }
                return candidate;
            }
            n += 1;
        }
    }
}
