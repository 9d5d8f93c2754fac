use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use switchyard_core::SwitchyardError;

use crate::{Agent, AgentRole, NextAgent};

/// Anything the coordinator can hand a task to.
#[async_trait]
pub trait Subagent: Send + Sync {
    fn name(&self) -> &str;

    async fn process(&self, task: &str) -> Result<String, SwitchyardError>;
}

#[async_trait]
impl Subagent for Agent {
    fn name(&self) -> &str {
        Agent::name(self)
    }

    async fn process(&self, task: &str) -> Result<String, SwitchyardError> {
        Agent::process(self, task).await
    }
}

/// Top of the two-level agent tree: decides where a task goes and merges
/// what comes back.
pub struct CoordinatorAgent {
    agent: Agent,
    subagents: RwLock<BTreeMap<String, Arc<dyn Subagent>>>,
}

impl std::fmt::Debug for CoordinatorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoordinatorAgent")
            .field("agent", &self.agent)
            .field("subagents", &self.subagent_names())
            .finish()
    }
}

impl CoordinatorAgent {
    pub fn new(agent: Agent) -> Self {
        if agent.role() != AgentRole::Coordinator {
            tracing::warn!(agent = %agent.name(), role = %agent.role(), "coordinator built from a non-coordinator agent");
        }
        Self {
            agent,
            subagents: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn register_subagent(&self, subagent: Arc<dyn Subagent>) {
        let name = subagent.name().to_string();
        tracing::info!(coordinator = %self.agent.name(), subagent = %name, "registered subagent");
        self.subagents
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(name, subagent);
    }

    pub fn subagent_names(&self) -> Vec<String> {
        self.subagents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub async fn delegate(&self, name: &str, task: &str) -> Result<String, SwitchyardError> {
        let subagent = self
            .subagents
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .get(name)
            .cloned()
            .ok_or_else(|| {
                SwitchyardError::InvalidInput(format!("unknown subagent '{name}'"))
            })?;
        tracing::info!(coordinator = %self.agent.name(), subagent = %name, "delegating task");
        subagent.process(task).await
    }

    /// Answers directly, with the registered subagents listed in the prompt.
    pub async fn process(&self, task: &str) -> Result<String, SwitchyardError> {
        let system = AgentRole::Coordinator.system_prompt(self.agent.name(), &self.subagent_names());
        self.agent.process_with_system(&system, task).await
    }

    pub async fn decide_route(&self, task: &str) -> Result<NextAgent, SwitchyardError> {
        let prompt = format!(
            "Analyze this task and decide which agent should handle it:\n\
             Task: {task}\n\n\
             Available agents:\n\
             - research: for gathering information, running commands, searching data\n\
             - analysis: for analyzing data, finding patterns, generating insights\n\n\
             Respond with ONLY the agent name: 'research' or 'analysis'"
        );
        let reply = self.agent.complete(&prompt).await?;
        let route = NextAgent::from_reply(&reply);
        tracing::info!(coordinator = %self.agent.name(), ?route, "routing decision");
        Ok(route)
    }

    pub async fn aggregate_results(
        &self,
        results: &BTreeMap<String, String>,
    ) -> Result<String, SwitchyardError> {
        let mut listing = String::new();
        for (agent, result) in results {
            listing.push_str(&format!("\n{agent}:\n{result}\n"));
        }
        let prompt = format!(
            "Aggregate and synthesize the following results from different agents:\n\
             {listing}\n\
             Provide a comprehensive summary that combines insights from all agents."
        );
        self.agent.complete(&prompt).await
    }
}

#[async_trait]
impl Subagent for CoordinatorAgent {
    fn name(&self) -> &str {
        self.agent.name()
    }

    async fn process(&self, task: &str) -> Result<String, SwitchyardError> {
        CoordinatorAgent::process(self, task).await
    }
}
