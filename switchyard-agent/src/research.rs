use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use switchyard_core::{display_value, SwitchyardError, Value};
use switchyard_tools::{CommandTool, JsonQueryTool, ToolResponse, ToolStats, TrackedTool};

use crate::{Agent, AgentBuilder, Subagent};

/// Gathers information with the command and JSON query tools.
///
/// The tools are registered with the underlying agent, so calls the model
/// makes itself are tracked alongside direct ones.
pub struct ResearchAgent {
    agent: Agent,
    command: Arc<TrackedTool<CommandTool>>,
    json: Arc<TrackedTool<JsonQueryTool>>,
}

impl std::fmt::Debug for ResearchAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResearchAgent")
            .field("agent", &self.agent)
            .finish_non_exhaustive()
    }
}

impl ResearchAgent {
    pub fn new(builder: AgentBuilder) -> Self {
        Self::with_tools(builder, CommandTool::new(), JsonQueryTool::new())
    }

    pub fn with_tools(builder: AgentBuilder, command: CommandTool, json: JsonQueryTool) -> Self {
        let command = Arc::new(TrackedTool::new(command));
        let json = Arc::new(TrackedTool::new(json));
        let agent = builder.tool(command.clone()).tool(json.clone()).build();
        Self {
            agent,
            command,
            json,
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// Runs one command line. Failures come back as a readable message.
    pub async fn execute_command(&self, command: &str) -> String {
        let response = self.command.run(json!({ "command": command })).await;
        render(response, "Command failed")
    }

    pub async fn search_json(&self, file_path: &str, query: &str) -> String {
        let response = self
            .json
            .run(json!({ "file_path": file_path, "query": query }))
            .await;
        render(response, "Query failed")
    }

    pub async fn process(&self, task: &str) -> Result<String, SwitchyardError> {
        self.agent.process(task).await
    }

    pub async fn process_with_context(
        &self,
        task: &str,
        context: &Value,
    ) -> Result<String, SwitchyardError> {
        let task = format!("{task}\n\nContext: {}", display_value(context));
        self.agent.process(&task).await
    }

    pub fn tool_stats(&self) -> Vec<ToolStats> {
        vec![self.command.stats(), self.json.stats()]
    }

    pub fn reset_history(&self) {
        self.agent.reset_history();
    }
}

pub(crate) fn render(response: ToolResponse, failed: &str) -> String {
    if response.success {
        display_value(&response.result)
    } else {
        format!(
            "{failed}: {}",
            response.error.unwrap_or_else(|| "unknown error".to_string())
        )
    }
}

#[async_trait]
impl Subagent for ResearchAgent {
    fn name(&self) -> &str {
        self.agent.name()
    }

    async fn process(&self, task: &str) -> Result<String, SwitchyardError> {
        ResearchAgent::process(self, task).await
    }
}
