use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use switchyard_core::{display_value, SwitchyardError, Value};
use switchyard_tools::{JsonQueryTool, ToolResponse, ToolStats, TrackedTool};

use crate::research::render;
use crate::{Agent, AgentBuilder, Subagent};

/// Runs jq queries over a data file and asks the model to interpret them.
pub struct AnalysisAgent {
    agent: Agent,
    json: Arc<TrackedTool<JsonQueryTool>>,
}

impl std::fmt::Debug for AnalysisAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalysisAgent")
            .field("agent", &self.agent)
            .finish_non_exhaustive()
    }
}

impl AnalysisAgent {
    pub fn new(builder: AgentBuilder) -> Self {
        Self::with_tool(builder, JsonQueryTool::new())
    }

    pub fn with_tool(builder: AgentBuilder, json: JsonQueryTool) -> Self {
        let json = Arc::new(TrackedTool::new(json));
        let agent = builder.tool(json.clone()).build();
        Self { agent, json }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub async fn analyze_json(&self, file_path: &str, query: &str) -> ToolResponse {
        self.json
            .run(json!({ "file_path": file_path, "query": query }))
            .await
    }

    /// Runs each named query, then summarises the collected results.
    /// Failed queries are reported to the model rather than aborting.
    pub async fn analyze_with_queries(
        &self,
        task: &str,
        file_path: &str,
        queries: &[(&str, &str)],
    ) -> Result<String, SwitchyardError> {
        let mut sections = Vec::with_capacity(queries.len());
        for (name, query) in queries {
            let response = self.analyze_json(file_path, query).await;
            sections.push(format!("{name}:\n{}", render(response, "Query failed")));
        }

        let prompt = format!(
            "Task: {task}\n\n\
             Query results:\n{}\n\n\
             Analyze these results and provide insights.",
            sections.join("\n\n")
        );
        self.agent.complete(&prompt).await
    }

    pub async fn compare_data(
        &self,
        file_path: &str,
        first_query: &str,
        second_query: &str,
        task: &str,
    ) -> Result<String, SwitchyardError> {
        let first = render(self.analyze_json(file_path, first_query).await, "Query failed");
        let second = render(self.analyze_json(file_path, second_query).await, "Query failed");
        let prompt = format!(
            "Task: {task}\n\n\
             Dataset 1 ({first_query}):\n{first}\n\n\
             Dataset 2 ({second_query}):\n{second}\n\n\
             Compare these datasets and describe the differences, similarities and notable patterns."
        );
        self.agent.complete(&prompt).await
    }

    pub async fn process(&self, task: &str) -> Result<String, SwitchyardError> {
        self.agent.process(task).await
    }

    pub async fn process_with_data(
        &self,
        task: &str,
        data: &Value,
    ) -> Result<String, SwitchyardError> {
        let pretty = serde_json::to_string_pretty(data).unwrap_or_else(|_| display_value(data));
        let task = format!("{task}\n\nData to analyze:\n{pretty}");
        self.agent.process(&task).await
    }

    pub fn tool_stats(&self) -> Vec<ToolStats> {
        vec![self.json.stats()]
    }

    pub fn reset_history(&self) {
        self.agent.reset_history();
    }
}

#[async_trait]
impl Subagent for AnalysisAgent {
    fn name(&self) -> &str {
        self.agent.name()
    }

    async fn process(&self, task: &str) -> Result<String, SwitchyardError> {
        AnalysisAgent::process(self, task).await
    }
}
