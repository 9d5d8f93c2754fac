use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use switchyard_core::{Tool, ToolError, ToolSpec};

use crate::{execute, ToolRequest, ToolResponse};

/// Name-indexed set of tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.values().map(|tool| tool.spec()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub async fn dispatch(&self, request: ToolRequest) -> ToolResponse {
        match self.tools.get(&request.tool_name) {
            Some(tool) => execute(tool.as_ref(), request).await,
            None => {
                let err = ToolError::InvalidInput(format!("unknown tool '{}'", request.tool_name));
                ToolResponse::failure(&err, Duration::ZERO).with_metadata("tool", request.tool_name)
            }
        }
    }
}
