use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    Coordinator,
    Research,
    Analysis,
}

impl AgentRole {
    pub fn default_name(self) -> &'static str {
        match self {
            AgentRole::Coordinator => "coordinator",
            AgentRole::Research => "research",
            AgentRole::Analysis => "analysis",
        }
    }

    /// Tools an agent in this role may call.
    pub fn allowed_tools(self) -> &'static [&'static str] {
        match self {
            AgentRole::Coordinator => &[],
            AgentRole::Research => &["execute_command", "search_json"],
            AgentRole::Analysis => &["search_json"],
        }
    }

    pub fn may_use(self, tool: &str) -> bool {
        self.allowed_tools().contains(&tool)
    }

    pub fn system_prompt(self, agent_name: &str, subagents: &[String]) -> String {
        match self {
            AgentRole::Coordinator => {
                let available = if subagents.is_empty() {
                    "none".to_string()
                } else {
                    subagents.join(", ")
                };
                format!(
                    "You are a coordinator agent named '{agent_name}'.\n\
                     Your role is to analyze tasks and coordinate their execution.\n\n\
                     Available subagents: {available}\n\n\
                     For this task, provide a clear response or indicate which subagent should handle it."
                )
            }
            AgentRole::Research => format!(
                "You are a research agent named '{agent_name}'.\n\
                 Your role is to gather information using available tools.\n\n\
                 Available tools:\n\
                 - execute_command: Run safe system commands (echo, ls, cat, date, pwd, whoami, uname)\n\
                 - search_json: Query JSON files using jq syntax\n\n\
                 For the given task, describe what information you would gather and how."
            ),
            AgentRole::Analysis => format!(
                "You are an analysis agent named '{agent_name}'.\n\
                 Your role is to analyze data and provide insights.\n\n\
                 You can identify patterns and trends, generate summaries, compare data points,\n\
                 provide statistical insights and make recommendations based on data.\n\n\
                 Provide clear, structured analysis with specific findings."
            ),
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.default_name())
    }
}

/// Where the workflow goes after the coordinator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAgent {
    Research,
    Analysis,
    Terminal,
}

impl NextAgent {
    /// Reads a routing decision out of free-form model output.
    /// Anything that names neither subagent goes to research.
    pub fn from_reply(reply: &str) -> Self {
        let reply = reply.to_lowercase();
        if reply.contains("research") {
            NextAgent::Research
        } else if reply.contains("analysis") {
            NextAgent::Analysis
        } else {
            NextAgent::Research
        }
    }

    /// Graph node name for this decision.
    pub fn node(self) -> Option<&'static str> {
        match self {
            NextAgent::Research => Some("research"),
            NextAgent::Analysis => Some("analysis"),
            NextAgent::Terminal => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_reply_parsing() {
        assert_eq!(NextAgent::from_reply("research_agent"), NextAgent::Research);
        assert_eq!(NextAgent::from_reply("Use the ANALYSIS agent"), NextAgent::Analysis);
        assert_eq!(NextAgent::from_reply("no idea"), NextAgent::Research);
    }

    #[test]
    fn roles_gate_tools() {
        assert!(AgentRole::Research.may_use("execute_command"));
        assert!(!AgentRole::Analysis.may_use("execute_command"));
        assert!(AgentRole::Coordinator.allowed_tools().is_empty());
    }

    #[test]
    fn coordinator_prompt_lists_subagents() {
        let prompt = AgentRole::Coordinator
            .system_prompt("boss", &["research".to_string(), "analysis".to_string()]);
        assert!(prompt.contains("'boss'"));
        assert!(prompt.contains("research, analysis"));
    }
}
