mod agent;
mod analysis;
mod cache;
mod coordinator;
mod cost;
mod research;
mod role;
mod validation;
mod workflow;

pub use agent::{Agent, AgentBuilder, DEFAULT_MAX_TOOL_ROUNDS};
pub use analysis::AnalysisAgent;
pub use cache::{CacheStats, ResponseCache};
pub use coordinator::{CoordinatorAgent, Subagent};
pub use cost::{CallCost, CostSummary, CostTracker, ModelPricing};
pub use research::ResearchAgent;
pub use role::{AgentRole, NextAgent};
pub use validation::{TaskInput, ValidationError, DANGEROUS_PATTERNS};
pub use workflow::{
    build_workflow, initial_state, run_workflow, stream_workflow, WorkflowState,
};
