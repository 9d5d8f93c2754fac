use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};

use switchyard_core::{Message, Runnable, StreamEvent, SwitchyardError};
use switchyard_graph::{
    AppendVec, ExecutableGraph, GraphBuilder, GraphError, GraphEvent, GraphState, MergeMap,
    Override, StateSchema, StateUpdate, TracingObserver, END,
};

use crate::{AnalysisAgent, CoordinatorAgent, NextAgent, ResearchAgent, Subagent};

const COORDINATOR: &str = "coordinator";
const RESEARCH: &str = "research";
const ANALYSIS: &str = "analysis";

/// Shared state of the coordinator/subagent workflow.
///
/// Node outputs are deltas: `messages` and `agent_history` are appended,
/// `results` are merged by agent name and `next_agent` is replaced by every
/// update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub messages: Vec<Message>,
    pub current_task: String,
    pub results: BTreeMap<String, String>,
    pub agent_history: Vec<String>,
    pub error: Option<String>,
    pub next_agent: Option<NextAgent>,
    pub final_output: Option<String>,
}

impl StateSchema for WorkflowState {
    fn merge(current: &Self, update: Self) -> Self {
        let current_task = if update.current_task.is_empty() {
            current.current_task.clone()
        } else {
            update.current_task
        };
        Self {
            messages: AppendVec::merge(&current.messages, update.messages),
            current_task,
            results: MergeMap::merge(&current.results, update.results),
            agent_history: AppendVec::merge(&current.agent_history, update.agent_history),
            error: Override::merge(&current.error, update.error),
            next_agent: update.next_agent,
            final_output: Override::merge(&current.final_output, update.final_output),
        }
    }
}

pub fn initial_state(task: &str) -> WorkflowState {
    WorkflowState {
        messages: vec![Message::user(task)],
        current_task: task.to_string(),
        ..Default::default()
    }
}

struct CoordinatorNode(Arc<CoordinatorAgent>);

#[async_trait]
impl Runnable<GraphState<WorkflowState>, StateUpdate<WorkflowState>> for CoordinatorNode {
    async fn invoke(
        &self,
        input: GraphState<WorkflowState>,
    ) -> Result<StateUpdate<WorkflowState>, SwitchyardError> {
        let state = input.data;
        let name = self.0.agent().name().to_string();

        if !state.results.is_empty() {
            let summary = self.0.aggregate_results(&state.results).await?;
            return Ok(StateUpdate::new(WorkflowState {
                messages: vec![Message::assistant(summary.clone())],
                agent_history: vec![name],
                next_agent: Some(NextAgent::Terminal),
                final_output: Some(summary),
                ..Default::default()
            }));
        }

        let route = self.0.decide_route(&state.current_task).await?;
        Ok(StateUpdate::new(WorkflowState {
            agent_history: vec![name],
            next_agent: Some(route),
            ..Default::default()
        }))
    }

    fn stream(
        &self,
        _input: GraphState<WorkflowState>,
    ) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        stream::empty().boxed()
    }
}

/// Runs one subagent on the current task. Failures are recorded in the
/// state so the coordinator can still aggregate.
struct SubagentNode(Arc<dyn Subagent>);

#[async_trait]
impl Runnable<GraphState<WorkflowState>, StateUpdate<WorkflowState>> for SubagentNode {
    async fn invoke(
        &self,
        input: GraphState<WorkflowState>,
    ) -> Result<StateUpdate<WorkflowState>, SwitchyardError> {
        let name = self.0.name().to_string();
        let mut update = WorkflowState {
            agent_history: vec![name.clone()],
            ..Default::default()
        };

        match self.0.process(&input.data.current_task).await {
            Ok(result) => {
                update.messages.push(Message::assistant(result.clone()));
                update.results.insert(name, result);
            }
            Err(err) => {
                tracing::warn!(agent = %name, error = %err, "subagent failed");
                let message = format!("Error: {err}");
                update.results.insert(name.clone(), message.clone());
                update.error = Some(format!("{name}: {err}"));
            }
        }
        Ok(StateUpdate::new(update))
    }

    fn stream(
        &self,
        _input: GraphState<WorkflowState>,
    ) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        stream::empty().boxed()
    }
}

/// Wires coordinator, research and analysis into the routing graph.
///
/// The coordinator routes on `next_agent`; both subagents always return to
/// the coordinator, which ends the run once it has aggregated results.
pub fn build_workflow(
    coordinator: Arc<CoordinatorAgent>,
    research: Arc<ResearchAgent>,
    analysis: Arc<AnalysisAgent>,
) -> Result<ExecutableGraph<WorkflowState>, GraphError> {
    GraphBuilder::new()
        .add_node(COORDINATOR, CoordinatorNode(coordinator))
        .add_node(RESEARCH, SubagentNode(research))
        .add_node(ANALYSIS, SubagentNode(analysis))
        .set_entry(COORDINATOR)
        .add_conditional_edge(COORDINATOR, |state: &GraphState<WorkflowState>| {
            state
                .data
                .next_agent
                .and_then(NextAgent::node)
                .unwrap_or(END)
                .to_string()
        })
        .add_edge(RESEARCH, COORDINATOR)
        .add_edge(ANALYSIS, COORDINATOR)
        .with_observer(Arc::new(TracingObserver))
        .build()
}

pub async fn run_workflow(
    graph: &ExecutableGraph<WorkflowState>,
    task: &str,
) -> Result<WorkflowState, GraphError> {
    tracing::info!(task = %switchyard_core::truncate_preview(task, 80), "workflow started");
    let state = graph.invoke(GraphState::new(initial_state(task))).await?.data;
    tracing::info!(
        path = %state.agent_history.join(" -> "),
        error = ?state.error,
        "workflow finished"
    );
    Ok(state)
}

/// Yields an event as each node starts and finishes.
pub fn stream_workflow<'a>(
    graph: &'a ExecutableGraph<WorkflowState>,
    task: &str,
) -> BoxStream<'a, Result<GraphEvent<WorkflowState>, GraphError>> {
    graph.stream_invoke(GraphState::new(initial_state(task)))
}
