use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use switchyard_core::{Runnable, StreamEvent, SwitchyardError};
use switchyard_graph::{
    ExecutionConfig, ExecutionOptions, GraphBuilder, GraphState, StateSchema, StateUpdate,
};

#[derive(Clone, Default, Debug, Serialize, Deserialize, PartialEq)]
struct DemoState {
    count: i32,
}

impl StateSchema for DemoState {}

struct Inc;

#[async_trait::async_trait]
impl Runnable<GraphState<DemoState>, StateUpdate<DemoState>> for Inc {
    async fn invoke(
        &self,
        input: GraphState<DemoState>,
    ) -> Result<StateUpdate<DemoState>, SwitchyardError> {
        Ok(StateUpdate::new(DemoState {
            count: input.data.count + 1,
        }))
    }

    fn stream(
        &self,
        _input: GraphState<DemoState>,
    ) -> futures::stream::BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        futures::stream::empty().boxed()
    }
}

#[tokio::test]
async fn graph_enforces_max_steps() {
    let graph = GraphBuilder::new()
        .add_node("inc", Inc)
        .add_edge("inc", "inc")
        .set_entry("inc")
        .build()
        .unwrap();

    let state = GraphState::new(DemoState { count: 0 });
    let options = ExecutionOptions {
        max_steps: Some(2),
        ..Default::default()
    };
    let err = graph.invoke_with_options(state, options).await.unwrap_err();
    assert!(err.to_string().contains("Max steps exceeded"));
}

#[tokio::test]
async fn default_limit_stops_runaway_loops() {
    let graph = GraphBuilder::new()
        .add_node("inc", Inc)
        .add_edge("inc", "inc")
        .set_entry("inc")
        .build()
        .unwrap();

    let err = graph
        .invoke(GraphState::new(DemoState::default()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("limit 50"));
}

#[tokio::test]
async fn graph_options_override_defaults() {
    let graph = GraphBuilder::new()
        .with_default_config(ExecutionConfig { max_steps: Some(1) })
        .add_node("one", Inc)
        .add_node("two", Inc)
        .add_edge("one", "two")
        .set_entry("one")
        .build()
        .unwrap();

    let err = graph
        .invoke(GraphState::new(DemoState::default()))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("limit 1"));

    let out = graph
        .invoke_with_options(
            GraphState::new(DemoState::default()),
            ExecutionOptions {
                max_steps: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(out.data.count, 2);
}

#[test]
fn execution_config_defaults_and_merge() {
    let defaults = ExecutionConfig::default();
    assert_eq!(defaults.max_steps, Some(50));

    let merged = defaults.merge(&ExecutionOptions {
        max_steps: Some(5),
        observer: None,
    });
    assert_eq!(merged.max_steps, Some(5));

    let merged_empty = defaults.merge(&ExecutionOptions::default());
    assert_eq!(merged_empty.max_steps, Some(50));
}
