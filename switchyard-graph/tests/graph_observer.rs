use std::sync::{Arc, Mutex};

use futures::stream::StreamExt;
use serde::{Deserialize, Serialize};
use switchyard_core::{Runnable, StreamEvent, SwitchyardError};
use switchyard_graph::{
    ExecutionOptions, GraphBuilder, GraphError, GraphEvent, GraphState, Observer, StateSchema,
    StateUpdate, TracingObserver,
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

#[derive(Default)]
struct CollectingObserver {
    events: Arc<Mutex<Vec<String>>>,
}

#[async_trait::async_trait]
impl Observer for CollectingObserver {
    async fn on_node_start(&self, node: &str, _input: &serde_json::Value) {
        self.events.lock().unwrap().push(format!("start:{node}"));
    }

    async fn on_node_end(&self, node: &str, output: &serde_json::Value, _duration_ms: u128) {
        self.events
            .lock()
            .unwrap()
            .push(format!("end:{node}:{}", output["count"]));
    }

    async fn on_error(&self, node: &str, _error: &GraphError) {
        self.events.lock().unwrap().push(format!("error:{node}"));
    }
}

#[tokio::test]
async fn observer_receives_node_events() {
    let observer = CollectingObserver::default();
    let events = observer.events.clone();
    let graph = GraphBuilder::new()
        .add_node("inc", Inc)
        .add_node("inc2", Inc)
        .add_edge("inc", "inc2")
        .set_entry("inc")
        .with_observer(Arc::new(observer))
        .build()
        .unwrap();

    graph
        .invoke(GraphState::new(DemoState { count: 0 }))
        .await
        .unwrap();
    assert_eq!(
        events.lock().unwrap().as_slice(),
        ["start:inc", "end:inc:1", "start:inc2", "end:inc2:2"]
    );
}

#[tokio::test]
async fn per_call_observer_replaces_default() {
    let default_observer = CollectingObserver::default();
    let default_events = default_observer.events.clone();
    let call_observer = CollectingObserver::default();
    let call_events = call_observer.events.clone();

    let graph = GraphBuilder::new()
        .add_node("inc", Inc)
        .set_entry("inc")
        .with_observer(Arc::new(default_observer))
        .build()
        .unwrap();

    let options = ExecutionOptions {
        observer: Some(Arc::new(call_observer)),
        ..Default::default()
    };
    graph
        .invoke_with_options(GraphState::new(DemoState::default()), options)
        .await
        .unwrap();

    assert!(default_events.lock().unwrap().is_empty());
    assert_eq!(call_events.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn stream_emits_node_events() {
    let graph = GraphBuilder::new()
        .add_node("inc", Inc)
        .add_node("inc2", Inc)
        .add_edge("inc", "inc2")
        .set_entry("inc")
        .build()
        .unwrap();

    let events: Vec<GraphEvent<DemoState>> = graph
        .stream_invoke(GraphState::new(DemoState { count: 0 }))
        .map(|event| event.unwrap())
        .collect()
        .await;

    assert_eq!(events.len(), 5);
    assert!(matches!(&events[0], GraphEvent::NodeEnter { node, .. } if node == "inc"));
    assert!(
        matches!(&events[1], GraphEvent::NodeExit { node, state, .. } if node == "inc" && state.data.count == 1)
    );
    assert!(matches!(&events[2], GraphEvent::NodeEnter { node, .. } if node == "inc2"));
    assert!(matches!(&events[4], GraphEvent::Finished(state) if state.data.count == 2));
}

#[tokio::test]
async fn tracing_observer_leaves_results_untouched() {
    let graph = GraphBuilder::new()
        .add_node("inc", Inc)
        .add_node("inc2", Inc)
        .add_edge("inc", "inc2")
        .set_entry("inc")
        .with_observer(Arc::new(TracingObserver))
        .build()
        .unwrap();

    let out = graph.invoke(GraphState::new(DemoState::default())).await.unwrap();
    assert_eq!(out.data.count, 2);
}
