use crate::{GraphState, StateSchema};

#[derive(Debug, Clone)]
pub enum GraphEvent<S: StateSchema> {
    NodeEnter {
        node: String,
        timestamp: u64,
    },
    /// Carries the state as it stands after the node's update was applied.
    NodeExit {
        node: String,
        state: GraphState<S>,
        timestamp: u64,
    },
    Finished(GraphState<S>),
}

pub(crate) fn now_millis() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}
