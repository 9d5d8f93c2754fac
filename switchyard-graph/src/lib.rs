mod config;
mod error;
mod graph;
mod observer;
mod reducer;
mod state;
mod stream;

pub use config::{ExecutionConfig, ExecutionOptions};
pub use error::GraphError;
pub use graph::{ExecutableGraph, GraphBuilder, GraphNode, END};
pub use observer::{Observer, TracingObserver};
pub use reducer::{AppendVec, MergeMap, Override};
pub use state::{GraphState, StateSchema, StateUpdate};
pub use stream::GraphEvent;
