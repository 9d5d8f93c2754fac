use switchyard_core::SwitchyardError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node failed: {node}: {source}")]
    NodeFailed {
        node: String,
        #[source]
        source: SwitchyardError,
    },
    #[error("missing node: {node}")]
    MissingNode { node: String },
    #[error("invalid edge from '{from}' to '{to}'")]
    InvalidEdge { from: String, to: String },
    #[error("graph has no entry node")]
    MissingEntry,
    #[error("Max steps exceeded: reached {reached}, limit {max}")]
    MaxStepsExceeded { max: usize, reached: usize },
}
