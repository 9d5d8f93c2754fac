use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Value;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("command not permitted: '{command}' (allowed: {allowed})")]
    NotPermitted { command: String, allowed: String },
    #[error("timed out after {after:?}: {what}")]
    Timeout { what: String, after: Duration },
    #[error("'{command}' exited with code {code:?}: {stderr}")]
    NonZeroExit {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("file not found: {0}")]
    FileNotFound(String),
    #[error("query processor '{0}' is not installed")]
    ProcessorMissing(String),
    #[error("malformed query '{query}': {stderr}")]
    MalformedQuery { query: String, stderr: String },
    #[error("execution failed: {0}")]
    ExecutionFailed(String),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable tag for each failure path, so callers can branch without string matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidInput,
    NotPermitted,
    Timeout,
    ExecutionError,
    FileNotFound,
    ProcessorMissing,
    MalformedQuery,
}

impl ToolError {
    pub fn kind(&self) -> ToolErrorKind {
        match self {
            ToolError::InvalidInput(_) | ToolError::Json(_) => ToolErrorKind::InvalidInput,
            ToolError::NotPermitted { .. } => ToolErrorKind::NotPermitted,
            ToolError::Timeout { .. } => ToolErrorKind::Timeout,
            ToolError::NonZeroExit { .. } | ToolError::ExecutionFailed(_) | ToolError::Io(_) => {
                ToolErrorKind::ExecutionError
            }
            ToolError::FileNotFound(_) => ToolErrorKind::FileNotFound,
            ToolError::ProcessorMissing(_) => ToolErrorKind::ProcessorMissing,
            ToolError::MalformedQuery { .. } => ToolErrorKind::MalformedQuery,
        }
    }
}

#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> Value;
    async fn invoke(&self, args: Value) -> Result<Value, ToolError>;

    fn spec(&self) -> crate::ToolSpec {
        crate::ToolSpec {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.schema(),
        }
    }
}
