use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use switchyard_core::{Tool, ToolError, ToolErrorKind, Value};

/// Structured call into a named tool.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolRequest {
    pub tool_name: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

impl ToolRequest {
    pub fn new(tool_name: impl Into<String>, parameters: Value) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters,
            timeout_secs: None,
            metadata: serde_json::Map::new(),
        }
    }

    pub fn timeout_secs(mut self, secs: f64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

/// Outcome of a tool call. Failures are data, never errors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub success: bool,
    pub result: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ToolErrorKind>,
    /// Wall-clock seconds.
    pub execution_time: f64,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
}

impl ToolResponse {
    pub fn ok(result: Value, elapsed: Duration) -> Self {
        Self {
            success: true,
            result,
            error: None,
            error_kind: None,
            execution_time: elapsed.as_secs_f64(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn failure(error: &ToolError, elapsed: Duration) -> Self {
        Self {
            success: false,
            result: Value::Null,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            execution_time: elapsed.as_secs_f64(),
            metadata: serde_json::Map::new(),
        }
    }

    pub fn from_result(result: Result<Value, ToolError>, elapsed: Duration) -> Self {
        match result {
            Ok(value) => Self::ok(value, elapsed),
            Err(err) => Self::failure(&err, elapsed),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Runs `request` against `tool`, honouring the request's timeout.
pub async fn execute(tool: &dyn Tool, request: ToolRequest) -> ToolResponse {
    let started = Instant::now();
    let limit = match crate::timeout_from_secs(request.timeout_secs) {
        Ok(limit) => limit,
        Err(err) => {
            return ToolResponse::failure(&err, started.elapsed())
                .with_metadata("tool", request.tool_name);
        }
    };

    let call = tool.invoke(request.parameters);
    let result = match limit {
        Some(after) => match tokio::time::timeout(after, call).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Timeout {
                what: request.tool_name.clone(),
                after,
            }),
        },
        None => call.await,
    };

    let response = ToolResponse::from_result(result, started.elapsed());
    if let Some(error) = &response.error {
        tracing::warn!(tool = %request.tool_name, error = %error, "tool call failed");
    }
    let mut response = response.with_metadata("tool", request.tool_name);
    response.metadata.extend(request.metadata);
    response
}
