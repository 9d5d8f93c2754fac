//! Subprocess-backed tools exposed through the standard tool-calling convention.
//!
//! Every tool implements [`switchyard_core::Tool`]. [`TrackedTool`] adds call
//! statistics and converts failures into tagged [`ToolResponse`]s so callers
//! can branch on `success` instead of handling errors.

mod command;
mod envelope;
mod json_query;
mod registry;
mod tracked;

pub use command::{tokenize, CommandArgs, CommandTool, DEFAULT_ALLOWED_COMMANDS};
pub use envelope::{execute, ToolRequest, ToolResponse};
pub use json_query::{field_path_to_query, JsonQueryArgs, JsonQueryTool, JsonSource};
pub use registry::ToolRegistry;
pub use tracked::{ToolStats, TrackedTool};

pub(crate) fn schema_value<T: schemars::JsonSchema>() -> switchyard_core::Value {
    serde_json::to_value(schemars::schema_for!(T)).unwrap_or(switchyard_core::Value::Null)
}

/// Converts a caller-supplied `timeout_secs` into a [`std::time::Duration`].
/// Rejects zero, negative, non-finite and out-of-range values.
pub(crate) fn timeout_from_secs(
    secs: Option<f64>,
) -> Result<Option<std::time::Duration>, switchyard_core::ToolError> {
    let Some(secs) = secs else {
        return Ok(None);
    };
    if secs.is_nan() || secs <= 0.0 {
        return Err(switchyard_core::ToolError::InvalidInput(format!(
            "timeout_secs must be positive, got {secs}"
        )));
    }
    std::time::Duration::try_from_secs_f64(secs)
        .map(Some)
        .map_err(|err| {
            switchyard_core::ToolError::InvalidInput(format!(
                "timeout_secs {secs} is out of range: {err}"
            ))
        })
}
