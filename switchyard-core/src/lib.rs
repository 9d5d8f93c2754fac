mod circuit_breaker;
mod error;
mod fallbacks;
mod llm;
mod retry;
mod runnable;
mod tool;
mod value;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
pub use error::SwitchyardError;
pub use fallbacks::RunnableWithFallbacks;
pub use llm::{
    LlmRequest, LlmResponse, Message, Role, TokenUsage, ToolCall, ToolCallingLlm, ToolSpec,
};
pub use retry::{is_retryable, Retrying};
pub use runnable::{Runnable, RunnableExt, StreamEvent};
pub use tool::{Tool, ToolError, ToolErrorKind};
pub use value::{display_value, truncate_preview, Value};
