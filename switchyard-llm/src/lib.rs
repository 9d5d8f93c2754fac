// OpenAI-compatible client (OpenAI, Azure-style gateways, local servers)
pub mod openai_compatible;

mod scripted;

pub use switchyard_core::{LlmRequest, LlmResponse, Message, Role, ToolCall, ToolSpec};

pub use openai_compatible::{
    parse_sse_line, ChatCompletionRequest, OpenAiCompatibleBuilder, OpenAiCompatibleClient,
    SseLine, SseLineBuffer, DEFAULT_BASE_URL, DEFAULT_MODEL,
};
pub use scripted::ScriptedLlm;
