//! Generic OpenAI-compatible LLM client
//!
//! Speaks the `/chat/completions` dialect used by OpenAI and the many providers
//! that mirror it, including function-style tool calling and SSE streaming.

use std::time::Duration;

use futures::stream::{BoxStream, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use url::Url;

use switchyard_core::{
    LlmRequest, LlmResponse, Message, Role, Runnable, StreamEvent, SwitchyardError, TokenUsage,
    ToolCall, ToolCallingLlm, ToolSpec,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Request body for chat completions endpoint
#[derive(Serialize, Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<WireTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WireMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<WireToolCall>>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WireTool {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: WireFunctionSpec,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct WireFunctionSpec {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WireToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: WireFunctionCall,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WireFunctionCall {
    pub name: String,
    /// JSON-encoded arguments, as the API transmits them.
    pub arguments: String,
}

fn function_kind() -> String {
    "function".to_string()
}

/// Non-streaming response from chat completions
#[derive(Deserialize, Debug, Clone)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Choice {
    #[serde(default)]
    pub index: u32,
    pub message: WireMessage,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Copy)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Streaming chunk (server-sent events)
#[derive(Deserialize, Debug, Clone)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub id: String,
    pub choices: Vec<ChunkChoice>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChunkChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Delta {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// OpenAI-style error response
#[derive(Deserialize, Debug, Clone)]
pub struct OpenAiError {
    pub error: ErrorDetail,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
    pub code: Option<String>,
}

/// One parsed line of an SSE body.
#[derive(Debug, Clone, PartialEq)]
pub enum SseLine {
    Delta(String),
    Done,
    Skip,
}

/// Parses a single line of a chat-completions SSE stream.
pub fn parse_sse_line(line: &str) -> Result<SseLine, SwitchyardError> {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(SseLine::Skip);
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(SseLine::Done);
    }
    if data.is_empty() {
        return Ok(SseLine::Skip);
    }
    let chunk: ChatCompletionChunk = serde_json::from_str(data)?;
    let text: String = chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .collect();
    if text.is_empty() {
        Ok(SseLine::Skip)
    } else {
        Ok(SseLine::Delta(text))
    }
}

/// Accumulates raw body bytes and yields complete lines.
///
/// Lines are only decoded once their terminating `\n` has arrived, so a
/// multi-byte character split across network chunks stays intact.
#[derive(Debug, Default)]
pub struct SseLineBuffer {
    pending: Vec<u8>,
}

impl SseLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and drains every line that is now complete.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(newline) = self.pending.iter().position(|byte| *byte == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// Returns whatever trailing bytes never saw a newline.
    pub fn finish(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(String::from_utf8_lossy(&rest).into_owned())
    }
}

fn role_name(role: &Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        let tool_calls = if message.tool_calls.is_empty() {
            None
        } else {
            Some(
                message
                    .tool_calls
                    .iter()
                    .map(|call| WireToolCall {
                        id: call.id.clone(),
                        kind: function_kind(),
                        function: WireFunctionCall {
                            name: call.name.clone(),
                            arguments: call.args.to_string(),
                        },
                    })
                    .collect(),
            )
        };
        Self {
            role: role_name(&message.role).to_string(),
            content: Some(message.content.clone()),
            tool_call_id: message.tool_call_id.clone(),
            tool_calls,
        }
    }
}

impl From<&ToolSpec> for WireTool {
    fn from(spec: &ToolSpec) -> Self {
        Self {
            kind: function_kind(),
            function: WireFunctionSpec {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.parameters.clone(),
            },
        }
    }
}

fn parse_tool_call(call: WireToolCall) -> Result<ToolCall, SwitchyardError> {
    let args = if call.function.arguments.trim().is_empty() {
        serde_json::Value::Object(Default::default())
    } else {
        serde_json::from_str(&call.function.arguments).map_err(|err| {
            SwitchyardError::ParseFailed {
                output: call.function.arguments.clone(),
                reason: err.to_string(),
            }
        })?
    };
    Ok(ToolCall {
        id: call.id,
        name: call.function.name,
        args,
    })
}

impl TryFrom<ChatCompletionResponse> for LlmResponse {
    type Error = SwitchyardError;

    fn try_from(response: ChatCompletionResponse) -> Result<Self, Self::Error> {
        let choice = response.choices.into_iter().next().ok_or_else(|| {
            SwitchyardError::LlmProvider("response contained no choices".to_string())
        })?;
        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(parse_tool_call)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LlmResponse {
            content: choice.message.content.unwrap_or_default(),
            tool_calls,
            usage: response.usage.map(|usage| TokenUsage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
                total_tokens: usage.total_tokens,
            }),
        })
    }
}

#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: SecretString,
    default_model: String,
    temperature: Option<f32>,
}

impl std::fmt::Debug for OpenAiCompatibleClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleClient")
            .field("base_url", &self.base_url.as_str())
            .field("default_model", &self.default_model)
            .finish_non_exhaustive()
    }
}

impl OpenAiCompatibleClient {
    pub fn builder() -> OpenAiCompatibleBuilder {
        OpenAiCompatibleBuilder::default()
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    pub fn set_default_model(&mut self, model: impl Into<String>) {
        self.default_model = model.into();
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    fn build_request(&self, input: LlmRequest, stream: bool) -> ChatCompletionRequest {
        let model = if input.model.is_empty() {
            self.default_model.clone()
        } else {
            input.model
        };
        let tools = if input.tools.is_empty() {
            None
        } else {
            Some(input.tools.iter().map(WireTool::from).collect())
        };
        ChatCompletionRequest {
            model,
            messages: input.messages.iter().map(WireMessage::from).collect(),
            tools,
            temperature: self.temperature,
            max_tokens: None,
            stream,
        }
    }

    async fn send(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<reqwest::Response, SwitchyardError> {
        tracing::debug!(model = %request.model, stream = request.stream, "chat completion request");
        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|err| SwitchyardError::LlmProvider(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<OpenAiError>(&body)
            .map(|err| err.error.message)
            .unwrap_or(body);
        Err(SwitchyardError::LlmProvider(format!("{status}: {message}")))
    }
}

#[async_trait::async_trait]
impl Runnable<LlmRequest, LlmResponse> for OpenAiCompatibleClient {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, SwitchyardError> {
        let request = self.build_request(input, false);
        let response: ChatCompletionResponse = self
            .send(&request)
            .await?
            .json()
            .await
            .map_err(|err| SwitchyardError::LlmProvider(err.to_string()))?;
        LlmResponse::try_from(response)
    }

    fn stream(&self, input: LlmRequest) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        let request = self.build_request(input, true);
        async_stream::try_stream! {
            let response = self.send(&request).await?;
            let mut body = Box::pin(response.bytes_stream());
            let mut lines = SseLineBuffer::new();
            let mut answer = String::new();
            let mut done = false;

            while !done {
                let Some(chunk) = body.next().await else {
                    break;
                };
                let chunk = chunk.map_err(|err| SwitchyardError::LlmProvider(err.to_string()))?;

                for line in lines.push(&chunk) {
                    match parse_sse_line(&line)? {
                        SseLine::Delta(text) => {
                            answer.push_str(&text);
                            yield StreamEvent::ContentChunk(text);
                        }
                        SseLine::Done => {
                            done = true;
                            break;
                        }
                        SseLine::Skip => {}
                    }
                }
            }

            if !done {
                if let Some(line) = lines.finish() {
                    if let SseLine::Delta(text) = parse_sse_line(&line)? {
                        answer.push_str(&text);
                        yield StreamEvent::ContentChunk(text);
                    }
                }
            }

            yield StreamEvent::FinalAnswer(answer);
        }
        .boxed()
    }
}

#[async_trait::async_trait]
impl ToolCallingLlm for OpenAiCompatibleClient {
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, SwitchyardError> {
        <Self as Runnable<LlmRequest, LlmResponse>>::invoke(self, request).await
    }

    fn stream_response(
        &self,
        request: LlmRequest,
    ) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        <Self as Runnable<LlmRequest, LlmResponse>>::stream(self, request)
    }
}

#[derive(Default)]
pub struct OpenAiCompatibleBuilder {
    base_url: Option<Url>,
    api_key: Option<SecretString>,
    default_model: Option<String>,
    temperature: Option<f32>,
    timeout: Option<Duration>,
}

impl OpenAiCompatibleBuilder {
    /// Seeds the builder from `OPENAI_API_KEY`, `OPENAI_BASE_URL` and `OPENAI_MODEL`.
    pub fn from_env() -> Result<Self, SwitchyardError> {
        let mut builder = Self::default();
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                builder = builder.api_key(key);
            }
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            builder = builder.base_url(&base_url)?;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            builder = builder.default_model(model);
        }
        Ok(builder)
    }

    pub fn base_url(mut self, base_url: &str) -> Result<Self, SwitchyardError> {
        let url = Url::parse(base_url).map_err(|err| {
            SwitchyardError::InvalidConfig(format!("invalid base url '{base_url}': {err}"))
        })?;
        self.base_url = Some(url);
        Ok(self)
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::new(api_key.into()));
        self
    }

    pub fn default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<OpenAiCompatibleClient, SwitchyardError> {
        let api_key = self.api_key.ok_or_else(|| {
            SwitchyardError::InvalidConfig("OPENAI_API_KEY is not set".to_string())
        })?;
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_BASE_URL)
                .map_err(|err| SwitchyardError::InvalidConfig(err.to_string()))?,
        };
        let http = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(Duration::from_secs(60)))
            .build()
            .map_err(|err| SwitchyardError::LlmProvider(err.to_string()))?;

        Ok(OpenAiCompatibleClient {
            http,
            base_url,
            api_key,
            default_model: self
                .default_model
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature,
        })
    }
}
