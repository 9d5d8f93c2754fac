use std::collections::VecDeque;
use std::sync::Mutex;

use futures::stream::{self, BoxStream, StreamExt};

use switchyard_core::{
    LlmRequest, LlmResponse, Role, Runnable, StreamEvent, SwitchyardError, ToolCallingLlm,
};

/// Deterministic LLM that replays queued responses in order.
///
/// Once the queue is drained it echoes the last user message, which keeps
/// offline demos and tests running without a provider.
#[derive(Debug, Default)]
pub struct ScriptedLlm {
    responses: Mutex<VecDeque<LlmResponse>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedLlm {
    pub fn new(responses: Vec<LlmResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn from_texts<I, T>(texts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self::new(texts.into_iter().map(LlmResponse::text).collect())
    }

    pub fn echo() -> Self {
        Self::default()
    }

    pub fn push(&self, response: LlmResponse) {
        self.responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push_back(response);
    }

    /// Every request seen so far, oldest first.
    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn next_response(&self, request: &LlmRequest) -> LlmResponse {
        self.requests
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(request.clone());

        let queued = self
            .responses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front();

        queued.unwrap_or_else(|| {
            let last_user = request
                .messages
                .iter()
                .rev()
                .find(|message| message.role == Role::User)
                .map(|message| message.content.as_str())
                .unwrap_or_default();
            LlmResponse::text(format!("echo: {last_user}"))
        })
    }
}

#[async_trait::async_trait]
impl ToolCallingLlm for ScriptedLlm {
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, SwitchyardError> {
        Ok(self.next_response(&request))
    }

    /// Emits the scripted answer word by word, then the full text.
    fn stream_response(
        &self,
        request: LlmRequest,
    ) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        let content = self.next_response(&request).content;
        let mut events: Vec<Result<StreamEvent, SwitchyardError>> = content
            .split_inclusive(' ')
            .map(|word| Ok(StreamEvent::ContentChunk(word.to_string())))
            .collect();
        events.push(Ok(StreamEvent::FinalAnswer(content)));
        stream::iter(events).boxed()
    }
}

#[async_trait::async_trait]
impl Runnable<LlmRequest, LlmResponse> for ScriptedLlm {
    async fn invoke(&self, input: LlmRequest) -> Result<LlmResponse, SwitchyardError> {
        Ok(self.next_response(&input))
    }

    fn stream(&self, input: LlmRequest) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        <Self as ToolCallingLlm>::stream_response(self, input)
    }
}
