use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::stream::BoxStream;

use switchyard_core::{
    display_value, LlmRequest, LlmResponse, Message, StreamEvent, SwitchyardError, Tool,
    ToolCall, ToolCallingLlm,
};
use switchyard_middleware::{AgentRequest, AgentResponse, MiddlewareChain};
use switchyard_tools::{execute, ToolRegistry, ToolRequest};

use crate::{AgentRole, CostTracker, ResponseCache};

pub const DEFAULT_MAX_TOOL_ROUNDS: usize = 3;

/// A role-labelled wrapper around one LLM.
///
/// Every call passes through the optional middleware chain. `process` keeps a
/// conversation history and lets the model call the tools its role permits;
/// `complete` is a one-shot call without history or tools.
pub struct Agent {
    name: String,
    role: AgentRole,
    llm: Arc<dyn ToolCallingLlm>,
    model: String,
    middleware: Option<MiddlewareChain>,
    tools: ToolRegistry,
    history: Mutex<Vec<Message>>,
    max_tool_rounds: usize,
    cache: Option<Arc<ResponseCache>>,
    costs: Option<Arc<CostTracker>>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("model", &self.model)
            .field("tools", &self.tools.names())
            .finish_non_exhaustive()
    }
}

pub struct AgentBuilder {
    name: Option<String>,
    role: AgentRole,
    llm: Arc<dyn ToolCallingLlm>,
    model: String,
    middleware: Option<MiddlewareChain>,
    tools: ToolRegistry,
    max_tool_rounds: usize,
    cache: Option<Arc<ResponseCache>>,
    costs: Option<Arc<CostTracker>>,
}

impl AgentBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Model sent with each request. Empty lets the client pick its default.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn middleware(mut self, chain: MiddlewareChain) -> Self {
        self.middleware = Some(chain);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools = self.tools.register(tool);
        self
    }

    pub fn max_tool_rounds(mut self, rounds: usize) -> Self {
        self.max_tool_rounds = rounds;
        self
    }

    pub fn cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cost_tracker(mut self, costs: Arc<CostTracker>) -> Self {
        self.costs = Some(costs);
        self
    }

    pub fn build(self) -> Agent {
        Agent {
            name: self
                .name
                .unwrap_or_else(|| self.role.default_name().to_string()),
            role: self.role,
            llm: self.llm,
            model: self.model,
            middleware: self.middleware,
            tools: self.tools,
            history: Mutex::new(Vec::new()),
            max_tool_rounds: self.max_tool_rounds,
            cache: self.cache,
            costs: self.costs,
        }
    }
}

impl Agent {
    pub fn builder(role: AgentRole, llm: Arc<dyn ToolCallingLlm>) -> AgentBuilder {
        AgentBuilder {
            name: None,
            role,
            llm,
            model: String::new(),
            middleware: None,
            tools: ToolRegistry::new(),
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
            cache: None,
            costs: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }

    pub fn history(&self) -> Vec<Message> {
        self.lock_history().clone()
    }

    pub fn reset_history(&self) {
        self.lock_history().clear();
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub async fn process(&self, task: &str) -> Result<String, SwitchyardError> {
        let system = self.role.system_prompt(&self.name, &[]);
        self.process_with_system(&system, task).await
    }

    /// Like [`Agent::process`] with a caller-supplied system prompt.
    pub async fn process_with_system(
        &self,
        system: &str,
        task: &str,
    ) -> Result<String, SwitchyardError> {
        let cache_key = format!("{}:{}", self.name, task);
        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(&cache_key)) {
            tracing::debug!(agent = %self.name, "answered from cache");
            return Ok(hit);
        }

        let reply = self
            .through_middleware(task, |text| async move {
                self.converse(system, &text).await
            })
            .await?;

        if let Some(cache) = &self.cache {
            cache.insert(&cache_key, &reply);
        }
        Ok(reply)
    }

    /// One-shot call: no history, no tools.
    pub async fn complete(&self, prompt: &str) -> Result<String, SwitchyardError> {
        self.through_middleware(prompt, |text| async move {
            let response = self.call_llm(vec![Message::user(text)], false).await?;
            Ok(response.content)
        })
        .await
    }

    /// Streams a one-shot answer straight from the model.
    pub fn stream(&self, task: &str) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        let request = LlmRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(self.role.system_prompt(&self.name, &[])),
                Message::user(task),
            ],
            tools: Vec::new(),
        };
        self.llm.stream_response(request)
    }

    async fn through_middleware<F, Fut>(
        &self,
        input: &str,
        respond: F,
    ) -> Result<String, SwitchyardError>
    where
        F: FnOnce(String) -> Fut + Send,
        Fut: std::future::Future<Output = Result<String, SwitchyardError>> + Send,
    {
        let Some(chain) = &self.middleware else {
            return respond(input.to_string()).await;
        };

        let request = AgentRequest::new(self.name.clone(), input)
            .with_metadata("role", self.role.default_name());
        let response = chain
            .execute(request, |request| async move {
                let reply = respond(display_value(&request.payload)).await?;
                Ok(AgentResponse::for_request(&request, reply))
            })
            .await?;
        Ok(display_value(&response.payload))
    }

    async fn converse(&self, system: &str, task: &str) -> Result<String, SwitchyardError> {
        let mut messages = vec![Message::system(system)];
        messages.extend(self.history());
        messages.push(Message::user(task));

        for round in 0..=self.max_tool_rounds {
            let response = self.call_llm(messages.clone(), true).await?;
            if response.tool_calls.is_empty() {
                let mut history = self.lock_history();
                history.push(Message::user(task));
                history.push(Message::assistant(response.content.clone()));
                return Ok(response.content);
            }
            if round == self.max_tool_rounds {
                break;
            }

            let mut assistant = Message::assistant(response.content);
            assistant.tool_calls = response.tool_calls.clone();
            messages.push(assistant);
            for call in &response.tool_calls {
                let output = self.run_tool_call(call).await;
                messages.push(Message::tool_result(call.id.clone(), output));
            }
        }

        Err(SwitchyardError::Custom(format!(
            "max tool rounds exceeded: {}",
            self.max_tool_rounds
        )))
    }

    async fn run_tool_call(&self, call: &ToolCall) -> String {
        let tool = match self.tools.get(&call.name) {
            Some(tool) if self.role.may_use(&call.name) => tool,
            _ => {
                tracing::warn!(agent = %self.name, tool = %call.name, "tool call not permitted");
                return format!(
                    "tool '{}' is not permitted for agent '{}'",
                    call.name, self.name
                );
            }
        };

        tracing::info!(agent = %self.name, tool = %call.name, "calling tool");
        let response = execute(
            tool.as_ref(),
            ToolRequest::new(call.name.clone(), call.args.clone()),
        )
        .await;
        serde_json::to_string(&response).unwrap_or_else(|err| err.to_string())
    }

    async fn call_llm(
        &self,
        messages: Vec<Message>,
        with_tools: bool,
    ) -> Result<LlmResponse, SwitchyardError> {
        let tools = if with_tools {
            self.tools
                .specs()
                .into_iter()
                .filter(|spec| self.role.may_use(&spec.name))
                .collect()
        } else {
            Vec::new()
        };
        let response = self
            .llm
            .invoke(LlmRequest {
                model: self.model.clone(),
                messages,
                tools,
            })
            .await?;

        if let (Some(costs), Some(usage)) = (&self.costs, response.usage) {
            let model = if self.model.is_empty() {
                crate::cost::DEFAULT_PRICED_MODEL
            } else {
                self.model.as_str()
            };
            costs.track_call(
                model,
                usage.prompt_tokens,
                usage.completion_tokens,
                &self.name,
            );
        }
        Ok(response)
    }

    fn lock_history(&self) -> MutexGuard<'_, Vec<Message>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
