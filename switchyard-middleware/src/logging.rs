use async_trait::async_trait;

use switchyard_core::{display_value, truncate_preview};

use crate::{AgentRequest, AgentResponse, Middleware, MiddlewareError};

const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Emits one structured log line per request and per response.
#[derive(Clone, Debug)]
pub struct LoggingMiddleware {
    verbose: bool,
    preview_chars: usize,
}

impl Default for LoggingMiddleware {
    fn default() -> Self {
        Self {
            verbose: false,
            preview_chars: DEFAULT_PREVIEW_CHARS,
        }
    }
}

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn preview_chars(mut self, preview_chars: usize) -> Self {
        self.preview_chars = preview_chars;
        self
    }
}

#[async_trait]
impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    async fn process_request(
        &self,
        request: AgentRequest,
    ) -> Result<AgentRequest, MiddlewareError> {
        let text = display_value(&request.payload);
        tracing::info!(
            agent = %request.agent_name,
            correlation_id = %request.correlation_id,
            timestamp = %request.timestamp.to_rfc3339(),
            preview = %truncate_preview(&text, self.preview_chars),
            "agent request"
        );
        if self.verbose {
            tracing::debug!(
                correlation_id = %request.correlation_id,
                payload = %text,
                metadata = ?request.metadata,
                "agent request detail"
            );
        }
        Ok(request)
    }

    async fn process_response(
        &self,
        response: AgentResponse,
    ) -> Result<AgentResponse, MiddlewareError> {
        let text = display_value(&response.payload);
        tracing::info!(
            agent = %response.agent_name,
            correlation_id = %response.correlation_id,
            preview = %truncate_preview(&text, self.preview_chars),
            "agent response"
        );
        if self.verbose {
            tracing::debug!(
                correlation_id = %response.correlation_id,
                payload = %text,
                metadata = ?response.metadata,
                "agent response detail"
            );
        }
        Ok(response)
    }
}
