use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use switchyard_core::SwitchyardError;

use crate::{AgentRequest, AgentResponse, MiddlewareError};

/// Interceptor around an agent call.
///
/// Both hooks default to passing the value through untouched, so an
/// interceptor only implements the side it cares about.
#[async_trait]
pub trait Middleware: Send + Sync {
    fn name(&self) -> &str;

    async fn process_request(
        &self,
        request: AgentRequest,
    ) -> Result<AgentRequest, MiddlewareError> {
        Ok(request)
    }

    async fn process_response(
        &self,
        response: AgentResponse,
    ) -> Result<AgentResponse, MiddlewareError> {
        Ok(response)
    }
}

/// Ordered interceptor pipeline.
///
/// Requests pass through interceptors in insertion order, responses in
/// reverse order. A failing or panicking interceptor is logged and skipped:
/// the chain carries on with the value as it was before that interceptor.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl std::fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.middlewares.iter().map(|m| m.name()).collect();
        f.debug_struct("MiddlewareChain")
            .field("middlewares", &names)
            .finish()
    }
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn add_shared(mut self, middleware: Arc<dyn Middleware>) -> Self {
        self.middlewares.push(middleware);
        self
    }

    pub fn len(&self) -> usize {
        self.middlewares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.middlewares.is_empty()
    }

    pub async fn process_request(&self, mut request: AgentRequest) -> AgentRequest {
        for middleware in &self.middlewares {
            let attempt = AssertUnwindSafe(middleware.process_request(request.clone()))
                .catch_unwind()
                .await;
            match attempt {
                Ok(Ok(next)) => request = next,
                Ok(Err(err)) => tracing::warn!(
                    middleware = middleware.name(),
                    correlation_id = %request.correlation_id,
                    error = %err,
                    "request interceptor failed, continuing"
                ),
                Err(_) => tracing::warn!(
                    middleware = middleware.name(),
                    correlation_id = %request.correlation_id,
                    "request interceptor panicked, continuing"
                ),
            }
        }
        request
    }

    pub async fn process_response(&self, mut response: AgentResponse) -> AgentResponse {
        for middleware in self.middlewares.iter().rev() {
            let attempt = AssertUnwindSafe(middleware.process_response(response.clone()))
                .catch_unwind()
                .await;
            match attempt {
                Ok(Ok(next)) => response = next,
                Ok(Err(err)) => tracing::warn!(
                    middleware = middleware.name(),
                    correlation_id = %response.correlation_id,
                    error = %err,
                    "response interceptor failed, continuing"
                ),
                Err(_) => tracing::warn!(
                    middleware = middleware.name(),
                    correlation_id = %response.correlation_id,
                    "response interceptor panicked, continuing"
                ),
            }
        }
        response
    }

    /// Runs `dispatch` between the request and response passes.
    ///
    /// Interceptors may rewrite the correlation id; the response is always
    /// re-tagged with the id of the request as it entered the chain.
    pub async fn execute<F, Fut>(
        &self,
        request: AgentRequest,
        dispatch: F,
    ) -> Result<AgentResponse, SwitchyardError>
    where
        F: FnOnce(AgentRequest) -> Fut + Send,
        Fut: Future<Output = Result<AgentResponse, SwitchyardError>> + Send,
    {
        let correlation_id = request.correlation_id;
        let request = self.process_request(request).await;
        let mut response = dispatch(request).await?;
        response.correlation_id = correlation_id;
        let mut response = self.process_response(response).await;
        response.correlation_id = correlation_id;
        Ok(response)
    }
}
