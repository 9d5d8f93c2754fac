use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{CircuitBreaker, Retrying, RunnableWithFallbacks, SwitchyardError};

#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    ContentChunk(String),
    FinalAnswer(String),
}

#[async_trait]
pub trait Runnable<Input: Send + 'static, Output: Send + 'static> {
    async fn invoke(&self, input: Input) -> Result<Output, SwitchyardError>;

    fn stream(&self, input: Input) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>>;
}

pub trait RunnableExt<Input: Send + 'static, Output: Send + 'static>:
    Runnable<Input, Output> + Sized
{
    fn with_retries(self, max_attempts: usize) -> Retrying<Self> {
        Retrying::new(self, max_attempts)
    }

    fn with_backoff(self, max_attempts: usize, base: Duration, max: Duration) -> Retrying<Self> {
        Retrying::new(self, max_attempts).backoff(base, max)
    }

    fn with_fallbacks(
        self,
        fallbacks: Vec<Arc<dyn Runnable<Input, Output> + Send + Sync>>,
    ) -> RunnableWithFallbacks<Input, Output>
    where
        Self: Send + Sync + 'static,
    {
        RunnableWithFallbacks::new(Arc::new(self), fallbacks)
    }

    fn with_circuit_breaker(
        self,
        failure_threshold: u32,
        reset_timeout: Duration,
    ) -> CircuitBreaker<Self> {
        CircuitBreaker::new(self, failure_threshold, reset_timeout)
    }
}

impl<Input: Send + 'static, Output: Send + 'static, T> RunnableExt<Input, Output> for T where
    T: Runnable<Input, Output> + Sized
{
}
