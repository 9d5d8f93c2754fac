use std::sync::Arc;

use crate::{Runnable, StreamEvent, SwitchyardError};
use async_trait::async_trait;
use futures::stream::BoxStream;

pub struct RunnableWithFallbacks<Input, Output> {
    primary: Arc<dyn Runnable<Input, Output> + Send + Sync>,
    fallbacks: Vec<Arc<dyn Runnable<Input, Output> + Send + Sync>>,
}

impl<Input, Output> RunnableWithFallbacks<Input, Output> {
    pub fn new(
        primary: Arc<dyn Runnable<Input, Output> + Send + Sync>,
        fallbacks: Vec<Arc<dyn Runnable<Input, Output> + Send + Sync>>,
    ) -> Self {
        Self { primary, fallbacks }
    }
}

#[async_trait]
impl<Input, Output> Runnable<Input, Output> for RunnableWithFallbacks<Input, Output>
where
    Input: Clone + Send + Sync + 'static,
    Output: Send + Sync + 'static,
{
    async fn invoke(&self, input: Input) -> Result<Output, SwitchyardError> {
        let mut last_error = match self.primary.invoke(input.clone()).await {
            Ok(output) => return Ok(output),
            Err(e) => e,
        };

        for (index, fallback) in self.fallbacks.iter().enumerate() {
            tracing::warn!(fallback = index, error = %last_error, "primary failed, trying fallback");
            match fallback.invoke(input.clone()).await {
                Ok(output) => return Ok(output),
                Err(e) => last_error = e,
            }
        }

        Err(last_error)
    }

    fn stream(&self, input: Input) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        // A failed stream cannot be resumed on a fallback mid-way.
        self.primary.stream(input)
    }
}
