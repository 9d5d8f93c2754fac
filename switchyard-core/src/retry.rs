use std::time::Duration;

use futures::stream::BoxStream;

use crate::{Runnable, StreamEvent, SwitchyardError};

pub struct Retrying<R> {
    runnable: R,
    max_attempts: usize,
    backoff: Option<(Duration, Duration)>,
}

impl<R> Retrying<R> {
    pub fn new(runnable: R, max_attempts: usize) -> Self {
        Self {
            runnable,
            max_attempts,
            backoff: None,
        }
    }

    /// Sleeps `base * 2^(attempt - 1)`, capped at `max`, between attempts.
    pub fn backoff(mut self, base: Duration, max: Duration) -> Self {
        self.backoff = Some((base, max));
        self
    }

    fn delay_for(&self, attempt: usize) -> Option<Duration> {
        let (base, max) = self.backoff?;
        let exponent = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        Some(base.saturating_mul(1u32 << exponent).min(max))
    }
}

pub fn is_retryable(error: &SwitchyardError) -> bool {
    matches!(
        error,
        SwitchyardError::LlmProvider(_) | SwitchyardError::Timeout(_)
    )
}

#[async_trait::async_trait]
impl<Input, Output, R> Runnable<Input, Output> for Retrying<R>
where
    Input: Send + Sync + Clone + 'static,
    Output: Send + 'static,
    R: Runnable<Input, Output> + Send + Sync,
{
    async fn invoke(&self, input: Input) -> Result<Output, SwitchyardError> {
        if self.max_attempts == 0 {
            return Err(SwitchyardError::MaxRetriesExceeded { max: 0 });
        }

        for attempt in 1..=self.max_attempts {
            match self.runnable.invoke(input.clone()).await {
                Ok(output) => return Ok(output),
                Err(error) => {
                    if !is_retryable(&error) {
                        return Err(error);
                    }

                    if attempt == self.max_attempts {
                        break;
                    }

                    tracing::warn!(attempt, max = self.max_attempts, error = %error, "retrying");
                    if let Some(delay) = self.delay_for(attempt) {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(SwitchyardError::MaxRetriesExceeded {
            max: self.max_attempts,
        })
    }

    fn stream(&self, input: Input) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        self.runnable.stream(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Noop;

    #[test]
    fn backoff_doubles_and_caps() {
        let retrying = Retrying::new(Noop, 5)
            .backoff(Duration::from_millis(100), Duration::from_millis(350));
        assert_eq!(retrying.delay_for(1), Some(Duration::from_millis(100)));
        assert_eq!(retrying.delay_for(2), Some(Duration::from_millis(200)));
        assert_eq!(retrying.delay_for(3), Some(Duration::from_millis(350)));
    }

    #[test]
    fn no_backoff_by_default() {
        assert_eq!(Retrying::new(Noop, 3).delay_for(1), None);
    }
}
