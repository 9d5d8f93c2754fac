use std::sync::Mutex;
use std::time::{Duration, Instant};

use futures::stream::BoxStream;

use crate::{Runnable, StreamEvent, SwitchyardError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

/// Stops calling the wrapped runnable after `failure_threshold` consecutive
/// failures until `reset_timeout` has elapsed; one trial call is then let through.
pub struct CircuitBreaker<R> {
    runnable: R,
    failure_threshold: u32,
    reset_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl<R> CircuitBreaker<R> {
    pub fn new(runnable: R, failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            runnable,
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                opened_at: None,
            }),
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.lock().consecutive_failures
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn admit(&self) -> Result<(), SwitchyardError> {
        let mut inner = self.lock();
        if inner.state == CircuitState::Open {
            let elapsed = inner
                .opened_at
                .map(|opened| opened.elapsed())
                .unwrap_or_default();
            if elapsed < self.reset_timeout {
                return Err(SwitchyardError::CircuitOpen(format!(
                    "{} consecutive failures, retry in {:?}",
                    inner.consecutive_failures,
                    self.reset_timeout - elapsed
                )));
            }
            tracing::info!("circuit breaker: OPEN -> HALF_OPEN");
            inner.state = CircuitState::HalfOpen;
        }
        Ok(())
    }

    fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state == CircuitState::HalfOpen {
            tracing::info!("circuit breaker: HALF_OPEN -> CLOSED");
        }
        inner.state = CircuitState::Closed;
        inner.consecutive_failures = 0;
        inner.opened_at = None;
    }

    fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        let trip = inner.state == CircuitState::HalfOpen
            || inner.consecutive_failures >= self.failure_threshold;
        if trip && inner.state != CircuitState::Open {
            tracing::warn!(
                failures = inner.consecutive_failures,
                "circuit breaker: {:?} -> OPEN",
                inner.state
            );
            inner.state = CircuitState::Open;
            inner.opened_at = Some(Instant::now());
        }
    }
}

#[async_trait::async_trait]
impl<Input, Output, R> Runnable<Input, Output> for CircuitBreaker<R>
where
    Input: Send + 'static,
    Output: Send + 'static,
    R: Runnable<Input, Output> + Send + Sync,
{
    async fn invoke(&self, input: Input) -> Result<Output, SwitchyardError> {
        self.admit()?;
        match self.runnable.invoke(input).await {
            Ok(output) => {
                self.record_success();
                Ok(output)
            }
            Err(error) => {
                self.record_failure();
                Err(error)
            }
        }
    }

    fn stream(&self, input: Input) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        self.runnable.stream(input)
    }
}
