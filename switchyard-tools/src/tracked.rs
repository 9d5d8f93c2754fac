use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use switchyard_core::{Tool, ToolError, Value};

use crate::{execute, ToolRequest, ToolResponse};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolStats {
    pub tool_name: String,
    pub call_count: u64,
    pub total_time: Duration,
    pub avg_time: Duration,
}

#[derive(Debug, Default)]
struct Counters {
    calls: u64,
    total: Duration,
}

/// Counts calls and latency for any [`Tool`], failed calls included.
#[derive(Debug)]
pub struct TrackedTool<T> {
    inner: T,
    counters: Mutex<Counters>,
}

impl<T: Tool> TrackedTool<T> {
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            counters: Mutex::new(Counters::default()),
        }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Invokes the tool and folds the outcome into a [`ToolResponse`].
    pub async fn run(&self, args: Value) -> ToolResponse {
        self.handle(ToolRequest::new(self.inner.name(), args)).await
    }

    pub async fn handle(&self, request: ToolRequest) -> ToolResponse {
        execute(self, request).await
    }

    pub fn stats(&self) -> ToolStats {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let avg_time = if counters.calls == 0 {
            Duration::ZERO
        } else {
            counters.total.div_f64(counters.calls as f64)
        };
        ToolStats {
            tool_name: self.inner.name().to_string(),
            call_count: counters.calls,
            total_time: counters.total,
            avg_time,
        }
    }

    fn record(&self, elapsed: Duration) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.calls += 1;
        counters.total += elapsed;
    }
}

#[async_trait::async_trait]
impl<T: Tool> Tool for TrackedTool<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn schema(&self) -> Value {
        self.inner.schema()
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let started = Instant::now();
        let result = self.inner.invoke(args).await;
        let elapsed = started.elapsed();
        self.record(elapsed);
        tracing::debug!(
            tool = self.inner.name(),
            success = result.is_ok(),
            elapsed_ms = elapsed.as_secs_f64() * 1000.0,
            "tool call"
        );
        result
    }
}
