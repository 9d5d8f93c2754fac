use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{AgentRequest, AgentResponse, Middleware, MiddlewareError};

/// Totals over every completed call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MetricsSummary {
    pub count: u32,
    pub total: Duration,
    pub average: Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AgentStats {
    pub count: u32,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
    pub average: Duration,
}

impl AgentStats {
    fn first(elapsed: Duration) -> Self {
        Self {
            count: 1,
            total: elapsed,
            min: elapsed,
            max: elapsed,
            average: elapsed,
        }
    }

    fn record(&mut self, elapsed: Duration) {
        self.count += 1;
        self.total += elapsed;
        self.min = self.min.min(elapsed);
        self.max = self.max.max(elapsed);
        self.average = self.total / self.count;
    }
}

#[derive(Debug, Default)]
struct MetricsInner {
    started: HashMap<Uuid, Instant>,
    total_requests: u64,
    total_responses: u64,
    completed: u32,
    total: Duration,
    per_agent: BTreeMap<String, AgentStats>,
}

/// Times each call from request to response, keyed by correlation id.
#[derive(Debug, Default)]
pub struct MetricsMiddleware {
    inner: Mutex<MetricsInner>,
}

impl MetricsMiddleware {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MetricsInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Count, total and average over completed calls. Average is `total / count`.
    pub fn summary(&self) -> MetricsSummary {
        let inner = self.lock();
        let average = if inner.completed == 0 {
            Duration::ZERO
        } else {
            inner.total / inner.completed
        };
        MetricsSummary {
            count: inner.completed,
            total: inner.total,
            average,
        }
    }

    pub fn agent_stats(&self, agent_name: &str) -> Option<AgentStats> {
        self.lock().per_agent.get(agent_name).copied()
    }

    pub fn all_agent_stats(&self) -> BTreeMap<String, AgentStats> {
        self.lock().per_agent.clone()
    }

    pub fn total_requests(&self) -> u64 {
        self.lock().total_requests
    }

    pub fn total_responses(&self) -> u64 {
        self.lock().total_responses
    }

    /// Calls whose response has not been seen yet.
    pub fn in_flight(&self) -> usize {
        self.lock().started.len()
    }

    pub fn log_summary(&self) {
        let summary = self.summary();
        tracing::info!(
            count = summary.count,
            total_ms = summary.total.as_secs_f64() * 1000.0,
            average_ms = summary.average.as_secs_f64() * 1000.0,
            "metrics summary"
        );
        for (agent, stats) in self.all_agent_stats() {
            tracing::info!(
                agent = %agent,
                count = stats.count,
                min_ms = stats.min.as_secs_f64() * 1000.0,
                max_ms = stats.max.as_secs_f64() * 1000.0,
                average_ms = stats.average.as_secs_f64() * 1000.0,
                "agent metrics"
            );
        }
    }

    pub fn reset(&self) {
        *self.lock() = MetricsInner::default();
    }
}

#[async_trait]
impl Middleware for MetricsMiddleware {
    fn name(&self) -> &str {
        "metrics"
    }

    async fn process_request(
        &self,
        request: AgentRequest,
    ) -> Result<AgentRequest, MiddlewareError> {
        let mut inner = self.lock();
        inner.total_requests += 1;
        inner.started.insert(request.correlation_id, Instant::now());
        Ok(request)
    }

    async fn process_response(
        &self,
        mut response: AgentResponse,
    ) -> Result<AgentResponse, MiddlewareError> {
        let elapsed = {
            let mut inner = self.lock();
            inner.total_responses += 1;
            let Some(start) = inner.started.remove(&response.correlation_id) else {
                tracing::debug!(
                    correlation_id = %response.correlation_id,
                    "response without a recorded request"
                );
                return Ok(response);
            };
            let elapsed = start.elapsed();
            inner.completed += 1;
            inner.total += elapsed;
            inner
                .per_agent
                .entry(response.agent_name.clone())
                .and_modify(|stats| stats.record(elapsed))
                .or_insert_with(|| AgentStats::first(elapsed));
            elapsed
        };

        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        response
            .metadata
            .insert("execution_time_ms".to_string(), serde_json::json!(elapsed_ms));
        tracing::debug!(
            agent = %response.agent_name,
            correlation_id = %response.correlation_id,
            elapsed_ms,
            "call timed"
        );
        Ok(response)
    }
}
