use async_trait::async_trait;

use switchyard_core::Value;

use crate::GraphError;

#[async_trait]
pub trait Observer: Send + Sync {
    async fn on_node_start(&self, _node: &str, _input: &Value) {}
    async fn on_node_end(&self, _node: &str, _output: &Value, _duration_ms: u128) {}
    async fn on_error(&self, _node: &str, _error: &GraphError) {}
}

/// Writes node transitions to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

#[async_trait]
impl Observer for TracingObserver {
    async fn on_node_start(&self, node: &str, _input: &Value) {
        tracing::info!(node, "node started");
    }

    async fn on_node_end(&self, node: &str, _output: &Value, duration_ms: u128) {
        tracing::info!(node, duration_ms = duration_ms as u64, "node finished");
    }

    async fn on_error(&self, node: &str, error: &GraphError) {
        tracing::warn!(node, error = %error, "node failed");
    }
}
