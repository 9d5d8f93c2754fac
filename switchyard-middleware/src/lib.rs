mod chain;
mod error;
mod logging;
mod metrics;
mod record;

pub use chain::{Middleware, MiddlewareChain};
pub use error::MiddlewareError;
pub use logging::LoggingMiddleware;
pub use metrics::{AgentStats, MetricsMiddleware, MetricsSummary};
pub use record::{AgentRequest, AgentResponse, Metadata};
