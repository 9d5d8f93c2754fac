use std::sync::Arc;

use switchyard_agent::{Agent, AgentRole};
use switchyard_middleware::{LoggingMiddleware, MetricsMiddleware, MiddlewareChain};

use crate::settings::Settings;

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let metrics = Arc::new(MetricsMiddleware::new());
    let chain = MiddlewareChain::new()
        .add(LoggingMiddleware::new().verbose(true).preview_chars(80))
        .add_shared(metrics.clone());

    let agent = Agent::builder(AgentRole::Research, settings.llm_or_scripted())
        .model(settings.model.clone())
        .middleware(chain)
        .build();

    for task in [
        "What tools are available for listing files?",
        "Summarize what a JSON query processor does.",
        "Name one safe shell command.",
    ] {
        let reply = agent.process(task).await?;
        println!("> {task}\n{reply}\n");
    }

    metrics.log_summary();
    let summary = metrics.summary();
    println!(
        "calls: {}  total: {:?}  average: {:?}",
        summary.count, summary.total, summary.average
    );
    for (agent, stats) in metrics.all_agent_stats() {
        println!(
            "  {agent}: count={} min={:?} max={:?} avg={:?}",
            stats.count, stats.min, stats.max, stats.average
        );
    }
    Ok(())
}
