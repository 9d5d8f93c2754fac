mod caching;
mod middleware;
mod resilience;
mod streaming;
mod tools;
mod workflow;

use crate::settings::Settings;

pub const COUNT: u8 = 6;

const MENU: &[(&str, &str)] = &[
    ("Middleware chain", "logging and metrics interceptors around agent calls"),
    ("Workflow with subagents", "coordinator routes to research or analysis (needs API key)"),
    ("Tools", "allow-listed commands and jq queries with call statistics"),
    ("Streaming", "token stream from one agent and node events from the workflow (needs API key)"),
    ("Caching and config", "response cache, input validation and cost tracking"),
    ("Parallel and retry", "concurrent tool calls, retries, fallbacks and a circuit breaker"),
];

pub fn print_menu() {
    println!("switchyard examples\n");
    for (index, (title, summary)) in MENU.iter().enumerate() {
        println!("  {}. {title:<24} {summary}", index + 1);
    }
    println!("\nusage: switchyard <1-{COUNT}|all>");
}

pub async fn run(number: u8, settings: &Settings) -> anyhow::Result<()> {
    if let Some((title, _)) = MENU.get(usize::from(number).saturating_sub(1)) {
        println!("\n=== Example {number}: {title} ===\n");
    }
    match number {
        1 => middleware::run(settings).await,
        2 => workflow::run(settings).await,
        3 => tools::run(settings).await,
        4 => streaming::run(settings).await,
        5 => caching::run(settings).await,
        6 => resilience::run(settings).await,
        other => anyhow::bail!("no example {other}"),
    }
}
