use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use futures::stream::{self, BoxStream, StreamExt};
use serde_json::json;
use switchyard_core::{Runnable, RunnableExt, StreamEvent, SwitchyardError};
use switchyard_tools::TrackedTool;

use crate::settings::Settings;

/// Fails with a retryable error until `failures` calls have been made.
struct Flaky {
    failures: u32,
    calls: AtomicU32,
}

#[async_trait::async_trait]
impl Runnable<String, String> for Flaky {
    async fn invoke(&self, input: String) -> Result<String, SwitchyardError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            return Err(SwitchyardError::LlmProvider(format!("transient failure {call}")));
        }
        Ok(format!("{input} (after {call} attempts)"))
    }

    fn stream(&self, _input: String) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        stream::empty().boxed()
    }
}

struct Fixed(&'static str);

#[async_trait::async_trait]
impl Runnable<String, String> for Fixed {
    async fn invoke(&self, input: String) -> Result<String, SwitchyardError> {
        Ok(format!("{}: {input}", self.0))
    }

    fn stream(&self, _input: String) -> BoxStream<'_, Result<StreamEvent, SwitchyardError>> {
        stream::empty().boxed()
    }
}

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    println!("parallel tool calls:");
    let command = Arc::new(TrackedTool::new(settings.command_tool()));
    let lines = ["echo one", "echo two", "date", "uname", "whoami"];
    let started = Instant::now();
    let responses = join_all(
        lines
            .iter()
            .map(|line| command.run(json!({ "command": line }))),
    )
    .await;
    for (line, response) in lines.iter().zip(&responses) {
        println!(
            "  {line:<10} success={} {:.3}s",
            response.success, response.execution_time
        );
    }
    println!(
        "  wall clock {:?}, summed {:?}",
        started.elapsed(),
        command.stats().total_time
    );

    println!("\nretry with backoff:");
    let retried = Flaky {
        failures: u32::try_from(settings.max_retries.saturating_sub(1)).unwrap_or(u32::MAX),
        calls: AtomicU32::new(0),
    }
    .with_backoff(
        settings.max_retries,
        Duration::from_millis(50),
        Duration::from_millis(400),
    );
    let outcome: Result<String, _> = retried.invoke("request".to_string()).await;
    match outcome {
        Ok(answer) => println!("  {answer} (max retries {})", settings.max_retries),
        Err(err) => println!("  failed: {err}"),
    }

    let exhausted = Flaky {
        failures: 5,
        calls: AtomicU32::new(0),
    }
    .with_retries(2);
    let gave_up: Result<String, _> = exhausted.invoke("request".to_string()).await;
    if let Err(err) = gave_up {
        println!("  gave up: {err}");
    }

    println!("\nfallbacks:");
    let primary = Flaky {
        failures: u32::MAX,
        calls: AtomicU32::new(0),
    };
    let backup: Arc<dyn Runnable<String, String> + Send + Sync> = Arc::new(Fixed("backup"));
    let chained = primary.with_fallbacks(vec![backup]);
    println!("  {}", chained.invoke("request".to_string()).await?);

    println!("\ncircuit breaker:");
    let breaker = Flaky {
        failures: u32::MAX,
        calls: AtomicU32::new(0),
    }
    .with_circuit_breaker(2, Duration::from_millis(200));
    for attempt in 1..=3 {
        let outcome: Result<String, _> = breaker.invoke("ping".to_string()).await;
        println!("  attempt {attempt}: {:?} -> {:?}", outcome.err(), breaker.state());
    }
    tokio::time::sleep(Duration::from_millis(250)).await;
    let trial: Result<String, _> = breaker.invoke("ping".to_string()).await;
    println!("  after reset timeout: {:?} -> {:?}", trial.err(), breaker.state());
    Ok(())
}
