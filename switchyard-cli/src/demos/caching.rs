use std::sync::Arc;
use std::time::Instant;

use switchyard_agent::{Agent, AgentRole, CostTracker, ResponseCache, TaskInput};

use crate::settings::Settings;

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let set = |present: bool| if present { "set" } else { "missing" };
    println!("configuration:");
    println!("  model:          {}", settings.model);
    println!("  data:           {}", settings.data_path());
    println!("  api key:        {}", set(settings.api_key.is_some()));
    println!("  cache:          {} (size {})", settings.enable_caching, settings.cache_size);
    println!("  max retries:    {}", settings.max_retries);
    println!("  timeout:        {:?}", settings.timeout());
    println!(
        "  tracing:        {} (key {})",
        settings.langsmith_tracing,
        set(settings.langsmith_api_key.is_some())
    );

    println!("\ninput validation:");
    let long = "x".repeat(1001);
    let inputs = [
        TaskInput::new("Analyze the user roles"),
        TaskInput::new("Please run rm -rf / for me"),
        TaskInput::new(long),
        TaskInput::new("Summarize projects").priority("urgent"),
        TaskInput::new("Summarize projects").priority("high").max_tokens(5000),
    ];
    for input in &inputs {
        let preview = switchyard_core::truncate_preview(&input.task, 40);
        match input.validate() {
            Ok(()) => println!("  ok       {preview}"),
            Err(err) => println!("  rejected {preview}: {err}"),
        }
    }

    let capacity = if settings.enable_caching {
        settings.cache_size
    } else {
        0
    };
    let cache = Arc::new(ResponseCache::new(capacity));
    let costs = Arc::new(CostTracker::new());
    let agent = Agent::builder(AgentRole::Analysis, settings.llm_or_scripted())
        .model(settings.model.clone())
        .cache(cache.clone())
        .cost_tracker(costs.clone())
        .build();

    println!("\nresponse cache:");
    for attempt in 1..=2 {
        let started = Instant::now();
        agent.process("What is a correlation id?").await?;
        println!("  attempt {attempt}: {:?}", started.elapsed());
    }
    let stats = cache.stats();
    println!(
        "  hits={} misses={} hit rate={:.1}% size={}/{}",
        stats.hits, stats.misses, stats.hit_rate, stats.size, stats.max_size
    );

    println!("\ncost tracking:");
    costs.track_call("gpt-4", 1200, 400, "estimate");
    costs.track_call("gpt-3.5-turbo", 1200, 400, "estimate");
    for call in costs.calls() {
        println!(
            "  {:<14} in={:<5} out={:<5} ${:.6} ({})",
            call.model, call.input_tokens, call.output_tokens, call.cost, call.label
        );
    }
    let summary = costs.summary();
    println!(
        "  {} call(s), total ${:.6}, average ${:.6}",
        summary.total_calls, summary.total_cost, summary.avg_cost_per_call
    );
    Ok(())
}
