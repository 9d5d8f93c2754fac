use std::sync::Arc;

use switchyard_agent::{
    build_workflow, run_workflow, Agent, AgentRole, AnalysisAgent, CoordinatorAgent,
    ResearchAgent,
};

use crate::settings::Settings;

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let llm = settings.require_llm()?;
    let (coordinator, research, analysis) = agents(settings, llm);

    let graph = build_workflow(coordinator.clone(), research.clone(), analysis.clone())?;
    let task = format!(
        "How many users are listed in {} and what roles do they have?",
        settings.data_path()
    );
    let state = run_workflow(&graph, &task).await?;

    println!("path: {}", state.agent_history.join(" -> "));
    for (agent, result) in &state.results {
        println!("\n[{agent}]\n{result}");
    }
    if let Some(error) = &state.error {
        println!("\nerror: {error}");
    }
    println!(
        "\nfinal answer:\n{}",
        state.final_output.as_deref().unwrap_or("(none)")
    );

    for stats in research.tool_stats().into_iter().chain(analysis.tool_stats()) {
        println!(
            "tool {}: {} call(s), avg {:?}",
            stats.tool_name, stats.call_count, stats.avg_time
        );
    }
    Ok(())
}

pub(crate) fn agents(
    settings: &Settings,
    llm: Arc<dyn switchyard_core::ToolCallingLlm>,
) -> (Arc<CoordinatorAgent>, Arc<ResearchAgent>, Arc<AnalysisAgent>) {
    let coordinator = Arc::new(CoordinatorAgent::new(
        Agent::builder(AgentRole::Coordinator, llm.clone())
            .model(settings.model.clone())
            .build(),
    ));
    let research = Arc::new(ResearchAgent::with_tools(
        Agent::builder(AgentRole::Research, llm.clone()).model(settings.model.clone()),
        settings.command_tool(),
        settings.json_tool(),
    ));
    let analysis = Arc::new(AnalysisAgent::with_tool(
        Agent::builder(AgentRole::Analysis, llm).model(settings.model.clone()),
        settings.json_tool(),
    ));
    coordinator.register_subagent(research.clone());
    coordinator.register_subagent(analysis.clone());
    (coordinator, research, analysis)
}
