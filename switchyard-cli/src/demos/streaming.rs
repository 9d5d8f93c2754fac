use std::io::Write;

use futures::StreamExt;
use switchyard_agent::{build_workflow, stream_workflow, Agent, AgentRole};
use switchyard_core::StreamEvent;
use switchyard_graph::GraphEvent;

use crate::demos::workflow::agents;
use crate::settings::Settings;

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let llm = settings.require_llm()?;

    let agent = Agent::builder(AgentRole::Analysis, llm.clone())
        .model(settings.model.clone())
        .build();
    let mut events = agent.stream("Explain in three sentences why interceptor chains are useful.");
    let mut stdout = std::io::stdout();
    while let Some(event) = events.next().await {
        match event? {
            StreamEvent::ContentChunk(chunk) => {
                print!("{chunk}");
                stdout.flush()?;
            }
            StreamEvent::FinalAnswer(answer) => {
                println!("\n\n({} characters)", answer.chars().count());
            }
        }
    }

    let (coordinator, research, analysis) = agents(settings, llm);
    let graph = build_workflow(coordinator, research, analysis)?;
    let task = format!("Which projects are listed in {}?", settings.data_path());
    let mut nodes = stream_workflow(&graph, &task);
    while let Some(event) = nodes.next().await {
        match event? {
            GraphEvent::NodeEnter { node, .. } => println!("-> {node}"),
            GraphEvent::NodeExit { node, state, .. } => {
                println!("<- {node} (next: {:?})", state.data.next_agent)
            }
            GraphEvent::Finished(state) => println!(
                "\nfinal answer:\n{}",
                state.data.final_output.as_deref().unwrap_or("(none)")
            ),
        }
    }
    Ok(())
}
