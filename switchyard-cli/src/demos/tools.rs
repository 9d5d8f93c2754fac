use std::sync::Arc;

use serde_json::json;
use switchyard_core::display_value;
use switchyard_tools::{JsonSource, ToolRegistry, ToolRequest, ToolResponse, TrackedTool};

use crate::settings::Settings;

fn show(label: &str, response: &ToolResponse) {
    if response.success {
        println!(
            "{label}: ok ({:.3}s)\n{}",
            response.execution_time,
            display_value(&response.result)
        );
    } else {
        println!(
            "{label}: {:?} {}",
            response.error_kind,
            response.error.as_deref().unwrap_or_default()
        );
    }
}

pub async fn run(settings: &Settings) -> anyhow::Result<()> {
    let command = Arc::new(TrackedTool::new(settings.command_tool()));
    println!(
        "allowed commands: {}",
        command.inner().allowed_commands().unwrap_or_default().join(", ")
    );

    for line in ["echo Hello from the command tool", "pwd", "date", "rm -rf /tmp/x"] {
        show(line, &command.run(json!({ "command": line })).await);
    }

    let json = Arc::new(TrackedTool::new(settings.json_tool()));
    let data = settings.data_path();
    if json.inner().check_installed().await {
        for query in [
            ".users | length",
            ".users[].name",
            "[.users[] | select(.role == \"developer\")]",
        ] {
            show(query, &json.run(json!({ "file_path": data, "query": query })).await);
        }
        let first = json
            .inner()
            .get_field(JsonSource::File(settings.data.clone()), "users.0.name")
            .await;
        println!("users.0.name: {first:?}");
    } else {
        println!("jq is not installed; skipping JSON queries");
    }

    let registry = ToolRegistry::new()
        .register(command.clone())
        .register(json.clone());
    println!("\nregistered tools: {}", registry.names().join(", "));
    let whoami =
        ToolRequest::new("execute_command", json!({ "command": "whoami" })).timeout_secs(5.0);
    let response = registry.dispatch(whoami).await;
    show("dispatch whoami", &response);
    show(
        "dispatch unknown",
        &registry.dispatch(ToolRequest::new("format_disk", json!({}))).await,
    );

    for stats in [command.stats(), json.stats()] {
        println!(
            "{}: {} call(s), total {:?}, avg {:?}",
            stats.tool_name, stats.call_count, stats.total_time, stats.avg_time
        );
    }
    Ok(())
}
