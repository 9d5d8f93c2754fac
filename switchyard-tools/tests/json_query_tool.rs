use std::io::Write;
use std::sync::Arc;

use serde_json::json;
use switchyard_core::{ToolErrorKind, Value};
use switchyard_tools::{
    CommandTool, JsonQueryTool, JsonSource, ToolRegistry, ToolRequest, TrackedTool,
};

const SAMPLE: &str = r#"{
  "users": [
    {"id": 1, "name": "Alice", "role": "admin"},
    {"id": 2, "name": "Bob", "role": "developer"},
    {"id": 3, "name": "Carol", "role": "developer"}
  ],
  "projects": [{"name": "switchyard", "status": "active"}]
}"#;

fn sample_file() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SAMPLE.as_bytes()).unwrap();
    file
}

async fn jq_available() -> bool {
    let available = JsonQueryTool::new().check_installed().await;
    if !available {
        eprintln!("jq not found on PATH, skipping");
    }
    available
}

#[tokio::test]
async fn counts_users_in_file() {
    if !jq_available().await {
        return;
    }
    let file = sample_file();
    let result = JsonQueryTool::new()
        .query_file(file.path(), ".users | length")
        .await
        .unwrap();
    assert_eq!(result, json!(3));
}

#[tokio::test]
async fn multi_value_output_becomes_array() {
    if !jq_available().await {
        return;
    }
    let file = sample_file();
    let result = JsonQueryTool::new()
        .query_file(file.path(), ".users[] | select(.role == \"developer\") | .name")
        .await
        .unwrap();
    assert_eq!(result, json!(["Bob", "Carol"]));
}

#[tokio::test]
async fn get_field_follows_dot_path() {
    if !jq_available().await {
        return;
    }
    let result = JsonQueryTool::new()
        .get_field(JsonSource::Inline(SAMPLE.to_string()), "users.0.name")
        .await
        .unwrap();
    assert_eq!(result, json!("Alice"));
}

#[tokio::test]
async fn malformed_query_is_reported() {
    if !jq_available().await {
        return;
    }
    let err = JsonQueryTool::new()
        .query(JsonSource::Inline(SAMPLE.to_string()), ".users[")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ToolErrorKind::MalformedQuery);
}

#[tokio::test]
async fn missing_file_is_reported() {
    let err = JsonQueryTool::new()
        .query_file("/no/such/file.json", ".")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ToolErrorKind::FileNotFound);
}

#[tokio::test]
async fn missing_processor_is_reported() {
    let err = JsonQueryTool::new()
        .program("definitely-not-a-jq-binary")
        .query(JsonSource::Inline("{}".to_string()), ".")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ToolErrorKind::ProcessorMissing);
    assert!(!JsonQueryTool::new()
        .program("definitely-not-a-jq-binary")
        .check_installed()
        .await);
}

#[tokio::test]
async fn invalid_json_input_is_rejected_before_jq_runs() {
    let err = JsonQueryTool::new()
        .program("definitely-not-a-jq-binary")
        .query(JsonSource::Inline("{not json".to_string()), ".")
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ToolErrorKind::InvalidInput);
}

#[tokio::test]
async fn option_like_query_is_not_passed_to_jq() {
    let tool = JsonQueryTool::new().program("definitely-not-a-jq-binary");
    for query in ["--version", "  -n"] {
        let err = tool
            .query(JsonSource::Inline("{}".to_string()), query)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ToolErrorKind::InvalidInput, "{query}");
    }
}

#[tokio::test]
async fn registry_dispatches_by_name() {
    let json_tool = Arc::new(TrackedTool::new(JsonQueryTool::new()));
    let registry = ToolRegistry::new()
        .register(json_tool.clone())
        .register(Arc::new(CommandTool::new()));
    assert_eq!(registry.names(), vec!["execute_command", "search_json"]);
    assert_eq!(registry.specs().len(), 2);

    let response = registry
        .dispatch(ToolRequest::new("search_json", json!({})))
        .await;
    assert!(!response.success);
    assert_eq!(response.error_kind, Some(ToolErrorKind::InvalidInput));
    assert_eq!(json_tool.stats().call_count, 1);

    let unknown = registry
        .dispatch(ToolRequest::new("delete_everything", Value::Null))
        .await;
    assert!(!unknown.success);
    assert!(unknown.error.unwrap().contains("unknown tool"));
}
