use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use switchyard_core::{Tool, ToolError, Value};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize, JsonSchema)]
pub struct JsonQueryArgs {
    /// Path to a JSON file. Either this or `json_data` is required.
    #[serde(default)]
    pub file_path: Option<String>,
    /// Inline JSON document.
    #[serde(default)]
    pub json_data: Option<String>,
    /// jq filter; empty means `.`.
    #[serde(default, alias = "jq_query")]
    pub query: String,
}

/// Where the document to query comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum JsonSource {
    File(PathBuf),
    Inline(String),
}

/// Queries JSON through an external `jq` process.
#[derive(Clone, Debug)]
pub struct JsonQueryTool {
    program: String,
    timeout: Duration,
}

impl Default for JsonQueryTool {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonQueryTool {
    pub fn new() -> Self {
        Self {
            program: "jq".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Uses a different jq binary, e.g. an absolute path.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn configured_timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn check_installed(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    pub async fn query_file(&self, path: impl AsRef<Path>, query: &str) -> Result<Value, ToolError> {
        self.query(JsonSource::File(path.as_ref().to_path_buf()), query)
            .await
    }

    /// Reads one field by dot path, e.g. `users.0.name`.
    pub async fn get_field(&self, source: JsonSource, field_path: &str) -> Result<Value, ToolError> {
        let query = field_path_to_query(field_path)?;
        self.query(source, &query).await
    }

    pub async fn query(&self, source: JsonSource, query: &str) -> Result<Value, ToolError> {
        let query = if query.trim().is_empty() { "." } else { query };
        if query.trim_start().starts_with('-') {
            return Err(ToolError::InvalidInput(format!(
                "query must not start with '-': {query}"
            )));
        }
        let input = load(&source).await?;

        let mut child = Command::new(&self.program)
            .arg(query)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => ToolError::ProcessorMissing(self.program.clone()),
                _ => ToolError::Io(err),
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolError::ExecutionFailed("jq stdin unavailable".to_string()))?;
        let feed = async move {
            let written = stdin.write_all(&input).await;
            drop(stdin);
            written
        };

        let run = async { tokio::join!(feed, child.wait_with_output()) };
        let (fed, output) = tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| ToolError::Timeout {
                what: format!("jq query '{query}'"),
                after: self.timeout,
            })?;
        let output = output?;

        if !output.status.success() {
            return Err(ToolError::MalformedQuery {
                query: query.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        if let Err(err) = fed {
            tracing::debug!(error = %err, "jq closed stdin early");
        }

        Ok(parse_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

async fn load(source: &JsonSource) -> Result<Vec<u8>, ToolError> {
    let bytes = match source {
        JsonSource::File(path) => tokio::fs::read(path).await.map_err(|err| match err.kind() {
            ErrorKind::NotFound => ToolError::FileNotFound(path.display().to_string()),
            _ => ToolError::Io(err),
        })?,
        JsonSource::Inline(text) => text.clone().into_bytes(),
    };
    serde_json::from_slice::<Value>(&bytes)
        .map_err(|err| ToolError::InvalidInput(format!("input is not valid JSON: {err}")))?;
    Ok(bytes)
}

/// One document parses as itself, several become an array, anything else is text.
fn parse_output(stdout: &str) -> Value {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return value;
    }
    let values: Result<Vec<Value>, _> = serde_json::Deserializer::from_str(trimmed)
        .into_iter::<Value>()
        .collect();
    match values {
        Ok(values) => Value::Array(values),
        Err(_) => Value::String(trimmed.to_string()),
    }
}

/// Converts `users.0.name` into the jq path `.users[0].name`.
pub fn field_path_to_query(field_path: &str) -> Result<String, ToolError> {
    let mut query = String::new();
    for segment in field_path.split('.').filter(|s| !s.is_empty()) {
        if segment.chars().all(|c| c.is_ascii_digit()) {
            if query.is_empty() {
                query.push('.');
            }
            query.push_str(&format!("[{segment}]"));
        } else if is_identifier(segment) {
            query.push('.');
            query.push_str(segment);
        } else {
            if query.is_empty() {
                query.push('.');
            }
            query.push_str(&format!("[{}]", serde_json::to_string(segment)?));
        }
    }
    if query.is_empty() {
        query.push('.');
    }
    Ok(query)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[async_trait::async_trait]
impl Tool for JsonQueryTool {
    fn name(&self) -> &str {
        "search_json"
    }

    fn description(&self) -> &str {
        "Query a JSON file or inline JSON with a jq expression"
    }

    fn schema(&self) -> Value {
        crate::schema_value::<JsonQueryArgs>()
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let args: JsonQueryArgs = serde_json::from_value(args)?;
        let source = match (args.file_path, args.json_data) {
            (Some(path), None) => JsonSource::File(PathBuf::from(path)),
            (None, Some(data)) => JsonSource::Inline(data),
            (Some(_), Some(_)) => {
                return Err(ToolError::InvalidInput(
                    "provide either file_path or json_data, not both".to_string(),
                ))
            }
            (None, None) => {
                return Err(ToolError::InvalidInput(
                    "either file_path or json_data must be provided".to_string(),
                ))
            }
        };
        self.query(source, &args.query).await
    }
}
