use std::collections::BTreeSet;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use schemars::JsonSchema;
use serde::Deserialize;
use tokio::process::Command;

use switchyard_core::{Tool, ToolError, Value};

pub const DEFAULT_ALLOWED_COMMANDS: &[&str] =
    &["echo", "ls", "cat", "date", "pwd", "whoami", "uname"];

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CommandArgs {
    /// Command line to run, e.g. `ls -la`. Executed without a shell.
    pub command: String,
    /// Overrides the tool's default timeout.
    #[serde(default)]
    pub timeout_secs: Option<f64>,
}

/// Runs allow-listed programs as subprocesses with a timeout.
#[derive(Clone, Debug)]
pub struct CommandTool {
    allowed: Option<BTreeSet<String>>,
    default_timeout: Duration,
    working_dir: Option<PathBuf>,
}

impl Default for CommandTool {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandTool {
    /// Tool restricted to [`DEFAULT_ALLOWED_COMMANDS`].
    pub fn new() -> Self {
        Self::with_allowed(DEFAULT_ALLOWED_COMMANDS.iter().copied())
    }

    pub fn with_allowed<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: Some(commands.into_iter().map(Into::into).collect()),
            default_timeout: DEFAULT_TIMEOUT,
            working_dir: None,
        }
    }

    /// No allow-list at all. Only for trusted input.
    pub fn unrestricted() -> Self {
        Self {
            allowed: None,
            default_timeout: DEFAULT_TIMEOUT,
            working_dir: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Timeout applied when a call does not supply its own.
    pub fn configured_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn allowed_commands(&self) -> Option<Vec<&str>> {
        self.allowed
            .as_ref()
            .map(|set| set.iter().map(String::as_str).collect())
    }

    pub fn is_allowed(&self, program: &str) -> bool {
        match &self.allowed {
            None => true,
            Some(set) => set.contains(program),
        }
    }

    /// Runs `command_line` and returns its captured output.
    pub async fn run(
        &self,
        command_line: &str,
        timeout: Option<Duration>,
    ) -> Result<String, ToolError> {
        let tokens = tokenize(command_line)?;
        let Some((program, args)) = tokens.split_first() else {
            return Err(ToolError::InvalidInput("command cannot be empty".to_string()));
        };

        if !self.is_allowed(program) {
            let allowed = self
                .allowed_commands()
                .map(|names| names.join(", "))
                .unwrap_or_default();
            tracing::warn!(program = %program, "command rejected by allow-list");
            return Err(ToolError::NotPermitted {
                command: program.clone(),
                allowed,
            });
        }

        let after = timeout.unwrap_or(self.default_timeout);
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(program = %program, args = ?args, timeout = ?after, "running command");
        let output = match tokio::time::timeout(after, cmd.output()).await {
            Ok(output) => output.map_err(|err| {
                ToolError::ExecutionFailed(format!("failed to start '{program}': {err}"))
            })?,
            Err(_) => {
                tracing::warn!(command = %command_line, timeout = ?after, "command timed out");
                return Err(ToolError::Timeout {
                    what: command_line.to_string(),
                    after,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(ToolError::NonZeroExit {
                command: command_line.to_string(),
                code: output.status.code(),
                stderr: stderr.trim().to_string(),
            });
        }

        let mut text = stdout.into_owned();
        if !stderr.trim().is_empty() {
            text.push_str("\n[stderr]: ");
            text.push_str(stderr.trim());
        }
        let text = text.trim();
        Ok(if text.is_empty() {
            "(no output)".to_string()
        } else {
            text.to_string()
        })
    }
}

#[async_trait::async_trait]
impl Tool for CommandTool {
    fn name(&self) -> &str {
        "execute_command"
    }

    fn description(&self) -> &str {
        "Run an allow-listed command (echo, ls, cat, date, pwd, whoami, uname) and return its output"
    }

    fn schema(&self) -> Value {
        crate::schema_value::<CommandArgs>()
    }

    async fn invoke(&self, args: Value) -> Result<Value, ToolError> {
        let args: CommandArgs = serde_json::from_value(args)?;
        let timeout = crate::timeout_from_secs(args.timeout_secs)?;
        self.run(&args.command, timeout).await.map(Value::String)
    }
}

/// Splits a command line into words, honouring single quotes, double quotes
/// and backslash escapes. No expansion of any kind is performed.
pub fn tokenize(line: &str) -> Result<Vec<String>, ToolError> {
    #[derive(PartialEq)]
    enum Quote {
        None,
        Single,
        Double,
    }

    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote = Quote::None;
    let mut chars = line.chars();

    while let Some(ch) = chars.next() {
        match quote {
            Quote::Single => {
                if ch == '\'' {
                    quote = Quote::None;
                } else {
                    current.push(ch);
                }
            }
            Quote::Double => match ch {
                '"' => quote = Quote::None,
                '\\' => match chars.next() {
                    Some(next @ ('"' | '\\')) => current.push(next),
                    Some(next) => {
                        current.push('\\');
                        current.push(next);
                    }
                    None => current.push('\\'),
                },
                _ => current.push(ch),
            },
            Quote::None => match ch {
                '\'' => {
                    quote = Quote::Single;
                    in_word = true;
                }
                '"' => {
                    quote = Quote::Double;
                    in_word = true;
                }
                '\\' => {
                    if let Some(next) = chars.next() {
                        current.push(next);
                    }
                    in_word = true;
                }
                c if c.is_whitespace() => {
                    if in_word {
                        words.push(std::mem::take(&mut current));
                        in_word = false;
                    }
                }
                _ => {
                    current.push(ch);
                    in_word = true;
                }
            },
        }
    }

    if quote != Quote::None {
        return Err(ToolError::InvalidInput(format!(
            "unterminated quote in command: {line}"
        )));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
