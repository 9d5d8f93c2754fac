use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Substrings rejected anywhere in a task, case-insensitively.
pub const DANGEROUS_PATTERNS: &[&str] = &[
    "rm -rf",
    "DROP TABLE",
    "__import__",
    "eval(",
    "exec(",
    "system(",
];

const MAX_TASK_CHARS: usize = 1000;
const MAX_TOKENS_LIMIT: u32 = 4000;
const PRIORITIES: &[&str] = &["low", "medium", "high", "critical"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("task must not be empty")]
    Empty,
    #[error("task is {chars} characters, limit is {limit}")]
    TooLong { chars: usize, limit: usize },
    #[error("task contains suspicious pattern: {0}")]
    SuspiciousPattern(String),
    #[error("priority must be one of {allowed}, got '{got}'")]
    InvalidPriority { got: String, allowed: String },
    #[error("max_tokens must be between 1 and {limit}, got {got}")]
    MaxTokensOutOfRange { got: u32, limit: u32 },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskInput {
    pub task: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_priority() -> String {
    "medium".to_string()
}

impl TaskInput {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            priority: default_priority(),
            max_tokens: None,
        }
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let chars = self.task.chars().count();
        if self.task.trim().is_empty() {
            return Err(ValidationError::Empty);
        }
        if chars > MAX_TASK_CHARS {
            return Err(ValidationError::TooLong {
                chars,
                limit: MAX_TASK_CHARS,
            });
        }

        let lowered = self.task.to_lowercase();
        if let Some(pattern) = DANGEROUS_PATTERNS
            .iter()
            .find(|pattern| lowered.contains(&pattern.to_lowercase()))
        {
            return Err(ValidationError::SuspiciousPattern(pattern.to_string()));
        }

        if !PRIORITIES.contains(&self.priority.as_str()) {
            return Err(ValidationError::InvalidPriority {
                got: self.priority.clone(),
                allowed: PRIORITIES.join(", "),
            });
        }

        match self.max_tokens {
            Some(got) if got == 0 || got > MAX_TOKENS_LIMIT => {
                Err(ValidationError::MaxTokensOutOfRange {
                    got,
                    limit: MAX_TOKENS_LIMIT,
                })
            }
            _ => Ok(()),
        }
    }
}
