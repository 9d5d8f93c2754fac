use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Args, Parser};

use switchyard_core::{SwitchyardError, ToolCallingLlm};
use switchyard_llm::{OpenAiCompatibleClient, ScriptedLlm, DEFAULT_MODEL};
use switchyard_tools::{CommandTool, JsonQueryTool};

#[derive(Debug, Parser)]
#[command(name = "switchyard")]
#[command(about = "Walkthroughs of middleware chains, subprocess tools and coordinator workflows")]
#[command(version)]
pub struct Cli {
    /// Example to run (1-6) or "all". Prints the menu when omitted.
    pub example: Option<Selection>,

    #[command(flatten)]
    pub settings: Settings,
}

#[derive(Clone, Debug, Args)]
pub struct Settings {
    /// API key for the OpenAI-compatible provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Provider base URL
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,

    /// Model used by every agent
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sample data for the JSON query examples
    #[arg(long, env = "SWITCHYARD_DATA", default_value = "data/sample.json")]
    pub data: PathBuf,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Response cache capacity
    #[arg(long, env = "CACHE_SIZE", default_value_t = 100)]
    pub cache_size: usize,

    /// Attempts for retried calls
    #[arg(long, env = "MAX_RETRIES", default_value_t = 3)]
    pub max_retries: usize,

    /// Request and subprocess timeout in seconds
    #[arg(long, env = "TIMEOUT", default_value_t = 30)]
    pub timeout: u64,

    /// Cache agent responses
    #[arg(long, env = "ENABLE_CACHING", default_value_t = true, action = ArgAction::Set)]
    pub enable_caching: bool,

    /// Tracing-service key, reported but not used
    #[arg(long, env = "LANGSMITH_API_KEY", hide_env_values = true)]
    pub langsmith_api_key: Option<String>,

    /// Tracing-service switch, reported but not used
    #[arg(long, env = "LANGSMITH_TRACING", default_value_t = false, action = ArgAction::Set)]
    pub langsmith_tracing: bool,
}

impl Settings {
    /// Client for examples that need a real provider. Fails fast without a key.
    pub fn require_llm(&self) -> Result<Arc<dyn ToolCallingLlm>, SwitchyardError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                SwitchyardError::InvalidConfig(
                    "OPENAI_API_KEY is required for this example".to_string(),
                )
            })?;
        let mut builder = OpenAiCompatibleClient::builder()
            .api_key(api_key)
            .default_model(self.model.clone())
            .timeout(self.timeout());
        if let Some(base_url) = &self.base_url {
            builder = builder.base_url(base_url)?;
        }
        Ok(Arc::new(builder.build()?))
    }

    /// Real client when configured, otherwise an offline echo model.
    pub fn llm_or_scripted(&self) -> Arc<dyn ToolCallingLlm> {
        match self.require_llm() {
            Ok(llm) => llm,
            Err(err) => {
                tracing::warn!(error = %err, "using the offline scripted model");
                Arc::new(ScriptedLlm::echo())
            }
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout.max(1))
    }

    /// Command tool bounded by the configured timeout.
    pub fn command_tool(&self) -> CommandTool {
        CommandTool::new().timeout(self.timeout())
    }

    pub fn json_tool(&self) -> JsonQueryTool {
        JsonQueryTool::new().timeout(self.timeout())
    }

    pub fn data_path(&self) -> String {
        self.data.display().to_string()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Selection {
    One(u8),
    All,
}

impl FromStr for Selection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("all") {
            return Ok(Selection::All);
        }
        match value.parse::<u8>() {
            Ok(number) if (1..=crate::demos::COUNT).contains(&number) => Ok(Selection::One(number)),
            _ => Err(format!(
                "expected a number from 1 to {} or 'all', got '{value}'",
                crate::demos::COUNT
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_parsing() {
        assert_eq!("3".parse::<Selection>(), Ok(Selection::One(3)));
        assert_eq!("ALL".parse::<Selection>(), Ok(Selection::All));
        assert!("0".parse::<Selection>().is_err());
        assert!("7".parse::<Selection>().is_err());
        assert!("seven".parse::<Selection>().is_err());
    }

    #[test]
    fn missing_key_fails_fast() {
        let cli = Cli::parse_from(["switchyard", "2", "--api-key", ""]);
        let err = cli.settings.require_llm().err().unwrap();
        assert!(matches!(err, SwitchyardError::InvalidConfig(_)));
        assert_eq!(cli.example, Some(Selection::One(2)));
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "switchyard",
            "--cache-size",
            "5",
            "--enable-caching",
            "false",
            "--timeout",
            "0",
        ]);
        assert_eq!(cli.example, None);
        assert_eq!(cli.settings.cache_size, 5);
        assert!(!cli.settings.enable_caching);
        assert_eq!(cli.settings.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn tools_inherit_the_configured_timeout() {
        let cli = Cli::parse_from(["switchyard", "--timeout", "7"]);
        let expected = Duration::from_secs(7);
        assert_eq!(cli.settings.command_tool().configured_timeout(), expected);
        assert_eq!(cli.settings.json_tool().configured_timeout(), expected);
    }
}
