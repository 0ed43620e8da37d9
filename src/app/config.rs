//! Agent configuration loaded once at startup
//!
//! The configuration file is YAML. Only `model_information` is required; every other
//! section falls back to defaults suitable for a single-account deployment.
//!
//! ```yaml
//! model_information:
//!   model_id: anthropic.claude-3-5-sonnet-20241022-v2:0
//!   inference_parameters:
//!     temperature: 0.1
//!     max_tokens: 2048
//!     top_p: 0.9
//!   system_prompt_fpath: config/system_prompt.txt
//! agent:
//!   max_tool_rounds: 10
//! aws:
//!   credential_cache: false
//! ```

#![warn(clippy::all, rust_2018_idioms)]

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};

/// Environment variable that overrides the configuration file path
pub const CONFIG_PATH_ENV: &str = "AMBIENT_MONITOR_CONFIG";

/// Configuration file used when neither `--config` nor the environment variable is set
pub const DEFAULT_CONFIG_PATH: &str = "config/agent_config.yaml";

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("system prompt file not found at {0}")]
    PromptNotFound(PathBuf),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Complete agent configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub model_information: ModelInformation,
    #[serde(default)]
    pub agent: SessionSettings,
    #[serde(default)]
    pub aws: AwsSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

/// Model identifier, inference parameters and system prompt location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelInformation {
    /// Bedrock model ID (e.g., "anthropic.claude-3-5-sonnet-20241022-v2:0")
    pub model_id: String,
    pub inference_parameters: InferenceParameters,
    /// Path to the system prompt, relative to the working directory or the config file
    pub system_prompt_fpath: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InferenceParameters {
    pub temperature: f32,
    pub max_tokens: i32,
    pub top_p: f32,
}

/// Session loop limits
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    /// Maximum policy rounds that may request tools before a best-effort answer is returned
    pub max_tool_rounds: usize,
    /// Tool calls from a single round executed concurrently (1 = sequential)
    pub max_parallel_tool_calls: usize,
    /// Upper bound on log events read by `analyze_log_group`
    pub analysis_event_cap: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            max_tool_rounds: 10,
            max_parallel_tool_calls: 1,
            analysis_event_cap: 1000,
        }
    }
}

/// Transport and credential settings shared by every AWS client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AwsSettings {
    /// Explicit region; highest priority in region resolution
    pub region: Option<String>,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    /// Total attempts including the first one (adaptive retry mode)
    pub max_attempts: u32,
    /// Reuse assumed-role credentials until shortly before they expire
    pub credential_cache: bool,
}

impl AwsSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }
}

impl Default for AwsSettings {
    fn default() -> Self {
        Self {
            region: None,
            connect_timeout_secs: 15,
            read_timeout_secs: 300,
            max_attempts: 3,
            credential_cache: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

impl AgentConfig {
    /// Load and validate the configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        info!("Loading config from local file system: {}", path.display());
        let content = std::fs::read_to_string(path).map_err(|source| {
            error!("Error loading config from {}: {}", path.display(), source);
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;
        let config = Self::from_yaml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        info!(
            "Loaded configuration: model={}, max_tool_rounds={}, credential_cache={}",
            config.model_information.model_id,
            config.agent.max_tool_rounds,
            config.aws.credential_cache
        );
        Ok(config)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: AgentConfig =
            serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.model_information.model_id.trim().is_empty() {
            return Err(ConfigError::Invalid("model_id must not be empty".into()));
        }
        if self.agent.max_tool_rounds == 0 {
            return Err(ConfigError::Invalid(
                "agent.max_tool_rounds must be at least 1".into(),
            ));
        }
        if self.agent.max_parallel_tool_calls == 0 {
            return Err(ConfigError::Invalid(
                "agent.max_parallel_tool_calls must be at least 1".into(),
            ));
        }
        if self.agent.analysis_event_cap == 0 {
            return Err(ConfigError::Invalid(
                "agent.analysis_event_cap must be at least 1".into(),
            ));
        }
        if self.aws.max_attempts == 0 {
            return Err(ConfigError::Invalid("aws.max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// Resolve the configuration path from an explicit argument, the environment, or the default
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }
}

/// Load the system prompt referenced by the configuration
///
/// The path is tried as given first, then relative to the directory holding the
/// configuration file.
pub fn load_system_prompt(prompt_path: &Path, config_dir: Option<&Path>) -> Result<String, ConfigError> {
    let mut candidates = vec![prompt_path.to_path_buf()];
    if let Some(dir) = config_dir {
        if prompt_path.is_relative() {
            candidates.push(dir.join(prompt_path));
        }
    }

    for candidate in &candidates {
        if candidate.is_file() {
            let prompt = std::fs::read_to_string(candidate).map_err(|source| ConfigError::Read {
                path: candidate.clone(),
                source,
            })?;
            info!("Successfully loaded system prompt from {}", candidate.display());
            return Ok(prompt);
        }
    }

    error!("System prompt file not found at {}", prompt_path.display());
    Err(ConfigError::PromptNotFound(prompt_path.to_path_buf()))
}
