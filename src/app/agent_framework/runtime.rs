//! Agent runtime: one-time agent setup and the inbound payload contract
//!
//! The agent is built on the first invocation rather than at process start, so the HTTP host
//! answers health checks immediately. Setup runs at most once even under concurrent first
//! requests; [`AgentRuntime::is_ready`] reports whether it has completed.

use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

use super::conversation::InMemoryConversationStore;
use super::session::{MonitoringAgent, SessionError};
use super::tools_registry::ToolCatalog;
use crate::app::bedrock_client::BedrockConversePolicy;
use crate::app::config::{load_system_prompt, AgentConfig};
use crate::app::credentials::CredentialBroker;
use crate::app::data_plane::AwsBackend;
use crate::app::usage_errors::UsageError;

/// Thread used when the payload carries no `session_id`
pub const DEFAULT_SESSION_ID: &str = "default-session";

/// Error text for a payload without a usable prompt
pub const MISSING_PROMPT_ERROR: &str = "No 'prompt' field found in payload";

#[async_trait]
pub trait AgentFactory: Send + Sync {
    async fn build(&self) -> anyhow::Result<MonitoringAgent>;
}

/// Builds the production agent: Bedrock policy, AWS backend, in-memory threads
pub struct MonitoringAgentFactory {
    config: AgentConfig,
    /// Directory of the configuration file, for resolving a relative prompt path
    config_dir: Option<PathBuf>,
}

impl MonitoringAgentFactory {
    pub fn new(config: AgentConfig, config_dir: Option<PathBuf>) -> Self {
        Self { config, config_dir }
    }
}

#[async_trait]
impl AgentFactory for MonitoringAgentFactory {
    async fn build(&self) -> anyhow::Result<MonitoringAgent> {
        log_info!("Initializing agent components on first request...");

        let model = &self.config.model_information;
        let system_prompt =
            load_system_prompt(&model.system_prompt_fpath, self.config_dir.as_deref())?;

        let broker = Arc::new(CredentialBroker::from_environment(&self.config.aws).await);
        let policy = BedrockConversePolicy::new(
            aws_sdk_bedrockruntime::Client::new(&broker.ambient_config(None)),
            model.model_id.clone(),
            model.inference_parameters,
        );
        info!("Initialized Amazon Bedrock model: {}", model.model_id);

        let backend = Arc::new(AwsBackend::new(broker));
        let catalog = ToolCatalog::monitoring(backend, self.config.agent.analysis_event_cap)?;

        let agent = MonitoringAgent::new(
            Arc::new(policy),
            Arc::new(catalog),
            Arc::new(InMemoryConversationStore::new()),
            system_prompt,
            self.config.agent.clone(),
        );
        info!("Ambient monitoring agent created successfully");
        Ok(agent)
    }
}

/// Explicit runtime context shared by the HTTP handlers
pub struct AgentRuntime {
    factory: Box<dyn AgentFactory>,
    agent: OnceCell<Arc<MonitoringAgent>>,
}

impl AgentRuntime {
    pub fn new(factory: Box<dyn AgentFactory>) -> Self {
        Self {
            factory,
            agent: OnceCell::new(),
        }
    }

    /// Runtime around an already-built agent
    pub fn with_agent(agent: MonitoringAgent) -> Self {
        struct Prebuilt;

        #[async_trait]
        impl AgentFactory for Prebuilt {
            async fn build(&self) -> anyhow::Result<MonitoringAgent> {
                anyhow::bail!("agent is prebuilt")
            }
        }

        Self {
            factory: Box::new(Prebuilt),
            agent: OnceCell::new_with(Some(Arc::new(agent))),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.agent.initialized()
    }

    /// Build the agent on first use; a failed build is retried on the next call
    pub async fn agent(&self) -> anyhow::Result<Arc<MonitoringAgent>> {
        self.agent
            .get_or_try_init(|| async { self.factory.build().await.map(Arc::new) })
            .await
            .cloned()
    }

    /// Handle an inbound payload and produce the outbound text
    ///
    /// Success is the assistant's plain text; failures are a JSON object with `error` and,
    /// for empty responses, `raw_result`.
    pub async fn handle_payload(&self, payload: &Value) -> String {
        let prompt = payload
            .get("prompt")
            .and_then(Value::as_str)
            .filter(|p| !p.is_empty());
        let Some(prompt) = prompt else {
            error!("{}", MISSING_PROMPT_ERROR);
            return error_response(MISSING_PROMPT_ERROR, None);
        };
        info!("Received prompt: {}", prompt);

        let thread_id = match payload.get("session_id") {
            None | Some(Value::Null) => DEFAULT_SESSION_ID,
            Some(Value::String(id)) => id.as_str(),
            Some(_) => {
                let e = UsageError::NonStringThreadId;
                error!("Error processing request: {}", e);
                return error_response(&format!("Error processing request: {}", e), None);
            }
        };

        let agent = match self.agent().await {
            Ok(agent) => agent,
            Err(e) => {
                log_error!("Agent initialization failed: {:#}", e);
                return error_response(&format!("Error processing request: {:#}", e), None);
            }
        };

        match agent.handle(thread_id, prompt).await {
            Ok(answer) => {
                info!("Agent response generated successfully");
                answer
            }
            Err(SessionError::EmptyResponse { raw_result }) => {
                error_response("No valid response from agent", Some(&raw_result))
            }
            Err(e) => {
                error!("Error processing request: {}", e);
                error_response(&format!("Error processing request: {}", e), None)
            }
        }
    }
}

/// JSON error object with `": "` and `", "` separators, e.g. `{"error": "..."}`
pub fn error_response(error: &str, raw_result: Option<&str>) -> String {
    let quote = |s: &str| Value::String(s.to_string()).to_string();
    match raw_result {
        Some(raw) => format!(
            "{{\"error\": {}, \"raw_result\": {}}}",
            quote(error),
            quote(raw)
        ),
        None => format!("{{\"error\": {}}}", quote(error)),
    }
}
