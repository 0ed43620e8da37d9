//! Reasoning policy seam
//!
//! The session loop asks a [`ReasoningPolicy`] what to do next given the system prompt, the
//! full thread and the tool specs. The policy either answers (text, no tool calls) or asks
//! for tools. Amazon Bedrock is the production policy; tests script one.

use async_trait::async_trait;
use thiserror::Error;

use super::conversation::{ToolInvocation, Turn};
use super::tools_registry::ToolSpec;

/// Everything the policy sees for one decision
#[derive(Debug, Clone, Copy)]
pub struct PolicyRequest<'a> {
    pub system_prompt: &'a str,
    pub turns: &'a [Turn],
    pub tools: &'a [ToolSpec],
}

/// One policy decision: final text, or tool calls (possibly with interim text)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolicyDecision {
    pub text: String,
    pub tool_calls: Vec<ToolInvocation>,
}

impl PolicyDecision {
    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn call_tools(tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            text: String::new(),
            tool_calls,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("Model took too long: {0}")]
    Timeout(String),
    #[error("Model is not ready: {0}")]
    NotReady(String),
    #[error("Model request throttled: {0}")]
    Throttled(String),
    #[error("Model access denied: {0}")]
    AccessDenied(String),
    #[error("Reasoning policy unavailable: {0}")]
    Unavailable(String),
    #[error("Malformed model response: {0}")]
    Malformed(String),
}

#[async_trait]
pub trait ReasoningPolicy: Send + Sync {
    async fn decide(&self, request: PolicyRequest<'_>) -> Result<PolicyDecision, PolicyError>;
}
