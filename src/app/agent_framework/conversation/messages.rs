//! Conversation turns
//!
//! A thread is an ordered list of [`Turn`]s. User and assistant turns carry text; an
//! assistant turn that requested tools also carries the [`ToolInvocation`]s, and each tool
//! result is recorded as its own tool turn paired to the invocation by call id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::app::agent_framework::tools::ToolResult;

/// Message role in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// User message (input from user)
    User,
    /// Assistant message (response from the reasoning policy)
    Assistant,
    /// Result of one tool invocation
    Tool,
}

/// A tool call requested by the reasoning policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Call id used to pair the result with the request
    pub id: String,
    pub name: String,
    /// Argument object as produced by the policy
    pub arguments: Value,
}

impl ToolInvocation {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// A single turn in a conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    /// Tools requested by an assistant turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolInvocation>,
    /// Invocation this tool turn answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// Tool turn carries a structured error
    #[serde(default)]
    pub is_error: bool,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    fn new(role: TurnRole, content: String) -> Self {
        Self {
            role,
            content,
            tool_calls: Vec::new(),
            tool_call_id: None,
            tool_name: None,
            is_error: false,
            timestamp: Utc::now(),
        }
    }

    /// Create a new user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content.into())
    }

    /// Create a new assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content.into())
    }

    /// Assistant turn that requested tool calls (text may be empty)
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolInvocation>) -> Self {
        Self {
            tool_calls,
            ..Self::new(TurnRole::Assistant, content.into())
        }
    }

    /// Tool turn recording the result of `invocation`
    pub fn tool_result(invocation: &ToolInvocation, result: &ToolResult) -> Self {
        Self {
            tool_call_id: Some(invocation.id.clone()),
            tool_name: Some(invocation.name.clone()),
            is_error: result.is_error(),
            ..Self::new(TurnRole::Tool, result.render())
        }
    }

    pub fn requests_tools(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}
