//! Monitoring Tools Module
//!
//! Each tool lives in its own file and implements [`MonitoringTool`]. This module defines
//! what every tool shares: the [`ToolResult`] contract, the declared argument schema used to
//! validate calls before a handler runs, and the helpers that turn cross-account arguments
//! and AWS failures into tool results.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::app::credentials::CrossAccountContext;
use crate::app::sdk_errors::categorize_error;

pub mod analyze_log_group;
pub mod fetch_cloudwatch_logs;
pub mod get_cloudwatch_alarms;
pub mod get_dashboard_summary;
pub mod list_cloudwatch_dashboards;
pub mod list_log_groups;
pub mod setup_cross_account_access;

// Re-export all tools for easy access
pub use analyze_log_group::AnalyzeLogGroupTool;
pub use fetch_cloudwatch_logs::FetchCloudWatchLogsTool;
pub use get_cloudwatch_alarms::GetCloudWatchAlarmsTool;
pub use get_dashboard_summary::GetDashboardSummaryTool;
pub use list_cloudwatch_dashboards::ListCloudWatchDashboardsTool;
pub use list_log_groups::ListLogGroupsTool;
pub use setup_cross_account_access::SetupCrossAccountAccessTool;

/// Upper bound on text handed back to the reasoning policy
pub const MAX_TOOL_OUTPUT_CHARS: usize = 20_000;

/// Outcome of one tool invocation; tools report failures here instead of returning `Err`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ToolResult {
    Text(String),
    Error {
        error: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl ToolResult {
    /// Text result, truncated to [`MAX_TOOL_OUTPUT_CHARS`]
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.chars().count() > MAX_TOOL_OUTPUT_CHARS {
            let kept: String = text.chars().take(MAX_TOOL_OUTPUT_CHARS).collect();
            ToolResult::Text(format!("{}\n... (output truncated)", kept))
        } else {
            ToolResult::Text(text)
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        ToolResult::Error {
            error: error.into(),
            detail: None,
        }
    }

    pub fn error_with_detail(error: impl Into<String>, detail: impl Into<String>) -> Self {
        ToolResult::Error {
            error: error.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ToolResult::Error { .. })
    }

    /// Text as recorded in the transcript; errors render as `{"error": ..., "detail": ...}`
    pub fn render(&self) -> String {
        match self {
            ToolResult::Text(text) => text.clone(),
            ToolResult::Error { .. } => serde_json::to_value(self)
                .map(|value| value.to_string())
                .unwrap_or_else(|_| "{\"error\":\"unrenderable tool error\"}".to_string()),
        }
    }
}

/// Declared argument type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    String,
    Integer,
}

impl ArgType {
    fn json_type(self) -> &'static str {
        match self {
            ArgType::String => "string",
            ArgType::Integer => "integer",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            ArgType::String => value.is_string(),
            ArgType::Integer => {
                value.is_i64()
                    || value
                        .as_f64()
                        .is_some_and(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            }
        }
    }
}

/// One declared argument
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub arg_type: ArgType,
    pub description: &'static str,
    pub required: bool,
    /// Inserted when an optional argument is omitted
    pub default: Option<Value>,
}

impl ArgSpec {
    pub fn required_string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            arg_type: ArgType::String,
            description,
            required: true,
            default: None,
        }
    }

    pub fn optional_string(name: &'static str, description: &'static str) -> Self {
        Self {
            required: false,
            ..Self::required_string(name, description)
        }
    }

    pub fn optional_integer(name: &'static str, description: &'static str, default: i64) -> Self {
        Self {
            name,
            arg_type: ArgType::Integer,
            description,
            required: false,
            default: Some(json!(default)),
        }
    }
}

/// Why a call's arguments were rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArgumentError {
    #[error("arguments must be a JSON object")]
    NotAnObject,
    #[error("missing required argument '{0}'")]
    Missing(String),
    #[error("argument '{field}' must be of type {expected}")]
    WrongType {
        field: String,
        expected: &'static str,
    },
    #[error("unexpected argument '{0}'")]
    Unexpected(String),
}

/// Declared argument schema of a tool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolSchema {
    pub args: Vec<ArgSpec>,
}

impl ToolSchema {
    pub fn new(args: Vec<ArgSpec>) -> Self {
        Self { args }
    }

    /// Arguments shared by every cross-account capable tool
    pub fn cross_account_args() -> Vec<ArgSpec> {
        vec![
            ArgSpec::optional_string(
                "account_id",
                "Target AWS account ID for cross-account access (optional)",
            ),
            ArgSpec::optional_string(
                "role_name",
                "IAM role name to assume in target account (optional)",
            ),
        ]
    }

    /// Validate raw arguments and fill in defaults
    ///
    /// `null` counts as omitted. Unknown keys are rejected.
    pub fn validate(&self, arguments: &Value) -> Result<ToolArgs, ArgumentError> {
        let empty = Map::new();
        let provided = match arguments {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => return Err(ArgumentError::NotAnObject),
        };

        if let Some(unknown) = provided
            .keys()
            .find(|key| !self.args.iter().any(|spec| spec.name == key.as_str()))
        {
            return Err(ArgumentError::Unexpected(unknown.clone()));
        }

        let mut values = Map::new();
        for spec in &self.args {
            match provided.get(spec.name).filter(|v| !v.is_null()) {
                Some(value) if spec.arg_type.accepts(value) => {
                    values.insert(spec.name.to_string(), value.clone());
                }
                Some(_) => {
                    return Err(ArgumentError::WrongType {
                        field: spec.name.to_string(),
                        expected: spec.arg_type.json_type(),
                    })
                }
                None if spec.required => {
                    return Err(ArgumentError::Missing(spec.name.to_string()));
                }
                None => {
                    if let Some(default) = &spec.default {
                        values.insert(spec.name.to_string(), default.clone());
                    }
                }
            }
        }

        Ok(ToolArgs(values))
    }

    /// JSON Schema object advertised to the reasoning policy
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for spec in &self.args {
            let mut property = json!({
                "type": spec.arg_type.json_type(),
                "description": spec.description,
            });
            if let (Some(default), Value::Object(map)) = (&spec.default, &mut property) {
                map.insert("default".to_string(), default.clone());
            }
            properties.insert(spec.name.to_string(), property);
        }

        let required: Vec<&str> = self
            .args
            .iter()
            .filter(|spec| spec.required)
            .map(|spec| spec.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Validated arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolArgs(Map<String, Value>);

impl ToolArgs {
    pub fn str(&self, name: &str) -> Option<&str> {
        self.0.get(name).and_then(Value::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.0
            .get(name)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
    }

    /// Cross-account context from `account_id`/`role_name`
    pub fn cross_account_context(&self) -> Result<CrossAccountContext, ToolResult> {
        CrossAccountContext::from_parts(self.str("account_id"), self.str("role_name")).map_err(
            |e| {
                ToolResult::error_with_detail(
                    e.to_string(),
                    "Provide both account_id and role_name for cross-account access, or neither for the current account",
                )
            },
        )
    }
}

/// A read-only monitoring operation the reasoning policy can call
#[async_trait]
pub trait MonitoringTool: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn schema(&self) -> ToolSchema;

    /// Run with validated arguments; never fails, errors come back as [`ToolResult::Error`]
    async fn execute(&self, args: ToolArgs) -> ToolResult;
}

/// Tool error for a failed AWS call: the original failure plus a categorized hint
pub fn aws_failure(
    summary: &str,
    error: &anyhow::Error,
    service: &str,
    operation: &str,
) -> ToolResult {
    let category = categorize_error(error, service, operation);
    tracing::error!("{}: {:#}", summary, error);
    ToolResult::error_with_detail(format!("{}: {:#}", summary, error), category.hint())
}
