//! Tool catalog: registration, advertised specs and dispatch
//!
//! The catalog maps each tool name to its handler and declared schema. Registration checks
//! the name and schema once; dispatch validates every call against the schema before the
//! handler runs, so handlers only ever see well-typed arguments.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::conversation::ToolInvocation;
use super::tools::*;
use crate::app::data_plane::MonitoringBackend;

/// Longest tool name Bedrock accepts
const MAX_TOOL_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("tool '{0}' is already registered")]
    DuplicateTool(String),
    #[error("invalid tool name '{0}': use 1-64 letters, digits, '_' or '-'")]
    InvalidName(String),
    #[error("tool '{tool}' declares argument '{arg}' more than once")]
    DuplicateArgument { tool: String, arg: String },
    #[error("tool '{tool}' argument '{arg}' is required but has a default")]
    RequiredWithDefault { tool: String, arg: String },
    #[error("tool '{tool}' argument '{arg}' has a default of the wrong type")]
    DefaultTypeMismatch { tool: String, arg: String },
}

/// What the reasoning policy sees for one tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema for the argument object
    pub input_schema: Value,
}

struct CatalogEntry {
    schema: ToolSchema,
    tool: Arc<dyn MonitoringTool>,
}

/// Registered tools in registration order
#[derive(Default)]
pub struct ToolCatalog {
    entries: Vec<CatalogEntry>,
    index: HashMap<&'static str, usize>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The seven monitoring tools over `backend`
    pub fn monitoring(
        backend: Arc<dyn MonitoringBackend>,
        analysis_event_cap: usize,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();
        catalog.register(Arc::new(ListCloudWatchDashboardsTool::new(backend.clone())))?;
        catalog.register(Arc::new(GetDashboardSummaryTool::new(backend.clone())))?;
        catalog.register(Arc::new(ListLogGroupsTool::new(backend.clone())))?;
        catalog.register(Arc::new(FetchCloudWatchLogsTool::new(backend.clone())))?;
        catalog.register(Arc::new(AnalyzeLogGroupTool::new(
            backend.clone(),
            analysis_event_cap,
        )))?;
        catalog.register(Arc::new(GetCloudWatchAlarmsTool::new(backend.clone())))?;
        catalog.register(Arc::new(SetupCrossAccountAccessTool::new(backend)))?;
        info!("Registered {} monitoring tools", catalog.len());
        Ok(catalog)
    }

    /// Register a tool after checking its name and schema
    pub fn register(&mut self, tool: Arc<dyn MonitoringTool>) -> Result<(), CatalogError> {
        let name = tool.name();
        let valid_name = !name.is_empty()
            && name.len() <= MAX_TOOL_NAME_LEN
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_name {
            return Err(CatalogError::InvalidName(name.to_string()));
        }
        if self.index.contains_key(name) {
            return Err(CatalogError::DuplicateTool(name.to_string()));
        }

        let schema = tool.schema();
        let mut seen = HashSet::new();
        for spec in &schema.args {
            if !seen.insert(spec.name) {
                return Err(CatalogError::DuplicateArgument {
                    tool: name.to_string(),
                    arg: spec.name.to_string(),
                });
            }
            match &spec.default {
                Some(_) if spec.required => {
                    return Err(CatalogError::RequiredWithDefault {
                        tool: name.to_string(),
                        arg: spec.name.to_string(),
                    })
                }
                Some(default) if !schema_accepts(spec, default) => {
                    return Err(CatalogError::DefaultTypeMismatch {
                        tool: name.to_string(),
                        arg: spec.name.to_string(),
                    })
                }
                _ => {}
            }
        }

        self.index.insert(name, self.entries.len());
        self.entries.push(CatalogEntry { schema, tool });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.entries.iter().map(|e| e.tool.name()).collect()
    }

    /// Specs advertised to the reasoning policy, in registration order
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.entries
            .iter()
            .map(|entry| ToolSpec {
                name: entry.tool.name().to_string(),
                description: entry.tool.description().to_string(),
                input_schema: entry.schema.to_json_schema(),
            })
            .collect()
    }

    /// Run one invocation; every failure comes back as a tool error
    pub async fn dispatch(&self, invocation: &ToolInvocation) -> ToolResult {
        let Some(entry) = self
            .index
            .get(invocation.name.as_str())
            .and_then(|i| self.entries.get(*i))
        else {
            warn!("Policy requested unknown tool '{}'", invocation.name);
            return ToolResult::error_with_detail(
                "unknown tool",
                format!(
                    "no tool named '{}'; available tools: {}",
                    invocation.name,
                    self.names().join(", ")
                ),
            );
        };

        let args = match entry.schema.validate(&invocation.arguments) {
            Ok(args) => args,
            Err(e) => {
                warn!("Rejected arguments for {}: {}", invocation.name, e);
                return ToolResult::error(e.to_string());
            }
        };

        let started = std::time::Instant::now();
        let result = entry.tool.execute(args).await;
        info!(
            "Tool {} finished in {:?}{}",
            invocation.name,
            started.elapsed(),
            if result.is_error() { " with error" } else { "" }
        );
        result
    }
}

fn schema_accepts(spec: &ArgSpec, value: &Value) -> bool {
    ToolSchema::new(vec![ArgSpec {
        required: true,
        default: None,
        ..spec.clone()
    }])
    .validate(&Value::Object(
        [(spec.name.to_string(), value.clone())].into_iter().collect(),
    ))
    .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool {
        name: &'static str,
        schema: ToolSchema,
    }

    #[async_trait]
    impl MonitoringTool for EchoTool {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "Echo the message argument"
        }

        fn schema(&self) -> ToolSchema {
            self.schema.clone()
        }

        async fn execute(&self, args: ToolArgs) -> ToolResult {
            ToolResult::text(format!(
                "{} x{}",
                args.str("message").unwrap_or_default(),
                args.int("times").unwrap_or_default()
            ))
        }
    }

    fn echo(name: &'static str) -> Arc<dyn MonitoringTool> {
        Arc::new(EchoTool {
            name,
            schema: ToolSchema::new(vec![
                ArgSpec::required_string("message", "Message"),
                ArgSpec::optional_integer("times", "Repeat count", 2),
            ]),
        })
    }

    #[tokio::test]
    async fn test_dispatch_validates_then_runs() {
        let mut catalog = ToolCatalog::new();
        catalog.register(echo("echo")).unwrap();

        let ok = catalog
            .dispatch(&ToolInvocation::new("1", "echo", json!({"message": "hi"})))
            .await;
        assert_eq!(ok, ToolResult::Text("hi x2".into()));

        let bad = catalog
            .dispatch(&ToolInvocation::new("2", "echo", json!({"times": 1})))
            .await;
        assert_eq!(bad, ToolResult::error("missing required argument 'message'"));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let catalog = ToolCatalog::new();
        let result = catalog
            .dispatch(&ToolInvocation::new("1", "delete_everything", json!({})))
            .await;
        assert!(matches!(result, ToolResult::Error { ref error, .. } if error == "unknown tool"));
    }

    #[test]
    fn test_registration_rejects_duplicates_and_bad_names() {
        let mut catalog = ToolCatalog::new();
        catalog.register(echo("echo")).unwrap();
        assert_eq!(
            catalog.register(echo("echo")),
            Err(CatalogError::DuplicateTool("echo".into()))
        );
        assert_eq!(
            catalog.register(echo("has space")),
            Err(CatalogError::InvalidName("has space".into()))
        );
    }

    #[test]
    fn test_registration_rejects_bad_defaults() {
        let mut catalog = ToolCatalog::new();
        let bad_default = Arc::new(EchoTool {
            name: "bad_default",
            schema: ToolSchema::new(vec![ArgSpec {
                default: Some(json!("one")),
                ..ArgSpec::optional_integer("times", "Repeat count", 1)
            }]),
        });
        assert!(matches!(
            catalog.register(bad_default),
            Err(CatalogError::DefaultTypeMismatch { .. })
        ));

        let required_default = Arc::new(EchoTool {
            name: "required_default",
            schema: ToolSchema::new(vec![ArgSpec {
                required: true,
                ..ArgSpec::optional_integer("times", "Repeat count", 1)
            }]),
        });
        assert!(matches!(
            catalog.register(required_default),
            Err(CatalogError::RequiredWithDefault { .. })
        ));
    }

    #[test]
    fn test_specs_in_registration_order() {
        let mut catalog = ToolCatalog::new();
        catalog.register(echo("b_tool")).unwrap();
        catalog.register(echo("a_tool")).unwrap();
        let specs = catalog.specs();
        assert_eq!(specs[0].name, "b_tool");
        assert_eq!(specs[1].input_schema["required"], json!(["message"]));
    }
}
