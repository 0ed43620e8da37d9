//! Amazon Bedrock reasoning policy (Converse API with tool use)
//!
//! Conversation turns map onto Converse messages: user text and tool results are sent as
//! `user` content, assistant text and tool requests as `assistant` content. Bedrock requires
//! roles to alternate, so consecutive turns with the same role are merged into one message.

use async_trait::async_trait;
use aws_sdk_bedrockruntime::error::SdkError;
use aws_sdk_bedrockruntime::operation::converse::ConverseError;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message, SystemContentBlock, Tool,
    ToolConfiguration, ToolInputSchema, ToolResultBlock, ToolResultContentBlock,
    ToolResultStatus, ToolSpecification, ToolUseBlock,
};
use aws_sdk_bedrockruntime::Client as BedrockRuntimeClient;
use aws_smithy_types::{Document, Number};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::app::agent_framework::conversation::{ToolInvocation, Turn, TurnRole};
use crate::app::agent_framework::policy::{
    PolicyDecision, PolicyError, PolicyRequest, ReasoningPolicy,
};
use crate::app::agent_framework::tools_registry::ToolSpec;
use crate::app::config::InferenceParameters;
use crate::app::sdk_errors::sdk_error_message;

/// Converse-backed reasoning policy
#[derive(Debug, Clone)]
pub struct BedrockConversePolicy {
    client: BedrockRuntimeClient,
    model_id: String,
    inference: InferenceParameters,
}

impl BedrockConversePolicy {
    pub fn new(client: BedrockRuntimeClient, model_id: String, inference: InferenceParameters) -> Self {
        Self {
            client,
            model_id,
            inference,
        }
    }
}

#[async_trait]
impl ReasoningPolicy for BedrockConversePolicy {
    async fn decide(&self, request: PolicyRequest<'_>) -> Result<PolicyDecision, PolicyError> {
        let messages = turns_to_messages(request.turns)?;
        if messages.is_empty() {
            return Err(PolicyError::Malformed("no messages to send".to_string()));
        }
        let tool_config = tool_configuration(request.tools)?;

        debug!(
            "Converse request: model={}, messages={}, tools={}",
            self.model_id,
            messages.len(),
            request.tools.len()
        );

        let inference = InferenceConfiguration::builder()
            .max_tokens(self.inference.max_tokens)
            .temperature(self.inference.temperature)
            .top_p(self.inference.top_p)
            .build();

        let response = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(request.system_prompt.to_string()))
            .set_messages(Some(messages))
            .set_tool_config(tool_config)
            .inference_config(inference)
            .send()
            .await
            .map_err(|e| {
                error!(
                    "Error during Bedrock Converse API call (model_id={}): {}",
                    self.model_id,
                    sdk_error_message(&e)
                );
                policy_error(&e)
            })?;

        if let Some(usage) = response.usage() {
            info!(
                "Converse usage: input_tokens={}, output_tokens={}, stop_reason={}",
                usage.input_tokens(),
                usage.output_tokens(),
                response.stop_reason().as_str()
            );
        }

        let message = response
            .output()
            .and_then(|output| output.as_message().ok())
            .ok_or_else(|| {
                PolicyError::Malformed(format!("Converse output has no message: {:?}", response))
            })?;

        decision_from_message(message)
    }
}

fn policy_error(error: &SdkError<ConverseError>) -> PolicyError {
    let message = sdk_error_message(error);
    match error.as_service_error() {
        Some(ConverseError::ModelTimeoutException(_)) => PolicyError::Timeout(message),
        Some(ConverseError::ModelNotReadyException(_)) => PolicyError::NotReady(message),
        Some(ConverseError::ThrottlingException(_)) => PolicyError::Throttled(message),
        Some(ConverseError::AccessDeniedException(_)) => PolicyError::AccessDenied(message),
        _ => match error {
            SdkError::TimeoutError(_) => PolicyError::Timeout(message),
            _ => PolicyError::Unavailable(message),
        },
    }
}

fn build_error(e: impl std::fmt::Display) -> PolicyError {
    PolicyError::Malformed(format!("failed to build Converse request: {}", e))
}

/// Map turns to Converse messages, merging consecutive same-role content
pub fn turns_to_messages(turns: &[Turn]) -> Result<Vec<Message>, PolicyError> {
    let mut grouped: Vec<(ConversationRole, Vec<ContentBlock>)> = Vec::new();

    for turn in turns {
        let (role, blocks) = match turn.role {
            TurnRole::User => (
                ConversationRole::User,
                vec![ContentBlock::Text(turn.content.clone())],
            ),
            TurnRole::Assistant => {
                let mut blocks = Vec::new();
                if !turn.content.trim().is_empty() {
                    blocks.push(ContentBlock::Text(turn.content.clone()));
                }
                for call in &turn.tool_calls {
                    let tool_use = ToolUseBlock::builder()
                        .tool_use_id(&call.id)
                        .name(&call.name)
                        .input(json_to_document(&call.arguments))
                        .build()
                        .map_err(build_error)?;
                    blocks.push(ContentBlock::ToolUse(tool_use));
                }
                (ConversationRole::Assistant, blocks)
            }
            TurnRole::Tool => {
                let status = if turn.is_error {
                    ToolResultStatus::Error
                } else {
                    ToolResultStatus::Success
                };
                let result = ToolResultBlock::builder()
                    .tool_use_id(turn.tool_call_id.clone().unwrap_or_default())
                    .content(ToolResultContentBlock::Text(turn.content.clone()))
                    .status(status)
                    .build()
                    .map_err(build_error)?;
                (ConversationRole::User, vec![ContentBlock::ToolResult(result)])
            }
        };

        if blocks.is_empty() {
            continue;
        }
        match grouped.last_mut() {
            Some((last_role, last_blocks)) if *last_role == role => last_blocks.extend(blocks),
            _ => grouped.push((role, blocks)),
        }
    }

    grouped
        .into_iter()
        .map(|(role, blocks)| {
            Message::builder()
                .role(role)
                .set_content(Some(blocks))
                .build()
                .map_err(build_error)
        })
        .collect()
}

fn tool_configuration(tools: &[ToolSpec]) -> Result<Option<ToolConfiguration>, PolicyError> {
    if tools.is_empty() {
        return Ok(None);
    }

    let specs = tools
        .iter()
        .map(|tool| {
            ToolSpecification::builder()
                .name(&tool.name)
                .description(&tool.description)
                .input_schema(ToolInputSchema::Json(json_to_document(&tool.input_schema)))
                .build()
                .map(Tool::ToolSpec)
                .map_err(build_error)
        })
        .collect::<Result<Vec<_>, _>>()?;

    ToolConfiguration::builder()
        .set_tools(Some(specs))
        .build()
        .map(Some)
        .map_err(build_error)
}

/// Read text and tool requests out of an assistant message
pub fn decision_from_message(message: &Message) -> Result<PolicyDecision, PolicyError> {
    let mut text = Vec::new();
    let mut tool_calls = Vec::new();

    for block in message.content() {
        match block {
            ContentBlock::Text(t) => text.push(t.clone()),
            ContentBlock::ToolUse(tool_use) => tool_calls.push(ToolInvocation::new(
                tool_use.tool_use_id(),
                tool_use.name(),
                document_to_json(tool_use.input()),
            )),
            other => debug!("Ignoring Converse content block: {:?}", other),
        }
    }

    Ok(PolicyDecision {
        text: text.join("\n"),
        tool_calls,
    })
}

pub fn json_to_document(value: &Value) -> Document {
    match value {
        Value::Null => Document::Null,
        Value::Bool(b) => Document::Bool(*b),
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Document::Number(Number::PosInt(u))
            } else if let Some(i) = n.as_i64() {
                Document::Number(Number::NegInt(i))
            } else {
                Document::Number(Number::Float(n.as_f64().unwrap_or_default()))
            }
        }
        Value::String(s) => Document::String(s.clone()),
        Value::Array(items) => Document::Array(items.iter().map(json_to_document).collect()),
        Value::Object(map) => Document::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_document(v)))
                .collect(),
        ),
    }
}

pub fn document_to_json(document: &Document) -> Value {
    match document {
        Document::Null => Value::Null,
        Document::Bool(b) => Value::Bool(*b),
        Document::Number(Number::PosInt(u)) => Value::from(*u),
        Document::Number(Number::NegInt(i)) => Value::from(*i),
        Document::Number(Number::Float(f)) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Document::String(s) => Value::String(s.clone()),
        Document::Array(items) => Value::Array(items.iter().map(document_to_json).collect()),
        Document::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), document_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::agent_framework::tools::ToolResult;
    use serde_json::json;

    #[test]
    fn test_turns_merge_and_pair_tool_results() {
        let call = ToolInvocation::new("tooluse_1", "list_log_groups", json!({"limit": 5}));
        let turns = vec![
            Turn::user("what log groups exist?"),
            Turn::assistant_with_tools("", vec![call.clone()]),
            Turn::tool_result(&call, &ToolResult::text("Found 1 log group(s)")),
            Turn::user("and dashboards?"),
        ];

        let messages = turns_to_messages(&turns).unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].role(), &ConversationRole::User);
        assert_eq!(messages[1].role(), &ConversationRole::Assistant);
        assert_eq!(messages[1].content().len(), 1);
        assert!(messages[1].content()[0].is_tool_use());

        // tool result and the follow-up question share one user message
        assert_eq!(messages[2].role(), &ConversationRole::User);
        assert_eq!(messages[2].content().len(), 2);
        let ContentBlock::ToolResult(result) = &messages[2].content()[0] else {
            panic!("expected tool result block");
        };
        assert_eq!(result.tool_use_id(), "tooluse_1");
        assert_eq!(result.status(), Some(&ToolResultStatus::Success));
    }

    #[test]
    fn test_decision_from_tool_use_message() {
        let message = Message::builder()
            .role(ConversationRole::Assistant)
            .content(ContentBlock::Text("Checking alarms.".to_string()))
            .content(ContentBlock::ToolUse(
                ToolUseBlock::builder()
                    .tool_use_id("tooluse_9")
                    .name("get_cloudwatch_alarms_for_service")
                    .input(json_to_document(&json!({"service_name": "lambda"})))
                    .build()
                    .unwrap(),
            ))
            .build()
            .unwrap();

        let decision = decision_from_message(&message).unwrap();
        assert_eq!(decision.text, "Checking alarms.");
        assert_eq!(
            decision.tool_calls,
            vec![ToolInvocation::new(
                "tooluse_9",
                "get_cloudwatch_alarms_for_service",
                json!({"service_name": "lambda"})
            )]
        );
    }

    #[test]
    fn test_document_conversion_preserves_schema() {
        let schema = json!({
            "type": "object",
            "properties": {"hours": {"type": "integer", "default": 1}, "ratio": 0.5, "offset": -3},
            "required": ["service_name"],
            "strict": false,
            "extra": null
        });
        assert_eq!(document_to_json(&json_to_document(&schema)), schema);
    }
}
