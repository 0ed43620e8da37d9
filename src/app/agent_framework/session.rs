//! Session loop
//!
//! One call to [`MonitoringAgent::handle`] is one user turn on one thread: replay the thread,
//! ask the policy, run requested tools through the catalog, record their results and repeat
//! until the policy answers or the round budget runs out. The thread lock is held for the
//! whole turn, so turns on the same thread never interleave.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::conversation::{ConversationMemory, ToolInvocation, Turn};
use super::policy::{PolicyError, PolicyRequest, ReasoningPolicy};
use super::tools::ToolResult;
use super::tools_registry::ToolCatalog;
use crate::app::config::SessionSettings;
use crate::app::usage_errors::UsageError;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Usage(#[from] UsageError),
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// The policy answered with no text and no tool calls
    #[error("No valid response from agent")]
    EmptyResponse { raw_result: String },
}

/// The monitoring agent: policy, tools, memory and limits
pub struct MonitoringAgent {
    policy: Arc<dyn ReasoningPolicy>,
    catalog: Arc<ToolCatalog>,
    memory: Arc<dyn ConversationMemory>,
    system_prompt: String,
    settings: SessionSettings,
}

impl MonitoringAgent {
    pub fn new(
        policy: Arc<dyn ReasoningPolicy>,
        catalog: Arc<ToolCatalog>,
        memory: Arc<dyn ConversationMemory>,
        system_prompt: impl Into<String>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            policy,
            catalog,
            memory,
            system_prompt: system_prompt.into(),
            settings,
        }
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn memory(&self) -> &Arc<dyn ConversationMemory> {
        &self.memory
    }

    /// Handle one user message on `thread_id` and return the assistant's answer
    pub async fn handle(&self, thread_id: &str, user_text: &str) -> Result<String, SessionError> {
        if thread_id.trim().is_empty() {
            return Err(UsageError::EmptyThreadId.into());
        }
        if user_text.trim().is_empty() {
            return Err(UsageError::EmptyPrompt.into());
        }

        let _thread = self.memory.lock(thread_id).await;
        self.memory.append(thread_id, Turn::user(user_text)).await;

        let tools = self.catalog.specs();
        let mut latest_results: Vec<(ToolInvocation, ToolResult)> = Vec::new();

        for round in 1..=self.settings.max_tool_rounds {
            let turns = self.memory.get(thread_id).await;
            debug!(
                "Thread {} round {}: asking policy with {} turns",
                thread_id,
                round,
                turns.len()
            );

            let decision = self
                .policy
                .decide(PolicyRequest {
                    system_prompt: &self.system_prompt,
                    turns: &turns,
                    tools: &tools,
                })
                .await
                .map_err(|e| {
                    error!("Reasoning policy failed on thread {}: {}", thread_id, e);
                    e
                })?;

            if decision.tool_calls.is_empty() {
                let answer = decision.text.trim();
                if answer.is_empty() {
                    error!("No valid response from agent on thread {}", thread_id);
                    return Err(SessionError::EmptyResponse {
                        raw_result: format!("{:?}", decision),
                    });
                }
                self.memory
                    .append(thread_id, Turn::assistant(answer))
                    .await;
                info!(
                    "Thread {} answered after {} round(s)",
                    thread_id, round
                );
                return Ok(answer.to_string());
            }

            let calls: Vec<ToolInvocation> = decision
                .tool_calls
                .into_iter()
                .map(|mut call| {
                    if call.id.is_empty() {
                        call.id = format!("call_{}", uuid::Uuid::new_v4().simple());
                    }
                    call
                })
                .collect();

            self.memory
                .append(
                    thread_id,
                    Turn::assistant_with_tools(decision.text, calls.clone()),
                )
                .await;

            let results = self.dispatch_round(&calls).await;
            for (call, result) in calls.iter().zip(&results) {
                self.memory
                    .append(thread_id, Turn::tool_result(call, result))
                    .await;
            }
            latest_results = calls.into_iter().zip(results).collect();
        }

        warn!(
            "Thread {} exhausted {} tool rounds; returning latest tool results",
            thread_id, self.settings.max_tool_rounds
        );
        let answer = synthesize_from_results(self.settings.max_tool_rounds, &latest_results);
        self.memory
            .append(thread_id, Turn::assistant(answer.clone()))
            .await;
        Ok(answer)
    }

    /// Dispatch one round's calls; results come back in request order
    async fn dispatch_round(&self, calls: &[ToolInvocation]) -> Vec<ToolResult> {
        let catalog = &self.catalog;
        let dispatches: Vec<_> = calls.iter().map(|call| catalog.dispatch(call)).collect();
        stream::iter(dispatches)
            .buffered(self.settings.max_parallel_tool_calls.max(1))
            .collect()
            .await
    }
}

/// Best-effort answer when the round budget runs out
fn synthesize_from_results(rounds: usize, results: &[(ToolInvocation, ToolResult)]) -> String {
    let mut sections = vec![format!(
        "I reached the limit of {} tool rounds before completing the analysis. \
         Here are the most recent tool results:",
        rounds
    )];
    for (call, result) in results {
        sections.push(format!("--- {} ---\n{}", call.name, result.render()));
    }
    sections.join("\n\n")
}
