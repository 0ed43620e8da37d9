//! Ambient Monitor - AI-driven operational monitoring for AWS accounts
//!
//! Ambient Monitor answers natural-language questions about AWS account health. A reasoning
//! policy (an Amazon Bedrock model by default) decides which read-only monitoring tool to
//! call; the crate executes those tools against CloudWatch, CloudWatch Logs and STS, reduces
//! the raw data into health verdicts, and returns a summary. Conversations are kept per
//! thread, tools can reach other accounts through IAM role assumption, and a scheduled check
//! can post a digest to a chat webhook.
//!
//! # Architecture Overview
//!
//! - **Credential broker** ([`app::credentials`]): ambient or assumed-role AWS clients with
//!   deterministic region resolution
//! - **Data plane** ([`app::data_plane`]): CloudWatch, CloudWatch Logs and STS access behind
//!   small traits, plus the paginating [`app::data_plane::cloudwatch_logs::LogAggregator`]
//! - **Health classifier** ([`app::health`]): keyword and threshold verdicts for log windows
//!   and alarm sets
//! - **Agent framework** ([`app::agent_framework`]): tool catalog, conversation memory,
//!   reasoning policy seam and the session loop
//! - **Hosting** ([`app::server`], [`app::scheduled_monitor`]): HTTP invocation endpoint and
//!   the scheduled digest
//!
//! # Request Flow
//!
//! ```text
//! POST /invocations ──► AgentRuntime ──► MonitoringAgent::handle(thread, prompt)
//!                                          │
//!                          ┌───────────────┴──────────────┐
//!                          ▼                              ▼
//!                  ReasoningPolicy                 ToolCatalog::dispatch
//!                  (Bedrock Converse)                     │
//!                                                         ▼
//!                                      MonitoringBackend ──► CredentialBroker
//!                                          │
//!                                          ▼
//!                              LogAggregator / HealthClassifier
//! ```

#![warn(clippy::all, rust_2018_idioms)]

// Include logging macros first
#[macro_use]
pub mod logging_macros;

pub mod app;
