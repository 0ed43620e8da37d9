//! Agent Framework Module - tool-calling monitoring sessions
//!
//! This module provides the pieces of a monitoring conversation:
//!
//! - [`conversation`]: turns and per-thread memory
//! - [`tools`]: the monitoring tools and their argument schema
//! - [`tools_registry`]: the catalog that validates and dispatches tool calls
//! - [`policy`]: the reasoning policy seam
//! - [`session`]: the loop that drives one user turn
//! - [`runtime`]: one-time agent setup and the inbound payload contract

pub mod conversation;
pub mod policy;
pub mod runtime;
pub mod session;
pub mod tools;
pub mod tools_registry;

pub use conversation::{ConversationMemory, InMemoryConversationStore, ToolInvocation, Turn, TurnRole};
pub use policy::{PolicyDecision, PolicyError, PolicyRequest, ReasoningPolicy};
pub use runtime::{AgentFactory, AgentRuntime, MonitoringAgentFactory};
pub use session::{MonitoringAgent, SessionError};
pub use tools::{MonitoringTool, ToolResult};
pub use tools_registry::{CatalogError, ToolCatalog, ToolSpec};
