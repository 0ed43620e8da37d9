//! Conversation and message handling
//!
//! This module holds conversation turns and the per-thread memory the session loop replays.

pub mod memory;
pub mod messages;

// Re-export commonly used items
pub use memory::{ConversationMemory, InMemoryConversationStore, ThreadGuard};
pub use messages::{ToolInvocation, Turn, TurnRole};
