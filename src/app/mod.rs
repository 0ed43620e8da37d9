//! Application modules for the ambient monitoring agent.

pub mod agent_framework;
pub mod agent_url;
pub mod bedrock_client;
pub mod config;
pub mod credentials;
pub mod data_plane;
pub mod health;
pub mod scheduled_monitor;
pub mod sdk_errors;
pub mod server;
pub mod usage_errors;
