//! CloudWatch Logs Integration Module
//!
//! Log group discovery and event retrieval for the monitoring tools.
//!
//! ## Features
//!
//! - Service name to log group prefix resolution
//! - Paginated group listing and event filtering within a time window
//! - Capped aggregation across many groups with per-group failure isolation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ambient_monitor::app::credentials::CrossAccountContext;
//! use ambient_monitor::app::data_plane::cloudwatch_logs::{
//!     LogAggregator, LogQuery, LogTarget, LogsApi,
//! };
//!
//! # async fn example(logs: &dyn LogsApi) -> anyhow::Result<()> {
//! let query = LogQuery::new(
//!     LogTarget::Service("lambda".to_string()),
//!     1,  // hours
//!     50, // max_events
//!     CrossAccountContext::Ambient,
//! )?;
//!
//! for entry in LogAggregator::new(logs).fetch(&query).await {
//!     println!("[{}] {} {}", entry.timestamp, entry.log_group, entry.message);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(clippy::all, rust_2018_idioms)]

pub mod aggregator;
pub mod client;
pub mod resource_mapping;
pub mod types;

// Re-export commonly used types
pub use aggregator::{GroupRead, LogAggregator};
pub use client::{CloudWatchLogsClient, LogsApi};
pub use resource_mapping::log_group_prefixes;
pub use types::{AggregatedLogEntry, EventPage, LogEvent, LogGroupPage, LogQuery, LogTarget};
