//! CloudWatch Logs Data Types
//!
//! Pages returned by the logs API, log queries and aggregated log entries.

#![warn(clippy::all, rust_2018_idioms)]

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::app::credentials::CrossAccountContext;
use crate::app::usage_errors::UsageError;

/// A single CloudWatch log event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    /// Event timestamp (Unix timestamp in milliseconds)
    pub timestamp: i64,
    pub message: String,
    pub log_stream_name: Option<String>,
}

impl LogEvent {
    pub fn new(timestamp: i64, message: impl Into<String>) -> Self {
        Self {
            timestamp,
            message: message.into(),
            log_stream_name: None,
        }
    }
}

/// One page of `DescribeLogGroups`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogGroupPage {
    pub log_group_names: Vec<String>,
    pub next_token: Option<String>,
}

/// One page of `FilterLogEvents`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPage {
    pub events: Vec<LogEvent>,
    pub next_token: Option<String>,
}

/// What a log query reads from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Service name resolved to log group prefixes
    Service(String),
    /// One explicit log group
    LogGroup(String),
}

/// Longest query window: the longest CloudWatch Logs retention (3653 days)
pub const MAX_QUERY_HOURS: u32 = 3653 * 24;

/// A bounded log query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    pub target: LogTarget,
    pub hours: u32,
    pub max_events: usize,
    pub context: CrossAccountContext,
}

impl LogQuery {
    /// Create a query, rejecting a non-positive cap or a window outside `1..=MAX_QUERY_HOURS`
    pub fn new(
        target: LogTarget,
        hours: i64,
        max_events: i64,
        context: CrossAccountContext,
    ) -> Result<Self, UsageError> {
        let hours = u32::try_from(hours)
            .ok()
            .filter(|h| *h > 0)
            .ok_or(UsageError::NonPositive {
                field: "hours",
                value: hours,
            })?;
        if hours > MAX_QUERY_HOURS {
            return Err(UsageError::TooLarge {
                field: "hours",
                value: i64::from(hours),
                max: i64::from(MAX_QUERY_HOURS),
            });
        }
        let max_events = usize::try_from(max_events)
            .ok()
            .filter(|n| *n > 0)
            .ok_or(UsageError::NonPositive {
                field: "max_events",
                value: max_events,
            })?;
        Ok(Self {
            target,
            hours,
            max_events,
            context,
        })
    }

    /// Window start relative to `now` (Unix timestamp in milliseconds)
    ///
    /// Saturates at the Unix epoch rather than overflowing.
    pub fn start_time_millis(&self, now: DateTime<Utc>) -> i64 {
        Duration::try_hours(i64::from(self.hours))
            .and_then(|window| now.checked_sub_signed(window))
            .map_or(0, |start| start.timestamp_millis().max(0))
    }
}

/// A log event tagged with the group it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedLogEntry {
    pub timestamp: DateTime<Utc>,
    pub log_group: String,
    pub message: String,
}

impl AggregatedLogEntry {
    pub fn from_event(log_group: &str, event: LogEvent) -> Self {
        Self {
            timestamp: DateTime::<Utc>::from_timestamp_millis(event.timestamp)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            log_group: log_group.to_string(),
            message: event.message,
        }
    }
}
