//! CloudWatch Logs Client Wrapper
//!
//! `LogsApi` is the page-level view of CloudWatch Logs used by the aggregator and tools.
//! `CloudWatchLogsClient` implements it on top of the AWS SDK.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_cloudwatchlogs as cloudwatchlogs;
use tracing::debug;

use crate::app::sdk_errors::sdk_error_message;

use super::types::{EventPage, LogEvent, LogGroupPage};

/// Page-level CloudWatch Logs operations
#[async_trait]
pub trait LogsApi: Send + Sync {
    /// One page of log groups, optionally restricted to a name prefix
    async fn describe_log_groups(
        &self,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<LogGroupPage>;

    /// One page of events from a log group starting at `start_time` (Unix ms)
    async fn filter_log_events(
        &self,
        log_group_name: &str,
        start_time: i64,
        limit: i32,
        next_token: Option<String>,
    ) -> Result<EventPage>;
}

/// CloudWatch Logs client wrapper
#[derive(Clone, Debug)]
pub struct CloudWatchLogsClient {
    client: cloudwatchlogs::Client,
}

impl CloudWatchLogsClient {
    pub fn new(client: cloudwatchlogs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LogsApi for CloudWatchLogsClient {
    async fn describe_log_groups(
        &self,
        prefix: Option<&str>,
        next_token: Option<String>,
    ) -> Result<LogGroupPage> {
        let response = self
            .client
            .describe_log_groups()
            .set_log_group_name_prefix(prefix.map(str::to_string))
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| anyhow!(sdk_error_message(&e)))
            .with_context(|| match prefix {
                Some(prefix) => format!("Failed to describe log groups with prefix {}", prefix),
                None => "Failed to describe log groups".to_string(),
            })?;

        let log_group_names: Vec<String> = response
            .log_groups()
            .iter()
            .filter_map(|group| group.log_group_name().map(str::to_string))
            .collect();

        debug!(
            "DescribeLogGroups returned {} groups (prefix {:?}, more: {})",
            log_group_names.len(),
            prefix,
            response.next_token().is_some()
        );

        Ok(LogGroupPage {
            log_group_names,
            next_token: response.next_token().map(str::to_string),
        })
    }

    async fn filter_log_events(
        &self,
        log_group_name: &str,
        start_time: i64,
        limit: i32,
        next_token: Option<String>,
    ) -> Result<EventPage> {
        let response = self
            .client
            .filter_log_events()
            .log_group_name(log_group_name)
            .start_time(start_time)
            .limit(limit)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| anyhow!(sdk_error_message(&e)))
            .with_context(|| {
                format!(
                    "Failed to query log events from log group: {}",
                    log_group_name
                )
            })?;

        let events = response
            .events()
            .iter()
            .map(|event| LogEvent {
                timestamp: event.timestamp().unwrap_or(0),
                message: event.message().unwrap_or_default().to_string(),
                log_stream_name: event.log_stream_name().map(str::to_string),
            })
            .collect();

        Ok(EventPage {
            events,
            next_token: response.next_token().map(str::to_string),
        })
    }
}
