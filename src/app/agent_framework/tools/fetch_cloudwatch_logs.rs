//! Fetch recent log entries for an AWS service

use async_trait::async_trait;
use chrono::SecondsFormat;
use std::sync::Arc;
use tracing::info;

use super::{aws_failure, ArgSpec, MonitoringTool, ToolArgs, ToolResult, ToolSchema};
use crate::app::data_plane::cloudwatch_logs::{AggregatedLogEntry, LogQuery, LogTarget};
use crate::app::data_plane::{LogAggregator, MonitoringBackend};

/// Characters of each message shown in the listing
const MESSAGE_PREVIEW_CHARS: usize = 200;

pub struct FetchCloudWatchLogsTool {
    backend: Arc<dyn MonitoringBackend>,
}

impl FetchCloudWatchLogsTool {
    pub fn new(backend: Arc<dyn MonitoringBackend>) -> Self {
        Self { backend }
    }
}

fn preview(message: &str) -> String {
    let message = message.trim_end();
    if message.chars().count() > MESSAGE_PREVIEW_CHARS {
        let kept: String = message.chars().take(MESSAGE_PREVIEW_CHARS).collect();
        format!("{}...", kept)
    } else {
        message.to_string()
    }
}

pub fn format_log_entries(service_name: &str, query: &LogQuery, entries: &[AggregatedLogEntry]) -> String {
    let account = query.context.describe();
    if entries.is_empty() {
        return format!(
            "No logs found for service '{}' in the last {} hour(s) in {}.",
            service_name, query.hours, account
        );
    }

    let mut lines = vec![format!(
        "Retrieved {} log entries for service '{}' from {}:\n",
        entries.len(),
        service_name,
        account
    )];
    for entry in entries {
        lines.push(format!(
            "[{}] {}",
            entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            entry.log_group
        ));
        lines.push(format!("  {}\n", preview(&entry.message)));
    }
    lines.join("\n")
}

#[async_trait]
impl MonitoringTool for FetchCloudWatchLogsTool {
    fn name(&self) -> &'static str {
        "fetch_cloudwatch_logs_for_service"
    }

    fn description(&self) -> &'static str {
        "Fetch recent CloudWatch logs for a specific AWS service. Use this tool to retrieve \
         recent log entries from services like Lambda, EC2, RDS, EKS, API Gateway, Amazon \
         Bedrock, etc."
    }

    fn schema(&self) -> ToolSchema {
        let mut args = vec![
            ArgSpec::required_string(
                "service_name",
                "AWS service name (e.g., 'lambda', 'ec2', 'bedrock')",
            ),
            ArgSpec::optional_integer(
                "hours",
                "Number of hours of logs to retrieve (default: 1)",
                1,
            ),
        ];
        args.extend(ToolSchema::cross_account_args());
        args.push(ArgSpec::optional_integer(
            "max_events",
            "Maximum number of log events to return (default: 50)",
            50,
        ));
        ToolSchema::new(args)
    }

    async fn execute(&self, args: ToolArgs) -> ToolResult {
        let service_name = args.str("service_name").unwrap_or_default().to_string();
        let ctx = match args.cross_account_context() {
            Ok(ctx) => ctx,
            Err(result) => return result,
        };
        let query = match LogQuery::new(
            LogTarget::Service(service_name.clone()),
            args.int("hours").unwrap_or(1),
            args.int("max_events").unwrap_or(50),
            ctx,
        ) {
            Ok(query) => query,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let logs = match self.backend.logs(&query.context).await {
            Ok(logs) => logs,
            Err(e) => {
                return aws_failure(
                    &format!("Error fetching logs for service '{}'", service_name),
                    &e,
                    "CloudWatch Logs",
                    "FilterLogEvents",
                )
            }
        };

        let entries = LogAggregator::new(logs.as_ref()).fetch(&query).await;
        info!(
            "Retrieved {} log entries for service {}",
            entries.len(),
            service_name
        );
        ToolResult::text(format_log_entries(&service_name, &query, &entries))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::credentials::CrossAccountContext;
    use chrono::{DateTime, Utc};

    fn query() -> LogQuery {
        LogQuery::new(
            LogTarget::Service("lambda".into()),
            2,
            10,
            CrossAccountContext::Ambient,
        )
        .unwrap()
    }

    #[test]
    fn test_format_no_entries() {
        assert_eq!(
            format_log_entries("lambda", &query(), &[]),
            "No logs found for service 'lambda' in the last 2 hour(s) in current account."
        );
    }

    #[test]
    fn test_format_entries_truncates_long_messages() {
        let entries = vec![AggregatedLogEntry {
            timestamp: DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap(),
            log_group: "/aws/lambda/orders".into(),
            message: "x".repeat(250),
        }];
        let text = format_log_entries("lambda", &query(), &entries);
        assert!(text.starts_with("Retrieved 1 log entries for service 'lambda' from current account:"));
        assert!(text.contains("[2023-11-14T22:13:20.000Z] /aws/lambda/orders"));
        assert!(text.contains(&format!("  {}...", "x".repeat(200))));
        assert!(!text.contains(&"x".repeat(201)));
    }
}
