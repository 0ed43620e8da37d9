//! Analyze a log group for errors and warnings

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use super::{aws_failure, ArgSpec, MonitoringTool, ToolArgs, ToolResult, ToolSchema};
use crate::app::data_plane::cloudwatch_logs::{GroupRead, LogQuery, LogTarget};
use crate::app::data_plane::{LogAggregator, MonitoringBackend};
use crate::app::health::{LogClassification, Verdict};
use crate::app::sdk_errors::categorize_error;

pub struct AnalyzeLogGroupTool {
    backend: Arc<dyn MonitoringBackend>,
    /// Most events read per analysis
    event_cap: usize,
}

impl AnalyzeLogGroupTool {
    pub fn new(backend: Arc<dyn MonitoringBackend>, event_cap: usize) -> Self {
        Self { backend, event_cap }
    }
}

pub fn format_analysis(log_group_name: &str, query: &LogQuery, classification: &LogClassification) -> String {
    let account = query.context.describe();
    if classification.total_events == 0 {
        return format!(
            "No log events found in '{}' for the last {} hour(s) in {}.",
            log_group_name, query.hours, account
        );
    }

    let verdict_line = match classification.verdict {
        Verdict::Critical => "\n[!]  High error rate detected! Investigate immediately.",
        Verdict::Elevated => "\n[!]  Elevated warning count. Review may be needed.",
        Verdict::Healthy => "\nLog group appears healthy.",
    };

    [
        format!("Log Group Analysis: {}", log_group_name),
        format!("Account: {}", account),
        format!("Time Range: Last {} hour(s)", query.hours),
        "\nSummary:".to_string(),
        format!("  Total Events: {}", classification.total_events),
        format!(
            "  Errors: {} ({:.1}%)",
            classification.error_count,
            classification.error_rate()
        ),
        format!(
            "  Warnings: {} ({:.1}%)",
            classification.warning_count,
            classification.warning_rate()
        ),
        format!("  Verdict: {}", classification.verdict),
        verdict_line.to_string(),
    ]
    .join("\n")
}

#[async_trait]
impl MonitoringTool for AnalyzeLogGroupTool {
    fn name(&self) -> &'static str {
        "analyze_log_group"
    }

    fn description(&self) -> &'static str {
        "Analyze a specific CloudWatch log group for errors and patterns. Use this tool to get \
         insights into error rates, warning counts and an overall health verdict for a log group."
    }

    fn schema(&self) -> ToolSchema {
        let mut args = vec![
            ArgSpec::required_string(
                "log_group_name",
                "Name of the CloudWatch log group to analyze",
            ),
            ArgSpec::optional_integer(
                "hours",
                "Number of hours of logs to analyze (default: 1)",
                1,
            ),
        ];
        args.extend(ToolSchema::cross_account_args());
        ToolSchema::new(args)
    }

    async fn execute(&self, args: ToolArgs) -> ToolResult {
        let log_group_name = args.str("log_group_name").unwrap_or_default().to_string();
        let ctx = match args.cross_account_context() {
            Ok(ctx) => ctx,
            Err(result) => return result,
        };
        let query = match LogQuery::new(
            LogTarget::LogGroup(log_group_name.clone()),
            args.int("hours").unwrap_or(1),
            self.event_cap as i64,
            ctx,
        ) {
            Ok(query) => query,
            Err(e) => return ToolResult::error(e.to_string()),
        };

        let read = match self.backend.logs(&query.context).await {
            Ok(logs) => {
                LogAggregator::new(logs.as_ref())
                    .read_group(
                        &log_group_name,
                        query.start_time_millis(Utc::now()),
                        query.max_events,
                    )
                    .await
            }
            Err(e) => GroupRead {
                events: Vec::new(),
                error: Some(e),
            },
        };

        let summary = format!("Error analyzing log group '{}'", log_group_name);
        match (&read.error, read.events.is_empty()) {
            (Some(e), true) => aws_failure(&summary, e, "CloudWatch Logs", "FilterLogEvents"),
            (error, _) => {
                let classification = LogClassification::from_messages(
                    read.events.iter().map(|e| e.message.as_str()),
                );
                info!(
                    "Analyzed log group {}: {} events, {} errors",
                    log_group_name, classification.total_events, classification.error_count
                );
                let mut text = format_analysis(&log_group_name, &query, &classification);
                if let Some(e) = error {
                    let category = categorize_error(e, "CloudWatch Logs", "FilterLogEvents");
                    warn!("{} after {} events: {:#}", summary, read.events.len(), e);
                    text.push_str(&partial_note(read.events.len(), category.short_label()));
                }
                ToolResult::text(text)
            }
        }
    }
}

/// Trailer for an analysis built from a read that stopped early
fn partial_note(events_read: usize, reason: &str) -> String {
    format!(
        "\n\nNote: partial results. Reading stopped after {} events ({}).",
        events_read, reason
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::credentials::CrossAccountContext;

    fn query(hours: i64) -> LogQuery {
        LogQuery::new(
            LogTarget::LogGroup("/aws/lambda/orders".into()),
            hours,
            1000,
            CrossAccountContext::Ambient,
        )
        .unwrap()
    }

    #[test]
    fn test_format_empty_window() {
        let classification = LogClassification::from_messages(std::iter::empty());
        assert_eq!(
            format_analysis("/aws/lambda/orders", &query(3), &classification),
            "No log events found in '/aws/lambda/orders' for the last 3 hour(s) in current account."
        );
    }

    #[test]
    fn test_format_healthy_window() {
        let messages = ["START", "END", "REPORT Duration: 3 ms"];
        let classification = LogClassification::from_messages(messages.iter().copied());
        insta::assert_snapshot!(format_analysis("/aws/lambda/orders", &query(1), &classification), @r###"
        Log Group Analysis: /aws/lambda/orders
        Account: current account
        Time Range: Last 1 hour(s)

        Summary:
          Total Events: 3
          Errors: 0 (0.0%)
          Warnings: 0 (0.0%)
          Verdict: healthy

        Log group appears healthy.
        "###);
    }
}
