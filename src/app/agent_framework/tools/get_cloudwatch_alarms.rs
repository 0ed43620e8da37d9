//! CloudWatch alarms related to a service

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{aws_failure, ArgSpec, MonitoringTool, ToolArgs, ToolResult, ToolSchema};
use crate::app::credentials::CrossAccountContext;
use crate::app::data_plane::MonitoringBackend;
use crate::app::health::{summarize_alarms, AlarmSummary};

pub struct GetCloudWatchAlarmsTool {
    backend: Arc<dyn MonitoringBackend>,
}

impl GetCloudWatchAlarmsTool {
    pub fn new(backend: Arc<dyn MonitoringBackend>) -> Self {
        Self { backend }
    }
}

pub fn format_alarm_summary(ctx: &CrossAccountContext, summary: &AlarmSummary) -> String {
    let account = ctx.describe();
    if summary.total() == 0 {
        return format!(
            "No CloudWatch alarms found for service '{}' in {}.",
            summary.service_name, account
        );
    }

    let mut lines = vec![
        format!(
            "CloudWatch Alarms for '{}' in {}:",
            summary.service_name, account
        ),
        "\nSummary:".to_string(),
        format!("  Total Alarms: {}", summary.total()),
        format!("  OK: {}", summary.ok),
        format!("  ALARM: {}", summary.alarm),
        format!("  INSUFFICIENT_DATA: {}", summary.insufficient_data),
    ];
    if summary.other > 0 {
        lines.push(format!("  Other: {}", summary.other));
    }
    lines.push(format!("  Verdict: {}", summary.verdict()));
    lines.push("\nAlarm Details:".to_string());

    for alarm in &summary.alarms {
        let marker = match alarm.state.as_str() {
            "OK" => "[OK]",
            "ALARM" => "[!]",
            _ => "[?]",
        };
        lines.push(format!("  {} {}: {}", marker, alarm.name, alarm.state));
        if alarm.state == "ALARM" {
            lines.push(format!(
                "      Reason: {}",
                alarm.reason.as_deref().unwrap_or("N/A")
            ));
        }
    }

    lines.join("\n")
}

#[async_trait]
impl MonitoringTool for GetCloudWatchAlarmsTool {
    fn name(&self) -> &'static str {
        "get_cloudwatch_alarms_for_service"
    }

    fn description(&self) -> &'static str {
        "Get CloudWatch alarms related to a specific AWS service. An alarm matches when its name \
         or namespace contains the service name. Use this tool to check alarm status and \
         identify issues with AWS services."
    }

    fn schema(&self) -> ToolSchema {
        let mut args = vec![ArgSpec::required_string(
            "service_name",
            "AWS service name (e.g., 'lambda', 'ec2', 'bedrock')",
        )];
        args.extend(ToolSchema::cross_account_args());
        ToolSchema::new(args)
    }

    async fn execute(&self, args: ToolArgs) -> ToolResult {
        let service_name = args.str("service_name").unwrap_or_default().to_string();
        let ctx = match args.cross_account_context() {
            Ok(ctx) => ctx,
            Err(result) => return result,
        };

        let alarms = match self.backend.cloudwatch(&ctx).await {
            Ok(cloudwatch) => cloudwatch.describe_alarms().await,
            Err(e) => Err(e),
        };

        match alarms {
            Ok(alarms) => {
                let summary = summarize_alarms(&service_name, &alarms);
                info!(
                    "Found {} alarms for service {} ({} in ALARM state)",
                    summary.total(),
                    service_name,
                    summary.alarm
                );
                ToolResult::text(format_alarm_summary(&ctx, &summary))
            }
            Err(e) => aws_failure(
                &format!(
                    "Error getting CloudWatch alarms for service '{}'",
                    service_name
                ),
                &e,
                "CloudWatch",
                "DescribeAlarms",
            ),
        }
    }
}
