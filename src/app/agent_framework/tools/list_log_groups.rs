//! List CloudWatch log groups

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{aws_failure, ArgSpec, MonitoringTool, ToolArgs, ToolResult, ToolSchema};
use crate::app::credentials::CrossAccountContext;
use crate::app::data_plane::{LogAggregator, MonitoringBackend};
use crate::app::usage_errors::UsageError;

pub struct ListLogGroupsTool {
    backend: Arc<dyn MonitoringBackend>,
}

impl ListLogGroupsTool {
    pub fn new(backend: Arc<dyn MonitoringBackend>) -> Self {
        Self { backend }
    }
}

pub fn format_log_groups(ctx: &CrossAccountContext, log_groups: &[String]) -> String {
    let account = ctx.describe();
    if log_groups.is_empty() {
        return format!("No log groups found in {}.", account);
    }

    let mut lines = vec![format!(
        "Found {} log group(s) in {}:\n",
        log_groups.len(),
        account
    )];
    lines.extend(log_groups.iter().map(|name| format!("  - {}", name)));
    lines.join("\n")
}

#[async_trait]
impl MonitoringTool for ListLogGroupsTool {
    fn name(&self) -> &'static str {
        "list_log_groups"
    }

    fn description(&self) -> &'static str {
        "List CloudWatch log groups in an AWS account. Use this tool to discover available log \
         groups for analysis."
    }

    fn schema(&self) -> ToolSchema {
        let mut args = ToolSchema::cross_account_args();
        args.push(ArgSpec::optional_integer(
            "limit",
            "Maximum number of log groups to return (default: 50)",
            50,
        ));
        ToolSchema::new(args)
    }

    async fn execute(&self, args: ToolArgs) -> ToolResult {
        let ctx = match args.cross_account_context() {
            Ok(ctx) => ctx,
            Err(result) => return result,
        };
        let limit = args.int("limit").unwrap_or(50);
        let limit = match usize::try_from(limit).ok().filter(|n| *n > 0) {
            Some(limit) => limit,
            None => {
                return ToolResult::error(
                    UsageError::NonPositive {
                        field: "limit",
                        value: limit,
                    }
                    .to_string(),
                )
            }
        };

        let log_groups = match self.backend.logs(&ctx).await {
            Ok(logs) => LogAggregator::new(logs.as_ref()).list_groups(limit).await,
            Err(e) => Err(e),
        };

        match log_groups {
            Ok(log_groups) => {
                info!(
                    "Listed {} log groups from {}",
                    log_groups.len(),
                    ctx.describe()
                );
                ToolResult::text(format_log_groups(&ctx, &log_groups))
            }
            Err(e) => aws_failure(
                "Error listing log groups",
                &e,
                "CloudWatch Logs",
                "DescribeLogGroups",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_log_groups() {
        assert_eq!(
            format_log_groups(&CrossAccountContext::Ambient, &[]),
            "No log groups found in current account."
        );
        assert_eq!(
            format_log_groups(
                &CrossAccountContext::Ambient,
                &["/aws/lambda/orders".to_string()]
            ),
            "Found 1 log group(s) in current account:\n\n  - /aws/lambda/orders"
        );
    }
}
