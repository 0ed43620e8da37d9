//! List CloudWatch dashboards in the current or a target account

use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::{aws_failure, MonitoringTool, ToolArgs, ToolResult, ToolSchema};
use crate::app::credentials::CrossAccountContext;
use crate::app::data_plane::{DashboardEntry, MonitoringBackend};

pub struct ListCloudWatchDashboardsTool {
    backend: Arc<dyn MonitoringBackend>,
}

impl ListCloudWatchDashboardsTool {
    pub fn new(backend: Arc<dyn MonitoringBackend>) -> Self {
        Self { backend }
    }
}

pub fn format_dashboards(ctx: &CrossAccountContext, dashboards: &[DashboardEntry]) -> String {
    let account = ctx.describe();
    if dashboards.is_empty() {
        return format!("No CloudWatch dashboards found in {}.", account);
    }

    let mut lines = vec![format!(
        "Found {} CloudWatch dashboard(s) in {}:\n",
        dashboards.len(),
        account
    )];
    lines.extend(dashboards.iter().map(|d| format!("  - {}", d.name)));
    lines.join("\n")
}

#[async_trait]
impl MonitoringTool for ListCloudWatchDashboardsTool {
    fn name(&self) -> &'static str {
        "list_cloudwatch_dashboards"
    }

    fn description(&self) -> &'static str {
        "List all CloudWatch dashboards in an AWS account. Use this tool to discover available \
         CloudWatch dashboards for monitoring. Supports cross-account access when account_id \
         and role_name are provided."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(ToolSchema::cross_account_args())
    }

    async fn execute(&self, args: ToolArgs) -> ToolResult {
        let ctx = match args.cross_account_context() {
            Ok(ctx) => ctx,
            Err(result) => return result,
        };

        let dashboards = match self.backend.cloudwatch(&ctx).await {
            Ok(cloudwatch) => cloudwatch.list_dashboards().await,
            Err(e) => Err(e),
        };

        match dashboards {
            Ok(dashboards) => {
                info!(
                    "Listed {} dashboards from {}",
                    dashboards.len(),
                    ctx.describe()
                );
                ToolResult::text(format_dashboards(&ctx, &dashboards))
            }
            Err(e) => aws_failure(
                "Error listing CloudWatch dashboards",
                &e,
                "CloudWatch",
                "ListDashboards",
            ),
        }
    }
}
