//! Summarize one CloudWatch dashboard

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::{aws_failure, ArgSpec, MonitoringTool, ToolArgs, ToolResult, ToolSchema};
use crate::app::credentials::CrossAccountContext;
use crate::app::data_plane::{DashboardDetail, MonitoringBackend};

pub struct GetDashboardSummaryTool {
    backend: Arc<dyn MonitoringBackend>,
}

impl GetDashboardSummaryTool {
    pub fn new(backend: Arc<dyn MonitoringBackend>) -> Self {
        Self { backend }
    }
}

/// Widget titles from a dashboard body; `None` when the body is not a JSON dashboard
fn widget_titles(body: &str) -> Option<Vec<Option<String>>> {
    let body: Value = serde_json::from_str(body).ok()?;
    let widgets = body.get("widgets")?.as_array()?;
    Some(
        widgets
            .iter()
            .map(|widget| {
                widget
                    .pointer("/properties/title")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .collect(),
    )
}

pub fn format_dashboard_summary(ctx: &CrossAccountContext, dashboard: &DashboardDetail) -> String {
    let mut lines = vec![
        format!("Dashboard: {}", dashboard.name),
        format!("Account: {}", ctx.describe()),
        format!("ARN: {}", dashboard.arn.as_deref().unwrap_or("N/A")),
    ];

    if let Some(titles) = dashboard.body.as_deref().and_then(widget_titles) {
        lines.push(format!("Widgets: {}", titles.len()));
        lines.extend(titles.into_iter().map(|title| {
            format!("  - {}", title.unwrap_or_else(|| "(untitled)".to_string()))
        }));
    }

    lines.push("\nConfiguration retrieved successfully.".to_string());
    lines.join("\n")
}

#[async_trait]
impl MonitoringTool for GetDashboardSummaryTool {
    fn name(&self) -> &'static str {
        "get_dashboard_summary"
    }

    fn description(&self) -> &'static str {
        "Get detailed summary of a specific CloudWatch dashboard, including its ARN and widget \
         titles. Use this tool to retrieve configuration details for a specific dashboard."
    }

    fn schema(&self) -> ToolSchema {
        let mut args = vec![ArgSpec::required_string(
            "dashboard_name",
            "Name of the CloudWatch dashboard",
        )];
        args.extend(ToolSchema::cross_account_args());
        ToolSchema::new(args)
    }

    async fn execute(&self, args: ToolArgs) -> ToolResult {
        let dashboard_name = args.str("dashboard_name").unwrap_or_default().to_string();
        let ctx = match args.cross_account_context() {
            Ok(ctx) => ctx,
            Err(result) => return result,
        };

        let dashboard = match self.backend.cloudwatch(&ctx).await {
            Ok(cloudwatch) => cloudwatch.get_dashboard(&dashboard_name).await,
            Err(e) => Err(e),
        };

        match dashboard {
            Ok(dashboard) => {
                info!("Retrieved dashboard summary for {}", dashboard_name);
                ToolResult::text(format_dashboard_summary(&ctx, &dashboard))
            }
            Err(e) => aws_failure(
                &format!("Error getting dashboard summary for '{}'", dashboard_name),
                &e,
                "CloudWatch",
                "GetDashboard",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_with_widgets() {
        let dashboard = DashboardDetail {
            name: "orders".into(),
            arn: Some("arn:aws:cloudwatch::123456789012:dashboard/orders".into()),
            body: Some(
                r#"{"widgets":[{"type":"metric","properties":{"title":"Invocations"}},{"type":"text","properties":{"markdown":"hi"}}]}"#
                    .into(),
            ),
        };
        insta::assert_snapshot!(format_dashboard_summary(&CrossAccountContext::Ambient, &dashboard), @r###"
        Dashboard: orders
        Account: current account
        ARN: arn:aws:cloudwatch::123456789012:dashboard/orders
        Widgets: 2
          - Invocations
          - (untitled)

        Configuration retrieved successfully.
        "###);
    }

    #[test]
    fn test_summary_with_unparseable_body() {
        let dashboard = DashboardDetail {
            name: "legacy".into(),
            arn: None,
            body: Some("not json".into()),
        };
        let text = format_dashboard_summary(&CrossAccountContext::Ambient, &dashboard);
        assert!(text.contains("ARN: N/A"));
        assert!(!text.contains("Widgets:"));
    }
}
