//! CloudWatch dashboards and metric alarms

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_cloudwatch as cloudwatch;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::app::sdk_errors::sdk_error_message;

/// Dashboard listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardEntry {
    pub name: String,
    /// Size of the dashboard body in bytes
    pub size: Option<i64>,
}

/// Dashboard definition returned by `GetDashboard`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardDetail {
    pub name: String,
    pub arn: Option<String>,
    /// Raw dashboard body (JSON text)
    pub body: Option<String>,
}

/// Metric alarm as far as the health summary needs it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricAlarm {
    pub name: String,
    pub namespace: Option<String>,
    /// `OK`, `ALARM` or `INSUFFICIENT_DATA`
    pub state: String,
    pub reason: Option<String>,
}

/// CloudWatch operations used by the monitoring tools
#[async_trait]
pub trait CloudWatchApi: Send + Sync {
    /// All dashboards, following pagination
    async fn list_dashboards(&self) -> Result<Vec<DashboardEntry>>;

    async fn get_dashboard(&self, dashboard_name: &str) -> Result<DashboardDetail>;

    /// All metric alarms, following pagination
    async fn describe_alarms(&self) -> Result<Vec<MetricAlarm>>;
}

/// CloudWatch client wrapper
#[derive(Clone, Debug)]
pub struct CloudWatchClient {
    client: cloudwatch::Client,
}

impl CloudWatchClient {
    pub fn new(client: cloudwatch::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CloudWatchApi for CloudWatchClient {
    async fn list_dashboards(&self) -> Result<Vec<DashboardEntry>> {
        let mut dashboards = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_dashboards()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| anyhow!(sdk_error_message(&e)))
                .context("Failed to list CloudWatch dashboards")?;

            dashboards.extend(response.dashboard_entries().iter().filter_map(|entry| {
                entry.dashboard_name().map(|name| DashboardEntry {
                    name: name.to_string(),
                    size: entry.size(),
                })
            }));

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!("ListDashboards returned {} dashboards", dashboards.len());
        Ok(dashboards)
    }

    async fn get_dashboard(&self, dashboard_name: &str) -> Result<DashboardDetail> {
        let response = self
            .client
            .get_dashboard()
            .dashboard_name(dashboard_name)
            .send()
            .await
            .map_err(|e| anyhow!(sdk_error_message(&e)))
            .with_context(|| format!("Failed to get dashboard {}", dashboard_name))?;

        Ok(DashboardDetail {
            name: response
                .dashboard_name()
                .unwrap_or(dashboard_name)
                .to_string(),
            arn: response.dashboard_arn().map(str::to_string),
            body: response.dashboard_body().map(str::to_string),
        })
    }

    async fn describe_alarms(&self) -> Result<Vec<MetricAlarm>> {
        let mut alarms = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .describe_alarms()
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(|e| anyhow!(sdk_error_message(&e)))
                .context("Failed to describe CloudWatch alarms")?;

            alarms.extend(response.metric_alarms().iter().map(|alarm| MetricAlarm {
                name: alarm.alarm_name().unwrap_or_default().to_string(),
                namespace: alarm.namespace().map(str::to_string),
                state: alarm
                    .state_value()
                    .map(|state| state.as_str().to_string())
                    .unwrap_or_default(),
                reason: alarm.state_reason().map(str::to_string),
            }));

            match response.next_token() {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!("DescribeAlarms returned {} metric alarms", alarms.len());
        Ok(alarms)
    }
}
