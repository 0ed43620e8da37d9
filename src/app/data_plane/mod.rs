//! Data Plane Services Module
//!
//! Read-only access to the AWS observability APIs the monitoring tools use.
//!
//! ## Available Services
//!
//! - **CloudWatch Logs**: log group discovery and capped event aggregation
//! - **CloudWatch**: dashboards and metric alarms
//! - **STS**: caller identity, used to verify cross-account access
//!
//! ## Architecture
//!
//! ```text
//! MonitoringTool
//!    └─ MonitoringBackend::{logs, cloudwatch, identity}(ctx)
//!         └─ CredentialBroker::client_for(ctx)  (ambient or assumed role)
//!              └─ LogsApi / CloudWatchApi / IdentityApi  (AWS SDK wrappers)
//! ```
//!
//! Each API is a small trait so the tools and the aggregator can be exercised against an
//! in-memory backend.

pub mod backend;
pub mod cloudwatch;
pub mod cloudwatch_logs;
pub mod sts;

pub use backend::{AwsBackend, MonitoringBackend};
pub use cloudwatch::{CloudWatchApi, CloudWatchClient, DashboardDetail, DashboardEntry, MetricAlarm};
pub use cloudwatch_logs::{LogAggregator, LogsApi};
pub use sts::{CallerIdentity, IdentityApi, StsIdentityClient};
