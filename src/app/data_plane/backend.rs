//! Monitoring backend: per-context access to the data plane APIs
//!
//! Tools never build AWS clients themselves. They ask a [`MonitoringBackend`] for the API
//! they need under a [`CrossAccountContext`]; the AWS implementation routes that through the
//! credential broker, and tests substitute an in-memory backend.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::app::credentials::{CredentialBroker, CrossAccountContext};

use super::cloudwatch::{CloudWatchApi, CloudWatchClient};
use super::cloudwatch_logs::{CloudWatchLogsClient, LogsApi};
use super::sts::{IdentityApi, StsIdentityClient};

#[async_trait]
pub trait MonitoringBackend: Send + Sync {
    async fn logs(&self, ctx: &CrossAccountContext) -> Result<Arc<dyn LogsApi>>;

    async fn cloudwatch(&self, ctx: &CrossAccountContext) -> Result<Arc<dyn CloudWatchApi>>;

    async fn identity(&self, ctx: &CrossAccountContext) -> Result<Arc<dyn IdentityApi>>;
}

/// Backend that issues a fresh AWS client per call
#[derive(Debug)]
pub struct AwsBackend {
    broker: Arc<CredentialBroker>,
}

impl AwsBackend {
    pub fn new(broker: Arc<CredentialBroker>) -> Self {
        Self { broker }
    }
}

#[async_trait]
impl MonitoringBackend for AwsBackend {
    async fn logs(&self, ctx: &CrossAccountContext) -> Result<Arc<dyn LogsApi>> {
        let client = self.broker.client_for(ctx, None).await?;
        Ok(Arc::new(CloudWatchLogsClient::new(client)))
    }

    async fn cloudwatch(&self, ctx: &CrossAccountContext) -> Result<Arc<dyn CloudWatchApi>> {
        let client = self.broker.client_for(ctx, None).await?;
        Ok(Arc::new(CloudWatchClient::new(client)))
    }

    async fn identity(&self, ctx: &CrossAccountContext) -> Result<Arc<dyn IdentityApi>> {
        let client = self.broker.client_for(ctx, None).await?;
        Ok(Arc::new(StsIdentityClient::new(client)))
    }
}
