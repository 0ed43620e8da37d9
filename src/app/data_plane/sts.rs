//! STS caller identity

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use aws_sdk_sts as sts;
use serde::{Deserialize, Serialize};

use crate::app::sdk_errors::sdk_error_message;

/// Result of `GetCallerIdentity`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
    pub user_id: Option<String>,
}

#[async_trait]
pub trait IdentityApi: Send + Sync {
    async fn get_caller_identity(&self) -> Result<CallerIdentity>;
}

#[derive(Clone, Debug)]
pub struct StsIdentityClient {
    client: sts::Client,
}

impl StsIdentityClient {
    pub fn new(client: sts::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl IdentityApi for StsIdentityClient {
    async fn get_caller_identity(&self) -> Result<CallerIdentity> {
        let response = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| anyhow!(sdk_error_message(&e)))
            .context("GetCallerIdentity failed")?;

        Ok(CallerIdentity {
            account: response
                .account()
                .context("GetCallerIdentity returned no account")?
                .to_string(),
            arn: response
                .arn()
                .context("GetCallerIdentity returned no ARN")?
                .to_string(),
            user_id: response.user_id().map(str::to_string),
        })
    }
}
