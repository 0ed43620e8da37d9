//! Credential broker: AWS clients for the caller's own account or an assumed role
//!
//! Every client is built from one base configuration that carries the transport policy
//! (connect/read timeouts and adaptive retry with bounded attempts). Cross-account clients
//! swap in temporary credentials from `sts:AssumeRole` and never fall back to the caller's
//! identity when assumption fails.

#![warn(clippy::all, rust_2018_idioms)]

use anyhow::{anyhow, Context, Result};
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;
use aws_types::region::Region;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::SystemTime;
use tokio::sync::RwLock;
use tracing::debug;

use crate::app::config::AwsSettings;
use crate::app::sdk_errors::sdk_error_message;
use crate::app::usage_errors::UsageError;

/// Session name used for every role assumption
pub const ROLE_SESSION_NAME: &str = "MonitoringAgentSession";

/// Region used when nothing else resolves one
pub const FALLBACK_REGION: &str = "us-east-1";

/// Target of a tool call: the ambient identity or a role in another account
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum CrossAccountContext {
    #[default]
    Ambient,
    AssumeRole {
        account_id: String,
        role_name: String,
    },
}

impl CrossAccountContext {
    /// Build a context from optional tool arguments
    ///
    /// Blank strings count as absent. Supplying exactly one of the pair is a usage error.
    pub fn from_parts(
        account_id: Option<&str>,
        role_name: Option<&str>,
    ) -> Result<Self, UsageError> {
        let account_id = account_id.map(str::trim).filter(|s| !s.is_empty());
        let role_name = role_name.map(str::trim).filter(|s| !s.is_empty());

        match (account_id, role_name) {
            (Some(account_id), Some(role_name)) => Ok(Self::assume_role(account_id, role_name)),
            (None, None) => Ok(Self::Ambient),
            (Some(_), None) => Err(UsageError::PartialCrossAccount {
                missing: "role_name",
            }),
            (None, Some(_)) => Err(UsageError::PartialCrossAccount {
                missing: "account_id",
            }),
        }
    }

    pub fn assume_role(account_id: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self::AssumeRole {
            account_id: account_id.into(),
            role_name: role_name.into(),
        }
    }

    pub fn account_id(&self) -> Option<&str> {
        match self {
            Self::Ambient => None,
            Self::AssumeRole { account_id, .. } => Some(account_id),
        }
    }

    /// IAM role ARN to assume, if any
    pub fn role_arn(&self) -> Option<String> {
        match self {
            Self::Ambient => None,
            Self::AssumeRole {
                account_id,
                role_name,
            } => Some(format!("arn:aws:iam::{}:role/{}", account_id, role_name)),
        }
    }

    /// Human-readable account label used in tool output ("account 123..." / "current account")
    pub fn describe(&self) -> String {
        match self.account_id() {
            Some(account_id) => format!("account {}", account_id),
            None => "current account".to_string(),
        }
    }
}

/// Region-related environment variables, captured so resolution stays a pure function
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionEnvironment {
    pub aws_region: Option<String>,
    pub aws_default_region: Option<String>,
}

impl RegionEnvironment {
    pub fn from_process() -> Self {
        Self {
            aws_region: std::env::var("AWS_REGION").ok(),
            aws_default_region: std::env::var("AWS_DEFAULT_REGION").ok(),
        }
    }
}

/// Resolve the region for a client
///
/// Order: explicit value, `AWS_REGION`, `AWS_DEFAULT_REGION`, the ambient session region,
/// then [`FALLBACK_REGION`]. Blank values are skipped.
pub fn resolve_region(
    explicit: Option<&str>,
    environment: &RegionEnvironment,
    ambient: Option<&str>,
) -> String {
    [
        explicit,
        environment.aws_region.as_deref(),
        environment.aws_default_region.as_deref(),
        ambient,
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|region| !region.is_empty())
    .unwrap_or(FALLBACK_REGION)
    .to_string()
}

/// Temporary credentials from a single role assumption
#[derive(Debug, Clone)]
pub struct AssumedSession {
    pub account_id: String,
    pub role_name: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: DateTime<Utc>,
}

impl AssumedSession {
    /// Check if credentials are expired or will expire within the next 5 minutes
    pub fn is_expired(&self) -> bool {
        let buffer = chrono::Duration::minutes(5);
        Utc::now() + buffer >= self.expiration
    }

    pub fn to_aws_credentials(&self) -> Credentials {
        Credentials::new(
            &self.access_key_id,
            &self.secret_access_key,
            Some(self.session_token.clone()),
            Some(SystemTime::from(self.expiration)),
            "MonitoringAgentAssumeRole",
        )
    }
}

/// An AWS SDK client the broker knows how to build
pub trait ServiceClient: Sized {
    /// Service name used in log lines
    const SERVICE: &'static str;

    fn from_sdk_config(config: &SdkConfig) -> Self;
}

impl ServiceClient for aws_sdk_cloudwatch::Client {
    const SERVICE: &'static str = "cloudwatch";

    fn from_sdk_config(config: &SdkConfig) -> Self {
        Self::new(config)
    }
}

impl ServiceClient for aws_sdk_cloudwatchlogs::Client {
    const SERVICE: &'static str = "logs";

    fn from_sdk_config(config: &SdkConfig) -> Self {
        Self::new(config)
    }
}

impl ServiceClient for aws_sdk_sts::Client {
    const SERVICE: &'static str = "sts";

    fn from_sdk_config(config: &SdkConfig) -> Self {
        Self::new(config)
    }
}

impl ServiceClient for aws_sdk_bedrockruntime::Client {
    const SERVICE: &'static str = "bedrock-runtime";

    fn from_sdk_config(config: &SdkConfig) -> Self {
        Self::new(config)
    }
}

/// Issues AWS clients for a [`CrossAccountContext`]
#[derive(Debug)]
pub struct CredentialBroker {
    /// Ambient configuration with the transport policy applied
    base: SdkConfig,
    explicit_region: Option<String>,
    environment: RegionEnvironment,
    /// Present only when `aws.credential_cache` is enabled
    session_cache: Option<RwLock<HashMap<(String, String), AssumedSession>>>,
}

impl CredentialBroker {
    /// Load the ambient AWS configuration and apply timeouts and retry policy
    pub async fn from_environment(settings: &AwsSettings) -> Self {
        let retry = RetryConfig::adaptive().with_max_attempts(settings.max_attempts);
        let timeouts = TimeoutConfig::builder()
            .connect_timeout(settings.connect_timeout())
            .read_timeout(settings.read_timeout())
            .build();

        let base = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(retry)
            .timeout_config(timeouts)
            .load()
            .await;

        Self::with_base_config(base, settings, RegionEnvironment::from_process())
    }

    pub fn with_base_config(
        base: SdkConfig,
        settings: &AwsSettings,
        environment: RegionEnvironment,
    ) -> Self {
        debug!(
            "Credential broker ready: ambient region {:?}, credential cache {}",
            base.region().map(|r| r.as_ref()),
            if settings.credential_cache { "enabled" } else { "disabled" }
        );
        Self {
            base,
            explicit_region: settings.region.clone(),
            environment,
            session_cache: settings.credential_cache.then(|| RwLock::new(HashMap::new())),
        }
    }

    /// Region a client built now would use, given an optional per-call override
    pub fn region_for(&self, explicit: Option<&str>) -> String {
        resolve_region(
            explicit.or(self.explicit_region.as_deref()),
            &self.environment,
            self.base.region().map(|r| r.as_ref()),
        )
    }

    /// Base configuration with the resolved region, for clients that never leave the
    /// caller's account (the reasoning policy, for one)
    pub fn ambient_config(&self, region: Option<&str>) -> SdkConfig {
        self.base
            .to_builder()
            .region(Region::new(self.region_for(region)))
            .build()
    }

    /// Build a client for `ctx`
    ///
    /// Role assumption failures are logged with account, role and service, then returned.
    pub async fn client_for<C: ServiceClient>(
        &self,
        ctx: &CrossAccountContext,
        region: Option<&str>,
    ) -> Result<C> {
        let region = self.region_for(region);

        let config = match ctx {
            CrossAccountContext::Ambient => {
                debug!("Creating {} client for current account in {}", C::SERVICE, region);
                self.base.to_builder().region(Region::new(region)).build()
            }
            CrossAccountContext::AssumeRole {
                account_id,
                role_name,
            } => {
                let session = self
                    .session_for(account_id, role_name, &region)
                    .await
                    .map_err(|e| {
                        log_error!(
                            "Failed to assume role {} in account {} for {} client: {:#}",
                            role_name,
                            account_id,
                            C::SERVICE,
                            e
                        );
                        e
                    })?;
                self.base
                    .to_builder()
                    .region(Region::new(region))
                    .credentials_provider(SharedCredentialsProvider::new(
                        session.to_aws_credentials(),
                    ))
                    .build()
            }
        };

        Ok(C::from_sdk_config(&config))
    }

    async fn session_for(
        &self,
        account_id: &str,
        role_name: &str,
        region: &str,
    ) -> Result<AssumedSession> {
        let key = (account_id.to_string(), role_name.to_string());

        if let Some(cache) = &self.session_cache {
            if let Some(session) = cache.read().await.get(&key) {
                if !session.is_expired() {
                    log_debug!("Using cached session for {} in account {}", role_name, account_id);
                    return Ok(session.clone());
                }
                log_debug!(
                    "Cached session for {} in account {} is expiring, assuming again",
                    role_name, account_id
                );
            }
        }

        let session = self.assume_role(account_id, role_name, region).await?;

        if let Some(cache) = &self.session_cache {
            cache.write().await.insert(key, session.clone());
        }
        Ok(session)
    }

    async fn assume_role(
        &self,
        account_id: &str,
        role_name: &str,
        region: &str,
    ) -> Result<AssumedSession> {
        let role_arn = format!("arn:aws:iam::{}:role/{}", account_id, role_name);
        log_info!(
            "Setting up cross-account access for account {} with role {}",
            account_id, role_name
        );

        let sts_config = self
            .base
            .to_builder()
            .region(Region::new(region.to_string()))
            .build();
        let sts = aws_sdk_sts::Client::new(&sts_config);

        let response = sts
            .assume_role()
            .role_arn(&role_arn)
            .role_session_name(ROLE_SESSION_NAME)
            .send()
            .await
            .map_err(|e| anyhow!(sdk_error_message(&e)))
            .with_context(|| format!("AssumeRole failed for {}", role_arn))?;

        let credentials = response
            .credentials()
            .with_context(|| format!("AssumeRole for {} returned no credentials", role_arn))?;

        let expiration = DateTime::<Utc>::from_timestamp(credentials.expiration().secs(), 0)
            .with_context(|| format!("AssumeRole for {} returned an invalid expiration", role_arn))?;

        Ok(AssumedSession {
            account_id: account_id.to_string(),
            role_name: role_name.to_string(),
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(region: Option<&str>, default_region: Option<&str>) -> RegionEnvironment {
        RegionEnvironment {
            aws_region: region.map(String::from),
            aws_default_region: default_region.map(String::from),
        }
    }

    #[test]
    fn test_context_both_parts_assumes_role() {
        let ctx = CrossAccountContext::from_parts(Some("123456789012"), Some("MonitoringRole"))
            .unwrap();
        assert_eq!(ctx.account_id(), Some("123456789012"));
        assert_eq!(
            ctx.role_arn().as_deref(),
            Some("arn:aws:iam::123456789012:role/MonitoringRole")
        );
        assert_eq!(ctx.describe(), "account 123456789012");
    }

    #[test]
    fn test_context_neither_part_is_ambient() {
        let ctx = CrossAccountContext::from_parts(None, None).unwrap();
        assert_eq!(ctx, CrossAccountContext::Ambient);
        assert_eq!(ctx.describe(), "current account");
        assert!(ctx.role_arn().is_none());
    }

    #[test]
    fn test_context_single_part_is_usage_error() {
        assert_eq!(
            CrossAccountContext::from_parts(Some("123456789012"), None),
            Err(UsageError::PartialCrossAccount {
                missing: "role_name"
            })
        );
        assert_eq!(
            CrossAccountContext::from_parts(None, Some("MonitoringRole")),
            Err(UsageError::PartialCrossAccount {
                missing: "account_id"
            })
        );
    }

    #[test]
    fn test_context_blank_strings_count_as_absent() {
        assert_eq!(
            CrossAccountContext::from_parts(Some("  "), Some("")).unwrap(),
            CrossAccountContext::Ambient
        );
        assert!(CrossAccountContext::from_parts(Some("123456789012"), Some(" ")).is_err());
    }

    #[test]
    fn test_region_explicit_wins() {
        let region = resolve_region(
            Some("eu-west-1"),
            &env(Some("us-west-2"), Some("ap-south-1")),
            Some("ca-central-1"),
        );
        assert_eq!(region, "eu-west-1");
    }

    #[test]
    fn test_region_environment_order() {
        assert_eq!(
            resolve_region(None, &env(Some("us-west-2"), Some("ap-south-1")), None),
            "us-west-2"
        );
        assert_eq!(
            resolve_region(None, &env(None, Some("ap-south-1")), Some("ca-central-1")),
            "ap-south-1"
        );
    }

    #[test]
    fn test_region_ambient_then_fallback() {
        assert_eq!(
            resolve_region(None, &env(None, None), Some("ca-central-1")),
            "ca-central-1"
        );
        assert_eq!(resolve_region(None, &env(None, None), None), FALLBACK_REGION);
        assert_eq!(
            resolve_region(Some(""), &env(Some(" "), None), None),
            FALLBACK_REGION
        );
    }

    fn session_expiring_at(expiration: DateTime<Utc>) -> AssumedSession {
        AssumedSession {
            account_id: "123456789012".to_string(),
            role_name: "MonitoringRole".to_string(),
            access_key_id: "AKIATEST".to_string(),
            secret_access_key: "secret".to_string(),
            session_token: "token".to_string(),
            expiration,
        }
    }

    #[test]
    fn test_assumed_session_expiration_buffer() {
        let valid = session_expiring_at(Utc::now() + chrono::Duration::hours(1));
        let soon = session_expiring_at(Utc::now() + chrono::Duration::minutes(2));
        let past = session_expiring_at(Utc::now() - chrono::Duration::minutes(1));

        assert!(!valid.is_expired());
        assert!(soon.is_expired());
        assert!(past.is_expired());
    }

    #[test]
    fn test_assumed_session_credentials() {
        let session = session_expiring_at(Utc::now() + chrono::Duration::hours(1));
        let creds = session.to_aws_credentials();
        assert_eq!(creds.access_key_id(), "AKIATEST");
        assert_eq!(creds.session_token(), Some("token"));
        assert!(creds.expiry().is_some());
    }

    #[tokio::test]
    async fn test_broker_region_and_cache_settings() {
        let base = SdkConfig::builder()
            .region(Region::new("eu-central-1"))
            .behavior_version(BehaviorVersion::latest())
            .build();
        let settings = AwsSettings {
            credential_cache: true,
            ..AwsSettings::default()
        };
        let broker = CredentialBroker::with_base_config(base, &settings, RegionEnvironment::default());

        assert_eq!(broker.region_for(None), "eu-central-1");
        assert_eq!(broker.region_for(Some("us-west-2")), "us-west-2");
        assert!(broker.session_cache.is_some());
    }
}
