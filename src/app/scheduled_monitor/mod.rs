//! Scheduled monitoring check
//!
//! One run acquires a bearer token, asks the hosted agent for a fixed health summary and posts
//! the answer to a Slack webhook. Any failure after configuration is read is reported to the
//! same webhook as an error block (best effort) and then returned to the caller.
//!
//! # Environment
//!
//! | Variable | Purpose |
//! |----------|---------|
//! | `AGENTCORE_RUNTIME_URL` | Agent invocation URL (required) |
//! | `SLACK_WEBHOOK_URL` | Incoming webhook (required) |
//! | `COGNITO_DOMAIN_URL` | Token endpoint domain |
//! | `M2M_CLIENT_ID`, `M2M_CLIENT_SECRET`, `RESOURCE_SERVER_ID` | Client-credentials grant (preferred) |
//! | `COGNITO_CLIENT_ID`, `COGNITO_USERNAME`, `COGNITO_PASSWORD` | Password grant (fallback) |

pub mod slack;
pub mod token;

pub use token::{TokenClient, TokenConfigFile, TokenError, TokenResponse};

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Prompt sent on every scheduled run
pub const MONITORING_PROMPT: &str = "Provide a summary of CloudWatch alarms, any critical issues, and resource health across AWS services. Focus on actionable insights.";

#[derive(Debug, Error)]
pub enum ScheduledCheckError {
    #[error("{0} not set")]
    MissingEnv(&'static str),

    #[error("No valid authentication credentials provided. Need either M2M credentials or username/password")]
    NoCredentials,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("AgentCore request failed: {status} - {body}")]
    AgentStatus { status: u16, body: String },

    #[error("HTTP request to {target} failed: {source}")]
    Http {
        target: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Slack error: {0}")]
    SlackStatus(u16),
}

/// How the scheduled run obtains its bearer token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenGrant {
    ClientCredentials {
        domain_url: String,
        client_id: String,
        client_secret: String,
        resource_server_id: Option<String>,
    },
    Password {
        domain_url: String,
        client_id: String,
        username: String,
        password: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledCheckConfig {
    pub agent_url: String,
    pub slack_webhook_url: String,
    pub grant: TokenGrant,
}

impl ScheduledCheckConfig {
    pub fn from_env() -> Result<Self, ScheduledCheckError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source; empty values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ScheduledCheckError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let agent_url =
            var("AGENTCORE_RUNTIME_URL").ok_or(ScheduledCheckError::MissingEnv("AGENTCORE_RUNTIME_URL"))?;
        let slack_webhook_url =
            var("SLACK_WEBHOOK_URL").ok_or(ScheduledCheckError::MissingEnv("SLACK_WEBHOOK_URL"))?;

        let domain_url = var("COGNITO_DOMAIN_URL");
        let grant = match (
            domain_url.clone(),
            var("M2M_CLIENT_ID"),
            var("M2M_CLIENT_SECRET"),
        ) {
            (Some(domain_url), Some(client_id), Some(client_secret)) => {
                TokenGrant::ClientCredentials {
                    domain_url,
                    client_id,
                    client_secret,
                    resource_server_id: var("RESOURCE_SERVER_ID"),
                }
            }
            _ => match (
                domain_url,
                var("COGNITO_CLIENT_ID"),
                var("COGNITO_USERNAME"),
                var("COGNITO_PASSWORD"),
            ) {
                (Some(domain_url), Some(client_id), Some(username), Some(password)) => {
                    TokenGrant::Password {
                        domain_url,
                        client_id,
                        username,
                        password,
                    }
                }
                _ => return Err(ScheduledCheckError::NoCredentials),
            },
        };

        Ok(Self {
            agent_url,
            slack_webhook_url,
            grant,
        })
    }
}

/// Thread id for a run, one per minute
pub fn session_id_for(now: DateTime<Utc>) -> String {
    format!("scheduled-{}", now.format("%Y%m%d-%H%M"))
}

/// Payload sent to the agent invocation endpoint
pub fn agent_payload(now: DateTime<Utc>) -> Value {
    json!({
        "prompt": MONITORING_PROMPT,
        "session_id": session_id_for(now),
    })
}

pub struct ScheduledMonitor {
    http: reqwest::Client,
    config: ScheduledCheckConfig,
}

impl ScheduledMonitor {
    pub fn new(config: ScheduledCheckConfig) -> Result<Self, ScheduledCheckError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|source| ScheduledCheckError::Http {
                target: "client",
                source,
            })?;
        Ok(Self { http, config })
    }

    /// Run one check; failures are also posted to Slack before being returned
    pub async fn run(&self, now: DateTime<Utc>) -> Result<(), ScheduledCheckError> {
        info!("Scheduled monitoring check started at {}", now);

        match self.check(now).await {
            Ok(()) => {
                info!("Monitoring check completed");
                Ok(())
            }
            Err(e) => {
                error!("Error in monitoring check: {}", e);
                let notice = slack::error_message(&e.to_string(), Utc::now());
                if let Err(post_error) = self.post_to_slack(&notice).await {
                    warn!("Failed to post error notification to Slack: {}", post_error);
                }
                Err(e)
            }
        }
    }

    async fn check(&self, now: DateTime<Utc>) -> Result<(), ScheduledCheckError> {
        info!("Retrieving bearer token...");
        let token = self.bearer_token().await?;

        info!("Invoking agent runtime...");
        let response = self
            .http
            .post(&self.config.agent_url)
            .bearer_auth(&token.access_token)
            .json(&agent_payload(now))
            .send()
            .await
            .map_err(|source| ScheduledCheckError::Http {
                target: "agent",
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ScheduledCheckError::Http {
                target: "agent",
                source,
            })?;
        if status != reqwest::StatusCode::OK {
            return Err(ScheduledCheckError::AgentStatus {
                status: status.as_u16(),
                body,
            });
        }
        info!("Agent response received: {} characters", body.chars().count());

        info!("Posting to Slack...");
        self.post_to_slack(&slack::report_message(&body, now)).await?;
        info!("Successfully posted to Slack");
        Ok(())
    }

    async fn bearer_token(&self) -> Result<TokenResponse, ScheduledCheckError> {
        let token = match &self.config.grant {
            TokenGrant::ClientCredentials {
                domain_url,
                client_id,
                client_secret,
                resource_server_id,
            } => {
                info!("Using client credentials authentication (M2M)");
                TokenClient::new(domain_url)?
                    .client_credentials(client_id, client_secret, resource_server_id.as_deref())
                    .await?
            }
            TokenGrant::Password {
                domain_url,
                client_id,
                username,
                password,
            } => {
                info!("Using username/password authentication (fallback)");
                TokenClient::new(domain_url)?
                    .password(client_id, username, password)
                    .await?
            }
        };
        Ok(token)
    }

    async fn post_to_slack(&self, message: &Value) -> Result<(), ScheduledCheckError> {
        let response = self
            .http
            .post(&self.config.slack_webhook_url)
            .json(message)
            .send()
            .await
            .map_err(|source| ScheduledCheckError::Http {
                target: "slack",
                source,
            })?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(ScheduledCheckError::SlackStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const BASE: [(&str, &str); 3] = [
        ("AGENTCORE_RUNTIME_URL", "https://agent.example.com/invocations"),
        ("SLACK_WEBHOOK_URL", "https://hooks.example.com/T000"),
        ("COGNITO_DOMAIN_URL", "https://auth.example.com"),
    ];

    #[test]
    fn test_client_credentials_preferred() {
        let mut vars = BASE.to_vec();
        vars.extend([
            ("M2M_CLIENT_ID", "m2m"),
            ("M2M_CLIENT_SECRET", "secret"),
            ("COGNITO_CLIENT_ID", "app"),
            ("COGNITO_USERNAME", "ops"),
            ("COGNITO_PASSWORD", "pw"),
        ]);
        let config = ScheduledCheckConfig::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(
            config.grant,
            TokenGrant::ClientCredentials {
                domain_url: "https://auth.example.com".into(),
                client_id: "m2m".into(),
                client_secret: "secret".into(),
                resource_server_id: None,
            }
        );
    }

    #[test]
    fn test_password_fallback() {
        let mut vars = BASE.to_vec();
        vars.extend([
            ("M2M_CLIENT_ID", "m2m"),
            ("COGNITO_CLIENT_ID", "app"),
            ("COGNITO_USERNAME", "ops"),
            ("COGNITO_PASSWORD", "pw"),
        ]);
        let config = ScheduledCheckConfig::from_lookup(lookup(&vars)).unwrap();
        assert!(matches!(config.grant, TokenGrant::Password { ref username, .. } if username == "ops"));
    }

    #[test]
    fn test_missing_credentials_and_urls() {
        let err = ScheduledCheckConfig::from_lookup(lookup(&BASE)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "No valid authentication credentials provided. Need either M2M credentials or username/password"
        );

        let err = ScheduledCheckConfig::from_lookup(lookup(&BASE[1..])).unwrap_err();
        assert_eq!(err.to_string(), "AGENTCORE_RUNTIME_URL not set");
    }

    #[test]
    fn test_payload_session_id() {
        let now = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let payload = agent_payload(now);
        assert_eq!(payload["session_id"], "scheduled-20260102-0304");
        assert_eq!(payload["prompt"], MONITORING_PROMPT);
    }
}
