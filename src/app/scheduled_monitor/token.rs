//! OAuth2 bearer tokens from a Cognito-style token endpoint
//!
//! Two grants are supported: `client_credentials` for machine-to-machine callers and
//! `password` for an interactive user. Both post a form-encoded body to
//! `{domain_url}/oauth2/token`.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to retrieve token: {status} - {body}")]
    Rejected { status: u16, body: String },

    #[error("token response is not valid JSON: {0}")]
    InvalidResponse(#[source] reqwest::Error),

    #[error("failed to read token config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON in {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("token config is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("failed to write token config {path}: {source}")]
    ConfigWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Token endpoint response
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    pub fn token_type(&self) -> &str {
        self.token_type.as_deref().unwrap_or("Bearer")
    }
}

/// Token endpoint for an identity provider domain
pub fn token_endpoint(domain_url: &str) -> String {
    format!("{}/oauth2/token", domain_url.trim_end_matches('/'))
}

/// Scope requested for a resource server under the client-credentials grant
pub fn read_scope(resource_server_id: &str) -> String {
    format!("{}/read", resource_server_id)
}

pub struct TokenClient {
    http: reqwest::Client,
    endpoint: String,
}

impl TokenClient {
    pub fn new(domain_url: &str) -> Result<Self, TokenError> {
        let endpoint = token_endpoint(domain_url);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|source| TokenError::Request {
                url: endpoint.clone(),
                source,
            })?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Machine-to-machine grant
    pub async fn client_credentials(
        &self,
        client_id: &str,
        client_secret: &str,
        resource_server_id: Option<&str>,
    ) -> Result<TokenResponse, TokenError> {
        let mut form = vec![
            ("grant_type", "client_credentials".to_string()),
            ("client_id", client_id.to_string()),
            ("client_secret", client_secret.to_string()),
        ];
        if let Some(resource_server) = resource_server_id.filter(|r| !r.is_empty()) {
            form.push(("scope", read_scope(resource_server)));
        }

        info!("Requesting token from {}", self.endpoint);
        debug!("Using client_id: {}", client_id);
        self.request(&form).await
    }

    /// Resource-owner password grant
    pub async fn password(
        &self,
        client_id: &str,
        username: &str,
        password: &str,
    ) -> Result<TokenResponse, TokenError> {
        let form = vec![
            ("grant_type", "password".to_string()),
            ("client_id", client_id.to_string()),
            ("username", username.to_string()),
            ("password", password.to_string()),
        ];

        info!("Requesting token from {} using username/password", self.endpoint);
        self.request(&form).await
    }

    async fn request(&self, form: &[(&str, String)]) -> Result<TokenResponse, TokenError> {
        let response = self
            .http
            .post(&self.endpoint)
            .form(form)
            .send()
            .await
            .map_err(|source| TokenError::Request {
                url: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Failed to retrieve token: {} - {}", status.as_u16(), body);
            return Err(TokenError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await.map_err(TokenError::InvalidResponse)?;
        info!("Successfully retrieved bearer token");
        debug!("Token expires in {:?} seconds", token.expires_in);
        Ok(token)
    }
}

/// JSON token configuration file (`domain_url`, client ids, secrets)
///
/// Unknown fields are preserved when the file is written back.
#[derive(Debug, Clone)]
pub struct TokenConfigFile {
    path: PathBuf,
    fields: Map<String, Value>,
}

impl TokenConfigFile {
    pub fn load(path: &Path) -> Result<Self, TokenError> {
        let content = std::fs::read_to_string(path).map_err(|source| TokenError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let fields = serde_json::from_str(&content).map_err(|source| TokenError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            fields,
        })
    }

    pub fn optional(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn required(&self, name: &'static str) -> Result<&str, TokenError> {
        self.optional(name).ok_or(TokenError::MissingField(name))
    }

    /// Store `bearer_token` and rewrite the file as indented JSON
    pub fn save_bearer_token(&mut self, token: &str) -> Result<(), TokenError> {
        self.fields
            .insert("bearer_token".to_string(), Value::String(token.to_string()));
        let rendered = serde_json::to_string_pretty(&self.fields).map_err(|source| {
            TokenError::ConfigParse {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, rendered).map_err(|source| TokenError::ConfigWrite {
            path: self.path.clone(),
            source,
        })?;
        info!("Updated bearer_token in {}", self.path.display());
        Ok(())
    }
}
