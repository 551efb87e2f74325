//! Bearer token resolution.
//!
//! A token comes from one of three places, in priority order: an explicit
//! token handed to the client, the `VAGRANT_CLOUD_TOKEN` environment variable,
//! or an OAuth 2.0 client credentials exchange against the HCP identity
//! service when `HCP_CLIENT_ID` and `HCP_CLIENT_SECRET` are set. Exchanged
//! tokens are cached until shortly before they expire.

use crate::transport::{Body, Method, Transport, TransportError, TransportRequest};
use base64::{engine::general_purpose, Engine};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error};
use url::Url;

pub const ENV_ACCESS_TOKEN: &str = "VAGRANT_CLOUD_TOKEN";
pub const ENV_CLIENT_ID: &str = "HCP_CLIENT_ID";
pub const ENV_CLIENT_SECRET: &str = "HCP_CLIENT_SECRET";
pub const ENV_AUTH_URL: &str = "HCP_AUTH_URL";
pub const ENV_AUTH_PATH: &str = "HCP_AUTH_PATH";
pub const ENV_TOKEN_PATH: &str = "HCP_TOKEN_PATH";

pub const DEFAULT_AUTH_URL: &str = "https://auth.idp.hashicorp.com";
pub const DEFAULT_AUTH_PATH: &str = "/oauth2/auth";
pub const DEFAULT_TOKEN_PATH: &str = "/oauth2/token";

/// Seconds subtracted from a token's expiry so it is never sent right as it lapses
pub const TOKEN_EXPIRY_PADDING: i64 = 5;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing required HCP authentication configuration value: {name}")]
    MissingConfiguration { name: String },
    #[error("authentication failed: HTTP {status} {body}")]
    AuthenticationFailed { status: u16, body: String },
    #[error("invalid token response: {0}")]
    InvalidTokenResponse(String),
    #[error("invalid authentication URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Client credentials used for the OAuth exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct HcpConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub auth_path: String,
    pub token_path: String,
}

impl HcpConfig {
    pub fn validate(&self) -> Result<(), AuthError> {
        let values = [
            (ENV_CLIENT_ID, &self.client_id),
            (ENV_CLIENT_SECRET, &self.client_secret),
            (ENV_AUTH_URL, &self.auth_url),
            (ENV_AUTH_PATH, &self.auth_path),
            (ENV_TOKEN_PATH, &self.token_path),
        ];
        for (name, value) in values {
            if value.is_empty() {
                return Err(AuthError::MissingConfiguration {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn token_url(&self) -> Result<Url, AuthError> {
        Ok(Url::parse(&self.auth_url)?.join(&self.token_path)?)
    }
}

/// An exchanged token and its absolute expiry in epoch seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct HcpToken {
    pub token: String,
    pub expires_at: i64,
}

impl HcpToken {
    /// Expired once `now` passes `expires_at` minus the padding.
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires_at - TOKEN_EXPIRY_PADDING
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    expires_at: Option<i64>,
}

#[derive(Debug, Default)]
pub struct Auth {
    token: Option<String>,
    config: Option<HcpConfig>,
    cached: Mutex<Option<HcpToken>>,
}

impl Auth {
    /// Resolve credentials from `access_token` and the process environment.
    pub fn new(access_token: Option<String>) -> Result<Auth, AuthError> {
        Auth::resolve(access_token, |name| std::env::var(name).ok())
    }

    /// Resolve credentials using `env` to look up environment variables.
    pub fn resolve<F>(access_token: Option<String>, env: F) -> Result<Auth, AuthError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).filter(|value| !value.is_empty());

        if let Some(token) = access_token.filter(|token| !token.is_empty()) {
            debug!("Using explicitly provided access token");
            return Ok(Auth::with_token(token));
        }

        if let Some(token) = lookup(ENV_ACCESS_TOKEN) {
            debug!("Using access token from {}", ENV_ACCESS_TOKEN);
            return Ok(Auth::with_token(token));
        }

        let client_id = lookup(ENV_CLIENT_ID);
        let client_secret = lookup(ENV_CLIENT_SECRET);
        if client_id.is_none() && client_secret.is_none() {
            debug!("No credentials available, requests will be anonymous");
            return Ok(Auth::anonymous());
        }

        let config = HcpConfig {
            client_id: client_id.unwrap_or_default(),
            client_secret: client_secret.unwrap_or_default(),
            auth_url: lookup(ENV_AUTH_URL).unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
            auth_path: lookup(ENV_AUTH_PATH).unwrap_or_else(|| DEFAULT_AUTH_PATH.to_string()),
            token_path: lookup(ENV_TOKEN_PATH).unwrap_or_else(|| DEFAULT_TOKEN_PATH.to_string()),
        };
        Auth::from_config(config)
    }

    pub fn with_token(token: impl Into<String>) -> Auth {
        Auth {
            token: Some(token.into()),
            ..Auth::default()
        }
    }

    pub fn anonymous() -> Auth {
        Auth::default()
    }

    pub fn from_config(config: HcpConfig) -> Result<Auth, AuthError> {
        config.validate()?;
        debug!("Using HCP client credentials for client {}", config.client_id);
        Ok(Auth {
            config: Some(config),
            ..Auth::default()
        })
    }

    /// True when a static token or an OAuth configuration is present.
    pub fn is_available(&self) -> bool {
        self.token.is_some() || self.config.is_some()
    }

    pub fn static_token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn config(&self) -> Option<&HcpConfig> {
        self.config.as_ref()
    }

    /// Current bearer token, exchanging client credentials when the cached
    /// token is missing or expired. `None` means requests go out anonymously.
    pub async fn token(&self, transport: &dyn Transport) -> Result<Option<String>, AuthError> {
        if let Some(token) = &self.token {
            return Ok(Some(token.clone()));
        }

        let config = match &self.config {
            Some(config) => config,
            None => return Ok(None),
        };

        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if !token.is_expired() {
                return Ok(Some(token.token.clone()));
            }
            debug!("Cached HCP token expired, requesting a new one");
        }

        let fresh = Auth::refresh(config, transport).await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(Some(token))
    }

    async fn refresh(config: &HcpConfig, transport: &dyn Transport) -> Result<HcpToken, AuthError> {
        let url = config.token_url()?;
        debug!("Requesting HCP token from {}", url);

        let credentials = general_purpose::STANDARD
            .encode(format!("{}:{}", config.client_id, config.client_secret));

        let mut request = TransportRequest::new(Method::Post, url)
            .header("Authorization", format!("Basic {}", credentials))
            .header("Accept", "application/json");
        request.body = Some(Body::Form(vec![(
            "grant_type".to_string(),
            "client_credentials".to_string(),
        )]));

        let response = transport.send(request).await?;
        if !(200..300).contains(&response.status) {
            let body = response.body.trim_end().to_string();
            error!(
                "Token request failed with status {}: {}",
                response.status, body
            );
            return Err(AuthError::AuthenticationFailed {
                status: response.status,
                body,
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&response.body)
            .map_err(|e| AuthError::InvalidTokenResponse(e.to_string()))?;
        let expires_at = match (parsed.expires_at, parsed.expires_in) {
            (Some(at), _) => at,
            (None, Some(seconds)) => now() + seconds,
            (None, None) => {
                return Err(AuthError::InvalidTokenResponse(
                    "missing token expiry".to_string(),
                ))
            }
        };

        Ok(HcpToken {
            token: parsed.access_token,
            expires_at,
        })
    }
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
