//! Application configuration loaded from environment variables.
//!
//! Loaded once at startup. Per-request OAuth parameters are derived from it
//! as immutable [`OAuthSettings`] values rather than held in shared state.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::oauth::OAuthSettings;

/// Scope requested when the caller does not ask for a specific one.
pub const DEFAULT_SCOPE: &str = "https://www.googleapis.com/auth/contacts.readonly";

const DEFAULT_PORT: u16 = 9497;
const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 600;

/// Which OAuth grant the auth endpoints drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OAuthFlow {
    /// Device flow: user enters a code on Google's verification page.
    Device,
    /// Authorization-code flow confirmed through the redirect callback.
    Redirect,
}

impl FromStr for OAuthFlow {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "device" => Ok(OAuthFlow::Device),
            "redirect" => Ok(OAuthFlow::Redirect),
            other => Err(ConfigError::Invalid(format!(
                "GOOGLE_OAUTH_FLOW must be 'device' or 'redirect', got '{}'",
                other
            ))),
        }
    }
}

/// Base URLs of the Google OAuth endpoints.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    /// Hosts the interactive authorization page.
    pub accounts_url: String,
    /// Hosts the device-code and token endpoints.
    pub oauth2_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            accounts_url: "https://accounts.google.com".to_string(),
            oauth2_url: "https://oauth2.googleapis.com".to_string(),
        }
    }
}

/// Google OAuth client credentials.
#[derive(Debug, Clone)]
pub struct GoogleClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// OAuth client; external auth is disabled (404) when unset
    pub google_client: Option<GoogleClientCredentials>,
    pub oauth_flow: OAuthFlow,
    pub default_scope: Vec<String>,
    /// Redirect target registered with Google for the redirect flow
    pub redirect_uri: String,
    pub google_endpoints: GoogleEndpoints,
    /// HMAC key for signing redirect-flow state tokens (raw bytes)
    pub oauth_state_key: Vec<u8>,
    /// How long a redirect-flow attempt waits for its callback
    pub confirmation_timeout: Duration,
    /// JSON file holding the directory source configurations
    pub sources_file: Option<PathBuf>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            google_client: Some(GoogleClientCredentials {
                client_id: "a-client-id".to_string(),
                client_secret: "a-client-secret".to_string(),
            }),
            oauth_flow: OAuthFlow::Redirect,
            default_scope: vec![DEFAULT_SCOPE.to_string()],
            redirect_uri: "http://localhost:9497/0.1/google/authorize".to_string(),
            google_endpoints: GoogleEndpoints::default(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
            confirmation_timeout: Duration::from_secs(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            sources_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let google_client = match (env::var("GOOGLE_CLIENT_ID"), env::var("GOOGLE_CLIENT_SECRET")) {
            (Ok(client_id), Ok(client_secret)) => Some(GoogleClientCredentials {
                client_id: client_id.trim().to_string(),
                client_secret: client_secret.trim().to_string(),
            }),
            (Err(_), Err(_)) => None,
            (Ok(_), Err(_)) => return Err(ConfigError::Missing("GOOGLE_CLIENT_SECRET")),
            (Err(_), Ok(_)) => return Err(ConfigError::Missing("GOOGLE_CLIENT_ID")),
        };

        let defaults = GoogleEndpoints::default();

        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            google_client,
            oauth_flow: env::var("GOOGLE_OAUTH_FLOW")
                .map(|v| v.parse())
                .unwrap_or(Ok(OAuthFlow::Redirect))?,
            default_scope: env::var("GOOGLE_SCOPE")
                .map(|v| split_scope(&v))
                .unwrap_or_else(|_| vec![DEFAULT_SCOPE.to_string()]),
            redirect_uri: env::var("GOOGLE_REDIRECT_URI").unwrap_or_else(|_| {
                format!("http://localhost:{}/0.1/google/authorize", DEFAULT_PORT)
            }),
            google_endpoints: GoogleEndpoints {
                accounts_url: env::var("GOOGLE_ACCOUNTS_URL").unwrap_or(defaults.accounts_url),
                oauth2_url: env::var("GOOGLE_OAUTH2_URL").unwrap_or(defaults.oauth2_url),
            },
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
            confirmation_timeout: Duration::from_secs(
                env::var("OAUTH_CONFIRMATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT_SECS),
            ),
            sources_file: env::var("DIRD_SOURCES_FILE").ok().map(PathBuf::from),
        })
    }

    /// Build the OAuth parameters for one lifecycle operation.
    ///
    /// An empty or absent `requested_scope` falls back to the configured default.
    pub fn oauth_settings(
        &self,
        requested_scope: Option<Vec<String>>,
    ) -> Result<OAuthSettings, AppError> {
        let client = self.google_client.as_ref().ok_or_else(|| {
            AppError::NotFound("Google external auth is not configured".to_string())
        })?;

        let scope = requested_scope
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| self.default_scope.clone());

        Ok(OAuthSettings {
            client_id: client.client_id.clone(),
            client_secret: client.client_secret.clone(),
            scope,
            redirect_uri: self.redirect_uri.clone(),
            flow: self.oauth_flow,
        })
    }
}

fn split_scope(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Directory source configuration error: {0}")]
    Source(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("GOOGLE_CLIENT_ID", "test_id");
        env::set_var("GOOGLE_CLIENT_SECRET", " test_secret ");
        env::set_var("OAUTH_STATE_KEY", "test_state_key");
        env::set_var("GOOGLE_OAUTH_FLOW", "device");

        let config = Config::from_env().expect("Config should load");

        let client = config.google_client.expect("client configured");
        assert_eq!(client.client_id, "test_id");
        assert_eq!(client.client_secret, "test_secret");
        assert_eq!(config.oauth_flow, OAuthFlow::Device);
        assert_eq!(config.default_scope, vec![DEFAULT_SCOPE.to_string()]);
    }

    #[test]
    fn test_oauth_settings_scope_fallback() {
        let config = Config::default();

        let settings = config.oauth_settings(Some(vec![])).unwrap();
        assert_eq!(settings.scope, vec![DEFAULT_SCOPE.to_string()]);

        let settings = config
            .oauth_settings(Some(vec!["openid".to_string()]))
            .unwrap();
        assert_eq!(settings.scope, vec!["openid".to_string()]);
    }

    #[test]
    fn test_oauth_settings_without_client_is_not_found() {
        let config = Config {
            google_client: None,
            ..Config::default()
        };

        let err = config.oauth_settings(None).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_oauth_flow_parse() {
        assert_eq!("Redirect".parse::<OAuthFlow>().unwrap(), OAuthFlow::Redirect);
        assert!("implicit".parse::<OAuthFlow>().is_err());
    }
}
