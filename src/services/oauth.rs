// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth client.
//!
//! Handles:
//! - Device code issuance (device flow)
//! - Authorization URL building (redirect flow)
//! - Code exchange for both flows
//! - Refresh grant

use serde::Deserialize;

use crate::config::{GoogleEndpoints, OAuthFlow};
use crate::error::AppError;

const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

/// OAuth parameters for a single lifecycle operation.
///
/// Built from configuration per request and passed explicitly, never
/// kept as shared mutable session state.
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub scope: Vec<String>,
    pub redirect_uri: String,
    pub flow: OAuthFlow,
}

impl OAuthSettings {
    /// Scope as sent to Google (space separated).
    pub fn scope_param(&self) -> String {
        self.scope.join(" ")
    }
}

/// Google OAuth endpoint client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    endpoints: GoogleEndpoints,
}

impl GoogleOAuthClient {
    pub fn new(endpoints: GoogleEndpoints) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
        }
    }

    fn token_url(&self) -> String {
        format!("{}/token", self.endpoints.oauth2_url.trim_end_matches('/'))
    }

    /// Request a device code and the user code to display.
    pub async fn request_device_code(
        &self,
        settings: &OAuthSettings,
    ) -> Result<DeviceCodeResponse, AppError> {
        let url = format!(
            "{}/device/code",
            self.endpoints.oauth2_url.trim_end_matches('/')
        );
        let scope = settings.scope_param();

        let response = self
            .http
            .post(&url)
            .form(&[
                ("client_id", settings.client_id.as_str()),
                ("scope", scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                AppError::ProviderUnavailable(format!("Device code request failed: {}", e))
            })?;

        self.check_response_json(response, "Device code request")
            .await
    }

    /// Authorization page URL for the redirect flow.
    pub fn authorization_url(&self, settings: &OAuthSettings, state: &str) -> String {
        format!(
            "{}/o/oauth2/v2/auth?\
             client_id={}&\
             redirect_uri={}&\
             response_type=code&\
             scope={}&\
             access_type=offline&\
             prompt=consent&\
             state={}",
            self.endpoints.accounts_url.trim_end_matches('/'),
            urlencoding::encode(&settings.client_id),
            urlencoding::encode(&settings.redirect_uri),
            urlencoding::encode(&settings.scope_param()),
            urlencoding::encode(state),
        )
    }

    /// Exchange a device code once the user approved it.
    pub async fn exchange_device_code(
        &self,
        settings: &OAuthSettings,
        device_code: &str,
    ) -> Result<TokenGrant, AppError> {
        self.post_token(
            &[
                ("client_id", settings.client_id.as_str()),
                ("client_secret", settings.client_secret.as_str()),
                ("device_code", device_code),
                ("grant_type", DEVICE_GRANT_TYPE),
            ],
            "Device code exchange",
        )
        .await
    }

    /// Exchange an authorization code received on the redirect callback.
    pub async fn exchange_authorization_code(
        &self,
        settings: &OAuthSettings,
        code: &str,
    ) -> Result<TokenGrant, AppError> {
        self.post_token(
            &[
                ("client_id", settings.client_id.as_str()),
                ("client_secret", settings.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", settings.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ],
            "Authorization code exchange",
        )
        .await
    }

    /// Mint a new access token from a refresh token.
    pub async fn refresh_token(
        &self,
        settings: &OAuthSettings,
        refresh_token: &str,
    ) -> Result<TokenGrant, AppError> {
        self.post_token(
            &[
                ("client_id", settings.client_id.as_str()),
                ("client_secret", settings.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ],
            "Token refresh",
        )
        .await
    }

    async fn post_token(
        &self,
        form: &[(&str, &str)],
        operation: &str,
    ) -> Result<TokenGrant, AppError> {
        let response = self
            .http
            .post(self.token_url())
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::ProviderUnavailable(format!("{} failed: {}", operation, e)))?;

        self.check_response_json(response, operation).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "{} rejected by Google", operation);
            return Err(AppError::ProviderUnavailable(format!(
                "{} failed with status {}",
                operation, status
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ProviderUnavailable(format!("{}: invalid response: {}", operation, e))
        })
    }
}

/// Device code response from Google.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    #[serde(alias = "verification_uri")]
    pub verification_url: String,
}

/// Token response from Google (exchange and refresh).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Absent on refresh: Google does not rotate refresh tokens here
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, relative to the response
    #[serde(alias = "expires_in_sec")]
    pub expires_in: i64,
}
