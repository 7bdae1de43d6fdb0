// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client of the auth host, used by directory sources to obtain a user's
//! Google access token.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::config::ConfigError;
use crate::error::AppError;
use crate::models::{AuthHostConfig, RequestContext, PROVIDER};

const SERVICE_TOKEN_EXPIRATION_SECS: u64 = 3600;

#[derive(Deserialize)]
struct ExternalTokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ServiceTokenResponse {
    data: ServiceTokenData,
}

#[derive(Deserialize)]
struct ServiceTokenData {
    token: String,
}

#[derive(Clone)]
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    service_credentials: Option<(String, String)>,
}

impl AuthClient {
    pub fn new(config: &AuthHostConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!config.verify_certificate)
            .build()
            .map_err(|e| ConfigError::Source(format!("auth client: {}", e)))?;

        let service_credentials = match (&config.username, &config.password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        };

        Ok(Self {
            http,
            base_url: config.base_url(),
            service_credentials,
        })
    }

    /// Fetch the Google access token of the user in `ctx`.
    ///
    /// When the caller's token is rejected and service credentials are
    /// configured, retries once with a freshly minted service token. Any
    /// failure means no token is available for this user.
    pub async fn google_access_token(&self, ctx: &RequestContext) -> Result<String, AppError> {
        let not_found = || AppError::GoogleTokenNotFound(ctx.user_uuid.clone());

        let mut response = self
            .get_external_auth(&ctx.user_uuid, &ctx.token)
            .await
            .map_err(|e| {
                tracing::warn!(user_uuid = %ctx.user_uuid, error = %e, "Auth host unreachable");
                not_found()
            })?;

        if response.status() == StatusCode::UNAUTHORIZED {
            if let Some((username, password)) = &self.service_credentials {
                tracing::debug!(user_uuid = %ctx.user_uuid, "Token rejected, retrying with service token");

                let service_token = self.service_token(username, password).await.map_err(|e| {
                    tracing::warn!(error = %e, "Failed to obtain service token");
                    not_found()
                })?;

                response = self
                    .get_external_auth(&ctx.user_uuid, &service_token)
                    .await
                    .map_err(|e| {
                        tracing::warn!(user_uuid = %ctx.user_uuid, error = %e, "Auth host unreachable");
                        not_found()
                    })?;
            }
        }

        if !response.status().is_success() {
            tracing::debug!(
                user_uuid = %ctx.user_uuid,
                status = %response.status(),
                "No Google token from auth host"
            );
            return Err(not_found());
        }

        let body: ExternalTokenResponse = response.json().await.map_err(|e| {
            tracing::warn!(user_uuid = %ctx.user_uuid, error = %e, "Invalid auth host response");
            not_found()
        })?;

        Ok(body.access_token)
    }

    async fn get_external_auth(
        &self,
        user_uuid: &str,
        token: &str,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let url = format!(
            "{}/users/{}/external/{}",
            self.base_url,
            urlencoding::encode(user_uuid),
            PROVIDER
        );

        self.http
            .get(&url)
            .header("X-Auth-Token", token)
            .send()
            .await
    }

    async fn service_token(&self, username: &str, password: &str) -> anyhow::Result<String> {
        let url = format!("{}/token", self.base_url);

        let response = self
            .http
            .post(&url)
            .basic_auth(username, Some(password))
            .json(&serde_json::json!({ "expiration": SERVICE_TOKEN_EXPIRATION_SECS }))
            .send()
            .await?
            .error_for_status()?;

        let body: ServiceTokenResponse = response.json().await?;
        Ok(body.data.token)
    }
}
