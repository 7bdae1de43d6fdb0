// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google token lifecycle.
//!
//! Drives a user's grant through
//! `NoGrant -> CodeIssued|AwaitingConfirmation -> Active <-> Expired -> NoGrant`
//! on top of the credential store. Every operation receives its
//! [`OAuthSettings`] explicitly.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::Mutex;

use crate::config::OAuthFlow;
use crate::db::CredentialStore;
use crate::error::{AppError, Result};
use crate::models::{ExternalAuthRecord, GrantState, PROVIDER};
use crate::services::confirmation::{
    sign_state, verify_state, Confirmation, ConfirmationError, PendingAuthorizations,
    PendingConfirmation,
};
use crate::services::oauth::{GoogleOAuthClient, OAuthSettings};
use crate::time_utils::now_epoch;

/// Per-user locks serializing exchange and refresh calls.
type RefreshLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// What the caller shows the end user to approve access.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VerificationHandle {
    Device {
        verification_url: String,
        user_code: String,
    },
    Redirect {
        authorization_url: String,
        state: String,
    },
}

/// Usable access token as returned to the auth host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenInfo {
    pub access_token: String,
    pub token_expiration: i64,
    pub scope: Vec<String>,
}

impl TokenInfo {
    fn from_record(record: &ExternalAuthRecord) -> Option<Self> {
        Some(Self {
            access_token: record.access_token.clone()?,
            token_expiration: record.token_expiration?,
            scope: record.scope.clone(),
        })
    }
}

/// Token lifecycle state machine.
#[derive(Clone)]
pub struct TokenLifecycle {
    oauth: GoogleOAuthClient,
    store: Arc<dyn CredentialStore>,
    pending: Arc<PendingAuthorizations>,
    state_key: Arc<[u8]>,
    refresh_locks: RefreshLocks,
}

impl TokenLifecycle {
    pub fn new(
        oauth: GoogleOAuthClient,
        store: Arc<dyn CredentialStore>,
        pending: Arc<PendingAuthorizations>,
        state_key: &[u8],
    ) -> Self {
        Self {
            oauth,
            store,
            pending,
            state_key: Arc::from(state_key),
            refresh_locks: Arc::new(DashMap::new()),
        }
    }

    // ─── Authorization ───────────────────────────────────────────────────────

    /// Start an authorization attempt and persist the transient record.
    ///
    /// Re-initiating replaces any previous record of the user.
    pub async fn initiate(
        &self,
        settings: &OAuthSettings,
        user_uuid: &str,
    ) -> Result<VerificationHandle> {
        match settings.flow {
            OAuthFlow::Device => {
                let device = self.oauth.request_device_code(settings).await?;

                let record =
                    ExternalAuthRecord::pending(Some(device.device_code), settings.scope.clone());
                self.upsert(user_uuid, &record).await?;

                tracing::info!(user_uuid, flow = "device", "Authorization initiated");
                Ok(VerificationHandle::Device {
                    verification_url: device.verification_url,
                    user_code: device.user_code,
                })
            }
            OAuthFlow::Redirect => {
                let state = sign_state(user_uuid, &self.state_key)?;
                let authorization_url = self.oauth.authorization_url(settings, &state);

                let record = ExternalAuthRecord::pending(None, settings.scope.clone());
                self.upsert(user_uuid, &record).await?;

                let waiter = self.pending.register(user_uuid, &state);
                let worker = self.clone();
                let settings = settings.clone();
                let user = user_uuid.to_string();
                let worker_state = state.clone();
                tokio::spawn(async move {
                    worker
                        .await_confirmation(settings, user, worker_state, waiter)
                        .await;
                });

                tracing::info!(
                    user_uuid,
                    flow = "redirect",
                    timeout_secs = self.pending.timeout().as_secs(),
                    "Authorization initiated, waiting for confirmation"
                );
                Ok(VerificationHandle::Redirect {
                    authorization_url,
                    state,
                })
            }
        }
    }

    /// Exchange the pending device code for tokens.
    ///
    /// On failure the device code stays stored so the call can be retried.
    pub async fn complete(&self, settings: &OAuthSettings, user_uuid: &str) -> Result<TokenInfo> {
        let record = self.store.get(user_uuid, PROVIDER).await?;
        self.complete_record(settings, user_uuid, record).await
    }

    /// Deliver the redirect callback for `state` to its waiting worker.
    pub fn confirm(&self, state: &str, confirmation: Confirmation) -> Result<()> {
        let user_uuid = verify_state(state, &self.state_key)
            .ok_or_else(|| AppError::BadRequest("Invalid OAuth state".to_string()))?;

        self.pending.deliver(state, confirmation)?;

        tracing::info!(user_uuid = %user_uuid, "Authorization confirmation delivered");
        Ok(())
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Return an access token that is not expired at call time.
    ///
    /// Performs at most one call to Google: the code exchange when no token
    /// exists yet, or a refresh when the stored one is expired.
    pub async fn get_valid_token(
        &self,
        settings: &OAuthSettings,
        user_uuid: &str,
    ) -> Result<TokenInfo> {
        let record = self.store.get(user_uuid, PROVIDER).await?;
        if record.grant_state(now_epoch()) == GrantState::Active {
            if let Some(info) = TokenInfo::from_record(&record) {
                tracing::debug!(user_uuid, "Reusing stored access token");
                return Ok(info);
            }
        }

        let lock = self
            .refresh_locks
            .entry(user_uuid.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // Another task may have exchanged or refreshed while we waited
        let record = self.store.get(user_uuid, PROVIDER).await?;

        match record.grant_state(now_epoch()) {
            GrantState::Active => TokenInfo::from_record(&record).ok_or_else(|| {
                AppError::Internal(anyhow::anyhow!("Active grant without access token"))
            }),
            GrantState::CodeIssued => self.complete_record(settings, user_uuid, record).await,
            GrantState::Expired => self.refresh_record(settings, user_uuid, record).await,
            GrantState::AwaitingConfirmation | GrantState::NoGrant => Err(AppError::NotFound(
                format!("Authorization of user {} is not confirmed yet", user_uuid),
            )),
        }
    }

    /// Mint a new access token from the stored refresh token.
    ///
    /// The stored token is left untouched when Google rejects the refresh.
    pub async fn refresh(&self, settings: &OAuthSettings, user_uuid: &str) -> Result<TokenInfo> {
        let record = self.store.get(user_uuid, PROVIDER).await?;
        self.refresh_record(settings, user_uuid, record).await
    }

    /// Delete the user's grant and stop any pending confirmation.
    ///
    /// Fails with `NotFound` when there is nothing to delete.
    pub async fn revoke(&self, user_uuid: &str) -> Result<()> {
        if self.pending.cancel(user_uuid) {
            tracing::debug!(user_uuid, "Cancelled pending confirmation");
        }

        self.store.delete(user_uuid, PROVIDER).await?;
        self.refresh_locks.remove(user_uuid);

        tracing::info!(user_uuid, "Google external auth revoked");
        Ok(())
    }

    /// Replace the stored record verbatim.
    pub async fn overwrite(
        &self,
        user_uuid: &str,
        record: ExternalAuthRecord,
    ) -> Result<ExternalAuthRecord> {
        self.store.update(user_uuid, PROVIDER, &record).await?;
        tracing::info!(user_uuid, "Google external auth overwritten");
        Ok(record)
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    async fn upsert(&self, user_uuid: &str, record: &ExternalAuthRecord) -> Result<()> {
        match self.store.get(user_uuid, PROVIDER).await {
            Ok(_) => self.store.update(user_uuid, PROVIDER, record).await,
            Err(AppError::NotFound(_)) => self.store.create(user_uuid, PROVIDER, record).await,
            Err(e) => Err(e),
        }
    }

    async fn complete_record(
        &self,
        settings: &OAuthSettings,
        user_uuid: &str,
        mut record: ExternalAuthRecord,
    ) -> Result<TokenInfo> {
        let device_code = record.device_code.clone().ok_or_else(|| {
            AppError::NotFound(format!("No pending device code for user {}", user_uuid))
        })?;

        let grant = self
            .oauth
            .exchange_device_code(settings, &device_code)
            .await?;

        record.apply_grant(
            grant.access_token,
            grant.refresh_token,
            grant.expires_in,
            now_epoch(),
        );
        self.store.update(user_uuid, PROVIDER, &record).await?;

        tracing::info!(
            user_uuid,
            flow = "device",
            expires_at = record.token_expiration,
            "Token exchanged"
        );
        self.token_info(user_uuid, &record)
    }

    async fn refresh_record(
        &self,
        settings: &OAuthSettings,
        user_uuid: &str,
        mut record: ExternalAuthRecord,
    ) -> Result<TokenInfo> {
        let refresh_token = record.refresh_token.clone().ok_or_else(|| {
            AppError::NotFound(format!(
                "No refresh token for user {}, authorization required",
                user_uuid
            ))
        })?;

        tracing::info!(user_uuid, "Access token expired, refreshing");

        let grant = self.oauth.refresh_token(settings, &refresh_token).await?;

        record.apply_grant(
            grant.access_token,
            grant.refresh_token,
            grant.expires_in,
            now_epoch(),
        );
        self.store.update(user_uuid, PROVIDER, &record).await?;

        tracing::info!(
            user_uuid,
            expires_at = record.token_expiration,
            "Token refreshed"
        );
        self.token_info(user_uuid, &record)
    }

    /// Confirmation worker body: one per redirect-flow attempt.
    async fn await_confirmation(
        self,
        settings: OAuthSettings,
        user_uuid: String,
        state: String,
        waiter: PendingConfirmation,
    ) {
        match waiter.wait().await {
            Ok(code) => {
                if let Err(e) = self
                    .exchange_authorization_code(&settings, &user_uuid, &code)
                    .await
                {
                    tracing::error!(
                        user_uuid = %user_uuid,
                        error = %e,
                        "Authorization code exchange failed"
                    );
                }
            }
            Err(ConfirmationError::TimedOut) => {
                tracing::warn!(user_uuid = %user_uuid, "Authorization confirmation timed out");
            }
            Err(ConfirmationError::Denied(reason)) => {
                tracing::warn!(user_uuid = %user_uuid, reason = %reason, "Authorization denied");
            }
            Err(e @ (ConfirmationError::Cancelled | ConfirmationError::Abandoned)) => {
                tracing::debug!(user_uuid = %user_uuid, reason = %e, "Confirmation worker stopped");
            }
        }

        self.pending.forget(&user_uuid, &state);
    }

    async fn exchange_authorization_code(
        &self,
        settings: &OAuthSettings,
        user_uuid: &str,
        code: &str,
    ) -> Result<()> {
        let grant = self.oauth.exchange_authorization_code(settings, code).await?;

        let mut record = self.store.get(user_uuid, PROVIDER).await?;
        record.apply_grant(
            grant.access_token,
            grant.refresh_token,
            grant.expires_in,
            now_epoch(),
        );
        self.store.update(user_uuid, PROVIDER, &record).await?;

        tracing::info!(
            user_uuid,
            flow = "redirect",
            expires_at = record.token_expiration,
            "Token exchanged"
        );
        Ok(())
    }

    fn token_info(&self, user_uuid: &str, record: &ExternalAuthRecord) -> Result<TokenInfo> {
        TokenInfo::from_record(record).ok_or_else(|| {
            AppError::Internal(anyhow::anyhow!(
                "Grant for user {} has no access token after exchange",
                user_uuid
            ))
        })
    }
}
