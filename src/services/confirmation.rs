// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Out-of-band confirmation channel for the redirect flow.
//!
//! Each authorization attempt is correlated by a signed state token. The
//! callback route delivers the authorization code exactly once. The worker
//! waiting for it gives up on timeout or when its attempt is cancelled.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use dashmap::DashMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// What the provider sent back on the redirect callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    Code(String),
    /// User refused consent, carries the provider's `error` value
    Denied(String),
}

/// Why a confirmation worker stopped without an authorization code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfirmationError {
    #[error("confirmation timed out")]
    TimedOut,
    #[error("confirmation cancelled")]
    Cancelled,
    #[error("authorization denied: {0}")]
    Denied(String),
    #[error("confirmation channel closed")]
    Abandoned,
}

/// Registry of redirect-flow attempts awaiting their callback.
pub struct PendingAuthorizations {
    /// state -> single-use sender
    waiters: DashMap<String, oneshot::Sender<Confirmation>>,
    /// user_uuid -> (state, cancellation of the live attempt)
    attempts: DashMap<String, (String, CancellationToken)>,
    shutdown: CancellationToken,
    timeout: Duration,
}

impl PendingAuthorizations {
    /// `shutdown` is the parent of every attempt's cancellation token.
    pub fn new(shutdown: CancellationToken, timeout: Duration) -> Self {
        Self {
            waiters: DashMap::new(),
            attempts: DashMap::new(),
            shutdown,
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Register a new attempt for `user_uuid`, cancelling any previous one.
    pub fn register(&self, user_uuid: &str, state: &str) -> PendingConfirmation {
        self.cancel(user_uuid);

        let (sender, receiver) = oneshot::channel();
        let cancel = self.shutdown.child_token();

        self.waiters.insert(state.to_string(), sender);
        self.attempts
            .insert(user_uuid.to_string(), (state.to_string(), cancel.clone()));

        PendingConfirmation {
            receiver,
            cancel,
            timeout: self.timeout,
        }
    }

    /// Deliver the callback result for `state`.
    ///
    /// The waiter is removed before sending, so any later delivery for the
    /// same state fails with `NotFound`.
    pub fn deliver(&self, state: &str, confirmation: Confirmation) -> Result<(), AppError> {
        let (_, sender) = self.waiters.remove(state).ok_or_else(|| {
            tracing::warn!("Rejected confirmation for unknown or already used state");
            AppError::NotFound("No authorization attempt waiting for this state".to_string())
        })?;

        sender.send(confirmation).map_err(|_| {
            tracing::warn!("Confirmation delivered after its worker stopped");
            AppError::NotFound("Authorization attempt is no longer waiting".to_string())
        })
    }

    /// Cancel the live attempt of `user_uuid`. Returns whether one existed.
    pub fn cancel(&self, user_uuid: &str) -> bool {
        match self.attempts.remove(user_uuid) {
            Some((_, (state, token))) => {
                token.cancel();
                self.waiters.remove(&state);
                true
            }
            None => false,
        }
    }

    /// Drop the bookkeeping of a finished attempt.
    ///
    /// Leaves a newer attempt of the same user untouched.
    pub fn forget(&self, user_uuid: &str, state: &str) {
        self.waiters.remove(state);
        self.attempts
            .remove_if(user_uuid, |_, (attempt_state, _)| attempt_state == state);
    }

    #[cfg(test)]
    fn is_waiting(&self, state: &str) -> bool {
        self.waiters.contains_key(state)
    }
}

/// Receiving half of one attempt, owned by its confirmation worker.
pub struct PendingConfirmation {
    receiver: oneshot::Receiver<Confirmation>,
    cancel: CancellationToken,
    timeout: Duration,
}

impl PendingConfirmation {
    /// Wait for the authorization code.
    pub async fn wait(self) -> Result<String, ConfirmationError> {
        let PendingConfirmation {
            receiver,
            cancel,
            timeout,
        } = self;

        // Cancellation drops the sender too, check it first
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ConfirmationError::Cancelled),
            _ = tokio::time::sleep(timeout) => Err(ConfirmationError::TimedOut),
            received = receiver => match received {
                Ok(Confirmation::Code(code)) => Ok(code),
                Ok(Confirmation::Denied(reason)) => Err(ConfirmationError::Denied(reason)),
                Err(_) => Err(ConfirmationError::Abandoned),
            },
        }
    }
}

/// Build a signed state token: base64url("user_uuid|timestamp_hex|signature_hex").
pub fn sign_state(user_uuid: &str, secret: &[u8]) -> Result<String, AppError> {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_nanos();

    let payload = format!("{}|{:x}", user_uuid, timestamp);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Verify a state token's signature and return the user it was issued for.
pub fn verify_state(state: &str, secret: &[u8]) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let mut parts = state_str.rsplitn(3, '|');
    let signature_hex = parts.next()?;
    let timestamp_hex = parts.next()?;
    let user_uuid = parts.next()?;

    let payload = format!("{}|{}", user_uuid, timestamp_hex);

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(payload.as_bytes());
    let expected = hex::encode(mac.finalize().into_bytes());

    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch");
        return None;
    }

    Some(user_uuid.to_string())
}
