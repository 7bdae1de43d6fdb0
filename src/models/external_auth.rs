// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! External-auth record stored per (user, provider) in the credential store.

use serde::{Deserialize, Deserializer, Serialize};

use crate::time_utils::expiration_from;

/// Provider key under which Google grants are stored.
pub const PROVIDER: &str = "google";

/// A user's Google OAuth grant as kept by the credential store.
///
/// Fields this crate does not know about are kept in `extra` so that a
/// verbatim overwrite round-trips them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalAuthRecord {
    /// Device code, present between initiation and first exchange (device flow)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Epoch seconds after which `access_token` is invalid
    #[serde(
        default,
        deserialize_with = "epoch_seconds",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_expiration: Option<i64>,
    #[serde(default, deserialize_with = "scope_list")]
    pub scope: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Where a stored grant stands at a given instant.
///
/// `NoGrant` is the absence of a record and is never derived from one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantState {
    NoGrant,
    /// Device code issued, first exchange not done yet
    CodeIssued,
    /// Redirect flow initiated, callback not received yet
    AwaitingConfirmation,
    Active,
    Expired,
}

impl ExternalAuthRecord {
    /// Transient record written on authorization initiation.
    pub fn pending(device_code: Option<String>, scope: Vec<String>) -> Self {
        Self {
            device_code,
            scope,
            ..Self::default()
        }
    }

    /// Classify this record at `now` (epoch seconds).
    ///
    /// A token without an expiration is treated as expired.
    pub fn grant_state(&self, now: i64) -> GrantState {
        match (&self.access_token, &self.device_code) {
            (None, Some(_)) => GrantState::CodeIssued,
            (None, None) => GrantState::AwaitingConfirmation,
            (Some(_), _) => match self.token_expiration {
                Some(expiration) if expiration > now => GrantState::Active,
                _ => GrantState::Expired,
            },
        }
    }

    /// Fold a token grant from the provider into this record.
    ///
    /// The refresh token is kept when the provider does not rotate it.
    pub fn apply_grant(
        &mut self,
        access_token: String,
        refresh_token: Option<String>,
        expires_in: i64,
        now: i64,
    ) {
        self.access_token = Some(access_token);
        if let Some(refresh_token) = refresh_token {
            self.refresh_token = Some(refresh_token);
        }
        self.token_expiration = Some(expiration_from(now, expires_in));
        self.device_code = None;
    }
}

/// Accept either a list of scopes or a single space-separated string.
fn scope_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scope {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Option::<Scope>::deserialize(deserializer)? {
        Some(Scope::List(list)) => list,
        Some(Scope::Joined(joined)) => joined.split_whitespace().map(str::to_string).collect(),
        None => Vec::new(),
    })
}

/// Accept integer or float epoch seconds, fractions are truncated.
fn epoch_seconds<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Epoch {
        Integer(i64),
        Float(f64),
    }

    match Option::<Epoch>::deserialize(deserializer)? {
        Some(Epoch::Integer(seconds)) => Ok(Some(seconds)),
        Some(Epoch::Float(seconds)) if seconds.is_finite() => Ok(Some(seconds.trunc() as i64)),
        Some(Epoch::Float(seconds)) => Err(serde::de::Error::custom(format!(
            "invalid token_expiration {}",
            seconds
        ))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_record(expiration: Option<i64>) -> ExternalAuthRecord {
        ExternalAuthRecord {
            access_token: Some("an-access-token".to_string()),
            refresh_token: Some("a-refresh-token".to_string()),
            token_expiration: expiration,
            ..ExternalAuthRecord::default()
        }
    }

    #[test]
    fn test_grant_state_transitions() {
        let now = 1_700_000_000;

        let code = ExternalAuthRecord::pending(Some("dev".to_string()), vec![]);
        assert_eq!(code.grant_state(now), GrantState::CodeIssued);

        let waiting = ExternalAuthRecord::pending(None, vec![]);
        assert_eq!(waiting.grant_state(now), GrantState::AwaitingConfirmation);

        assert_eq!(active_record(Some(now + 1)).grant_state(now), GrantState::Active);
        assert_eq!(active_record(Some(now - 1)).grant_state(now), GrantState::Expired);
        assert_eq!(active_record(Some(now)).grant_state(now), GrantState::Expired);
    }

    #[test]
    fn test_missing_expiration_is_expired() {
        assert_eq!(active_record(None).grant_state(0), GrantState::Expired);
    }

    #[test]
    fn test_apply_grant_preserves_refresh_token() {
        let mut record = active_record(Some(10));
        record.apply_grant("new-token".to_string(), None, 3600, 100);

        assert_eq!(record.access_token.as_deref(), Some("new-token"));
        assert_eq!(record.refresh_token.as_deref(), Some("a-refresh-token"));
        assert_eq!(record.token_expiration, Some(3700));
    }

    #[test]
    fn test_apply_grant_clears_device_code() {
        let mut record = ExternalAuthRecord::pending(Some("dev".to_string()), vec![]);
        record.apply_grant("tok".to_string(), Some("ref".to_string()), 60, 0);

        assert_eq!(record.device_code, None);
        assert_eq!(record.refresh_token.as_deref(), Some("ref"));
    }

    #[test]
    fn test_deserialize_keeps_unknown_fields_and_joined_scope() {
        let record: ExternalAuthRecord = serde_json::from_value(serde_json::json!({
            "access_token": "an-access-token",
            "scope": "a-scope b-scope",
            "token_expiration": 42,
            "custom": {"nested": true}
        }))
        .unwrap();

        assert_eq!(record.scope, vec!["a-scope", "b-scope"]);
        assert_eq!(record.extra["custom"]["nested"], serde_json::json!(true));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["custom"]["nested"], serde_json::json!(true));
        assert!(back.get("device_code").is_none());
    }

    #[test]
    fn test_deserialize_float_expiration() {
        let record: ExternalAuthRecord = serde_json::from_value(serde_json::json!({
            "access_token": "tok",
            "refresh_token": "ref",
            "token_expiration": 1700000000.75
        }))
        .unwrap();

        assert_eq!(record.token_expiration, Some(1_700_000_000));
        assert_eq!(
            serde_json::to_value(&record).unwrap()["token_expiration"],
            serde_json::json!(1_700_000_000i64)
        );
    }

    #[test]
    fn test_deserialize_null_and_invalid_expiration() {
        let record: ExternalAuthRecord =
            serde_json::from_value(serde_json::json!({"token_expiration": null})).unwrap();
        assert_eq!(record.token_expiration, None);

        let result = serde_json::from_value::<ExternalAuthRecord>(
            serde_json::json!({"token_expiration": "tomorrow"}),
        );
        assert!(result.is_err());
    }
}
