// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google external-auth routes of the auth host.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::{Validate, ValidationError};

use crate::error::{AppError, Result};
use crate::models::ExternalAuthRecord;
use crate::services::{Confirmation, TokenInfo, VerificationHandle};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/0.1/users/{user_uuid}/external/google",
            get(get_token)
                .post(initiate)
                .put(overwrite)
                .delete(revoke),
        )
        .route("/0.1/google/authorize", get(authorize_callback))
}

/// Body of the authorization request. Every field is optional.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct InitiateRequest {
    /// Requested scope; empty means the configured default
    #[serde(default)]
    #[validate(custom(function = "validate_scope"))]
    pub scope: Vec<String>,
}

fn validate_scope(scope: &[String]) -> std::result::Result<(), ValidationError> {
    if scope.iter().all(|s| (1..=512).contains(&s.len())) {
        Ok(())
    } else {
        Err(ValidationError::new("scope_length"))
    }
}

/// Start authorization: device code or authorization URL.
async fn initiate(
    State(state): State<Arc<AppState>>,
    Path(user_uuid): Path<String>,
    body: Bytes,
) -> Result<Json<VerificationHandle>> {
    let request = if body.is_empty() {
        InitiateRequest::default()
    } else {
        serde_json::from_slice::<InitiateRequest>(&body)
            .map_err(|e| AppError::BadRequest(format!("Invalid body: {}", e)))?
    };
    request
        .validate()
        .map_err(|e| AppError::BadRequest(format!("Invalid scope: {}", e)))?;

    let settings = state.config.oauth_settings(Some(request.scope))?;
    let handle = state.lifecycle.initiate(&settings, &user_uuid).await?;

    Ok(Json(handle))
}

/// Current access token, exchanged or refreshed as needed.
async fn get_token(
    State(state): State<Arc<AppState>>,
    Path(user_uuid): Path<String>,
) -> Result<Json<TokenInfo>> {
    let settings = state.config.oauth_settings(None)?;
    let token = state.lifecycle.get_valid_token(&settings, &user_uuid).await?;

    Ok(Json(token))
}

/// Replace the stored record verbatim.
async fn overwrite(
    State(state): State<Arc<AppState>>,
    Path(user_uuid): Path<String>,
    Json(record): Json<ExternalAuthRecord>,
) -> Result<Json<ExternalAuthRecord>> {
    state.config.oauth_settings(None)?;
    let record = state.lifecycle.overwrite(&user_uuid, record).await?;

    Ok(Json(record))
}

async fn revoke(
    State(state): State<Arc<AppState>>,
    Path(user_uuid): Path<String>,
) -> Result<StatusCode> {
    state.config.oauth_settings(None)?;
    state.lifecycle.revoke(&user_uuid).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    state: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Redirect target registered with Google.
async fn authorize_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Result<&'static str> {
    let confirmation = match (params.error, params.code) {
        (Some(error), _) => Confirmation::Denied(error),
        (None, Some(code)) => Confirmation::Code(code),
        (None, None) => {
            return Err(AppError::BadRequest(
                "Callback carries neither code nor error".to_string(),
            ))
        }
    };

    state.lifecycle.confirm(&params.state, confirmation)?;

    Ok("Authorization received, you may close this window.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_entries_are_bounded() {
        let ok = InitiateRequest {
            scope: vec!["openid".to_string()],
        };
        assert!(ok.validate().is_ok());

        let empty_entry = InitiateRequest {
            scope: vec![String::new()],
        };
        assert!(empty_entry.validate().is_err());

        let too_long = InitiateRequest {
            scope: vec!["s".repeat(513)],
        };
        assert!(too_long.validate().is_err());

        assert!(InitiateRequest::default().validate().is_ok());
    }
}
