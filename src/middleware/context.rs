// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request context extraction for directory backend routes.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::models::RequestContext;

/// Platform token of the caller.
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";
/// Platform user the query runs for.
pub const USER_UUID_HEADER: &str = "Wazo-User-Uuid";

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let token = header(AUTH_TOKEN_HEADER).ok_or(AppError::Unauthorized)?;
        let user_uuid = header(USER_UUID_HEADER).ok_or_else(|| {
            AppError::BadRequest(format!("Missing {} header", USER_UUID_HEADER))
        })?;

        RequestContext::new(user_uuid, token)
    }
}
