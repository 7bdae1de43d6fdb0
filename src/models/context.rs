// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed request context passed from the directory host to a source.

use validator::Validate;

use crate::error::{AppError, Result};

/// Identity of the user a directory query runs for.
#[derive(Debug, Clone, Validate)]
pub struct RequestContext {
    /// Platform user whose Google grant is used
    #[validate(length(min = 1, max = 64))]
    pub user_uuid: String,
    /// Platform token forwarded to the auth host
    #[validate(length(min = 1, max = 512))]
    pub token: String,
}

impl RequestContext {
    pub fn new(user_uuid: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let context = Self {
            user_uuid: user_uuid.into().trim().to_string(),
            token: token.into().trim().to_string(),
        };

        context
            .validate()
            .map_err(|e| AppError::BadRequest(format!("Invalid request context: {}", e)))?;

        Ok(context)
    }
}
