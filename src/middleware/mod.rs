// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (request context, security).

pub mod context;
pub mod security;

pub use context::{AUTH_TOKEN_HEADER, USER_UUID_HEADER};
