// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Wazo-Google: Google OAuth grants and Google Contacts directory sources
//!
//! This crate hosts the auth-side endpoints managing each user's Google
//! grant and the directory sources that read the user's Google contacts
//! with it.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use std::collections::HashMap;

use config::Config;
use services::{GoogleSource, TokenLifecycle};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub lifecycle: TokenLifecycle,
    /// Directory sources keyed by name
    pub sources: HashMap<String, GoogleSource>,
}
