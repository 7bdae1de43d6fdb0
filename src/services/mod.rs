// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod auth_client;
pub mod columns;
pub mod confirmation;
pub mod contacts;
pub mod directory;
pub mod formatter;
pub mod lifecycle;
pub mod oauth;

pub use auth_client::AuthClient;
pub use columns::ColumnFormatter;
pub use confirmation::{Confirmation, PendingAuthorizations};
pub use contacts::{ContactFetcher, Contacts};
pub use directory::{load_sources, GoogleSource};
pub use formatter::ContactFormatter;
pub use lifecycle::{TokenInfo, TokenLifecycle, VerificationHandle};
pub use oauth::{GoogleOAuthClient, OAuthSettings};
