// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod contact;
pub mod context;
pub mod external_auth;
pub mod raw_contact;
pub mod source;

pub use contact::{ColumnValue, NormalizedContact};
pub use context::RequestContext;
pub use external_auth::{ExternalAuthRecord, GrantState, PROVIDER};
pub use raw_contact::RawContact;
pub use source::{
    AuthHostConfig, ContactListItem, ContactListParams, ContactPage, ContactsApi, SortDirection,
    SourceConfig, SourceResult,
};
