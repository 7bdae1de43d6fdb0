// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Directory source configuration and query results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use validator::{Validate, ValidationError};

use crate::models::contact::columns;
use crate::models::NormalizedContact;

/// Static configuration of one Google directory source.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SourceConfig {
    /// Source display name (also its key in the backend routes)
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    /// Auth host holding the users' Google grants
    #[validate(nested)]
    pub auth: AuthHostConfig,
    /// Output column → template over normalized contact fields
    #[serde(default)]
    pub format_columns: BTreeMap<String, String>,
    /// Columns eligible for free-text search
    #[serde(default)]
    #[validate(custom(function = "validate_columns"))]
    pub searched_columns: Vec<String>,
    /// Columns eligible for reverse lookup; empty disables it
    #[serde(default)]
    #[validate(custom(function = "validate_columns"))]
    pub first_matched_columns: Vec<String>,
    #[serde(default)]
    pub api: ContactsApi,
    /// Override of the contacts endpoint (defaults to the API's own)
    #[serde(default)]
    pub contacts_url: Option<String>,
}

/// Connection parameters of the auth host.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AuthHostConfig {
    #[validate(length(min = 1))]
    pub host: String,
    #[serde(default = "default_auth_port")]
    #[validate(range(min = 1))]
    pub port: u16,
    #[serde(default = "default_true")]
    pub https: bool,
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "default_true")]
    pub verify_certificate: bool,
    /// Service account used to mint a fresh token when the caller's is rejected
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Every name must be a column of a normalized contact.
fn validate_columns(names: &[String]) -> Result<(), ValidationError> {
    match names.iter().find(|name| !columns::ALL.contains(&name.as_str())) {
        None => Ok(()),
        Some(unknown) => {
            let mut error = ValidationError::new("unknown_column");
            error.message = Some(format!("unknown column '{}'", unknown).into());
            Err(error)
        }
    }
}

fn default_auth_port() -> u16 {
    9497
}

fn default_true() -> bool {
    true
}

impl AuthHostConfig {
    /// Versioned API root, e.g. `https://auth:9497/0.1`.
    pub fn base_url(&self) -> String {
        let scheme = if self.https { "https" } else { "http" };
        format!(
            "{}://{}:{}{}/0.1",
            scheme,
            self.host,
            self.port,
            self.prefix.trim_end_matches('/')
        )
    }
}

/// Which Google contacts API a source reads from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactsApi {
    /// GData contacts feed, supports provider-side `q` search
    #[default]
    Gdata,
    /// People API connections, paginated, no provider-side search
    People,
}

/// A contact as handed back to the directory host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceResult {
    /// Name of the source that produced it
    pub source: String,
    pub contact: NormalizedContact,
    /// Rendered `format_columns`; `None` when a template field is missing
    pub fields: BTreeMap<String, Option<String>>,
}

// ─── Contact listing ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Query parameters of the backend contact listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactListParams {
    pub search: Option<String>,
    pub order: Option<String>,
    #[serde(default)]
    pub direction: SortDirection,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
}

/// One page of contacts.
#[derive(Debug, Clone, Serialize)]
pub struct ContactPage {
    /// Contacts before search filtering
    pub total: usize,
    /// Contacts after search filtering, before pagination
    pub filtered: usize,
    pub items: Vec<ContactListItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContactListItem {
    pub id: Option<String>,
    pub name: String,
    pub numbers: Vec<String>,
    pub numbers_by_label: BTreeMap<String, String>,
    pub emails: Vec<String>,
    pub emails_by_label: BTreeMap<String, String>,
}

impl From<NormalizedContact> for ContactListItem {
    fn from(contact: NormalizedContact) -> Self {
        Self {
            id: contact.id,
            name: contact.name,
            numbers: contact.numbers.values().cloned().collect(),
            emails: contact.emails.values().cloned().collect(),
            numbers_by_label: contact.numbers,
            emails_by_label: contact.emails,
        }
    }
}
