// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google directory source.
//!
//! Answers the directory host's three query shapes (search, list by ids,
//! reverse lookup) plus the backend contact listing, for the user named in
//! the request context.

use std::collections::HashMap;
use std::path::Path;

use validator::Validate;

use crate::config::ConfigError;
use crate::error::{AppError, Result};
use crate::models::contact::columns;
use crate::models::{
    ContactListParams, ContactPage, NormalizedContact, RequestContext, SortDirection,
    SourceConfig, SourceResult,
};
use crate::services::auth_client::AuthClient;
use crate::services::columns::ColumnFormatter;
use crate::services::contacts::ContactFetcher;

/// Columns the backend contact listing searches.
const LISTING_SEARCH_COLUMNS: [&str; 3] = [columns::NAME, columns::NUMBERS, columns::EMAILS];

pub struct GoogleSource {
    name: String,
    auth: AuthClient,
    fetcher: ContactFetcher,
    formatter: ColumnFormatter,
    searched_columns: Vec<String>,
    first_matched_columns: Vec<String>,
}

impl GoogleSource {
    /// Build a source from its static configuration.
    ///
    /// Invalid configuration is fatal here, never deferred to query time.
    pub fn load(config: SourceConfig) -> std::result::Result<Self, ConfigError> {
        config
            .validate()
            .map_err(|e| ConfigError::Source(format!("source '{}': {}", config.name, e)))?;

        let source = Self {
            auth: AuthClient::new(&config.auth)?,
            fetcher: ContactFetcher::new(config.api, config.contacts_url),
            formatter: ColumnFormatter::new(&config.name, &config.format_columns)?,
            searched_columns: config.searched_columns,
            first_matched_columns: config.first_matched_columns,
            name: config.name,
        };

        tracing::info!(
            source = %source.name,
            endpoint = source.fetcher.url(),
            reverse_lookup = !source.first_matched_columns.is_empty(),
            "Google directory source loaded"
        );
        Ok(source)
    }

    /// Load from a raw JSON source configuration.
    pub fn from_value(value: serde_json::Value) -> std::result::Result<Self, ConfigError> {
        let config: SourceConfig = serde_json::from_value(value)
            .map_err(|e| ConfigError::Source(format!("invalid source configuration: {}", e)))?;
        Self::load(config)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contacts whose searched columns contain `term`.
    ///
    /// A user without a Google token gets no results, not an error.
    pub async fn search(&self, term: &str, ctx: &RequestContext) -> Vec<SourceResult> {
        let Some(token) = self.token_or_none(ctx).await else {
            return Vec::new();
        };

        self.fetcher
            .search(&token, term)
            .await
            .filter(|contact| contact.matches_substring(&self.searched_columns, term))
            .map(|contact| self.source_result(contact))
            .collect()
    }

    /// Contacts whose id is one of `ids`.
    pub async fn list(&self, ids: &[String], ctx: &RequestContext) -> Result<Vec<SourceResult>> {
        let Some(token) = self.token_or_none(ctx).await else {
            return Ok(Vec::new());
        };

        Ok(self
            .fetcher
            .list_all(&token)
            .await?
            .filter(|contact| {
                contact
                    .id
                    .as_ref()
                    .is_some_and(|id| ids.iter().any(|wanted| wanted == id))
            })
            .map(|contact| self.source_result(contact))
            .collect())
    }

    /// First contact, in fetch order, with a first-matched column equal to `term`.
    ///
    /// Always empty when no first-matched columns are configured.
    pub async fn first_match(
        &self,
        term: &str,
        ctx: &RequestContext,
    ) -> Result<Option<SourceResult>> {
        if self.first_matched_columns.is_empty() {
            return Ok(None);
        }

        let Some(token) = self.token_or_none(ctx).await else {
            return Ok(None);
        };

        Ok(self
            .fetcher
            .list_all(&token)
            .await?
            .find(|contact| contact.matches_exact(&self.first_matched_columns, term))
            .map(|contact| self.source_result(contact)))
    }

    /// One page of the user's contacts for the backend listing route.
    pub async fn list_contacts(
        &self,
        ctx: &RequestContext,
        params: &ContactListParams,
    ) -> Result<ContactPage> {
        let token = self.auth.google_access_token(ctx).await?;
        let mut contacts: Vec<NormalizedContact> = self.fetcher.list_all(&token).await?.collect();
        let total = contacts.len();

        if let Some(search) = params.search.as_deref().filter(|s| !s.is_empty()) {
            let searched = LISTING_SEARCH_COLUMNS.map(String::from);
            contacts.retain(|contact| contact.matches_substring(&searched, search));
        }
        let filtered = contacts.len();

        match params.order.as_deref() {
            None => {}
            Some(columns::NAME) => contacts.sort_by_key(|c| c.name.to_lowercase()),
            Some(columns::ID) => contacts.sort_by(|a, b| a.id.cmp(&b.id)),
            Some(other) => {
                return Err(AppError::BadRequest(format!(
                    "Cannot order contacts by '{}'",
                    other
                )))
            }
        }
        if params.order.is_some() && params.direction == SortDirection::Desc {
            contacts.reverse();
        }

        let items = contacts
            .into_iter()
            .skip(params.offset)
            .take(params.limit.unwrap_or(usize::MAX))
            .map(Into::into)
            .collect();

        Ok(ContactPage {
            total,
            filtered,
            items,
        })
    }

    async fn token_or_none(&self, ctx: &RequestContext) -> Option<String> {
        match self.auth.google_access_token(ctx).await {
            Ok(token) => Some(token),
            Err(e) => {
                tracing::debug!(
                    source = %self.name,
                    user_uuid = %ctx.user_uuid,
                    error = %e,
                    "No Google token, source yields nothing"
                );
                None
            }
        }
    }

    fn source_result(&self, contact: NormalizedContact) -> SourceResult {
        SourceResult {
            source: self.name.clone(),
            fields: self.formatter.render(&contact),
            contact,
        }
    }
}

/// Load every source of a JSON array file, keyed by name.
pub fn load_sources(path: &Path) -> std::result::Result<HashMap<String, GoogleSource>, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Source(format!("{}: {}", path.display(), e)))?;
    let configs: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .map_err(|e| ConfigError::Source(format!("{}: {}", path.display(), e)))?;

    let mut sources = HashMap::new();
    for value in configs {
        let source = GoogleSource::from_value(value)?;
        if sources.contains_key(source.name()) {
            return Err(ConfigError::Source(format!(
                "duplicate source name '{}'",
                source.name()
            )));
        }
        sources.insert(source.name().to_string(), source);
    }

    Ok(sources)
}
