// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google contacts API client.
//!
//! Fetches a user's contacts with their bearer token and yields them
//! normalized. Search failures degrade to an empty result, listing
//! failures propagate.

use std::collections::HashSet;

use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::models::raw_contact::{GDataFeedResponse, PeopleConnectionsResponse};
use crate::models::{ContactsApi, NormalizedContact, RawContact};
use crate::services::formatter::ContactFormatter;

pub const GDATA_CONTACTS_URL: &str = "https://www.google.com/m8/feeds/contacts/default/full";
pub const PEOPLE_CONNECTIONS_URL: &str = "https://people.googleapis.com/v1/people/me/connections";

const USER_AGENT: &str = "wazo_ua/1.0";
const GDATA_MAX_RESULTS: &str = "10000";
const PEOPLE_PAGE_SIZE: &str = "1000";
const PEOPLE_PERSON_FIELDS: &str = "names,emailAddresses,phoneNumbers";

/// Contacts of one fetch, normalized as they are consumed.
#[derive(Debug, Default)]
pub struct Contacts {
    raw: std::vec::IntoIter<RawContact>,
}

impl Contacts {
    fn new(raw: Vec<RawContact>) -> Self {
        Self {
            raw: raw.into_iter(),
        }
    }
}

impl Iterator for Contacts {
    type Item = NormalizedContact;

    fn next(&mut self) -> Option<Self::Item> {
        self.raw.next().map(|raw| ContactFormatter::format(&raw))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.raw.size_hint()
    }
}

/// Contacts endpoint client for one configured API.
#[derive(Clone)]
pub struct ContactFetcher {
    http: reqwest::Client,
    api: ContactsApi,
    url: String,
}

impl ContactFetcher {
    /// `url` overrides the API's default endpoint.
    pub fn new(api: ContactsApi, url: Option<String>) -> Self {
        let url = url.unwrap_or_else(|| {
            match api {
                ContactsApi::Gdata => GDATA_CONTACTS_URL,
                ContactsApi::People => PEOPLE_CONNECTIONS_URL,
            }
            .to_string()
        });

        Self {
            http: reqwest::Client::new(),
            api,
            url,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Contacts matching `term` on the provider side, when supported.
    ///
    /// Never fails: any error is logged and yields no contacts.
    pub async fn search(&self, access_token: &str, term: &str) -> Contacts {
        match self.fetch(access_token, Some(term)).await {
            Ok(raw) => Contacts::new(raw),
            Err(e) => {
                tracing::warn!(
                    endpoint = %self.url,
                    error = %e,
                    "Contact search failed, returning no contacts"
                );
                Contacts::default()
            }
        }
    }

    /// Every contact of the user.
    pub async fn list_all(&self, access_token: &str) -> Result<Contacts, AppError> {
        self.fetch(access_token, None).await.map(Contacts::new)
    }

    async fn fetch(
        &self,
        access_token: &str,
        term: Option<&str>,
    ) -> Result<Vec<RawContact>, AppError> {
        match self.api {
            ContactsApi::Gdata => self.fetch_gdata(access_token, term).await,
            // No provider-side search on connections
            ContactsApi::People => self.fetch_people(access_token).await,
        }
    }

    async fn fetch_gdata(
        &self,
        access_token: &str,
        term: Option<&str>,
    ) -> Result<Vec<RawContact>, AppError> {
        let mut query = vec![("alt", "json"), ("max-results", GDATA_MAX_RESULTS)];
        if let Some(term) = term {
            query.push(("q", term));
        }

        let response = self
            .request(access_token)
            .query(&query)
            .send()
            .await
            .map_err(|e| self.unavailable(e))?;

        let body: GDataFeedResponse = self.check_response_json(response).await?;

        Ok(body
            .feed
            .entry
            .into_iter()
            .filter_map(decode_entry)
            .map(RawContact::GData)
            .collect())
    }

    async fn fetch_people(&self, access_token: &str) -> Result<Vec<RawContact>, AppError> {
        let mut contacts = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        loop {
            let mut request = self.request(access_token).query(&[
                ("pageSize", PEOPLE_PAGE_SIZE),
                ("personFields", PEOPLE_PERSON_FIELDS),
            ]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await.map_err(|e| self.unavailable(e))?;
            let page: PeopleConnectionsResponse = self.check_response_json(response).await?;

            contacts.extend(
                page.connections
                    .into_iter()
                    .filter_map(decode_entry)
                    .map(RawContact::People),
            );

            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    tracing::warn!(
                        endpoint = %self.url,
                        page_token = %next,
                        "People API repeated a page token, stopping pagination"
                    );
                    break;
                }
                Some(next) => page_token = Some(next),
                None => break,
            }
        }

        tracing::debug!(count = contacts.len(), "Fetched People API connections");
        Ok(contacts)
    }

    fn request(&self, access_token: &str) -> reqwest::RequestBuilder {
        self.http
            .get(&self.url)
            .bearer_auth(access_token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, "application/json")
    }

    fn unavailable(&self, e: reqwest::Error) -> AppError {
        AppError::ProviderUnavailable(format!("Contacts request to {} failed: {}", self.url, e))
    }

    /// Non-2xx is an upstream error; an unreadable body is treated as empty.
    async fn check_response_json<T: DeserializeOwned + Default>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::UpstreamError {
                endpoint: self.url.clone(),
                status: status.as_u16(),
            });
        }

        match response.json().await {
            Ok(body) => Ok(body),
            Err(e) => {
                tracing::warn!(endpoint = %self.url, error = %e, "Undecodable contacts response");
                Ok(T::default())
            }
        }
    }
}

/// Decode one entry, skipping it when it does not have the expected shape.
fn decode_entry<T: DeserializeOwned>(value: serde_json::Value) -> Option<T> {
    serde_json::from_value(value)
        .map_err(|e| tracing::warn!(error = %e, "Skipping malformed contact entry"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoints() {
        assert_eq!(
            ContactFetcher::new(ContactsApi::Gdata, None).url(),
            GDATA_CONTACTS_URL
        );
        assert_eq!(
            ContactFetcher::new(ContactsApi::People, None).url(),
            PEOPLE_CONNECTIONS_URL
        );
        assert_eq!(
            ContactFetcher::new(ContactsApi::People, Some("http://mock/c".to_string())).url(),
            "http://mock/c"
        );
    }

    #[test]
    fn test_malformed_entry_is_skipped() {
        let entry: Option<crate::models::raw_contact::GDataEntry> =
            decode_entry(serde_json::json!({"title": 42}));
        assert!(entry.is_none());
    }
}
