// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Provider-native contact representations.
//!
//! Google exposes contacts through two API generations with different
//! encodings. Every field is optional so that a sparse or partially
//! malformed entry still deserializes.

use serde::Deserialize;

/// A contact as returned by one of the supported Google APIs.
#[derive(Debug, Clone)]
pub enum RawContact {
    /// Entry of the GData contacts feed (`/m8/feeds/contacts`)
    GData(GDataEntry),
    /// Person from the People API (`/v1/people/me/connections`)
    People(Person),
}

// ─── GData contacts feed ─────────────────────────────────────

/// Top-level GData feed response (`alt=json`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GDataFeedResponse {
    #[serde(default)]
    pub feed: GDataFeed,
}

/// Feed entries are kept raw so one bad entry does not sink the page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GDataFeed {
    #[serde(default)]
    pub entry: Vec<serde_json::Value>,
}

/// GData text node (`{"$t": "..."}`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GDataText {
    #[serde(rename = "$t", default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GDataEntry {
    #[serde(default)]
    pub id: Option<GDataText>,
    #[serde(default)]
    pub title: Option<GDataText>,
    #[serde(rename = "gd$phoneNumber", default)]
    pub phone_numbers: Vec<GDataPhoneNumber>,
    #[serde(rename = "gd$email", default)]
    pub emails: Vec<GDataEmail>,
}

/// Phone number tagged by `rel` URI (`...#mobile`) or free-text `label`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GDataPhoneNumber {
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "$t", default)]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GDataEmail {
    #[serde(default)]
    pub rel: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

// ─── People API ──────────────────────────────────────────────

/// One page of `people.connections.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeopleConnectionsResponse {
    #[serde(default)]
    pub connections: Vec<serde_json::Value>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Person {
    /// `people/<id>`
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default)]
    pub names: Vec<PersonName>,
    #[serde(default)]
    pub phone_numbers: Vec<PersonField>,
    #[serde(default)]
    pub email_addresses: Vec<PersonField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Phone number or email address of a person.
///
/// `type` holds either one of Google's predefined relations or the
/// user's custom label.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonField {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}
