// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Normalized contact record and column access used by directory queries.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Column names a normalized contact exposes to directory configurations.
pub mod columns {
    pub const ID: &str = "id";
    pub const NAME: &str = "name";
    pub const NUMBERS: &str = "numbers";
    pub const EMAILS: &str = "emails";

    pub const ALL: [&str; 4] = [ID, NAME, NUMBERS, EMAILS];
}

/// Flat, label-keyed contact produced from a provider record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedContact {
    /// Provider id (trailing segment of the provider's id URL)
    pub id: Option<String>,
    pub name: String,
    /// Label → canonicalized phone number
    pub numbers: BTreeMap<String, String>,
    /// Label → email address
    pub emails: BTreeMap<String, String>,
}

/// A column value: plain text, or a label mapping matched value by value.
#[derive(Debug, Clone, Copy)]
pub enum ColumnValue<'a> {
    Text(&'a str),
    Labeled(&'a BTreeMap<String, String>),
}

impl<'a> ColumnValue<'a> {
    /// Individual strings to match against.
    pub fn values(&self) -> Vec<&'a str> {
        match *self {
            ColumnValue::Text(text) => vec![text],
            ColumnValue::Labeled(map) => map.values().map(String::as_str).collect(),
        }
    }
}

impl NormalizedContact {
    /// Look up a column by name. Unknown columns and an unset id yield `None`.
    pub fn column(&self, name: &str) -> Option<ColumnValue<'_>> {
        match name {
            columns::ID => self.id.as_deref().map(ColumnValue::Text),
            columns::NAME => Some(ColumnValue::Text(&self.name)),
            columns::NUMBERS => Some(ColumnValue::Labeled(&self.numbers)),
            columns::EMAILS => Some(ColumnValue::Labeled(&self.emails)),
            _ => None,
        }
    }

    /// Case-insensitive substring match of `term` against any of `columns`.
    pub fn matches_substring(&self, columns: &[String], term: &str) -> bool {
        let needle = term.to_lowercase();
        self.any_value(columns, |value| value.to_lowercase().contains(&needle))
    }

    /// Case-insensitive exact match of `term` against any of `columns`.
    pub fn matches_exact(&self, columns: &[String], term: &str) -> bool {
        let needle = term.to_lowercase();
        self.any_value(columns, |value| value.to_lowercase() == needle)
    }

    fn any_value(&self, columns: &[String], mut pred: impl FnMut(&str) -> bool) -> bool {
        columns
            .iter()
            .filter_map(|column| self.column(column))
            .any(|value| value.values().into_iter().any(&mut pred))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mario() -> NormalizedContact {
        NormalizedContact {
            id: Some("22b9b8d40fdbf0e1".to_string()),
            name: "Mario Bros".to_string(),
            numbers: BTreeMap::from([("mobile".to_string(), "5555555555".to_string())]),
            emails: BTreeMap::from([(
                "other".to_string(),
                "mario@bros.example.com".to_string(),
            )]),
        }
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_substring_over_text_and_mappings() {
        let contact = mario();

        assert!(contact.matches_substring(&cols(&["name"]), "mario"));
        assert!(contact.matches_substring(&cols(&["emails"]), "MARIO"));
        assert!(!contact.matches_substring(&cols(&["numbers"]), "mario"));
        assert!(contact.matches_substring(&cols(&["numbers"]), "5555"));
    }

    #[test]
    fn test_exact_match_is_not_substring() {
        let contact = mario();

        assert!(contact.matches_exact(&cols(&["numbers"]), "5555555555"));
        assert!(!contact.matches_exact(&cols(&["numbers"]), "555555555"));
        assert!(contact.matches_exact(&cols(&["name"]), "mario bros"));
    }

    #[test]
    fn test_unknown_column_never_matches() {
        assert!(!mario().matches_substring(&cols(&["givenName"]), ""));
        assert!(!mario().matches_exact(&[], "Mario Bros"));
    }

    #[test]
    fn test_unset_id_column() {
        let contact = NormalizedContact::default();
        assert!(contact.column(columns::ID).is_none());
    }
}
