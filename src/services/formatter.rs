// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Provider contact → normalized contact mapping.
//!
//! Pure and total: missing pieces become empty defaults, entries without a
//! label or without a value are dropped.

use std::collections::BTreeMap;

use crate::models::raw_contact::{GDataEntry, Person, PersonField};
use crate::models::{NormalizedContact, RawContact};

/// Characters removed from phone numbers. Dots and `+` are kept.
const NUMBER_CHARS_TO_REMOVE: [char; 4] = [' ', '-', '(', ')'];

/// Relation types the People API reports as first-class values.
const PEOPLE_RELATIONS: [&str; 12] = [
    "home",
    "work",
    "mobile",
    "homeFax",
    "workFax",
    "otherFax",
    "pager",
    "workMobile",
    "workPager",
    "main",
    "googleVoice",
    "other",
];

/// How a provider tagged a phone number or email entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryLabel {
    /// First-class relation type (`mobile`, `home`, ...)
    Relation(String),
    /// User-defined free-text label
    Custom(String),
}

impl EntryLabel {
    /// Label used as key in the normalized mappings.
    pub fn into_key(self) -> String {
        match self {
            EntryLabel::Relation(key) | EntryLabel::Custom(key) => key,
        }
    }

    /// GData encoding: relation URI wins over the free-text label.
    pub fn from_gdata(rel: Option<&str>, label: Option<&str>) -> Option<Self> {
        match rel.filter(|r| !r.is_empty()) {
            Some(rel) => {
                let kind = rel.rsplit('#').next().unwrap_or(rel);
                non_empty(kind).map(EntryLabel::Relation)
            }
            None => label.and_then(non_empty).map(EntryLabel::Custom),
        }
    }

    /// People API encoding: one `type` field carrying either kind.
    pub fn from_people(kind: Option<&str>) -> Option<Self> {
        let kind = kind.and_then(non_empty)?;
        if PEOPLE_RELATIONS.contains(&kind.as_str()) {
            Some(EntryLabel::Relation(kind))
        } else {
            Some(EntryLabel::Custom(kind))
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

/// Strip spaces, hyphens and parentheses from a phone number.
pub fn canonicalize_number(number: &str) -> String {
    number
        .chars()
        .filter(|c| !NUMBER_CHARS_TO_REMOVE.contains(c))
        .collect()
}

/// Maps provider contacts to [`NormalizedContact`].
pub struct ContactFormatter;

impl ContactFormatter {
    pub fn format(raw: &RawContact) -> NormalizedContact {
        match raw {
            RawContact::GData(entry) => Self::format_gdata(entry),
            RawContact::People(person) => Self::format_person(person),
        }
    }

    fn format_gdata(entry: &GDataEntry) -> NormalizedContact {
        let numbers = collect_labeled(entry.phone_numbers.iter().map(|number| {
            (
                EntryLabel::from_gdata(number.rel.as_deref(), number.label.as_deref()),
                number.value.as_deref(),
            )
        }))
        .into_iter()
        .map(|(label, number)| (label, canonicalize_number(&number)))
        .collect();

        let emails = collect_labeled(entry.emails.iter().map(|email| {
            (
                EntryLabel::from_gdata(email.rel.as_deref(), email.label.as_deref()),
                email.address.as_deref(),
            )
        }));

        NormalizedContact {
            id: entry
                .id
                .as_ref()
                .and_then(|id| trailing_segment(&id.text)),
            name: entry
                .title
                .as_ref()
                .map(|title| title.text.clone())
                .unwrap_or_default(),
            numbers,
            emails,
        }
    }

    fn format_person(person: &Person) -> NormalizedContact {
        NormalizedContact {
            id: person.resource_name.as_deref().and_then(trailing_segment),
            name: person
                .names
                .first()
                .and_then(|name| name.display_name.clone())
                .unwrap_or_default(),
            numbers: people_entries(&person.phone_numbers)
                .into_iter()
                .map(|(label, number)| (label, canonicalize_number(&number)))
                .collect(),
            emails: people_entries(&person.email_addresses),
        }
    }
}

fn people_entries(fields: &[PersonField]) -> BTreeMap<String, String> {
    collect_labeled(
        fields
            .iter()
            .map(|f| (EntryLabel::from_people(f.kind.as_deref()), f.value.as_deref())),
    )
}

/// Keep labeled, non-empty entries. A repeated label keeps the last value.
fn collect_labeled<'a>(
    entries: impl IntoIterator<Item = (Option<EntryLabel>, Option<&'a str>)>,
) -> BTreeMap<String, String> {
    entries
        .into_iter()
        .filter_map(|(label, value)| {
            let value = value.filter(|v| !v.is_empty())?;
            Some((label?.into_key(), value.to_string()))
        })
        .collect()
}

/// Last `/`-separated segment of a provider id URL.
fn trailing_segment(url: &str) -> Option<String> {
    if url.is_empty() {
        return None;
    }
    url.rsplit('/').next().and_then(non_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gdata(value: serde_json::Value) -> RawContact {
        RawContact::GData(serde_json::from_value(value).unwrap())
    }

    fn person(value: serde_json::Value) -> RawContact {
        RawContact::People(serde_json::from_value(value).unwrap())
    }

    fn luigi() -> RawContact {
        gdata(serde_json::json!({
            "id": {"$t": "http://www.google.com/m8/feeds/contacts/user%40example.com/base/4cd6fa0d8b3bbf4c"},
            "title": {"$t": "Luigi Bros"},
            "gd$phoneNumber": [
                {"rel": "http://schemas.google.com/g/2005#mobile", "$t": "+1 555-555-4567"},
                {"rel": "http://schemas.google.com/g/2005#home", "$t": "+1 555-555-1111"},
                {"label": "Mushroom land land-line", "$t": "(555) 555-2222"}
            ],
            "gd$email": [
                {"rel": "http://schemas.google.com/g/2005#other", "address": "Luigi@bros.example.com"},
                {"label": "Old school", "address": "luigi_bros@caramail.com"}
            ]
        }))
    }

    #[test]
    fn test_format_gdata_entry() {
        let contact = ContactFormatter::format(&luigi());

        assert_eq!(contact.id.as_deref(), Some("4cd6fa0d8b3bbf4c"));
        assert_eq!(contact.name, "Luigi Bros");
        assert_eq!(contact.numbers["mobile"], "+15555554567");
        assert_eq!(contact.numbers["home"], "+15555551111");
        assert_eq!(contact.numbers["Mushroom land land-line"], "5555552222");
        assert_eq!(contact.emails["other"], "Luigi@bros.example.com");
        assert_eq!(contact.emails["Old school"], "luigi_bros@caramail.com");
    }

    #[test]
    fn test_format_is_deterministic() {
        let raw = luigi();
        assert_eq!(ContactFormatter::format(&raw), ContactFormatter::format(&raw));
    }

    #[test]
    fn test_extract_type() {
        assert_eq!(
            EntryLabel::from_gdata(Some("http://schemas.google.com/g/2005#work"), None),
            Some(EntryLabel::Relation("work".to_string()))
        );
        assert_eq!(
            EntryLabel::from_gdata(None, Some("Cottage")),
            Some(EntryLabel::Custom("Cottage".to_string()))
        );
        assert_eq!(EntryLabel::from_gdata(None, None), None);
        assert_eq!(EntryLabel::from_gdata(Some(""), Some("")), None);
    }

    #[test]
    fn test_canonicalize_number() {
        assert_eq!(canonicalize_number("+1 555-555-1234"), "+15555551234");
        assert_eq!(canonicalize_number("(555) 555-2222"), "5555552222");
        assert_eq!(canonicalize_number("555.555.2222"), "555.555.2222");
    }

    #[test]
    fn test_unlabeled_or_empty_entries_are_dropped() {
        let contact = ContactFormatter::format(&gdata(serde_json::json!({
            "gd$phoneNumber": [
                {"$t": "5555550000"},
                {"rel": "http://schemas.google.com/g/2005#work", "$t": ""},
                {"rel": "http://schemas.google.com/g/2005#home"}
            ],
            "gd$email": [{"address": "nolabel@example.com"}]
        })));

        assert!(contact.numbers.is_empty());
        assert!(contact.emails.is_empty());
    }

    #[test]
    fn test_same_number_under_two_relations() {
        let contact = ContactFormatter::format(&gdata(serde_json::json!({
            "gd$phoneNumber": [
                {"rel": "http://schemas.google.com/g/2005#home", "$t": "555-555-1111"},
                {"rel": "http://schemas.google.com/g/2005#mobile", "$t": "555-555-1111"}
            ]
        })));

        assert_eq!(contact.numbers.len(), 2);
        assert_eq!(contact.numbers["home"], "5555551111");
        assert_eq!(contact.numbers["mobile"], "5555551111");
    }

    #[test]
    fn test_label_collision_keeps_last() {
        let contact = ContactFormatter::format(&gdata(serde_json::json!({
            "gd$phoneNumber": [
                {"rel": "http://schemas.google.com/g/2005#mobile", "$t": "111"},
                {"rel": "http://schemas.google.com/g/2005#mobile", "$t": "222"}
            ]
        })));

        assert_eq!(contact.numbers["mobile"], "222");
    }

    #[test]
    fn test_missing_keys_degrade_to_defaults() {
        let contact = ContactFormatter::format(&gdata(serde_json::json!({})));

        assert_eq!(contact, NormalizedContact::default());
    }

    #[test]
    fn test_format_people_api_person() {
        let contact = ContactFormatter::format(&person(serde_json::json!({
            "resourceName": "people/c7421986032",
            "names": [{"displayName": "Wario Bros", "givenName": "Wario"}],
            "phoneNumbers": [
                {"value": "(555) 555-5555", "type": "mobile", "formattedType": "Mobile"},
                {"value": "555 555 0000", "type": "Castle"},
                {"value": "555 555 9999"}
            ],
            "emailAddresses": [{"value": "wbros@example.com", "type": "work"}]
        })));

        assert_eq!(contact.id.as_deref(), Some("c7421986032"));
        assert_eq!(contact.name, "Wario Bros");
        assert_eq!(contact.numbers.len(), 2);
        assert_eq!(contact.numbers["mobile"], "5555555555");
        assert_eq!(contact.numbers["Castle"], "5555550000");
        assert_eq!(contact.emails["work"], "wbros@example.com");
    }

    #[test]
    fn test_people_relation_vs_custom_label() {
        assert_eq!(
            EntryLabel::from_people(Some("workMobile")),
            Some(EntryLabel::Relation("workMobile".to_string()))
        );
        assert_eq!(
            EntryLabel::from_people(Some("Cottage")),
            Some(EntryLabel::Custom("Cottage".to_string()))
        );
        assert_eq!(EntryLabel::from_people(Some("")), None);
    }
}
