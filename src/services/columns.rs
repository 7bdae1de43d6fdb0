// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! `format_columns` templates.
//!
//! A template mixes literal text with fields of a normalized contact:
//! `{name}`, `{numbers}` (all values, comma separated) or
//! `{numbers[mobile]}` (by label, or by position in label order).
//! `{{` and `}}` are literal braces.

use std::collections::BTreeMap;

use crate::config::ConfigError;
use crate::models::contact::columns;
use crate::models::{ColumnValue, NormalizedContact};

/// Column the directory host uses to display reverse lookup results.
pub const REVERSE_COLUMN: &str = "reverse";
const DEFAULT_REVERSE_TEMPLATE: &str = "{name}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field { column: String, key: Option<String> },
}

/// A parsed column template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTemplate {
    segments: Vec<Segment>,
}

impl ColumnTemplate {
    pub fn parse(template: &str) -> Result<Self, ConfigError> {
        let invalid =
            |reason: &str| ConfigError::Source(format!("template '{}': {}", template, reason));

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut field = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => field.push(c),
                            None => return Err(invalid("unterminated field")),
                        }
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_field(&field).map_err(|reason| invalid(reason.as_str()))?);
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("unmatched '}'")),
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self { segments })
    }

    /// Render against `contact`; `None` when a referenced field is missing.
    pub fn render(&self, contact: &NormalizedContact) -> Option<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { column, key } => {
                    out.push_str(&render_field(contact, column, key.as_deref())?)
                }
            }
        }
        Some(out)
    }
}

fn parse_field(field: &str) -> Result<Segment, String> {
    let field = field.trim();

    let (column, key) = match field.split_once('[') {
        Some((column, rest)) => {
            let key = rest
                .strip_suffix(']')
                .ok_or_else(|| format!("missing ']' in '{}'", field))?;
            if key.is_empty() {
                return Err(format!("empty key in '{}'", field));
            }
            (column.trim(), Some(key.to_string()))
        }
        None => (field, None),
    };

    if !columns::ALL.contains(&column) {
        return Err(format!("unknown field '{}'", column));
    }
    if key.is_some() && column != columns::NUMBERS && column != columns::EMAILS {
        return Err(format!("field '{}' has no labels", column));
    }

    Ok(Segment::Field {
        column: column.to_string(),
        key,
    })
}

fn render_field(contact: &NormalizedContact, column: &str, key: Option<&str>) -> Option<String> {
    match contact.column(column)? {
        ColumnValue::Text(text) => Some(text.to_string()),
        ColumnValue::Labeled(map) => match key {
            None => (!map.is_empty()).then(|| {
                map.values()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            }),
            Some(key) => map.get(key).cloned().or_else(|| {
                key.parse::<usize>()
                    .ok()
                    .and_then(|index| map.values().nth(index).cloned())
            }),
        },
    }
}

/// All `format_columns` of a source.
#[derive(Debug, Clone)]
pub struct ColumnFormatter {
    templates: BTreeMap<String, ColumnTemplate>,
}

impl ColumnFormatter {
    /// Parse every template. A missing `reverse` column falls back to `{name}`.
    pub fn new(
        source_name: &str,
        format_columns: &BTreeMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let mut templates = format_columns
            .iter()
            .map(|(column, template)| Ok((column.clone(), ColumnTemplate::parse(template)?)))
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

        if !templates.contains_key(REVERSE_COLUMN) {
            tracing::info!(
                source = source_name,
                template = DEFAULT_REVERSE_TEMPLATE,
                "No reverse column configured, using default"
            );
            templates.insert(
                REVERSE_COLUMN.to_string(),
                ColumnTemplate::parse(DEFAULT_REVERSE_TEMPLATE)?,
            );
        }

        Ok(Self { templates })
    }

    pub fn render(&self, contact: &NormalizedContact) -> BTreeMap<String, Option<String>> {
        self.templates
            .iter()
            .map(|(column, template)| (column.clone(), template.render(contact)))
            .collect()
    }
}
