//! Column-schema normalization.
//!
//! Export tools name the same metric differently ("Views" vs "Impressions",
//! "Likes" vs "Reactions"). The resolver maps headers onto a closed set of
//! canonical fields by exact, case-insensitive alias lookup. Fields with no
//! matching header are simply left out of the mapping.

use crate::types::{NormalizedTable, RawTable};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    Impressions,
    Reactions,
    Comments,
    Shares,
    Date,
    Title,
    Type,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 7] = [
        CanonicalField::Impressions,
        CanonicalField::Reactions,
        CanonicalField::Comments,
        CanonicalField::Shares,
        CanonicalField::Date,
        CanonicalField::Title,
        CanonicalField::Type,
    ];

    /// Accepted header spellings, highest priority first.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            CanonicalField::Impressions => &["impressions", "views", "impression", "view"],
            CanonicalField::Reactions => &["reactions", "likes", "reaction", "like"],
            CanonicalField::Comments => &["comments", "comment"],
            CanonicalField::Shares => &["shares", "share", "reposts", "repost"],
            CanonicalField::Date => &["date", "publish date", "published", "post date", "created"],
            CanonicalField::Title => &["title", "post title", "content", "post", "text"],
            CanonicalField::Type => &["type", "post type", "content type", "format"],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CanonicalField::Impressions => "impressions",
            CanonicalField::Reactions => "reactions",
            CanonicalField::Comments => "comments",
            CanonicalField::Shares => "shares",
            CanonicalField::Date => "date",
            CanonicalField::Title => "title",
            CanonicalField::Type => "type",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical field -> the one normalized header it was matched to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldMapping(BTreeMap<CanonicalField, String>);

impl FieldMapping {
    pub fn get(&self, field: CanonicalField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: CanonicalField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CanonicalField, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub(crate) fn insert(&mut self, field: CanonicalField, header: String) {
        self.0.entry(field).or_insert(header);
    }
}

pub fn normalize_header(header: &str) -> String {
    // Exports occasionally carry a UTF-8 BOM on the first header.
    header.trim_start_matches('\u{feff}').trim().to_lowercase()
}

/// Normalize headers and resolve every canonical field. Never fails.
pub fn resolve(table: RawTable) -> (NormalizedTable, FieldMapping) {
    let (headers, rows) = table.into_parts();
    let headers: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
    let normalized = NormalizedTable::from_parts(headers, rows);

    let mut mapping = FieldMapping::default();
    for field in CanonicalField::ALL {
        let hit = field
            .aliases()
            .iter()
            .find(|alias| normalized.column_index(alias).is_some());
        match hit {
            Some(alias) => {
                tracing::debug!(field = %field, header = *alias, "resolved column");
                mapping.insert(field, (*alias).to_string());
            }
            None => tracing::debug!(field = %field, "no matching column"),
        }
    }
    (normalized, mapping)
}
