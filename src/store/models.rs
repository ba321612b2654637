//! Note and attachment models
//!
//! Persisted JSON shapes live here. Deserialization is deliberately
//! lenient: missing or malformed fields default per-field so that one
//! bad value never takes a whole note down with it.

use crate::document::ContentItem;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A note with rich text content.
///
/// The id is the key of the repository mapping; it is not duplicated
/// inside the persisted object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Note {
    #[serde(skip)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_content")]
    pub content: Vec<ContentItem>,
    #[serde(default = "epoch", deserialize_with = "lenient_datetime")]
    pub created: DateTime<Utc>,
    #[serde(default = "epoch", deserialize_with = "lenient_datetime")]
    pub modified: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "lenient_optional_datetime",
        skip_serializing_if = "Option::is_none"
    )]
    pub reminder: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Dynamic color tags declared by this note (tag name -> `#RRGGBB`).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub color_tags: BTreeMap<String, String>,
}

impl Note {
    /// A fresh, empty note.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            created: now,
            modified: now,
            ..Self::default()
        }
    }

    /// Bump the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    /// Concatenation, in document order, of all text run values.
    /// Images, tables and hyperlinks contribute nothing.
    pub fn body_text(&self) -> String {
        self.content
            .iter()
            .filter_map(ContentItem::searchable_text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Case-insensitive substring search against the title, optionally
    /// extended to the note body.
    pub fn matches_search(&self, term: &str, search_content: bool) -> bool {
        let term = term.to_lowercase();
        if self.title.to_lowercase().contains(&term) {
            return true;
        }
        search_content && self.body_text().to_lowercase().contains(&term)
    }
}

/// Kind of a file associated with a note, classified by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Image,
    Audio,
    File,
}

/// A file associated with a note, stored in the note's attachment
/// directory and referenced by filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub filename: String,
    pub original_name: String,
    #[serde(default = "epoch", deserialize_with = "lenient_datetime")]
    pub added: DateTime<Utc>,
}

/// Sort comparators for note listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteSort {
    ModifiedDesc,
    ModifiedAsc,
    CreatedDesc,
    CreatedAsc,
    TitleAsc,
    TitleDesc,
}

impl NoteSort {
    /// Sort a note listing in place. Title comparison is
    /// case-insensitive; malformed timestamps already loaded as the
    /// epoch minimum sort accordingly.
    pub fn sort(self, notes: &mut [&Note]) {
        match self {
            NoteSort::ModifiedDesc => notes.sort_by(|a, b| b.modified.cmp(&a.modified)),
            NoteSort::ModifiedAsc => notes.sort_by(|a, b| a.modified.cmp(&b.modified)),
            NoteSort::CreatedDesc => notes.sort_by(|a, b| b.created.cmp(&a.created)),
            NoteSort::CreatedAsc => notes.sort_by(|a, b| a.created.cmp(&b.created)),
            NoteSort::TitleAsc => {
                notes.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            }
            NoteSort::TitleDesc => {
                notes.sort_by(|a, b| b.title.to_lowercase().cmp(&a.title.to_lowercase()))
            }
        }
    }
}

fn epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Legacy files carry naive local isoformat timestamps.
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Malformed or missing timestamps become the epoch minimum instead of
/// failing the note.
fn lenient_datetime<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<DateTime<Utc>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value.as_str().and_then(parse_timestamp) {
        Some(dt) => dt,
        None => {
            tracing::warn!("Malformed timestamp {:?}; defaulting to epoch", value);
            epoch()
        }
    })
}

fn lenient_optional_datetime<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    let parsed = value.as_str().and_then(parse_timestamp);
    if parsed.is_none() {
        tracing::warn!("Malformed reminder {:?}; dropping", value);
    }
    Ok(parsed)
}

/// Content is normally an item array. Very old files store a bare
/// string, which upgrades to a single untagged run; individually
/// malformed items are logged and skipped.
fn lenient_content<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<ContentItem>, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(text) => {
            if text.is_empty() {
                Ok(Vec::new())
            } else {
                Ok(vec![ContentItem::text(text)])
            }
        }
        serde_json::Value::Array(raw_items) => {
            let mut items = Vec::with_capacity(raw_items.len());
            for raw in raw_items {
                match serde_json::from_value::<ContentItem>(raw) {
                    Ok(item) => items.push(item),
                    Err(e) => tracing::warn!("Skipping malformed content item: {}", e),
                }
            }
            Ok(items)
        }
        other => {
            tracing::warn!("Malformed content field {:?}; defaulting to empty", other);
            Ok(Vec::new())
        }
    }
}
