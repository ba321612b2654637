//! Content items
//!
//! One element of a note's ordered body: a styled text run, an embedded
//! image, an embedded table, or a hyperlink. The JSON shape is internally
//! tagged (`"type":"text"|"image"|"table"|"hyperlink"`), with tag sets
//! persisted as their stable string names.

use crate::document::tag::TagId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// A run of characters sharing one tag set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub value: String,
    #[serde(default, with = "tag_names")]
    pub tags: BTreeSet<TagId>,
}

impl TextRun {
    pub fn plain(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            tags: BTreeSet::new(),
        }
    }

    pub fn tagged(value: impl Into<String>, tags: impl IntoIterator<Item = TagId>) -> Self {
        Self {
            value: value.into(),
            tags: tags.into_iter().collect(),
        }
    }
}

/// An embedded table: ordered headers and rows of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableData {
    pub id: Uuid,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TableData {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Self {
            id: Uuid::new_v4(),
            headers,
            rows,
        };
        table.normalize();
        table
    }

    /// Force every row to the header arity: excess cells are dropped,
    /// missing cells become empty strings.
    pub fn normalize(&mut self) {
        let width = self.headers.len();
        for row in &mut self.rows {
            if row.len() != width {
                tracing::warn!(
                    "Normalizing table {} row arity {} to {}",
                    self.id,
                    row.len(),
                    width
                );
                row.resize(width, String::new());
            }
        }
    }
}

/// One element of a note's ordered body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text(TextRun),
    Image { filename: String },
    Table(TableData),
    Hyperlink { text: String, url: String },
}

impl ContentItem {
    pub fn text(value: impl Into<String>) -> Self {
        ContentItem::Text(TextRun::plain(value))
    }

    pub fn styled(value: impl Into<String>, tags: impl IntoIterator<Item = TagId>) -> Self {
        ContentItem::Text(TextRun::tagged(value, tags))
    }

    /// Text this item contributes to content search. Inline objects
    /// contribute nothing.
    pub fn searchable_text(&self) -> Option<&str> {
        match self {
            ContentItem::Text(run) => Some(&run.value),
            _ => None,
        }
    }
}

/// Merge adjacent text runs carrying identical tag sets and drop empty
/// runs. Two content lists that render identically compare equal after
/// this pass, which is the "modulo run-splitting" equality the
/// round-trip guarantee is stated in.
pub fn coalesce_runs(items: &[ContentItem]) -> Vec<ContentItem> {
    let mut out: Vec<ContentItem> = Vec::with_capacity(items.len());
    for item in items {
        match item {
            ContentItem::Text(run) if run.value.is_empty() => continue,
            ContentItem::Text(run) => {
                if let Some(ContentItem::Text(last)) = out.last_mut() {
                    if last.tags == run.tags {
                        last.value.push_str(&run.value);
                        continue;
                    }
                }
                out.push(item.clone());
            }
            _ => out.push(item.clone()),
        }
    }
    out
}

/// Persisted tag sets are arrays of stable tag names. Unknown names are
/// logged and dropped on load instead of failing the whole note.
mod tag_names {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(tags: &BTreeSet<TagId>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(tags.iter().map(|t| t.name()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeSet<TagId>, D::Error> {
        let names = Vec::<String>::deserialize(deserializer)?;
        let mut tags = BTreeSet::new();
        for name in names {
            match TagId::parse(&name) {
                Some(tag) => {
                    tags.insert(tag);
                }
                None => tracing::warn!("Dropping unknown tag on load: {}", name),
            }
        }
        Ok(tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::tag::Rgb;

    #[test]
    fn test_text_json_shape() {
        let item = ContentItem::styled(
            "world",
            [TagId::Bold, TagId::Color(Rgb::new(255, 0, 0))],
        );

        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "text",
                "value": "world",
                "tags": ["bold", "color_#ff0000"],
            })
        );
    }

    #[test]
    fn test_image_json_shape() {
        let item = ContentItem::Image {
            filename: "20240101_120000_pic.png".to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "image");
        assert_eq!(json["filename"], "20240101_120000_pic.png");
    }

    #[test]
    fn test_table_json_round_trip() {
        let table = TableData::new(
            vec!["Name".to_string(), "Qty".to_string()],
            vec![vec!["Bolts".to_string(), "40".to_string()]],
        );
        let item = ContentItem::Table(table.clone());

        let json = serde_json::to_string(&item).unwrap();
        let back: ContentItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ContentItem::Table(table));
    }

    #[test]
    fn test_hyperlink_json_shape() {
        let item = ContentItem::Hyperlink {
            text: "docs".to_string(),
            url: "https://example.com".to_string(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "hyperlink");
        assert_eq!(json["url"], "https://example.com");
    }

    #[test]
    fn test_unknown_tags_dropped_on_load() {
        let json = r#"{"type":"text","value":"hi","tags":["bold","sparkle"]}"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item, ContentItem::styled("hi", [TagId::Bold]));
    }

    #[test]
    fn test_missing_tags_field_defaults_empty() {
        let json = r#"{"type":"text","value":"hi"}"#;
        let item: ContentItem = serde_json::from_str(json).unwrap();
        assert_eq!(item, ContentItem::text("hi"));
    }

    #[test]
    fn test_table_normalize_rows() {
        let mut table = TableData {
            id: Uuid::new_v4(),
            headers: vec!["A".to_string(), "B".to_string()],
            rows: vec![
                vec!["1".to_string()],
                vec!["2".to_string(), "3".to_string(), "4".to_string()],
            ],
        };
        table.normalize();
        assert_eq!(table.rows[0], vec!["1".to_string(), String::new()]);
        assert_eq!(table.rows[1], vec!["2".to_string(), "3".to_string()]);
    }

    #[test]
    fn test_coalesce_runs() {
        let items = vec![
            ContentItem::styled("Hel", [TagId::Bold]),
            ContentItem::styled("lo", [TagId::Bold]),
            ContentItem::text(""),
            ContentItem::text(" world"),
            ContentItem::Image {
                filename: "pic.png".to_string(),
            },
            ContentItem::text("a"),
            ContentItem::text("b"),
        ];

        let merged = coalesce_runs(&items);
        assert_eq!(
            merged,
            vec![
                ContentItem::styled("Hello", [TagId::Bold]),
                ContentItem::text(" world"),
                ContentItem::Image {
                    filename: "pic.png".to_string()
                },
                ContentItem::text("ab"),
            ]
        );
    }
}
