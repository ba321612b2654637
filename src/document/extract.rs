//! Content extraction
//!
//! Folds the linear event dump of a surface into an ordered content
//! list. This is the save-time half of the document model: the note body
//! is wholesale reconstructed from the surface, never incrementally
//! diffed.

use crate::document::content::{ContentItem, TableData, TextRun};
use crate::document::surface::{
    DocumentSurface, InlineObject, SurfaceEvent, TableResolver,
};
use crate::document::tag::TagId;
use std::collections::BTreeSet;

/// Fold a surface event stream into an ordered content list.
///
/// Maintains a text buffer and the ordered set of currently open tags.
/// The buffer is flushed as a run on every tag transition and before
/// every inline object; the snapshot of open tags is a copy, never
/// aliased. Zero-length flushes are suppressed. Adjacent runs with
/// identical tag sets are not merged; rendering is still correct.
pub fn extract(
    events: impl IntoIterator<Item = SurfaceEvent>,
    tables: &impl TableResolver,
) -> Vec<ContentItem> {
    let mut items = Vec::new();
    let mut buffer = String::new();
    let mut open_tags: BTreeSet<TagId> = BTreeSet::new();

    for event in events {
        match event {
            SurfaceEvent::Text(value) => buffer.push_str(&value),
            SurfaceEvent::TagOpen(tag) => {
                flush(&mut items, &mut buffer, &open_tags);
                open_tags.insert(tag);
            }
            SurfaceEvent::TagClose(tag) => {
                flush(&mut items, &mut buffer, &open_tags);
                // Closing a tag that is not open is a no-op.
                open_tags.remove(&tag);
            }
            SurfaceEvent::Inline(object) => {
                flush(&mut items, &mut buffer, &open_tags);
                items.push(resolve_inline(object, tables));
            }
        }
    }

    flush(&mut items, &mut buffer, &open_tags);
    items
}

/// Extract directly from a live surface.
pub fn extract_surface<S: DocumentSurface + TableResolver>(surface: &S) -> Vec<ContentItem> {
    extract(surface.emit_events(), surface)
}

fn flush(items: &mut Vec<ContentItem>, buffer: &mut String, open_tags: &BTreeSet<TagId>) {
    if buffer.is_empty() {
        return;
    }
    items.push(ContentItem::Text(TextRun {
        value: std::mem::take(buffer),
        tags: open_tags.clone(),
    }));
}

fn resolve_inline(object: InlineObject, tables: &impl TableResolver) -> ContentItem {
    match object {
        InlineObject::Image { filename } => ContentItem::Image { filename },
        InlineObject::TablePlaceholder { id } => {
            // Resolve current headers/rows from the bound widget; an
            // unresolvable placeholder persists as an empty table.
            let table = tables.resolve_table(id).unwrap_or_else(|| {
                tracing::warn!("Table placeholder {} not resolvable; persisting empty", id);
                TableData {
                    id,
                    headers: Vec::new(),
                    rows: Vec::new(),
                }
            });
            ContentItem::Table(table)
        }
        InlineObject::Hyperlink { text, url } => ContentItem::Hyperlink { text, url },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::surface::TextSurface;
    use crate::document::tag::TagId;
    use uuid::Uuid;

    struct NoTables;

    impl TableResolver for NoTables {
        fn resolve_table(&self, _id: Uuid) -> Option<TableData> {
            None
        }
    }

    #[test]
    fn test_plain_text_single_run() {
        let events = vec![SurfaceEvent::Text("Hello".to_string())];
        assert_eq!(extract(events, &NoTables), vec![ContentItem::text("Hello")]);
    }

    #[test]
    fn test_tag_transition_flushes_run() {
        let events = vec![
            SurfaceEvent::Text("Hello ".to_string()),
            SurfaceEvent::TagOpen(TagId::Bold),
            SurfaceEvent::Text("world".to_string()),
            SurfaceEvent::TagClose(TagId::Bold),
        ];

        assert_eq!(
            extract(events, &NoTables),
            vec![
                ContentItem::text("Hello "),
                ContentItem::styled("world", [TagId::Bold]),
            ]
        );
    }

    #[test]
    fn test_zero_length_flushes_suppressed() {
        let events = vec![
            SurfaceEvent::TagOpen(TagId::Bold),
            SurfaceEvent::TagOpen(TagId::Italic),
            SurfaceEvent::Text("x".to_string()),
            SurfaceEvent::TagClose(TagId::Italic),
            SurfaceEvent::TagClose(TagId::Bold),
        ];

        assert_eq!(
            extract(events, &NoTables),
            vec![ContentItem::styled("x", [TagId::Bold, TagId::Italic])]
        );
    }

    #[test]
    fn test_close_of_unopened_tag_is_noop() {
        let events = vec![
            SurfaceEvent::Text("a".to_string()),
            SurfaceEvent::TagClose(TagId::Bold),
            SurfaceEvent::Text("b".to_string()),
        ];

        assert_eq!(
            extract(events, &NoTables),
            vec![ContentItem::text("a"), ContentItem::text("b")]
        );
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        // The second run must not retroactively gain the italic tag
        // opened after the first flush.
        let events = vec![
            SurfaceEvent::TagOpen(TagId::Bold),
            SurfaceEvent::Text("a".to_string()),
            SurfaceEvent::TagOpen(TagId::Italic),
            SurfaceEvent::Text("b".to_string()),
            SurfaceEvent::TagClose(TagId::Italic),
            SurfaceEvent::TagClose(TagId::Bold),
        ];

        assert_eq!(
            extract(events, &NoTables),
            vec![
                ContentItem::styled("a", [TagId::Bold]),
                ContentItem::styled("b", [TagId::Bold, TagId::Italic]),
            ]
        );
    }

    #[test]
    fn test_inline_image_flushes_buffer() {
        let events = vec![
            SurfaceEvent::Text("see: ".to_string()),
            SurfaceEvent::Inline(InlineObject::Image {
                filename: "pic.png".to_string(),
            }),
            SurfaceEvent::Text("!".to_string()),
        ];

        assert_eq!(
            extract(events, &NoTables),
            vec![
                ContentItem::text("see: "),
                ContentItem::Image {
                    filename: "pic.png".to_string()
                },
                ContentItem::text("!"),
            ]
        );
    }

    #[test]
    fn test_table_placeholder_resolves_live_state() {
        let table = TableData::new(
            vec!["H".to_string()],
            vec![vec!["cell".to_string()]],
        );
        let mut surface = TextSurface::new();
        surface.insert_object(
            0,
            crate::document::surface::SurfaceObject::Table(table.clone()),
        );

        let events = vec![SurfaceEvent::Inline(InlineObject::TablePlaceholder {
            id: table.id,
        })];

        assert_eq!(extract(events, &surface), vec![ContentItem::Table(table)]);
    }

    #[test]
    fn test_unresolvable_table_persists_empty() {
        let id = Uuid::new_v4();
        let events = vec![SurfaceEvent::Inline(InlineObject::TablePlaceholder { id })];

        let items = extract(events, &NoTables);
        match &items[0] {
            ContentItem::Table(table) => {
                assert_eq!(table.id, id);
                assert!(table.headers.is_empty());
                assert!(table.rows.is_empty());
            }
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn test_trailing_buffer_flushed_at_stream_end() {
        let events = vec![
            SurfaceEvent::TagOpen(TagId::Underline),
            SurfaceEvent::Text("tail".to_string()),
        ];

        assert_eq!(
            extract(events, &NoTables),
            vec![ContentItem::styled("tail", [TagId::Underline])]
        );
    }
}
