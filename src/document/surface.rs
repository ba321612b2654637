//! Document surface abstraction
//!
//! A surface is the live editing area a note body is rendered into and
//! extracted from. The extractor consumes the linear event dump
//! (`emit_events`); the renderer drives the mutation operations. Keeping
//! both behind this trait keeps the transforms toolkit-free: a GUI
//! adapter implements the same operations against its tagged-text widget.
//!
//! [`TextSurface`] is the in-memory implementation. It backs tests and
//! serves as the model an adapter mirrors: a flat sequence of units,
//! where a unit is one tagged character or one inline object.

use crate::document::content::TableData;
use crate::document::tag::{TagAttrs, TagId};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use uuid::Uuid;

/// One element of the linear dump of a surface's current state.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    Text(String),
    TagOpen(TagId),
    TagClose(TagId),
    Inline(InlineObject),
}

/// An inline object as it appears in the event stream.
///
/// Tables appear as placeholders; the extractor resolves current
/// headers/rows through a [`TableResolver`] before emitting the item.
#[derive(Debug, Clone, PartialEq)]
pub enum InlineObject {
    Image { filename: String },
    TablePlaceholder { id: Uuid },
    Hyperlink { text: String, url: String },
}

/// An inline object as the renderer places it onto a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceObject {
    /// An embedded image. `thumbnail` is the resolved preview file;
    /// `None` means the original was missing and a placeholder is shown.
    Image {
        filename: String,
        thumbnail: Option<PathBuf>,
    },
    Table(TableData),
    Hyperlink { text: String, url: String },
}

/// Resolves a table placeholder to the live widget's current state.
pub trait TableResolver {
    fn resolve_table(&self, id: Uuid) -> Option<TableData>;
}

/// A live, mutable editing surface.
///
/// Offsets are in units: one unit per character, one unit per inline
/// object.
pub trait DocumentSurface {
    /// Remove every unit and registered link target.
    fn clear(&mut self);

    /// Total number of units.
    fn unit_count(&self) -> usize;

    /// Insert text at a unit offset; returns the number of units
    /// (characters) inserted.
    fn insert_text(&mut self, at: usize, text: &str) -> usize;

    /// Apply a tag over `start..end`. Attributes are the registry's
    /// resolution for the tag; `None` means the tag is purely structural
    /// on this surface. Inline objects inside the range are unaffected.
    fn apply_tag(&mut self, tag: &TagId, attrs: Option<&TagAttrs>, start: usize, end: usize);

    /// Insert an inline object occupying a single unit.
    fn insert_object(&mut self, at: usize, object: SurfaceObject);

    /// Dump the surface state as a linear event stream.
    fn emit_events(&self) -> Vec<SurfaceEvent>;
}

#[derive(Debug, Clone, PartialEq)]
enum Unit {
    Char { ch: char, tags: BTreeSet<TagId> },
    Object(SurfaceObject),
}

/// In-memory document surface.
#[derive(Debug, Clone, Default)]
pub struct TextSurface {
    units: Vec<Unit>,
    /// Click targets registered for hyperlinks, keyed by URL.
    links: BTreeMap<String, String>,
}

impl TextSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The surface's plain text, with one `\u{fffc}` object replacement
    /// character per inline object.
    pub fn text(&self) -> String {
        self.units
            .iter()
            .map(|unit| match unit {
                Unit::Char { ch, .. } => *ch,
                Unit::Object(_) => '\u{fffc}',
            })
            .collect()
    }

    /// Tags on the character at a unit offset; `None` for objects or
    /// out-of-range offsets.
    pub fn tags_at(&self, at: usize) -> Option<&BTreeSet<TagId>> {
        match self.units.get(at) {
            Some(Unit::Char { tags, .. }) => Some(tags),
            _ => None,
        }
    }

    /// The object at a unit offset, if any.
    pub fn object_at(&self, at: usize) -> Option<&SurfaceObject> {
        match self.units.get(at) {
            Some(Unit::Object(object)) => Some(object),
            _ => None,
        }
    }

    /// Registered hyperlink click targets (url -> display text).
    pub fn link_targets(&self) -> &BTreeMap<String, String> {
        &self.links
    }

    fn flush_text(events: &mut Vec<SurfaceEvent>, buffer: &mut String) {
        if !buffer.is_empty() {
            events.push(SurfaceEvent::Text(std::mem::take(buffer)));
        }
    }
}

impl DocumentSurface for TextSurface {
    fn clear(&mut self) {
        self.units.clear();
        self.links.clear();
    }

    fn unit_count(&self) -> usize {
        self.units.len()
    }

    fn insert_text(&mut self, at: usize, text: &str) -> usize {
        let at = at.min(self.units.len());
        let inserted: Vec<Unit> = text
            .chars()
            .map(|ch| Unit::Char {
                ch,
                tags: BTreeSet::new(),
            })
            .collect();
        let count = inserted.len();
        self.units.splice(at..at, inserted);
        count
    }

    fn apply_tag(&mut self, tag: &TagId, _attrs: Option<&TagAttrs>, start: usize, end: usize) {
        let end = end.min(self.units.len());
        if start >= end {
            return;
        }
        for unit in &mut self.units[start..end] {
            if let Unit::Char { tags, .. } = unit {
                tags.insert(tag.clone());
            }
        }
    }

    fn insert_object(&mut self, at: usize, object: SurfaceObject) {
        let at = at.min(self.units.len());
        if let SurfaceObject::Hyperlink { text, url } = &object {
            self.links.insert(url.clone(), text.clone());
        }
        self.units.insert(at, Unit::Object(object));
    }

    fn emit_events(&self) -> Vec<SurfaceEvent> {
        let mut events = Vec::new();
        let mut open: BTreeSet<TagId> = BTreeSet::new();
        let mut buffer = String::new();

        for unit in &self.units {
            match unit {
                Unit::Char { ch, tags } => {
                    if *tags != open {
                        Self::flush_text(&mut events, &mut buffer);
                        for tag in open.difference(tags) {
                            events.push(SurfaceEvent::TagClose(tag.clone()));
                        }
                        for tag in tags.difference(&open) {
                            events.push(SurfaceEvent::TagOpen(tag.clone()));
                        }
                        open = tags.clone();
                    }
                    buffer.push(*ch);
                }
                Unit::Object(object) => {
                    // Tags spanning the object stay open across it.
                    Self::flush_text(&mut events, &mut buffer);
                    let inline = match object {
                        SurfaceObject::Image { filename, .. } => InlineObject::Image {
                            filename: filename.clone(),
                        },
                        SurfaceObject::Table(table) => {
                            InlineObject::TablePlaceholder { id: table.id }
                        }
                        SurfaceObject::Hyperlink { text, url } => InlineObject::Hyperlink {
                            text: text.clone(),
                            url: url.clone(),
                        },
                    };
                    events.push(SurfaceEvent::Inline(inline));
                }
            }
        }

        Self::flush_text(&mut events, &mut buffer);
        for tag in &open {
            events.push(SurfaceEvent::TagClose(tag.clone()));
        }
        events
    }
}

impl TableResolver for TextSurface {
    fn resolve_table(&self, id: Uuid) -> Option<TableData> {
        self.units.iter().find_map(|unit| match unit {
            Unit::Object(SurfaceObject::Table(table)) if table.id == id => Some(table.clone()),
            _ => None,
        })
    }
}
