//! Editor session
//!
//! Explicit value owning the open note's editing state: the live
//! surface, the tag registry pre-loaded with the note's dynamic colors,
//! and the note id. Owned by the top-level controller and passed by
//! reference; opening renders the persisted content, saving wholesale
//! reconstructs it from the surface.

use crate::document::{
    extract_surface, ContentItem, ContentRenderer, ImageResolver, TagId, TagRegistry, TextSurface,
};
use crate::store::Note;
use std::collections::BTreeMap;

/// Editing state of one open note.
pub struct EditorSession {
    note_id: String,
    surface: TextSurface,
    registry: TagRegistry,
}

impl EditorSession {
    /// Open a note: build its registry and render its content onto a
    /// fresh surface.
    pub fn open(note: &Note, images: &dyn ImageResolver) -> Self {
        let mut registry = TagRegistry::with_builtins();
        registry.load_note_colors(&note.color_tags);

        let mut surface = TextSurface::new();
        ContentRenderer::new(&registry).render(&note.id, &note.content, images, &mut surface);

        tracing::info!("Opened editor session for note {}", note.id);
        Self {
            note_id: note.id.clone(),
            surface,
            registry,
        }
    }

    pub fn note_id(&self) -> &str {
        &self.note_id
    }

    pub fn surface(&self) -> &TextSurface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut TextSurface {
        &mut self.surface
    }

    pub fn registry(&self) -> &TagRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TagRegistry {
        &mut self.registry
    }

    /// Extract the surface into an ordered content list.
    pub fn snapshot(&self) -> Vec<ContentItem> {
        extract_surface(&self.surface)
    }

    /// Write the session state back into the note: content is wholesale
    /// reconstructed, dynamic color tags are re-collected from it, and
    /// the modified timestamp is bumped.
    pub fn save_into(&self, note: &mut Note) {
        debug_assert_eq!(note.id, self.note_id);

        let content = self.snapshot();
        note.color_tags = collect_color_tags(&content);
        note.content = content;
        note.touch();
    }
}

/// Dynamic color tags referenced by a content list, in the persisted
/// name -> hex form.
fn collect_color_tags(content: &[ContentItem]) -> BTreeMap<String, String> {
    let mut colors = BTreeMap::new();
    for item in content {
        if let ContentItem::Text(run) = item {
            for tag in &run.tags {
                if let TagId::Color(rgb) = tag {
                    colors.insert(tag.name(), rgb.to_string());
                }
            }
        }
    }
    colors
}
