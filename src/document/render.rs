//! Content rendering
//!
//! Replays an ordered content list into a freshly cleared surface,
//! restoring every style range and inline object at its correct offset.
//! Missing attachments render a placeholder and log; a render pass never
//! aborts.

use crate::document::content::ContentItem;
use crate::document::surface::{DocumentSurface, SurfaceObject};
use crate::document::tag::TagRegistry;
use crate::error::Result;
use std::path::PathBuf;

/// Resolves an image reference to a thumbnail file, generating one on
/// demand. Implemented by the attachment store; tests substitute stubs.
pub trait ImageResolver {
    fn resolve_thumbnail(&self, note_id: &str, filename: &str) -> Result<PathBuf>;
}

/// Replays content lists onto a surface.
///
/// The registry must be pre-loaded with the note's dynamic color tags
/// (see [`TagRegistry::load_note_colors`]); structural tags resolve
/// without registration.
pub struct ContentRenderer<'a> {
    registry: &'a TagRegistry,
}

impl<'a> ContentRenderer<'a> {
    pub fn new(registry: &'a TagRegistry) -> Self {
        Self { registry }
    }

    /// Clear the surface and replay `items` in order.
    pub fn render<S: DocumentSurface>(
        &self,
        note_id: &str,
        items: &[ContentItem],
        images: &dyn ImageResolver,
        surface: &mut S,
    ) {
        surface.clear();
        let mut cursor = 0;

        for item in items {
            match item {
                ContentItem::Text(run) => {
                    let inserted = surface.insert_text(cursor, &run.value);
                    // BTreeSet iteration applies tags in canonical order,
                    // which fixes overlapping-attribute precedence.
                    for tag in &run.tags {
                        let attrs = self.registry.attrs(tag);
                        surface.apply_tag(tag, attrs.as_ref(), cursor, cursor + inserted);
                    }
                    cursor += inserted;
                }
                ContentItem::Image { filename } => {
                    let thumbnail = match images.resolve_thumbnail(note_id, filename) {
                        Ok(path) => Some(path),
                        Err(e) => {
                            tracing::warn!(
                                "Rendering placeholder for image {}: {}",
                                filename,
                                e
                            );
                            None
                        }
                    };
                    surface.insert_object(
                        cursor,
                        SurfaceObject::Image {
                            filename: filename.clone(),
                            thumbnail,
                        },
                    );
                    cursor += 1;
                }
                ContentItem::Table(table) => {
                    let mut table = table.clone();
                    table.normalize();
                    surface.insert_object(cursor, SurfaceObject::Table(table));
                    cursor += 1;
                }
                ContentItem::Hyperlink { text, url } => {
                    surface.insert_object(
                        cursor,
                        SurfaceObject::Hyperlink {
                            text: text.clone(),
                            url: url.clone(),
                        },
                    );
                    cursor += 1;
                }
            }
        }
    }
}
