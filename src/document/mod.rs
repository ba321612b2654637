//! Rich content document model
//!
//! This module provides the note body representation and its two
//! lossless transforms:
//! - extraction: surface event stream -> ordered content list
//! - rendering: content list -> freshly populated surface
//!
//! Round-trip guarantee: `extract(render(L)) == L` up to run-splitting.

pub mod content;
pub mod extract;
pub mod render;
pub mod surface;
pub mod tag;

pub use content::{coalesce_runs, ContentItem, TableData, TextRun};
pub use extract::{extract, extract_surface};
pub use render::{ContentRenderer, ImageResolver};
pub use surface::{
    DocumentSurface, InlineObject, SurfaceEvent, SurfaceObject, TableResolver, TextSurface,
};
pub use tag::{FontSlant, FontWeight, Rgb, TagAttrs, TagId, TagRegistry};
