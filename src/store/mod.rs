//! Persistence module
//!
//! Note/attachment models and the JSON-backed note repository.

pub mod models;
pub mod repository;

pub use models::{Attachment, AttachmentKind, Note, NoteSort};
pub use repository::NoteRepository;
