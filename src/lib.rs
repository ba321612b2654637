//! TackNotes library
//!
//! Core of a personal note-taking application: a rich content document
//! model with bidirectional surface transforms, a tag registry, a
//! JSON-backed note repository, attachment storage with thumbnails,
//! and debounced autosave.

pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod services;
pub mod store;
