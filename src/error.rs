//! Error types for the notes core
//!
//! All errors use thiserror for structured error handling.
//! Recoverable conditions (missing thumbnails, malformed note entries)
//! are absorbed at their own boundary; only failures that make the
//! requested operation meaningless propagate through these variants.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The notes file could not be written.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Malformed JSON or field data that could not be defaulted away.
    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// Attachment copy/delete failure. The caller must not register or
    /// drop an attachment record when this is returned.
    #[error("attachment I/O error: {0}")]
    AttachmentIo(String),

    /// A referenced attachment or thumbnail is absent on disk.
    #[error("missing file: {0}")]
    MissingFile(PathBuf),

    #[error("note not found: {0}")]
    NoteNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, AppError>;
