//! Services module
//!
//! Business logic services coordinating the document model, repository
//! and attachment storage.

pub mod attachments;
pub mod autosave;
pub mod notes;
pub mod recorder;
pub mod reminders;
pub mod session;

pub use attachments::AttachmentStore;
pub use autosave::AutosaveScheduler;
pub use notes::NotesService;
pub use recorder::{AudioRecorder, FrameSource};
pub use reminders::{ReminderEvent, RemindersService};
pub use session::EditorSession;
