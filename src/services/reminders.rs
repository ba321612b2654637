//! Reminders service
//!
//! Runs a background task that checks for due reminders once a minute
//! and forwards them to the owner over a channel. A reminder fires at
//! most once; the service clears it from its note and persists before
//! emitting the event.

use crate::config::REMINDER_POLL_SECS;
use crate::error::Result;
use crate::services::notes::NotesService;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};

/// Event emitted when a reminder comes due.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ReminderEvent {
    pub note_id: String,
    pub note_title: String,
}

/// Reminders service with background scheduler.
#[derive(Clone)]
pub struct RemindersService {
    notes: Arc<Mutex<NotesService>>,
    events: mpsc::UnboundedSender<ReminderEvent>,
}

impl RemindersService {
    pub fn new(notes: Arc<Mutex<NotesService>>) -> (Self, mpsc::UnboundedReceiver<ReminderEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Self { notes, events }, rx)
    }

    /// Set a reminder on a note.
    pub async fn set_reminder(&self, note_id: &str, at: DateTime<Utc>) -> Result<()> {
        tracing::info!("Setting reminder for note {} at {}", note_id, at);
        let mut notes = self.notes.lock().await;
        match notes.repository_mut().get_mut(note_id) {
            Some(note) => note.reminder = Some(at),
            None => return Err(crate::error::AppError::NoteNotFound(note_id.to_string())),
        }
        notes.save().await
    }

    /// Clear a note's reminder without firing it.
    pub async fn clear_reminder(&self, note_id: &str) -> Result<()> {
        let mut notes = self.notes.lock().await;
        match notes.repository_mut().get_mut(note_id) {
            Some(note) => note.reminder = None,
            None => return Err(crate::error::AppError::NoteNotFound(note_id.to_string())),
        }
        notes.save().await
    }

    /// Start the background scheduler.
    pub fn start_scheduler(self) {
        tokio::spawn(async move {
            tracing::info!("Starting reminders scheduler");

            let mut interval =
                tokio::time::interval(tokio::time::Duration::from_secs(REMINDER_POLL_SECS));

            loop {
                interval.tick().await;

                if let Err(e) = self.check_and_trigger_reminders(Utc::now()).await {
                    tracing::error!("Error checking reminders: {}", e);
                }
            }
        });
    }

    /// Check for due reminders, clear them and emit events.
    async fn check_and_trigger_reminders(&self, now: DateTime<Utc>) -> Result<()> {
        let due = {
            let mut notes = self.notes.lock().await;
            let due = notes.due_reminders(now);
            if !due.is_empty() {
                notes.save().await?;
            }
            due
        };

        for (note_id, note_title) in due {
            tracing::info!("Triggering reminder for note {}", note_id);
            let _ = self.events.send(ReminderEvent {
                note_id,
                note_title,
            });
        }

        Ok(())
    }
}
