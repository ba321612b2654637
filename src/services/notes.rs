//! Notes service
//!
//! Top-level coordinator owning the repository and attachment store.
//! Handles note lifecycle (create, delete, duplicate), attachment
//! registration, session save, and reminder clearing. The in-memory
//! mapping and the on-disk file are reconciled by saving after every
//! mutating operation.

use crate::document::ContentItem;
use crate::error::{AppError, Result};
use crate::services::attachments::AttachmentStore;
use crate::services::session::EditorSession;
use crate::store::{Attachment, Note, NoteRepository, NoteSort};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Service coordinating repository, attachments and sessions.
pub struct NotesService {
    repo: NoteRepository,
    attachments: AttachmentStore,
}

impl NotesService {
    /// Open the service over a data directory containing `notes.json`
    /// and the `attachments/` tree.
    pub async fn open(data_dir: &Path) -> Self {
        let repo = NoteRepository::open(data_dir.join("notes.json")).await;
        let attachments = AttachmentStore::new(data_dir.join("attachments"));
        Self { repo, attachments }
    }

    pub fn repository(&self) -> &NoteRepository {
        &self.repo
    }

    pub fn repository_mut(&mut self) -> &mut NoteRepository {
        &mut self.repo
    }

    pub fn attachments(&self) -> &AttachmentStore {
        &self.attachments
    }

    /// Create an empty note with its attachment directory; returns the
    /// new id.
    pub async fn create_note(&mut self) -> Result<String> {
        let id = self.repo.create_note().id.clone();
        self.attachments.ensure_dir(&id).await?;
        self.repo.save().await?;
        Ok(id)
    }

    /// Delete a note together with its attachment directory.
    pub async fn delete_note(&mut self, id: &str) -> Result<()> {
        self.repo
            .remove(id)
            .ok_or_else(|| AppError::NoteNotFound(id.to_string()))?;
        self.attachments.delete_all(id).await;
        self.repo.save().await
    }

    /// Open an editor session for a note.
    pub fn open_session(&self, id: &str) -> Result<EditorSession> {
        let note = self
            .repo
            .get(id)
            .ok_or_else(|| AppError::NoteNotFound(id.to_string()))?;
        Ok(EditorSession::open(note, &self.attachments))
    }

    /// Persist a session's current state: wholesale content
    /// reconstruction, then a full repository save.
    pub async fn save_session(&mut self, session: &EditorSession) -> Result<()> {
        let note = self
            .repo
            .get_mut(session.note_id())
            .ok_or_else(|| AppError::NoteNotFound(session.note_id().to_string()))?;
        session.save_into(note);
        self.repo.save().await
    }

    /// Attach an external file to a note and register its record.
    pub async fn attach_file(&mut self, note_id: &str, source: &Path) -> Result<Attachment> {
        if self.repo.get(note_id).is_none() {
            return Err(AppError::NoteNotFound(note_id.to_string()));
        }

        let attachment = self.attachments.attach(note_id, source).await?;

        // Only a successful copy registers a record.
        let note = self.repo.get_mut(note_id).expect("checked above");
        note.attachments.push(attachment.clone());
        note.touch();
        self.repo.save().await?;
        Ok(attachment)
    }

    /// Attach a finished audio recording (WAV bytes).
    pub async fn attach_recording(&mut self, note_id: &str, wav: &[u8]) -> Result<Attachment> {
        if self.repo.get(note_id).is_none() {
            return Err(AppError::NoteNotFound(note_id.to_string()));
        }

        let attachment = self
            .attachments
            .attach_bytes(note_id, "audio_recording.wav", wav)
            .await?;

        let note = self.repo.get_mut(note_id).expect("checked above");
        note.attachments.push(attachment.clone());
        note.touch();
        self.repo.save().await?;
        Ok(attachment)
    }

    /// Remove an attachment by index.
    ///
    /// The record is dropped only after the file delete attempt; a
    /// failing delete keeps the record so no reference is orphaned.
    pub async fn remove_attachment(&mut self, note_id: &str, index: usize) -> Result<()> {
        let attachment = self
            .repo
            .get(note_id)
            .ok_or_else(|| AppError::NoteNotFound(note_id.to_string()))?
            .attachments
            .get(index)
            .cloned()
            .ok_or_else(|| {
                AppError::AttachmentIo(format!("no attachment at index {index}"))
            })?;

        self.attachments.remove(note_id, &attachment).await?;

        let note = self.repo.get_mut(note_id).expect("checked above");
        note.attachments.remove(index);
        note.touch();
        self.repo.save().await
    }

    /// Duplicate a note, copying its attachments under fresh names and
    /// rewriting image references; returns the new id.
    pub async fn duplicate_note(&mut self, source_id: &str) -> Result<String> {
        let source = self
            .repo
            .get(source_id)
            .ok_or_else(|| AppError::NoteNotFound(source_id.to_string()))?
            .clone();

        let new_id = self.repo.create_note().id.clone();
        let (copies, filename_map) = self
            .attachments
            .duplicate(source_id, &new_id, &source.attachments)
            .await?;

        let now = Utc::now();
        let note = self.repo.get_mut(&new_id).expect("just created");
        note.title = source.title.clone();
        note.color_tags = source.color_tags.clone();
        note.attachments = copies;
        note.created = now;
        note.modified = now;
        note.content = source
            .content
            .iter()
            .map(|item| match item {
                ContentItem::Image { filename } => ContentItem::Image {
                    filename: filename_map
                        .get(filename)
                        .cloned()
                        .unwrap_or_else(|| filename.clone()),
                },
                other => other.clone(),
            })
            .collect();

        self.repo.save().await?;
        Ok(new_id)
    }

    /// Notes whose reminder has come due; each returned reminder is
    /// cleared from its note. The caller persists and notifies.
    pub fn due_reminders(&mut self, now: DateTime<Utc>) -> Vec<(String, String)> {
        let due: Vec<String> = self
            .repo
            .iter()
            .filter(|note| note.reminder.is_some_and(|at| at <= now))
            .map(|note| note.id.clone())
            .collect();

        due.into_iter()
            .filter_map(|id| {
                let note = self.repo.get_mut(&id)?;
                note.reminder = None;
                Some((id, note.title.clone()))
            })
            .collect()
    }

    /// Persist the full mapping.
    pub async fn save(&self) -> Result<()> {
        self.repo.save().await
    }

    /// Sorted note listing.
    pub fn list(&self, sort: NoteSort) -> Vec<&Note> {
        self.repo.sorted(sort)
    }

    /// Search, optionally extended to note bodies.
    pub fn search(&self, term: &str, search_content: bool) -> Vec<&Note> {
        self.repo.search(term, search_content, NoteSort::ModifiedDesc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentSurface;
    use chrono::TimeDelta;
    use tempfile::TempDir;

    async fn test_service() -> (NotesService, TempDir) {
        let temp = TempDir::new().unwrap();
        let service = NotesService::open(temp.path()).await;
        (service, temp)
    }

    #[tokio::test]
    async fn test_create_makes_empty_note_and_dir() {
        let (mut service, _temp) = test_service().await;
        let id = service.create_note().await.unwrap();

        let note = service.repository().get(&id).unwrap();
        assert!(note.title.is_empty());
        assert!(note.content.is_empty());
        assert!(service.attachments().note_dir(&id).is_dir());
    }

    #[tokio::test]
    async fn test_delete_removes_note_and_attachment_tree() {
        let (mut service, temp) = test_service().await;
        let id = service.create_note().await.unwrap();

        let source = temp.path().join("doc.txt");
        std::fs::write(&source, b"hello").unwrap();
        service.attach_file(&id, &source).await.unwrap();

        service.delete_note(&id).await.unwrap();
        assert!(service.repository().get(&id).is_none());
        assert!(!service.attachments().note_dir(&id).exists());

        let err = service.delete_note(&id).await.unwrap_err();
        assert!(matches!(err, AppError::NoteNotFound(_)));
    }

    #[tokio::test]
    async fn test_session_edit_and_save() {
        let (mut service, _temp) = test_service().await;
        let id = service.create_note().await.unwrap();

        let mut session = service.open_session(&id).unwrap();
        session.surface_mut().insert_text(0, "body text");
        service.save_session(&session).await.unwrap();

        let note = service.repository().get(&id).unwrap();
        assert_eq!(note.content, vec![ContentItem::text("body text")]);
    }

    #[tokio::test]
    async fn test_attach_registers_record() {
        let (mut service, temp) = test_service().await;
        let id = service.create_note().await.unwrap();

        let source = temp.path().join("song.mp3");
        std::fs::write(&source, b"audio").unwrap();
        let attachment = service.attach_file(&id, &source).await.unwrap();

        let note = service.repository().get(&id).unwrap();
        assert_eq!(note.attachments, vec![attachment]);
    }

    #[tokio::test]
    async fn test_failed_attach_registers_nothing() {
        let (mut service, temp) = test_service().await;
        let id = service.create_note().await.unwrap();

        let missing = temp.path().join("nope.txt");
        assert!(service.attach_file(&id, &missing).await.is_err());
        assert!(service.repository().get(&id).unwrap().attachments.is_empty());
    }

    #[tokio::test]
    async fn test_remove_attachment_drops_record_after_delete() {
        let (mut service, temp) = test_service().await;
        let id = service.create_note().await.unwrap();

        let source = temp.path().join("doc.txt");
        std::fs::write(&source, b"x").unwrap();
        let attachment = service.attach_file(&id, &source).await.unwrap();
        let file = service.attachments().note_dir(&id).join(&attachment.filename);

        service.remove_attachment(&id, 0).await.unwrap();
        assert!(!file.exists());
        assert!(service.repository().get(&id).unwrap().attachments.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_rewrites_image_references() {
        let (mut service, temp) = test_service().await;
        let id = service.create_note().await.unwrap();

        let source = temp.path().join("pic.png");
        image::RgbImage::from_pixel(8, 8, image::Rgb([1, 2, 3]))
            .save(&source)
            .unwrap();
        let attachment = service.attach_file(&id, &source).await.unwrap();

        {
            let note = service.repository_mut().get_mut(&id).unwrap();
            note.title = "original".to_string();
            note.content = vec![
                ContentItem::text("look: "),
                ContentItem::Image {
                    filename: attachment.filename.clone(),
                },
            ];
        }
        service.save().await.unwrap();

        let copy_id = service.duplicate_note(&id).await.unwrap();
        let copy = service.repository().get(&copy_id).unwrap();

        assert_eq!(copy.title, "original");
        assert_eq!(copy.attachments.len(), 1);
        let new_filename = &copy.attachments[0].filename;
        assert_ne!(new_filename, &attachment.filename);
        assert_eq!(
            copy.content[1],
            ContentItem::Image {
                filename: new_filename.clone()
            }
        );

        // Byte-identical copy under the non-colliding name.
        let original_bytes =
            std::fs::read(service.attachments().note_dir(&id).join(&attachment.filename))
                .unwrap();
        let copy_bytes =
            std::fs::read(service.attachments().note_dir(&copy_id).join(new_filename)).unwrap();
        assert_eq!(original_bytes, copy_bytes);
    }

    #[tokio::test]
    async fn test_due_reminders_cleared_once() {
        let (mut service, _temp) = test_service().await;
        let id = service.create_note().await.unwrap();

        let now = Utc::now();
        {
            let note = service.repository_mut().get_mut(&id).unwrap();
            note.title = "call back".to_string();
            note.reminder = Some(now - TimeDelta::minutes(5));
        }

        let due = service.due_reminders(now);
        assert_eq!(due, vec![(id.clone(), "call back".to_string())]);
        assert!(service.repository().get(&id).unwrap().reminder.is_none());
        assert!(service.due_reminders(now).is_empty());
    }
}
