//! Note repository
//!
//! Owns the id -> Note mapping and its JSON persistence. Loading is
//! forgiving: a malformed entry is defaulted, a totally corrupt file
//! yields an empty mapping, and the pass never raises. Saving writes a
//! `.bak` copy of the previous file first, then replaces the primary
//! atomically; only a failure to write the primary propagates.

use crate::error::{AppError, Result};
use crate::store::models::{Note, NoteSort};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Repository for notes, backed by a single JSON file.
#[derive(Debug)]
pub struct NoteRepository {
    path: PathBuf,
    notes: BTreeMap<String, Note>,
}

impl NoteRepository {
    /// Open a repository, loading whatever is on disk.
    ///
    /// A missing file starts an empty repository; a corrupt file is
    /// logged and also starts empty (the `.bak` of the previous save is
    /// the recovery path). This never fails.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let notes = load_notes(&path).await;
        tracing::info!("Loaded {} notes from {:?}", notes.len(), path);
        Self { path, notes }
    }

    /// Create a new empty note and return a reference to it.
    pub fn create_note(&mut self) -> &Note {
        let id = Uuid::new_v4().to_string();
        let note = Note::new(id.clone());
        tracing::info!("Created note: {}", id);
        self.notes.entry(id).or_insert(note)
    }

    pub fn get(&self, id: &str) -> Option<&Note> {
        self.notes.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Note> {
        self.notes.get_mut(id)
    }

    pub fn insert(&mut self, note: Note) {
        self.notes.insert(note.id.clone(), note);
    }

    /// Remove a note from the mapping. The caller is responsible for
    /// the attachment directory.
    pub fn remove(&mut self, id: &str) -> Option<Note> {
        let removed = self.notes.remove(id);
        if removed.is_some() {
            tracing::info!("Removed note: {}", id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    /// All notes under the given sort order.
    pub fn sorted(&self, sort: NoteSort) -> Vec<&Note> {
        let mut listing: Vec<&Note> = self.notes.values().collect();
        sort.sort(&mut listing);
        listing
    }

    /// Notes matching a case-insensitive search term, sorted.
    pub fn search(&self, term: &str, search_content: bool, sort: NoteSort) -> Vec<&Note> {
        let mut listing: Vec<&Note> = self
            .notes
            .values()
            .filter(|note| note.matches_search(term, search_content))
            .collect();
        sort.sort(&mut listing);
        listing
    }

    /// Persist the full mapping as pretty JSON.
    ///
    /// The previous file is first copied to `<path>.bak`; failure there
    /// is logged and the save continues. Failure to write the primary
    /// file is a `Persistence` error.
    pub async fn save(&self) -> Result<()> {
        if fs::try_exists(&self.path).await.unwrap_or(false) {
            let bak = backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &bak).await {
                tracing::warn!("Failed to write backup {:?}: {}", bak, e);
            }
        }

        let json = serde_json::to_string_pretty(&self.notes)
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AppError::Persistence(e.to_string()))?;
            }
        }

        // Write-then-rename so a failed save never truncates the
        // primary file.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json.as_bytes())
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        tracing::info!("Saved {} notes to {:?}", self.notes.len(), self.path);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

async fn load_notes(path: &Path) -> BTreeMap<String, Note> {
    let raw = match fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
        Err(e) => {
            tracing::error!("Failed to read notes file {:?}: {}", path, e);
            return BTreeMap::new();
        }
    };

    let entries: BTreeMap<String, serde_json::Value> = match serde_json::from_str(&raw) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!("Notes file {:?} is corrupt: {}", path, e);
            return BTreeMap::new();
        }
    };

    let mut notes = BTreeMap::new();
    for (id, value) in entries {
        let mut note = match serde_json::from_value::<Note>(value) {
            Ok(note) => note,
            Err(e) => {
                tracing::warn!("Note {} is malformed ({}); defaulting", id, e);
                Note::default()
            }
        };
        note.id = id.clone();
        if note.modified < note.created {
            tracing::debug!("Clamping modified < created for note {}", id);
            note.modified = note.created;
        }
        notes.insert(id, note);
    }
    notes
}
