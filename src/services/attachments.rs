//! Attachment store
//!
//! Per-note attachment directory lifecycle: attach, remove, duplicate,
//! purge, and thumbnail generation. Layout:
//! `attachments/note_<id>/<timestamp>_<sanitized-name>`, with image
//! thumbnails at `<basename>_thumb.png`.
//!
//! A failed copy never registers a record; a failed delete never drops
//! one. Missing files are logged, not fatal.

use crate::config::{
    ATTACHMENT_TIMESTAMP_FORMAT, AUDIO_EXTENSIONS, IMAGE_EXTENSIONS, MAX_SANITIZED_NAME_LEN,
    THUMBNAIL_MAX_PX, THUMBNAIL_SUFFIX,
};
use crate::document::ImageResolver;
use crate::error::{AppError, Result};
use crate::store::{Attachment, AttachmentKind};
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Store managing the on-disk attachment tree.
#[derive(Debug, Clone)]
pub struct AttachmentStore {
    root: PathBuf,
}

impl AttachmentStore {
    /// Create a store rooted at the given attachments directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The attachment directory of a note.
    pub fn note_dir(&self, note_id: &str) -> PathBuf {
        self.root.join(format!("note_{note_id}"))
    }

    /// Idempotent directory creation for a note.
    pub async fn ensure_dir(&self, note_id: &str) -> Result<PathBuf> {
        let dir = self.note_dir(note_id);
        fs::create_dir_all(&dir)
            .await
            .map_err(|e| AppError::AttachmentIo(format!("create {:?}: {}", dir, e)))?;
        Ok(dir)
    }

    /// Copy a file into a note's attachment directory.
    ///
    /// The name is sanitized and prefixed with a collision-avoiding
    /// timestamp; the type is classified by extension; images get a
    /// thumbnail. On failure no record is returned and nothing must be
    /// registered by the caller.
    pub async fn attach(&self, note_id: &str, source: &Path) -> Result<Attachment> {
        let original_name = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();

        let dir = self.ensure_dir(note_id).await?;
        let filename = unique_destination(&dir, &sanitize_filename(&original_name)).await;
        let destination = dir.join(&filename);

        fs::copy(source, &destination)
            .await
            .map_err(|e| AppError::AttachmentIo(format!("copy {:?}: {}", source, e)))?;

        let kind = classify(&filename);
        if kind == AttachmentKind::Image {
            if let Err(e) = self.generate_thumbnail(&destination) {
                tracing::warn!("Thumbnail generation failed for {:?}: {}", destination, e);
            }
        }

        tracing::info!("Attached {} to note {} as {}", original_name, note_id, filename);

        Ok(Attachment {
            kind,
            filename,
            original_name,
            added: Utc::now(),
        })
    }

    /// Attach in-memory bytes (audio recordings, clipboard images)
    /// under the given display name.
    pub async fn attach_bytes(
        &self,
        note_id: &str,
        original_name: &str,
        data: &[u8],
    ) -> Result<Attachment> {
        let dir = self.ensure_dir(note_id).await?;
        let filename = unique_destination(&dir, &sanitize_filename(original_name)).await;
        let destination = dir.join(&filename);

        fs::write(&destination, data)
            .await
            .map_err(|e| AppError::AttachmentIo(format!("write {:?}: {}", destination, e)))?;

        let kind = classify(&filename);
        if kind == AttachmentKind::Image {
            if let Err(e) = self.generate_thumbnail(&destination) {
                tracing::warn!("Thumbnail generation failed for {:?}: {}", destination, e);
            }
        }

        Ok(Attachment {
            kind,
            filename,
            original_name: original_name.to_string(),
            added: Utc::now(),
        })
    }

    /// Delete an attachment's backing file and, for images, its
    /// thumbnail.
    ///
    /// A missing file is logged and treated as already deleted; any
    /// other failure is an `AttachmentIo` error and the caller must keep
    /// the record to avoid orphaned references.
    pub async fn remove(&self, note_id: &str, attachment: &Attachment) -> Result<()> {
        let dir = self.note_dir(note_id);
        remove_file_logged(&dir.join(&attachment.filename)).await?;

        if attachment.kind == AttachmentKind::Image {
            let thumb = thumbnail_path(&dir.join(&attachment.filename));
            if let Err(e) = remove_file_logged(&thumb).await {
                // A stale thumbnail is not worth keeping the record for.
                tracing::warn!("Failed to delete thumbnail {:?}: {}", thumb, e);
            }
        }

        tracing::info!("Deleted attachment {} of note {}", attachment.filename, note_id);
        Ok(())
    }

    /// Copy attachments from one note's directory into another's under
    /// fresh timestamped names.
    ///
    /// Returns the new records and the old -> new filename map the
    /// caller uses to rewrite image references. Missing source files
    /// are logged and skipped.
    pub async fn duplicate(
        &self,
        source_note_id: &str,
        target_note_id: &str,
        attachments: &[Attachment],
    ) -> Result<(Vec<Attachment>, HashMap<String, String>)> {
        let source_dir = self.note_dir(source_note_id);
        let target_dir = self.ensure_dir(target_note_id).await?;

        let mut copies = Vec::new();
        let mut filename_map = HashMap::new();

        for attachment in attachments {
            let source_file = source_dir.join(&attachment.filename);
            if !fs::try_exists(&source_file).await.unwrap_or(false) {
                tracing::warn!("Attachment file missing, skipping: {:?}", source_file);
                continue;
            }

            let new_filename =
                unique_destination(&target_dir, &sanitize_filename(&attachment.filename)).await;
            let target_file = target_dir.join(&new_filename);

            if let Err(e) = fs::copy(&source_file, &target_file).await {
                tracing::error!("Failed to copy {:?}: {}", source_file, e);
                continue;
            }

            if attachment.kind == AttachmentKind::Image {
                let source_thumb = thumbnail_path(&source_file);
                let target_thumb = thumbnail_path(&target_file);
                if fs::try_exists(&source_thumb).await.unwrap_or(false) {
                    if let Err(e) = fs::copy(&source_thumb, &target_thumb).await {
                        tracing::error!("Failed to copy thumbnail {:?}: {}", source_thumb, e);
                    }
                } else if let Err(e) = self.generate_thumbnail(&target_file) {
                    tracing::warn!("Thumbnail regeneration failed for {:?}: {}", target_file, e);
                }
            }

            filename_map.insert(attachment.filename.clone(), new_filename.clone());
            copies.push(Attachment {
                kind: attachment.kind,
                filename: new_filename,
                original_name: attachment.original_name.clone(),
                added: Utc::now(),
            });
        }

        tracing::info!(
            "Duplicated {} attachments from note {} to note {}",
            copies.len(),
            source_note_id,
            target_note_id
        );
        Ok((copies, filename_map))
    }

    /// Remove a note's whole attachment tree. Non-fatal if absent.
    pub async fn delete_all(&self, note_id: &str) {
        let dir = self.note_dir(note_id);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => tracing::info!("Removed attachment directory {:?}", dir),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::error!("Failed to remove attachment directory {:?}: {}", dir, e),
        }
    }

    /// Generate (or regenerate) the thumbnail for an image file.
    ///
    /// The thumbnail keeps aspect ratio within the configured bound and
    /// is always written as PNG next to the original.
    pub fn generate_thumbnail(&self, image_path: &Path) -> Result<PathBuf> {
        let thumb_path = thumbnail_path(image_path);
        let img = image::open(image_path)?;

        let thumb = if img.width() > THUMBNAIL_MAX_PX || img.height() > THUMBNAIL_MAX_PX {
            img.resize(
                THUMBNAIL_MAX_PX,
                THUMBNAIL_MAX_PX,
                image::imageops::FilterType::Lanczos3,
            )
        } else {
            img
        };

        thumb.save(&thumb_path)?;
        tracing::debug!("Thumbnail written: {:?}", thumb_path);
        Ok(thumb_path)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ImageResolver for AttachmentStore {
    fn resolve_thumbnail(&self, note_id: &str, filename: &str) -> Result<PathBuf> {
        let original = self.note_dir(note_id).join(filename);
        let thumb = thumbnail_path(&original);
        if thumb.exists() {
            return Ok(thumb);
        }
        if original.exists() {
            return self.generate_thumbnail(&original);
        }
        Err(AppError::MissingFile(original))
    }
}

/// Thumbnail path for an original: `<basename>_thumb.png` alongside it.
pub fn thumbnail_path(original: &Path) -> PathBuf {
    let stem = original
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("attachment");
    original.with_file_name(format!("{stem}{THUMBNAIL_SUFFIX}"))
}

/// Strip everything outside `[A-Za-z0-9_.-]` and cap the length,
/// preserving the extension when truncating.
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();

    let cleaned = if cleaned.trim_matches('.').is_empty() {
        "attachment".to_string()
    } else {
        cleaned
    };

    if cleaned.len() <= MAX_SANITIZED_NAME_LEN {
        return cleaned;
    }

    match cleaned.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() < MAX_SANITIZED_NAME_LEN => {
            let keep = MAX_SANITIZED_NAME_LEN - ext.len() - 1;
            format!("{}.{}", &stem[..keep.min(stem.len())], ext)
        }
        _ => cleaned[..MAX_SANITIZED_NAME_LEN].to_string(),
    }
}

/// Classify an attachment by its extension.
pub fn classify(filename: &str) -> AttachmentKind {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        AttachmentKind::Image
    } else if AUDIO_EXTENSIONS.contains(&ext.as_str()) {
        AttachmentKind::Audio
    } else {
        AttachmentKind::File
    }
}

/// Timestamp-prefixed filename that does not collide with an existing
/// file in `dir`.
async fn unique_destination(dir: &Path, safe_name: &str) -> String {
    let timestamp = Utc::now().format(ATTACHMENT_TIMESTAMP_FORMAT);
    let mut candidate = format!("{timestamp}_{safe_name}");
    let mut counter = 1;
    while fs::try_exists(&dir.join(&candidate)).await.unwrap_or(false) {
        candidate = format!("{timestamp}_{counter}_{safe_name}");
        counter += 1;
    }
    candidate
}

async fn remove_file_logged(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("File already missing: {:?}", path);
            Ok(())
        }
        Err(e) => Err(AppError::AttachmentIo(format!("delete {:?}: {}", path, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (AttachmentStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let store = AttachmentStore::new(temp.path().join("attachments"));
        (store, temp)
    }

    fn write_test_png(path: &Path) {
        let img = image::RgbImage::from_pixel(400, 200, image::Rgb([10, 200, 30]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("normal.txt"), "normal.txt");
        assert_eq!(sanitize_filename("../../etc/passwd"), "....etcpasswd");
        assert_eq!(sanitize_filename("ws paper (final).pdf"), "wspaperfinal.pdf");
        assert_eq!(sanitize_filename("///"), "attachment");

        let long = format!("{}.png", "a".repeat(100));
        let sanitized = sanitize_filename(&long);
        assert_eq!(sanitized.len(), MAX_SANITIZED_NAME_LEN);
        assert!(sanitized.ends_with(".png"));
    }

    #[test]
    fn test_classify() {
        assert_eq!(classify("a.PNG"), AttachmentKind::Image);
        assert_eq!(classify("b.mp3"), AttachmentKind::Audio);
        assert_eq!(classify("c.pdf"), AttachmentKind::File);
        assert_eq!(classify("noext"), AttachmentKind::File);
    }

    #[tokio::test]
    async fn test_ensure_dir_idempotent() {
        let (store, _temp) = test_store();
        let first = store.ensure_dir("7").await.unwrap();
        let second = store.ensure_dir("7").await.unwrap();
        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[tokio::test]
    async fn test_attach_copies_and_classifies() {
        let (store, temp) = test_store();
        let source = temp.path().join("report.pdf");
        std::fs::write(&source, b"pdf bytes").unwrap();

        let attachment = store.attach("1", &source).await.unwrap();
        assert_eq!(attachment.kind, AttachmentKind::File);
        assert_eq!(attachment.original_name, "report.pdf");
        assert!(attachment.filename.ends_with("_report.pdf"));

        let copied = std::fs::read(store.note_dir("1").join(&attachment.filename)).unwrap();
        assert_eq!(copied, b"pdf bytes");
    }

    #[tokio::test]
    async fn test_attach_image_generates_thumbnail() {
        let (store, temp) = test_store();
        let source = temp.path().join("photo.png");
        write_test_png(&source);

        let attachment = store.attach("1", &source).await.unwrap();
        assert_eq!(attachment.kind, AttachmentKind::Image);

        let thumb = thumbnail_path(&store.note_dir("1").join(&attachment.filename));
        assert!(thumb.exists());

        let img = image::open(&thumb).unwrap();
        assert!(img.width() <= THUMBNAIL_MAX_PX);
        assert!(img.height() <= THUMBNAIL_MAX_PX);
    }

    #[tokio::test]
    async fn test_attach_missing_source_fails_without_record() {
        let (store, temp) = test_store();
        let result = store.attach("1", &temp.path().join("nope.txt")).await;
        assert!(matches!(result, Err(AppError::AttachmentIo(_))));
    }

    #[tokio::test]
    async fn test_attach_collision_gets_fresh_name() {
        let (store, temp) = test_store();
        let source = temp.path().join("same.txt");
        std::fs::write(&source, b"x").unwrap();

        let first = store.attach("1", &source).await.unwrap();
        let second = store.attach("1", &source).await.unwrap();
        assert_ne!(first.filename, second.filename);
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_not_fatal() {
        let (store, _temp) = test_store();
        store.ensure_dir("1").await.unwrap();

        let attachment = Attachment {
            kind: AttachmentKind::File,
            filename: "gone.txt".to_string(),
            original_name: "gone.txt".to_string(),
            added: Utc::now(),
        };

        store.remove("1", &attachment).await.unwrap();
    }

    #[tokio::test]
    async fn test_remove_deletes_file_and_thumbnail() {
        let (store, temp) = test_store();
        let source = temp.path().join("pic.png");
        write_test_png(&source);

        let attachment = store.attach("1", &source).await.unwrap();
        let file = store.note_dir("1").join(&attachment.filename);
        let thumb = thumbnail_path(&file);
        assert!(file.exists() && thumb.exists());

        store.remove("1", &attachment).await.unwrap();
        assert!(!file.exists());
        assert!(!thumb.exists());
    }

    #[tokio::test]
    async fn test_duplicate_copies_bytes_and_maps_names() {
        let (store, temp) = test_store();
        let source = temp.path().join("data.bin");
        std::fs::write(&source, b"payload").unwrap();

        let attachment = store.attach("a", &source).await.unwrap();
        let (copies, map) = store
            .duplicate("a", "b", std::slice::from_ref(&attachment))
            .await
            .unwrap();

        assert_eq!(copies.len(), 1);
        let new_name = map.get(&attachment.filename).unwrap();
        assert_eq!(&copies[0].filename, new_name);

        let original = std::fs::read(store.note_dir("a").join(&attachment.filename)).unwrap();
        let copy = std::fs::read(store.note_dir("b").join(new_name)).unwrap();
        assert_eq!(original, copy);
    }

    #[tokio::test]
    async fn test_delete_all_removes_tree() {
        let (store, temp) = test_store();
        let source = temp.path().join("f.txt");
        std::fs::write(&source, b"x").unwrap();
        store.attach("1", &source).await.unwrap();

        store.delete_all("1").await;
        assert!(!store.note_dir("1").exists());

        // Absent directory is fine.
        store.delete_all("1").await;
    }

    #[tokio::test]
    async fn test_resolve_thumbnail_regenerates_and_reports_missing() {
        let (store, temp) = test_store();
        let source = temp.path().join("pic.png");
        write_test_png(&source);
        let attachment = store.attach("1", &source).await.unwrap();

        let file = store.note_dir("1").join(&attachment.filename);
        std::fs::remove_file(thumbnail_path(&file)).unwrap();

        // Regenerated from the original on demand.
        let thumb = store.resolve_thumbnail("1", &attachment.filename).unwrap();
        assert!(thumb.exists());

        // Missing original is a MissingFile error.
        let err = store.resolve_thumbnail("1", "absent.png").unwrap_err();
        assert!(matches!(err, AppError::MissingFile(_)));
    }
}
