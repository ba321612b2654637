//! Application configuration constants
//!
//! Central location for configuration constants, resource limits,
//! and validation boundaries used throughout the core.

// ===== Autosave =====

/// Default autosave debounce delay in milliseconds.
/// Edits arriving within this window re-arm the timer; only the last
/// one triggers a save.
pub const AUTOSAVE_DELAY_MS: u64 = 3_000;

// ===== Attachments =====

/// Maximum length of a sanitized attachment filename (without the
/// timestamp prefix). Longer names are truncated.
pub const MAX_SANITIZED_NAME_LEN: usize = 50;

/// Timestamp prefix applied to every stored attachment filename.
pub const ATTACHMENT_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Extensions classified as images (thumbnails are generated for these).
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "tiff"];

/// Extensions classified as audio.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg"];

// ===== Thumbnails =====

/// Maximum thumbnail edge in pixels. Thumbnails keep aspect ratio and
/// never exceed this in either dimension.
pub const THUMBNAIL_MAX_PX: u32 = 300;

/// Suffix appended to an attachment's basename for its thumbnail file.
pub const THUMBNAIL_SUFFIX: &str = "_thumb.png";

// ===== Reminders =====

/// Interval between reminder polls in seconds.
pub const REMINDER_POLL_SECS: u64 = 60;

// ===== Audio capture =====

/// Sample rate of captured audio in Hz.
pub const AUDIO_SAMPLE_RATE: u32 = 44_100;

/// Bits per captured audio sample.
pub const AUDIO_BITS_PER_SAMPLE: u16 = 16;

/// Number of captured audio channels (mono).
pub const AUDIO_CHANNELS: u16 = 1;
