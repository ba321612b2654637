//! Tag identifiers and the tag registry
//!
//! Style tags are structured values (`TagId`), serialized to a stable
//! string only at the JSON boundary (`bold`, `color_#RRGGBB`, `size_14`).
//! The registry maps tag ids to rendering attributes and holds the
//! dynamic color tags a note declares. `TagId` derives `Ord`, which fixes
//! the flush and render precedence deterministically.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#RRGGBB` hex string.
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Identifier of a style tag applicable to a text range.
///
/// The `Ord` derive (declaration order, then payload) is the canonical
/// tag ordering used everywhere a tag set is flushed or replayed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TagId {
    Bold,
    Italic,
    Underline,
    Highlight,
    Color(Rgb),
    Size(u8),
    /// Hyperlink marker; the bound URL lives on the content item.
    Link,
    /// File-link marker bound to an attachment filename.
    FileLink(String),
}

impl TagId {
    /// Stable string form used in persisted JSON.
    pub fn name(&self) -> String {
        match self {
            TagId::Bold => "bold".to_string(),
            TagId::Italic => "italic".to_string(),
            TagId::Underline => "underline".to_string(),
            TagId::Highlight => "highlight".to_string(),
            TagId::Color(rgb) => format!("color_{}", rgb),
            TagId::Size(pt) => format!("size_{}", pt),
            TagId::Link => "link".to_string(),
            TagId::FileLink(filename) => format!("filelink_{}", filename),
        }
    }

    /// Parse the stable string form back into a structured id.
    pub fn parse(name: &str) -> Option<TagId> {
        match name {
            "bold" => Some(TagId::Bold),
            "italic" => Some(TagId::Italic),
            "underline" => Some(TagId::Underline),
            "highlight" => Some(TagId::Highlight),
            "link" | "file_link" => Some(TagId::Link),
            _ => {
                if let Some(hex) = name.strip_prefix("color_") {
                    return Rgb::parse_hex(hex).map(TagId::Color);
                }
                if let Some(pt) = name.strip_prefix("size_") {
                    return pt.parse::<u8>().ok().map(TagId::Size);
                }
                if let Some(filename) = name.strip_prefix("filelink_") {
                    return Some(TagId::FileLink(filename.to_string()));
                }
                None
            }
        }
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl Serialize for TagId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.name())
    }
}

impl<'de> Deserialize<'de> for TagId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        TagId::parse(&name).ok_or_else(|| D::Error::custom(format!("unknown tag: {}", name)))
    }
}

/// Font weight attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// Font slant attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontSlant {
    #[default]
    Roman,
    Italic,
}

/// Rendering attributes bound to a tag id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagAttrs {
    pub weight: FontWeight,
    pub slant: FontSlant,
    pub underline: bool,
    pub foreground: Option<Rgb>,
    pub background: Option<Rgb>,
    pub point_size: Option<u8>,
}

/// Registry of tag ids to rendering attributes.
///
/// Pure data: the renderer looks attributes up here and hands them to the
/// surface adapter. Structural tags (`Color`, `Size`) resolve even when
/// never registered; dynamic color tags from a note are pre-loaded via
/// [`TagRegistry::load_note_colors`].
#[derive(Debug, Clone, Default)]
pub struct TagRegistry {
    tags: BTreeMap<TagId, TagAttrs>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in style tags configured.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(
            TagId::Bold,
            TagAttrs {
                weight: FontWeight::Bold,
                ..TagAttrs::default()
            },
        );
        registry.register(
            TagId::Italic,
            TagAttrs {
                slant: FontSlant::Italic,
                ..TagAttrs::default()
            },
        );
        registry.register(
            TagId::Underline,
            TagAttrs {
                underline: true,
                ..TagAttrs::default()
            },
        );
        registry.register(
            TagId::Highlight,
            TagAttrs {
                background: Some(Rgb::new(0xff, 0xff, 0x00)),
                ..TagAttrs::default()
            },
        );
        registry.register(
            TagId::Link,
            TagAttrs {
                underline: true,
                foreground: Some(Rgb::new(0x00, 0x00, 0xff)),
                ..TagAttrs::default()
            },
        );
        registry
    }

    pub fn register(&mut self, id: TagId, attrs: TagAttrs) {
        self.tags.insert(id, attrs);
    }

    /// Register a dynamic color tag named by its color value.
    pub fn register_color(&mut self, color: Rgb) -> TagId {
        let id = TagId::Color(color);
        self.register(
            id.clone(),
            TagAttrs {
                foreground: Some(color),
                ..TagAttrs::default()
            },
        );
        id
    }

    /// Pre-load a note's dynamic color tags (tag name -> `#RRGGBB`).
    ///
    /// Unparseable entries are logged and skipped; they cannot make a
    /// note fail to open.
    pub fn load_note_colors(&mut self, color_tags: &BTreeMap<String, String>) {
        for (name, hex) in color_tags {
            match (TagId::parse(name), Rgb::parse_hex(hex)) {
                (Some(TagId::Color(_)), Some(color)) => {
                    self.register_color(color);
                }
                _ => {
                    tracing::warn!("Skipping malformed color tag: {} -> {}", name, hex);
                }
            }
        }
    }

    /// Resolve attributes for a tag.
    ///
    /// Falls back to structural resolution for `Color`, `Size` and
    /// `FileLink`, so a well-formed tag always renders even when the
    /// registry was never told about it.
    pub fn attrs(&self, id: &TagId) -> Option<TagAttrs> {
        if let Some(attrs) = self.tags.get(id) {
            return Some(attrs.clone());
        }
        match id {
            TagId::Color(rgb) => Some(TagAttrs {
                foreground: Some(*rgb),
                ..TagAttrs::default()
            }),
            TagId::Size(pt) => Some(TagAttrs {
                point_size: Some(*pt),
                ..TagAttrs::default()
            }),
            TagId::FileLink(_) => Some(TagAttrs {
                underline: true,
                foreground: Some(Rgb::new(0x00, 0x00, 0xff)),
                ..TagAttrs::default()
            }),
            _ => None,
        }
    }

    pub fn contains(&self, id: &TagId) -> bool {
        self.tags.contains_key(id)
    }
}
