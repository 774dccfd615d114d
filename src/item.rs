//! Core data types shared by the resolver, packer and metadata emitter.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which registry an identifier was resolved against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Resolved through an `item.*` translation key (also the fallback)
    #[default]
    Item,
    /// Resolved through a `block.*` translation key
    Block,
}

impl Category {
    /// Translation key prefix used by the game's localization table.
    pub fn key_prefix(self) -> &'static str {
        match self {
            Category::Item => "item",
            Category::Block => "block",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_prefix())
    }
}

/// One identifier after name and icon resolution.
///
/// Unresolved fields stay `None`; the record is never dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub identifier: String,
    pub display_name: Option<String>,
    pub category: Category,
    pub image_bytes: Option<Vec<u8>>,
}

impl ItemRecord {
    /// A record with nothing resolved yet.
    pub fn unresolved(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: None,
            category: Category::default(),
            image_bytes: None,
        }
    }

    pub fn has_icon(&self) -> bool {
        self.image_bytes.is_some()
    }
}

/// A normalized, fixed-size icon ready to be packed.
#[derive(Debug, Clone)]
pub struct Tile {
    pub identifier: String,
    pub display_name: Option<String>,
    pub category: Category,
    pub image: RgbaImage,
}
