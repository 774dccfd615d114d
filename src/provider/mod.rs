//! Data providers for item names and icons.
//!
//! A provider answers two questions about an identifier: what is it called,
//! and what does its icon look like. The resolver asks every registered
//! provider in order and takes the first answer, so providers only need to
//! implement the lookups they can actually serve.
//!
//! # Providers
//!
//! - [`ClientArchive`]: the game's client jar (localization table, textures)
//! - [`WikiCatalog`]: the wiki's item and block data-value tables
//! - [`SpawnEggSheet`]: spawn egg icons cropped out of a shared wiki sprite sheet

pub mod archive;
pub mod http;
pub mod manifest;
pub mod spawn_egg;
pub mod wiki;

pub use archive::ClientArchive;
pub use http::HttpClient;
pub use spawn_egg::SpawnEggSheet;
pub use wiki::{CatalogEntry, WikiCatalog};

use crate::item::Category;
use std::fmt;
use thiserror::Error;

/// Errors raised while talking to a data source.
///
/// These never cross the per-item boundary; the resolver turns them into
/// misses. They only surface when a provider itself cannot be built.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Transport-level HTTP failure
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// Non-success HTTP status
    #[error("request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    /// Zip archive could not be read
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),
    /// JSON payload could not be parsed
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// File system failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Payload had an unexpected shape
    #[error("{0}")]
    Format(String),
    /// A required resource does not exist
    #[error("{0} not found")]
    NotFound(String),
}

/// Key for a display name lookup: `<category>.minecraft.<identifier>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NameKey {
    pub category: Category,
    pub identifier: String,
}

impl NameKey {
    pub fn new(category: Category, identifier: impl Into<String>) -> Self {
        Self { category, identifier: identifier.into() }
    }

    /// Key used by the game's localization table
    pub fn translation_key(&self) -> String {
        format!("{}.minecraft.{}", self.category.key_prefix(), self.identifier)
    }
}

impl fmt::Display for NameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.translation_key())
    }
}

/// Key for an icon lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IconKey {
    /// A registry identifier such as `stone_bricks`
    Identifier(String),
    /// A wiki page title such as `Stone_Bricks`
    Title(String),
}

impl fmt::Display for IconKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconKey::Identifier(id) => write!(f, "id:{}", id),
            IconKey::Title(title) => write!(f, "title:{}", title),
        }
    }
}

/// A source of display names and icon bytes.
///
/// Implementations are shared across resolver threads and must only hold
/// read-only or internally synchronized state.
pub trait DataProvider: Send + Sync {
    /// Short name used in log messages
    fn label(&self) -> &str;

    /// Look up a display name, `None` when this provider does not know it.
    fn resolve_name(&self, _key: &NameKey) -> Option<String> {
        None
    }

    /// Fetch raw icon bytes, `None` when this provider has no icon for the key.
    fn fetch_icon(&self, _key: &IconKey) -> Option<Vec<u8>> {
        None
    }
}
