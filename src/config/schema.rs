//! Configuration schema types for `itematlas.toml`
//!
//! Every section and field has a default, so an empty file (or no file at
//! all) describes the standard run: read the registration source under
//! `src/`, pull names and icons from the client archive and the wiki, and
//! write `atlas.png` plus `atlas_metadata.json` into the working directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output file locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory both outputs are written into
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
    /// Atlas image file name
    #[serde(default = "default_image_name")]
    pub image: String,
    /// Metadata file name
    #[serde(default = "default_metadata_name")]
    pub metadata: String,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_image_name() -> String {
    "atlas.png".to_string()
}

fn default_metadata_name() -> String {
    "atlas_metadata.json".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { dir: default_output_dir(), image: default_image_name(), metadata: default_metadata_name() }
    }
}

/// Atlas geometry and resolution parallelism
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// Side length of one square tile in pixels
    #[serde(default = "default_tile_size")]
    pub tile_size: u32,
    /// Number of resolution workers
    #[serde(default = "default_workers")]
    pub workers: usize,
}

/// Largest accepted `atlas.tile_size`
pub const MAX_TILE_SIZE: u32 = 1024;

fn default_tile_size() -> u32 {
    64
}

fn default_workers() -> usize {
    crate::resolve::DEFAULT_WORKERS
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self { tile_size: default_tile_size(), workers: default_workers() }
    }
}

/// Where the registration source lives and how to produce it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Glob, relative to the root, locating the registration source
    #[serde(default = "default_source_pattern")]
    pub pattern: String,
    /// Command run once when the source is missing; `{jar}` and `{out}` are substituted
    #[serde(default)]
    pub decompile: Vec<String>,
}

fn default_source_pattern() -> String {
    "src/**/CreativeModeTabs.java".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { pattern: default_source_pattern(), decompile: Vec::new() }
    }
}

/// Client archive provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Fail the run when no archive can be located
    #[serde(default)]
    pub required: bool,
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,
    /// Glob, relative to the root, for an already downloaded archive
    #[serde(default = "default_local_pattern")]
    pub local_pattern: String,
    /// Pin a version instead of the latest release
    #[serde(default)]
    pub version: Option<String>,
}

fn default_true() -> bool {
    true
}

fn default_manifest_url() -> String {
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json".to_string()
}

fn default_local_pattern() -> String {
    "versions/*/client.jar".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            required: false,
            manifest_url: default_manifest_url(),
            local_pattern: default_local_pattern(),
            version: None,
        }
    }
}

/// Wiki catalog and spawn egg sheet settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_wiki_base")]
    pub base_url: String,
    /// Cut spawn egg icons out of the wiki sprite sheet
    #[serde(default = "default_true")]
    pub spawn_eggs: bool,
}

fn default_wiki_base() -> String {
    "https://minecraft.wiki".to_string()
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self { enabled: true, base_url: default_wiki_base(), spawn_eggs: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CatalogConfig {
    /// Append catalog identifiers missing from the registration source
    #[serde(default)]
    pub include_unlisted: bool,
}

/// Shared HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after a transport error or 5xx response
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> u32 {
    1
}

fn default_user_agent() -> String {
    format!("itematlas/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: default_timeout_secs(), retries: default_retries(), user_agent: default_user_agent() }
    }
}

/// Complete itematlas.toml configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AtlasToolConfig {
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub atlas: AtlasConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub wiki: WikiConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "atlas.tile_size")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "itematlas.toml: '{}' {}", self.field, self.message)
    }
}

impl AtlasToolConfig {
    /// Validate the configuration and return every problem found
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();
        let mut fail = |field: &str, message: &str| {
            errors.push(ConfigValidationError { field: field.to_string(), message: message.to_string() });
        };

        if self.atlas.tile_size == 0 {
            fail("atlas.tile_size", "must be a positive integer");
        } else if self.atlas.tile_size > MAX_TILE_SIZE {
            fail("atlas.tile_size", &format!("must be at most {}", MAX_TILE_SIZE));
        }
        if self.atlas.workers == 0 {
            fail("atlas.workers", "must be a positive integer");
        }
        if self.output.image.trim().is_empty() {
            fail("output.image", "must be a non-empty file name");
        }
        if self.output.metadata.trim().is_empty() {
            fail("output.metadata", "must be a non-empty file name");
        }
        if self.output.image == self.output.metadata {
            fail("output.metadata", "must differ from output.image");
        }
        if self.source.pattern.trim().is_empty() {
            fail("source.pattern", "must be a non-empty glob pattern");
        }
        if self.http.timeout_secs == 0 {
            fail("http.timeout_secs", "must be a positive integer");
        }
        if self.archive.enabled && self.archive.local_pattern.trim().is_empty() {
            fail("archive.local_pattern", "must be a non-empty glob pattern");
        }

        errors
    }
}
