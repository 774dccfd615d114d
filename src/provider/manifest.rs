//! Locating the client archive, locally or through the version manifest.
//!
//! A previously downloaded archive under `versions/<id>/client.jar` is used
//! as-is. Otherwise the version manifest names the latest release (or the
//! pinned version), its version document carries the client download URL,
//! and the jar is downloaded into the same `versions/` layout so later runs
//! find it locally.

use super::{HttpClient, ProviderError};
use glob::glob;
use log::info;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Top-level version manifest document
#[derive(Debug, Clone, Deserialize)]
pub struct VersionManifest {
    pub latest: LatestVersions,
    pub versions: Vec<VersionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LatestVersions {
    pub release: String,
}

/// One version listed in the manifest
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub id: String,
    pub url: String,
}

/// Per-version document; only the download section is needed
#[derive(Debug, Clone, Deserialize)]
pub struct VersionDetails {
    pub downloads: Downloads,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Downloads {
    pub client: Download,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Download {
    pub url: String,
    #[serde(default)]
    pub size: Option<u64>,
}

impl VersionManifest {
    /// Find the entry for `version`, or the latest release when `None`.
    pub fn select(&self, version: Option<&str>) -> Result<&VersionEntry, ProviderError> {
        let wanted = version.unwrap_or(&self.latest.release);
        self.versions
            .iter()
            .find(|v| v.id == wanted)
            .ok_or_else(|| ProviderError::NotFound(format!("version '{}' in manifest", wanted)))
    }
}

/// Find an already downloaded archive matching `pattern` under `root`.
///
/// When several match, the lexicographically last path wins, which for
/// `versions/*/client.jar` favors the newest-looking version directory.
pub fn find_local_archive(root: &Path, pattern: &str) -> Option<PathBuf> {
    let full = root.join(pattern);
    let mut matches: Vec<PathBuf> = glob(&full.to_string_lossy()).ok()?.filter_map(Result::ok).collect();
    matches.sort();
    matches.pop()
}

/// Path a downloaded archive for `version` is cached at.
pub fn cache_path(root: &Path, version: &str) -> PathBuf {
    root.join("versions").join(version).join("client.jar")
}

/// Download the client archive described by the manifest into `root`.
pub fn download_client_archive(
    http: &HttpClient,
    manifest_url: &str,
    version: Option<&str>,
    root: &Path,
) -> Result<PathBuf, ProviderError> {
    info!("Fetching version manifest from {}", manifest_url);
    let manifest: VersionManifest = http.get_json(manifest_url)?;
    let entry = manifest.select(version)?;

    let details: VersionDetails = http.get_json(&entry.url)?;
    info!("Downloading client archive for {}", entry.id);
    let bytes = http.get_bytes(&details.downloads.client.url)?;

    if let Some(expected) = details.downloads.client.size {
        if bytes.len() as u64 != expected {
            return Err(ProviderError::Format(format!(
                "client archive for {} is {} bytes, manifest says {}",
                entry.id,
                bytes.len(),
                expected
            )));
        }
    }

    let path = cache_path(root, &entry.id);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&path, &bytes)?;
    Ok(path)
}

/// Locate the client archive: local copy first, then the manifest service.
///
/// `http` is `None` in offline mode, where only a local copy can be used.
pub fn locate_client_archive(
    http: Option<&HttpClient>,
    root: &Path,
    local_pattern: &str,
    manifest_url: &str,
    version: Option<&str>,
) -> Result<PathBuf, ProviderError> {
    if let Some(path) = find_local_archive(root, local_pattern) {
        info!("Using local client archive {}", path.display());
        return Ok(path);
    }

    match http {
        Some(http) => download_client_archive(http, manifest_url, version, root),
        None => Err(ProviderError::NotFound(format!(
            "client archive matching '{}' (offline)",
            local_pattern
        ))),
    }
}
