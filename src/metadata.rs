//! Atlas metadata emission.
//!
//! Cells come out of the packer in placement order, which follows resolution
//! order rather than the canonical identifier order. Before writing, cells
//! are re-sorted to the canonical order; anything the canonical list does
//! not mention is appended afterwards in its original relative order.
//!
//! # Output Format
//!
//! ```json
//! [
//!     {
//!         "name": "Stone",
//!         "id": "stone",
//!         "type": "block",
//!         "offsetX": 0,
//!         "offsetY": 0
//!     }
//! ]
//! ```

use crate::atlas::AtlasCell;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Indentation used for the metadata file
const INDENT: &[u8] = b"    ";

/// Errors writing metadata
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to write metadata {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize metadata: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reorder cells to follow `canonical`, appending surplus cells afterwards.
///
/// When several cells share an identifier only the first is kept.
pub fn order_cells(cells: Vec<AtlasCell>, canonical: &[String]) -> Vec<AtlasCell> {
    let canonical_set: HashSet<&str> = canonical.iter().map(String::as_str).collect();
    let mut by_id: HashMap<String, AtlasCell> = HashMap::with_capacity(cells.len());
    let mut surplus = Vec::new();
    let mut surplus_seen: HashSet<String> = HashSet::new();

    for cell in cells {
        if canonical_set.contains(cell.identifier.as_str()) {
            by_id.entry(cell.identifier.clone()).or_insert(cell);
        } else if surplus_seen.insert(cell.identifier.clone()) {
            surplus.push(cell);
        }
    }

    let mut ordered = Vec::with_capacity(by_id.len() + surplus.len());
    for id in canonical {
        if let Some(cell) = by_id.remove(id) {
            ordered.push(cell);
        }
    }
    ordered.extend(surplus);
    ordered
}

/// Serialize cells as an indented JSON array.
pub fn metadata_to_string(cells: &[AtlasCell]) -> Result<String, MetadataError> {
    let mut buffer = Vec::new();
    let formatter = PrettyFormatter::with_indent(INDENT);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    cells.serialize(&mut serializer)?;
    // serde_json only emits valid UTF-8
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

/// Write cells to `path`, creating parent directories as needed.
pub fn write_metadata(path: &Path, cells: &[AtlasCell]) -> Result<(), MetadataError> {
    let json = metadata_to_string(cells)?;
    let io_err = |source| MetadataError::Io { path: path.display().to_string(), source };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
    }
    fs::write(path, json + "\n").map_err(io_err)
}
