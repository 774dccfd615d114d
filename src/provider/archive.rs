//! The game's client archive as a data provider.
//!
//! The client jar is a zip file carrying the English localization table and
//! the flat item/block textures. It is the most authoritative source for
//! both names and icons, so it is registered ahead of the wiki.

use super::{DataProvider, IconKey, NameKey, ProviderError};
use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Mutex;
use zip::ZipArchive;

/// Localization table inside the client jar
pub const LANG_PATH: &str = "assets/minecraft/lang/en_us.json";
/// Directory holding item textures
pub const ITEM_TEXTURES: &str = "assets/minecraft/textures/item";
/// Directory holding block textures
pub const BLOCK_TEXTURES: &str = "assets/minecraft/textures/block";

/// Largest declared entry size trusted as an allocation hint
const MAX_SIZE_HINT: u64 = 1 << 20;

/// Read-only view of a client archive.
///
/// The zip reader needs `&mut` access to read entries, so the handle sits
/// behind a mutex. The localization table is parsed once when the archive is
/// opened and is immutable afterwards.
pub struct ClientArchive {
    archive: Mutex<ZipArchive<Cursor<Vec<u8>>>>,
    names: HashMap<String, String>,
    origin: String,
}

impl ClientArchive {
    /// Open a client archive from a file on disk.
    pub fn open(path: &Path) -> Result<Self, ProviderError> {
        let bytes = fs::read(path)?;
        Self::from_bytes(bytes, path.display().to_string())
    }

    /// Open a client archive held in memory.
    ///
    /// A missing localization table is allowed (no names will resolve); a
    /// malformed one is an error.
    pub fn from_bytes(bytes: Vec<u8>, origin: impl Into<String>) -> Result<Self, ProviderError> {
        let origin = origin.into();
        let mut archive = ZipArchive::new(Cursor::new(bytes))?;

        let names = match read_entry(&mut archive, LANG_PATH) {
            Some(raw) => parse_lang_table(&raw)?,
            None => {
                info!("{}: no localization table at {}", origin, LANG_PATH);
                HashMap::new()
            }
        };

        debug!("{}: {} entries, {} translations", origin, archive.len(), names.len());
        Ok(Self { archive: Mutex::new(archive), names, origin })
    }

    /// Where this archive was loaded from
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Look up a raw translation key such as `item.minecraft.stone`.
    pub fn translation(&self, key: &str) -> Option<&str> {
        self.names.get(key).map(String::as_str)
    }

    pub fn translation_count(&self) -> usize {
        self.names.len()
    }

    /// Read one entry by path, `None` when absent or unreadable.
    pub fn read(&self, path: &str) -> Option<Vec<u8>> {
        let mut archive = self.archive.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        read_entry(&mut archive, path)
    }

    /// Texture paths tried for an identifier, item textures first.
    pub fn texture_paths(identifier: &str) -> [String; 2] {
        [
            format!("{}/{}.png", ITEM_TEXTURES, identifier),
            format!("{}/{}.png", BLOCK_TEXTURES, identifier),
        ]
    }
}

impl DataProvider for ClientArchive {
    fn label(&self) -> &str {
        "client archive"
    }

    fn resolve_name(&self, key: &NameKey) -> Option<String> {
        self.translation(&key.translation_key()).map(str::to_string)
    }

    fn fetch_icon(&self, key: &IconKey) -> Option<Vec<u8>> {
        let IconKey::Identifier(identifier) = key else {
            return None;
        };
        Self::texture_paths(identifier).iter().find_map(|path| self.read(path))
    }
}

fn read_entry(archive: &mut ZipArchive<Cursor<Vec<u8>>>, path: &str) -> Option<Vec<u8>> {
    let mut file = archive.by_name(path).ok()?;
    // The header size is untrusted, so it only caps the hint
    let mut data = Vec::with_capacity(file.size().min(MAX_SIZE_HINT) as usize);
    file.read_to_end(&mut data).ok()?;
    Some(data)
}

/// Parse the localization JSON, keeping only string values.
fn parse_lang_table(raw: &[u8]) -> Result<HashMap<String, String>, ProviderError> {
    let value: serde_json::Value = serde_json::from_slice(raw)?;
    let object = value
        .as_object()
        .ok_or_else(|| ProviderError::Format(format!("{} is not a JSON object", LANG_PATH)))?;

    Ok(object
        .iter()
        .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::item::Category;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    /// Build an in-memory zip from (path, contents) pairs.
    pub(crate) fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, contents) in entries {
            writer.start_file(*path, FileOptions::default()).expect("start zip entry");
            writer.write_all(contents).expect("write zip entry");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    fn sample_archive() -> ClientArchive {
        let lang = br#"{"item.minecraft.apple": "Apple", "block.minecraft.stone": "Stone", "pack.count": 3}"#;
        let bytes = build_zip(&[
            (LANG_PATH, lang),
            ("assets/minecraft/textures/item/apple.png", b"apple-png"),
            ("assets/minecraft/textures/block/stone.png", b"stone-png"),
            ("assets/minecraft/textures/item/stone.png", b"stone-item-png"),
        ]);
        ClientArchive::from_bytes(bytes, "memory").expect("archive should open")
    }

    #[test]
    fn test_resolves_names_by_category() {
        let archive = sample_archive();
        assert_eq!(
            archive.resolve_name(&NameKey::new(Category::Item, "apple")),
            Some("Apple".to_string())
        );
        assert_eq!(
            archive.resolve_name(&NameKey::new(Category::Block, "stone")),
            Some("Stone".to_string())
        );
        assert_eq!(archive.resolve_name(&NameKey::new(Category::Item, "stone")), None);
    }

    #[test]
    fn test_non_string_translations_are_skipped() {
        let archive = sample_archive();
        assert_eq!(archive.translation_count(), 2);
        assert_eq!(archive.translation("pack.count"), None);
    }

    #[test]
    fn test_item_texture_preferred_over_block() {
        let archive = sample_archive();
        assert_eq!(
            archive.fetch_icon(&IconKey::Identifier("stone".into())),
            Some(b"stone-item-png".to_vec())
        );
        assert_eq!(
            archive.fetch_icon(&IconKey::Identifier("apple".into())),
            Some(b"apple-png".to_vec())
        );
    }

    #[test]
    fn test_entry_larger_than_size_hint() {
        let big: Vec<u8> = (0..(MAX_SIZE_HINT as usize * 3 + 7)).map(|i| (i % 251) as u8).collect();
        let bytes = build_zip(&[("assets/minecraft/textures/block/big.png", &big)]);
        let archive = ClientArchive::from_bytes(bytes, "memory").expect("archive should open");

        let read = archive.read("assets/minecraft/textures/block/big.png").expect("entry should read");
        assert_eq!(read.len(), big.len());
        assert_eq!(read, big);
    }

    #[test]
    fn test_missing_texture_and_title_keys_miss() {
        let archive = sample_archive();
        assert_eq!(archive.fetch_icon(&IconKey::Identifier("dirt".into())), None);
        assert_eq!(archive.fetch_icon(&IconKey::Title("Apple".into())), None);
    }

    #[test]
    fn test_archive_without_lang_table() {
        let bytes = build_zip(&[("assets/minecraft/textures/item/apple.png", b"x")]);
        let archive = ClientArchive::from_bytes(bytes, "memory").unwrap();
        assert_eq!(archive.translation_count(), 0);
        assert!(archive.fetch_icon(&IconKey::Identifier("apple".into())).is_some());
    }

    #[test]
    fn test_malformed_lang_table_is_error() {
        let bytes = build_zip(&[(LANG_PATH, b"[1, 2, 3]")]);
        assert!(matches!(
            ClientArchive::from_bytes(bytes, "memory"),
            Err(ProviderError::Format(_))
        ));
    }

    #[test]
    fn test_not_a_zip_is_error() {
        assert!(matches!(
            ClientArchive::from_bytes(b"plain text".to_vec(), "memory"),
            Err(ProviderError::Zip(_))
        ));
    }

    #[test]
    fn test_concurrent_reads() {
        let archive = std::sync::Arc::new(sample_archive());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let archive = archive.clone();
                std::thread::spawn(move || archive.read("assets/minecraft/textures/item/apple.png"))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(b"apple-png".to_vec()));
        }
    }
}
