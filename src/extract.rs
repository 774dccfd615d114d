//! Identifier extraction from creative-tab registration source.
//!
//! The game registers each creative tab with a statement of the shape
//! `Registry.register(registry, BUILDING_BLOCKS, ...)` and fills it with
//! `output.accept(Items.STONE)` calls. This module walks those statements in
//! textual order and produces the canonical identifier list.
//!
//! Matching source code with regexes is fragile, so the input contract is
//! narrow: text without a single accept statement is rejected rather than
//! treated as an empty list.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// One statement regex so category and accept matches interleave in source order.
static STATEMENT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"Registry\.register\(\s*[\w.]+\s*,\s*(?P<category>[A-Z][A-Z0-9_]*)\s*,|output\.accept\(\s*(?:\(\w+\)\s*)?(?:Items|Blocks)\.(?P<item>[A-Z][A-Z0-9_]*)\s*[,)]",
    )
    .expect("valid statement regex")
});

/// Errors produced while extracting identifiers
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The source file could not be read
    #[error("failed to read identifier source {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// The text contained no item accept statements
    #[error("no `output.accept(Items.*)` statements found in {origin}")]
    NoMatches { origin: String },
}

/// Identifiers registered under one creative tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryGroup {
    /// Tab constant in lower case, `None` for accepts seen before any tab
    pub name: Option<String>,
    pub identifiers: Vec<String>,
}

/// Result of extraction: grouped identifiers plus the flat canonical order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExtractedIdentifiers {
    pub groups: Vec<CategoryGroup>,
    pub ordered: Vec<String>,
}

impl ExtractedIdentifiers {
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

/// Extract identifiers from registration source text.
///
/// `origin` names the text in error messages (usually the file path).
pub fn extract_identifiers(text: &str, origin: &str) -> Result<ExtractedIdentifiers, ExtractError> {
    let mut result = ExtractedIdentifiers::default();
    let mut seen: HashSet<String> = HashSet::new();

    for caps in STATEMENT_RE.captures_iter(text) {
        if let Some(category) = caps.name("category") {
            result.groups.push(CategoryGroup {
                name: Some(category.as_str().to_lowercase()),
                identifiers: Vec::new(),
            });
            continue;
        }

        let Some(item) = caps.name("item") else {
            continue;
        };
        let id = item.as_str().to_lowercase();
        if !seen.insert(id.clone()) {
            continue;
        }

        if result.groups.is_empty() {
            result.groups.push(CategoryGroup { name: None, identifiers: Vec::new() });
        }
        if let Some(group) = result.groups.last_mut() {
            group.identifiers.push(id.clone());
        }
        result.ordered.push(id);
    }

    if result.ordered.is_empty() {
        return Err(ExtractError::NoMatches { origin: origin.to_string() });
    }

    Ok(result)
}

/// Read a source file and extract its identifiers.
pub fn extract_from_file(path: &Path) -> Result<ExtractedIdentifiers, ExtractError> {
    let text = fs::read_to_string(path).map_err(|source| ExtractError::Read {
        path: path.display().to_string(),
        source,
    })?;
    extract_identifiers(&text, &path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABS_SOURCE: &str = r#"
public class CreativeModeTabs {
    public static CreativeModeTab bootstrap(Registry<CreativeModeTab> registry) {
        Registry.register(registry, BUILDING_BLOCKS, CreativeModeTab.builder(CreativeModeTab.Row.TOP, 0)
            .displayItems((params, output) -> {
                output.accept(Items.STONE);
                output.accept(Items.DIRT);
            }).build());
        Registry.register(registry, NATURAL_BLOCKS, CreativeModeTab.builder(CreativeModeTab.Row.TOP, 1)
            .displayItems((params, output) -> {
                output.accept(Items.GRASS_BLOCK);
                output.accept(Items.DIRT);
                output.accept((ItemLike)Items.OAK_LOG);
                output.accept(Items.PAINTING, CreativeModeTab.TabVisibility.PARENT_TAB_ONLY);
            }).build());
    }
}
"#;

    #[test]
    fn test_extract_groups_by_category() {
        let result = extract_identifiers(TABS_SOURCE, "test").unwrap();
        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.groups[0].name.as_deref(), Some("building_blocks"));
        assert_eq!(result.groups[0].identifiers, vec!["stone", "dirt"]);
        assert_eq!(result.groups[1].name.as_deref(), Some("natural_blocks"));
        assert_eq!(result.groups[1].identifiers, vec!["grass_block", "oak_log", "painting"]);
    }

    #[test]
    fn test_extract_dedup_keeps_first_occurrence() {
        let text = "output.accept(Items.STONE);\noutput.accept(Items.DIRT);\noutput.accept(Items.STONE);";
        let result = extract_identifiers(text, "test").unwrap();
        assert_eq!(result.ordered, vec!["stone", "dirt"]);
    }

    #[test]
    fn test_extract_ordered_matches_groups() {
        let result = extract_identifiers(TABS_SOURCE, "test").unwrap();
        let flattened: Vec<String> =
            result.groups.iter().flat_map(|g| g.identifiers.clone()).collect();
        assert_eq!(result.ordered, flattened);
        assert_eq!(result.len(), 5);
    }

    #[test]
    fn test_extract_without_category_collects_top_level() {
        let text = "output.accept(Items.APPLE);";
        let result = extract_identifiers(text, "test").unwrap();
        assert_eq!(result.groups.len(), 1);
        assert_eq!(result.groups[0].name, None);
        assert_eq!(result.ordered, vec!["apple"]);
    }

    #[test]
    fn test_extract_no_matches_is_error() {
        let result = extract_identifiers("class Empty {}", "Empty.java");
        match result {
            Err(ExtractError::NoMatches { origin }) => assert_eq!(origin, "Empty.java"),
            other => panic!("expected NoMatches, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_category_only_is_error() {
        let text = "Registry.register(registry, COMBAT, CreativeModeTab.builder());";
        assert!(matches!(extract_identifiers(text, "t"), Err(ExtractError::NoMatches { .. })));
    }

    #[test]
    fn test_extract_from_missing_file() {
        let result = extract_from_file(Path::new("/nonexistent/CreativeModeTabs.java"));
        assert!(matches!(result, Err(ExtractError::Read { .. })));
    }
}
