//! Wiki data-value tables as a data provider.
//!
//! The wiki publishes one table of block IDs and one of item IDs. Each row
//! names the identifier, its display name, and usually links an icon. The
//! tables are fetched through the wiki's parse API and scanned with a few
//! narrow regexes; the wiki markup is not a stable contract, so rows that do
//! not fit are skipped rather than failing the run.

use super::{DataProvider, HttpClient, IconKey, NameKey, ProviderError};
use crate::item::Category;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

static ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").expect("valid row regex"));
static CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<td[^>]*>(.*?)</td>").expect("valid cell regex"));
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]+>").expect("valid tag regex"));
static IMAGE_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a[^>]*href="([^"]+\.(?:png|gif|webp)[^"]*)""#).expect("valid link regex")
});
static DATA_SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<img[^>]*data-src="([^"]+)""#).expect("valid data-src regex"));
static SRC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<img[^>]*\ssrc="([^"]+)""#).expect("valid src regex"));

/// Page whose templates expand to the data-value tables
const DATA_VALUES_PAGE: &str = "Java_Edition_data_values";

/// Column layout of one data-value table.
#[derive(Debug, Clone, Copy)]
struct TableShape {
    description: &'static str,
    template: &'static str,
    category: Category,
    id_column: usize,
    name_column: usize,
    icon_column: usize,
}

const BLOCK_TABLE: TableShape = TableShape {
    description: "Block IDs",
    template: "Blocks",
    category: Category::Block,
    id_column: 1,
    name_column: 2,
    icon_column: 0,
};

const ITEM_TABLE: TableShape = TableShape {
    description: "Item IDs",
    template: "Items",
    category: Category::Item,
    id_column: 1,
    name_column: 0,
    icon_column: 0,
};

/// One row of a data-value table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub identifier: String,
    pub name: String,
    pub category: Category,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: ParseBody,
}

#[derive(Debug, Deserialize)]
struct ParseBody {
    text: ParseText,
}

#[derive(Debug, Deserialize)]
struct ParseText {
    #[serde(rename = "*")]
    html: String,
}

/// Wiki catalog of blocks and items.
pub struct WikiCatalog {
    http: Arc<HttpClient>,
    base_url: String,
    entries: Vec<CatalogEntry>,
    index: HashMap<(Category, String), usize>,
}

impl WikiCatalog {
    /// Fetch both data-value tables from the wiki.
    pub fn fetch(http: Arc<HttpClient>, base_url: &str) -> Result<Self, ProviderError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        let mut entries = Vec::new();

        for shape in [BLOCK_TABLE, ITEM_TABLE] {
            info!("Getting {} from the wiki...", shape.description);
            let response: ParseResponse = http.get_json(&table_url(&base_url, shape))?;
            let rows = parse_table(&response.parse.text.html, shape, &base_url);
            if rows.is_empty() {
                warn!("wiki table '{}' had no usable rows", shape.description);
            }
            entries.extend(rows);
        }

        Ok(Self::from_entries(http, &base_url, entries))
    }

    /// Build a catalog from already parsed entries.
    pub fn from_entries(http: Arc<HttpClient>, base_url: &str, entries: Vec<CatalogEntry>) -> Self {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            index.entry((entry.category, entry.identifier.clone())).or_insert(i);
        }

        Self { http, base_url: base_url.trim_end_matches('/').to_string(), entries, index }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Every identifier in the catalog, in table order, without duplicates.
    pub fn catalog_identifiers(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.entries
            .iter()
            .filter(|e| seen.insert(e.identifier.as_str()))
            .map(|e| e.identifier.clone())
            .collect()
    }

    fn entry(&self, category: Category, identifier: &str) -> Option<&CatalogEntry> {
        self.index.get(&(category, identifier.to_string())).map(|&i| &self.entries[i])
    }

    fn any_entry(&self, identifier: &str) -> Option<&CatalogEntry> {
        self.entry(Category::Item, identifier).or_else(|| self.entry(Category::Block, identifier))
    }

    /// Icon URL for a wiki title: `<base>/w/Special:FilePath/Invicon_<title>.png`
    pub fn title_icon_url(&self, title: &str) -> String {
        format!("{}/w/Special:FilePath/Invicon_{}.png", self.base_url, encode_title(title))
    }
}

impl DataProvider for WikiCatalog {
    fn label(&self) -> &str {
        "wiki"
    }

    fn resolve_name(&self, key: &NameKey) -> Option<String> {
        self.entry(key.category, &key.identifier).map(|e| e.name.clone())
    }

    fn fetch_icon(&self, key: &IconKey) -> Option<Vec<u8>> {
        let url = match key {
            IconKey::Identifier(id) => self.any_entry(id)?.image_url.clone()?,
            IconKey::Title(title) => self.title_icon_url(title),
        };
        debug!("wiki icon {} -> {}", key, url);
        self.http.try_get_bytes(&url)
    }
}

/// Parse API URL expanding one data-value template.
fn table_url(base_url: &str, shape: TableShape) -> String {
    format!(
        "{}/api.php?action=parse&format=json&prop=text&title={}&text=%7B%7B%3AJava%20Edition%20data%20values%2F{}%7D%7D",
        base_url, DATA_VALUES_PAGE, shape.template
    )
}

/// Extract the rows of the table with the given `data-description`.
fn parse_table(html: &str, shape: TableShape, base_url: &str) -> Vec<CatalogEntry> {
    let Some(table) = find_table(html, shape.description) else {
        return Vec::new();
    };

    ROW_RE
        .captures_iter(table)
        .filter_map(|row| {
            let cells: Vec<&str> = CELL_RE
                .captures_iter(&row[1])
                .filter_map(|c| c.get(1).map(|m| m.as_str()))
                .collect();

            let identifier = cell_text(cells.get(shape.id_column)?);
            let name = cell_text(cells.get(shape.name_column)?);
            if identifier.is_empty() || name.is_empty() {
                return None;
            }

            let image_url = cells
                .get(shape.icon_column)
                .and_then(|cell| cell_image_url(cell))
                .map(|url| absolute_url(&url, base_url));

            Some(CatalogEntry { identifier, name, category: shape.category, image_url })
        })
        .collect()
}

/// Slice of `html` holding the `<table>` with the given description.
fn find_table<'a>(html: &'a str, description: &str) -> Option<&'a str> {
    let marker = format!("data-description=\"{}\"", description);
    let attr = html.find(&marker)?;
    let start = html[..attr].rfind("<table")?;
    let end = html[attr..].find("</table>").map(|i| attr + i)?;
    Some(&html[start..end])
}

/// Visible text of a table cell
fn cell_text(cell: &str) -> String {
    let text = TAG_RE.replace_all(cell, "");
    decode_entities(&text).replace("\\n", "").trim().to_string()
}

/// Best icon URL in a cell: a direct file link, then lazy-load, then plain src.
fn cell_image_url(cell: &str) -> Option<String> {
    [&*IMAGE_LINK_RE, &*DATA_SRC_RE, &*SRC_RE]
        .iter()
        .filter_map(|re| re.captures(cell).map(|c| decode_entities(&c[1])))
        .find(|url| !url.starts_with("data:"))
}

fn absolute_url(url: &str, base_url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else if url.starts_with('/') {
        format!("{}{}", base_url, url)
    } else {
        url.to_string()
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Wiki file names use underscores; a few characters need escaping in URLs.
fn encode_title(title: &str) -> String {
    title
        .replace(' ', "_")
        .replace('%', "%25")
        .replace('?', "%3F")
        .replace('&', "%26")
        .replace('#', "%23")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;

    const BLOCKS_HTML: &str = r#"
<div class="mw-parser-output">
<table class="wikitable" data-description="Block IDs">
<tbody><tr><th>Icon</th><th>Identifier</th><th>Name</th></tr>
<tr>
<td><a href="https://minecraft.wiki/images/Stone_JE5.png?abc" class="image"><img alt="" src="data:image/gif;base64,R0lGOD" data-src="/images/thumb/Stone.png"></a></td>
<td><code>stone</code></td>
<td>Stone</td>
</tr>
<tr>
<td><img alt="" src="/images/Dirt.png"></td>
<td><code>dirt</code></td>
<td>Dirt &amp; Mud</td>
</tr>
<tr><td></td><td></td><td>Broken row</td></tr>
</tbody></table>
<table data-description="Something else"><tr><td>x</td><td>nope</td><td>Nope</td></tr></table>
</div>"#;

    const ITEMS_HTML: &str = r#"
<table class="wikitable" data-description="Item IDs">
<tr><th>Item</th><th>Identifier</th></tr>
<tr><td><span class="sprite-file"><img src="//minecraft.wiki/images/Apple.png"></span> Apple</td><td>apple</td></tr>
<tr><td>Stick</td><td>stick</td></tr>
</table>"#;

    fn http() -> Arc<HttpClient> {
        Arc::new(HttpClient::new(&HttpConfig::default()).expect("client"))
    }

    #[test]
    fn test_parse_block_table() {
        let entries = parse_table(BLOCKS_HTML, BLOCK_TABLE, "https://minecraft.wiki");
        assert_eq!(entries.len(), 2);

        assert_eq!(entries[0].identifier, "stone");
        assert_eq!(entries[0].name, "Stone");
        assert_eq!(entries[0].category, Category::Block);
        assert_eq!(
            entries[0].image_url.as_deref(),
            Some("https://minecraft.wiki/images/Stone_JE5.png?abc")
        );

        assert_eq!(entries[1].name, "Dirt & Mud");
        assert_eq!(entries[1].image_url.as_deref(), Some("https://minecraft.wiki/images/Dirt.png"));
    }

    #[test]
    fn test_parse_item_table() {
        let entries = parse_table(ITEMS_HTML, ITEM_TABLE, "https://minecraft.wiki");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].identifier, "apple");
        assert_eq!(entries[0].name, "Apple");
        assert_eq!(entries[0].image_url.as_deref(), Some("https://minecraft.wiki/images/Apple.png"));
        assert_eq!(entries[1].identifier, "stick");
        assert_eq!(entries[1].image_url, None);
    }

    #[test]
    fn test_parse_missing_table() {
        assert!(parse_table("<p>nothing</p>", BLOCK_TABLE, "https://minecraft.wiki").is_empty());
    }

    #[test]
    fn test_parse_response_shape() {
        let json = r#"{"parse": {"title": "x", "text": {"*": "<table></table>"}}}"#;
        let response: ParseResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.parse.text.html, "<table></table>");
    }

    #[test]
    fn test_catalog_names_respect_category() {
        let mut entries = parse_table(BLOCKS_HTML, BLOCK_TABLE, "https://minecraft.wiki");
        entries.extend(parse_table(ITEMS_HTML, ITEM_TABLE, "https://minecraft.wiki"));
        let catalog = WikiCatalog::from_entries(http(), "https://minecraft.wiki/", entries);

        assert_eq!(
            catalog.resolve_name(&NameKey::new(Category::Block, "stone")),
            Some("Stone".to_string())
        );
        assert_eq!(catalog.resolve_name(&NameKey::new(Category::Item, "stone")), None);
        assert_eq!(
            catalog.resolve_name(&NameKey::new(Category::Item, "apple")),
            Some("Apple".to_string())
        );
        assert_eq!(catalog.catalog_identifiers(), vec!["stone", "dirt", "apple", "stick"]);
    }

    #[test]
    fn test_title_icon_url() {
        let catalog = WikiCatalog::from_entries(http(), "https://minecraft.wiki/", Vec::new());
        assert_eq!(
            catalog.title_icon_url("Block of Iron"),
            "https://minecraft.wiki/w/Special:FilePath/Invicon_Block_of_Iron.png"
        );
    }

    #[test]
    fn test_table_url_encodes_template() {
        let url = table_url("https://minecraft.wiki", ITEM_TABLE);
        assert!(url.starts_with("https://minecraft.wiki/api.php?action=parse"));
        assert!(url.ends_with("data%20values%2FItems%7D%7D"));
    }

    #[test]
    fn test_cell_text_strips_markup() {
        assert_eq!(cell_text("<b>Oak</b> <i>Log</i>\\n"), "Oak Log");
        assert_eq!(cell_text("  &quot;Quoted&quot; "), "\"Quoted\"");
    }
}
