//! Spawn egg icons cut out of the wiki's shared inventory sprite sheet.
//!
//! Newer clients render spawn eggs from tinted layers, so there is no flat
//! texture per egg in the archive. The wiki's spawn egg page shows every egg
//! as a CSS sprite: a span whose inline style names a shared sheet and a
//! `background-position`. Both the page and the sheet are fetched at most
//! once per run, by whichever worker asks first; every other worker reads the
//! same cached result.

use super::{DataProvider, HttpClient, IconKey};
use image::{DynamicImage, ImageOutputFormat, RgbaImage};
use log::{info, warn};
use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Arc;

static ROW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<tr[^>]*>(.*?)</tr>").expect("valid row regex"));
static CELL_TEXT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<td[^>]*>(?:\s*<[^>]+>)*\s*([a-z0-9_]+_spawn_egg)\s*(?:<[^>]+>\s*)*</td>")
        .expect("valid cell regex")
});
static SPRITE_STYLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"style="[^"]*background-image:\s*url\(['"]?([^)'"]+)['"]?\)[^"]*background-position:\s*(-?\d+)px\s+(-?\d+)px"#,
    )
    .expect("valid sprite style regex")
});

/// Identifier suffix this provider answers for
pub const SPAWN_EGG_SUFFIX: &str = "_spawn_egg";
/// Size of one cell in the wiki inventory sprite sheet
pub const SPRITE_CELL_SIZE: u32 = 16;

/// Location of one egg inside a sprite sheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpriteRef {
    pub sheet_url: String,
    pub x: u32,
    pub y: u32,
}

/// Spawn egg provider backed by a lazily fetched sprite sheet.
pub struct SpawnEggSheet {
    http: Arc<HttpClient>,
    page_url: String,
    sprites: OnceCell<HashMap<String, SpriteRef>>,
    sheet: OnceCell<Option<(String, Arc<RgbaImage>)>>,
}

impl SpawnEggSheet {
    pub fn new(http: Arc<HttpClient>, base_url: &str) -> Self {
        Self {
            http,
            page_url: format!("{}/w/Spawn_Egg", base_url.trim_end_matches('/')),
            sprites: OnceCell::new(),
            sheet: OnceCell::new(),
        }
    }

    /// Sprite positions parsed from the spawn egg page, fetched on first use.
    fn sprites(&self) -> &HashMap<String, SpriteRef> {
        self.sprites.get_or_init(|| match self.http.get_text(&self.page_url) {
            Ok(html) => {
                let sprites = parse_sprite_refs(&html);
                info!("Found {} spawn egg sprites on {}", sprites.len(), self.page_url);
                sprites
            }
            Err(err) => {
                warn!("spawn egg page unavailable: {}", err);
                HashMap::new()
            }
        })
    }

    /// The shared sheet, fetched once; a failed fetch is remembered as absent.
    fn sheet_for(&self, sprite: &SpriteRef) -> Option<Arc<RgbaImage>> {
        let cached = self.sheet.get_or_init(|| {
            let image = self
                .http
                .try_get_bytes(&sprite.sheet_url)
                .and_then(|bytes| image::load_from_memory(&bytes).ok())
                .map(|img| Arc::new(img.to_rgba8()));
            if image.is_none() {
                warn!("spawn egg sheet {} unavailable", sprite.sheet_url);
            }
            image.map(|img| (sprite.sheet_url.clone(), img))
        });

        match cached {
            Some((url, image)) if *url == sprite.sheet_url => Some(image.clone()),
            // A second sheet is rare enough to fetch uncached
            Some(_) => self
                .http
                .try_get_bytes(&sprite.sheet_url)
                .and_then(|bytes| image::load_from_memory(&bytes).ok())
                .map(|img| Arc::new(img.to_rgba8())),
            None => None,
        }
    }
}

impl DataProvider for SpawnEggSheet {
    fn label(&self) -> &str {
        "spawn egg sheet"
    }

    fn fetch_icon(&self, key: &IconKey) -> Option<Vec<u8>> {
        let IconKey::Identifier(identifier) = key else {
            return None;
        };
        if !identifier.ends_with(SPAWN_EGG_SUFFIX) {
            return None;
        }

        let sprite = self.sprites().get(identifier)?.clone();
        let sheet = self.sheet_for(&sprite)?;
        let cell = crop_cell(&sheet, sprite.x, sprite.y, SPRITE_CELL_SIZE)?;
        encode_png(&cell)
    }
}

/// Parse `identifier -> sprite` from table rows carrying a sprite span.
pub fn parse_sprite_refs(html: &str) -> HashMap<String, SpriteRef> {
    let mut sprites = HashMap::new();
    for row in ROW_RE.captures_iter(html) {
        let row = &row[1];
        let Some(id) = CELL_TEXT_RE.captures(row).map(|c| c[1].to_string()) else {
            continue;
        };
        let Some(style) = SPRITE_STYLE_RE.captures(row) else {
            continue;
        };

        // Positions are negative offsets into the sheet
        let x = style[2].parse::<i64>().map(|v| v.unsigned_abs() as u32);
        let y = style[3].parse::<i64>().map(|v| v.unsigned_abs() as u32);
        if let (Ok(x), Ok(y)) = (x, y) {
            sprites
                .entry(id)
                .or_insert(SpriteRef { sheet_url: absolute_sheet_url(&style[1]), x, y });
        }
    }
    sprites
}

fn absolute_sheet_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{}", url)
    } else {
        url.to_string()
    }
}

/// Copy one `size x size` cell out of a sheet, `None` when out of bounds.
pub fn crop_cell(sheet: &RgbaImage, x: u32, y: u32, size: u32) -> Option<RgbaImage> {
    if x + size > sheet.width() || y + size > sheet.height() {
        return None;
    }
    Some(image::imageops::crop_imm(sheet, x, y, size, size).to_image())
}

fn encode_png(image: &RgbaImage) -> Option<Vec<u8>> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
        .ok()?;
    Some(bytes)
}
