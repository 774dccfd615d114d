//! Atlas packing - combines fixed-size icon tiles into one grid image
//!
//! Tiles are laid out in raster-scan order (left to right, top to bottom)
//! over a grid that is `floor(sqrt(n))` cells wide. Consumers of the atlas
//! rely on that exact grid shape for a given item count, so the sizing
//! formula lives in one place: [`GridLayout::for_count`].

use crate::item::{Category, Tile};
use image::{imageops, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that make packing impossible
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AtlasError {
    /// No tiles to pack; the grid would be zero cells wide
    #[error("cannot pack an atlas with no items")]
    Empty,
    /// Tile size of zero
    #[error("tile size must be positive")]
    ZeroTileSize,
    /// The canvas for this many tiles would not fit in memory
    #[error("{columns}x{rows} grid of {tile_size}px tiles is too large for one image")]
    TooLarge { columns: u32, rows: u32, tile_size: u32 },
    /// A tile does not match the configured tile size
    #[error("tile '{identifier}' is {width}x{height}, expected {expected}x{expected}")]
    TileSize {
        identifier: String,
        width: u32,
        height: u32,
        expected: u32,
    },
}

/// Largest RGBA canvas, in bytes, the packer will allocate
pub const MAX_CANVAS_BYTES: u64 = 1 << 32;

/// Grid geometry for an atlas holding a given number of tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub tile_size: u32,
    pub columns: u32,
    pub rows: u32,
}

impl GridLayout {
    /// Compute the grid for `count` tiles of `tile_size` pixels.
    ///
    /// Width is `floor(sqrt(count))` cells; height is the fewest rows that
    /// hold every cell at that width.
    pub fn for_count(count: usize, tile_size: u32) -> Result<Self, AtlasError> {
        if tile_size == 0 {
            return Err(AtlasError::ZeroTileSize);
        }

        let columns = integer_sqrt(count as u64) as u32;
        if columns == 0 {
            return Err(AtlasError::Empty);
        }

        let rows = (count as u64).div_ceil(columns as u64) as u32;

        // width() and height() rely on these products fitting in u32
        let too_large = || AtlasError::TooLarge { columns, rows, tile_size };
        let width = columns.checked_mul(tile_size).ok_or_else(too_large)?;
        let height = rows.checked_mul(tile_size).ok_or_else(too_large)?;
        let bytes = (width as u64 * height as u64)
            .checked_mul(4)
            .filter(|&b| b <= MAX_CANVAS_BYTES)
            .ok_or_else(too_large)?;
        usize::try_from(bytes).map_err(|_| too_large())?;

        Ok(Self { tile_size, columns, rows })
    }

    /// Canvas width in pixels
    pub fn width(&self) -> u32 {
        self.columns * self.tile_size
    }

    /// Canvas height in pixels
    pub fn height(&self) -> u32 {
        self.rows * self.tile_size
    }

    /// Number of cells in the grid (at least the packed tile count)
    pub fn capacity(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Pixel offset of the cell at raster index `index`.
    pub fn offset_of(&self, index: usize) -> (u32, u32) {
        let col = (index % self.columns as usize) as u32;
        let row = (index / self.columns as usize) as u32;
        (col * self.tile_size, row * self.tile_size)
    }
}

/// Exact integer square root (floor).
fn integer_sqrt(n: u64) -> u64 {
    let mut root = (n as f64).sqrt() as u64;
    while root * root > n {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= n {
        root += 1;
    }
    root
}

/// One tile's position in the atlas, as written to the metadata file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtlasCell {
    #[serde(rename = "name")]
    pub display_name: Option<String>,
    #[serde(rename = "id")]
    pub identifier: String,
    #[serde(rename = "type")]
    pub category: Category,
    #[serde(rename = "offsetX")]
    pub offset_x: u32,
    #[serde(rename = "offsetY")]
    pub offset_y: u32,
}

/// Result of atlas packing
#[derive(Debug)]
pub struct PackedAtlas {
    pub image: RgbaImage,
    /// Cells in placement (raster-scan) order
    pub cells: Vec<AtlasCell>,
    pub layout: GridLayout,
}

/// Transparent color for atlas background
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Pack tiles into a single grid atlas.
///
/// Tiles are placed in the order given. Each cell's offset is recorded
/// before the cursor advances, so `cells[i]` describes `tiles[i]`.
pub fn pack_atlas(tiles: &[Tile], tile_size: u32) -> Result<PackedAtlas, AtlasError> {
    let layout = GridLayout::for_count(tiles.len(), tile_size)?;

    for tile in tiles {
        let (width, height) = tile.image.dimensions();
        if width != tile_size || height != tile_size {
            return Err(AtlasError::TileSize {
                identifier: tile.identifier.clone(),
                width,
                height,
                expected: tile_size,
            });
        }
    }

    let mut image = RgbaImage::from_pixel(layout.width(), layout.height(), TRANSPARENT);
    let mut cells = Vec::with_capacity(tiles.len());
    let mut offset_x = 0u32;
    let mut offset_y = 0u32;

    for tile in tiles {
        imageops::replace(&mut image, &tile.image, offset_x as i64, offset_y as i64);
        cells.push(AtlasCell {
            display_name: tile.display_name.clone(),
            identifier: tile.identifier.clone(),
            category: tile.category,
            offset_x,
            offset_y,
        });

        offset_x += tile_size;
        if offset_x >= layout.width() {
            offset_x = 0;
            offset_y += tile_size;
        }
    }

    Ok(PackedAtlas { image, cells, layout })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn make_solid_tile(name: &str, size: u32, color: Rgba<u8>) -> Tile {
        Tile {
            identifier: name.to_string(),
            display_name: Some(name.to_uppercase()),
            category: Category::Item,
            image: RgbaImage::from_pixel(size, size, color),
        }
    }

    fn make_tiles(count: usize, size: u32) -> Vec<Tile> {
        (0..count)
            .map(|i| make_solid_tile(&format!("item_{}", i), size, Rgba([i as u8, 0, 0, 255])))
            .collect()
    }

    #[test]
    fn test_empty_tiles_rejected() {
        let result = pack_atlas(&[], 64);
        assert_eq!(result.unwrap_err(), AtlasError::Empty);
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        assert_eq!(GridLayout::for_count(4, 0).unwrap_err(), AtlasError::ZeroTileSize);
    }

    #[test]
    fn test_oversized_grid_rejected() {
        let huge = u32::MAX / 2 + 1;
        assert!(matches!(GridLayout::for_count(4, huge), Err(AtlasError::TooLarge { .. })));
        // Each side fits in u32 but the RGBA buffer exceeds the cap
        assert!(matches!(
            GridLayout::for_count(1_000_000, 65_535),
            Err(AtlasError::TooLarge { columns: 1000, rows: 1000, tile_size: 65_535 })
        ));
        assert!(pack_atlas(&[], huge).is_err());
    }

    #[test]
    fn test_grid_layout_twelve_items() {
        let layout = GridLayout::for_count(12, 64).unwrap();
        assert_eq!(layout.columns, 3);
        assert_eq!(layout.rows, 4);
        assert_eq!(layout.width(), 192);
        assert_eq!(layout.height(), 256);
    }

    #[test]
    fn test_grid_layout_formula() {
        for n in 1..=200usize {
            let layout = GridLayout::for_count(n, 16).unwrap();
            let columns = (n as f64).sqrt().floor() as u32;
            assert_eq!(layout.width(), columns * 16, "width for n={}", n);
            let rows = (n as u32 + columns - 1) / columns;
            assert_eq!(layout.height(), rows * 16, "height for n={}", n);
            assert!(layout.capacity() >= n);
        }
    }

    #[test]
    fn test_integer_sqrt() {
        assert_eq!(integer_sqrt(0), 0);
        assert_eq!(integer_sqrt(1), 1);
        assert_eq!(integer_sqrt(3), 1);
        assert_eq!(integer_sqrt(4), 2);
        assert_eq!(integer_sqrt(1_000_000), 1000);
        assert_eq!(integer_sqrt(999_999), 999);
    }

    #[test]
    fn test_single_tile() {
        let red = Rgba([255, 0, 0, 255]);
        let tiles = vec![make_solid_tile("red", 16, red)];
        let packed = pack_atlas(&tiles, 16).unwrap();

        assert_eq!(packed.image.dimensions(), (16, 16));
        assert_eq!(packed.cells.len(), 1);
        assert_eq!((packed.cells[0].offset_x, packed.cells[0].offset_y), (0, 0));
        assert_eq!(*packed.image.get_pixel(0, 0), red);
    }

    #[test]
    fn test_raster_scan_offsets() {
        let tiles = make_tiles(12, 64);
        let packed = pack_atlas(&tiles, 64).unwrap();
        let width = packed.layout.width();

        let mut expected = (0u32, 0u32);
        for cell in &packed.cells {
            assert_eq!((cell.offset_x, cell.offset_y), expected);
            expected.0 += 64;
            if expected.0 >= width {
                expected = (0, expected.1 + 64);
            }
        }
    }

    #[test]
    fn test_offsets_unique_and_in_bounds() {
        for n in [1usize, 2, 3, 5, 10, 17, 50] {
            let tiles = make_tiles(n, 8);
            let packed = pack_atlas(&tiles, 8).unwrap();
            assert_eq!(packed.cells.len(), n);

            let offsets: HashSet<(u32, u32)> =
                packed.cells.iter().map(|c| (c.offset_x, c.offset_y)).collect();
            assert_eq!(offsets.len(), n, "offsets overlap for n={}", n);

            for cell in &packed.cells {
                assert!(cell.offset_x + 8 <= packed.image.width());
                assert!(cell.offset_y + 8 <= packed.image.height());
                assert_eq!(cell.offset_x % 8, 0);
                assert_eq!(cell.offset_y % 8, 0);
            }
        }
    }

    #[test]
    fn test_offset_of_matches_packing() {
        let tiles = make_tiles(7, 4);
        let packed = pack_atlas(&tiles, 4).unwrap();
        for (i, cell) in packed.cells.iter().enumerate() {
            assert_eq!(packed.layout.offset_of(i), (cell.offset_x, cell.offset_y));
        }
    }

    #[test]
    fn test_pixels_copied_to_cells() {
        let tiles = make_tiles(5, 4);
        let packed = pack_atlas(&tiles, 4).unwrap();
        for (tile, cell) in tiles.iter().zip(&packed.cells) {
            assert_eq!(tile.identifier, cell.identifier);
            assert_eq!(
                packed.image.get_pixel(cell.offset_x + 3, cell.offset_y + 3),
                tile.image.get_pixel(3, 3)
            );
        }
        // 5 tiles in a 2x3 grid leave the last cell transparent
        assert_eq!(packed.image.get_pixel(4, 8)[3], 0);
    }

    #[test]
    fn test_wrong_tile_size_rejected() {
        let tiles = vec![make_solid_tile("big", 32, Rgba([1, 2, 3, 255]))];
        match pack_atlas(&tiles, 16) {
            Err(AtlasError::TileSize { identifier, width, .. }) => {
                assert_eq!(identifier, "big");
                assert_eq!(width, 32);
            }
            other => panic!("expected TileSize error, got {:?}", other.map(|p| p.cells)),
        }
    }

    #[test]
    fn test_atlas_cell_serialization() {
        let cell = AtlasCell {
            display_name: Some("Stone".to_string()),
            identifier: "stone".to_string(),
            category: Category::Block,
            offset_x: 64,
            offset_y: 128,
        };
        let json = serde_json::to_value(&cell).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "Stone",
                "id": "stone",
                "type": "block",
                "offsetX": 64,
                "offsetY": 128
            })
        );
    }

    #[test]
    fn test_placeholder_cell_serializes_null_name() {
        let cell = AtlasCell {
            display_name: None,
            identifier: "mystery".to_string(),
            category: Category::Item,
            offset_x: 0,
            offset_y: 0,
        };
        let json = serde_json::to_string(&cell).unwrap();
        assert!(json.contains("\"name\":null"));
    }
}
