//! Atlas image output and output path layout

use crate::config::{resolve_path, OutputConfig};
use image::RgbaImage;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for output operations
#[derive(Debug, Error)]
pub enum OutputError {
    /// IO error during file operations
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// Image encoding error
    #[error("Image error writing {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Where the atlas image and its metadata are written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub image: PathBuf,
    pub metadata: PathBuf,
}

impl OutputPaths {
    /// Lay out both outputs under the configured directory, relative to `root`.
    pub fn from_config(root: &Path, config: &OutputConfig) -> Self {
        let dir = resolve_path(root, &config.dir);
        Self { image: dir.join(&config.image), metadata: dir.join(&config.metadata) }
    }
}

/// Save an RGBA image to a PNG file, creating parent directories.
pub fn save_png(image: &RgbaImage, path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .map_err(|source| OutputError::Io { path: parent.to_path_buf(), source })?;
        }
    }

    image
        .save_with_format(path, image::ImageFormat::Png)
        .map_err(|source| OutputError::Image { path: path.to_path_buf(), source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use tempfile::TempDir;

    #[test]
    fn test_save_png_roundtrip() {
        let temp = TempDir::new().expect("should create temp dir");
        let path = temp.path().join("nested").join("atlas.png");

        let mut image = RgbaImage::new(4, 2);
        image.put_pixel(3, 1, Rgba([10, 20, 30, 128]));
        save_png(&image, &path).expect("png should save");

        let loaded = image::open(&path).expect("png should load").to_rgba8();
        assert_eq!(loaded.dimensions(), (4, 2));
        assert_eq!(*loaded.get_pixel(3, 1), Rgba([10, 20, 30, 128]));
        assert_eq!(*loaded.get_pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_output_paths_relative_to_root() {
        let config = OutputConfig {
            dir: PathBuf::from("out"),
            image: "a.png".to_string(),
            metadata: "a.json".to_string(),
        };
        let paths = OutputPaths::from_config(Path::new("/work"), &config);
        assert_eq!(paths.image, PathBuf::from("/work/out/a.png"));
        assert_eq!(paths.metadata, PathBuf::from("/work/out/a.json"));
    }

    #[test]
    fn test_output_paths_default_dir() {
        let paths = OutputPaths::from_config(Path::new("/work"), &OutputConfig::default());
        assert_eq!(paths.image, PathBuf::from("/work/./atlas.png"));
    }
}
