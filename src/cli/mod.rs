//! Command-line interface implementation
//!
//! A single command: every flag is optional, so running `itematlas` with no
//! arguments from a prepared working directory generates the atlas.

use clap::Parser;
use log::{error, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::config::{
    default_config, find_config_from, load_config, merge_cli_overrides, validate_config,
    AtlasToolConfig, CliOverrides, ConfigError,
};
use crate::pipeline::{self, GenerateReport};

/// Exit codes
pub(crate) const EXIT_SUCCESS: u8 = 0;
pub(crate) const EXIT_ERROR: u8 = 1;
pub(crate) const EXIT_INVALID_ARGS: u8 = 2;

/// Generate an item icon atlas and its metadata
#[derive(Parser, Debug)]
#[command(name = "itematlas")]
#[command(about = "Generate a grid atlas of item and block icons plus JSON metadata")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: itematlas.toml found from the root upwards)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Working root holding the source tree and the versions/ cache
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Output directory
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Tile side length in pixels
    #[arg(long)]
    pub tile_size: Option<u32>,

    /// Number of resolution workers
    #[arg(long)]
    pub workers: Option<usize>,

    /// Never touch the network; only a local client archive is used
    #[arg(long)]
    pub offline: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides { out: self.out.clone(), tile_size: self.tile_size, workers: self.workers }
    }
}

/// Load, override and validate configuration, returning it with the working root.
fn prepare(cli: &Cli) -> Result<(AtlasToolConfig, PathBuf), ConfigError> {
    let start = match &cli.root {
        Some(root) => root.clone(),
        None => std::env::current_dir()?,
    };

    let config_path = cli.config.clone().or_else(|| find_config_from(start.clone()));
    let root = match (&cli.root, &config_path) {
        (Some(root), _) => root.clone(),
        (None, Some(path)) => path.parent().map(Path::to_path_buf).unwrap_or(start),
        (None, None) => start,
    };

    let mut config = match &config_path {
        Some(path) => {
            info!("Using config: {}", path.display());
            load_config(path)?
        }
        None => default_config(),
    };

    merge_cli_overrides(&mut config, &cli.overrides());
    validate_config(&config)?;
    Ok((config, root))
}

fn print_summary(report: &GenerateReport) {
    println!(
        "Atlas: {} items ({} from source), {}x{} -> {}",
        report.items,
        report.canonical,
        report.width,
        report.height,
        report.image_path.display()
    );
    println!("Metadata: {}", report.metadata_path.display());
    println!("Names resolved: {}/{}", report.names_resolved, report.items);
    println!("Icons resolved: {}/{}", report.icons_resolved, report.items);
    if !report.missing_icons.is_empty() {
        println!("Placeholders: {}", report.missing_icons.join(", "));
    }
}

/// Parse arguments and run. Entry point of the binary.
pub fn run() -> ExitCode {
    let cli = Cli::parse();
    crate::logging::init(cli.verbose);

    let (config, root) = match prepare(&cli) {
        Ok(prepared) => prepared,
        Err(ConfigError::Io(e)) => {
            error!("Error loading config: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
        Err(e) => {
            error!("{}", e);
            return ExitCode::from(EXIT_INVALID_ARGS);
        }
    };

    match pipeline::run(&config, &root, cli.offline) {
        Ok(report) => {
            print_summary(&report);
            ExitCode::from(EXIT_SUCCESS)
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::from(EXIT_ERROR)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_no_arguments() {
        let cli = Cli::try_parse_from(["itematlas"]).unwrap();
        assert!(cli.config.is_none());
        assert!(!cli.offline);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::try_parse_from([
            "itematlas",
            "--config",
            "a.toml",
            "--root",
            "work",
            "--out",
            "dist",
            "--tile-size",
            "32",
            "--workers",
            "4",
            "--offline",
            "-v",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("a.toml")));
        assert_eq!(cli.root, Some(PathBuf::from("work")));
        assert_eq!(cli.tile_size, Some(32));
        assert_eq!(cli.workers, Some(4));
        assert!(cli.offline && cli.verbose);
    }

    #[test]
    fn test_prepare_root_and_overrides() {
        let temp = TempDir::new().expect("should create temp dir");
        fs::write(temp.path().join("itematlas.toml"), "[atlas]\ntile_size = 16\n").expect("should write config");

        let cli = Cli::try_parse_from([
            "itematlas",
            "--root",
            temp.path().to_str().unwrap(),
            "--workers",
            "3",
        ])
        .unwrap();
        let (config, root) = prepare(&cli).expect("config should load");
        assert_eq!(root, temp.path());
        assert_eq!(config.atlas.tile_size, 16);
        assert_eq!(config.atlas.workers, 3);
    }

    #[test]
    fn test_prepare_rejects_zero_tile_size() {
        let temp = TempDir::new().expect("should create temp dir");
        let cli = Cli::try_parse_from([
            "itematlas",
            "--root",
            temp.path().to_str().unwrap(),
            "--tile-size",
            "0",
        ])
        .unwrap();
        assert!(matches!(prepare(&cli), Err(ConfigError::Validation(_))));
    }
}
