//! End-to-end atlas generation.
//!
//! `run` is what the command line drives: it assembles the provider set from
//! configuration, finds the registration source and hands both to
//! `generate`. `generate` itself only sees a request and a provider list, so
//! it can be driven with in-memory providers.

use crate::atlas::{pack_atlas, AtlasError, GridLayout};
use crate::config::AtlasToolConfig;
use crate::extract::{extract_from_file, ExtractError};
use crate::metadata::{order_cells, write_metadata, MetadataError};
use crate::normalize::normalize_record;
use crate::output::{save_png, OutputError, OutputPaths};
use crate::provider::manifest::locate_client_archive;
use crate::provider::{
    ClientArchive, DataProvider, HttpClient, ProviderError, SpawnEggSheet, WikiCatalog,
};
use crate::resolve::{ResolveError, Resolver};
use crate::source::{find_source, locate_source, SourceError};
use log::{info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Fatal errors of a generation run
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Atlas(#[from] AtlasError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Output(#[from] OutputError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error("no data providers available")]
    NoProviders,
    #[error("none of the {0} identifiers resolved a name or an icon")]
    NothingResolved(usize),
}

/// Inputs of one generation run
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Registration source file
    pub source: PathBuf,
    pub tile_size: u32,
    pub workers: usize,
    pub outputs: OutputPaths,
    /// Identifiers appended after the canonical list when not already in it
    pub extra_identifiers: Vec<String>,
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateReport {
    /// Identifiers extracted from the registration source
    pub canonical: usize,
    /// Tiles packed, canonical plus extras
    pub items: usize,
    pub names_resolved: usize,
    pub icons_resolved: usize,
    /// Identifiers packed as transparent placeholders
    pub missing_icons: Vec<String>,
    pub width: u32,
    pub height: u32,
    pub image_path: PathBuf,
    pub metadata_path: PathBuf,
}

/// Providers assembled from configuration
pub struct ProviderSet {
    /// In priority order
    pub providers: Vec<Arc<dyn DataProvider>>,
    /// Client archive on disk, when one was located
    pub archive_path: Option<PathBuf>,
    /// Every identifier the wiki catalog knows, in table order
    pub catalog_identifiers: Vec<String>,
}

/// Canonical identifiers followed by unseen extras, first occurrence kept.
pub fn merge_identifiers(canonical: &[String], extras: &[String]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(canonical.len() + extras.len());
    canonical
        .iter()
        .chain(extras)
        .filter(|id| seen.insert(id.as_str()))
        .cloned()
        .collect()
}

/// Run the full pipeline against an explicit provider list.
pub fn generate(
    request: &GenerateRequest,
    providers: Vec<Arc<dyn DataProvider>>,
) -> Result<GenerateReport, GenerateError> {
    let extracted = extract_from_file(&request.source)?;
    info!(
        "Extracted {} identifiers in {} groups from {}",
        extracted.len(),
        extracted.groups.len(),
        request.source.display()
    );

    let identifiers = merge_identifiers(&extracted.ordered, &request.extra_identifiers);
    if identifiers.len() > extracted.len() {
        info!("Including {} catalog identifiers not in the source", identifiers.len() - extracted.len());
    }

    // Reject impossible geometry before any icon is fetched or scaled
    GridLayout::for_count(identifiers.len(), request.tile_size)?;

    let resolver = Resolver::new(providers);
    let records = resolver.resolve_all(&identifiers, request.workers)?;

    let names_resolved = records.iter().filter(|r| r.display_name.is_some()).count();
    let missing_icons: Vec<String> =
        records.iter().filter(|r| !r.has_icon()).map(|r| r.identifier.clone()).collect();
    if names_resolved == 0 && missing_icons.len() == records.len() {
        return Err(GenerateError::NothingResolved(records.len()));
    }

    let tile_size = request.tile_size;
    let tiles: Vec<_> = records.par_iter().map(|record| normalize_record(record, tile_size)).collect();
    let packed = pack_atlas(&tiles, tile_size)?;
    info!(
        "Packed {} tiles into {}x{} ({} columns, {} rows)",
        tiles.len(),
        packed.layout.width(),
        packed.layout.height(),
        packed.layout.columns,
        packed.layout.rows
    );

    save_png(&packed.image, &request.outputs.image)?;
    let (width, height) = packed.image.dimensions();

    let cells = order_cells(packed.cells, &extracted.ordered);
    write_metadata(&request.outputs.metadata, &cells)?;

    Ok(GenerateReport {
        canonical: extracted.len(),
        items: records.len(),
        names_resolved,
        icons_resolved: records.len() - missing_icons.len(),
        missing_icons,
        width,
        height,
        image_path: request.outputs.image.clone(),
        metadata_path: request.outputs.metadata.clone(),
    })
}

/// Build the provider list: client archive, then wiki catalog, then spawn eggs.
///
/// Offline runs never touch the network, so only a local archive is used.
/// Provider failures are logged and the provider skipped, except for a
/// required archive. Ending up with no provider at all is an error.
pub fn build_providers(
    config: &AtlasToolConfig,
    root: &Path,
    offline: bool,
) -> Result<ProviderSet, GenerateError> {
    let http = if offline { None } else { Some(Arc::new(HttpClient::new(&config.http)?)) };

    let mut set = ProviderSet { providers: Vec::new(), archive_path: None, catalog_identifiers: Vec::new() };

    if config.archive.enabled {
        let archive = locate_client_archive(
            http.as_deref(),
            root,
            &config.archive.local_pattern,
            &config.archive.manifest_url,
            config.archive.version.as_deref(),
        )
        .and_then(|path| ClientArchive::open(&path).map(|archive| (path, archive)));

        match archive {
            Ok((path, archive)) => {
                info!("Client archive: {} ({} translations)", archive.origin(), archive.translation_count());
                set.archive_path = Some(path);
                set.providers.push(Arc::new(archive));
            }
            Err(err) if config.archive.required => return Err(err.into()),
            Err(err) => warn!("client archive unavailable, continuing without it: {}", err),
        }
    }

    match (&http, config.wiki.enabled) {
        (Some(http), true) => {
            match WikiCatalog::fetch(http.clone(), &config.wiki.base_url) {
                Ok(catalog) => {
                    info!("Wiki catalog: {} entries", catalog.entries().len());
                    set.catalog_identifiers = catalog.catalog_identifiers();
                    set.providers.push(Arc::new(catalog));
                }
                Err(err) => warn!("wiki catalog unavailable, continuing without it: {}", err),
            }
            if config.wiki.spawn_eggs {
                set.providers.push(Arc::new(SpawnEggSheet::new(http.clone(), &config.wiki.base_url)));
            }
        }
        (None, true) => info!("Offline: skipping wiki providers"),
        _ => {}
    }

    if set.providers.is_empty() {
        return Err(GenerateError::NoProviders);
    }
    Ok(set)
}

/// Generate the atlas for a working root using configuration only.
pub fn run(config: &AtlasToolConfig, root: &Path, offline: bool) -> Result<GenerateReport, GenerateError> {
    // Fail on a missing source before any download starts
    let found = find_source(root, &config.source.pattern)?;
    if found.is_none() && config.source.decompile.is_empty() {
        return Err(SourceError::NotFound { root: root.to_path_buf(), pattern: config.source.pattern.clone() }.into());
    }

    let set = build_providers(config, root, offline)?;
    let source = match found {
        Some(path) => path,
        None => locate_source(root, &config.source, set.archive_path.as_deref())?,
    };

    let extra_identifiers = if config.catalog.include_unlisted { set.catalog_identifiers } else { Vec::new() };

    let request = GenerateRequest {
        source,
        tile_size: config.atlas.tile_size,
        workers: config.atlas.workers,
        outputs: OutputPaths::from_config(root, &config.output),
        extra_identifiers,
    };
    generate(&request, set.providers)
}
