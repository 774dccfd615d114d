//! Per-identifier name and icon resolution.
//!
//! Names are looked up under the item key first, then the block key; the
//! key that answers decides the record's category. Icons are looked up
//! through an ordered list of candidate generators. Each generator derives
//! one key from the identifier (or the resolved name), every provider is
//! asked for that key, and the first hit wins. Generators run lazily, so
//! later candidates are never computed once an earlier one succeeds.
//!
//! Failures here are per item: an identifier without a name or icon still
//! produces a record, and resolution of one identifier never affects another.

use crate::item::{Category, ItemRecord};
use crate::provider::{DataProvider, IconKey, NameKey};
use log::{debug, info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Default size of the resolver thread pool
pub const DEFAULT_WORKERS: usize = 10;

/// Namespace and cosmetic prefixes that never appear in texture names
const DECORATIVE_PREFIXES: &[&str] = &["minecraft:", "waxed_"];

/// Name lookup order: the first category whose key resolves wins
const NAME_CATEGORIES: [Category; 2] = [Category::Item, Category::Block];

/// Errors that stop resolution as a whole
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to start resolver pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Inputs available to icon candidate generators
#[derive(Debug, Clone, Copy)]
pub struct IconQuery<'a> {
    pub identifier: &'a str,
    pub display_name: Option<&'a str>,
}

/// Derives one icon key from a query, or nothing when it does not apply.
pub type CandidateFn = fn(&IconQuery<'_>) -> Option<IconKey>;

/// Icon candidates in priority order
pub const ICON_CANDIDATES: &[(&str, CandidateFn)] = &[
    ("identifier", raw_identifier),
    ("stripped identifier", stripped_identifier),
    ("display name", display_name_title),
    ("title-cased identifier", title_case_identifier),
];

fn raw_identifier(query: &IconQuery<'_>) -> Option<IconKey> {
    Some(IconKey::Identifier(query.identifier.to_string()))
}

fn stripped_identifier(query: &IconQuery<'_>) -> Option<IconKey> {
    let stripped = strip_decorations(query.identifier);
    (stripped != query.identifier && !stripped.is_empty())
        .then(|| IconKey::Identifier(stripped.to_string()))
}

fn display_name_title(query: &IconQuery<'_>) -> Option<IconKey> {
    let name = query.display_name?.trim();
    (!name.is_empty()).then(|| IconKey::Title(name.replace(' ', "_")))
}

fn title_case_identifier(query: &IconQuery<'_>) -> Option<IconKey> {
    let title = title_case(strip_decorations(query.identifier));
    (!title.is_empty()).then_some(IconKey::Title(title))
}

/// Remove every leading decorative prefix.
pub fn strip_decorations(identifier: &str) -> &str {
    let mut current = identifier;
    while let Some(rest) = DECORATIVE_PREFIXES.iter().find_map(|p| current.strip_prefix(p)) {
        current = rest;
    }
    current
}

/// `stone_bricks` -> `Stone_Bricks`
pub fn title_case(identifier: &str) -> String {
    identifier
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("_")
}

/// Resolves identifiers against an ordered set of providers.
pub struct Resolver {
    providers: Vec<Arc<dyn DataProvider>>,
    candidates: Vec<(&'static str, CandidateFn)>,
}

impl Resolver {
    /// Create a resolver asking `providers` in the given order.
    pub fn new(providers: Vec<Arc<dyn DataProvider>>) -> Self {
        Self { providers, candidates: ICON_CANDIDATES.to_vec() }
    }

    /// Replace the icon candidate list.
    pub fn with_candidates(mut self, candidates: Vec<(&'static str, CandidateFn)>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Look up a display name, returning the category of the key that matched.
    pub fn resolve_name(&self, identifier: &str) -> Option<(String, Category)> {
        for category in NAME_CATEGORIES {
            let key = NameKey::new(category, identifier);
            for provider in &self.providers {
                if let Some(name) = provider.resolve_name(&key) {
                    let name = name.trim();
                    if !name.is_empty() {
                        debug!("{}: name '{}' from {} ({})", identifier, name, provider.label(), key);
                        return Some((name.to_string(), category));
                    }
                }
            }
        }
        None
    }

    /// Icon keys for a query, in the order they would be tried.
    pub fn icon_keys(&self, query: &IconQuery<'_>) -> Vec<IconKey> {
        let mut seen = HashSet::new();
        self.candidates
            .iter()
            .filter_map(|(_, candidate)| candidate(query))
            .filter(|key| seen.insert(key.clone()))
            .collect()
    }

    /// Try each candidate key against each provider until one returns bytes.
    pub fn fetch_icon(&self, query: &IconQuery<'_>) -> Option<Vec<u8>> {
        let mut tried = HashSet::new();
        for (label, candidate) in &self.candidates {
            let Some(key) = candidate(query) else {
                continue;
            };
            if !tried.insert(key.clone()) {
                continue;
            }

            for provider in &self.providers {
                if let Some(bytes) = provider.fetch_icon(&key) {
                    debug!(
                        "{}: icon via {} ({}) from {}",
                        query.identifier,
                        label,
                        key,
                        provider.label()
                    );
                    return Some(bytes);
                }
            }
        }
        None
    }

    /// Resolve one identifier. Never fails; misses are logged.
    pub fn resolve(&self, identifier: &str) -> ItemRecord {
        let mut record = ItemRecord::unresolved(identifier);

        match self.resolve_name(identifier) {
            Some((name, category)) => {
                record.display_name = Some(name);
                record.category = category;
            }
            None => warn!("{}: no display name found", identifier),
        }

        let query = IconQuery { identifier, display_name: record.display_name.as_deref() };
        record.image_bytes = self.fetch_icon(&query);
        if record.image_bytes.is_none() {
            warn!("{}: no icon found", identifier);
        }

        record
    }

    /// Resolve every identifier on a pool of `workers` threads.
    ///
    /// Returned records follow the input order.
    pub fn resolve_all(
        &self,
        identifiers: &[String],
        workers: usize,
    ) -> Result<Vec<ItemRecord>, ResolveError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|i| format!("resolver-{}", i))
            .build()?;

        let total = identifiers.len();
        let done = AtomicUsize::new(0);
        info!("Resolving {} identifiers on {} workers", total, workers.max(1));

        let records = pool.install(|| {
            identifiers
                .par_iter()
                .map(|id| {
                    let record = self.resolve(id);
                    let n = done.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!("Processed {}/{}: {}", n, total, id);
                    record
                })
                .collect()
        });

        Ok(records)
    }
}
