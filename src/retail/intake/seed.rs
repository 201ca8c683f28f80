//! One-off import of the CSV exports into an empty document store.

use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::retail::intake::config::{
    BOOSTERS_CSV, CATEGORIES_CSV, CUSTOM_CODES_CSV, STORE_LISTS_CSV,
};
use crate::retail::intake::error::Result;
use crate::retail::intake::grouping::{
    parse_boosters, parse_category_rows, parse_custom_codes, parse_store_lists,
};
use crate::retail::intake::io::store::{Collection, DocumentStore, Fields, to_fields};

/// Outcome of seeding a single collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSeed {
    /// Documents written.
    pub written: usize,
    /// The collection already held documents and `force` was not set.
    pub skipped: bool,
}

/// Per-collection outcome of [`seed_from_csvs`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedResult {
    pub categories: CollectionSeed,
    pub store_lists: CollectionSeed,
    pub boosters: CollectionSeed,
    pub custom_codes: CollectionSeed,
}

impl SeedResult {
    pub fn total_written(&self) -> usize {
        self.categories.written
            + self.store_lists.written
            + self.boosters.written
            + self.custom_codes.written
    }
}

/// Loads the four CSV exports from `csv_dir` into the store. Categories are
/// stored as raw per-country rows and store lists grouped by name and
/// country. Collections that already hold documents are left alone unless
/// `force` is set; a missing export seeds nothing.
#[instrument(level = "info", skip_all, fields(csv_dir = %csv_dir.display(), force = force))]
pub fn seed_from_csvs(
    store: &dyn DocumentStore,
    csv_dir: &Path,
    force: bool,
) -> Result<SeedResult> {
    let result = SeedResult {
        categories: seed_collection(
            store,
            Collection::Categories,
            &csv_dir.join(CATEGORIES_CSV),
            force,
            parse_category_rows,
        )?,
        store_lists: seed_collection(
            store,
            Collection::StoreLists,
            &csv_dir.join(STORE_LISTS_CSV),
            force,
            parse_store_lists,
        )?,
        boosters: seed_collection(
            store,
            Collection::Boosters,
            &csv_dir.join(BOOSTERS_CSV),
            force,
            parse_boosters,
        )?,
        custom_codes: seed_collection(
            store,
            Collection::CustomCategoryCodes,
            &csv_dir.join(CUSTOM_CODES_CSV),
            force,
            parse_custom_codes,
        )?,
    };
    info!(written = result.total_written(), "seeding finished");
    Ok(result)
}

fn seed_collection<T: Serialize>(
    store: &dyn DocumentStore,
    collection: Collection,
    path: &Path,
    force: bool,
    parse: fn(&str) -> Result<Vec<T>>,
) -> Result<CollectionSeed> {
    if !force && !store.list(collection)?.is_empty() {
        info!(%collection, "collection already populated, skipping");
        return Ok(CollectionSeed {
            written: 0,
            skipped: true,
        });
    }

    if !path.exists() {
        warn!(%collection, path = %path.display(), "export not found, nothing to seed");
        return Ok(CollectionSeed::default());
    }

    let records = parse(&fs::read_to_string(path)?)?;
    let documents = records.iter().map(to_fields).collect::<Result<Vec<Fields>>>()?;
    let written = store.create_many(collection, documents)?;
    info!(%collection, written, "collection seeded");
    Ok(CollectionSeed {
        written,
        skipped: false,
    })
}
