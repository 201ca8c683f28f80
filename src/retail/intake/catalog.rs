use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::retail::intake::cache::{CsvFileSource, DatasetCache, SourceChain, StoreSource};
use crate::retail::intake::config::{
    BOOSTERS_CSV, CATEGORIES_CSV, CUSTOM_CODES_CSV, STORE_LISTS_CSV, Settings,
};
use crate::retail::intake::error::Result;
use crate::retail::intake::grouping::{
    group_categories, parse_and_group_categories, parse_boosters, parse_category_rows,
    parse_custom_codes, parse_store_lists, sort_boosters, sort_store_lists,
};
use crate::retail::intake::io::store::{Collection, Document, DocumentStore, decode_all};
use crate::retail::intake::model::{Booster, Category, CategoryRow, CustomCode, StoreList};

/// The memoized reference datasets used while building orders.
///
/// Each dataset prefers the document store and falls back to its CSV export.
/// The raw category rows and custom codes feed the code directory.
pub struct Catalog {
    categories: DatasetCache<Category>,
    category_rows: DatasetCache<CategoryRow>,
    store_lists: DatasetCache<StoreList>,
    boosters: DatasetCache<Booster>,
    custom_codes: DatasetCache<CustomCode>,
}

impl Catalog {
    /// Builds the caches. Without a store only the CSV exports are used.
    pub fn new(store: Option<Arc<dyn DocumentStore>>, csv_dir: &Path) -> Self {
        let mut categories = SourceChain::new();
        let mut category_rows = SourceChain::new();
        let mut store_lists = SourceChain::new();
        let mut boosters = SourceChain::new();
        let mut custom_codes = SourceChain::new();

        if let Some(store) = store {
            categories = categories.with(StoreSource::new(
                Arc::clone(&store),
                Collection::Categories,
                decode_categories,
            ));
            category_rows = category_rows.with(StoreSource::new(
                Arc::clone(&store),
                Collection::Categories,
                decode_all_documents::<CategoryRow>,
            ));
            store_lists = store_lists.with(StoreSource::new(
                Arc::clone(&store),
                Collection::StoreLists,
                decode_store_lists,
            ));
            boosters = boosters.with(StoreSource::new(
                Arc::clone(&store),
                Collection::Boosters,
                decode_boosters,
            ));
            custom_codes = custom_codes.with(StoreSource::new(
                store,
                Collection::CustomCategoryCodes,
                decode_all_documents::<CustomCode>,
            ));
        }

        Self {
            categories: DatasetCache::new(
                "categories",
                categories.with(CsvFileSource::new(
                    csv_dir.join(CATEGORIES_CSV),
                    parse_and_group_categories,
                )),
            ),
            category_rows: DatasetCache::new(
                "categoryRows",
                category_rows.with(CsvFileSource::new(
                    csv_dir.join(CATEGORIES_CSV),
                    parse_category_rows,
                )),
            ),
            store_lists: DatasetCache::new(
                "storeLists",
                store_lists.with(CsvFileSource::new(
                    csv_dir.join(STORE_LISTS_CSV),
                    parse_store_lists,
                )),
            ),
            boosters: DatasetCache::new(
                "boosters",
                boosters.with(CsvFileSource::new(csv_dir.join(BOOSTERS_CSV), parse_boosters)),
            ),
            custom_codes: DatasetCache::new(
                "customCategoryCodes",
                custom_codes.with(CsvFileSource::new(
                    csv_dir.join(CUSTOM_CODES_CSV),
                    parse_custom_codes,
                )),
            ),
        }
    }

    /// Builds the caches from configured locations.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self::new(settings.open_store()?, &settings.csv_dir))
    }

    pub fn categories(&self) -> &DatasetCache<Category> {
        &self.categories
    }

    /// Category rows as stored, one per category and country.
    pub fn category_rows(&self) -> &DatasetCache<CategoryRow> {
        &self.category_rows
    }

    pub fn store_lists(&self) -> &DatasetCache<StoreList> {
        &self.store_lists
    }

    pub fn boosters(&self) -> &DatasetCache<Booster> {
        &self.boosters
    }

    pub fn custom_codes(&self) -> &DatasetCache<CustomCode> {
        &self.custom_codes
    }

    /// Forgets every cached dataset.
    pub fn invalidate_all(&self) {
        self.categories.invalidate();
        self.category_rows.invalidate();
        self.store_lists.invalidate();
        self.boosters.invalidate();
        self.custom_codes.invalidate();
    }
}

fn decode_categories(documents: Vec<Document>) -> Result<Vec<Category>> {
    let rows: Vec<CategoryRow> = decode_all(&documents)?;
    Ok(group_categories(rows))
}

fn decode_all_documents<T: DeserializeOwned>(documents: Vec<Document>) -> Result<Vec<T>> {
    decode_all(&documents)
}

fn decode_store_lists(documents: Vec<Document>) -> Result<Vec<StoreList>> {
    let mut lists: Vec<StoreList> = decode_all(&documents)?;
    sort_store_lists(&mut lists);
    Ok(lists)
}

fn decode_boosters(documents: Vec<Document>) -> Result<Vec<Booster>> {
    let mut boosters: Vec<Booster> = decode_all(&documents)?;
    sort_boosters(&mut boosters);
    Ok(boosters)
}
