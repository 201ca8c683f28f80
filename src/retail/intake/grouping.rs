//! Normalizes flat source rows into the entities the rest of the crate uses.
//!
//! Category exports carry one row per category and country. Rows that share
//! a name (compared case-insensitively) are merged into one [`Category`]:
//! countries accumulate, descriptions and brands are de-duplicated, and the
//! `department`, `subDepartment` and `notes` fields only ever fill gaps, so
//! the first non-empty value in row order wins. `premium` keeps the value of
//! the first row.

use indexmap::IndexMap;
use indexmap::map::Entry;
use tracing::{debug, warn};

use crate::retail::intake::collate::locale_cmp;
use crate::retail::intake::error::Result;
use crate::retail::intake::io::csv_read::{CsvRecord, parse_records};
use crate::retail::intake::model::{
    Booster, Category, CategoryRow, CustomCode, StoreList, StoreListRetailer,
};

/// Merges per-country category rows into one record per distinct name.
pub fn group_categories<I>(rows: I) -> Vec<Category>
where
    I: IntoIterator<Item = CategoryRow>,
{
    let mut drafts: IndexMap<String, CategoryDraft> = IndexMap::new();

    for row in rows {
        let name = row.name.trim();
        if name.is_empty() {
            continue;
        }
        match drafts.entry(name.to_lowercase()) {
            Entry::Occupied(mut slot) => slot.get_mut().merge(row),
            Entry::Vacant(slot) => {
                slot.insert(CategoryDraft::seed(row));
            }
        }
    }

    let mut categories: Vec<Category> = drafts.into_values().map(CategoryDraft::finish).collect();
    categories.sort_by(|lhs, rhs| locale_cmp(&lhs.name, &rhs.name));
    categories
}

/// Parses a category export and groups its rows. Rows without a name are
/// logged and skipped.
pub fn parse_and_group_categories(text: &str) -> Result<Vec<Category>> {
    let categories = group_categories(parse_category_rows(text)?);
    debug!(category_count = categories.len(), "grouped categories");
    Ok(categories)
}

/// Parses a category export into its raw per-country rows.
pub fn parse_category_rows(text: &str) -> Result<Vec<CategoryRow>> {
    Ok(valid_rows(parse_records(text)?, CategoryRow::from_record))
}

/// Groups store-list rows (one per retailer) into lists keyed by name and
/// country. Retailers keep their row order; lists are sorted by name.
pub fn group_store_lists(records: &[CsvRecord]) -> Vec<StoreList> {
    let mut lists: IndexMap<(String, String), StoreList> = IndexMap::new();

    for record in records {
        let name = record.get("name").trim();
        let country = record.get("country").trim();
        if name.is_empty() || country.is_empty() {
            continue;
        }

        let retailer = StoreListRetailer::from_record(record);
        lists
            .entry((name.to_string(), country.to_string()))
            .or_insert_with(|| StoreList {
                id: String::new(),
                name: name.to_string(),
                country: country.to_string(),
                retailers: Vec::new(),
            })
            .retailers
            .push(retailer);
    }

    let mut lists: Vec<StoreList> = lists.into_values().collect();
    lists.sort_by(|lhs, rhs| locale_cmp(&lhs.name, &rhs.name));
    lists
}

/// Parses a store-list export.
pub fn parse_store_lists(text: &str) -> Result<Vec<StoreList>> {
    Ok(group_store_lists(&parse_records(text)?))
}

/// Parses a booster export, keeping rows with both a name and a country.
pub fn parse_boosters(text: &str) -> Result<Vec<Booster>> {
    let mut boosters = valid_rows(parse_records(text)?, Booster::from_record);
    sort_boosters(&mut boosters);
    Ok(boosters)
}

/// Parses a custom-code export, keeping rows with a category code.
pub fn parse_custom_codes(text: &str) -> Result<Vec<CustomCode>> {
    Ok(valid_rows(parse_records(text)?, CustomCode::from_record))
}

/// Sorts boosters by name in display order.
pub fn sort_boosters(boosters: &mut [Booster]) {
    boosters.sort_by(|lhs, rhs| locale_cmp(&lhs.name, &rhs.name));
}

/// Sorts store lists by name in display order.
pub fn sort_store_lists(lists: &mut [StoreList]) {
    lists.sort_by(|lhs, rhs| locale_cmp(&lhs.name, &rhs.name));
}

fn valid_rows<T>(records: Vec<CsvRecord>, build: impl Fn(&CsvRecord) -> Result<T>) -> Vec<T> {
    records
        .iter()
        .filter_map(|record| match build(record) {
            Ok(row) => Some(row),
            Err(error) => {
                warn!(%error, "skipping source row");
                None
            }
        })
        .collect()
}

/// Accumulates the rows of one category before it is finalized.
struct CategoryDraft {
    category: Category,
    descriptions: Vec<String>,
}

impl CategoryDraft {
    fn seed(row: CategoryRow) -> Self {
        let descriptions = if row.description.trim().is_empty() {
            Vec::new()
        } else {
            vec![row.description.clone()]
        };
        let countries = if row.country.is_empty() {
            Vec::new()
        } else {
            vec![row.country]
        };

        Self {
            category: Category {
                id: row.id,
                name: row.name.trim().to_string(),
                countries,
                department: row.department,
                sub_department: row.sub_department,
                description: row.description,
                example_brands: row.example_brands,
                notes: row.notes,
                number: row.number,
                premium: row.premium,
            },
            descriptions,
        }
    }

    fn merge(&mut self, row: CategoryRow) {
        let category = &mut self.category;

        if !row.country.is_empty() && !category.countries.contains(&row.country) {
            category.countries.push(row.country);
        }

        if !row.description.trim().is_empty() && !self.descriptions.contains(&row.description) {
            self.descriptions.push(row.description);
        }
        category.description = merge_descriptions(self.descriptions.iter().map(String::as_str));

        category.example_brands =
            merge_example_brands([category.example_brands.as_str(), row.example_brands.as_str()]);

        fill_gap(&mut category.department, row.department);
        fill_gap(&mut category.sub_department, row.sub_department);
        fill_gap(&mut category.notes, row.notes);

        if !row.number.is_empty() {
            if category.number.is_empty() {
                category.number = row.number;
            } else if category.number != row.number && !category.number.contains(&row.number) {
                category.number = format!("{}, {}", category.number, row.number);
            }
        }
    }

    fn finish(self) -> Category {
        self.category
    }
}

fn fill_gap(slot: &mut String, candidate: String) {
    if slot.is_empty() && !candidate.is_empty() {
        *slot = candidate;
    }
}

/// Joins distinct, non-empty descriptions with `" | "`; a single description
/// is returned unwrapped.
pub fn merge_descriptions<'a>(descriptions: impl IntoIterator<Item = &'a str>) -> String {
    let mut unique: Vec<&str> = Vec::new();
    for description in descriptions {
        if !description.trim().is_empty() && !unique.contains(&description) {
            unique.push(description);
        }
    }
    unique.join(" | ")
}

/// Splits every brand list on commas and re-joins the distinct brands in
/// first-seen order with `", "`.
pub fn merge_example_brands<'a>(brands: impl IntoIterator<Item = &'a str>) -> String {
    let mut unique: Vec<&str> = Vec::new();
    for brand in brands.into_iter().flat_map(|list| list.split(',')).map(str::trim) {
        if !brand.is_empty() && !unique.contains(&brand) {
            unique.push(brand);
        }
    }
    unique.join(", ")
}

/// Categories matching a free-text query. Name, department, description and
/// example brands match case-insensitively, either literally or with
/// everything but letters and digits removed from both sides, so `heb` finds
/// `H-E-B`. Countries match literally. A blank query keeps every category.
pub fn search_categories<'a>(categories: &'a [Category], query: &str) -> Vec<&'a Category> {
    if query.trim().is_empty() {
        return categories.iter().collect();
    }
    let query = query.to_lowercase();
    let squeezed = alphanumeric_lowercase(&query);

    categories
        .iter()
        .filter(|category| {
            let text_match = [
                &category.name,
                &category.department,
                &category.description,
                &category.example_brands,
            ]
            .into_iter()
            .any(|field| {
                field.to_lowercase().contains(&query)
                    || (!squeezed.is_empty() && alphanumeric_lowercase(field).contains(&squeezed))
            });
            text_match
                || category
                    .countries
                    .iter()
                    .any(|country| country.to_lowercase().contains(&query))
        })
        .collect()
}

fn alphanumeric_lowercase(text: &str) -> String {
    text.chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}
