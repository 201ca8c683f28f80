//! End-to-end operations behind the command line: load reference data,
//! transform it and write the requested artefact.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use crate::retail::intake::admin::{AdminRecord, export_records, is_authorized};
use crate::retail::intake::catalog::Catalog;
use crate::retail::intake::codes::{
    DirectoryFilter, DuplicateOptions, build_directory, filter_directory, find_duplicate_groups,
};
use crate::retail::intake::config::Settings;
use crate::retail::intake::error::{IntakeError, Result};
use crate::retail::intake::io::store::{Collection, DocumentStore};
use crate::retail::intake::io::{csv_write, excel_write};
use crate::retail::intake::model::{
    AuthorizedUser, Booster, CategoryRow, CodeRecord, CustomCode, DuplicateGroup, StoreList,
    StoreListRow,
};
use crate::retail::intake::seed::{SeedResult, seed_from_csvs};

/// Writes the grouped categories as pretty JSON and returns how many were
/// written.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn export_categories_json(catalog: &Catalog, output: &Path) -> Result<usize> {
    let categories = catalog.categories().load();
    if categories.is_empty() {
        return Err(IntakeError::NoData);
    }
    fs::write(output, serde_json::to_string_pretty(categories.as_slice())?)?;
    info!(count = categories.len(), "categories exported");
    Ok(categories.len())
}

/// Standard and custom codes combined into the master directory.
pub fn load_directory(catalog: &Catalog) -> Vec<CodeRecord> {
    let rows = catalog.category_rows().load();
    let custom = catalog.custom_codes().load();
    let directory = build_directory(&rows, &custom);
    debug!(records = directory.len(), "directory built");
    directory
}

/// Exports the directory records passing `filter` as CSV.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn export_directory_csv(
    catalog: &Catalog,
    filter: &DirectoryFilter,
    output: &Path,
) -> Result<usize> {
    let directory = load_directory(catalog);
    let records: Vec<&CodeRecord> = filter_directory(&directory, filter);
    csv_write::write_csv(output, &records)?;
    info!(count = records.len(), total = directory.len(), "directory exported");
    Ok(records.len())
}

/// Codes shared by two or more directory records.
#[instrument(
    level = "info",
    skip_all,
    fields(ignore_unique_per_country = options.ignore_unique_per_country)
)]
pub fn duplicate_report(catalog: &Catalog, options: DuplicateOptions) -> Vec<DuplicateGroup> {
    let groups = find_duplicate_groups(&load_directory(catalog), options);
    info!(groups = groups.len(), "duplicate codes found");
    groups
}

pub fn write_duplicate_report(groups: &[DuplicateGroup], output: &Path) -> Result<()> {
    fs::write(output, serde_json::to_string_pretty(groups)?)?;
    Ok(())
}

pub fn flatten_store_lists(lists: &[StoreList]) -> Vec<StoreListRow> {
    lists.iter().flat_map(StoreList::rows).collect()
}

/// Picks the lists named in `names` (case-insensitive), or every list when
/// `names` is empty.
pub fn select_store_lists(lists: &[StoreList], names: &[String]) -> Vec<StoreList> {
    if names.is_empty() {
        return lists.to_vec();
    }
    for name in names {
        if !lists.iter().any(|list| list.name.eq_ignore_ascii_case(name)) {
            warn!(list = %name, "store list not found");
        }
    }
    lists
        .iter()
        .filter(|list| names.iter().any(|name| list.name.eq_ignore_ascii_case(name)))
        .cloned()
        .collect()
}

/// Exports store lists to a workbook (one sheet per list) or, for a `.csv`
/// output, to a flat retailer table. Returns the number of lists exported.
#[instrument(level = "info", skip_all, fields(output = %output.display()))]
pub fn export_store_lists(catalog: &Catalog, names: &[String], output: &Path) -> Result<usize> {
    let lists = select_store_lists(&catalog.store_lists().load(), names);
    if lists.is_empty() {
        return Err(IntakeError::NoData);
    }

    let as_csv = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if as_csv {
        csv_write::write_csv(output, &flatten_store_lists(&lists))?;
    } else {
        let workbook = excel_write::build_store_list_workbook(&lists);
        excel_write::write_workbook(output, &workbook)?;
    }
    info!(lists = lists.len(), "store lists exported");
    Ok(lists.len())
}

/// Exports the records of `collection` matching `query` from the configured
/// store. Without an explicit `output` the file lands in the CSV directory
/// under the collection's export name, where the next load picks it up.
/// Returns the path written and the number of records exported.
#[instrument(level = "info", skip_all, fields(%collection, query = query))]
pub fn export_collection(
    settings: &Settings,
    collection: Collection,
    query: &str,
    output: Option<&Path>,
) -> Result<(PathBuf, usize)> {
    let store = settings
        .open_store()?
        .ok_or_else(|| IntakeError::Validation("exports require a store directory".into()))?;
    let store = store.as_ref();

    match collection {
        Collection::Categories => export_to::<CategoryRow>(store, settings, query, output),
        Collection::StoreLists => export_to::<StoreList>(store, settings, query, output),
        Collection::Boosters => export_to::<Booster>(store, settings, query, output),
        Collection::AuthorizedUsers => export_to::<AuthorizedUser>(store, settings, query, output),
        Collection::CustomCategoryCodes => export_to::<CustomCode>(store, settings, query, output),
        Collection::SubmittedOrders => Err(IntakeError::Validation(
            "submitted orders cannot be exported as CSV".into(),
        )),
    }
}

fn export_to<T: AdminRecord>(
    store: &dyn DocumentStore,
    settings: &Settings,
    query: &str,
    output: Option<&Path>,
) -> Result<(PathBuf, usize)> {
    let path = output.map_or_else(|| settings.csv_path(T::EXPORT_FILE), Path::to_path_buf);
    let count = export_records::<T>(store, query, &path)?;
    Ok((path, count))
}

/// Seeds the configured store from the CSV exports.
#[instrument(level = "info", skip_all, fields(force = force))]
pub fn seed(settings: &Settings, force: bool) -> Result<SeedResult> {
    let store = settings
        .open_store()?
        .ok_or_else(|| IntakeError::Validation("seeding requires a store directory".into()))?;
    seed_from_csvs(store.as_ref(), &settings.csv_dir, force)
}

/// Whether `email` is on the authorized-user list of the configured store.
pub fn check_authorization(settings: &Settings, email: &str) -> Result<bool> {
    let store = settings.open_store()?.ok_or_else(|| {
        IntakeError::Validation("authorization checks require a store directory".into())
    })?;
    Ok(is_authorized(store.as_ref(), email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retail::intake::model::StoreListRetailer;

    fn list(name: &str) -> StoreList {
        StoreList {
            id: String::new(),
            name: name.into(),
            country: "US".into(),
            retailers: vec![StoreListRetailer {
                id: "r1".into(),
                retailer: "Target, Inc".into(),
                weekly_quota: 2,
                monthly_quota: 8,
            }],
        }
    }

    #[test]
    fn selection_is_case_insensitive_and_defaults_to_all() {
        let lists = vec![list("Core"), list("Extended")];
        assert_eq!(select_store_lists(&lists, &[]).len(), 2);
        let picked = select_store_lists(&lists, &["core".to_string(), "missing".to_string()]);
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "Core");
    }

    #[test]
    fn flattened_rows_match_export_columns() {
        let rows = flatten_store_lists(&[list("Core")]);
        let text = csv_write::to_csv_string(&rows).unwrap();
        assert_eq!(
            text,
            "name,country,retailer,weeklyQuota,monthlyQuota\nCore,US,\"Target, Inc\",2,8\n"
        );
    }

    #[test]
    fn seeding_without_store_is_rejected() {
        let settings = Settings::default();
        assert!(matches!(seed(&settings, false), Err(IntakeError::Validation(_))));
        assert!(check_authorization(&settings, "a@example.com").is_err());
        assert!(export_collection(&settings, Collection::Boosters, "", None).is_err());
    }
}
