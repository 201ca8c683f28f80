//! Administration of the reference collections.
//!
//! Every editable record type implements [`AdminRecord`], which gives the
//! generic create/read/update/delete helpers in this module the collection to
//! talk to, how to tidy user input and which fields are mandatory.

use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{error, info};

use crate::retail::intake::config::{
    AUTHORIZED_USERS_CSV, BOOSTERS_CSV, CATEGORIES_CSV, CUSTOM_CODES_CSV, STORE_LISTS_CSV,
};
use crate::retail::intake::error::{IntakeError, Result};
use crate::retail::intake::io::csv_write;
use crate::retail::intake::io::store::{Collection, DocumentStore, Fields, decode_all, to_fields};
use crate::retail::intake::model::{
    AuthorizedUser, Booster, CategoryRow, CodeType, CustomCode, StoreList, StoreListRetailer,
    StoreListRow, generate_id,
};

/// A record type that can be managed from the admin screens.
pub trait AdminRecord: Serialize + DeserializeOwned {
    const COLLECTION: Collection;

    /// File name used when the collection is exported as CSV.
    const EXPORT_FILE: &'static str;

    fn id(&self) -> &str;

    /// Trims user input and fills defaults.
    fn normalize(&mut self);

    /// Rejects records missing required fields.
    fn validate(&self) -> Result<()>;

    /// Whether the record matches an already lowercased search query.
    fn matches(&self, query: &str) -> bool;

    /// CSV rows for this record, without its identifier.
    fn export_rows(&self) -> Result<Vec<Fields>> {
        Ok(vec![to_fields(self)?])
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn contains(haystack: &str, query: &str) -> bool {
    haystack.to_lowercase().contains(query)
}

fn required(message: &str) -> IntakeError {
    IntakeError::Validation(message.to_string())
}

impl AdminRecord for CategoryRow {
    const COLLECTION: Collection = Collection::Categories;
    const EXPORT_FILE: &'static str = CATEGORIES_CSV;

    fn id(&self) -> &str {
        &self.id
    }

    fn normalize(&mut self) {
        for field in [
            &mut self.name,
            &mut self.country,
            &mut self.department,
            &mut self.sub_department,
            &mut self.description,
            &mut self.example_brands,
            &mut self.notes,
            &mut self.number,
        ] {
            trim_in_place(field);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(required("Name is required"));
        }
        Ok(())
    }

    fn matches(&self, query: &str) -> bool {
        contains(&self.name, query)
            || contains(&self.country, query)
            || contains(&self.department, query)
            || contains(&self.example_brands, query)
    }
}

impl AdminRecord for StoreList {
    const COLLECTION: Collection = Collection::StoreLists;
    const EXPORT_FILE: &'static str = STORE_LISTS_CSV;

    fn id(&self) -> &str {
        &self.id
    }

    fn normalize(&mut self) {
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.country);
        for retailer in &mut self.retailers {
            normalize_retailer(retailer);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.country.is_empty() {
            return Err(required("Name and Country are required"));
        }
        self.retailers.iter().try_for_each(validate_retailer)
    }

    fn matches(&self, query: &str) -> bool {
        contains(&self.name, query)
            || contains(&self.country, query)
            || self.retailers.iter().any(|r| contains(&r.retailer, query))
    }

    fn export_rows(&self) -> Result<Vec<Fields>> {
        self.rows().iter().map(to_fields::<StoreListRow>).collect()
    }
}

impl AdminRecord for Booster {
    const COLLECTION: Collection = Collection::Boosters;
    const EXPORT_FILE: &'static str = BOOSTERS_CSV;

    fn id(&self) -> &str {
        &self.id
    }

    fn normalize(&mut self) {
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.country);
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.country.is_empty() {
            return Err(required("Name and Country are required"));
        }
        Ok(())
    }

    fn matches(&self, query: &str) -> bool {
        contains(&self.name, query) || contains(&self.country, query)
    }
}

impl AdminRecord for AuthorizedUser {
    const COLLECTION: Collection = Collection::AuthorizedUsers;
    const EXPORT_FILE: &'static str = AUTHORIZED_USERS_CSV;

    fn id(&self) -> &str {
        &self.id
    }

    fn normalize(&mut self) {
        trim_in_place(&mut self.name);
        self.email = self.email.trim().to_lowercase();
    }

    fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.email.is_empty() {
            return Err(required("Name and Email are required"));
        }
        Ok(())
    }

    fn matches(&self, query: &str) -> bool {
        contains(&self.name, query) || contains(&self.email, query)
    }
}

impl AdminRecord for CustomCode {
    const COLLECTION: Collection = Collection::CustomCategoryCodes;
    const EXPORT_FILE: &'static str = CUSTOM_CODES_CSV;

    fn id(&self) -> &str {
        &self.id
    }

    fn normalize(&mut self) {
        for field in [
            &mut self.category_code,
            &mut self.customer,
            &mut self.category,
            &mut self.submitted_by,
            &mut self.notes,
            &mut self.job_ids,
            &mut self.code_type,
            &mut self.timestamp,
        ] {
            trim_in_place(field);
        }
        if self.code_type.is_empty() {
            self.code_type = CodeType::Custom.to_string();
        }
        if self.timestamp.is_empty() {
            self.timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        }
    }

    fn validate(&self) -> Result<()> {
        if self.category_code.is_empty() {
            return Err(required("Category Code is required"));
        }
        Ok(())
    }

    fn matches(&self, query: &str) -> bool {
        contains(&self.category_code, query)
            || contains(&self.customer, query)
            || contains(&self.category, query)
            || contains(&self.submitted_by, query)
            || contains(&self.job_ids, query)
    }
}

pub fn list_records<T: AdminRecord>(store: &dyn DocumentStore) -> Result<Vec<T>> {
    decode_all(&store.list(T::COLLECTION)?)
}

/// Looks up one record by identifier.
pub fn find_record<T: AdminRecord>(store: &dyn DocumentStore, id: &str) -> Result<T> {
    store
        .list(T::COLLECTION)?
        .into_iter()
        .find(|document| document.id == id)
        .ok_or_else(|| IntakeError::NotFound {
            collection: T::COLLECTION.to_string(),
            id: id.to_string(),
        })?
        .decode()
}

/// Normalizes, validates and stores a new record. Nothing is written when
/// validation fails.
pub fn add_record<T: AdminRecord>(store: &dyn DocumentStore, mut record: T) -> Result<String> {
    record.normalize();
    record.validate()?;
    let id = store.create(T::COLLECTION, to_fields(&record)?)?;
    info!(collection = %T::COLLECTION, %id, "record added");
    Ok(id)
}

/// Replaces the fields of an existing record.
pub fn update_record<T: AdminRecord>(
    store: &dyn DocumentStore,
    id: &str,
    mut record: T,
) -> Result<()> {
    record.normalize();
    record.validate()?;
    store.update(T::COLLECTION, id, to_fields(&record)?)?;
    info!(collection = %T::COLLECTION, %id, "record updated");
    Ok(())
}

pub fn delete_record<T: AdminRecord>(store: &dyn DocumentStore, id: &str) -> Result<()> {
    store.delete(T::COLLECTION, id)?;
    info!(collection = %T::COLLECTION, %id, "record deleted");
    Ok(())
}

/// Case-insensitive search; a blank query returns every record.
pub fn search_records<'a, T: AdminRecord>(records: &'a [T], query: &str) -> Vec<&'a T> {
    let query = query.trim().to_lowercase();
    records
        .iter()
        .filter(|record| query.is_empty() || record.matches(&query))
        .collect()
}

/// Writes the records matching `query` to `output` as CSV and returns how
/// many records were exported. Store lists produce one row per retailer.
pub fn export_records<T: AdminRecord>(
    store: &dyn DocumentStore,
    query: &str,
    output: &Path,
) -> Result<usize> {
    let records: Vec<T> = list_records(store)?;
    let matching = search_records(&records, query);
    let mut rows = Vec::new();
    for record in &matching {
        rows.extend(record.export_rows()?);
    }
    csv_write::write_fields_csv(output, &rows)?;
    info!(
        collection = %T::COLLECTION,
        records = matching.len(),
        rows = rows.len(),
        output = %output.display(),
        "records exported"
    );
    Ok(matching.len())
}

fn normalize_retailer(retailer: &mut StoreListRetailer) {
    trim_in_place(&mut retailer.retailer);
    if retailer.id.is_empty() {
        retailer.id = generate_id();
    }
}

fn validate_retailer(retailer: &StoreListRetailer) -> Result<()> {
    if retailer.retailer.is_empty() {
        return Err(required("Retailer name is required"));
    }
    Ok(())
}

fn save_retailers(store: &dyn DocumentStore, list: &StoreList) -> Result<()> {
    let mut fields = Fields::new();
    fields.insert("retailers".to_string(), serde_json::to_value(&list.retailers)?);
    store.update(Collection::StoreLists, &list.id, fields)
}

fn retailer_index(list: &StoreList, index: usize) -> Result<usize> {
    if index < list.retailers.len() {
        Ok(index)
    } else {
        Err(IntakeError::Validation(format!(
            "store list '{}' has no retailer at position {index}",
            list.name
        )))
    }
}

/// Appends a retailer to a store list, keeping its quotas.
pub fn add_retailer(
    store: &dyn DocumentStore,
    list_id: &str,
    mut retailer: StoreListRetailer,
) -> Result<()> {
    normalize_retailer(&mut retailer);
    validate_retailer(&retailer)?;
    let mut list: StoreList = find_record(store, list_id)?;
    list.retailers.push(retailer);
    save_retailers(store, &list)
}

/// Replaces the retailer at `index`, keeping its identifier.
pub fn update_retailer(
    store: &dyn DocumentStore,
    list_id: &str,
    index: usize,
    mut retailer: StoreListRetailer,
) -> Result<()> {
    let mut list: StoreList = find_record(store, list_id)?;
    let index = retailer_index(&list, index)?;
    retailer.id = list.retailers[index].id.clone();
    normalize_retailer(&mut retailer);
    validate_retailer(&retailer)?;
    list.retailers[index] = retailer;
    save_retailers(store, &list)
}

pub fn remove_retailer(store: &dyn DocumentStore, list_id: &str, index: usize) -> Result<()> {
    let mut list: StoreList = find_record(store, list_id)?;
    let index = retailer_index(&list, index)?;
    let removed = list.retailers.remove(index);
    info!(list = %list.name, retailer = %removed.retailer, "retailer removed");
    save_retailers(store, &list)
}

/// Whether `email` belongs to an authorized user. Store failures are logged
/// and treated as not authorized.
pub fn is_authorized(store: &dyn DocumentStore, email: &str) -> bool {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return false;
    }
    match store.find_by_field(Collection::AuthorizedUsers, "email", &Value::String(email)) {
        Ok(matches) => !matches.is_empty(),
        Err(err) => {
            error!(%err, "authorization check failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retail::intake::grouping::parse_store_lists;
    use crate::retail::intake::io::csv_read::read_table;
    use crate::retail::intake::io::store::{Document, MemoryStore};

    struct BrokenStore;

    impl DocumentStore for BrokenStore {
        fn list(&self, _: Collection) -> Result<Vec<Document>> {
            Err(IntakeError::Store("unreachable".into()))
        }
        fn create(&self, _: Collection, _: Fields) -> Result<String> {
            Err(IntakeError::Store("unreachable".into()))
        }
        fn update(&self, _: Collection, _: &str, _: Fields) -> Result<()> {
            Err(IntakeError::Store("unreachable".into()))
        }
        fn delete(&self, _: Collection, _: &str) -> Result<()> {
            Err(IntakeError::Store("unreachable".into()))
        }
    }

    fn retailer(name: &str, weekly: i64, monthly: i64) -> StoreListRetailer {
        StoreListRetailer {
            id: String::new(),
            retailer: name.into(),
            weekly_quota: weekly,
            monthly_quota: monthly,
        }
    }

    #[test]
    fn invalid_records_are_not_written() {
        let store = MemoryStore::new();
        let booster = Booster {
            name: "  Aldi ".into(),
            ..Booster::default()
        };
        match add_record(&store, booster) {
            Err(IntakeError::Validation(message)) => {
                assert_eq!(message, "Name and Country are required")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        let code = CustomCode::default();
        assert!(matches!(add_record(&store, code), Err(IntakeError::Validation(_))));
        assert!(store.list(Collection::Boosters).unwrap().is_empty());
        assert!(store.list(Collection::CustomCategoryCodes).unwrap().is_empty());
    }

    #[test]
    fn records_are_normalized_before_saving() {
        let store = MemoryStore::new();
        let id = add_record(
            &store,
            CustomCode {
                category_code: " 9001 ".into(),
                customer: " Acme ".into(),
                ..CustomCode::default()
            },
        )
        .unwrap();

        let saved: CustomCode = find_record(&store, &id).unwrap();
        assert_eq!(saved.id, id);
        assert_eq!(saved.category_code, "9001");
        assert_eq!(saved.customer, "Acme");
        assert_eq!(saved.code_type, "Custom");
        assert!(!saved.timestamp.is_empty());
    }

    #[test]
    fn update_search_and_delete() {
        let store = MemoryStore::new();
        let id = add_record(
            &store,
            CategoryRow {
                name: "Soda".into(),
                country: "US".into(),
                ..CategoryRow::default()
            },
        )
        .unwrap();
        update_record(
            &store,
            &id,
            CategoryRow {
                name: "Soda".into(),
                country: "US".into(),
                example_brands: "Fizz, Pop".into(),
                ..CategoryRow::default()
            },
        )
        .unwrap();

        let rows: Vec<CategoryRow> = list_records(&store).unwrap();
        assert_eq!(search_records(&rows, "POP").len(), 1);
        assert_eq!(search_records(&rows, "  ").len(), 1);
        assert!(search_records(&rows, "chips").is_empty());

        delete_record::<CategoryRow>(&store, &id).unwrap();
        assert!(list_records::<CategoryRow>(&store).unwrap().is_empty());
        assert!(matches!(
            delete_record::<CategoryRow>(&store, &id),
            Err(IntakeError::NotFound { .. })
        ));
    }

    #[test]
    fn retailers_are_edited_in_place() {
        let store = MemoryStore::new();
        let list_id = add_record(
            &store,
            StoreList {
                name: "Core".into(),
                country: "US".into(),
                retailers: vec![retailer("Target", 2, 8)],
                ..StoreList::default()
            },
        )
        .unwrap();

        add_retailer(&store, &list_id, retailer(" CVS ", 1, 4)).unwrap();
        assert!(matches!(
            add_retailer(&store, &list_id, retailer(" ", 1, 1)),
            Err(IntakeError::Validation(message)) if message == "Retailer name is required"
        ));

        let list: StoreList = find_record(&store, &list_id).unwrap();
        assert_eq!(list.retailers.len(), 2);
        assert_eq!(list.retailers[1].retailer, "CVS");
        assert_eq!(list.total_monthly(), 12);
        let original_id = list.retailers[0].id.clone();

        update_retailer(&store, &list_id, 0, retailer("Target Stores", 3, 9)).unwrap();
        remove_retailer(&store, &list_id, 1).unwrap();
        assert!(remove_retailer(&store, &list_id, 4).is_err());

        let list: StoreList = find_record(&store, &list_id).unwrap();
        assert_eq!(list.retailers.len(), 1);
        assert_eq!(list.retailers[0].retailer, "Target Stores");
        assert_eq!(list.retailers[0].id, original_id);
        assert_eq!(list.retailers[0].monthly_quota, 9);
    }

    #[test]
    fn authorization_compares_lowercased_email() {
        let store = MemoryStore::new();
        add_record(
            &store,
            AuthorizedUser {
                name: "Ana".into(),
                email: " Ana@Example.COM ".into(),
                ..AuthorizedUser::default()
            },
        )
        .unwrap();

        assert!(is_authorized(&store, "ana@example.com"));
        assert!(is_authorized(&store, "ANA@example.com"));
        assert!(!is_authorized(&store, "ben@example.com"));
        assert!(!is_authorized(&store, ""));
        assert!(!is_authorized(&BrokenStore, "ana@example.com"));
    }

    #[test]
    fn exports_leave_out_identifiers_and_unmatched_records() {
        let store = MemoryStore::new();
        for (name, country) in [("Aldi", "US"), ("Lidl", "DE"), ("Aldi Nord", "DE")] {
            add_record(
                &store,
                Booster {
                    name: name.into(),
                    country: country.into(),
                    ..Booster::default()
                },
            )
            .unwrap();
        }
        let dir = tempfile::tempdir().expect("temporary directory");
        let output = dir.path().join(Booster::EXPORT_FILE);

        assert_eq!(export_records::<Booster>(&store, "aldi", &output).unwrap(), 2);
        let table = read_table(&output).unwrap();
        assert_eq!(table.headers, vec!["name", "country"]);
        let mut names: Vec<&str> = table.records.iter().map(|r| r.get("name")).collect();
        names.sort();
        assert_eq!(names, vec!["Aldi", "Aldi Nord"]);

        assert!(matches!(
            export_records::<Booster>(&store, "costco", &output),
            Err(IntakeError::NoData)
        ));
    }

    #[test]
    fn store_list_export_has_one_row_per_retailer() {
        let store = MemoryStore::new();
        add_record(
            &store,
            StoreList {
                name: "Core".into(),
                country: "US".into(),
                retailers: vec![retailer("Target", 2, 8), retailer("CVS", 1, 4)],
                ..StoreList::default()
            },
        )
        .unwrap();
        let dir = tempfile::tempdir().expect("temporary directory");
        let output = dir.path().join(StoreList::EXPORT_FILE);

        assert_eq!(export_records::<StoreList>(&store, "", &output).unwrap(), 1);
        let lists = parse_store_lists(&std::fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].retailers.len(), 2);
        assert_eq!(lists[0].total_monthly(), 12);
    }
}
