use std::fs;
use std::sync::Arc;

use chrono::NaiveDate;
use retail_intake::admin::{add_record, is_authorized};
use retail_intake::catalog::Catalog;
use retail_intake::config::{
    AUTHORIZED_USERS_CSV, BOOSTERS_CSV, CATEGORIES_CSV, STORE_LISTS_CSV, Settings,
};
use retail_intake::io::csv_read;
use retail_intake::io::store::{Collection, DocumentStore, JsonDirStore};
use retail_intake::model::{AuthorizedUser, Booster, EntryType};
use retail_intake::order;
use retail_intake::seed::seed_from_csvs;
use retail_intake::tasks;
use tempfile::tempdir;

fn write_exports(dir: &std::path::Path) {
    fs::write(
        dir.join(CATEGORIES_CSV),
        "id,name,country,number\nc1,Soda,US,100\nc1,Soda,CA,100\nc2,Chips,US,9\n",
    )
    .expect("categories written");
    fs::write(
        dir.join(STORE_LISTS_CSV),
        "name,country,retailer,weeklyQuota,monthlyQuota\n\
         Core,US,Target,2,8\nCore,US,CVS,1,4\nCore,CA,Loblaws,3,12\n",
    )
    .expect("store lists written");
    fs::write(dir.join(BOOSTERS_CSV), "name,country\nAldi,US\n").expect("boosters written");
}

#[test]
fn seeded_store_feeds_an_order_end_to_end() {
    let csv_dir = tempdir().expect("temporary directory");
    let store_dir = tempdir().expect("temporary directory");
    write_exports(csv_dir.path());

    let store: Arc<dyn DocumentStore> =
        Arc::new(JsonDirStore::open(store_dir.path()).expect("store opened"));
    let seeded = seed_from_csvs(store.as_ref(), csv_dir.path(), false).expect("seeded");
    assert_eq!(seeded.categories.written, 3);
    assert_eq!(seeded.store_lists.written, 2);
    assert_eq!(seeded.boosters.written, 1);
    assert_eq!(seeded.custom_codes.written, 0);

    // CSV exports are gone; everything must now come from the store.
    let empty_csv = tempdir().expect("temporary directory");
    let catalog = Catalog::new(Some(Arc::clone(&store)), empty_csv.path());
    let categories = catalog.categories().load();
    assert_eq!(categories.len(), 2);

    let soda_id = categories
        .iter()
        .find(|category| category.name == "Soda")
        .map(|category| category.id.clone())
        .expect("soda present");
    let mut configs = order::initial_configs(&categories, &[soda_id]);
    assert_eq!(configs.len(), 2);

    let boosters = catalog.boosters().load();
    let booster: &Booster = &boosters[0];
    configs[0].selected_store_lists = vec!["Core".into()];
    configs[0].selected_boosters = vec![booster.id.clone()];
    configs[0].start_date = NaiveDate::from_ymd_opt(2024, 6, 1);
    configs[0].end_date = NaiveDate::from_ymd_opt(2024, 6, 30);
    assert!(!order::validation_warnings(&configs).is_empty());

    order::apply_to_all(&mut configs, 0).expect("applied");
    assert!(order::validation_warnings(&configs).is_empty());

    let entries = order::build_entries(&configs, &catalog.store_lists().load(), &boosters)
        .expect("entries built");
    // US: Target, CVS, Aldi. CA: Loblaws, Aldi.
    assert_eq!(entries.len(), 5);
    assert_eq!(
        entries.iter().filter(|e| e.entry_type == EntryType::Booster).count(),
        2
    );

    let snapshot = store_dir.path().join("draft.json");
    order::save_snapshot(&snapshot, &entries).expect("snapshot saved");
    let restored = order::load_snapshot(&snapshot).expect("snapshot loaded");
    assert_eq!(restored, entries);

    let rollup = order::category_rollup(&restored);
    let mut labels: Vec<&str> = rollup.iter().map(|line| line.label.as_str()).collect();
    labels.sort();
    assert_eq!(labels, vec!["Soda (CA)", "Soda (US)"]);
    assert!(rollup.iter().all(|line| line.monthly_total == 12 && line.booster == 1));

    order::submit_order(store.as_ref(), "Ana", "ana@example.com", restored)
        .expect("order submitted");
    let reopened = JsonDirStore::open(store_dir.path()).expect("store reopened");
    let orders = order::load_submitted_orders(&reopened).expect("orders loaded");
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].entries.len(), 5);
    assert_eq!(order::search_orders(&orders, "loblaws").len(), 1);
}

#[test]
fn seeding_twice_needs_force() {
    let csv_dir = tempdir().expect("temporary directory");
    let store_dir = tempdir().expect("temporary directory");
    write_exports(csv_dir.path());

    let settings = Settings {
        csv_dir: csv_dir.path().to_path_buf(),
        store_dir: Some(store_dir.path().to_path_buf()),
    };
    tasks::seed(&settings, false).expect("first seed");
    let second = tasks::seed(&settings, false).expect("second seed");
    assert!(second.categories.skipped);
    assert!(second.store_lists.skipped);
    assert_eq!(second.total_written(), 0);

    let forced = tasks::seed(&settings, true).expect("forced seed");
    assert_eq!(forced.categories.written, 3);
    let store = JsonDirStore::open(store_dir.path()).expect("store opened");
    assert_eq!(store.list(Collection::Categories).expect("listed").len(), 6);
}

#[test]
fn authorization_uses_the_configured_store() {
    let store_dir = tempdir().expect("temporary directory");
    let settings = Settings {
        csv_dir: store_dir.path().to_path_buf(),
        store_dir: Some(store_dir.path().to_path_buf()),
    };

    let store = JsonDirStore::open(store_dir.path()).expect("store opened");
    add_record(
        &store,
        AuthorizedUser {
            id: String::new(),
            name: "Ana".into(),
            email: "Ana@Example.com".into(),
        },
    )
    .expect("user added");

    assert!(is_authorized(&store, "ana@example.com"));
    assert!(tasks::check_authorization(&settings, "ANA@example.com").expect("checked"));
    assert!(!tasks::check_authorization(&settings, "ben@example.com").expect("checked"));
}

#[test]
fn store_exports_feed_the_csv_fallback() {
    let csv_dir = tempdir().expect("temporary directory");
    let store_dir = tempdir().expect("temporary directory");
    write_exports(csv_dir.path());
    let store = JsonDirStore::open(store_dir.path()).expect("store opened");
    seed_from_csvs(&store, csv_dir.path(), false).expect("seeded");
    add_record(
        &store,
        AuthorizedUser {
            id: String::new(),
            name: "Ana".into(),
            email: "ana@example.com".into(),
        },
    )
    .expect("user added");

    let export_dir = tempdir().expect("temporary directory");
    let settings = Settings {
        csv_dir: export_dir.path().to_path_buf(),
        store_dir: Some(store_dir.path().to_path_buf()),
    };
    for collection in [Collection::Categories, Collection::StoreLists, Collection::Boosters] {
        tasks::export_collection(&settings, collection, "", None).expect("collection exported");
    }
    let (path, count) =
        tasks::export_collection(&settings, Collection::AuthorizedUsers, "ana", None)
            .expect("users exported");
    assert_eq!(path, export_dir.path().join(AUTHORIZED_USERS_CSV));
    assert_eq!(count, 1);
    let users = csv_read::read_table(&path).expect("users parsed");
    assert_eq!(users.headers, vec!["name", "email"]);

    let categories_csv =
        csv_read::read_table(&export_dir.path().join(CATEGORIES_CSV)).expect("categories parsed");
    assert_eq!(categories_csv.records.len(), 3);
    assert!(!categories_csv.headers.iter().any(|header| header == "id"));

    let catalog = Catalog::new(None, export_dir.path());
    let categories = catalog.categories().load();
    let mut names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Chips", "Soda"]);
    let soda = categories.iter().find(|c| c.name == "Soda").expect("soda present");
    assert_eq!(soda.countries.len(), 2);
    assert_eq!(catalog.store_lists().load().len(), 2);
    assert_eq!(catalog.boosters().load().len(), 1);

    assert!(tasks::export_collection(&settings, Collection::SubmittedOrders, "", None).is_err());
}

