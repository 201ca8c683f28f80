//! Order configuration: turning selected categories into per-country
//! configurations, validating them and expanding them into order entries.

pub mod snapshot;
pub mod submission;

pub use snapshot::{append_entries, clear_entries, load_snapshot, remove_entry, save_snapshot};
pub use submission::{
    category_rollup, delete_submitted_order, load_submitted_orders, search_orders, submit_order,
};

use std::collections::HashSet;

use tracing::debug;

use crate::retail::intake::error::{IntakeError, Result};
use crate::retail::intake::model::{
    Booster, Category, CategoryConfig, EntryType, OrderEntry, StoreList, generate_id,
};

/// Creates one configuration per country of every selected category, in
/// category order.
pub fn initial_configs(categories: &[Category], selected_ids: &[String]) -> Vec<CategoryConfig> {
    let selected: HashSet<&str> = selected_ids.iter().map(String::as_str).collect();
    categories
        .iter()
        .filter(|category| selected.contains(category.id.as_str()))
        .flat_map(|category| {
            category
                .countries
                .iter()
                .map(|country| CategoryConfig::new(&category.id, &category.name, country))
        })
        .collect()
}

/// Copies the retailer setup of `configs[source_index]` to every
/// configuration. Category and country stay untouched.
pub fn apply_to_all(configs: &mut [CategoryConfig], source_index: usize) -> Result<()> {
    let source = configs.get(source_index).cloned().ok_or_else(|| {
        IntakeError::Validation(format!(
            "no configuration at index {source_index} ({} configured)",
            configs.len()
        ))
    })?;

    for config in configs.iter_mut() {
        config.selected_store_lists = source.selected_store_lists.clone();
        config.selected_boosters = source.selected_boosters.clone();
        config.start_date = source.start_date;
        config.end_date = source.end_date;
        config.collection_notes = source.collection_notes.clone();
        config.proceed_without_list = source.proceed_without_list;
    }
    Ok(())
}

/// Resets selections, dates and notes of one configuration.
pub fn clear_selection(config: &mut CategoryConfig) {
    *config = CategoryConfig::new(
        std::mem::take(&mut config.category_id),
        std::mem::take(&mut config.category_name),
        std::mem::take(&mut config.country),
    );
}

/// Returns every problem that blocks submission, in configuration order.
pub fn validation_warnings(configs: &[CategoryConfig]) -> Vec<String> {
    let mut warnings = Vec::new();
    for config in configs {
        let label = config.label();
        if config.selected_store_lists.is_empty()
            && !config.proceed_without_list
            && config.selected_boosters.is_empty()
        {
            warnings.push(format!("{label} needs a store list or booster selection."));
        }
        match (config.start_date, config.end_date) {
            (Some(start), Some(end)) if start > end => {
                warnings.push(format!("{label}: start date must be before end date."));
            }
            (Some(_), Some(_)) => {}
            _ => warnings.push(format!("{label} needs a collection period.")),
        }
    }
    warnings
}

/// Expands valid configurations into order entries: one standard entry per
/// retailer of each selected list (matched by name within the configuration's
/// country) and one booster entry per selected booster. Unknown lists and
/// boosters are skipped.
pub fn build_entries(
    configs: &[CategoryConfig],
    store_lists: &[StoreList],
    boosters: &[Booster],
) -> Result<Vec<OrderEntry>> {
    let warnings = validation_warnings(configs);
    if !warnings.is_empty() {
        return Err(IntakeError::Validation(warnings.join("\n")));
    }

    let mut entries = Vec::new();
    for config in configs {
        let (Some(start_date), Some(end_date)) = (config.start_date, config.end_date) else {
            continue;
        };
        let entry = |retailer: &str, entry_type: EntryType| OrderEntry {
            id: generate_id(),
            category: config.category_name.clone(),
            country: config.country.clone(),
            retailer: retailer.to_string(),
            entry_type,
            store_list_name: None,
            weekly_quota: None,
            monthly_quota: None,
            start_date,
            end_date,
            collection_notes: config.collection_notes.clone(),
        };

        for list_name in &config.selected_store_lists {
            let Some(list) = store_lists
                .iter()
                .find(|list| &list.name == list_name && list.country == config.country)
            else {
                debug!(
                    list = %list_name,
                    country = %config.country,
                    "store list not found, skipped"
                );
                continue;
            };
            entries.extend(list.retailers.iter().map(|retailer| OrderEntry {
                store_list_name: Some(list_name.clone()),
                weekly_quota: Some(retailer.weekly_quota),
                monthly_quota: Some(retailer.monthly_quota),
                ..entry(&retailer.retailer, EntryType::Standard)
            }));
        }

        for booster_id in &config.selected_boosters {
            match boosters.iter().find(|booster| &booster.id == booster_id) {
                Some(booster) => entries.push(entry(&booster.name, EntryType::Booster)),
                None => debug!(booster = %booster_id, "booster not found, skipped"),
            }
        }
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::retail::intake::model::StoreListRetailer;

    fn date(day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(2024, 5, day)
    }

    fn category(id: &str, name: &str, countries: &[&str]) -> Category {
        Category {
            id: id.into(),
            name: name.into(),
            countries: countries.iter().map(|c| c.to_string()).collect(),
            ..Category::default()
        }
    }

    fn store_list(name: &str, country: &str, retailers: &[(&str, i64, i64)]) -> StoreList {
        StoreList {
            id: String::new(),
            name: name.into(),
            country: country.into(),
            retailers: retailers
                .iter()
                .map(|(retailer, weekly, monthly)| StoreListRetailer {
                    id: retailer.to_string(),
                    retailer: retailer.to_string(),
                    weekly_quota: *weekly,
                    monthly_quota: *monthly,
                })
                .collect(),
        }
    }

    fn configured(country: &str) -> CategoryConfig {
        let mut config = CategoryConfig::new("c1", "Soda", country);
        config.selected_store_lists = vec!["Core".into()];
        config.start_date = date(1);
        config.end_date = date(31);
        config
    }

    #[test]
    fn one_config_per_selected_category_country() {
        let categories = vec![
            category("c1", "Soda", &["US", "CA"]),
            category("c2", "Chips", &["US"]),
        ];
        let configs = initial_configs(&categories, &["c1".to_string()]);
        let keys: Vec<String> = configs.iter().map(CategoryConfig::key).collect();
        assert_eq!(keys, vec!["c1::US", "c1::CA"]);
    }

    #[test]
    fn apply_to_all_copies_setup_only() {
        let mut configs = vec![configured("US"), CategoryConfig::new("c2", "Chips", "CA")];
        configs[0].selected_boosters = vec!["b1".into()];
        configs[0].collection_notes = "weekends".into();

        apply_to_all(&mut configs, 0).unwrap();
        assert_eq!(configs[1].selected_boosters, vec!["b1"]);
        assert_eq!(configs[1].collection_notes, "weekends");
        assert_eq!(configs[1].end_date, date(31));
        assert_eq!(configs[1].category_name, "Chips");
        assert_eq!(configs[1].country, "CA");

        assert!(matches!(
            apply_to_all(&mut configs, 5),
            Err(IntakeError::Validation(_))
        ));
    }

    #[test]
    fn clear_keeps_identity() {
        let mut config = configured("US");
        clear_selection(&mut config);
        assert_eq!(config, CategoryConfig::new("c1", "Soda", "US"));
    }

    #[test]
    fn warnings_use_fixed_wording() {
        let mut inverted = configured("US");
        inverted.start_date = date(20);
        inverted.end_date = date(2);
        let empty = CategoryConfig::new("c2", "Chips", "CA");
        let mut proceed = CategoryConfig::new("c3", "Gum", "MX");
        proceed.proceed_without_list = true;
        proceed.start_date = date(1);

        let warnings = validation_warnings(&[inverted, empty, proceed]);
        assert_eq!(
            warnings,
            vec![
                "Soda (US): start date must be before end date.",
                "Chips (CA) needs a store list or booster selection.",
                "Chips (CA) needs a collection period.",
                "Gum (MX) needs a collection period.",
            ]
        );
    }

    #[test]
    fn same_day_period_is_valid() {
        let mut config = configured("US");
        config.end_date = config.start_date;
        assert!(validation_warnings(&[config]).is_empty());
    }

    #[test]
    fn entries_expand_lists_and_boosters() {
        let lists = vec![
            store_list("Core", "US", &[("Target", 2, 8), ("CVS", 1, 4)]),
            store_list("Core", "CA", &[("Loblaws", 3, 12)]),
        ];
        let boosters = vec![Booster {
            id: "b1".into(),
            name: "Aldi".into(),
            country: "US".into(),
        }];
        let mut config = configured("US");
        config.selected_boosters = vec!["b1".into(), "missing".into()];
        config.selected_store_lists.push("Unknown".into());

        let entries = build_entries(&[config], &lists, &boosters).unwrap();
        let retailers: Vec<&str> = entries.iter().map(|e| e.retailer.as_str()).collect();
        assert_eq!(retailers, vec!["Target", "CVS", "Aldi"]);

        assert_eq!(entries[0].entry_type, EntryType::Standard);
        assert_eq!(entries[0].store_list_name.as_deref(), Some("Core"));
        assert_eq!(entries[0].monthly_quota, Some(8));
        assert_eq!(entries[2].entry_type, EntryType::Booster);
        assert_eq!(entries[2].monthly_quota, None);
        assert_ne!(entries[0].id, entries[1].id);
    }

    #[test]
    fn invalid_configs_build_nothing() {
        let config = CategoryConfig::new("c1", "Soda", "US");
        match build_entries(&[config], &[], &[]) {
            Err(IntakeError::Validation(message)) => {
                assert!(message.contains("Soda (US) needs a collection period."));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
