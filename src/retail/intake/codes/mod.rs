//! The master code directory: every standard and custom category code in one
//! searchable list.

pub mod duplicates;

use std::collections::BTreeSet;

use crate::retail::intake::collate::locale_cmp;
use crate::retail::intake::model::{CategoryRow, CodeRecord, CodeType, CustomCode, NO_CUSTOMER};

pub use duplicates::{DuplicateOptions, find_duplicate_groups};

/// One `Standard` record for every category row that carries a code.
pub fn standard_records(rows: &[CategoryRow]) -> Vec<CodeRecord> {
    rows.iter()
        .filter(|row| !row.number.trim().is_empty())
        .map(|row| CodeRecord {
            category: row.name.clone(),
            code: row.number.clone(),
            code_type: CodeType::Standard,
            country: row.country.clone(),
            department: row.department.clone(),
            customer: NO_CUSTOMER.to_string(),
        })
        .collect()
}

/// One `Custom` record for every custom code with a non-empty value. Custom
/// codes are not tied to a country.
pub fn custom_records(codes: &[CustomCode]) -> Vec<CodeRecord> {
    codes
        .iter()
        .filter(|code| !code.category_code.trim().is_empty())
        .map(|code| CodeRecord {
            category: code.category.clone(),
            code: code.category_code.clone(),
            code_type: CodeType::Custom,
            country: String::new(),
            department: String::new(),
            customer: if code.customer.is_empty() {
                NO_CUSTOMER.to_string()
            } else {
                code.customer.clone()
            },
        })
        .collect()
}

/// Builds the full directory, standard codes first, sorted by category.
pub fn build_directory(rows: &[CategoryRow], codes: &[CustomCode]) -> Vec<CodeRecord> {
    let mut records = standard_records(rows);
    records.extend(custom_records(codes));
    records.sort_by(|lhs, rhs| locale_cmp(&lhs.category, &rhs.category));
    records
}

/// Search and country filter applied to the directory view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryFilter {
    /// Case-insensitive substring matched against every column.
    pub search: String,
    /// Exact country to keep; `None` keeps all.
    pub country: Option<String>,
}

impl DirectoryFilter {
    pub fn matches(&self, record: &CodeRecord) -> bool {
        if let Some(country) = self.country.as_deref().filter(|c| !c.is_empty()) {
            if record.country != country {
                return false;
            }
        }

        let query = self.search.trim();
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        let code_type = record.code_type.to_string();
        [
            record.category.as_str(),
            record.code.as_str(),
            code_type.as_str(),
            record.country.as_str(),
            record.department.as_str(),
            record.customer.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
    }
}

/// Returns the records that pass `filter`, in directory order.
pub fn filter_directory<'a>(
    records: &'a [CodeRecord],
    filter: &DirectoryFilter,
) -> Vec<&'a CodeRecord> {
    records.iter().filter(|record| filter.matches(record)).collect()
}

/// Distinct, non-empty countries present in the directory, sorted.
pub fn directory_countries(records: &[CodeRecord]) -> Vec<String> {
    records
        .iter()
        .map(|record| record.country.trim())
        .filter(|country| !country.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, country: &str, number: &str) -> CategoryRow {
        CategoryRow {
            name: name.into(),
            country: country.into(),
            number: number.into(),
            department: "Grocery".into(),
            ..CategoryRow::default()
        }
    }

    fn custom(code: &str, category: &str, customer: &str) -> CustomCode {
        CustomCode {
            category_code: code.into(),
            category: category.into(),
            customer: customer.into(),
            ..CustomCode::default()
        }
    }

    #[test]
    fn directory_combines_both_sources() {
        let rows = vec![category("Soda", "US", "100"), category("Water", "US", " ")];
        let codes = vec![custom("900", "Bespoke", ""), custom("", "Blank", "Acme")];
        let directory = build_directory(&rows, &codes);

        assert_eq!(directory.len(), 2);
        assert_eq!(directory[0].category, "Bespoke");
        assert_eq!(directory[0].code_type, CodeType::Custom);
        assert_eq!(directory[0].customer, "--");
        assert_eq!(directory[0].country, "");
        assert_eq!(directory[1].code_type, CodeType::Standard);
        assert_eq!(directory[1].customer, "--");
    }

    #[test]
    fn filter_searches_every_column() {
        let directory = build_directory(
            &[category("Soda", "US", "100"), category("Chips", "CA", "200")],
            &[custom("300", "Dips", "Acme")],
        );

        let by_customer = DirectoryFilter {
            search: "acme".into(),
            country: None,
        };
        assert_eq!(filter_directory(&directory, &by_customer).len(), 1);

        let by_type = DirectoryFilter {
            search: "STANDARD".into(),
            country: None,
        };
        assert_eq!(filter_directory(&directory, &by_type).len(), 2);

        let by_country = DirectoryFilter {
            search: String::new(),
            country: Some("CA".into()),
        };
        let hits = filter_directory(&directory, &by_country);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].category, "Chips");
    }

    #[test]
    fn countries_are_distinct_and_sorted() {
        let directory = build_directory(
            &[
                category("Soda", "US", "1"),
                category("Chips", "CA", "2"),
                category("Dips", "US", "3"),
            ],
            &[custom("4", "Other", "")],
        );
        assert_eq!(directory_countries(&directory), vec!["CA", "US"]);
    }
}
