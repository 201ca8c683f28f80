use std::collections::HashSet;
use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};

use crate::retail::intake::error::Result;
use crate::retail::intake::model::StoreList;

/// Maximum sheet-name length accepted by spreadsheet applications.
pub const MAX_SHEET_NAME: usize = 31;

/// A single cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

/// A table that will be materialised as an Excel sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetTable {
    pub sheet_name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    /// Trailing summary row written in bold.
    pub totals: Option<Vec<Cell>>,
}

/// Represents all tables required to materialise the Excel workbook.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkbookData {
    pub tables: Vec<SheetTable>,
}

/// Lays out one sheet per store list: every retailer with its monthly quota,
/// followed by a totals row.
pub fn build_store_list_workbook(lists: &[StoreList]) -> WorkbookData {
    let mut names = SheetNameRegistry::default();

    let tables = lists
        .iter()
        .map(|list| SheetTable {
            sheet_name: names.assign(&list.name),
            columns: vec!["Retailer".to_string(), "Monthly Quota".to_string()],
            rows: list
                .retailers
                .iter()
                .map(|r| vec![Cell::Text(r.retailer.clone()), Cell::Number(r.monthly_quota as f64)])
                .collect(),
            totals: Some(vec![
                Cell::Text("Total".to_string()),
                Cell::Number(list.total_monthly() as f64),
            ]),
        })
        .collect();

    WorkbookData { tables }
}

/// Writes the provided workbook data to the given path.
pub fn write_workbook(path: &Path, workbook: &WorkbookData) -> Result<()> {
    let mut workbook_writer = Workbook::new();
    let bold = Format::new().set_bold();

    for table in &workbook.tables {
        let worksheet = workbook_writer.add_worksheet();
        worksheet.set_name(&table.sheet_name)?;

        for (col_idx, header) in table.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col_idx as u16, header, &bold)?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let (row, col) = ((row_idx + 1) as u32, col_idx as u16);
                match cell {
                    Cell::Text(value) => worksheet.write_string(row, col, value)?,
                    Cell::Number(value) => worksheet.write_number(row, col, *value)?,
                };
            }
        }

        if let Some(totals) = &table.totals {
            let row = (table.rows.len() + 1) as u32;
            for (col_idx, cell) in totals.iter().enumerate() {
                let col = col_idx as u16;
                match cell {
                    Cell::Text(value) => {
                        worksheet.write_string_with_format(row, col, value, &bold)?
                    }
                    Cell::Number(value) => {
                        worksheet.write_number_with_format(row, col, *value, &bold)?
                    }
                };
            }
        }

        worksheet.set_column_width(0, 32)?;
        worksheet.set_column_width(1, 16)?;
    }

    workbook_writer.save(path)?;
    Ok(())
}

#[derive(Debug, Default)]
struct SheetNameRegistry {
    used: HashSet<String>,
}

impl SheetNameRegistry {
    fn assign(&mut self, raw: &str) -> String {
        let base = sanitize_sheet_name(raw);
        if self.used.insert(base.to_lowercase()) {
            return base;
        }

        let mut counter = 2;
        loop {
            let suffix = format!(" ({counter})");
            let prefix = truncate_chars(&base, MAX_SHEET_NAME - suffix.chars().count());
            let candidate = format!("{prefix}{suffix}");
            if self.used.insert(candidate.to_lowercase()) {
                return candidate;
            }
            counter += 1;
        }
    }
}

/// Replaces characters Excel rejects and truncates to [`MAX_SHEET_NAME`].
pub fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']'];
    let sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    let trimmed = sanitized.trim().trim_matches('\'');
    if trimmed.is_empty() {
        return "Sheet".to_string();
    }
    truncate_chars(trimmed, MAX_SHEET_NAME).trim_end().to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retail::intake::model::StoreListRetailer;

    fn list(name: &str, quotas: &[(&str, i64)]) -> StoreList {
        StoreList {
            id: String::new(),
            name: name.to_string(),
            country: "US".to_string(),
            retailers: quotas
                .iter()
                .map(|(retailer, monthly)| StoreListRetailer {
                    id: retailer.to_string(),
                    retailer: retailer.to_string(),
                    weekly_quota: 0,
                    monthly_quota: *monthly,
                })
                .collect(),
        }
    }

    #[test]
    fn one_sheet_per_list_with_totals() {
        let workbook = build_store_list_workbook(&[list("Core", &[("Target", 8), ("CVS", 4)])]);
        let table = &workbook.tables[0];
        assert_eq!(table.sheet_name, "Core");
        assert_eq!(table.columns, vec!["Retailer", "Monthly Quota"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.totals,
            Some(vec![Cell::Text("Total".into()), Cell::Number(12.0)])
        );
    }

    #[test]
    fn long_names_are_truncated_and_deduplicated() {
        let long = "Grocery Nationwide Premium Retailers Extended";
        let workbook = build_store_list_workbook(&[list(long, &[]), list(long, &[])]);
        let first = &workbook.tables[0].sheet_name;
        let second = &workbook.tables[1].sheet_name;
        assert_eq!(first.chars().count(), MAX_SHEET_NAME);
        assert!(long.starts_with(first.as_str()));
        assert!(second.chars().count() <= MAX_SHEET_NAME);
        assert!(second.ends_with(" (2)"));
    }

    #[test]
    fn invalid_characters_are_replaced() {
        assert_eq!(sanitize_sheet_name("A/B: [C]"), "A_B_ _C_");
        assert_eq!(sanitize_sheet_name("   "), "Sheet");
    }
}
