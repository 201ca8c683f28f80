use std::cmp::Ordering;
use std::collections::HashMap;

use indexmap::IndexMap;

use crate::retail::intake::collate::{locale_cmp, parse_leading_int};
use crate::retail::intake::model::{CodeRecord, DuplicateGroup};

/// Options for the duplicate report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuplicateOptions {
    /// Drop groups in which every country uses the code at most once. Records
    /// without a country share a single bucket.
    pub ignore_unique_per_country: bool,
}

impl Default for DuplicateOptions {
    fn default() -> Self {
        Self {
            ignore_unique_per_country: true,
        }
    }
}

/// Groups records by trimmed code and returns the groups with two or more
/// members, ordered by code.
///
/// The computation is pure; call it again whenever the records or the
/// options change.
pub fn find_duplicate_groups(
    records: &[CodeRecord],
    options: DuplicateOptions,
) -> Vec<DuplicateGroup> {
    let mut buckets: IndexMap<&str, Vec<CodeRecord>> = IndexMap::new();
    for record in records {
        let code = record.code.trim();
        if code.is_empty() {
            continue;
        }
        buckets.entry(code).or_default().push(record.clone());
    }

    let mut groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter(|(_, entries)| entries.len() >= 2)
        .filter(|(_, entries)| {
            !options.ignore_unique_per_country || repeats_within_country(entries)
        })
        .map(|(code, entries)| DuplicateGroup {
            code: code.to_string(),
            entries,
        })
        .collect();

    groups.sort_by(|lhs, rhs| compare_codes(&lhs.code, &rhs.code));
    groups
}

fn repeats_within_country(entries: &[CodeRecord]) -> bool {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        *counts
            .entry(entry.country.trim().to_lowercase())
            .or_default() += 1;
    }
    counts.values().any(|&count| count > 1)
}

/// Orders group codes: numeric codes compare numerically, and a non-numeric
/// code sits where a string compare against the digits would put it, so
/// `#5` precedes every number and `B7` follows them. Non-numeric codes compare
/// among themselves in locale order. The raw text breaks ties so the order
/// stays total.
pub fn compare_codes(lhs: &str, rhs: &str) -> Ordering {
    match (parse_leading_int(lhs), parse_leading_int(rhs)) {
        (Some(a), Some(b)) => a.cmp(&b).then_with(|| lhs.cmp(rhs)),
        (Some(_), None) => CodeRank::Numeric.cmp(&CodeRank::of_text(rhs)),
        (None, Some(_)) => CodeRank::of_text(lhs).cmp(&CodeRank::Numeric),
        (None, None) => CodeRank::of_text(lhs)
            .cmp(&CodeRank::of_text(rhs))
            .then_with(|| locale_cmp(lhs, rhs)),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CodeRank {
    BeforeDigits,
    Numeric,
    AfterDigits,
}

impl CodeRank {
    fn of_text(code: &str) -> Self {
        if locale_cmp(code, "0") == Ordering::Less {
            CodeRank::BeforeDigits
        } else {
            CodeRank::AfterDigits
        }
    }
}
