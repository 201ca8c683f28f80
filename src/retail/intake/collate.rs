//! Ordering and lenient number helpers shared by the grouping and code modules.

use std::cmp::Ordering;

/// Compares two labels the way a human-facing list expects: letters are
/// compared case-insensitively first and the exact text only breaks ties.
pub fn locale_cmp(lhs: &str, rhs: &str) -> Ordering {
    let folded = lhs
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(rhs.chars().flat_map(char::to_lowercase));
    folded.then_with(|| lhs.cmp(rhs))
}

/// Parses the leading integer of `text`, ignoring surrounding whitespace and
/// any trailing non-digit characters. Returns `None` when no digit leads.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (negative, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let end = digits
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }

    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// Best-effort integer conversion used for quotas: anything unparseable is 0.
pub fn parse_int_or_zero(text: &str) -> i64 {
    parse_leading_int(text).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locale_order_ignores_case_before_tie_break() {
        let mut names = vec!["banana", "Apple", "apple", "Cherry"];
        names.sort_by(|a, b| locale_cmp(a, b));
        assert_eq!(names, vec!["Apple", "apple", "banana", "Cherry"]);
    }

    #[test]
    fn leading_int_matches_lenient_parsing() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int(" 12abc "), Some(12));
        assert_eq!(parse_leading_int("-7"), Some(-7));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_int_or_zero("n/a"), 0);
    }
}
