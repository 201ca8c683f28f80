use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Whether an order line comes from a standard store list or a booster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Standard,
    Booster,
}

/// One retailer line of an order, for one category in one country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderEntry {
    pub id: String,
    pub category: String,
    pub country: String,
    pub retailer: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_list_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly_quota: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_quota: Option<i64>,
    #[serde(with = "iso_date")]
    pub start_date: NaiveDate,
    #[serde(with = "iso_date")]
    pub end_date: NaiveDate,
    #[serde(default)]
    pub collection_notes: String,
}

/// Retailer setup for a single category/country pair while an order is being
/// configured.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryConfig {
    pub category_id: String,
    pub category_name: String,
    pub country: String,
    /// Names of the selected standard store lists.
    pub selected_store_lists: Vec<String>,
    /// Identifiers of the selected boosters.
    pub selected_boosters: Vec<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub collection_notes: String,
    pub proceed_without_list: bool,
}

impl CategoryConfig {
    /// Creates an empty configuration for a category in one country.
    pub fn new(
        category_id: impl Into<String>,
        category_name: impl Into<String>,
        country: impl Into<String>,
    ) -> Self {
        Self {
            category_id: category_id.into(),
            category_name: category_name.into(),
            country: country.into(),
            ..Self::default()
        }
    }

    /// Key that identifies the category/country pair.
    pub fn key(&self) -> String {
        format!("{}::{}", self.category_id, self.country)
    }

    /// Human-facing label used in warnings, e.g. `Soda (US)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.category_name, self.country)
    }
}

/// An order that has been finalized and persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmittedOrder {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub submitted_by: String,
    pub submitted_by_email: String,
    pub submitted_at: DateTime<Utc>,
    pub entries: Vec<OrderEntry>,
}

/// Per category/country summary of an order's lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RollupLine {
    pub label: String,
    pub standard: usize,
    pub booster: usize,
    pub monthly_total: i64,
}

/// Dates are written as `YYYY-MM-DD`; full RFC 3339 timestamps written by
/// older snapshots are accepted and truncated to their calendar date.
mod iso_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        if let Ok(date) = NaiveDate::parse_from_str(&text, FORMAT) {
            return Ok(date);
        }
        DateTime::parse_from_rfc3339(&text)
            .map(|stamp| stamp.date_naive())
            .map_err(|err| D::Error::custom(format!("invalid date '{text}': {err}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_accept_timestamp_dates() {
        let json = serde_json::json!({
            "id": "e1",
            "category": "Soda",
            "country": "US",
            "retailer": "Target",
            "type": "booster",
            "startDate": "2024-03-01T00:00:00.000Z",
            "endDate": "2024-03-31",
            "collectionNotes": ""
        });
        let entry: OrderEntry = serde_json::from_value(json).unwrap();
        assert_eq!(entry.entry_type, EntryType::Booster);
        assert_eq!(entry.start_date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(entry.end_date, NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());
        assert_eq!(entry.store_list_name, None);
    }

    #[test]
    fn config_label_and_key() {
        let config = CategoryConfig::new("c1", "Soda", "US");
        assert_eq!(config.key(), "c1::US");
        assert_eq!(config.label(), "Soda (US)");
        assert!(!config.proceed_without_list);
    }
}
