//! Typed records for the reference data the intake service works with.
//!
//! Records can be built from CSV rows through validating constructors or
//! decoded from document-store payloads with serde. Field names follow the
//! camelCase spelling used by the CSV exports and the stored documents.

pub mod order;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::retail::intake::collate::parse_int_or_zero;
use crate::retail::intake::error::{IntakeError, Result};
use crate::retail::intake::io::csv_read::CsvRecord;

pub use order::{CategoryConfig, EntryType, OrderEntry, RollupLine, SubmittedOrder};

/// Placeholder used where a code record has no customer.
pub const NO_CUSTOMER: &str = "--";

/// Returns a fresh random identifier for records that arrive without one.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

/// One category as stored externally: a single category/country combination.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryRow {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub country: String,
    pub department: String,
    pub sub_department: String,
    pub description: String,
    pub example_brands: String,
    pub notes: String,
    pub number: String,
    #[serde(deserialize_with = "lenient_bool")]
    pub premium: bool,
}

impl CategoryRow {
    /// Builds a row from a parsed CSV record. The `name` column is required.
    pub fn from_record(record: &CsvRecord) -> Result<Self> {
        let name = record.get("name").trim();
        if name.is_empty() {
            return Err(IntakeError::InvalidRecord {
                line: record.line(),
                reason: "category name is empty".into(),
            });
        }

        Ok(Self {
            id: record.get("id").to_string(),
            name: name.to_string(),
            country: record.get("country").trim().to_string(),
            department: record.get("department").to_string(),
            sub_department: record.get("subDepartment").to_string(),
            description: record.get("description").to_string(),
            example_brands: record.get("exampleBrands").to_string(),
            notes: record.get("notes").to_string(),
            number: record.get("number").trim().to_string(),
            premium: record.get("premium") == "true",
        })
    }
}

/// A category merged across all the countries it is offered in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Countries in order of first appearance, without repeats.
    pub countries: Vec<String>,
    pub department: String,
    pub sub_department: String,
    /// Distinct descriptions joined with `" | "`.
    pub description: String,
    /// Distinct brands joined with `", "`.
    pub example_brands: String,
    pub notes: String,
    /// Distinct raw codes joined with `", "`.
    pub number: String,
    pub premium: bool,
}

/// A retailer inside a standard store list, with its preset quotas.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreListRetailer {
    pub id: String,
    pub retailer: String,
    #[serde(deserialize_with = "lenient_quota")]
    pub weekly_quota: i64,
    #[serde(deserialize_with = "lenient_quota")]
    pub monthly_quota: i64,
}

impl StoreListRetailer {
    /// Builds a retailer from one row of the store-list export.
    pub fn from_record(record: &CsvRecord) -> Self {
        let retailer = record.get("retailer").trim().to_string();
        let id = match record.get("id") {
            "" => generate_id(),
            id => id.to_string(),
        };
        Self {
            id,
            retailer,
            weekly_quota: parse_int_or_zero(record.get("weeklyQuota")),
            monthly_quota: parse_int_or_zero(record.get("monthlyQuota")),
        }
    }
}

/// A named, pre-configured group of retailers scoped to a country.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreList {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub country: String,
    pub retailers: Vec<StoreListRetailer>,
}

impl StoreList {
    /// Sum of the monthly quotas across all retailers.
    pub fn total_monthly(&self) -> i64 {
        self.retailers.iter().map(|r| r.monthly_quota).sum()
    }

    /// One flat row per retailer, in retailer order.
    pub fn rows(&self) -> Vec<StoreListRow> {
        self.retailers
            .iter()
            .map(|retailer| StoreListRow {
                name: self.name.clone(),
                country: self.country.clone(),
                retailer: retailer.retailer.clone(),
                weekly_quota: retailer.weekly_quota,
                monthly_quota: retailer.monthly_quota,
            })
            .collect()
    }
}

/// One retailer of a store list, flattened. The columns match the store-list
/// CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreListRow {
    pub name: String,
    pub country: String,
    pub retailer: String,
    pub weekly_quota: i64,
    pub monthly_quota: i64,
}

/// An optional, non-standard retailer that can be added to an order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Booster {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub country: String,
}

impl Booster {
    /// Builds a booster from a CSV record; both `name` and `country` are
    /// required.
    pub fn from_record(record: &CsvRecord) -> Result<Self> {
        let name = record.get("name").trim();
        let country = record.get("country").trim();
        if name.is_empty() || country.is_empty() {
            return Err(IntakeError::InvalidRecord {
                line: record.line(),
                reason: "booster requires a name and a country".into(),
            });
        }
        let id = match record.get("id") {
            "" => generate_id(),
            id => id.to_string(),
        };
        Ok(Self {
            id,
            name: name.to_string(),
            country: country.to_string(),
        })
    }
}

/// A person allowed into the admin screens.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorizedUser {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub email: String,
}

/// A category code entered ad hoc by a submitter, outside the standard list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomCode {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub category_code: String,
    pub customer: String,
    pub category: String,
    pub submitted_by: String,
    pub notes: String,
    pub job_ids: String,
    pub code_type: String,
    pub timestamp: String,
}

impl CustomCode {
    /// Builds a custom code from a CSV record; `categoryCode` is required.
    pub fn from_record(record: &CsvRecord) -> Result<Self> {
        let category_code = record.get("categoryCode").trim();
        if category_code.is_empty() {
            return Err(IntakeError::InvalidRecord {
                line: record.line(),
                reason: "custom code has no categoryCode".into(),
            });
        }
        let code_type = match record.get("codeType").trim() {
            "" => CodeType::Custom.to_string(),
            other => other.to_string(),
        };
        Ok(Self {
            id: record.get("id").to_string(),
            category_code: category_code.to_string(),
            customer: record.get("customer").trim().to_string(),
            category: record.get("category").trim().to_string(),
            submitted_by: record.get("submittedBy").trim().to_string(),
            notes: record.get("notes").trim().to_string(),
            job_ids: record.get("jobIds").trim().to_string(),
            code_type,
            timestamp: record.get("timestamp").trim().to_string(),
        })
    }
}

/// Origin of a code in the master directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeType {
    Standard,
    Custom,
}

impl fmt::Display for CodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeType::Standard => write!(f, "Standard"),
            CodeType::Custom => write!(f, "Custom"),
        }
    }
}

/// One line of the master code directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRecord {
    pub category: String,
    pub code: String,
    pub code_type: CodeType,
    pub country: String,
    pub department: String,
    pub customer: String,
}

/// Two or more code records that share the same code value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub code: String,
    pub entries: Vec<CodeRecord>,
}

fn lenient_quota<'de, D>(deserializer: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|v| v.trunc() as i64))
            .unwrap_or(0),
        Value::String(text) => parse_int_or_zero(&text),
        _ => 0,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(flag) => flag,
        Value::String(text) => text == "true",
        _ => false,
    })
}
