use chrono::Utc;
use indexmap::IndexMap;
use tracing::info;

use crate::retail::intake::error::{IntakeError, Result};
use crate::retail::intake::io::store::{Collection, DocumentStore, decode_all, to_fields};
use crate::retail::intake::model::{EntryType, OrderEntry, RollupLine, SubmittedOrder};

/// Persists a finished order stamped with the current time and returns its
/// identifier.
pub fn submit_order(
    store: &dyn DocumentStore,
    submitted_by: &str,
    submitted_by_email: &str,
    entries: Vec<OrderEntry>,
) -> Result<String> {
    if entries.is_empty() {
        return Err(IntakeError::Validation("An order needs at least one entry".into()));
    }

    let order = SubmittedOrder {
        id: String::new(),
        submitted_by: submitted_by.trim().to_string(),
        submitted_by_email: submitted_by_email.trim().to_lowercase(),
        submitted_at: Utc::now(),
        entries,
    };
    let id = store.create(Collection::SubmittedOrders, to_fields(&order)?)?;
    info!(
        order = %id,
        entries = order.entries.len(),
        by = %order.submitted_by_email,
        "order submitted"
    );
    Ok(id)
}

/// All submitted orders, newest first.
pub fn load_submitted_orders(store: &dyn DocumentStore) -> Result<Vec<SubmittedOrder>> {
    let documents = store.list(Collection::SubmittedOrders)?;
    let mut orders: Vec<SubmittedOrder> = decode_all(&documents)?;
    orders.sort_by(|lhs, rhs| rhs.submitted_at.cmp(&lhs.submitted_at));
    Ok(orders)
}

pub fn delete_submitted_order(store: &dyn DocumentStore, id: &str) -> Result<()> {
    store.delete(Collection::SubmittedOrders, id)?;
    info!(order = %id, "submitted order deleted");
    Ok(())
}

/// Case-insensitive search over the submitter and each entry's category,
/// retailer and country. A blank query matches everything.
pub fn search_orders<'a>(orders: &'a [SubmittedOrder], query: &str) -> Vec<&'a SubmittedOrder> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return orders.iter().collect();
    }

    let hit = |text: &str| text.to_lowercase().contains(&query);
    orders
        .iter()
        .filter(|order| {
            hit(&order.submitted_by)
                || hit(&order.submitted_by_email)
                || order
                    .entries
                    .iter()
                    .any(|e| hit(&e.category) || hit(&e.retailer) || hit(&e.country))
        })
        .collect()
}

/// Counts standard and booster lines per `Category (Country)` and sums the
/// monthly quotas, in order of first appearance.
pub fn category_rollup(entries: &[OrderEntry]) -> Vec<RollupLine> {
    let mut lines: IndexMap<String, RollupLine> = IndexMap::new();
    for entry in entries {
        let label = format!("{} ({})", entry.category, entry.country);
        let line = lines.entry(label.clone()).or_insert_with(|| RollupLine {
            label,
            standard: 0,
            booster: 0,
            monthly_total: 0,
        });
        match entry.entry_type {
            EntryType::Standard => line.standard += 1,
            EntryType::Booster => line.booster += 1,
        }
        line.monthly_total += entry.monthly_quota.unwrap_or(0);
    }
    lines.into_values().collect()
}
