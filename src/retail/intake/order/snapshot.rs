use std::fs;
use std::path::Path;

use tracing::debug;

use crate::retail::intake::error::{IntakeError, Result};
use crate::retail::intake::model::OrderEntry;

/// Persists in-progress entries as a JSON array with ISO dates.
pub fn save_snapshot(path: &Path, entries: &[OrderEntry]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(entries)?)?;
    debug!(path = %path.display(), entries = entries.len(), "order snapshot saved");
    Ok(())
}

/// Restores entries saved by [`save_snapshot`]. A missing file is an empty
/// order.
pub fn load_snapshot(path: &Path) -> Result<Vec<OrderEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

/// Adds `entries` after the ones already saved at `path` and returns the
/// new draft length.
pub fn append_entries(path: &Path, entries: &[OrderEntry]) -> Result<usize> {
    let mut draft = load_snapshot(path)?;
    draft.extend_from_slice(entries);
    save_snapshot(path, &draft)?;
    Ok(draft.len())
}

/// Drops the entry with identifier `id` from the saved draft.
pub fn remove_entry(path: &Path, id: &str) -> Result<OrderEntry> {
    let mut draft = load_snapshot(path)?;
    let position = draft
        .iter()
        .position(|entry| entry.id == id)
        .ok_or_else(|| IntakeError::NotFound {
            collection: "draft".to_string(),
            id: id.to_string(),
        })?;
    let removed = draft.remove(position);
    save_snapshot(path, &draft)?;
    Ok(removed)
}

/// Empties the saved draft.
pub fn clear_entries(path: &Path) -> Result<()> {
    save_snapshot(path, &[])
}
