use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::retail::intake::error::Result;
use crate::retail::intake::io::store::{DocumentStore, JsonDirStore};

/// File name of the category export.
pub const CATEGORIES_CSV: &str = "categories-export.csv";
/// File name of the store-list export (one row per retailer).
pub const STORE_LISTS_CSV: &str = "storelists-export.csv";
/// File name of the booster export.
pub const BOOSTERS_CSV: &str = "boosters-export.csv";
/// File name of the custom category code export.
pub const CUSTOM_CODES_CSV: &str = "customcategorycodes-export.csv";
/// File name of the authorized-user export. It is written, never read.
pub const AUTHORIZED_USERS_CSV: &str = "authorized-users-export.csv";

/// Locations the tool reads reference data from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding the CSV exports used as fallback and seed data.
    pub csv_dir: PathBuf,
    /// Directory of the JSON document store, when one is configured.
    pub store_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            csv_dir: PathBuf::from("."),
            store_dir: None,
        }
    }
}

impl Settings {
    /// Path of an export file inside the CSV directory.
    pub fn csv_path(&self, file_name: &str) -> PathBuf {
        self.csv_dir.join(file_name)
    }

    /// Opens the configured document store, if any.
    pub fn open_store(&self) -> Result<Option<Arc<dyn DocumentStore>>> {
        self.store_dir
            .as_deref()
            .map(open_json_store)
            .transpose()
    }
}

fn open_json_store(dir: &Path) -> Result<Arc<dyn DocumentStore>> {
    Ok(Arc::new(JsonDirStore::open(dir)?))
}
