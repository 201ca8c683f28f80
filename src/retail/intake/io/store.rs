//! Document-store access for the reference collections.
//!
//! The hosted database is an external collaborator; the crate only needs
//! generic create/read/update/delete over collections of JSON objects.
//! [`MemoryStore`] backs tests and embedding, [`JsonDirStore`] keeps one JSON
//! file per collection on disk.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::retail::intake::error::{IntakeError, Result};
use crate::retail::intake::model::generate_id;

/// Field mapping of a stored document, excluding its identifier.
pub type Fields = Map<String, Value>;

/// Maximum number of documents written per batch.
pub const BATCH_LIMIT: usize = 450;

/// Logical collections held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Categories,
    StoreLists,
    Boosters,
    AuthorizedUsers,
    CustomCategoryCodes,
    SubmittedOrders,
}

impl Collection {
    /// Name of the collection as used by the hosted store.
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::Categories => "categories",
            Collection::StoreLists => "storeLists",
            Collection::Boosters => "boosters",
            Collection::AuthorizedUsers => "authorizedUsers",
            Collection::CustomCategoryCodes => "customCategoryCodes",
            Collection::SubmittedOrders => "submittedOrders",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored document: an identifier plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    /// Splits a JSON object carrying a string `id` member into a document.
    pub fn from_value(value: Value) -> Result<Self> {
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(IntakeError::Store(format!("expected a JSON object, found {other}")));
            }
        };
        match fields.shift_remove("id") {
            Some(Value::String(id)) => Ok(Self { id, fields }),
            _ => Err(IntakeError::Store("document without a string id".to_string())),
        }
    }

    /// Decodes the document into a typed record. The identifier is exposed to
    /// the record as its `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut fields = self.fields.clone();
        fields.insert("id".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}

/// Serializes a record into document fields, dropping any `id` member.
pub fn to_fields<T: Serialize>(record: &T) -> Result<Fields> {
    match serde_json::to_value(record)? {
        Value::Object(mut fields) => {
            fields.shift_remove("id");
            Ok(fields)
        }
        other => Err(IntakeError::Store(format!(
            "expected an object payload, found {other}"
        ))),
    }
}

/// Decodes every document of a listing into typed records.
pub fn decode_all<T: DeserializeOwned>(documents: &[Document]) -> Result<Vec<T>> {
    documents.iter().map(Document::decode).collect()
}

/// Generic document-store operations used by loaders, admin and seeding.
pub trait DocumentStore: Send + Sync {
    /// Returns every document in the collection.
    fn list(&self, collection: Collection) -> Result<Vec<Document>>;

    /// Stores a new document and returns its identifier.
    fn create(&self, collection: Collection, fields: Fields) -> Result<String>;

    /// Merges `fields` into an existing document.
    fn update(&self, collection: Collection, id: &str, fields: Fields) -> Result<()>;

    /// Removes a document.
    fn delete(&self, collection: Collection, id: &str) -> Result<()>;

    /// Returns the documents whose `field` equals `value`.
    fn find_by_field(
        &self,
        collection: Collection,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>> {
        Ok(self
            .list(collection)?
            .into_iter()
            .filter(|document| document.fields.get(field) == Some(value))
            .collect())
    }

    /// Stores many documents, at most [`BATCH_LIMIT`] per batch, and returns
    /// how many were written.
    fn create_many(&self, collection: Collection, documents: Vec<Fields>) -> Result<usize> {
        let mut written = 0;
        for chunk in documents.chunks(BATCH_LIMIT) {
            for fields in chunk {
                self.create(collection, fields.clone())?;
            }
            written += chunk.len();
            debug!(%collection, written, "batch committed");
        }
        Ok(written)
    }
}

type CollectionMap = BTreeMap<String, Fields>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn not_found(collection: Collection, id: &str) -> IntakeError {
    IntakeError::NotFound {
        collection: collection.to_string(),
        id: id.to_string(),
    }
}

/// In-process store; documents are listed in identifier order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<Collection, CollectionMap>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        let collections = lock(&self.collections);
        Ok(collections
            .get(&collection)
            .map(to_documents)
            .unwrap_or_default())
    }

    fn create(&self, collection: Collection, fields: Fields) -> Result<String> {
        let id = generate_id();
        lock(&self.collections)
            .entry(collection)
            .or_default()
            .insert(id.clone(), fields);
        Ok(id)
    }

    fn update(&self, collection: Collection, id: &str, fields: Fields) -> Result<()> {
        let mut collections = lock(&self.collections);
        let document = collections
            .get_mut(&collection)
            .and_then(|documents| documents.get_mut(id))
            .ok_or_else(|| not_found(collection, id))?;
        document.extend(fields);
        Ok(())
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        lock(&self.collections)
            .get_mut(&collection)
            .and_then(|documents| documents.remove(id))
            .map(|_| ())
            .ok_or_else(|| not_found(collection, id))
    }
}

/// Store that keeps each collection as a pretty-printed JSON array in
/// `<dir>/<collection>.json`. A missing file is an empty collection.
#[derive(Debug)]
pub struct JsonDirStore {
    dir: PathBuf,
    guard: Mutex<()>,
}

impl JsonDirStore {
    /// Opens (and creates if needed) the store directory.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            guard: Mutex::new(()),
        })
    }

    fn path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.as_str()))
    }

    fn read(&self, collection: Collection) -> Result<CollectionMap> {
        let path = self.path(collection);
        if !path.exists() {
            return Ok(CollectionMap::new());
        }

        let text = fs::read_to_string(&path)?;
        let items: Vec<Value> = serde_json::from_str(&text)?;
        items
            .into_iter()
            .map(|item| {
                Document::from_value(item)
                    .map(|document| (document.id, document.fields))
                    .map_err(|err| IntakeError::Store(format!("{}: {err}", path.display())))
            })
            .collect()
    }

    fn write(&self, collection: Collection, documents: &CollectionMap) -> Result<()> {
        let items: Vec<Value> = to_documents(documents)
            .into_iter()
            .map(|document| {
                let mut fields = Fields::new();
                fields.insert("id".to_string(), Value::String(document.id));
                fields.extend(document.fields);
                Value::Object(fields)
            })
            .collect();
        fs::write(self.path(collection), serde_json::to_string_pretty(&items)?)?;
        Ok(())
    }

    fn modify<R>(
        &self,
        collection: Collection,
        change: impl FnOnce(&mut CollectionMap) -> Result<R>,
    ) -> Result<R> {
        let _guard = lock(&self.guard);
        let mut documents = self.read(collection)?;
        let outcome = change(&mut documents)?;
        self.write(collection, &documents)?;
        Ok(outcome)
    }
}

impl DocumentStore for JsonDirStore {
    fn list(&self, collection: Collection) -> Result<Vec<Document>> {
        let _guard = lock(&self.guard);
        Ok(to_documents(&self.read(collection)?))
    }

    fn create(&self, collection: Collection, fields: Fields) -> Result<String> {
        self.modify(collection, |documents| {
            let id = generate_id();
            documents.insert(id.clone(), fields);
            Ok(id)
        })
    }

    fn update(&self, collection: Collection, id: &str, fields: Fields) -> Result<()> {
        self.modify(collection, |documents| {
            let document = documents
                .get_mut(id)
                .ok_or_else(|| not_found(collection, id))?;
            document.extend(fields);
            Ok(())
        })
    }

    fn delete(&self, collection: Collection, id: &str) -> Result<()> {
        self.modify(collection, |documents| {
            documents
                .remove(id)
                .map(|_| ())
                .ok_or_else(|| not_found(collection, id))
        })
    }

    fn create_many(&self, collection: Collection, new_documents: Vec<Fields>) -> Result<usize> {
        let mut written = 0;
        for chunk in new_documents.chunks(BATCH_LIMIT) {
            self.modify(collection, |documents| {
                for fields in chunk {
                    documents.insert(generate_id(), fields.clone());
                }
                Ok(())
            })?;
            written += chunk.len();
            debug!(%collection, written, "batch committed");
        }
        Ok(written)
    }
}

fn to_documents(documents: &CollectionMap) -> Vec<Document> {
    documents
        .iter()
        .map(|(id, fields)| Document {
            id: id.clone(),
            fields: fields.clone(),
        })
        .collect()
}
