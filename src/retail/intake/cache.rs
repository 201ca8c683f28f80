//! Memoized dataset loading with an ordered fallback chain.
//!
//! A [`DatasetCache`] asks each [`DatasetSource`] in turn until one yields a
//! non-empty result, then keeps that result until [`DatasetCache::invalidate`]
//! is called. The lock is held while the chain runs, so concurrent first
//! loads trigger a single fetch.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use crate::retail::intake::error::{IntakeError, Result};
use crate::retail::intake::io::store::{Collection, Document, DocumentStore};

/// What a single source produced.
#[derive(Debug)]
pub enum SourceOutcome<T> {
    /// The source produced at least one record.
    Loaded(Vec<T>),
    /// The source answered but had nothing.
    Empty,
    /// The source could not be read.
    Failed(IntakeError),
}

impl<T> From<Result<Vec<T>>> for SourceOutcome<T> {
    fn from(result: Result<Vec<T>>) -> Self {
        match result {
            Ok(items) if items.is_empty() => SourceOutcome::Empty,
            Ok(items) => SourceOutcome::Loaded(items),
            Err(error) => SourceOutcome::Failed(error),
        }
    }
}

/// One place a dataset can be loaded from.
pub trait DatasetSource<T>: Send + Sync {
    /// Short label used in logs.
    fn name(&self) -> &str;

    fn fetch(&self) -> SourceOutcome<T>;
}

/// Sources tried in order until one loads.
pub struct SourceChain<T> {
    sources: Vec<Box<dyn DatasetSource<T>>>,
}

impl<T> Default for SourceChain<T> {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
        }
    }
}

impl<T> SourceChain<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a source with lower priority than the ones already present.
    pub fn with(mut self, source: impl DatasetSource<T> + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Runs the chain. Returns the first loaded result, or `None` when every
    /// source was empty or failed.
    pub fn run(&self, dataset: &str) -> Option<Vec<T>> {
        for source in &self.sources {
            match source.fetch() {
                SourceOutcome::Loaded(items) => {
                    info!(dataset, source = source.name(), count = items.len(), "dataset loaded");
                    return Some(items);
                }
                SourceOutcome::Empty => {
                    debug!(dataset, source = source.name(), "source returned no records");
                }
                SourceOutcome::Failed(error) => {
                    warn!(
                        dataset,
                        source = source.name(),
                        %error,
                        "source unavailable, falling back"
                    );
                }
            }
        }
        warn!(dataset, "every source failed or was empty");
        None
    }
}

/// Memoized dataset with explicit invalidation.
pub struct DatasetCache<T> {
    dataset: &'static str,
    chain: SourceChain<T>,
    cached: Mutex<Option<Arc<Vec<T>>>>,
}

impl<T> DatasetCache<T> {
    pub fn new(dataset: &'static str, chain: SourceChain<T>) -> Self {
        Self {
            dataset,
            chain,
            cached: Mutex::new(None),
        }
    }

    /// Returns the cached dataset, loading it first if needed. A chain that
    /// yields nothing produces an empty dataset that is not cached, so the
    /// next call tries again.
    pub fn load(&self) -> Arc<Vec<T>> {
        let mut cached = self.cached.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(items) = cached.as_ref() {
            return Arc::clone(items);
        }

        match self.chain.run(self.dataset) {
            Some(items) => {
                let items = Arc::new(items);
                *cached = Some(Arc::clone(&items));
                items
            }
            None => Arc::new(Vec::new()),
        }
    }

    /// Returns the cached dataset without loading; empty when nothing is
    /// cached.
    pub fn get(&self) -> Arc<Vec<T>> {
        self.cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_default()
    }

    /// Drops the cached value so the next [`load`](Self::load) refetches.
    pub fn invalidate(&self) {
        debug!(dataset = self.dataset, "cache invalidated");
        *self.cached.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_cached(&self) -> bool {
        self.cached
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

type DecodeFn<T> = fn(Vec<Document>) -> Result<Vec<T>>;
type ParseFn<T> = fn(&str) -> Result<Vec<T>>;

/// Reads a document-store collection and decodes it.
pub struct StoreSource<T> {
    store: Arc<dyn DocumentStore>,
    collection: Collection,
    decode: DecodeFn<T>,
}

impl<T> StoreSource<T> {
    pub fn new(store: Arc<dyn DocumentStore>, collection: Collection, decode: DecodeFn<T>) -> Self {
        Self {
            store,
            collection,
            decode,
        }
    }
}

impl<T: Send + Sync> DatasetSource<T> for StoreSource<T> {
    fn name(&self) -> &str {
        self.collection.as_str()
    }

    fn fetch(&self) -> SourceOutcome<T> {
        self.store
            .list(self.collection)
            .and_then(self.decode)
            .into()
    }
}

/// Reads a CSV export from disk and parses it.
pub struct CsvFileSource<T> {
    label: String,
    path: PathBuf,
    parse: ParseFn<T>,
}

impl<T> CsvFileSource<T> {
    pub fn new(path: impl Into<PathBuf>, parse: ParseFn<T>) -> Self {
        let path = path.into();
        Self {
            label: path.display().to_string(),
            path,
            parse,
        }
    }
}

impl<T: Send + Sync> DatasetSource<T> for CsvFileSource<T> {
    fn name(&self) -> &str {
        &self.label
    }

    fn fetch(&self) -> SourceOutcome<T> {
        if !self.path.exists() {
            return SourceOutcome::Failed(IntakeError::MissingInput(self.path.clone()));
        }
        fs::read_to_string(&self.path)
            .map_err(IntakeError::from)
            .and_then(|text| (self.parse)(&text))
            .into()
    }
}

/// Source backed by a closure.
pub struct FnSource<F> {
    label: String,
    fetch: F,
}

impl<F> FnSource<F> {
    pub fn new(label: impl Into<String>, fetch: F) -> Self {
        Self {
            label: label.into(),
            fetch,
        }
    }
}

impl<T, F> DatasetSource<T> for FnSource<F>
where
    F: Fn() -> Result<Vec<T>> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.label
    }

    fn fetch(&self) -> SourceOutcome<T> {
        (self.fetch)().into()
    }
}
