//! Fake store implementations for failure-path tests.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::store::{DocumentStore, MemoryStore};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A [`MemoryStore`] that accepts `limit` writes and rejects every later one
/// with [`Error::StoreWrite`].
///
/// Accepted writes stay visible through [`FailingStore::inner`].
#[derive(Debug)]
pub struct FailingStore {
    inner: MemoryStore,
    limit: usize,
    writes: AtomicUsize,
}

impl FailingStore {
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self::wrap(MemoryStore::new(), limit)
    }

    /// Wrap an existing store, e.g. one pre-populated with parent records.
    #[must_use]
    pub fn wrap(inner: MemoryStore, limit: usize) -> Self {
        Self {
            inner,
            limit,
            writes: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Writes attempted so far, rejected ones included.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn admit(&self, collection: &str) -> Result<()> {
        let n = self.writes.fetch_add(1, Ordering::SeqCst);
        if n >= self.limit {
            return Err(Error::StoreWrite {
                collection: collection.to_string(),
                message: format!("injected failure on write {}", n + 1),
            });
        }
        Ok(())
    }
}

impl DocumentStore for FailingStore {
    fn list_collection_names(&self) -> Result<Vec<String>> {
        self.inner.list_collection_names()
    }

    fn insert(&self, collection: &str, document: &Document) -> Result<()> {
        self.admit(collection)?;
        self.inner.insert(collection, document)
    }

    fn push_append(
        &self,
        collection: &str,
        identity: &str,
        field: &str,
        value: &Document,
    ) -> Result<()> {
        self.admit(collection)?;
        self.inner.push_append(collection, identity, field, value)
    }
}
