//! In-memory document store.
//!
//! Collections live behind an `Arc<Mutex<..>>`, so clones share state: a
//! test can hand one handle to the scheduler and inspect another.

use crate::document::{Document, Value};
use crate::error::{Error, Result};
use crate::store::DocumentStore;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Collections = BTreeMap<String, Vec<Document>>;

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<Collections>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `collections`.
    #[must_use]
    pub fn with_collections(collections: Collections) -> Self {
        Self {
            collections: Arc::new(Mutex::new(collections)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Collections> {
        self.collections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of a collection's records in insertion order.
    #[must_use]
    pub fn collection(&self, name: &str) -> Vec<Document> {
        self.lock().get(name).cloned().unwrap_or_default()
    }

    /// First record of `collection` whose identity is `id`.
    #[must_use]
    pub fn find(&self, collection: &str, id: &str) -> Option<Document> {
        self.lock()
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id() == Some(id)).cloned())
    }

    #[must_use]
    pub fn count(&self, collection: &str) -> usize {
        self.lock().get(collection).map_or(0, Vec::len)
    }

    /// Snapshot of every collection.
    #[must_use]
    pub fn snapshot(&self) -> Collections {
        self.lock().clone()
    }
}

impl DocumentStore for MemoryStore {
    fn list_collection_names(&self) -> Result<Vec<String>> {
        Ok(self
            .lock()
            .iter()
            .filter(|(_, docs)| !docs.is_empty())
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn insert(&self, collection: &str, document: &Document) -> Result<()> {
        self.lock()
            .entry(collection.to_string())
            .or_default()
            .push(document.clone());
        Ok(())
    }

    fn push_append(
        &self,
        collection: &str,
        identity: &str,
        field: &str,
        value: &Document,
    ) -> Result<()> {
        let mut collections = self.lock();
        let record = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id() == Some(identity)))
            .ok_or_else(|| {
                Error::store_write(collection, format!("no record with _id '{identity}'"))
            })?;

        match record.get_mut(field) {
            Some(Value::Array(items)) => items.push(Value::Document(value.clone())),
            Some(_) => {
                return Err(Error::store_write(
                    collection,
                    format!("field '{field}' of '{identity}' is not an array"),
                ));
            }
            None => record.insert(field, Value::Array(vec![Value::Document(value.clone())])),
        }
        Ok(())
    }
}
