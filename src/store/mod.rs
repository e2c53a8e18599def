//! Document store abstraction.
//!
//! The loader needs three operations from a store: enumerate collection
//! names, insert a record, and append a sub-document to an array field of an
//! existing record. [`DocumentStore`] is synchronous: every call returns
//! only once the write has completed or failed, which is what lets the
//! scheduler treat the end of a file as a completion barrier.
//!
//! ## Implementations
//! - [`MemoryStore`] - in-process collections, for tests and dry runs
//! - [`JsonlStore`] - one `<collection>.jsonl` file per collection in a
//!   database directory

use crate::document::Document;
use crate::error::Result;

pub mod jsonl;
pub mod memory;

pub use jsonl::JsonlStore;
pub use memory::MemoryStore;

/// Operations required of the target document store.
pub trait DocumentStore {
    /// Names of all collections currently holding at least one record.
    ///
    /// # Errors
    /// Returns [`Error::Connection`](crate::Error::Connection) if the store
    /// cannot be queried.
    fn list_collection_names(&self) -> Result<Vec<String>>;

    /// Insert `document` as a new record. Never deduplicates by identity.
    ///
    /// # Errors
    /// Returns [`Error::StoreWrite`](crate::Error::StoreWrite) if the write is rejected.
    fn insert(&self, collection: &str, document: &Document) -> Result<()>;

    /// Append `value` to the array `field` of the record whose identity is
    /// `identity`, creating the array if it is absent.
    ///
    /// # Errors
    /// Returns [`Error::StoreWrite`](crate::Error::StoreWrite) if the
    /// record does not exist, `field` holds a non-array value, or the write
    /// is rejected.
    fn push_append(
        &self,
        collection: &str,
        identity: &str,
        field: &str,
        value: &Document,
    ) -> Result<()>;

    /// Make completed writes durable. A no-op for stores that write through.
    ///
    /// # Errors
    /// Returns [`Error::StoreWrite`](crate::Error::StoreWrite) if persisting fails.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn list_collection_names(&self) -> Result<Vec<String>> {
        (**self).list_collection_names()
    }

    fn insert(&self, collection: &str, document: &Document) -> Result<()> {
        (**self).insert(collection, document)
    }

    fn push_append(
        &self,
        collection: &str,
        identity: &str,
        field: &str,
        value: &Document,
    ) -> Result<()> {
        (**self).push_append(collection, identity, field, value)
    }

    fn flush(&self) -> Result<()> {
        (**self).flush()
    }
}
