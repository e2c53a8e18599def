//! JSON Lines directory store.
//!
//! A database is a directory; each collection is a `<collection>.jsonl` file
//! with one record per line. Existing collections are loaded on
//! [`JsonlStore::open`], so collection-name enumeration sees records from
//! earlier runs. Writes go to memory and are persisted by
//! [`DocumentStore::flush`], which rewrites only the collections touched
//! since the last flush.
//!
//! # Notes
//! - Empty/whitespace-only lines are skipped on load.
//! - Each collection is written to a `.jsonl.tmp` sibling and renamed into
//!   place, so an interrupted flush leaves the previous file intact.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::store::{DocumentStore, MemoryStore};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{create_dir_all, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

const EXTENSION: &str = "jsonl";

pub struct JsonlStore {
    dir: PathBuf,
    memory: MemoryStore,
    dirty: Mutex<BTreeSet<String>>,
}

impl JsonlStore {
    /// Open (creating if needed) the database directory `dir`.
    ///
    /// # Errors
    /// Returns [`Error::Connection`] if the directory cannot be created or
    /// an existing collection file cannot be read or parsed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let target = dir.display().to_string();
        let connection = |message: String| Error::Connection {
            target: target.clone(),
            message,
        };

        create_dir_all(&dir).map_err(|e| connection(format!("mkdir -p: {e}")))?;
        let entries = std::fs::read_dir(&dir).map_err(|e| connection(format!("read dir: {e}")))?;

        let mut collections = BTreeMap::new();
        for entry in entries {
            let path = entry.map_err(|e| connection(e.to_string()))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let docs = read_collection(&path).map_err(connection)?;
            collections.insert(name.to_string(), docs);
        }

        tracing::debug!(dir = %dir.display(), collections = collections.len(), "opened jsonl store");
        Ok(Self {
            dir,
            memory: MemoryStore::with_collections(collections),
            dirty: Mutex::new(BTreeSet::new()),
        })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// In-memory view of the current contents, including unflushed writes.
    #[must_use]
    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    fn collection_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.{EXTENSION}"))
    }

    fn lock_dirty(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.dirty.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mark_dirty(&self, collection: &str) {
        self.lock_dirty().insert(collection.to_string());
    }

    fn write_collection(&self, collection: &str) -> std::io::Result<usize> {
        let docs = self.memory.collection(collection);
        let path = self.collection_path(collection);
        let tmp = path.with_extension(format!("{EXTENSION}.tmp"));

        let mut w = BufWriter::new(File::create(&tmp)?);
        for doc in &docs {
            serde_json::to_writer(&mut w, doc)?;
            w.write_all(b"\n")?;
        }
        w.flush()?;
        drop(w);
        std::fs::rename(&tmp, &path)?;
        Ok(docs.len())
    }
}

fn read_collection(path: &Path) -> std::result::Result<Vec<Document>, String> {
    let f = File::open(path).map_err(|e| format!("open {}: {e}", path.display()))?;
    let mut out = Vec::new();
    for (i, line) in BufReader::new(f).lines().enumerate() {
        let line = line.map_err(|e| format!("read line {} in {}: {e}", i + 1, path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let json: serde_json::Value = serde_json::from_str(&line)
            .map_err(|e| format!("parse line {} in {}: {e}", i + 1, path.display()))?;
        let doc = Document::from_json(&json)
            .ok_or_else(|| format!("line {} in {} is not an object", i + 1, path.display()))?;
        out.push(doc);
    }
    Ok(out)
}

impl DocumentStore for JsonlStore {
    fn list_collection_names(&self) -> Result<Vec<String>> {
        self.memory.list_collection_names()
    }

    fn insert(&self, collection: &str, document: &Document) -> Result<()> {
        self.memory.insert(collection, document)?;
        self.mark_dirty(collection);
        Ok(())
    }

    fn push_append(
        &self,
        collection: &str,
        identity: &str,
        field: &str,
        value: &Document,
    ) -> Result<()> {
        self.memory.push_append(collection, identity, field, value)?;
        self.mark_dirty(collection);
        Ok(())
    }

    /// A collection stays dirty until its file has been replaced, so a
    /// failed flush can be retried.
    fn flush(&self) -> Result<()> {
        let pending: Vec<String> = self.lock_dirty().iter().cloned().collect();
        for collection in &pending {
            let n = self
                .write_collection(collection)
                .map_err(|e| Error::store_write(collection, e))?;
            self.lock_dirty().remove(collection);
            tracing::debug!(collection = collection.as_str(), records = n, "collection flushed");
        }
        Ok(())
    }
}
