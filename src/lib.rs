//! # Microlector
//!
//! A **loader for fixed-width statistical microdata**. Survey microdata is
//! published as plain-text files where every record is one line and every
//! field sits at a fixed character position. A JSON *format definition*
//! describes the files of a survey: their record length, the fields with
//! their widths and types, and how files relate to each other. Microlector
//! reads the data files, decodes each field and writes one document per
//! record into a document store.
//!
//! ## Key Features
//!
//! - **Streaming** - data files are read chunk by chunk, never held whole in memory
//! - **Typed decoding** - integers, implied-decimal doubles and coded keys,
//!   including hierarchical (tree) codes resolved to a label path
//! - **Nesting** - records of a child file are appended to their parent record
//! - **Dependency ordering** - child files wait for their parent collection
//! - **Compressed input** - gzip, zstd, bzip2 and xz data files (feature flags)
//!
//! ## Quick Start
//!
//! ```no_run
//! use microlector::*;
//! use microlector::io::resolve::GlobResolver;
//!
//! # fn main() -> anyhow::Result<()> {
//! let definition = Catalog::new("formats").load("epf")?;
//! let store = JsonlStore::open("data/epf")?;
//! let resolver = GlobResolver::new("raw");
//!
//! let report = Scheduler::new(&store, &resolver).run(definition)?;
//! store.flush()?;
//! println!("{} records", report.total_records());
//! # Ok(())
//! # }
//! ```
//!
//! ## Format definitions
//!
//! ```json
//! [
//!   {"file": "hogares", "length": 7, "key": ["numero"],
//!    "fields": [
//!      {"name": "numero", "type": "integer", "length": 4},
//!      {"name": "region", "type": "key", "keytype": "string", "length": 2,
//!       "values": {"01": "Norte", "02": "Sur"}},
//!      {"name": "miembros", "type": "integer", "length": 1}
//!    ]},
//!   {"file": "personas", "length": 10, "parent": {"file": "hogares", "key": ["numero"]},
//!    "fields": [
//!      {"name": "numero", "type": "integer", "length": 4},
//!      {"name": "ingresos", "type": "double", "length": 6, "decimals": 2, "null": 999999}
//!    ]}
//! ]
//! ```
//!
//! Each `hogares` line becomes a document in collection `hogares` with
//! `_id` built from its key fields. Each `personas` line is appended to the
//! `personas` array of the `hogares` record it belongs to.
//!
//! ## Module Overview
//!
//! - [`definition`] - format definition types and JSON parsing
//! - [`decode`] - per-field decoding of raw text
//! - [`assembler`] - records to documents, and their placement
//! - [`io`] - chunked line reading, decompression and data file lookup
//! - [`scheduler`] - per-file loading with parent-first deferral
//! - [`store`] - document store trait with memory and JSON Lines backends
//! - [`validation`] - definition well-formedness checks
//! - [`testing`] - helpers for tests that drive the loader

pub mod assembler;
pub mod catalog;
pub mod config;
pub mod decode;
pub mod definition;
pub mod document;
pub mod error;
pub mod io;
pub mod report;
pub mod scheduler;
pub mod store;
pub mod testing;
pub mod validation;

// Re-exports
pub use assembler::{assemble, commit, place, Placement, RecordLayout};
pub use catalog::Catalog;
pub use config::IngestConfig;
pub use decode::{decode, Decoder};
pub use definition::{FieldSpec, FileSpec, FormatDefinition, LookupNode, LookupTable, ParentLink};
pub use document::{Document, Value, ID_FIELD};
pub use error::{Error, ErrorKind, Result};
pub use report::{FileReport, RunReport};
pub use scheduler::{Scheduler, SchedulerState, Step};
pub use store::{DocumentStore, JsonlStore, MemoryStore};
pub use validation::{Validate, ValidationError};
