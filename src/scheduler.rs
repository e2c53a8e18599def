//! Multi-file load scheduling.
//!
//! Files are loaded one at a time in definition order. A child file can
//! only be loaded once its parent's collection exists in the store, because
//! its records are appended to parent records. When the front file's parent
//! collection is missing the file is deferred: rotated to the back of the
//! queue and remembered in [`SchedulerState`]. A file that has to be
//! deferred a second time can never be satisfied (a missing or circular
//! parent), and the run fails with
//! [`Error::IncompleteDefinition`](crate::Error::IncompleteDefinition).
//!
//! Loading a file streams its lines through the [`RecordLayout`] and writes
//! each record before reading the next. A file is done only after its last
//! write has returned, so a store failure always stops the run before the
//! next file starts. Nothing is rolled back: records written before a
//! failure stay in the store.
//!
//! ```no_run
//! use microlector::{Catalog, MemoryStore, Scheduler};
//! use microlector::io::resolve::GlobResolver;
//! # fn main() -> anyhow::Result<()> {
//! let definition = Catalog::new("formats").load("epf")?;
//! let store = MemoryStore::new();
//! let resolver = GlobResolver::new("data/epf");
//! let report = Scheduler::new(&store, &resolver).run(definition)?;
//! println!("{} records", report.total_records());
//! # Ok(())
//! # }
//! ```

use crate::assembler::{commit, RecordLayout};
use crate::config::IngestConfig;
use crate::definition::{FileSpec, FormatDefinition};
use crate::error::{Error, Result};
use crate::io::lines::open_records;
use crate::io::resolve::PathResolver;
use crate::report::{FileReport, RunReport};
use crate::store::DocumentStore;
use crate::validation::Validate;
use std::collections::{HashSet, VecDeque};
use tracing::{info, warn};

/// Mutable scheduling state of one run.
#[derive(Debug, Clone, Default)]
pub struct SchedulerState {
    queue: VecDeque<FileSpec>,
    deferred_once: HashSet<String>,
}

impl SchedulerState {
    #[must_use]
    pub fn new(definition: FormatDefinition) -> Self {
        Self {
            queue: definition.into_files().into(),
            deferred_once: HashSet::new(),
        }
    }

    /// Pending file specs, front first.
    pub fn pending(&self) -> impl Iterator<Item = &FileSpec> {
        self.queue.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn was_deferred(&self, file: &str) -> bool {
        self.deferred_once.contains(file)
    }
}

/// Result of one scheduling step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Front file moved to the back; its parent collection is not there yet
    Deferred { file: String, parent: String },
    /// Front file fully loaded and removed from the queue
    Completed(FileReport),
    /// Queue is empty
    Finished,
}

/// Drives a definition through the line reader, assembler and store.
pub struct Scheduler<'a> {
    store: &'a dyn DocumentStore,
    resolver: &'a dyn PathResolver,
    config: IngestConfig,
}

impl<'a> Scheduler<'a> {
    pub fn new(store: &'a dyn DocumentStore, resolver: &'a dyn PathResolver) -> Self {
        Self {
            store,
            resolver,
            config: IngestConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: IngestConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    /// Load every file of `definition`.
    ///
    /// # Errors
    /// Returns the first failure of any file, or
    /// [`Error::InvalidDefinition`] in strict mode when the definition is
    /// not well-formed.
    pub fn run(&self, definition: FormatDefinition) -> Result<RunReport> {
        self.check(&definition)?;

        let mut state = SchedulerState::new(definition);
        let mut report = RunReport::default();
        loop {
            match self.step(&mut state)? {
                Step::Deferred { file, .. } => report.deferrals.push(file),
                Step::Completed(file) => report.files.push(file),
                Step::Finished => break,
            }
        }
        info!(
            files = report.files.len(),
            records = report.total_records(),
            "load finished"
        );
        Ok(report)
    }

    /// Process the front of the queue: defer it, load it, or report that
    /// nothing is left.
    ///
    /// # Errors
    /// - [`Error::IncompleteDefinition`] on a second deferral of one file.
    /// - Any error from loading the file (see [`Scheduler::load_file`]).
    pub fn step(&self, state: &mut SchedulerState) -> Result<Step> {
        let Some(front) = state.queue.front() else {
            return Ok(Step::Finished);
        };

        if let Some(parent) = &front.parent {
            let collections = self.store.list_collection_names()?;
            if !collections.iter().any(|name| *name == parent.file_id) {
                let file = front.id.clone();
                let parent = parent.file_id.clone();
                if state.deferred_once.contains(&file) {
                    return Err(Error::IncompleteDefinition { file, parent });
                }
                warn!(file = file.as_str(), parent = parent.as_str(), "parent not loaded yet, deferring");
                state.deferred_once.insert(file.clone());
                state.queue.rotate_left(1);
                return Ok(Step::Deferred { file, parent });
            }
        }

        let report = self.load_file(front)?;
        state.queue.pop_front();
        Ok(Step::Completed(report))
    }

    /// Stream one data file into the store.
    ///
    /// # Errors
    /// - [`Error::FieldDefinition`] / [`Error::UnsupportedType`] before any
    ///   line is read.
    /// - [`Error::Stream`] if the data file cannot be located or read.
    /// - [`Error::LineLengthMismatch`] on the first wrong-length line.
    /// - [`Error::StoreWrite`] on the first rejected write.
    pub fn load_file(&self, spec: &FileSpec) -> Result<FileReport> {
        let layout = RecordLayout::compile(spec)?;
        let path = self.resolver.resolve(spec)?;
        info!(file = spec.id.as_str(), path = %path.display(), "loading file");

        let mut records = 0u64;
        for line in open_records(&path, spec, self.config.chunk_size)? {
            let line = line?;
            commit(self.store, spec, layout.assemble(&line.text))?;
            records += 1;
        }

        info!(file = spec.id.as_str(), records, "records inserted");
        Ok(FileReport {
            file: spec.id.clone(),
            path,
            records,
        })
    }

    fn check(&self, definition: &FormatDefinition) -> Result<()> {
        let Err(violations) = definition.validate() else {
            return Ok(());
        };
        for v in &violations {
            warn!(violation = %v, "definition check");
        }
        if self.config.strict {
            let file = definition
                .files()
                .iter()
                .map(|f| f.id.as_str())
                .collect::<Vec<_>>()
                .join(",");
            return Err(Error::InvalidDefinition {
                file,
                violations: violations.iter().map(ToString::to_string).collect(),
            });
        }
        Ok(())
    }
}
