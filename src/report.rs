//! Per-file and per-run load summaries.
//!
//! ```no_run
//! # use microlector::report::RunReport;
//! # fn main() -> anyhow::Result<()> {
//! # let report = RunReport::default();
//! println!("{} records loaded", report.total_records());
//! report.save_to_file("load-report.json")?;
//! # Ok(())
//! # }
//! ```

use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Outcome of one fully loaded data file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub path: PathBuf,
    /// Records written to the store
    pub records: u64,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Completed files in processing order
    pub files: Vec<FileReport>,
    /// File ids in the order they were deferred
    pub deferrals: Vec<String>,
}

impl RunReport {
    #[must_use]
    pub fn total_records(&self) -> u64 {
        self.files.iter().map(|f| f.records).sum()
    }

    /// Position of `file` in processing order.
    #[must_use]
    pub fn position(&self, file: &str) -> Option<usize> {
        self.files.iter().position(|f| f.file == file)
    }

    /// Serialize the report as pretty JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report as JSON to `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}
