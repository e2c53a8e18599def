//! Helpers for tests that drive the loader.
//!
//! - **Mock I/O**: temporary data files (plain or gzip) and a reader that
//!   hands out input in fixed-size pieces, to exercise chunk boundaries
//! - **Fakes**: a store that starts rejecting writes after a set count
//! - **Fixtures**: a small household/person definition with matching lines
//!
//! # Quick Start
//!
//! ```
//! use microlector::testing::*;
//! use microlector::{MemoryStore, Scheduler};
//! use microlector::io::MapResolver;
//!
//! # fn main() -> anyhow::Result<()> {
//! let dir = TempDirPath::new()?;
//! let mut paths = MapResolver::new();
//! paths.insert("hogares", write_data_file(&dir, "hogares.txt", &household_lines())?);
//! paths.insert("personas", write_data_file(&dir, "personas.txt", &person_lines())?);
//!
//! let store = MemoryStore::new();
//! let report = Scheduler::new(&store, &paths).run(household_definition())?;
//! assert_eq!(report.total_records(), 6);
//! # Ok(())
//! # }
//! ```

pub mod fakes;
pub mod fixtures;
pub mod mock_io;

pub use fakes::FailingStore;
pub use fixtures::{household_definition, household_lines, person_lines};
pub use mock_io::{mock_data_file, write_data_file, ChunkedReader, TempDirPath, TempFilePath};

#[cfg(feature = "compression-gzip")]
pub use mock_io::mock_gzip_file;
