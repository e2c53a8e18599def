//! Loader configuration.

use crate::io::lines::DEFAULT_CHUNK_SIZE;

/// Settings shared by every file of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestConfig {
    /// Bytes read from a data file per chunk
    pub chunk_size: usize,
    /// Treat definition validation warnings as fatal
    pub strict: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            strict: false,
        }
    }
}

impl IngestConfig {
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    #[must_use]
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}
