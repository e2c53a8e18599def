//! Error types for definition loading, decoding, streaming and storage.
//!
//! Every error is fatal to the current run. [`Error::kind`] gives a fieldless
//! [`ErrorKind`] so callers and tests can match on the category without
//! destructuring the payload.

use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Ingestion errors.
#[derive(Error, Debug)]
pub enum Error {
    /// No definition file exists for the requested format
    #[error("no definition found for file type '{file_type}' in {}", dir.display())]
    DefinitionNotFound { file_type: String, dir: PathBuf },

    /// Definition file exists but is not a valid format definition
    #[error("malformed definition {}: {message}", path.display())]
    DefinitionParse { path: PathBuf, message: String },

    /// Definition failed well-formedness checks in strict mode
    #[error("invalid definition for '{file}': {}", violations.join("; "))]
    InvalidDefinition { file: String, violations: Vec<String> },

    /// Document store could not be opened
    #[error("cannot connect to store '{target}': {message}")]
    Connection { target: String, message: String },

    /// Data file could not be opened or read
    #[error("cannot read data for '{file}': {message}")]
    Stream { file: String, message: String },

    /// A record line does not have the declared length
    #[error("line {line} of '{file}' has length {actual}, definition expects {expected}")]
    LineLengthMismatch {
        file: String,
        line: u64,
        expected: usize,
        actual: usize,
    },

    /// A key field has no `keytype`, or a tree key has no `keylength`
    #[error("bad definition for field '{field}': {message}")]
    FieldDefinition { field: String, message: String },

    /// Field `type` is not one of integer, double or key
    #[error("unsupported type '{type_name}' for field '{field}'")]
    UnsupportedType { field: String, type_name: String },

    /// Child file waits for a parent collection that never appears
    #[error("incomplete definition: '{file}' depends on '{parent}', which is never loaded")]
    IncompleteDefinition { file: String, parent: String },

    /// Store rejected a write
    #[error("write to collection '{collection}' failed: {message}")]
    StoreWrite { collection: String, message: String },
}

/// Error category without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DefinitionNotFound,
    DefinitionParse,
    InvalidDefinition,
    Connection,
    Stream,
    LineLengthMismatch,
    FieldDefinition,
    UnsupportedType,
    IncompleteDefinition,
    StoreWrite,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DefinitionNotFound { .. } => ErrorKind::DefinitionNotFound,
            Self::DefinitionParse { .. } => ErrorKind::DefinitionParse,
            Self::InvalidDefinition { .. } => ErrorKind::InvalidDefinition,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::Stream { .. } => ErrorKind::Stream,
            Self::LineLengthMismatch { .. } => ErrorKind::LineLengthMismatch,
            Self::FieldDefinition { .. } => ErrorKind::FieldDefinition,
            Self::UnsupportedType { .. } => ErrorKind::UnsupportedType,
            Self::IncompleteDefinition { .. } => ErrorKind::IncompleteDefinition,
            Self::StoreWrite { .. } => ErrorKind::StoreWrite,
        }
    }

    pub(crate) fn stream(file: &str, message: impl ToString) -> Self {
        Self::Stream {
            file: file.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn store_write(collection: &str, message: impl ToString) -> Self {
        Self::StoreWrite {
            collection: collection.to_string(),
            message: message.to_string(),
        }
    }
}
