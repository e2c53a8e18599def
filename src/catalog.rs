//! Format definition lookup.
//!
//! Definitions live in a directory as `<file type>.json`, e.g.
//! `formats/epf.json` for the household budget survey.

use crate::definition::FormatDefinition;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Directory of `<file type>.json` definitions.
#[derive(Debug, Clone)]
pub struct Catalog {
    dir: PathBuf,
}

impl Catalog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Available file types, sorted.
    ///
    /// # Errors
    /// Returns [`Error::DefinitionNotFound`] if the directory cannot be read.
    pub fn file_types(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|_| self.not_found("*"))?;
        let mut types: Vec<String> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter_map(|p| p.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        types.sort();
        Ok(types)
    }

    /// Read and parse the definition for `file_type`.
    ///
    /// # Errors
    /// - [`Error::DefinitionNotFound`] if `<dir>/<file_type>.json` is missing.
    /// - [`Error::DefinitionParse`] if it is not a valid definition.
    pub fn load(&self, file_type: &str) -> Result<FormatDefinition> {
        let path = self.dir.join(format!("{file_type}.json"));
        if file_type.is_empty() || !path.is_file() {
            return Err(self.not_found(file_type));
        }
        let text = std::fs::read_to_string(&path).map_err(|e| Error::DefinitionParse {
            path: path.clone(),
            message: e.to_string(),
        })?;
        let definition =
            FormatDefinition::from_json_str(&text).map_err(|e| Error::DefinitionParse {
                path: path.clone(),
                message: e.to_string(),
            })?;
        tracing::debug!(path = %path.display(), files = definition.files().len(), "definition loaded");
        Ok(definition)
    }

    fn not_found(&self, file_type: &str) -> Error {
        Error::DefinitionNotFound {
            file_type: file_type.to_string(),
            dir: self.dir.clone(),
        }
    }
}
