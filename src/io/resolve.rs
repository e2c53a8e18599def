//! Locating the data file for a file spec.
//!
//! The loader does not prompt for paths. A [`PathResolver`] maps each
//! [`FileSpec`] to a path, either from explicit `id=path` pairs
//! ([`MapResolver`]) or by globbing `<dir>/<id>*` ([`GlobResolver`]).
//!
//! ```no_run
//! use microlector::io::resolve::{GlobResolver, MapResolver, PathResolver, ResolverChain};
//!
//! let mut map = MapResolver::new();
//! map.insert("hogares", "/data/epf/hogares_2023.txt");
//! let chain = ResolverChain::new()
//!     .with(map)
//!     .with(GlobResolver::new("/data/epf"));
//! ```

use crate::definition::FileSpec;
use crate::error::{Error, Result};
use glob::{glob, Pattern};
use std::collections::HashMap;
use std::path::PathBuf;

/// Maps a file spec to its data path.
pub trait PathResolver {
    /// Resolve the data path for `spec`.
    ///
    /// # Errors
    /// Returns [`Error::Stream`] when no data file can be located.
    fn resolve(&self, spec: &FileSpec) -> Result<PathBuf>;
}

impl<T: PathResolver + ?Sized> PathResolver for Box<T> {
    fn resolve(&self, spec: &FileSpec) -> Result<PathBuf> {
        (**self).resolve(spec)
    }
}

/// Explicit file id → path table.
#[derive(Debug, Clone, Default)]
pub struct MapResolver {
    paths: HashMap<String, PathBuf>,
}

impl MapResolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, path: impl Into<PathBuf>) {
        self.paths.insert(id.into(), path.into());
    }

    /// Parse an `ID=PATH` pair, as given on the command line.
    ///
    /// # Errors
    /// Returns a message if the text has no `=` or an empty id.
    pub fn parse_pair(text: &str) -> std::result::Result<(String, PathBuf), String> {
        match text.split_once('=') {
            Some((id, path)) if !id.is_empty() && !path.is_empty() => {
                Ok((id.to_string(), PathBuf::from(path)))
            }
            _ => Err(format!("expected ID=PATH, got '{text}'")),
        }
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.paths.contains_key(id)
    }
}

impl FromIterator<(String, PathBuf)> for MapResolver {
    fn from_iter<I: IntoIterator<Item = (String, PathBuf)>>(iter: I) -> Self {
        Self {
            paths: iter.into_iter().collect(),
        }
    }
}

impl PathResolver for MapResolver {
    fn resolve(&self, spec: &FileSpec) -> Result<PathBuf> {
        self.paths
            .get(&spec.id)
            .cloned()
            .ok_or_else(|| Error::stream(&spec.id, "no data path given"))
    }
}

/// Picks the first file (sorted) matching `<dir>/<id>*`.
#[derive(Debug, Clone)]
pub struct GlobResolver {
    dir: PathBuf,
}

impl GlobResolver {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl PathResolver for GlobResolver {
    fn resolve(&self, spec: &FileSpec) -> Result<PathBuf> {
        let dir = Pattern::escape(&self.dir.to_string_lossy());
        let pattern = format!("{dir}/{}*", Pattern::escape(&spec.id));
        let files = expand_glob(&pattern).map_err(|e| Error::stream(&spec.id, e))?;
        files
            .into_iter()
            .next()
            .ok_or_else(|| Error::stream(&spec.id, format!("no file matches {pattern}")))
    }
}

/// Tries each resolver in order; the last failure is returned if none match.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn PathResolver>>,
}

impl ResolverChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, resolver: impl PathResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }
}

impl PathResolver for ResolverChain {
    fn resolve(&self, spec: &FileSpec) -> Result<PathBuf> {
        let mut last = Error::stream(&spec.id, "no path resolver configured");
        for resolver in &self.resolvers {
            match resolver.resolve(spec) {
                Ok(path) => return Ok(path),
                Err(e) => last = e,
            }
        }
        Err(last)
    }
}

/// Expand a glob pattern into a sorted list of regular files.
///
/// # Errors
/// Returns a message if the pattern is invalid or a directory entry cannot
/// be read.
pub fn expand_glob(pattern: &str) -> std::result::Result<Vec<PathBuf>, String> {
    let paths = glob(pattern).map_err(|e| format!("invalid glob pattern {pattern}: {e}"))?;

    let mut result = Vec::new();
    for entry in paths {
        let path = entry.map_err(|e| format!("error reading glob entry for {pattern}: {e}"))?;
        if path.is_file() {
            result.push(path);
        }
    }

    // Sort for deterministic order
    result.sort();
    Ok(result)
}
