use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};

use crate::errors::{ResolveError, Result};
use crate::fs::normalize_path;
use crate::module::Module;

/// A module source located by a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSource {
    pub path: PathBuf,
    pub contents: String,
}

impl LocatedSource {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Maps dependency names (or explicit paths) to module source text.
///
/// The resolver never touches the file system itself; everything it reads
/// goes through an implementation of this trait.
pub trait ModuleLookup {
    /// Locate `requested_name` on behalf of `requesting`.
    ///
    /// `Ok(None)` means the name is unknown. Errors are reserved for
    /// failures while reading a source that was found.
    fn find_and_load_module(
        &self,
        requesting: &Module,
        requested_name: &str,
    ) -> Result<Option<LocatedSource>>;

    /// Read the source at an explicit path
    fn load(&self, path: &Path) -> Result<String>;
}

/// Lookup over a fixed set of in-memory modules, keyed by name
#[derive(Debug, Default, Clone)]
pub struct InMemoryLookup {
    modules: FxHashMap<String, LocatedSource>,
}

impl InMemoryLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_module(
        &mut self,
        name: impl Into<String>,
        filename: impl Into<PathBuf>,
        contents: impl Into<String>,
    ) {
        self.modules
            .insert(name.into(), LocatedSource::new(filename, contents));
    }

    /// Builder-style variant of [`InMemoryLookup::add_module`]
    pub fn with_module(
        mut self,
        name: impl Into<String>,
        filename: impl Into<PathBuf>,
        contents: impl Into<String>,
    ) -> Self {
        self.add_module(name, filename, contents);
        self
    }
}

impl ModuleLookup for InMemoryLookup {
    fn find_and_load_module(
        &self,
        _requesting: &Module,
        requested_name: &str,
    ) -> Result<Option<LocatedSource>> {
        Ok(self.modules.get(requested_name).cloned())
    }

    fn load(&self, path: &Path) -> Result<String> {
        let wanted = normalize_path(path);
        self.modules
            .values()
            .find(|source| normalize_path(&source.path) == wanted)
            .map(|source| source.contents.clone())
            .ok_or_else(|| {
                ResolveError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no such module file"),
                )
            })
    }
}
