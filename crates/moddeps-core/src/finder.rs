use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::config::ResolverConfig;
use crate::errors::{ResolveError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::lookup::{LocatedSource, ModuleLookup};
use crate::module::Module;

/// Locates modules on a file system by name.
///
/// A module named `foo` is looked for as `foo.<extension>` in the requesting
/// module's directory first, then in each search path in order.
pub struct ResourceFinder {
    fs: Arc<dyn FileSystem>,
    search_paths: Vec<PathBuf>,
    extension: String,
}

impl ResourceFinder {
    /// Finder over the real file system
    pub fn new(config: &ResolverConfig) -> Self {
        Self::with_file_system(Arc::new(RealFileSystem::new()), config)
    }

    /// Finder over a custom file system (for testing)
    pub fn with_file_system(fs: Arc<dyn FileSystem>, config: &ResolverConfig) -> Self {
        Self {
            fs,
            search_paths: config.search_paths.clone(),
            extension: config.extension.clone(),
        }
    }

    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }

    fn file_name_for(&self, module_name: &str) -> String {
        if self.extension.is_empty() {
            module_name.to_string()
        } else {
            format!("{}.{}", module_name, self.extension)
        }
    }

    /// Candidate locations for `requested_name`, in search order
    pub fn candidates(&self, requesting: &Module, requested_name: &str) -> Vec<PathBuf> {
        let file_name = self.file_name_for(requested_name);

        let sibling_dir = requesting
            .filename()
            .and_then(Path::parent)
            .map(Path::to_path_buf);

        sibling_dir
            .into_iter()
            .chain(self.search_paths.iter().cloned())
            .map(|dir| dir.join(&file_name))
            .collect()
    }
}

impl ModuleLookup for ResourceFinder {
    fn find_and_load_module(
        &self,
        requesting: &Module,
        requested_name: &str,
    ) -> Result<Option<LocatedSource>> {
        for candidate in self.candidates(requesting, requested_name) {
            if !self.fs.exists(&candidate) {
                continue;
            }
            debug!("Found module {} at {:?}", requested_name, candidate);
            let contents = self.load(&candidate)?;
            return Ok(Some(LocatedSource {
                path: candidate,
                contents,
            }));
        }

        debug!(
            "Module {} not found for {}",
            requested_name,
            requesting.display_name()
        );
        Ok(None)
    }

    fn load(&self, path: &Path) -> Result<String> {
        self.fs
            .read_file(path)
            .map_err(|e| ResolveError::io(path, e))
    }
}
