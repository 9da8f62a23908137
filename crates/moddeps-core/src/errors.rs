use std::path::PathBuf;
use thiserror::Error;

use crate::module::ModuleId;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Malformed module {module}: no defineModule(...) declaration found")]
    MalformedDeclaration { module: String },

    #[error("Module '{requester}' depends on '{dependency}', which could not be found")]
    UnresolvedDependency {
        requester: String,
        dependency: String,
    },

    #[error("Circular dependency: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("Module '{name}' has already been loaded")]
    AlreadyLoaded { name: String },

    #[error("Module '{module}' has neither a path nor contents to load from")]
    MissingSource { module: String },

    #[error("Two different modules were registered under the name '{name}'")]
    DuplicateModule { name: String },

    #[error("Module handle {id} does not belong to this resolution context")]
    UnknownModule { id: ModuleId },

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl ResolveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResolveError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ResolveError>;
