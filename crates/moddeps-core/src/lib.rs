pub mod config;
pub mod declaration;
pub mod errors;
pub mod finder;
pub mod fs;
pub mod lookup;
pub mod manifest;
pub mod module;
pub mod resolver;

pub use config::{CliOverrides, DeclarationPolicy, ResolverConfig};
pub use declaration::{parse_declaration, Declaration};
pub use errors::{ResolveError, Result};
pub use finder::ResourceFinder;
pub use lookup::{InMemoryLookup, LocatedSource, ModuleLookup};
pub use manifest::{LoadManifest, ScriptEntry};
pub use module::{Module, ModuleId};
pub use resolver::{
    calc_load_sequence, calc_load_sequence_with, LoadSequence, ResolutionContext, ResolveState,
};
