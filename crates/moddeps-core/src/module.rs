use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::DeclarationPolicy;
use crate::declaration::{self, Declaration};
use crate::errors::{ResolveError, Result};
use crate::lookup::ModuleLookup;

/// Handle to a module owned by a [`crate::ResolutionContext`].
///
/// Two handles are equal exactly when they refer to the same module instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub(crate) usize);

impl ModuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One source unit and the declaration parsed out of it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    name: Option<String>,
    filename: Option<PathBuf>,
    contents: Option<String>,
    style_sheet_names: Vec<String>,
    dependent_module_names: Vec<String>,
    pub(crate) dependent_modules: Vec<ModuleId>,
}

impl Module {
    /// A module whose name will come from its own declaration
    pub fn new() -> Self {
        Self::default()
    }

    /// A module with a name hint; a parsed declaration replaces it
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn filename(&self) -> Option<&Path> {
        self.filename.as_deref()
    }

    pub fn contents(&self) -> Option<&str> {
        self.contents.as_deref()
    }

    pub fn style_sheet_names(&self) -> &[String] {
        &self.style_sheet_names
    }

    pub fn dependent_module_names(&self) -> &[String] {
        &self.dependent_module_names
    }

    /// Resolved dependencies, parallel to [`Module::dependent_module_names`]
    pub fn dependent_modules(&self) -> &[ModuleId] {
        &self.dependent_modules
    }

    pub fn is_loaded(&self) -> bool {
        self.contents.is_some()
    }

    /// Name used in diagnostics: the module name, else its file, else a placeholder
    pub fn display_name(&self) -> String {
        match (&self.name, &self.filename) {
            (Some(name), _) => name.clone(),
            (None, Some(filename)) => filename.display().to_string(),
            (None, None) => "<anonymous>".to_string(),
        }
    }

    /// Load the module's source and parse its declaration, which must be present.
    pub fn load_and_parse<L: ModuleLookup + ?Sized>(
        &mut self,
        path: Option<&Path>,
        contents: Option<String>,
        lookup: &L,
    ) -> Result<()> {
        self.load_and_parse_with(path, contents, lookup, DeclarationPolicy::Require)
    }

    /// Load the module's source and parse its declaration.
    ///
    /// When `contents` is `None` the text is read through `lookup` from
    /// `path` (or from the module's existing filename). Contents can only be
    /// set once.
    pub fn load_and_parse_with<L: ModuleLookup + ?Sized>(
        &mut self,
        path: Option<&Path>,
        contents: Option<String>,
        lookup: &L,
        policy: DeclarationPolicy,
    ) -> Result<()> {
        if self.contents.is_some() {
            return Err(ResolveError::AlreadyLoaded {
                name: self.display_name(),
            });
        }

        if let Some(path) = path {
            self.filename = Some(path.to_path_buf());
        }

        let contents = match contents {
            Some(contents) => contents,
            None => {
                let path = self
                    .filename
                    .as_deref()
                    .ok_or_else(|| ResolveError::MissingSource {
                        module: self.display_name(),
                    })?;
                lookup.load(path)?
            }
        };

        let parsed = declaration::parse_declaration(&contents);
        self.contents = Some(contents);
        self.apply_declaration(parsed, policy.is_required())?;

        debug!(
            "Loaded module {} ({} dependencies)",
            self.display_name(),
            self.dependent_module_names.len()
        );
        Ok(())
    }

    /// Parse `text` into this module's name, stylesheets and dependency names.
    ///
    /// Without a declaration the module keeps its current name and gets empty
    /// lists, unless `decl_required` is set.
    pub fn parse_declaration(&mut self, text: &str, decl_required: bool) -> Result<()> {
        self.apply_declaration(declaration::parse_declaration(text), decl_required)
    }

    fn apply_declaration(
        &mut self,
        declaration: Option<Declaration>,
        decl_required: bool,
    ) -> Result<()> {
        match declaration {
            Some(declaration) => {
                self.name = Some(declaration.name);
                self.style_sheet_names = declaration.style_sheet_names;
                self.dependent_module_names = declaration.dependent_module_names;
                Ok(())
            }
            None if decl_required => Err(ResolveError::MalformedDeclaration {
                module: self.display_name(),
            }),
            None => {
                self.style_sheet_names.clear();
                self.dependent_module_names.clear();
                Ok(())
            }
        }
    }
}
