//! Dependency graph construction and load ordering
//!
//! A [`ResolutionContext`] owns every module of one resolution run. Modules
//! are registered by name the moment they are loaded, so a name is parsed at
//! most once and every dependent shares the same [`ModuleId`]. Each module
//! carries a [`ResolveState`]; meeting a module that is still
//! [`ResolveState::InProgress`] during the walk is a cycle.

use rustc_hash::{FxHashMap, FxHashSet};
use std::ops::Index;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::config::DeclarationPolicy;
use crate::errors::{ResolveError, Result};
use crate::fs::normalize_path;
use crate::lookup::ModuleLookup;
use crate::module::{Module, ModuleId};

/// Progress of a registered module through the resolve walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    /// Loaded and parsed, dependencies not yet linked
    Pending,
    /// Dependencies are being linked
    InProgress,
    /// All transitive dependencies linked
    Done,
}

#[derive(Debug)]
struct Slot {
    module: Module,
    state: ResolveState,
}

/// A module whose dependencies are being linked by [`ResolutionContext::resolve`]
#[derive(Debug)]
struct Frame {
    module: ModuleId,
    names: Vec<String>,
    next: usize,
    linked: Vec<ModuleId>,
}

/// Registry of the modules of a single resolution run.
///
/// Every module is reachable under the name it was requested by and under
/// the name it declares; no two modules share a name. A context is not
/// reusable after a failed [`ResolutionContext::resolve`].
#[derive(Debug, Default)]
pub struct ResolutionContext {
    modules: Vec<Slot>,
    scripts: FxHashMap<String, ModuleId>,
    /// Declared names that no dependency has requested yet
    unclaimed: FxHashSet<String>,
    resolve_stack: Vec<ModuleId>,
    dependency_declarations: DeclarationPolicy,
}

impl ResolutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context whose dependencies are loaded under `policy`
    pub fn with_policy(policy: DeclarationPolicy) -> Self {
        Self {
            dependency_declarations: policy,
            ..Self::default()
        }
    }

    /// Take ownership of a caller-built module.
    ///
    /// Named modules are registered under their name; registering a second
    /// module under a taken name fails.
    pub fn insert(&mut self, module: Module) -> Result<ModuleId> {
        match module.name().map(str::to_string) {
            Some(name) if self.scripts.contains_key(&name) => {
                Err(ResolveError::DuplicateModule { name })
            }
            Some(name) => Ok(self.register(name, module)),
            None => Ok(self.push(module)),
        }
    }

    fn push(&mut self, module: Module) -> ModuleId {
        let id = ModuleId(self.modules.len());
        self.modules.push(Slot {
            module,
            state: ResolveState::Pending,
        });
        id
    }

    fn register(&mut self, name: String, module: Module) -> ModuleId {
        let id = self.push(module);
        self.scripts.insert(name, id);
        id
    }

    pub fn get(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(id.0).map(|slot| &slot.module)
    }

    /// Module registered under `name`, if any
    pub fn script(&self, name: &str) -> Option<ModuleId> {
        self.scripts.get(name).copied()
    }

    /// All registered names with their modules, in no particular order.
    ///
    /// A module requested under a name other than the one it declares is
    /// listed under both.
    pub fn scripts(&self) -> impl Iterator<Item = (&str, ModuleId)> + '_ {
        self.scripts.iter().map(|(name, id)| (name.as_str(), *id))
    }

    pub fn state(&self, id: ModuleId) -> Option<ResolveState> {
        self.modules.get(id.0).map(|slot| slot.state)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn check(&self, id: ModuleId) -> Result<()> {
        if id.0 < self.modules.len() {
            Ok(())
        } else {
            Err(ResolveError::UnknownModule { id })
        }
    }

    /// Link `module` to its dependencies, loading unseen ones through `lookup`.
    ///
    /// Dependencies are visited in declaration order. Names already in the
    /// context are reused; new ones are loaded, registered and then resolved
    /// before being linked. The walk keeps its own stack, so chain depth is
    /// bounded by memory only.
    pub fn resolve<L: ModuleLookup + ?Sized>(
        &mut self,
        module: ModuleId,
        lookup: &L,
    ) -> Result<()> {
        self.check(module)?;
        match self.modules[module.0].state {
            ResolveState::Done => return Ok(()),
            ResolveState::InProgress => return Err(self.cycle_error(module)),
            ResolveState::Pending => {}
        }

        let mut frames = vec![self.enter(module)];
        loop {
            let Some(frame) = frames.last_mut() else {
                break;
            };
            match frame.names.get(frame.next).cloned() {
                Some(name) => {
                    frame.next += 1;
                    let requester = frame.module;
                    let dependency = self.dependency(requester, &name, lookup)?;
                    match self.modules[dependency.0].state {
                        ResolveState::Done => frame.linked.push(dependency),
                        ResolveState::InProgress => return Err(self.cycle_error(dependency)),
                        ResolveState::Pending => {
                            let child = self.enter(dependency);
                            frames.push(child);
                        }
                    }
                }
                None => {
                    let Some(finished) = frames.pop() else {
                        break;
                    };
                    let slot = &mut self.modules[finished.module.0];
                    slot.module.dependent_modules = finished.linked;
                    slot.state = ResolveState::Done;
                    self.resolve_stack.pop();
                    if let Some(parent) = frames.last_mut() {
                        parent.linked.push(finished.module);
                    }
                }
            }
        }
        Ok(())
    }

    fn enter(&mut self, module: ModuleId) -> Frame {
        self.modules[module.0].state = ResolveState::InProgress;
        self.resolve_stack.push(module);
        let names = self[module].dependent_module_names().to_vec();
        Frame {
            module,
            linked: Vec::with_capacity(names.len()),
            names,
            next: 0,
        }
    }

    /// Module for `name` as requested by `requester`, loading it if unseen
    fn dependency<L: ModuleLookup + ?Sized>(
        &mut self,
        requester: ModuleId,
        name: &str,
        lookup: &L,
    ) -> Result<ModuleId> {
        let Some(existing) = self.script(name) else {
            return self.load_dependency(requester, name, lookup);
        };

        // A name known only from another file's declaration must not shadow
        // a different file that the lookup finds under that name.
        if self.unclaimed.remove(name) {
            if let Some(source) = lookup.find_and_load_module(&self[requester], name)? {
                if !same_file(self[existing].filename(), Some(&source.path)) {
                    return Err(ResolveError::DuplicateModule {
                        name: name.to_string(),
                    });
                }
            }
        }

        debug!(
            "Reusing module {} for {}",
            name,
            self[requester].display_name()
        );
        Ok(existing)
    }

    fn load_dependency<L: ModuleLookup + ?Sized>(
        &mut self,
        requester: ModuleId,
        name: &str,
        lookup: &L,
    ) -> Result<ModuleId> {
        let requesting = &self[requester];
        let source = lookup
            .find_and_load_module(requesting, name)?
            .ok_or_else(|| ResolveError::UnresolvedDependency {
                requester: requesting.display_name(),
                dependency: name.to_string(),
            })?;

        let mut module = Module::named(name);
        module.load_and_parse_with(
            Some(&source.path),
            Some(source.contents),
            lookup,
            self.dependency_declarations,
        )?;

        let declared = module
            .name()
            .filter(|declared| *declared != name)
            .map(str::to_string);
        let Some(declared) = declared else {
            return Ok(self.register(name.to_string(), module));
        };

        warn!(
            "Module requested as {} declares itself as {} ({:?})",
            name, declared, source.path
        );

        match self.script(&declared) {
            Some(existing) if same_file(self[existing].filename(), module.filename()) => {
                self.scripts.insert(name.to_string(), existing);
                Ok(existing)
            }
            Some(_) => Err(ResolveError::DuplicateModule { name: declared }),
            None => {
                let id = self.register(name.to_string(), module);
                self.scripts.insert(declared.clone(), id);
                self.unclaimed.insert(declared);
                Ok(id)
            }
        }
    }

    fn cycle_error(&self, repeated: ModuleId) -> ResolveError {
        let start = self
            .resolve_stack
            .iter()
            .position(|id| *id == repeated)
            .unwrap_or(0);
        let cycle = self.resolve_stack[start..]
            .iter()
            .chain(std::iter::once(&repeated))
            .map(|id| self[*id].display_name())
            .collect();
        ResolveError::CircularDependency { cycle }
    }

    /// Append `module` to `load_sequence` after all of its dependencies.
    ///
    /// Post-order depth-first walk over the linked graph, dependencies in
    /// declared order. Modules whose name is in `already_loaded` are skipped,
    /// so sharing one set across several calls yields one combined sequence
    /// without repeats.
    pub fn compute_load_sequence_recursive(
        &self,
        load_sequence: &mut Vec<ModuleId>,
        already_loaded: &mut FxHashSet<String>,
        module: ModuleId,
    ) -> Result<()> {
        self.check(module)?;
        if already_loaded.contains(&self[module].display_name()) {
            return Ok(());
        }

        // (module, index of its next dependency)
        let mut path: Vec<(ModuleId, usize)> = vec![(module, 0)];
        let mut visiting = FxHashSet::default();
        visiting.insert(module);

        while let Some(&mut (id, ref mut next)) = path.last_mut() {
            let Some(&dependency) = self[id].dependent_modules().get(*next) else {
                path.pop();
                visiting.remove(&id);
                load_sequence.push(id);
                already_loaded.insert(self[id].display_name());
                continue;
            };
            *next += 1;

            if already_loaded.contains(&self[dependency].display_name()) {
                continue;
            }
            if visiting.contains(&dependency) {
                let start = path
                    .iter()
                    .position(|(v, _)| *v == dependency)
                    .unwrap_or(0);
                let cycle = path[start..]
                    .iter()
                    .map(|(v, _)| *v)
                    .chain(std::iter::once(dependency))
                    .map(|v| self[v].display_name())
                    .collect();
                return Err(ResolveError::CircularDependency { cycle });
            }

            visiting.insert(dependency);
            path.push((dependency, 0));
        }
        Ok(())
    }
}

fn same_file(a: Option<&Path>, b: Option<&Path>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => normalize_path(a) == normalize_path(b),
        _ => false,
    }
}

impl Index<ModuleId> for ResolutionContext {
    type Output = Module;

    /// # Panics
    ///
    /// Panics if `id` was not issued by this context; use
    /// [`ResolutionContext::get`] for a fallible lookup.
    fn index(&self, id: ModuleId) -> &Module {
        &self.modules[id.0].module
    }
}

/// Modules of one resolution run in load order
#[derive(Debug)]
pub struct LoadSequence {
    context: ResolutionContext,
    order: Vec<ModuleId>,
}

impl LoadSequence {
    pub fn context(&self) -> &ResolutionContext {
        &self.context
    }

    pub fn ids(&self) -> &[ModuleId] {
        &self.order
    }

    /// Modules in load order, dependencies first
    pub fn modules(&self) -> impl Iterator<Item = &Module> + '_ {
        self.order.iter().map(|id| &self.context[*id])
    }

    /// Module names in load order
    pub fn names(&self) -> Vec<String> {
        self.modules().map(Module::display_name).collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Compute the combined load sequence for the given entry files.
///
/// Entry modules take their names from their own declarations, are resolved
/// against one shared context, and are walked in the order given so shared
/// dependencies appear once, before the first entry that needs them.
pub fn calc_load_sequence<P, L>(entry_paths: &[P], lookup: &L) -> Result<LoadSequence>
where
    P: AsRef<Path>,
    L: ModuleLookup + ?Sized,
{
    calc_load_sequence_with(entry_paths, lookup, DeclarationPolicy::Require)
}

/// [`calc_load_sequence`] with an explicit declaration policy for dependencies
pub fn calc_load_sequence_with<P, L>(
    entry_paths: &[P],
    lookup: &L,
    policy: DeclarationPolicy,
) -> Result<LoadSequence>
where
    P: AsRef<Path>,
    L: ModuleLookup + ?Sized,
{
    let mut context = ResolutionContext::with_policy(policy);

    let mut entries = Vec::with_capacity(entry_paths.len());
    for path in entry_paths {
        let mut module = Module::new();
        module.load_and_parse(Some(path.as_ref()), None, lookup)?;

        let existing = module
            .name()
            .and_then(|name| context.script(name))
            .filter(|id| same_file(context[*id].filename(), module.filename()));
        let id = match existing {
            Some(id) => id,
            None => context.insert(module)?,
        };
        entries.push(id);
    }

    for &entry in &entries {
        context.resolve(entry, lookup)?;
    }

    let mut order = Vec::with_capacity(context.len());
    let mut already_loaded = FxHashSet::default();
    for &entry in &entries {
        context.compute_load_sequence_recursive(&mut order, &mut already_loaded, entry)?;
    }

    info!(
        "Load sequence of {} modules computed from {} entry point(s)",
        order.len(),
        entries.len()
    );

    Ok(LoadSequence { context, order })
}
