use crate::error::codes;
use crate::error::CompileError;
use crate::graph::Dependency;
use crate::graph::ModuleGraph;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;
use parse_js::loc::Loc;
use parse_js::module::ExportTarget;
use parse_js::module::Imported;
use parse_js::scope::BindingId;
use parse_js::scope::DeclKind;
use std::collections::BTreeMap;
use tracing::trace;

/// A variable in the bundle scope. Every reference to a module-level binding, after following imports and
/// re-exports, ends up at one of these.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum Slot {
  // A binding declared by a module's own code.
  Local { module: usize, binding: BindingId },
  // The namespace object of a bundled module.
  Namespace(usize),
  // A binding of an external module, imported at the top of the bundle.
  External { specifier: String, imported: Imported },
}

/// The result of linking: every import binding and dynamic import mapped to the slot it reads.
pub struct Linked {
  // Per module, import binding to slot.
  pub imports: Vec<HashMap<BindingId, Slot>>,
  // Per module, parallel to `syntax.dynamic_imports`. `None` for imports of external modules.
  pub dynamic_imports: Vec<Vec<Option<Slot>>>,
  // Exports of every module whose namespace object could be needed, sorted by name.
  pub namespaces: BTreeMap<usize, Vec<(String, Slot)>>,
  // Exports of the entry module, in declaration order.
  pub entry_exports: Vec<(String, Slot)>,
  // Specifiers of external modules the entry re-exports wholesale with `export *`.
  pub entry_star_externals: Vec<String>,
}

impl Linked {
  /// The slot a reference in `module` reads, or `None` if it refers to a nested binding or a global.
  pub fn reference_slot(&self, graph: &ModuleGraph, module: usize, reference: usize) -> Option<Slot> {
    let scopes = &graph.modules[module].syntax.scopes;
    let binding = scopes.reference_binding(reference)?;
    self.binding_slot(graph, module, binding)
  }

  /// The slot a module-level binding stands for.
  pub fn binding_slot(&self, graph: &ModuleGraph, module: usize, binding: BindingId) -> Option<Slot> {
    let scopes = &graph.modules[module].syntax.scopes;
    if !scopes.is_module_binding(binding) {
      return None;
    };
    if scopes.binding(binding).kind == DeclKind::Import {
      return self.imports[module].get(&binding).cloned();
    };
    Some(Slot::Local { module, binding })
  }
}

// Where an import binding of a module comes from.
struct ImportSource {
  request: usize,
  imported: Imported,
  loc: Loc,
}

struct Linker<'g> {
  graph: &'g ModuleGraph,
  // Per module, index into `syntax.exports` by exported name.
  exports: Vec<HashMap<String, usize>>,
  // Per module, import binding name to its source.
  import_sources: Vec<HashMap<String, ImportSource>>,
  resolved: HashMap<(usize, String), Option<Slot>>,
}

impl<'g> Linker<'g> {
  fn new(graph: &'g ModuleGraph) -> Result<Linker<'g>, CompileError> {
    let mut exports = Vec::with_capacity(graph.modules.len());
    let mut import_sources = Vec::with_capacity(graph.modules.len());
    for module in graph.modules.iter() {
      let mut by_name = HashMap::new();
      for (i, export) in module.syntax.exports.iter().enumerate() {
        if by_name.insert(export.exported.clone(), i).is_some() {
          return Err(module.error(
            CompileError::link(
              codes::DUPLICATE_EXPORT,
              format!("duplicate export `{}`", export.exported),
            ),
            export.loc,
          ));
        };
      }
      exports.push(by_name);
      let mut sources = HashMap::new();
      for decl in module.syntax.imports.iter() {
        for spec in decl.specifiers.iter() {
          sources.insert(spec.local.clone(), ImportSource {
            request: decl.request,
            imported: spec.imported.clone(),
            loc: spec.loc,
          });
        }
      }
      import_sources.push(sources);
    }
    Ok(Linker {
      graph,
      exports,
      import_sources,
      resolved: HashMap::new(),
    })
  }

  fn missing_export(&self, module: usize, dep: usize, name: &str, loc: Loc) -> CompileError {
    self.graph.modules[module].error(
      CompileError::link(
        codes::MISSING_EXPORT,
        format!(
          "module `{}` does not provide an export named `{}`",
          self.graph.modules[dep].id, name
        ),
      ),
      loc,
    )
  }

  fn circular(&self, module: usize, name: &str, loc: Loc) -> CompileError {
    self.graph.modules[module].error(
      CompileError::link(
        codes::CIRCULAR_REEXPORT,
        format!("export `{}` is re-exported in a cycle and never declared", name),
      ),
      loc,
    )
  }

  // Follows a request of `module` to the slot for `imported`, reporting failures at `loc` in `module`.
  fn resolve_request(
    &mut self,
    module: usize,
    request: usize,
    imported: &Imported,
    loc: Loc,
    visiting: &mut Vec<(usize, String)>,
  ) -> Result<Slot, CompileError> {
    let graph = self.graph;
    match graph.modules[module].requests[request] {
      Dependency::External => Ok(Slot::External {
        specifier: graph.modules[module].syntax.requests[request].specifier.clone(),
        imported: imported.clone(),
      }),
      Dependency::Module(dep) => match imported {
        Imported::Namespace => Ok(Slot::Namespace(dep)),
        Imported::Name(name) => {
          if visiting.iter().any(|(m, n)| *m == dep && n == name) {
            return Err(self.circular(module, name, loc));
          };
          self
            .resolve_export(dep, name, visiting)?
            .ok_or_else(|| self.missing_export(module, dep, name, loc))
        }
      },
    }
  }

  fn resolve_import(
    &mut self,
    module: usize,
    local: &str,
    visiting: &mut Vec<(usize, String)>,
  ) -> Result<Slot, CompileError> {
    let Some(source) = self.import_sources[module].get(local) else {
      return Err(CompileError::internal(format!("`{}` is not an import binding", local)));
    };
    let (request, imported, loc) = (source.request, source.imported.clone(), source.loc);
    self.resolve_request(module, request, &imported, loc, visiting)
  }

  /// Finds the slot behind export `name` of `module`. Explicit exports win over `export *`; among stars the
  /// first module in source order that provides the name wins, and `default` is never taken from a star.
  fn resolve_export(
    &mut self,
    module: usize,
    name: &str,
    visiting: &mut Vec<(usize, String)>,
  ) -> Result<Option<Slot>, CompileError> {
    let key = (module, name.to_string());
    if let Some(slot) = self.resolved.get(&key) {
      return Ok(slot.clone());
    };
    visiting.push(key.clone());
    let res = self.resolve_export_uncached(module, name, visiting);
    visiting.pop();
    let slot = res?;
    // Only complete answers are cached. A star lookup cut short by a cycle may miss names.
    if visiting.is_empty() {
      self.resolved.insert(key, slot.clone());
    };
    Ok(slot)
  }

  fn resolve_export_uncached(
    &mut self,
    module: usize,
    name: &str,
    visiting: &mut Vec<(usize, String)>,
  ) -> Result<Option<Slot>, CompileError> {
    let graph = self.graph;
    let m = &graph.modules[module];
    if let Some(&i) = self.exports[module].get(name) {
      let export = &m.syntax.exports[i];
      return match &export.target {
        ExportTarget::Local(local) => {
          let scopes = &m.syntax.scopes;
          let Some(binding) = scopes.module_binding(local) else {
            return Err(m.error(
              CompileError::link(
                codes::UNDECLARED_EXPORT,
                format!("exported binding `{}` is not declared in this module", local),
              ),
              export.loc,
            ));
          };
          if scopes.binding(binding).kind == DeclKind::Import {
            return self.resolve_import(module, local, visiting).map(Some);
          };
          Ok(Some(Slot::Local { module, binding }))
        }
        ExportTarget::From { request, imported } => self
          .resolve_request(module, *request, imported, export.loc, visiting)
          .map(Some),
      };
    };
    if name == "default" {
      return Ok(None);
    };
    let mut external = None;
    for &request in m.syntax.star_exports.iter() {
      match m.requests[request] {
        Dependency::External => {
          if external.is_none() {
            external = Some(Slot::External {
              specifier: m.syntax.requests[request].specifier.clone(),
              imported: Imported::Name(name.to_string()),
            });
          };
        }
        Dependency::Module(dep) => {
          if visiting.iter().any(|(v, n)| *v == dep && n == name) {
            continue;
          };
          if let Some(slot) = self.resolve_export(dep, name, visiting)? {
            return Ok(Some(slot));
          };
        }
      };
    }
    Ok(external)
  }

  /// Every name `module` exports: explicit exports in source order, then names gathered through
  /// `export *` from bundled modules.
  fn export_names(&self, module: usize) -> Vec<String> {
    let mut names: Vec<String> = self.graph.modules[module]
      .syntax
      .exports
      .iter()
      .map(|e| e.exported.clone())
      .collect();
    let mut seen: HashSet<String> = names.iter().cloned().collect();
    let mut visited = HashSet::new();
    visited.insert(module);
    let mut stack = vec![module];
    let mut starred = Vec::new();
    while let Some(m) = stack.pop() {
      let m = &self.graph.modules[m];
      for &request in m.syntax.star_exports.iter().rev() {
        if let Dependency::Module(dep) = m.requests[request] {
          if visited.insert(dep) {
            stack.push(dep);
            starred.push(dep);
          };
        };
      }
    }
    for dep in starred {
      for export in self.graph.modules[dep].syntax.exports.iter() {
        if export.exported != "default" && seen.insert(export.exported.clone()) {
          names.push(export.exported.clone());
        };
      }
    }
    names
  }

  /// Specifiers of external modules reachable from `module` through `export *` alone.
  fn star_externals(&self, module: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut visited = HashSet::new();
    visited.insert(module);
    let mut stack = vec![module];
    while let Some(m) = stack.pop() {
      let m = &self.graph.modules[m];
      for &request in m.syntax.star_exports.iter().rev() {
        match m.requests[request] {
          Dependency::External => {
            let specifier = &m.syntax.requests[request].specifier;
            if !out.contains(specifier) {
              out.push(specifier.clone());
            };
          }
          Dependency::Module(dep) => {
            if visited.insert(dep) {
              stack.push(dep);
            };
          }
        };
      }
    }
    out
  }

  // Exports of `module` that resolve, skipping names that a cycle of stars leaves without a binding.
  fn resolved_exports(&mut self, module: usize) -> Result<Vec<(String, Slot)>, CompileError> {
    let mut out = Vec::new();
    for name in self.export_names(module) {
      if let Some(slot) = self.resolve_export(module, &name, &mut Vec::new())? {
        out.push((name, slot));
      };
    }
    Ok(out)
  }
}

/// Resolves every import, re-export and dynamic import in the graph.
pub fn link(graph: &ModuleGraph) -> Result<Linked, CompileError> {
  let mut linker = Linker::new(graph)?;
  let mut imports = Vec::with_capacity(graph.modules.len());
  let mut namespace_roots = Vec::new();
  for (i, module) in graph.modules.iter().enumerate() {
    let mut slots = HashMap::new();
    for decl in module.syntax.imports.iter() {
      for spec in decl.specifiers.iter() {
        let slot = linker.resolve_import(i, &spec.local, &mut Vec::new())?;
        trace!(module = %module.id, local = %spec.local, slot = ?slot, "linked import");
        if let Slot::Namespace(dep) = slot {
          namespace_roots.push(dep);
        };
        let Some(binding) = module.syntax.scopes.module_binding(&spec.local) else {
          return Err(CompileError::internal(format!("import `{}` has no binding", spec.local)));
        };
        slots.insert(binding, slot);
      }
    }
    imports.push(slots);
  }

  let mut dynamic_imports = Vec::with_capacity(graph.modules.len());
  for module in graph.modules.iter() {
    let slots: Vec<Option<Slot>> = module
      .dynamic_imports
      .iter()
      .map(|dep| match *dep {
        Dependency::Module(dep) => Some(Slot::Namespace(dep)),
        Dependency::External => None,
      })
      .collect();
    namespace_roots.extend(slots.iter().filter_map(|s| match s {
      Some(Slot::Namespace(dep)) => Some(*dep),
      _ => None,
    }));
    dynamic_imports.push(slots);
  }

  let entry_exports = linker.resolved_exports(0)?;
  let entry_star_externals = linker.star_externals(0);
  for (_, slot) in entry_exports.iter() {
    if let Slot::Namespace(dep) = slot {
      namespace_roots.push(*dep);
    };
  }

  // Namespaces can export other namespaces through `export * as ns from`.
  let mut namespaces = BTreeMap::new();
  while let Some(module) = namespace_roots.pop() {
    if namespaces.contains_key(&module) {
      continue;
    };
    let mut exports = linker.resolved_exports(module)?;
    exports.sort_by(|a, b| a.0.encode_utf16().cmp(b.0.encode_utf16()));
    for (_, slot) in exports.iter() {
      if let Slot::Namespace(dep) = slot {
        namespace_roots.push(*dep);
      };
    }
    namespaces.insert(module, exports);
  }

  Ok(Linked {
    imports,
    dynamic_imports,
    namespaces,
    entry_exports,
    entry_star_externals,
  })
}
