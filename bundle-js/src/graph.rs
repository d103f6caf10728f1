use crate::error::CompileError;
use crate::host::ModuleHost;
use crate::host::Resolution;
use crate::host::ENTRY_PATH;
use crate::id::ModuleId;
use crate::options::CompileOptions;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;
use parse_js::loc::Loc;
use parse_js::module::ModuleRequest;
use parse_js::module::ModuleSyntax;
use once_cell::sync::Lazy;
use parse_js::parse_module;
use rayon::prelude::*;
use rayon::ThreadPool;
use rayon::ThreadPoolBuilder;
use std::sync::Arc;
use tracing::debug;
use tracing::warn;

// Parsing recurses once per nesting level, up to the parser's nesting limit.
const LOAD_STACK_SIZE: usize = 64 * 1024 * 1024;

static LOAD_POOL: Lazy<Option<ThreadPool>> = Lazy::new(|| {
  match ThreadPoolBuilder::new()
    .stack_size(LOAD_STACK_SIZE)
    .thread_name(|i| format!("bundle-js-load-{}", i))
    .build()
  {
    Ok(pool) => Some(pool),
    Err(err) => {
      warn!(%err, "could not start module loading threads, using the global pool");
      None
    }
  }
});

/// What a module request points at once resolved.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Dependency {
  Module(usize),
  External,
}

pub struct Module {
  pub id: ModuleId,
  pub source: Arc<str>,
  pub syntax: ModuleSyntax,
  // Parallel to `syntax.requests`.
  pub requests: Vec<Dependency>,
  // Parallel to `syntax.dynamic_imports`.
  pub dynamic_imports: Vec<Dependency>,
}

impl Module {
  pub fn is_entry(&self) -> bool {
    matches!(&self.id, ModuleId::Virtual(path) if path == ENTRY_PATH)
  }

  pub fn error(&self, err: CompileError, loc: Loc) -> CompileError {
    err.in_module(self.id.clone()).at(&self.source, loc)
  }
}

/// Every module reachable from the entry. Index 0 is the entry; the rest are in discovery order.
pub struct ModuleGraph {
  pub modules: Vec<Module>,
  // Order in which module bodies are emitted.
  pub link_order: Vec<usize>,
}

// A module whose requests have been resolved to ids but not yet to indices.
struct Loaded {
  id: ModuleId,
  source: Arc<str>,
  syntax: ModuleSyntax,
  requests: Vec<Option<ModuleId>>,
  dynamic_imports: Vec<Option<ModuleId>>,
}

fn load_and_parse(host: &dyn ModuleHost, id: ModuleId) -> Result<(ModuleId, Arc<str>, ModuleSyntax), CompileError> {
  let source = host
    .load(&id)
    .map_err(|err| CompileError::from(err).in_module(id.clone()))?;
  let syntax = parse_module(&source).map_err(|err| CompileError::syntax(id.clone(), &source, &err))?;
  debug!(module = %id, items = syntax.items.len(), "parsed module");
  Ok((id, source, syntax))
}

fn resolve_request(
  host: &dyn ModuleHost,
  importer: &ModuleId,
  source: &str,
  request: &ModuleRequest,
) -> Result<Option<ModuleId>, CompileError> {
  match host.resolve(&request.specifier, importer) {
    Ok(Resolution::Module(id)) => Ok(Some(id)),
    Ok(Resolution::External) => Ok(None),
    Err(err) => Err(CompileError::from(err).in_module(importer.clone()).at(source, request.loc)),
  }
}

impl ModuleGraph {
  /// Loads the entry and everything it imports, statically or dynamically. Each frontier of newly discovered
  /// modules is loaded and parsed in parallel; results are merged in discovery order. Cancellation is checked
  /// before every load.
  pub fn build(host: &dyn ModuleHost, options: &CompileOptions) -> Result<ModuleGraph, CompileError> {
    let mut loaded: Vec<Loaded> = Vec::new();
    let mut index: HashMap<ModuleId, usize> = HashMap::new();
    let entry = ModuleId::Virtual(ENTRY_PATH.to_string());
    index.insert(entry.clone(), 0);
    let mut frontier = vec![entry];
    while !frontier.is_empty() {
      if options.is_cancelled() {
        return Err(CompileError::cancelled());
      };
      let load_frontier = || -> Vec<_> {
        frontier
          .into_par_iter()
          .map(|id| {
            if options.is_cancelled() {
              return Err(CompileError::cancelled());
            };
            load_and_parse(host, id)
          })
          .collect()
      };
      let results = match LOAD_POOL.as_ref() {
        Some(pool) => pool.install(load_frontier),
        None => load_frontier(),
      };
      let mut next = Vec::new();
      for res in results {
        let (id, source, syntax) = res?;
        let mut resolve_all = |requests: Vec<&ModuleRequest>| -> Result<Vec<Option<ModuleId>>, CompileError> {
          let mut out = Vec::with_capacity(requests.len());
          for request in requests {
            let dep = resolve_request(host, &id, &source, request)?;
            if let Some(dep) = &dep {
              if !index.contains_key(dep) {
                index.insert(dep.clone(), index.len());
                next.push(dep.clone());
              };
            };
            out.push(dep);
          }
          Ok(out)
        };
        let requests = resolve_all(syntax.requests.iter().collect())?;
        let dynamic_imports = resolve_all(syntax.dynamic_imports.iter().map(|d| &d.request).collect())?;
        loaded.push(Loaded {
          id,
          source,
          syntax,
          requests,
          dynamic_imports,
        });
      }
      frontier = next;
    }

    let to_dep = |id: Option<ModuleId>| match id {
      Some(id) => Dependency::Module(index[&id]),
      None => Dependency::External,
    };
    let modules: Vec<Module> = loaded
      .into_iter()
      .map(|m| Module {
        id: m.id,
        source: m.source,
        syntax: m.syntax,
        requests: m.requests.into_iter().map(to_dep).collect(),
        dynamic_imports: m.dynamic_imports.into_iter().map(to_dep).collect(),
      })
      .collect();
    let link_order = link_order(&modules);
    debug!(modules = modules.len(), "built module graph");
    Ok(ModuleGraph {
      modules,
      link_order,
    })
  }
}

/// Depth-first post-order over static imports from the entry, then the same from every module only reached
/// through dynamic imports, in discovery order.
fn link_order(modules: &[Module]) -> Vec<usize> {
  let mut order = Vec::with_capacity(modules.len());
  let mut visited = HashSet::new();
  for root in 0..modules.len() {
    if visited.contains(&root) {
      continue;
    };
    // Stack of (module, next request to visit).
    let mut stack = vec![(root, 0)];
    visited.insert(root);
    while let Some((m, next)) = stack.last_mut() {
      let m = *m;
      match modules[m].requests.get(*next) {
        Some(dep) => {
          *next += 1;
          if let Dependency::Module(dep) = *dep {
            if visited.insert(dep) {
              stack.push((dep, 0));
            };
          };
        }
        None => {
          order.push(m);
          stack.pop();
        }
      };
    }
  }
  order
}
