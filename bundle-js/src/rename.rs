use crate::graph::ModuleGraph;
use crate::id::identifier_stem;
use crate::link::Linked;
use crate::link::Slot;
use crate::treeshake::Shaken;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;
use parse_js::lex::is_binding_name;
use parse_js::module::Imported;
use parse_js::module::DEFAULT_EXPORT_BINDING;
use parse_js::scope::DeclKind;
use tracing::trace;

// Globals read by the code the emitter generates around module bodies.
const RUNTIME_GLOBALS: [&str; 3] = ["Object", "Promise", "Symbol"];

/// Final names of every slot in the bundle scope.
pub struct Names {
  names: HashMap<Slot, String>,
  // Live external slots, in the order their imports are emitted.
  pub externals: Vec<Slot>,
}

impl Names {
  pub fn get(&self, slot: &Slot) -> Option<&str> {
    self.names.get(slot).map(|n| n.as_str())
  }
}

/// Modules in the order their names are assigned: the entry first so its code reads as written, then the
/// rest in link order.
pub fn naming_order(graph: &ModuleGraph) -> Vec<usize> {
  let mut order = vec![0];
  order.extend(graph.link_order.iter().copied().filter(|&m| m != 0));
  order
}

fn desired_name(graph: &ModuleGraph, slot: &Slot, preferred: &HashMap<Slot, String>) -> String {
  if let Some(name) = preferred.get(slot) {
    return name.clone();
  };
  match slot {
    Slot::Local { module, binding } => {
      let module = &graph.modules[*module];
      let name = &module.syntax.scopes.binding(*binding).name;
      if name == DEFAULT_EXPORT_BINDING {
        format!("{}_default", module.id.stem())
      } else {
        name.clone()
      }
    }
    Slot::Namespace(module) => format!("{}_ns", graph.modules[*module].id.stem()),
    Slot::External { specifier, imported } => match imported {
      Imported::Name(name) if is_binding_name(name) => name.clone(),
      Imported::Name(_) => identifier_stem(specifier),
      Imported::Namespace => format!("{}_ns", identifier_stem(specifier)),
    },
  }
}

/// Hoists every module-level binding into one scope. A slot keeps its original name unless that name is
/// already taken by another slot, is a global read anywhere in the bundle, or is declared in a nested scope
/// around one of the slot's references; then it gets the first free `name$N`.
pub fn assign_names(graph: &ModuleGraph, linked: &Linked, shaken: &Shaken) -> Names {
  let order = naming_order(graph);
  let mut used: HashSet<String> = RUNTIME_GLOBALS.iter().map(|g| g.to_string()).collect();
  for module in graph.modules.iter() {
    used.extend(module.syntax.scopes.free_names().iter().cloned());
  }

  let mut forbidden: HashMap<Slot, HashSet<String>> = HashMap::new();
  let mut preferred: HashMap<Slot, String> = HashMap::new();
  let mut externals = Vec::new();
  let add_external = |slot: &Slot, externals: &mut Vec<Slot>| {
    if matches!(slot, Slot::External { .. }) && shaken.is_live(slot) && !externals.contains(slot) {
      externals.push(slot.clone());
    };
  };
  for &m in order.iter() {
    let module = &graph.modules[m];
    let scopes = &module.syntax.scopes;
    for decl in module.syntax.imports.iter() {
      for spec in decl.specifiers.iter() {
        let Some(slot) = scopes
          .module_binding(&spec.local)
          .and_then(|b| linked.binding_slot(graph, m, b))
        else {
          continue;
        };
        if !matches!(slot, Slot::Local { .. }) {
          preferred.entry(slot.clone()).or_insert_with(|| spec.local.clone());
        };
        add_external(&slot, &mut externals);
      }
    }
    for (i, item) in module.syntax.items.iter().enumerate() {
      if !shaken.kept[m][i] {
        continue;
      };
      for r in item.references.clone() {
        if let Some(slot) = linked.reference_slot(graph, m, r) {
          let scope = scopes.references()[r].scope;
          forbidden
            .entry(slot)
            .or_default()
            .extend(scopes.names_enclosing(scope).map(|n| n.to_string()));
        };
      }
      for (d, dynamic) in module.syntax.dynamic_imports.iter().enumerate() {
        if !item.loc.contains(dynamic.loc.0) {
          continue;
        };
        if let Some(slot) = &linked.dynamic_imports[m][d] {
          forbidden
            .entry(slot.clone())
            .or_default()
            .extend(scopes.names_enclosing(dynamic.scope).map(|n| n.to_string()));
        };
      }
    }
  }
  for (_, slot) in linked.entry_exports.iter() {
    add_external(slot, &mut externals);
  }
  for (module, exports) in linked.namespaces.iter() {
    if shaken.is_live(&Slot::Namespace(*module)) {
      for (_, slot) in exports.iter() {
        add_external(slot, &mut externals);
      }
    };
  }

  let mut slots = Vec::new();
  for &m in order.iter() {
    let module = &graph.modules[m];
    let mut declared = HashSet::new();
    for (i, item) in module.syntax.items.iter().enumerate() {
      if shaken.kept[m][i] {
        declared.extend(module.syntax.item_bindings(item));
      };
    }
    for binding in module.syntax.scopes.module_bindings() {
      if module.syntax.scopes.binding(binding).kind != DeclKind::Import && declared.contains(&binding) {
        slots.push(Slot::Local { module: m, binding });
      };
    }
  }
  for &module in linked.namespaces.keys() {
    let slot = Slot::Namespace(module);
    if shaken.is_live(&slot) {
      slots.push(slot);
    };
  }
  slots.extend(externals.iter().cloned());

  let mut names = HashMap::new();
  let none = HashSet::new();
  for slot in slots {
    let base = desired_name(graph, &slot, &preferred);
    let forbidden = forbidden.get(&slot).unwrap_or(&none);
    let mut candidate = base.clone();
    let mut n = 0;
    while used.contains(&candidate) || forbidden.contains(&candidate) {
      n += 1;
      candidate = format!("{}${}", base, n);
    }
    if n > 0 {
      trace!(from = %base, to = %candidate, "renamed binding");
    };
    used.insert(candidate.clone());
    names.insert(slot, candidate);
  }
  Names { names, externals }
}
