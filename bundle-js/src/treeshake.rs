use crate::graph::ModuleGraph;
use crate::link::Linked;
use crate::link::Slot;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;
use parse_js::scope::BindingId;
use tracing::debug;

/// Which top-level items survive, and which slots the surviving code reads.
pub struct Shaken {
  // Per module, parallel to `syntax.items`.
  pub kept: Vec<Vec<bool>>,
  pub live: HashSet<Slot>,
}

impl Shaken {
  pub fn is_live(&self, slot: &Slot) -> bool {
    self.live.contains(slot)
  }
}

struct Shaker<'a> {
  graph: &'a ModuleGraph,
  linked: &'a Linked,
  // Per module, the items declaring each module-level binding.
  declared_by: Vec<HashMap<BindingId, Vec<usize>>>,
  kept: Vec<Vec<bool>>,
  live: HashSet<Slot>,
  queue: Vec<Slot>,
}

impl<'a> Shaker<'a> {
  fn mark(&mut self, slot: Slot) {
    if self.live.insert(slot.clone()) {
      self.queue.push(slot);
    };
  }

  fn keep(&mut self, module: usize, item: usize) {
    if self.kept[module][item] {
      return;
    };
    self.kept[module][item] = true;
    let (graph, linked) = (self.graph, self.linked);
    let m = &graph.modules[module];
    let item = &m.syntax.items[item];
    for reference in item.references.clone() {
      if let Some(slot) = linked.reference_slot(graph, module, reference) {
        self.mark(slot);
      };
    }
    for (i, dynamic) in m.syntax.dynamic_imports.iter().enumerate() {
      if item.loc.contains(dynamic.loc.0) {
        if let Some(slot) = &linked.dynamic_imports[module][i] {
          self.mark(slot.clone());
        };
      };
    }
  }

  fn drain(&mut self) {
    while let Some(slot) = self.queue.pop() {
      match slot {
        Slot::Local { module, binding } => {
          let items = self.declared_by[module].get(&binding).cloned().unwrap_or_default();
          for item in items {
            self.keep(module, item);
          }
        }
        Slot::Namespace(module) => {
          let linked = self.linked;
          for (_, slot) in linked.namespaces.get(&module).into_iter().flatten() {
            self.mark(slot.clone());
          }
        }
        Slot::External { .. } => {}
      };
    }
  }
}

/// Works out which items to emit. Non-declaration items, declarations with side effects and everything in the
/// entry module are roots; a declaration elsewhere is kept only if something kept reads one of its bindings.
/// With `treeshake` off every item is a root.
pub fn shake(graph: &ModuleGraph, linked: &Linked, treeshake: bool) -> Shaken {
  let declared_by = graph
    .modules
    .iter()
    .map(|m| {
      let mut map: HashMap<BindingId, Vec<usize>> = HashMap::new();
      for (i, item) in m.syntax.items.iter().enumerate() {
        for binding in m.syntax.item_bindings(item) {
          map.entry(binding).or_default().push(i);
        }
      }
      map
    })
    .collect();
  let mut shaker = Shaker {
    graph,
    linked,
    declared_by,
    kept: graph.modules.iter().map(|m| vec![false; m.syntax.items.len()]).collect(),
    live: HashSet::new(),
    queue: Vec::new(),
  };
  for (_, slot) in linked.entry_exports.iter() {
    shaker.mark(slot.clone());
  }
  for (i, module) in graph.modules.iter().enumerate() {
    for (j, item) in module.syntax.items.iter().enumerate() {
      if !treeshake || module.is_entry() || !item.kind.is_declaration() || item.has_side_effects {
        shaker.keep(i, j);
      };
    }
  }
  shaker.drain();

  let total: usize = shaker.kept.iter().map(|k| k.len()).sum();
  let kept: usize = shaker.kept.iter().map(|k| k.iter().filter(|k| **k).count()).sum();
  debug!(kept, removed = total - kept, live = shaker.live.len(), "shook module graph");
  Shaken {
    kept: shaker.kept,
    live: shaker.live,
  }
}
