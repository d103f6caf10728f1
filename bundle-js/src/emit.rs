use crate::error::CompileError;
use crate::graph::Dependency;
use crate::graph::Module;
use crate::graph::ModuleGraph;
use crate::link::Linked;
use crate::link::Slot;
use crate::rename::Names;
use crate::sourcemap::SourceMap;
use crate::sourcemap::SourceMapBuilder;
use crate::treeshake::Shaken;
use parse_js::char::is_id_continue;
use parse_js::char::is_id_start;
use parse_js::loc::LineIndex;
use parse_js::loc::Loc;
use parse_js::module::Imported;
use parse_js::module::ItemKind;
use parse_js::module::ModuleItem;
use parse_js::module::DEFAULT_EXPORT_BINDING;
use parse_js::scope::DeclKind;
use std::fmt::Write;

pub struct Output {
  pub code: String,
  pub map: SourceMap,
}

fn quote(s: &str) -> String {
  serde_json::to_string(s).unwrap_or_else(|_| format!("{:?}", s))
}

fn is_identifier_name(name: &str) -> bool {
  let mut chars = name.chars();
  chars.next().is_some_and(is_id_start) && chars.all(is_id_continue)
}

// An export or import name as it must be written in an export list or object literal.
fn export_name(name: &str) -> String {
  if is_identifier_name(name) {
    name.to_string()
  } else {
    quote(name)
  }
}

// Replaces `loc` in a module's source with `text`. Mapped to the start of `loc`, and named `name` in the
// source map if set.
struct Edit {
  loc: Loc,
  text: String,
  name: Option<String>,
}

struct Writer {
  code: String,
  map: SourceMapBuilder,
}

impl Writer {
  fn push(&mut self, text: &str) {
    self.code.push_str(text);
    self.map.advance(text);
  }
}

// Writes the parts of one module.
struct ModuleWriter<'a> {
  module: &'a Module,
  source: u32,
  lines: LineIndex<'a>,
}

impl<'a> ModuleWriter<'a> {
  // Copies `range` of the source, mapping the start of every token in it.
  fn copy(&self, out: &mut Writer, range: Loc) {
    let text = &self.module.source;
    let starts = &self.module.syntax.token_starts;
    let mut cur = range.0;
    let first = starts.partition_point(|&s| s < range.0);
    for &start in starts[first..].iter().take_while(|&&s| s < range.1) {
      out.push(&text[cur..start]);
      out.map.add_mapping(self.source, self.lines.line_col(start), None);
      cur = start;
    }
    out.push(&text[cur..range.1]);
  }

  fn write_item(&self, out: &mut Writer, item: &ModuleItem, mut edits: Vec<Edit>) {
    edits.sort_by_key(|e| (e.loc.0, e.loc.1));
    let mut cur = item.loc.0;
    for edit in edits {
      if edit.loc.0 < cur {
        continue;
      };
      self.copy(out, Loc(cur, edit.loc.0));
      if !edit.text.is_empty() {
        out.map.add_mapping(
          self.source,
          self.lines.line_col(edit.loc.0),
          edit.name.as_deref(),
        );
        out.push(&edit.text);
      };
      cur = edit.loc.1;
    }
    self.copy(out, Loc(cur, item.loc.1));
    if item.asi {
      out.push(";");
    };
  }
}

struct Emitter<'a> {
  graph: &'a ModuleGraph,
  linked: &'a Linked,
  shaken: &'a Shaken,
  names: &'a Names,
}

impl<'a> Emitter<'a> {
  fn name(&self, slot: &Slot) -> Result<&'a str, CompileError> {
    self
      .names
      .get(slot)
      .ok_or_else(|| CompileError::internal(format!("no name was assigned to {:?}", slot)))
  }

  fn item_edits(&self, m: usize, item: &ModuleItem) -> Result<Vec<Edit>, CompileError> {
    let module = &self.graph.modules[m];
    let scopes = &module.syntax.scopes;
    let source = &*module.source;
    let mut edits = Vec::new();

    for r in item.references.clone() {
      let Some(slot) = self.linked.reference_slot(self.graph, m, r) else {
        continue;
      };
      let reference = &scopes.references()[r];
      let name = self.name(&slot)?;
      let written = &source[reference.loc.0..reference.loc.1];
      if name == written {
        continue;
      };
      let text = if reference.shorthand {
        format!("{}: {}", written, name)
      } else {
        name.to_string()
      };
      edits.push(Edit {
        loc: reference.loc,
        text,
        name: Some(reference.name.clone()),
      });
    }

    for d in item.declarations.clone() {
      let binding = scopes.declaration_binding(d);
      let decl = &scopes.declarations()[d];
      if !scopes.is_module_binding(binding)
        || decl.kind == DeclKind::Import
        || decl.name == DEFAULT_EXPORT_BINDING
      {
        continue;
      };
      let name = self.name(&Slot::Local { module: m, binding })?;
      let written = &source[decl.loc.0..decl.loc.1];
      if name == written {
        continue;
      };
      let text = if decl.shorthand {
        format!("{}: {}", written, name)
      } else {
        name.to_string()
      };
      edits.push(Edit {
        loc: decl.loc,
        text,
        name: Some(decl.name.clone()),
      });
    }

    let default_name = || -> Result<&'a str, CompileError> {
      let binding = scopes
        .module_binding(DEFAULT_EXPORT_BINDING)
        .ok_or_else(|| CompileError::internal("anonymous default export has no binding"))?;
      self.name(&Slot::Local { module: m, binding })
    };
    match item.kind {
      ItemKind::ExportDeclaration { strip } => edits.push(Edit {
        loc: strip,
        text: String::new(),
        name: None,
      }),
      ItemKind::ExportDefaultDeclaration {
        strip,
        name_insert_at,
      } => {
        edits.push(Edit {
          loc: strip,
          text: String::new(),
          name: None,
        });
        if let Some(at) = name_insert_at {
          // The name takes the place of any spaces after the keyword, so `function (a)` becomes `function
          // name(a)` and `class extends B` becomes `class name extends B`.
          let rest = source[at..].trim_start_matches(|c: char| c == ' ' || c == '\t');
          let gap = source.len() - at - rest.len();
          let text = if rest.starts_with('(') {
            format!(" {}", default_name()?)
          } else {
            format!(" {} ", default_name()?)
          };
          edits.push(Edit {
            loc: Loc(at, at + gap),
            text,
            name: None,
          });
        };
      }
      ItemKind::ExportDefaultExpression { strip, .. } => edits.push(Edit {
        loc: strip,
        text: format!("const {} = ", default_name()?),
        name: None,
      }),
      _ => {}
    };

    for (d, dynamic) in module.syntax.dynamic_imports.iter().enumerate() {
      if !item.loc.contains(dynamic.loc.0) {
        continue;
      };
      if let Some(slot) = &self.linked.dynamic_imports[m][d] {
        edits.push(Edit {
          loc: dynamic.loc,
          text: format!("Promise.resolve().then(() => {})", self.name(slot)?),
          name: None,
        });
      };
    }
    Ok(edits)
  }

  fn write_imports(&self, out: &mut Writer, order: &[usize]) -> Result<(), CompileError> {
    let mut specifiers: Vec<&str> = Vec::new();
    for &m in order {
      let module = &self.graph.modules[m];
      for (request, dep) in module.syntax.requests.iter().zip(module.requests.iter()) {
        if *dep == Dependency::External && !specifiers.contains(&request.specifier.as_str()) {
          specifiers.push(&request.specifier);
        };
      }
    }
    for slot in self.names.externals.iter() {
      if let Slot::External { specifier, .. } = slot {
        if !specifiers.contains(&specifier.as_str()) {
          specifiers.push(specifier);
        };
      };
    }

    for specifier in specifiers {
      let mut named = Vec::new();
      let mut namespaces = Vec::new();
      for slot in self.names.externals.iter() {
        let Slot::External {
          specifier: s,
          imported,
        } = slot
        else {
          continue;
        };
        if s != specifier {
          continue;
        };
        let local = self.name(slot)?;
        match imported {
          Imported::Namespace => namespaces.push(local),
          Imported::Name(name) if name == local => named.push(local.to_string()),
          Imported::Name(name) => named.push(format!("{} as {}", export_name(name), local)),
        };
      }
      let from = quote(specifier);
      if !named.is_empty() {
        out.push(&format!("import {{ {} }} from {};\n", named.join(", "), from));
      };
      for local in namespaces.iter() {
        out.push(&format!("import * as {} from {};\n", local, from));
      }
      if named.is_empty()
        && namespaces.is_empty()
        && !self.linked.entry_star_externals.iter().any(|s| s == specifier)
      {
        out.push(&format!("import {};\n", from));
      };
    }
    Ok(())
  }

  fn write_namespaces(&self, out: &mut Writer) -> Result<(), CompileError> {
    for (&module, exports) in self.linked.namespaces.iter() {
      let slot = Slot::Namespace(module);
      if !self.shaken.is_live(&slot) {
        continue;
      };
      let mut text = String::new();
      let _ = writeln!(text, "const {} = Object.freeze({{", self.name(&slot)?);
      text.push_str("  __proto__: null,\n");
      text.push_str("  [Symbol.toStringTag]: \"Module\",\n");
      for (name, target) in exports.iter() {
        let _ = writeln!(
          text,
          "  get {}() {{ return {}; }},",
          export_name(name),
          self.name(target)?
        );
      }
      text.push_str("});\n");
      out.push(&text);
    }
    Ok(())
  }

  fn write_exports(&self, out: &mut Writer) -> Result<(), CompileError> {
    let mut list = Vec::new();
    for (exported, slot) in self.linked.entry_exports.iter() {
      let local = self.name(slot)?;
      if local == exported {
        list.push(local.to_string());
      } else {
        list.push(format!("{} as {}", local, export_name(exported)));
      };
    }
    if !list.is_empty() {
      out.push(&format!("export {{ {} }};\n", list.join(", ")));
    };
    for specifier in self.linked.entry_star_externals.iter() {
      out.push(&format!("export * from {};\n", quote(specifier)));
    }
    Ok(())
  }
}

/// Writes the bundle: hoisted external imports, namespace objects, kept items of every module in link order,
/// then the entry's exports.
pub fn emit(
  graph: &ModuleGraph,
  linked: &Linked,
  shaken: &Shaken,
  names: &Names,
  order: &[usize],
  sources_content: bool,
) -> Result<Output, CompileError> {
  let emitter = Emitter {
    graph,
    linked,
    shaken,
    names,
  };
  let mut out = Writer {
    code: String::new(),
    map: SourceMapBuilder::new(),
  };
  emitter.write_imports(&mut out, order)?;
  emitter.write_namespaces(&mut out)?;
  for &m in graph.link_order.iter() {
    let module = &graph.modules[m];
    let writer = ModuleWriter {
      module,
      source: out.map.add_source(module.id.as_str(), Some(&*module.source)),
      lines: LineIndex::new(&module.source),
    };
    for (i, item) in module.syntax.items.iter().enumerate() {
      if !shaken.kept[m][i] || item.kind.is_module_syntax() {
        continue;
      };
      let edits = emitter.item_edits(m, item)?;
      writer.write_item(&mut out, item, edits);
      out.push("\n");
    }
  }
  emitter.write_exports(&mut out)?;
  Ok(Output {
    map: out.map.build(None, sources_content),
    code: out.code,
  })
}
