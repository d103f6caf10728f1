use crate::loc::Loc;
use crate::scope::BindingId;
use crate::scope::DeclKind;
use crate::scope::Declaration;
use crate::scope::ScopeId;
use crate::scope::ScopeTree;
use std::ops::Range;

/// Name of the binding that holds a module's default export when the export has no name of its own, as in
/// `export default 1 + 1` or `export default function () {}`. It can never collide with a real identifier.
pub const DEFAULT_EXPORT_BINDING: &str = "*default*";

/// A module specifier as written in an `import`/`export ... from` declaration or a dynamic `import()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleRequest {
  pub specifier: String,
  // Location of the string literal, including quotes.
  pub loc: Loc,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Imported {
  Name(String),
  Namespace,
}

#[derive(Clone, Debug)]
pub struct ImportSpecifier {
  pub imported: Imported,
  pub local: String,
  pub loc: Loc,
}

#[derive(Clone, Debug)]
pub struct ImportDecl {
  pub request: usize,
  pub specifiers: Vec<ImportSpecifier>,
}

#[derive(Clone, Debug)]
pub enum ExportTarget {
  // A module-level binding of this module (which may itself be an import).
  Local(String),
  // `export { a as b } from "x"` and `export * as ns from "x"`.
  From { request: usize, imported: Imported },
}

#[derive(Clone, Debug)]
pub struct ExportSpecifier {
  pub exported: String,
  pub loc: Loc,
  pub target: ExportTarget,
}

/// An `import(...)` call whose argument is a plain string literal.
#[derive(Clone, Debug)]
pub struct DynamicImport {
  pub request: ModuleRequest,
  // The entire call expression.
  pub loc: Loc,
  // Innermost scope containing the call.
  pub scope: ScopeId,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemKind {
  Import,
  // `export { a, b as c };`
  ExportList,
  // `export { a } from "x";`, `export * from "x";` and `export * as ns from "x";`
  ExportFrom,
  // `export` followed by a function, class or variable declaration. `strip` covers the `export` keyword and
  // the whitespace up to the declaration.
  ExportDeclaration { strip: Loc },
  // `export default` followed by a function or class declaration. When the declaration has no name, one
  // must be inserted at `name_insert_at`.
  ExportDefaultDeclaration {
    strip: Loc,
    name_insert_at: Option<usize>,
  },
  // `export default` followed by an expression. `strip` covers `export default` and the whitespace up to the
  // expression.
  ExportDefaultExpression { strip: Loc, expr: Loc },
  // A function, class or variable declaration.
  Declaration,
  Statement,
}

impl ItemKind {
  /// Whether the item only exists to declare bindings, and so can be dropped when none of them is used.
  pub fn is_declaration(&self) -> bool {
    matches!(
      self,
      ItemKind::ExportDeclaration { .. }
        | ItemKind::ExportDefaultDeclaration { .. }
        | ItemKind::ExportDefaultExpression { .. }
        | ItemKind::Declaration
    )
  }

  /// Whether the item is module syntax that has no runtime counterpart once modules are linked.
  pub fn is_module_syntax(&self) -> bool {
    matches!(self, ItemKind::Import | ItemKind::ExportList | ItemKind::ExportFrom)
  }
}

/// A top-level statement.
#[derive(Clone, Debug)]
pub struct ModuleItem {
  pub loc: Loc,
  pub kind: ItemKind,
  // The statement ended through automatic semicolon insertion, so a `;` must be added if other code is placed
  // after it.
  pub asi: bool,
  // Evaluating the statement could be observed, e.g. a declaration whose initializer calls a function.
  // Function bodies don't count as they are not evaluated at definition time.
  pub has_side_effects: bool,
  // Ranges into the declarations and references of the module's scope tree.
  pub declarations: Range<usize>,
  pub references: Range<usize>,
}

/// Everything a linker needs to know about a parsed module.
#[derive(Clone, Debug)]
pub struct ModuleSyntax {
  pub items: Vec<ModuleItem>,
  pub requests: Vec<ModuleRequest>,
  pub imports: Vec<ImportDecl>,
  pub exports: Vec<ExportSpecifier>,
  // Requests of `export * from "x"`, in source order.
  pub star_exports: Vec<usize>,
  pub dynamic_imports: Vec<DynamicImport>,
  pub scopes: ScopeTree,
  // Start offset of every token, in source order.
  pub token_starts: Vec<usize>,
}

impl ModuleSyntax {
  /// Module-level bindings declared by an item, deduplicated, in declaration order.
  pub fn item_bindings(&self, item: &ModuleItem) -> Vec<BindingId> {
    let mut out = Vec::new();
    for i in item.declarations.clone() {
      let binding = self.scopes.declaration_binding(i);
      if self.scopes.is_module_binding(binding)
        && self.scopes.binding(binding).kind != DeclKind::Import
        && !out.contains(&binding)
      {
        out.push(binding);
      };
    }
    out
  }

  /// Names exported by declarations directly in the module scope within `decls`, used for
  /// `export const { a, b } = ...` and friends.
  pub(crate) fn exported_declaration_names(
    declarations: &[Declaration],
    decls: Range<usize>,
  ) -> Vec<(String, Loc)> {
    declarations[decls]
      .iter()
      .filter(|d| d.scope == ScopeId::MODULE && d.kind != DeclKind::Import)
      .map(|d| (d.name.clone(), d.loc))
      .collect()
  }
}
