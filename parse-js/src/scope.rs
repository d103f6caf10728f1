use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::loc::Loc;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

impl ScopeId {
  pub const MODULE: ScopeId = ScopeId(0);

  pub fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct BindingId(pub u32);

impl BindingId {
  pub fn index(self) -> usize {
    self.0 as usize
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScopeType {
  Module,
  // Functions, arrow functions, methods and class static blocks. `var` declarations hoist to the closest one.
  Function,
  Block,
  // Holds the name of a function or class expression, which is only visible inside it.
  ExpressionName,
}

#[derive(Clone, Debug)]
pub struct Scope {
  pub parent: Option<ScopeId>,
  pub typ: ScopeType,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeclKind {
  Var,
  Let,
  Const,
  Function,
  Class,
  Param,
  CatchParam,
  Import,
}

impl DeclKind {
  pub fn hoists_to_function(self) -> bool {
    self == DeclKind::Var
  }

  /// Whether a binding of this kind in a scope of type `scope` cannot share its name with any other
  /// declaration in that scope.
  pub fn is_lexical(self, scope: ScopeType) -> bool {
    match self {
      DeclKind::Let | DeclKind::Const | DeclKind::Class | DeclKind::Import => true,
      // Function declarations are only var-like directly inside a function body.
      DeclKind::Function => scope != ScopeType::Function,
      _ => false,
    }
  }
}

/// A syntactic occurrence of a binding name, e.g. `x` in `let x`, `function x() {}` or `import { y as x }`.
#[derive(Clone, Debug)]
pub struct Declaration {
  pub name: String,
  pub loc: Loc,
  // The scope the declaration syntactically appears in, before any hoisting.
  pub scope: ScopeId,
  pub kind: DeclKind,
  // Declared via shorthand object pattern syntax, like `x` in `const { x } = obj`.
  pub shorthand: bool,
}

/// A use of a name as an expression or assignment target.
#[derive(Clone, Debug)]
pub struct Reference {
  pub name: String,
  pub loc: Loc,
  pub scope: ScopeId,
  // Appears as a shorthand object literal property, like `x` in `({ x })`.
  pub shorthand: bool,
}

#[derive(Clone, Debug)]
pub struct Binding {
  pub name: String,
  pub scope: ScopeId,
  pub kind: DeclKind,
  pub declarations: Vec<usize>,
}

/// All scopes, declarations and references of a module, with every declaration bound and every reference
/// resolved to the binding it refers to (or to nothing, for free globals).
#[derive(Clone, Debug, Default)]
pub struct ScopeTree {
  scopes: Vec<Scope>,
  declarations: Vec<Declaration>,
  references: Vec<Reference>,
  bindings: Vec<Binding>,
  scope_bindings: Vec<HashMap<String, BindingId>>,
  declaration_bindings: Vec<BindingId>,
  reference_bindings: Vec<Option<BindingId>>,
  free_names: HashSet<String>,
}

impl ScopeTree {
  pub(crate) fn build(
    scopes: Vec<Scope>,
    declarations: Vec<Declaration>,
    references: Vec<Reference>,
  ) -> SyntaxResult<ScopeTree> {
    let mut tree = ScopeTree {
      scope_bindings: vec![HashMap::new(); scopes.len()],
      scopes,
      declarations,
      references,
      bindings: Vec::new(),
      declaration_bindings: Vec::new(),
      reference_bindings: Vec::new(),
      free_names: HashSet::new(),
    };
    tree.bind_declarations()?;
    tree.check_hoisted_vars()?;
    tree.resolve_references();
    Ok(tree)
  }

  fn bind_declarations(&mut self) -> SyntaxResult<()> {
    for i in 0..self.declarations.len() {
      let decl = &self.declarations[i];
      let mut target = decl.scope;
      if decl.kind.hoists_to_function() {
        while !matches!(self.scopes[target.index()].typ, ScopeType::Module | ScopeType::Function) {
          match self.scopes[target.index()].parent {
            Some(parent) => target = parent,
            None => break,
          };
        }
      };
      let name = decl.name.clone();
      let kind = decl.kind;
      // Redeclarations (`var x; var x;`, or a parameter redeclared with `var`) share one binding.
      let id = match self.scope_bindings[target.index()].get(&name) {
        Some(&id) => {
          let existing = self.bindings[id.index()].kind;
          let typ = self.scopes[target.index()].typ;
          if existing.is_lexical(typ)
            || kind.is_lexical(typ)
            || (existing == DeclKind::Param && kind == DeclKind::Param)
          {
            return Err(decl.loc.error(SyntaxErrorType::DuplicateDeclaration, None));
          };
          id
        }
        None => {
          let id = BindingId(self.bindings.len() as u32);
          self.bindings.push(Binding {
            name: name.clone(),
            scope: target,
            kind,
            declarations: Vec::new(),
          });
          self.scope_bindings[target.index()].insert(name, id);
          id
        }
      };
      self.bindings[id.index()].declarations.push(i);
      self.declaration_bindings.push(id);
    }
    Ok(())
  }

  // A `var` cannot hoist past a block that declares the same name some other way, like `{ let x; var x; }`.
  // Catch parameters are the exception.
  fn check_hoisted_vars(&self) -> SyntaxResult<()> {
    for (i, decl) in self.declarations.iter().enumerate() {
      if !decl.kind.hoists_to_function() {
        continue;
      };
      let target = self.bindings[self.declaration_bindings[i].index()].scope;
      let mut cur = decl.scope;
      while cur != target {
        if let Some(&id) = self.scope_bindings[cur.index()].get(&decl.name) {
          let binding = &self.bindings[id.index()];
          if binding.kind != DeclKind::CatchParam {
            let other = binding
              .declarations
              .iter()
              .map(|&d| self.declarations[d].loc)
              .min_by_key(|loc| loc.0)
              .unwrap_or(decl.loc);
            let later = if other.0 > decl.loc.0 { other } else { decl.loc };
            return Err(later.error(SyntaxErrorType::DuplicateDeclaration, None));
          };
        };
        match self.scopes[cur.index()].parent {
          Some(parent) => cur = parent,
          None => break,
        };
      }
    }
    Ok(())
  }

  fn resolve_references(&mut self) {
    let mut resolved = Vec::with_capacity(self.references.len());
    for reference in self.references.iter() {
      let binding = self.resolve(reference.scope, &reference.name);
      if binding.is_none() {
        self.free_names.insert(reference.name.clone());
      };
      resolved.push(binding);
    }
    self.reference_bindings = resolved;
  }

  /// Finds the binding `name` refers to when used in `scope`.
  pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<BindingId> {
    let mut cur = Some(scope);
    while let Some(id) = cur {
      if let Some(&binding) = self.scope_bindings[id.index()].get(name) {
        return Some(binding);
      };
      cur = self.scopes[id.index()].parent;
    }
    None
  }

  pub fn scope(&self, id: ScopeId) -> &Scope {
    &self.scopes[id.index()]
  }

  pub fn scope_count(&self) -> usize {
    self.scopes.len()
  }

  pub fn declarations(&self) -> &[Declaration] {
    &self.declarations
  }

  pub fn references(&self) -> &[Reference] {
    &self.references
  }

  pub fn bindings(&self) -> &[Binding] {
    &self.bindings
  }

  pub fn binding(&self, id: BindingId) -> &Binding {
    &self.bindings[id.index()]
  }

  pub fn declaration_binding(&self, declaration: usize) -> BindingId {
    self.declaration_bindings[declaration]
  }

  pub fn reference_binding(&self, reference: usize) -> Option<BindingId> {
    self.reference_bindings[reference]
  }

  /// Looks up a binding declared directly in the module scope.
  pub fn module_binding(&self, name: &str) -> Option<BindingId> {
    self.scope_bindings[ScopeId::MODULE.index()].get(name).copied()
  }

  pub fn module_bindings(&self) -> impl Iterator<Item = BindingId> + '_ {
    self
      .bindings
      .iter()
      .enumerate()
      .filter(|(_, b)| b.scope == ScopeId::MODULE)
      .map(|(i, _)| BindingId(i as u32))
  }

  pub fn is_module_binding(&self, id: BindingId) -> bool {
    self.bindings[id.index()].scope == ScopeId::MODULE
  }

  /// Names referenced somewhere in the module that are not declared anywhere in it.
  pub fn free_names(&self) -> &HashSet<String> {
    &self.free_names
  }

  /// Names declared in `scope` and every scope above it, stopping before the module scope. A module-level
  /// binding renamed to any of these would be shadowed at a reference from `scope`.
  pub fn names_enclosing(&self, scope: ScopeId) -> impl Iterator<Item = &str> + '_ {
    let mut cur = Some(scope);
    std::iter::from_fn(move || {
      let id = cur.filter(|&id| id != ScopeId::MODULE)?;
      cur = self.scopes[id.index()].parent;
      Some(id)
    })
    .flat_map(move |id| self.scope_bindings[id.index()].keys().map(|k| k.as_str()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn decl(name: &str, scope: u32, kind: DeclKind) -> Declaration {
    Declaration {
      name: name.to_string(),
      loc: Loc::default(),
      scope: ScopeId(scope),
      kind,
      shorthand: false,
    }
  }

  fn reference(name: &str, scope: u32) -> Reference {
    Reference {
      name: name.to_string(),
      loc: Loc::default(),
      scope: ScopeId(scope),
      shorthand: false,
    }
  }

  #[test]
  fn var_hoists_past_blocks_but_let_does_not() {
    let scopes = vec![
      Scope { parent: None, typ: ScopeType::Module },
      Scope { parent: Some(ScopeId(0)), typ: ScopeType::Function },
      Scope { parent: Some(ScopeId(1)), typ: ScopeType::Block },
    ];
    let tree = ScopeTree::build(
      scopes,
      vec![decl("a", 2, DeclKind::Var), decl("b", 2, DeclKind::Let)],
      vec![reference("a", 1), reference("b", 1), reference("console", 2)],
    )
    .unwrap();
    assert_eq!(tree.binding(tree.declaration_binding(0)).scope, ScopeId(1));
    assert_eq!(tree.binding(tree.declaration_binding(1)).scope, ScopeId(2));
    assert!(tree.reference_binding(0).is_some());
    assert!(tree.reference_binding(1).is_none());
    assert!(tree.free_names().contains("b"));
    assert!(tree.free_names().contains("console"));
    let mut enclosing: Vec<_> = tree.names_enclosing(ScopeId(2)).collect();
    enclosing.sort();
    assert_eq!(enclosing, vec!["a", "b"]);
  }

  #[test]
  fn redeclarations_share_a_binding() {
    let tree = ScopeTree::build(
      vec![Scope { parent: None, typ: ScopeType::Module }],
      vec![decl("x", 0, DeclKind::Var), decl("x", 0, DeclKind::Var)],
      vec![reference("x", 0)],
    )
    .unwrap();
    assert_eq!(tree.bindings().len(), 1);
    assert_eq!(tree.binding(BindingId(0)).declarations, vec![0, 1]);
    assert_eq!(tree.module_binding("x"), Some(BindingId(0)));
  }

  fn decl_at(name: &str, start: usize, scope: u32, kind: DeclKind) -> Declaration {
    Declaration {
      loc: Loc(start, start + name.len()),
      ..decl(name, scope, kind)
    }
  }

  #[test]
  fn lexical_redeclarations_are_rejected_at_the_later_declaration() {
    let err = ScopeTree::build(
      vec![Scope { parent: None, typ: ScopeType::Module }],
      vec![decl_at("a", 9, 0, DeclKind::Import), decl_at("a", 30, 0, DeclKind::Const)],
      vec![],
    )
    .unwrap_err();
    assert_eq!(err.typ, SyntaxErrorType::DuplicateDeclaration);
    assert_eq!(err.loc, Loc(30, 31));
  }

  #[test]
  fn var_cannot_hoist_past_a_lexical_binding() {
    let scopes = vec![
      Scope { parent: None, typ: ScopeType::Module },
      Scope { parent: Some(ScopeId(0)), typ: ScopeType::Block },
    ];
    let err = ScopeTree::build(
      scopes.clone(),
      vec![decl_at("x", 2, 1, DeclKind::Var), decl_at("x", 12, 1, DeclKind::Let)],
      vec![],
    )
    .unwrap_err();
    assert_eq!(err.loc, Loc(12, 13));

    // Catch parameters can be redeclared with `var`.
    let tree = ScopeTree::build(
      scopes,
      vec![decl("e", 1, DeclKind::CatchParam), decl("e", 1, DeclKind::Var)],
      vec![],
    )
    .unwrap();
    assert_eq!(tree.bindings().len(), 2);
  }

  #[test]
  fn function_bodies_allow_var_like_redeclarations() {
    let scopes = vec![
      Scope { parent: None, typ: ScopeType::Module },
      Scope { parent: Some(ScopeId(0)), typ: ScopeType::Function },
    ];
    let tree = ScopeTree::build(
      scopes.clone(),
      vec![
        decl("a", 1, DeclKind::Param),
        decl("a", 1, DeclKind::Var),
        decl("a", 1, DeclKind::Function),
      ],
      vec![],
    )
    .unwrap();
    assert_eq!(tree.bindings().len(), 1);

    for (first, second) in [
      (DeclKind::Param, DeclKind::Param),
      (DeclKind::Param, DeclKind::Let),
      (DeclKind::Function, DeclKind::Class),
    ] {
      let res = ScopeTree::build(
        scopes.clone(),
        vec![decl("a", 1, first), decl("a", 1, second)],
        vec![],
      );
      assert!(res.is_err(), "{:?} then {:?}", first, second);
    }
  }
}
