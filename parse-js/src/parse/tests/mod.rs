use super::Parser;
use crate::error::SyntaxErrorType;
use crate::lex::LexMode;
use crate::lex::Lexer;
use crate::loc::Loc;
use crate::module::ItemKind;
use crate::module::ModuleSyntax;
use crate::scope::DeclKind;
use crate::scope::ScopeId;
use crate::token::TT;

fn parse(source: &str) -> ModuleSyntax {
  Parser::new(Lexer::new(source)).parse_module().unwrap()
}

fn parse_err(source: &str) -> SyntaxErrorType {
  Parser::new(Lexer::new(source)).parse_module().unwrap_err().typ
}

#[test]
fn test_parser() {
  let lexer = Lexer::new("let x = /a/ / 1;");
  let mut p = Parser::new(lexer);
  // Initial state.
  let cp = p.checkpoint();
  assert_eq!(p.next_tok_i, 0);

  // Peek the first token.
  let t = p.peek();
  assert_eq!(p.next_tok_i, 0);
  assert_eq!(p.buf.len(), 1);
  assert_eq!(t.typ, TT::KeywordLet);

  // Consume the first token.
  let t = p.consume();
  assert_eq!(p.next_tok_i, 1);
  assert_eq!(p.buf.len(), 1);
  assert_eq!(t.typ, TT::KeywordLet);

  // Consume the second token.
  let t = p.consume();
  assert_eq!(p.next_tok_i, 2);
  assert_eq!(p.buf.len(), 2);
  assert_eq!(t.typ, TT::Identifier);

  // Reset to a past point.
  p.restore_checkpoint(cp);
  assert_eq!(p.next_tok_i, 0);
  assert_eq!(p.buf.len(), 2);

  // Peek using a different mode, which should truncate the buffer.
  let t = p.peek_with_mode(LexMode::SlashIsRegex);
  assert_eq!(p.next_tok_i, 0);
  assert_eq!(p.buf.len(), 1);
  assert_eq!(t.typ, TT::KeywordLet);
}

#[test]
fn test_restore_checkpoint_discards_declarations() {
  let mut p = Parser::new(Lexer::new("(a, b) + c"));
  let cp = p.checkpoint();
  p.consume();
  p.declare("a".to_string(), Loc(1, 2), DeclKind::Param, false);
  p.mark_side_effect();
  p.restore_checkpoint(cp);
  assert!(p.declarations.is_empty());
  assert!(!p.side_effects);
  assert_eq!(p.next_tok_i, 0);
}

#[test]
fn test_items() {
  let m = parse(
    "import a from './a.js';\nexport const b = 1;\nfunction c() {}\nc();\nexport { c };\nexport * from './d.js';\n",
  );
  let kinds: Vec<_> = m.items.iter().map(|i| i.kind.clone()).collect();
  assert_eq!(kinds, vec![
    ItemKind::Import,
    ItemKind::ExportDeclaration { strip: Loc(24, 31) },
    ItemKind::Declaration,
    ItemKind::Statement,
    ItemKind::ExportList,
    ItemKind::ExportFrom,
  ]);
  assert_eq!(m.items[0].loc, Loc(0, 23));
  assert_eq!(m.items[2].loc, Loc(44, 59));
}

#[test]
fn test_side_effects() {
  let m = parse(
    r#"
      const a = 1;
      const b = f();
      function g() { h(); }
      class K { static x = f(); }
      class L { y = f(); m() { f(); } }
      x = 1;
      const o = { m() { z(); } };
      const arrow = () => f();
      const n = new Map();
      const t = tag`x`;
      const p = a.b.c;
    "#,
  );
  let effects: Vec<_> = m.items.iter().map(|i| i.has_side_effects).collect();
  assert_eq!(effects, vec![
    false, true, false, true, false, true, false, false, true, true, false
  ]);
}

#[test]
fn test_asi() {
  let m = parse("let a = 1\nlet b = 2;\nif (a) b()\n");
  let asi: Vec<_> = m.items.iter().map(|i| i.asi).collect();
  assert_eq!(asi, vec![true, false, true]);
}

#[test]
fn test_scope_resolution() {
  let m = parse("let x = 1;\nfunction f(x) { return x + y; }\ng(x);\n");
  let scopes = &m.scopes;
  let module_x = scopes.module_binding("x").unwrap();
  let param_x = scopes
    .references()
    .iter()
    .position(|r| r.name == "x" && r.scope != ScopeId::MODULE)
    .and_then(|i| scopes.reference_binding(i))
    .unwrap();
  assert_ne!(module_x, param_x);
  assert_eq!(scopes.binding(param_x).kind, DeclKind::Param);
  let mut free: Vec<_> = scopes.free_names().iter().cloned().collect();
  free.sort();
  assert_eq!(free, vec!["g".to_string(), "y".to_string()]);
}

#[test]
fn test_class_declaration_name_resolves_to_module_binding() {
  let m = parse("class A { m() { return A; } }\nconst B = class C { n() { return C; } };\n");
  let scopes = &m.scopes;
  let a_ref = scopes.references().iter().position(|r| r.name == "A").unwrap();
  assert_eq!(scopes.reference_binding(a_ref), scopes.module_binding("A"));
  assert!(scopes.module_binding("C").is_none());
  let c_ref = scopes.references().iter().position(|r| r.name == "C").unwrap();
  assert!(scopes.reference_binding(c_ref).is_some());
}

#[test]
fn test_var_hoists_out_of_blocks() {
  let m = parse("{ var a = 1; let b = 2; }\nfor (const c of d) {}\n");
  assert!(m.scopes.module_binding("a").is_some());
  assert!(m.scopes.module_binding("b").is_none());
  assert!(m.scopes.module_binding("c").is_none());
}

#[test]
fn test_shorthand() {
  let m = parse("const { p, q: r } = o;\nconst s = { p, t: r };\n");
  let decls: Vec<_> = m
    .scopes
    .declarations()
    .iter()
    .map(|d| (d.name.as_str(), d.shorthand))
    .collect();
  assert_eq!(decls, vec![("p", true), ("r", false), ("s", false)]);
  let refs: Vec<_> = m
    .scopes
    .references()
    .iter()
    .map(|r| (r.name.as_str(), r.shorthand))
    .collect();
  assert_eq!(refs, vec![("o", false), ("p", true), ("r", false)]);
}

#[test]
fn test_expressions() {
  let m = parse(
    r#"
      let x = a / b / c, y = /re/g.test(s);
      const t = `a${b}c${`n${d}`}`;
      const f = async (p, { q } = {}) => p ?? q?.[0] ?? await p;
      const g = async x => x;
      const h = function* () { yield* [1]; yield; };
      const i = (j = 1) => ({ j, [k]: 2, get l() { return 1; }, async *m() {} });
      for (let n = 0; n < 1; n++) {}
      for (const o in p) {}
      label: while (true) { break label; }
      switch (x) { case 1: break; default: }
      try { throw e; } catch ({ message }) {} finally {}
      do x++; while (x < 10)
      new.target;
      import.meta.url;
    "#,
  );
  assert_eq!(m.items.len(), 14);
  let names: Vec<_> = m.scopes.free_names().iter().cloned().collect();
  for name in ["a", "b", "c", "d", "s", "k", "p", "e"] {
    assert!(names.contains(&name.to_string()), "missing {name}");
  }
}

#[test]
fn test_dynamic_imports() {
  let m = parse("const m = import('./a.js');\nimport(name);\nf(async () => import(\"./b.js\"));\n");
  let specifiers: Vec<_> = m
    .dynamic_imports
    .iter()
    .map(|d| d.request.specifier.as_str())
    .collect();
  assert_eq!(specifiers, vec!["./a.js", "./b.js"]);
  assert_eq!(m.dynamic_imports[0].loc, Loc(10, 26));
  assert!(m.items[0].has_side_effects);
}

#[test]
fn test_export_default() {
  let m = parse("export default function () {}");
  assert_eq!(m.items[0].kind, ItemKind::ExportDefaultDeclaration {
    strip: Loc(0, 15),
    name_insert_at: Some(23),
  });

  let m = parse("export default 1 + 2;");
  assert_eq!(m.items[0].kind, ItemKind::ExportDefaultExpression {
    strip: Loc(0, 15),
    expr: Loc(15, 20),
  });

  let m = parse("export default class Named {}");
  assert_eq!(m.items[0].kind, ItemKind::ExportDefaultDeclaration {
    strip: Loc(0, 15),
    name_insert_at: None,
  });
  assert!(m.scopes.module_binding("Named").is_some());
}

#[test]
fn test_token_starts() {
  let m = parse("a + b // c\n;");
  assert_eq!(m.token_starts, vec![0, 2, 4, 11]);
}

#[test]
fn test_errors() {
  assert_eq!(
    parse_err("if (a) { import x from 'y'; }"),
    SyntaxErrorType::ModuleSyntaxNotAtTopLevel
  );
  assert_eq!(
    parse_err("function f() { export const a = 1; }"),
    SyntaxErrorType::ModuleSyntaxNotAtTopLevel
  );
  assert_eq!(parse_err("throw\nx;"), SyntaxErrorType::LineTerminatorAfterThrow);
  assert_eq!(
    parse_err("try {}"),
    SyntaxErrorType::TryStatementHasNoCatchOrFinally
  );
  assert_eq!(
    parse_err("let f = (a)\n=> a;"),
    SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters
  );
  assert_eq!(parse_err("let x ="), SyntaxErrorType::UnexpectedEnd);
  assert_eq!(parse_err("let x = 'unterminated"), SyntaxErrorType::InvalidToken);
  assert_eq!(
    parse_err("a b"),
    SyntaxErrorType::RequiredTokenNotFound(TT::Semicolon)
  );
  assert!(matches!(
    parse_err("with (a) {}"),
    SyntaxErrorType::ExpectedSyntax(_)
  ));
  assert!(matches!(
    parse_err("let let = 1;"),
    SyntaxErrorType::ExpectedSyntax(_)
  ));
}

#[test]
fn test_early_errors() {
  for source in [
    "let a = 1;\nlet a = 2;",
    "import { a } from './b.js';\nconst a = 2;",
    "function f() {}\nclass f {}",
    "{ let b; var b; }",
    "function g(c, c) {}",
    "function h(d) { let d; }",
    "switch (x) { case 1: let e; case 2: let e; }",
    "export default 1;\nexport default 2;",
  ] {
    assert_eq!(parse_err(source), SyntaxErrorType::DuplicateDeclaration, "{source}");
  }
  assert_eq!(parse_err("return;"), SyntaxErrorType::ReturnOutsideFunction);
  assert_eq!(
    parse_err("class A { static { return; } }"),
    SyntaxErrorType::ReturnOutsideFunction
  );
  assert_eq!(parse_err("const x;"), SyntaxErrorType::MissingConstInitializer);
  assert_eq!(parse_err("const y = 1, z;"), SyntaxErrorType::MissingConstInitializer);
  assert_eq!(parse_err("for(;;){ break foo; }"), SyntaxErrorType::UndefinedLabel);
  assert_eq!(parse_err("break;"), SyntaxErrorType::JumpOutsideLoop);
  assert_eq!(
    parse_err("switch (x) { case 1: continue; }"),
    SyntaxErrorType::JumpOutsideLoop
  );
  assert_eq!(parse_err("a: { continue a; }"), SyntaxErrorType::JumpOutsideLoop);
  assert_eq!(
    parse_err("while (x) { function f() { break; } }"),
    SyntaxErrorType::JumpOutsideLoop
  );
  assert_eq!(parse_err("a: a: while (x) {}"), SyntaxErrorType::DuplicateLabel);

  let err = Parser::new(Lexer::new("let a = 1;\nlet a = 2;")).parse_module().unwrap_err();
  assert_eq!(err.loc, Loc(15, 16));
}

#[test]
fn test_valid_redeclarations_and_jumps() {
  parse(
    r#"
      var a; var a;
      function f(b) { var b; function b() {} return b; }
      try {} catch (e) { var e; }
      const g = function g() { let g; };
      for (const h of []) {}
      for (const h in {}) {}
      outer: for (;;) { inner: while (x) { continue outer; } break; }
      block: { break block; }
      switch (x) { case 1: { let i; } default: { let i; } break; }
      class C { m() { return; } }
    "#,
  );
}

#[test]
fn test_deep_nesting_is_an_error() {
  // The limit must be reached long before a generous stack runs out.
  let res = std::thread::Builder::new()
    .stack_size(256 * 1024 * 1024)
    .spawn(|| {
      for source in ["(".repeat(20_000), "[".repeat(20_000), "{".repeat(20_000), "-".repeat(20_000)] {
        assert_eq!(parse_err(&source), SyntaxErrorType::NestingTooDeep);
      }
      parse(&format!("x = {}1{};", "(".repeat(100), ")".repeat(100)));
    })
    .unwrap()
    .join();
  assert!(res.is_ok());
}
