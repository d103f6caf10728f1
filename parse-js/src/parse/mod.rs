use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::lex_next;
use crate::lex::LexMode;
use crate::lex::Lexer;
use crate::loc::Loc;
use crate::module::DynamicImport;
use crate::module::ExportSpecifier;
use crate::module::ImportDecl;
use crate::module::ModuleItem;
use crate::module::ModuleRequest;
use crate::scope::DeclKind;
use crate::scope::Declaration;
use crate::scope::Reference;
use crate::scope::Scope;
use crate::scope::ScopeId;
use crate::scope::ScopeType;
use crate::token::Token;
use crate::token::TT;

pub mod class;
pub mod drive;
pub mod expr;
pub mod func;
pub mod import_export;
pub mod pat;
pub mod stmt;
#[cfg(test)]
mod tests;
pub mod toplevel;

// Almost every parse_* function takes these field values as parameters. Instead of having to enumerate them as parameters on every function and ordered unnamed arguments on every call, we simply pass this struct around. The with_* methods can be used to create an altered copy for passing into other functions, which is useful as most calls simply pass through the values unchanged. This struct should be received as a value, not a reference.
#[derive(Clone, Copy)]
pub struct ParseCtx {
  // Whether `await` can start an `AwaitExpression`: at the top level of a module and inside async functions.
  pub await_allowed: bool,
  // Whether `yield` can start a `YieldExpression`: inside generator functions.
  pub yield_allowed: bool,
  // Whether `in` is a binary operator here; it isn't in the head of a `for` statement.
  pub in_allowed: bool,
  // Inside the body of a function, arrow function or method, but not a class static block.
  pub return_allowed: bool,
}

impl ParseCtx {
  pub fn module() -> ParseCtx {
    ParseCtx {
      await_allowed: true,
      yield_allowed: false,
      in_allowed: true,
      return_allowed: false,
    }
  }

  pub fn with_in_allowed(&self, in_allowed: bool) -> ParseCtx {
    ParseCtx { in_allowed, ..*self }
  }

  pub fn for_function(&self, is_async: bool, is_generator: bool) -> ParseCtx {
    ParseCtx {
      await_allowed: is_async,
      yield_allowed: is_generator,
      in_allowed: true,
      return_allowed: true,
    }
  }

  pub fn for_static_block(&self) -> ParseCtx {
    ParseCtx {
      await_allowed: false,
      yield_allowed: false,
      in_allowed: true,
      return_allowed: false,
    }
  }
}

/// Deeper nesting of expressions, statements and patterns than this is rejected instead of risking a stack
/// overflow in the recursive descent.
pub const MAX_NESTING_DEPTH: u32 = 1000;

/// What `break` and `continue` can target from the current position, which never crosses a function boundary.
#[derive(Default)]
struct JumpTargets {
  // Enclosing labels, and whether each labels a loop.
  labels: Vec<(String, bool)>,
  loops: u32,
  switches: u32,
}


#[derive(Debug)]
#[must_use]
pub struct MaybeToken {
  typ: TT,
  loc: Loc,
  matched: bool,
}

impl MaybeToken {
  pub fn is_match(&self) -> bool {
    self.matched
  }

  pub fn match_loc(&self) -> Option<Loc> {
    if self.matched {
      Some(self.loc)
    } else {
      None
    }
  }

  pub fn error(&self, err: SyntaxErrorType) -> SyntaxError {
    debug_assert!(!self.matched);
    self.loc.error(err, Some(self.typ))
  }
}

// Recorded facts are only ever appended, so rewinding is truncating them back to these lengths.
pub struct ParserCheckpoint {
  next_tok_i: usize,
  scopes: usize,
  declarations: usize,
  references: usize,
  dynamic_imports: usize,
  scope: ScopeId,
  function_depth: u32,
  depth: u32,
  side_effects: bool,
}

/// To get the lexer's `next` after this token was lexed, use `token.loc.1`.
struct BufferedToken {
  token: Token,
  lex_mode: LexMode,
}

pub struct Parser<'a> {
  lexer: Lexer<'a>,
  buf: Vec<BufferedToken>,
  next_tok_i: usize,

  scopes: Vec<Scope>,
  declarations: Vec<Declaration>,
  references: Vec<Reference>,
  dynamic_imports: Vec<DynamicImport>,
  // Current innermost scope.
  scope: ScopeId,
  // Number of enclosing functions whose bodies are not evaluated when the current statement runs.
  function_depth: u32,
  // Number of enclosing guarded expressions, statements and patterns, bounded by `MAX_NESTING_DEPTH`.
  depth: u32,
  jumps: JumpTargets,
  // Whether something observable was evaluated since the last reset, outside of any function body.
  side_effects: bool,

  // Module syntax only appears at the top level, which is never rewound, so these aren't checkpointed.
  items: Vec<ModuleItem>,
  requests: Vec<ModuleRequest>,
  imports: Vec<ImportDecl>,
  exports: Vec<ExportSpecifier>,
  star_exports: Vec<usize>,
}

// We extend this struct with added methods in the various submodules, instead of simply using free functions and passing `&mut Parser` around, for several reasons:
// - Avoid needing to redeclare `<'a>` on every function.
// - More lifetime elision is available for `self` than if it was just another reference parameter.
// - `self` is shorter than `parser` but makes more sense than `p`.
// - Don't need to import each function.
impl<'a> Parser<'a> {
  pub fn new(lexer: Lexer<'a>) -> Parser<'a> {
    Parser {
      lexer,
      buf: Vec::new(),
      next_tok_i: 0,
      scopes: vec![Scope {
        parent: None,
        typ: ScopeType::Module,
      }],
      declarations: Vec::new(),
      references: Vec::new(),
      dynamic_imports: Vec::new(),
      scope: ScopeId::MODULE,
      function_depth: 0,
      depth: 0,
      jumps: JumpTargets::default(),
      side_effects: false,
      items: Vec::new(),
      requests: Vec::new(),
      imports: Vec::new(),
      exports: Vec::new(),
      star_exports: Vec::new(),
    }
  }

  pub fn source_range(&self) -> Loc {
    self.lexer.source_range()
  }

  pub fn str(&self, loc: Loc) -> &'a str {
    &self.lexer.source()[loc.0..loc.1]
  }

  pub fn string(&self, loc: Loc) -> String {
    self.str(loc).to_string()
  }

  pub fn checkpoint(&self) -> ParserCheckpoint {
    ParserCheckpoint {
      next_tok_i: self.next_tok_i,
      scopes: self.scopes.len(),
      declarations: self.declarations.len(),
      references: self.references.len(),
      dynamic_imports: self.dynamic_imports.len(),
      scope: self.scope,
      function_depth: self.function_depth,
      depth: self.depth,
      side_effects: self.side_effects,
    }
  }

  pub fn restore_checkpoint(&mut self, checkpoint: ParserCheckpoint) {
    self.next_tok_i = checkpoint.next_tok_i;
    self.scopes.truncate(checkpoint.scopes);
    self.declarations.truncate(checkpoint.declarations);
    self.references.truncate(checkpoint.references);
    self.dynamic_imports.truncate(checkpoint.dynamic_imports);
    self.scope = checkpoint.scope;
    self.function_depth = checkpoint.function_depth;
    self.depth = checkpoint.depth;
    self.side_effects = checkpoint.side_effects;
  }

  /// End of the most recently consumed token.
  pub fn prev_end(&self) -> usize {
    match self.next_tok_i {
      0 => 0,
      i => self.buf[i - 1].token.loc.1,
    }
  }

  fn reset_to(&mut self, n: usize) {
    self.next_tok_i = n;
    self.buf.truncate(n);
    match self.buf.last() {
      Some(t) => self.lexer.set_next(t.token.loc.1),
      None => self.lexer.set_next(0),
    };
  }

  fn forward<K: FnOnce(&Token) -> bool>(&mut self, mode: LexMode, keep: K) -> (bool, Token) {
    if self.buf.get(self.next_tok_i).is_some_and(|t| t.lex_mode != mode) {
      self.reset_to(self.next_tok_i);
    }
    if self.buf.len() == self.next_tok_i {
      let token = lex_next(&mut self.lexer, mode);
      self.buf.push(BufferedToken {
        token,
        lex_mode: mode,
      });
    }
    let t = self.buf[self.next_tok_i].token.clone();
    let k = keep(&t);
    if k {
      self.next_tok_i += 1;
    };
    (k, t)
  }

  pub fn consume_with_mode(&mut self, mode: LexMode) -> Token {
    self.forward(mode, |_| true).1
  }

  pub fn consume(&mut self) -> Token {
    self.consume_with_mode(LexMode::Standard)
  }

  pub fn peek_with_mode(&mut self, mode: LexMode) -> Token {
    self.forward(mode, |_| false).1
  }

  pub fn peek(&mut self) -> Token {
    self.peek_with_mode(LexMode::Standard)
  }

  pub fn peek_2(&mut self) -> (Token, Token) {
    let cp = self.next_tok_i;
    let a = self.forward(LexMode::Standard, |_| true);
    let b = self.forward(LexMode::Standard, |_| true);
    self.next_tok_i = cp;
    (a.1, b.1)
  }

  pub fn peek_3(&mut self) -> (Token, Token, Token) {
    let cp = self.next_tok_i;
    let a = self.forward(LexMode::Standard, |_| true);
    let b = self.forward(LexMode::Standard, |_| true);
    let c = self.forward(LexMode::Standard, |_| true);
    self.next_tok_i = cp;
    (a.1, b.1, c.1)
  }

  pub fn consume_if(&mut self, typ: TT) -> MaybeToken {
    let (matched, t) = self.forward(LexMode::Standard, |t| t.typ == typ);
    MaybeToken {
      typ,
      matched,
      loc: t.loc,
    }
  }

  pub fn require_with_mode(&mut self, typ: TT, mode: LexMode) -> SyntaxResult<Token> {
    let t = self.consume_with_mode(mode);
    if t.typ != typ {
      Err(t.error(SyntaxErrorType::RequiredTokenNotFound(typ)))
    } else {
      Ok(t)
    }
  }

  pub fn require_predicate<P: FnOnce(TT) -> bool>(
    &mut self,
    pred: P,
    expected: &'static str,
  ) -> SyntaxResult<Token> {
    let t = self.consume();
    if !pred(t.typ) {
      Err(t.error(SyntaxErrorType::ExpectedSyntax(expected)))
    } else {
      Ok(t)
    }
  }

  pub fn require(&mut self, typ: TT) -> SyntaxResult<Token> {
    self.require_with_mode(typ, LexMode::Standard)
  }

  /// Requires a `;`, or a position where automatic semicolon insertion applies. Returns whether ASI applied.
  pub fn require_semicolon(&mut self) -> SyntaxResult<bool> {
    let t = self.peek();
    match t.typ {
      TT::Semicolon => {
        self.consume();
        Ok(false)
      }
      TT::BraceClose | TT::EOF => Ok(true),
      _ if t.preceded_by_line_terminator => Ok(true),
      _ => Err(t.error(SyntaxErrorType::RequiredTokenNotFound(TT::Semicolon))),
    }
  }

  pub fn enter_scope(&mut self, typ: ScopeType) -> ScopeId {
    let id = ScopeId(self.scopes.len() as u32);
    self.scopes.push(Scope {
      parent: Some(self.scope),
      typ,
    });
    std::mem::replace(&mut self.scope, id)
  }

  pub fn exit_scope(&mut self, parent: ScopeId) {
    self.scope = parent;
  }

  /// Parses the contents of a function body, arrow function body, method or instance field initializer, whose
  /// evaluation is deferred until later.
  pub fn deferred<T>(&mut self, f: impl FnOnce(&mut Self) -> SyntaxResult<T>) -> SyntaxResult<T> {
    self.function_depth += 1;
    let res = self.jump_boundary(f)?;
    self.function_depth -= 1;
    Ok(res)
  }

  /// Runs `f` where no enclosing label, loop or `switch` is a valid `break` or `continue` target.
  pub fn jump_boundary<T>(&mut self, f: impl FnOnce(&mut Self) -> SyntaxResult<T>) -> SyntaxResult<T> {
    let outer = std::mem::take(&mut self.jumps);
    let res = f(self);
    self.jumps = outer;
    res
  }

  /// Runs `f` one nesting level deeper, failing once `MAX_NESTING_DEPTH` is reached.
  pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> SyntaxResult<T>) -> SyntaxResult<T> {
    if self.depth >= MAX_NESTING_DEPTH {
      return Err(self.peek().error(SyntaxErrorType::NestingTooDeep));
    };
    self.depth += 1;
    let res = f(self);
    self.depth -= 1;
    res
  }

  /// Parses the body of a loop, where `break` and `continue` without a label are allowed.
  pub fn loop_body<T>(&mut self, f: impl FnOnce(&mut Self) -> SyntaxResult<T>) -> SyntaxResult<T> {
    self.jumps.loops += 1;
    let res = f(self);
    self.jumps.loops -= 1;
    res
  }

  /// Parses the cases of a `switch`, where `break` without a label is allowed.
  pub fn switch_body<T>(&mut self, f: impl FnOnce(&mut Self) -> SyntaxResult<T>) -> SyntaxResult<T> {
    self.jumps.switches += 1;
    let res = f(self);
    self.jumps.switches -= 1;
    res
  }

  /// Parses a statement with the given labels, which `break` can target and `continue` can target if
  /// `is_loop`.
  pub fn labelled<T>(
    &mut self,
    labels: Vec<Token>,
    is_loop: bool,
    f: impl FnOnce(&mut Self) -> SyntaxResult<T>,
  ) -> SyntaxResult<T> {
    let outer = self.jumps.labels.len();
    for label in labels.iter() {
      let name = self.string(label.loc);
      if self.jumps.labels.iter().any(|(l, _)| *l == name) {
        self.jumps.labels.truncate(outer);
        return Err(label.error(SyntaxErrorType::DuplicateLabel));
      };
      self.jumps.labels.push((name, is_loop));
    }
    let res = f(self);
    self.jumps.labels.truncate(outer);
    res
  }

  /// Checks the target of a `break` or `continue` keyword `kw`, with an optional label.
  pub fn check_jump(&self, kw: &Token, label: Option<&Token>) -> SyntaxResult<()> {
    let is_continue = kw.typ == TT::KeywordContinue;
    let Some(label) = label else {
      if self.jumps.loops == 0 && (is_continue || self.jumps.switches == 0) {
        return Err(kw.error(SyntaxErrorType::JumpOutsideLoop));
      };
      return Ok(());
    };
    let name = self.str(label.loc);
    match self.jumps.labels.iter().rev().find(|(l, _)| l == name) {
      None => Err(label.error(SyntaxErrorType::UndefinedLabel)),
      Some((_, false)) if is_continue => Err(kw.error(SyntaxErrorType::JumpOutsideLoop)),
      Some(_) => Ok(()),
    }
  }

  pub fn mark_side_effect(&mut self) {
    if self.function_depth == 0 {
      self.side_effects = true;
    };
  }

  pub fn declare(&mut self, name: String, loc: Loc, kind: DeclKind, shorthand: bool) {
    self.declarations.push(Declaration {
      name,
      loc,
      scope: self.scope,
      kind,
      shorthand,
    });
  }

  pub fn reference(&mut self, name: String, loc: Loc, shorthand: bool) {
    self.references.push(Reference {
      name,
      loc,
      scope: self.scope,
      shorthand,
    });
  }
}
