use super::expr::Expr;
use super::func::Definition;
use super::func::DefinitionKind;
use super::ParseCtx;
use super::Parser;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::loc::Loc;
use crate::scope::DeclKind;
use crate::scope::ScopeType;
use crate::token::TT;

impl<'a> Parser<'a> {
  /// Parses `class [name] [extends expr] { members }`.
  ///
  /// Computed keys, `extends` and static members are evaluated when the class is defined; methods and
  /// instance fields are not.
  pub fn class(&mut self, ctx: ParseCtx, kind: DefinitionKind) -> SyntaxResult<Definition> {
    let kw = self.require(TT::KeywordClass)?;
    let name_insert_at = kw.loc.1;
    let name = self.definition_name(kind, DeclKind::Class)?;
    let parent = self.enter_scope(ScopeType::ExpressionName);
    if kind == DefinitionKind::Expression {
      if let Some((name, loc)) = &name {
        self.declare(name.clone(), *loc, DeclKind::Class, false);
      };
    };
    if self.consume_if(TT::KeywordExtends).is_match() {
      self.lhs_expr(ctx)?;
    };
    self.require(TT::BraceOpen)?;
    while !self.consume_if(TT::BraceClose).is_match() {
      self.class_member(ctx)?;
    }
    self.exit_scope(parent);
    Ok(Definition {
      loc: Loc(kw.loc.0, self.prev_end()),
      name: name.map(|(_, loc)| loc),
      name_insert_at,
    })
  }

  pub fn class_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let def = self.class(ctx, DefinitionKind::Expression)?;
    Ok(Expr::other(def.loc))
  }

  fn class_member(&mut self, ctx: ParseCtx) -> SyntaxResult<()> {
    if self.consume_if(TT::Semicolon).is_match() {
      return Ok(());
    };
    let (a, b) = self.peek_2();
    if a.typ == TT::EOF {
      return Err(a.error(SyntaxErrorType::UnexpectedEnd));
    };
    // `static` is the member's name when followed by one of these.
    let is_static = a.typ == TT::KeywordStatic
      && !matches!(
        b.typ,
        TT::ParenthesisOpen | TT::Equals | TT::Semicolon | TT::BraceClose | TT::EOF
      );
    if is_static {
      self.consume();
      if self.peek().typ == TT::BraceOpen {
        return self.static_block(ctx);
      };
    };

    let (is_async, is_generator, is_accessor) = self.method_modifiers();
    self.property_key(ctx)?;
    if self.peek().typ == TT::ParenthesisOpen {
      self.method(ctx, is_async, is_generator)?;
      return Ok(());
    };
    if is_async || is_generator || is_accessor {
      return Err(self.peek().error(SyntaxErrorType::RequiredTokenNotFound(TT::ParenthesisOpen)));
    };

    // Field.
    if self.consume_if(TT::Equals).is_match() {
      // Initializers are evaluated like the body of a method, with `this` bound to the class or the instance.
      let field_ctx = ctx.for_function(false, false);
      let parent = self.enter_scope(ScopeType::Function);
      if is_static {
        self.assign_expr(field_ctx)?;
      } else {
        self.deferred(|p| p.assign_expr(field_ctx))?;
      };
      self.exit_scope(parent);
    };
    self.require_semicolon()?;
    Ok(())
  }

  // `static { ... }` runs once when the class is defined, in its own function-like scope.
  fn static_block(&mut self, ctx: ParseCtx) -> SyntaxResult<()> {
    let parent = self.enter_scope(ScopeType::Function);
    let block_ctx = ctx.for_static_block();
    self.require(TT::BraceOpen)?;
    self.jump_boundary(|p| p.stmts(block_ctx, TT::BraceClose))?;
    self.require(TT::BraceClose)?;
    self.exit_scope(parent);
    Ok(())
  }
}
