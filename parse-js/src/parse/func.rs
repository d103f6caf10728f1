use super::expr::Expr;
use super::ParseCtx;
use super::Parser;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lit::normalize_identifier;
use crate::loc::Loc;
use crate::scope::DeclKind;
use crate::scope::ScopeType;
use crate::token::TT;

/// Where a function or class is being parsed, which decides whether it needs a name and where that name is
/// declared.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DefinitionKind {
  // The name is required and declared in the enclosing scope.
  Declaration,
  // `export default function () {}`: like a declaration, but the name is optional.
  DefaultExport,
  // The optional name is only visible inside the definition itself.
  Expression,
}

#[derive(Clone, Copy, Debug)]
pub struct Definition {
  pub loc: Loc,
  // Location of the name, if any.
  pub name: Option<Loc>,
  // Where a name can be inserted if there is none, which is right after `function`, `function*` or `class`.
  pub name_insert_at: usize,
}

impl<'a> Parser<'a> {
  // Parses the optional name following `function` or `class`, declaring it in the enclosing scope if needed.
  pub(super) fn definition_name(
    &mut self,
    kind: DefinitionKind,
    decl_kind: DeclKind,
  ) -> SyntaxResult<Option<(String, Loc)>> {
    let t = self.peek();
    if !t.typ.is_identifier() {
      if kind == DefinitionKind::Declaration {
        return Err(t.error(SyntaxErrorType::ExpectedSyntax("name")));
      };
      return Ok(None);
    };
    self.consume();
    let name = normalize_identifier(self.str(t.loc));
    if kind != DefinitionKind::Expression {
      self.declare(name.clone(), t.loc, decl_kind, false);
    };
    Ok(Some((name, t.loc)))
  }

  /// Parses `[async] function [*] [name] (params) { body }`.
  pub fn function(&mut self, ctx: ParseCtx, kind: DefinitionKind) -> SyntaxResult<Definition> {
    let start = self.peek().loc.0;
    let is_async = self.consume_if(TT::KeywordAsync).is_match();
    self.require(TT::KeywordFunction)?;
    let is_generator = self.consume_if(TT::Asterisk).is_match();
    let name_insert_at = self.prev_end();
    let name = self.definition_name(kind, DeclKind::Function)?;
    let parent = self.enter_scope(ScopeType::ExpressionName);
    if kind == DefinitionKind::Expression {
      if let Some((name, loc)) = &name {
        self.declare(name.clone(), *loc, DeclKind::Function, false);
      };
    };
    self.enter_scope(ScopeType::Function);
    let fn_ctx = ctx.for_function(is_async, is_generator);
    let end = self.deferred(|p| {
      p.func_params(fn_ctx)?;
      p.func_body(fn_ctx)
    })?;
    self.exit_scope(parent);
    Ok(Definition {
      loc: Loc(start, end),
      name: name.map(|(_, loc)| loc),
      name_insert_at,
    })
  }

  pub fn func_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let def = self.function(ctx, DefinitionKind::Expression)?;
    Ok(Expr::other(def.loc))
  }

  /// Parses `(params)`, declaring every parameter in the current scope.
  pub fn func_params(&mut self, ctx: ParseCtx) -> SyntaxResult<()> {
    self.require(TT::ParenthesisOpen)?;
    self.list(TT::Comma, TT::ParenthesisClose, |p| {
      if p.consume_if(TT::DotDotDot).is_match() {
        p.pattern(ctx, DeclKind::Param)
      } else {
        p.pattern_with_default(ctx, DeclKind::Param)
      }
    })
  }

  /// Parses `{ statements }` in the current scope and returns the end of the closing brace.
  pub fn func_body(&mut self, ctx: ParseCtx) -> SyntaxResult<usize> {
    self.require(TT::BraceOpen)?;
    self.stmts(ctx, TT::BraceClose)?;
    let close = self.require(TT::BraceClose)?;
    Ok(close.loc.1)
  }

  /// Parses the parameters and body of an object or class method, after its key.
  pub fn method(&mut self, ctx: ParseCtx, is_async: bool, is_generator: bool) -> SyntaxResult<usize> {
    let parent = self.enter_scope(ScopeType::Function);
    let fn_ctx = ctx.for_function(is_async, is_generator);
    let end = self.deferred(|p| {
      p.func_params(fn_ctx)?;
      p.func_body(fn_ctx)
    })?;
    self.exit_scope(parent);
    Ok(end)
  }
}
