use super::ParseCtx;
use super::Parser;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::LexMode;
use crate::lit::decode_string_literal;
use crate::lit::normalize_identifier;
use crate::loc::Loc;
use crate::module::DynamicImport;
use crate::module::ModuleRequest;
use crate::operator::Associativity;
use crate::operator::BINARY_OPERATORS;
use crate::scope::DeclKind;
use crate::scope::ScopeType;
use crate::token::TT;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExprKind {
  Identifier,
  Member,
  Call,
  ArrayLiteral,
  ObjectLiteral,
  Other,
}

/// What the rest of the parser needs to know about an expression it has just parsed.
#[derive(Clone, Copy, Debug)]
pub struct Expr {
  pub loc: Loc,
  pub kind: ExprKind,
}

impl Expr {
  pub fn new(loc: Loc, kind: ExprKind) -> Expr {
    Expr { loc, kind }
  }

  pub fn other(loc: Loc) -> Expr {
    Expr::new(loc, ExprKind::Other)
  }

  pub fn is_assignment_target(&self) -> bool {
    matches!(
      self.kind,
      ExprKind::Identifier | ExprKind::Member | ExprKind::ArrayLiteral | ExprKind::ObjectLiteral
    )
  }
}

/// A property name in an object literal, object pattern or class body.
#[derive(Clone, Copy, Debug)]
pub struct PropertyKey {
  pub loc: Loc,
  pub typ: TT,
}

impl PropertyKey {
  // A key that could also be a shorthand property referencing a variable of the same name.
  pub fn is_identifier(&self) -> bool {
    self.typ.is_identifier()
  }
}

// Tokens that end an expression. Used after `yield`, whose operand is optional.
fn ends_expression(typ: TT) -> bool {
  matches!(
    typ,
    TT::ParenthesisClose
      | TT::BracketClose
      | TT::BraceClose
      | TT::Comma
      | TT::Semicolon
      | TT::Colon
      | TT::EOF
      | TT::KeywordIn
      | TT::KeywordOf
  )
}

// Whether a token after `get`, `set` or `async` in a class or object body means the keyword is a modifier
// rather than the property name itself.
pub fn is_property_key_start(typ: TT) -> bool {
  typ.is_identifier_name()
    || matches!(
      typ,
      TT::LiteralString
        | TT::LiteralNumber
        | TT::LiteralBigInt
        | TT::BracketOpen
        | TT::PrivateMember
        | TT::Asterisk
    )
}

impl<'a> Parser<'a> {
  /// Parses an `Expression`, which includes the comma operator.
  pub fn expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let mut expr = self.assign_expr(ctx)?;
    while self.consume_if(TT::Comma).is_match() {
      let next = self.assign_expr(ctx)?;
      expr = Expr::other(expr.loc + next.loc);
    }
    Ok(expr)
  }

  /// Parses an `AssignmentExpression`: arrow functions, `yield`, assignments and everything of higher precedence.
  pub fn assign_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    self.nested(|p| p.unguarded_assign_expr(ctx))
  }

  fn unguarded_assign_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let t = self.peek_with_mode(LexMode::SlashIsRegex);
    if t.typ == TT::KeywordYield && ctx.yield_allowed {
      return self.yield_expr(ctx);
    };
    if t.typ == TT::ParenthesisOpen
      || t.typ == TT::KeywordAsync
      || (t.typ.is_identifier() && self.peek_2().1.typ == TT::EqualsChevronRight)
    {
      if let Some(arrow) = self.arrow_func(ctx)? {
        return Ok(arrow);
      };
    };

    let lhs = self.conditional_expr(ctx)?;
    let op = self.peek();
    if !op.typ.is_assignment_operator() {
      return Ok(lhs);
    };
    if !lhs.is_assignment_target() {
      return Err(lhs.loc.error(
        SyntaxErrorType::ExpectedSyntax("assignment target"),
        Some(op.typ),
      ));
    };
    self.consume();
    self.mark_side_effect();
    let rhs = self.assign_expr(ctx)?;
    Ok(Expr::other(lhs.loc + rhs.loc))
  }

  fn yield_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let kw = self.consume();
    self.mark_side_effect();
    let next = self.peek();
    let delegate = !next.preceded_by_line_terminator && self.consume_if(TT::Asterisk).is_match();
    let operand = self.peek_with_mode(LexMode::SlashIsRegex);
    if delegate || (!operand.preceded_by_line_terminator && !ends_expression(operand.typ)) {
      let value = self.assign_expr(ctx)?;
      return Ok(Expr::other(kw.loc + value.loc));
    };
    Ok(Expr::other(kw.loc))
  }

  /// Tries to parse an arrow function. Only the parameters are speculative: once `=>` has been seen, errors
  /// in the body are real errors.
  fn arrow_func(&mut self, ctx: ParseCtx) -> SyntaxResult<Option<Expr>> {
    let start = self.peek().loc.0;
    let head = self.rewindable(|p| {
      let (a, b) = p.peek_2();
      let is_async = a.typ == TT::KeywordAsync
        && b.typ != TT::EqualsChevronRight
        && !b.preceded_by_line_terminator;
      if is_async {
        p.consume();
      };
      let parent = p.enter_scope(ScopeType::Function);
      let fn_ctx = ctx.for_function(is_async, false);
      let first = p.peek();
      if first.typ.is_identifier() {
        p.consume();
        p.declare(
          normalize_identifier(p.str(first.loc)),
          first.loc,
          DeclKind::Param,
          false,
        );
      } else if first.typ != TT::ParenthesisOpen || p.func_params(fn_ctx).is_err() {
        return Ok(None);
      };
      let arrow = p.peek();
      if arrow.typ != TT::EqualsChevronRight {
        return Ok(None);
      };
      p.consume();
      if arrow.preceded_by_line_terminator {
        // Illegal under Automatic Semicolon Insertion rules.
        return Err(arrow.error(SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters));
      };
      Ok(Some((is_async, parent)))
    })?;
    let Some((is_async, parent)) = head else {
      return Ok(None);
    };
    let fn_ctx = ctx.for_function(is_async, false);
    let end = self.deferred(|p| {
      if p.peek().typ == TT::BraceOpen {
        p.func_body(fn_ctx)
      } else {
        Ok(p.assign_expr(fn_ctx.with_in_allowed(ctx.in_allowed))?.loc.1)
      }
    })?;
    self.exit_scope(parent);
    Ok(Some(Expr::other(Loc(start, end))))
  }

  fn conditional_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let test = self.binary_expr(ctx, 0)?;
    if !self.consume_if(TT::Question).is_match() {
      return Ok(test);
    };
    self.assign_expr(ctx.with_in_allowed(true))?;
    self.require(TT::Colon)?;
    let alternate = self.assign_expr(ctx)?;
    Ok(Expr::other(test.loc + alternate.loc))
  }

  fn binary_expr(&mut self, ctx: ParseCtx, min_prec: u8) -> SyntaxResult<Expr> {
    let mut left = self.unary_expr(ctx)?;
    loop {
      let t = self.peek();
      if t.typ == TT::KeywordIn && !ctx.in_allowed {
        break;
      };
      let Some(op) = BINARY_OPERATORS.get(&t.typ) else {
        break;
      };
      if op.precedence < min_prec {
        break;
      };
      self.consume();
      let next_min_prec = match op.associativity {
        Associativity::Left => op.precedence + 1,
        Associativity::Right => op.precedence,
      };
      let right = self.binary_expr(ctx, next_min_prec)?;
      left = Expr::other(left.loc + right.loc);
    }
    Ok(left)
  }

  fn unary_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    self.nested(|p| p.unguarded_unary_expr(ctx))
  }

  fn unguarded_unary_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let t = self.peek_with_mode(LexMode::SlashIsRegex);
    match t.typ {
      TT::KeywordDelete | TT::PlusPlus | TT::HyphenHyphen => {
        self.consume_with_mode(LexMode::SlashIsRegex);
        self.mark_side_effect();
        let operand = self.unary_expr(ctx)?;
        Ok(Expr::other(t.loc + operand.loc))
      }
      TT::KeywordAwait if ctx.await_allowed => {
        self.consume_with_mode(LexMode::SlashIsRegex);
        self.mark_side_effect();
        let operand = self.unary_expr(ctx)?;
        Ok(Expr::other(t.loc + operand.loc))
      }
      TT::KeywordVoid
      | TT::KeywordTypeof
      | TT::Plus
      | TT::Hyphen
      | TT::Tilde
      | TT::Exclamation => {
        self.consume_with_mode(LexMode::SlashIsRegex);
        let operand = self.unary_expr(ctx)?;
        Ok(Expr::other(t.loc + operand.loc))
      }
      _ => {
        let operand = self.lhs_expr(ctx)?;
        let postfix = self.peek();
        if matches!(postfix.typ, TT::PlusPlus | TT::HyphenHyphen) && !postfix.preceded_by_line_terminator {
          self.consume();
          self.mark_side_effect();
          return Ok(Expr::other(operand.loc + postfix.loc));
        };
        Ok(operand)
      }
    }
  }

  /// Parses a `LeftHandSideExpression`: `new`, calls and member accesses.
  pub fn lhs_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    self.nested(|p| p.unguarded_lhs_expr(ctx))
  }

  fn unguarded_lhs_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let t = self.peek_with_mode(LexMode::SlashIsRegex);
    let expr = match t.typ {
      TT::KeywordNew => self.new_expr(ctx)?,
      TT::KeywordSuper => {
        self.consume_with_mode(LexMode::SlashIsRegex);
        Expr::other(t.loc)
      }
      TT::KeywordImport => self.import_expr(ctx)?,
      _ => self.primary_expr(ctx)?,
    };
    self.call_chain(ctx, expr, true)
  }

  fn call_chain(&mut self, ctx: ParseCtx, mut expr: Expr, calls_allowed: bool) -> SyntaxResult<Expr> {
    loop {
      let t = self.peek();
      match t.typ {
        TT::Dot => {
          self.consume();
          let name = self.require_predicate(
            |typ| typ.is_identifier_name() || typ == TT::PrivateMember,
            "property name",
          )?;
          expr = Expr::new(expr.loc + name.loc, ExprKind::Member);
        }
        TT::QuestionDot if calls_allowed => {
          self.consume();
          let next = self.peek();
          expr = match next.typ {
            TT::ParenthesisOpen => {
              let end = self.call_args(ctx)?;
              self.mark_side_effect();
              Expr::new(Loc(expr.loc.0, end), ExprKind::Call)
            }
            TT::BracketOpen => {
              self.consume();
              self.expr(ctx.with_in_allowed(true))?;
              let close = self.require(TT::BracketClose)?;
              Expr::new(expr.loc + close.loc, ExprKind::Member)
            }
            _ => {
              let name = self.require_predicate(
                |typ| typ.is_identifier_name() || typ == TT::PrivateMember,
                "property name",
              )?;
              Expr::new(expr.loc + name.loc, ExprKind::Member)
            }
          };
        }
        TT::BracketOpen => {
          self.consume();
          self.expr(ctx.with_in_allowed(true))?;
          let close = self.require(TT::BracketClose)?;
          expr = Expr::new(expr.loc + close.loc, ExprKind::Member);
        }
        TT::ParenthesisOpen if calls_allowed => {
          let end = self.call_args(ctx)?;
          self.mark_side_effect();
          expr = Expr::new(Loc(expr.loc.0, end), ExprKind::Call);
        }
        TT::LiteralTemplatePartString | TT::LiteralTemplatePartStringEnd => {
          // Tagged template.
          let end = self.template(ctx)?;
          self.mark_side_effect();
          expr = Expr::new(Loc(expr.loc.0, end), ExprKind::Call);
        }
        _ => break,
      };
    }
    Ok(expr)
  }

  /// Parses `(args)` and returns the end of the closing parenthesis.
  pub fn call_args(&mut self, ctx: ParseCtx) -> SyntaxResult<usize> {
    self.require(TT::ParenthesisOpen)?;
    self.list(TT::Comma, TT::ParenthesisClose, |p| {
      let _ = p.consume_if(TT::DotDotDot);
      p.assign_expr(ctx.with_in_allowed(true))?;
      Ok(())
    })?;
    Ok(self.prev_end())
  }

  fn new_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let new = self.consume_with_mode(LexMode::SlashIsRegex);
    if self.consume_if(TT::Dot).is_match() {
      let target = self.require(TT::Identifier)?;
      if self.str(target.loc) != "target" {
        return Err(target.error(SyntaxErrorType::ExpectedSyntax("`new.target`")));
      };
      return Ok(Expr::new(new.loc + target.loc, ExprKind::Member));
    };
    self.mark_side_effect();
    let t = self.peek_with_mode(LexMode::SlashIsRegex);
    let callee = match t.typ {
      TT::KeywordNew => self.nested(|p| p.new_expr(ctx))?,
      _ => self.primary_expr(ctx)?,
    };
    let callee = self.call_chain(ctx, callee, false)?;
    let end = if self.peek().typ == TT::ParenthesisOpen {
      self.call_args(ctx)?
    } else {
      callee.loc.1
    };
    Ok(Expr::new(Loc(new.loc.0, end), ExprKind::Call))
  }

  /// Parses `import.meta` or a dynamic `import(...)` call. Calls with a single string literal argument are recorded.
  fn import_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let kw = self.consume_with_mode(LexMode::SlashIsRegex);
    if self.consume_if(TT::Dot).is_match() {
      let meta = self.require(TT::Identifier)?;
      if self.str(meta.loc) != "meta" {
        return Err(meta.error(SyntaxErrorType::ExpectedSyntax("`import.meta`")));
      };
      return Ok(Expr::new(kw.loc + meta.loc, ExprKind::Member));
    };
    self.require(TT::ParenthesisOpen)?;
    self.mark_side_effect();
    let first = self.peek_with_mode(LexMode::SlashIsRegex);
    let arg = self.assign_expr(ctx.with_in_allowed(true))?;
    // Import options, like `import(x, { with: { type: "json" } })`.
    if self.consume_if(TT::Comma).is_match() && self.peek().typ != TT::ParenthesisClose {
      self.assign_expr(ctx.with_in_allowed(true))?;
      let _ = self.consume_if(TT::Comma);
    };
    let close = self.require(TT::ParenthesisClose)?;
    let loc = kw.loc + close.loc;
    if first.typ == TT::LiteralString && first.loc == arg.loc {
      if let Some(specifier) = decode_string_literal(self.str(arg.loc)) {
        self.dynamic_imports.push(DynamicImport {
          request: ModuleRequest {
            specifier,
            loc: arg.loc,
          },
          loc,
          scope: self.scope,
        });
      };
    };
    Ok(Expr::new(loc, ExprKind::Call))
  }

  fn primary_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let t = self.peek_with_mode(LexMode::SlashIsRegex);
    match t.typ {
      TT::KeywordAsync
        if {
          let (_, next) = self.peek_2();
          next.typ == TT::KeywordFunction && !next.preceded_by_line_terminator
        } =>
      {
        self.func_expr(ctx)
      }
      typ if typ.is_identifier() => {
        self.consume_with_mode(LexMode::SlashIsRegex);
        self.reference(normalize_identifier(self.str(t.loc)), t.loc, false);
        Ok(Expr::new(t.loc, ExprKind::Identifier))
      }
      TT::KeywordThis
      | TT::LiteralBigInt
      | TT::LiteralFalse
      | TT::LiteralNull
      | TT::LiteralNumber
      | TT::LiteralRegex
      | TT::LiteralString
      | TT::LiteralTrue => {
        self.consume_with_mode(LexMode::SlashIsRegex);
        Ok(Expr::other(t.loc))
      }
      TT::LiteralTemplatePartString | TT::LiteralTemplatePartStringEnd => {
        let end = self.template(ctx)?;
        Ok(Expr::other(Loc(t.loc.0, end)))
      }
      TT::ParenthesisOpen => {
        self.consume_with_mode(LexMode::SlashIsRegex);
        let inner = self.expr(ctx.with_in_allowed(true))?;
        let close = self.require(TT::ParenthesisClose)?;
        // `(a) = 1` and `(a.b) = 1` are valid assignments, but `({ a }) = 1` is not.
        let kind = match inner.kind {
          ExprKind::Identifier | ExprKind::Member => inner.kind,
          _ => ExprKind::Other,
        };
        Ok(Expr::new(t.loc + close.loc, kind))
      }
      TT::BracketOpen => self.array_literal(ctx),
      TT::BraceOpen => self.object_literal(ctx),
      TT::KeywordFunction => self.func_expr(ctx),
      TT::KeywordClass => self.class_expr(ctx),
      // `#x in obj`.
      TT::PrivateMember => {
        self.consume_with_mode(LexMode::SlashIsRegex);
        if self.peek().typ != TT::KeywordIn {
          return Err(t.error(SyntaxErrorType::ExpectedSyntax("expression")));
        };
        Ok(Expr::other(t.loc))
      }
      TT::Invalid => Err(t.error(SyntaxErrorType::InvalidToken)),
      TT::EOF => Err(t.error(SyntaxErrorType::UnexpectedEnd)),
      _ => Err(t.error(SyntaxErrorType::ExpectedSyntax("expression"))),
    }
  }

  /// Parses a template literal starting at the current token and returns its end.
  pub fn template(&mut self, ctx: ParseCtx) -> SyntaxResult<usize> {
    let mut t = self.consume();
    loop {
      match t.typ {
        TT::LiteralTemplatePartStringEnd => return Ok(t.loc.1),
        TT::LiteralTemplatePartString => {
          self.expr(ctx.with_in_allowed(true))?;
          self.require(TT::BraceClose)?;
          t = self.consume_with_mode(LexMode::TemplateStrContinue);
        }
        TT::Invalid | TT::EOF => return Err(t.error(SyntaxErrorType::InvalidToken)),
        _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("template"))),
      };
    }
  }

  fn array_literal(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let open = self.require_with_mode(TT::BracketOpen, LexMode::SlashIsRegex)?;
    loop {
      if self.consume_if(TT::BracketClose).is_match() {
        break;
      };
      // Hole.
      if self.consume_if(TT::Comma).is_match() {
        continue;
      };
      let _ = self.consume_if(TT::DotDotDot);
      self.assign_expr(ctx.with_in_allowed(true))?;
      if !self.consume_if(TT::Comma).is_match() {
        self.require(TT::BracketClose)?;
        break;
      };
    }
    Ok(Expr::new(Loc(open.loc.0, self.prev_end()), ExprKind::ArrayLiteral))
  }

  fn object_literal(&mut self, ctx: ParseCtx) -> SyntaxResult<Expr> {
    let open = self.require_with_mode(TT::BraceOpen, LexMode::SlashIsRegex)?;
    let ctx = ctx.with_in_allowed(true);
    self.list(TT::Comma, TT::BraceClose, |p| p.object_member(ctx))?;
    Ok(Expr::new(Loc(open.loc.0, self.prev_end()), ExprKind::ObjectLiteral))
  }

  fn object_member(&mut self, ctx: ParseCtx) -> SyntaxResult<()> {
    if self.consume_if(TT::DotDotDot).is_match() {
      self.assign_expr(ctx)?;
      return Ok(());
    };
    let (is_async, is_generator, is_accessor) = self.method_modifiers();
    let key = self.property_key(ctx)?;
    if self.peek().typ == TT::ParenthesisOpen {
      self.method(ctx, is_async, is_generator)?;
      return Ok(());
    };
    if is_async || is_generator || is_accessor {
      return Err(self.peek().error(SyntaxErrorType::RequiredTokenNotFound(TT::ParenthesisOpen)));
    };
    if self.consume_if(TT::Colon).is_match() {
      self.assign_expr(ctx)?;
      return Ok(());
    };
    if !key.is_identifier() {
      return Err(self.peek().error(SyntaxErrorType::RequiredTokenNotFound(TT::Colon)));
    };
    self.reference(normalize_identifier(self.str(key.loc)), key.loc, true);
    // `{ a = 1 }` is only valid as a destructuring assignment target, which we don't distinguish.
    if self.consume_if(TT::Equals).is_match() {
      self.assign_expr(ctx)?;
    };
    Ok(())
  }

  /// Consumes `async`, `get`, `set` and `*` prefixes of a method. Returns (async, generator, accessor).
  pub fn method_modifiers(&mut self) -> (bool, bool, bool) {
    let mut is_async = false;
    let mut is_accessor = false;
    let (a, b) = self.peek_2();
    if is_property_key_start(b.typ) {
      match a.typ {
        TT::KeywordAsync if !b.preceded_by_line_terminator => {
          self.consume();
          is_async = true;
        }
        TT::KeywordGet | TT::KeywordSet if b.typ != TT::Asterisk => {
          self.consume();
          is_accessor = true;
        }
        _ => {}
      };
    };
    let is_generator = self.consume_if(TT::Asterisk).is_match();
    (is_async, is_generator, is_accessor)
  }

  pub fn property_key(&mut self, ctx: ParseCtx) -> SyntaxResult<PropertyKey> {
    let t = self.consume();
    match t.typ {
      TT::BracketOpen => {
        self.assign_expr(ctx.with_in_allowed(true))?;
        let close = self.require(TT::BracketClose)?;
        Ok(PropertyKey {
          loc: t.loc + close.loc,
          typ: TT::BracketOpen,
        })
      }
      TT::LiteralString | TT::LiteralNumber | TT::LiteralBigInt | TT::PrivateMember => Ok(PropertyKey {
        loc: t.loc,
        typ: t.typ,
      }),
      typ if typ.is_identifier_name() => Ok(PropertyKey { loc: t.loc, typ }),
      _ => Err(t.error(SyntaxErrorType::ExpectedSyntax("property name"))),
    }
  }
}
