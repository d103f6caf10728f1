use super::ParseCtx;
use super::Parser;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lit::normalize_identifier;
use crate::loc::Loc;
use crate::scope::DeclKind;
use crate::token::TT;

impl<'a> Parser<'a> {
  /// Parses a name that is being declared, returning the name and its location.
  pub fn binding_identifier(&mut self) -> SyntaxResult<(String, Loc)> {
    let t = self.peek();
    if !t.typ.is_identifier() {
      return Err(t.error(SyntaxErrorType::ExpectedSyntax("identifier")));
    };
    self.consume();
    Ok((normalize_identifier(self.str(t.loc)), t.loc))
  }

  /// Parses a binding pattern and declares every name in it in the current scope.
  pub fn pattern(&mut self, ctx: ParseCtx, kind: DeclKind) -> SyntaxResult<()> {
    self.nested(|p| p.unguarded_pattern(ctx, kind))
  }

  fn unguarded_pattern(&mut self, ctx: ParseCtx, kind: DeclKind) -> SyntaxResult<()> {
    let t = self.peek();
    match t.typ {
      TT::BracketOpen => self.array_pattern(ctx, kind),
      TT::BraceOpen => self.object_pattern(ctx, kind),
      typ if typ.is_identifier() => {
        let (name, loc) = self.binding_identifier()?;
        self.declare(name, loc, kind, false);
        Ok(())
      }
      TT::EOF => Err(t.error(SyntaxErrorType::UnexpectedEnd)),
      _ => Err(t.error(SyntaxErrorType::ExpectedSyntax("binding pattern"))),
    }
  }

  pub fn pattern_with_default(&mut self, ctx: ParseCtx, kind: DeclKind) -> SyntaxResult<()> {
    self.pattern(ctx, kind)?;
    if self.consume_if(TT::Equals).is_match() {
      self.assign_expr(ctx.with_in_allowed(true))?;
    };
    Ok(())
  }

  fn array_pattern(&mut self, ctx: ParseCtx, kind: DeclKind) -> SyntaxResult<()> {
    self.require(TT::BracketOpen)?;
    loop {
      if self.consume_if(TT::BracketClose).is_match() {
        break;
      };
      if self.consume_if(TT::Comma).is_match() {
        continue;
      };
      if self.consume_if(TT::DotDotDot).is_match() {
        self.pattern(ctx, kind)?;
        self.require(TT::BracketClose)?;
        break;
      };
      self.pattern_with_default(ctx, kind)?;
      if !self.consume_if(TT::Comma).is_match() {
        self.require(TT::BracketClose)?;
        break;
      };
    }
    Ok(())
  }

  fn object_pattern(&mut self, ctx: ParseCtx, kind: DeclKind) -> SyntaxResult<()> {
    self.require(TT::BraceOpen)?;
    self.list(TT::Comma, TT::BraceClose, |p| {
      if p.consume_if(TT::DotDotDot).is_match() {
        let (name, loc) = p.binding_identifier()?;
        p.declare(name, loc, kind, false);
        return Ok(());
      };
      let (key, next) = p.peek_2();
      if key.typ.is_identifier() && next.typ != TT::Colon {
        // `{ a }` and `{ a = 1 }` declare `a`, which is also the property name.
        let (name, loc) = p.binding_identifier()?;
        p.declare(name, loc, kind, true);
        if p.consume_if(TT::Equals).is_match() {
          p.assign_expr(ctx.with_in_allowed(true))?;
        };
        return Ok(());
      };
      p.property_key(ctx)?;
      p.require(TT::Colon)?;
      p.pattern_with_default(ctx, kind)
    })
  }
}
