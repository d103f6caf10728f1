use super::func::DefinitionKind;
use super::ParseCtx;
use super::Parser;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::LexMode;
use crate::scope::DeclKind;
use crate::scope::ScopeType;
use crate::token::TT;

impl<'a> Parser<'a> {
  /// Whether the next tokens start a function, class or variable declaration.
  pub fn at_declaration(&mut self) -> bool {
    let (a, b) = self.peek_2();
    match a.typ {
      TT::KeywordVar | TT::KeywordLet | TT::KeywordConst | TT::KeywordFunction | TT::KeywordClass => true,
      TT::KeywordAsync => b.typ == TT::KeywordFunction && !b.preceded_by_line_terminator,
      _ => false,
    }
  }

  /// Parses statements until `end`, which is not consumed.
  pub fn stmts(&mut self, ctx: ParseCtx, end: TT) -> SyntaxResult<()> {
    loop {
      let t = self.peek();
      if t.typ == end {
        break;
      };
      if t.typ == TT::EOF {
        return Err(t.error(SyntaxErrorType::UnexpectedEnd));
      };
      self.stmt(ctx)?;
    }
    Ok(())
  }

  /// Parses a statement or declaration. Returns whether it was terminated by automatic semicolon insertion,
  /// directly or through its last nested statement.
  pub fn stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<bool> {
    self.nested(|p| p.unguarded_stmt(ctx))
  }

  fn unguarded_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<bool> {
    let t = self.peek_with_mode(LexMode::SlashIsRegex);
    match t.typ {
      TT::BraceOpen => {
        self.block(ctx)?;
        Ok(false)
      }
      TT::Semicolon => {
        self.consume();
        Ok(false)
      }
      TT::KeywordVar => self.var_stmt(ctx, DeclKind::Var),
      TT::KeywordLet => self.var_stmt(ctx, DeclKind::Let),
      TT::KeywordConst => self.var_stmt(ctx, DeclKind::Const),
      TT::KeywordFunction => {
        self.function(ctx, DefinitionKind::Declaration)?;
        Ok(false)
      }
      TT::KeywordAsync if self.at_declaration() => {
        self.function(ctx, DefinitionKind::Declaration)?;
        Ok(false)
      }
      TT::KeywordClass => {
        self.class(ctx, DefinitionKind::Declaration)?;
        Ok(false)
      }
      TT::KeywordIf => self.if_stmt(ctx),
      TT::KeywordFor => self.for_stmt(ctx),
      TT::KeywordWhile => {
        self.consume();
        self.paren_expr(ctx)?;
        self.loop_body(|p| p.stmt(ctx))
      }
      TT::KeywordDo => self.do_while_stmt(ctx),
      TT::KeywordReturn => {
        let kw = self.consume();
        if !ctx.return_allowed {
          return Err(kw.error(SyntaxErrorType::ReturnOutsideFunction));
        };
        let next = self.peek_with_mode(LexMode::SlashIsRegex);
        if !next.preceded_by_line_terminator
          && !matches!(next.typ, TT::Semicolon | TT::BraceClose | TT::EOF)
        {
          self.expr(ctx)?;
        };
        self.require_semicolon()
      }
      TT::KeywordBreak | TT::KeywordContinue => {
        let kw = self.consume();
        let label = self.peek();
        let label = if label.typ.is_identifier() && !label.preceded_by_line_terminator {
          self.consume();
          Some(label)
        } else {
          None
        };
        self.check_jump(&kw, label.as_ref())?;
        self.require_semicolon()
      }
      TT::KeywordThrow => {
        self.consume();
        let value = self.peek_with_mode(LexMode::SlashIsRegex);
        if value.preceded_by_line_terminator {
          return Err(value.error(SyntaxErrorType::LineTerminatorAfterThrow));
        };
        self.expr(ctx)?;
        self.require_semicolon()
      }
      TT::KeywordTry => self.try_stmt(ctx),
      TT::KeywordSwitch => self.switch_stmt(ctx),
      TT::KeywordDebugger => {
        self.consume();
        self.require_semicolon()
      }
      TT::KeywordWith => Err(t.error(SyntaxErrorType::ExpectedSyntax(
        "statement other than `with`, which is not allowed in modules",
      ))),
      TT::KeywordImport => {
        let (_, next) = self.peek_2();
        if !matches!(next.typ, TT::ParenthesisOpen | TT::Dot) {
          return Err(t.error(SyntaxErrorType::ModuleSyntaxNotAtTopLevel));
        };
        self.expr_stmt(ctx)
      }
      TT::KeywordExport => Err(t.error(SyntaxErrorType::ModuleSyntaxNotAtTopLevel)),
      typ if typ.is_identifier() && self.peek_2().1.typ == TT::Colon => {
        let mut labels = Vec::new();
        loop {
          let (label, colon) = self.peek_2();
          if !label.typ.is_identifier() || colon.typ != TT::Colon {
            break;
          };
          self.consume();
          self.consume();
          labels.push(label);
        }
        let is_loop = matches!(
          self.peek().typ,
          TT::KeywordFor | TT::KeywordWhile | TT::KeywordDo
        );
        self.labelled(labels, is_loop, |p| p.stmt(ctx))
      }
      _ => self.expr_stmt(ctx),
    }
  }

  fn expr_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<bool> {
    self.expr(ctx)?;
    self.require_semicolon()
  }

  /// Parses `{ statements }` in a new block scope and returns the end of the closing brace.
  pub fn block(&mut self, ctx: ParseCtx) -> SyntaxResult<usize> {
    self.require(TT::BraceOpen)?;
    let parent = self.enter_scope(ScopeType::Block);
    self.stmts(ctx, TT::BraceClose)?;
    let close = self.require(TT::BraceClose)?;
    self.exit_scope(parent);
    Ok(close.loc.1)
  }

  fn paren_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<()> {
    self.require(TT::ParenthesisOpen)?;
    self.expr(ctx.with_in_allowed(true))?;
    self.require(TT::ParenthesisClose)?;
    Ok(())
  }

  /// Parses the declarators after `var`, `let` or `const`, without the terminating semicolon. In the head of a
  /// `for` statement, a declarator without an initializer may instead be followed by `of` or `in`.
  pub fn var_decl(&mut self, ctx: ParseCtx, kind: DeclKind, for_head: bool) -> SyntaxResult<()> {
    self.consume();
    loop {
      self.pattern(ctx, kind)?;
      if self.consume_if(TT::Equals).is_match() {
        self.assign_expr(ctx)?;
      } else if kind == DeclKind::Const {
        let next = self.peek();
        if !(for_head && matches!(next.typ, TT::KeywordOf | TT::KeywordIn)) {
          return Err(next.error(SyntaxErrorType::MissingConstInitializer));
        };
      };
      if !self.consume_if(TT::Comma).is_match() {
        break;
      };
    }
    Ok(())
  }

  fn var_stmt(&mut self, ctx: ParseCtx, kind: DeclKind) -> SyntaxResult<bool> {
    self.var_decl(ctx, kind, false)?;
    self.require_semicolon()
  }

  fn if_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<bool> {
    self.consume();
    self.paren_expr(ctx)?;
    let asi = self.stmt(ctx)?;
    if self.consume_if(TT::KeywordElse).is_match() {
      return self.stmt(ctx);
    };
    Ok(asi)
  }

  fn for_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<bool> {
    self.consume();
    if ctx.await_allowed {
      let _ = self.consume_if(TT::KeywordAwait);
    };
    self.require(TT::ParenthesisOpen)?;
    let parent = self.enter_scope(ScopeType::Block);
    let head_ctx = ctx.with_in_allowed(false);
    let init = self.peek_with_mode(LexMode::SlashIsRegex);
    match init.typ {
      TT::Semicolon => {}
      TT::KeywordVar => self.var_decl(head_ctx, DeclKind::Var, true)?,
      TT::KeywordLet => self.var_decl(head_ctx, DeclKind::Let, true)?,
      TT::KeywordConst => self.var_decl(head_ctx, DeclKind::Const, true)?,
      _ => {
        self.expr(head_ctx)?;
      }
    };
    if self.consume_if(TT::KeywordOf).is_match() {
      self.assign_expr(ctx.with_in_allowed(true))?;
    } else if self.consume_if(TT::KeywordIn).is_match() {
      self.expr(ctx.with_in_allowed(true))?;
    } else {
      self.require(TT::Semicolon)?;
      if self.peek_with_mode(LexMode::SlashIsRegex).typ != TT::Semicolon {
        self.expr(ctx.with_in_allowed(true))?;
      };
      self.require(TT::Semicolon)?;
      if self.peek_with_mode(LexMode::SlashIsRegex).typ != TT::ParenthesisClose {
        self.expr(ctx.with_in_allowed(true))?;
      };
    };
    self.require(TT::ParenthesisClose)?;
    let asi = self.loop_body(|p| p.stmt(ctx))?;
    self.exit_scope(parent);
    Ok(asi)
  }

  fn do_while_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<bool> {
    self.consume();
    self.loop_body(|p| p.stmt(ctx))?;
    self.require(TT::KeywordWhile)?;
    self.paren_expr(ctx)?;
    // A semicolon is always inserted after `do ... while (...)`, even on the same line.
    Ok(!self.consume_if(TT::Semicolon).is_match())
  }

  fn try_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<bool> {
    let kw = self.consume();
    self.block(ctx)?;
    let mut handled = false;
    if self.consume_if(TT::KeywordCatch).is_match() {
      handled = true;
      let parent = self.enter_scope(ScopeType::Block);
      if self.consume_if(TT::ParenthesisOpen).is_match() {
        self.pattern(ctx, DeclKind::CatchParam)?;
        self.require(TT::ParenthesisClose)?;
      };
      self.block(ctx)?;
      self.exit_scope(parent);
    };
    if self.consume_if(TT::KeywordFinally).is_match() {
      handled = true;
      self.block(ctx)?;
    };
    if !handled {
      return Err(kw.error(SyntaxErrorType::TryStatementHasNoCatchOrFinally));
    };
    Ok(false)
  }

  fn switch_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<bool> {
    self.consume();
    self.paren_expr(ctx)?;
    self.require(TT::BraceOpen)?;
    let parent = self.enter_scope(ScopeType::Block);
    self.switch_body(|p| p.switch_cases(ctx))?;
    self.exit_scope(parent);
    Ok(false)
  }

  fn switch_cases(&mut self, ctx: ParseCtx) -> SyntaxResult<()> {
    while !self.consume_if(TT::BraceClose).is_match() {
      let t = self.consume();
      match t.typ {
        TT::KeywordCase => {
          self.expr(ctx.with_in_allowed(true))?;
        }
        TT::KeywordDefault => {}
        TT::EOF => return Err(t.error(SyntaxErrorType::UnexpectedEnd)),
        _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("`case` or `default`"))),
      };
      self.require(TT::Colon)?;
      loop {
        let next = self.peek();
        if matches!(next.typ, TT::KeywordCase | TT::KeywordDefault | TT::BraceClose) {
          break;
        };
        if next.typ == TT::EOF {
          return Err(next.error(SyntaxErrorType::UnexpectedEnd));
        };
        self.stmt(ctx)?;
      }
    }
    Ok(())
  }
}
