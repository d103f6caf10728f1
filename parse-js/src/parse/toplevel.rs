use super::ParseCtx;
use super::Parser;
use crate::error::SyntaxResult;
use crate::lex::LexMode;
use crate::loc::Loc;
use crate::module::ItemKind;
use crate::module::ModuleItem;
use crate::module::ModuleSyntax;
use crate::scope::ScopeTree;
use crate::token::TT;

impl<'a> Parser<'a> {
  pub fn parse_module(mut self) -> SyntaxResult<ModuleSyntax> {
    let ctx = ParseCtx::module();
    while self.peek().typ != TT::EOF {
      self.module_item(ctx)?;
    }
    self.require(TT::EOF)?;
    let token_starts = self
      .buf
      .iter()
      .filter(|t| t.token.typ != TT::EOF)
      .map(|t| t.token.loc.0)
      .collect();
    Ok(ModuleSyntax {
      items: self.items,
      requests: self.requests,
      imports: self.imports,
      exports: self.exports,
      star_exports: self.star_exports,
      dynamic_imports: self.dynamic_imports,
      scopes: ScopeTree::build(self.scopes, self.declarations, self.references)?,
      token_starts,
    })
  }

  fn module_item(&mut self, ctx: ParseCtx) -> SyntaxResult<()> {
    let first = self.peek_with_mode(LexMode::SlashIsRegex);
    let declarations = self.declarations.len();
    let references = self.references.len();
    self.side_effects = false;
    let (kind, asi) = match first.typ {
      TT::KeywordImport if !matches!(self.peek_2().1.typ, TT::ParenthesisOpen | TT::Dot) => self.import_decl()?,
      TT::KeywordExport => self.export_decl(ctx)?,
      _ => {
        let kind = if self.at_declaration() {
          ItemKind::Declaration
        } else {
          ItemKind::Statement
        };
        (kind, self.stmt(ctx)?)
      }
    };
    self.items.push(ModuleItem {
      loc: Loc(first.loc.0, self.prev_end()),
      kind,
      asi,
      has_side_effects: self.side_effects,
      declarations: declarations..self.declarations.len(),
      references: references..self.references.len(),
    });
    Ok(())
  }
}
