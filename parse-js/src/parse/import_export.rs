use super::func::DefinitionKind;
use super::ParseCtx;
use super::Parser;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::LexMode;
use crate::lit::decode_string_literal;
use crate::lit::normalize_identifier;
use crate::loc::Loc;
use crate::module::ExportSpecifier;
use crate::module::ExportTarget;
use crate::module::ImportDecl;
use crate::module::ImportSpecifier;
use crate::module::Imported;
use crate::module::ItemKind;
use crate::module::ModuleRequest;
use crate::module::ModuleSyntax;
use crate::module::DEFAULT_EXPORT_BINDING;
use crate::scope::DeclKind;
use crate::token::TT;

// A name in an import or export list, which can be any identifier name or a string.
struct ModuleExportName {
  name: String,
  loc: Loc,
  // Whether the name could also be a local binding.
  is_identifier: bool,
}

impl<'a> Parser<'a> {
  fn module_export_name(&mut self) -> SyntaxResult<ModuleExportName> {
    let t = self.consume();
    match t.typ {
      TT::LiteralString => {
        let name = decode_string_literal(self.str(t.loc))
          .ok_or_else(|| t.error(SyntaxErrorType::InvalidToken))?;
        Ok(ModuleExportName {
          name,
          loc: t.loc,
          is_identifier: false,
        })
      }
      typ if typ.is_identifier_name() => Ok(ModuleExportName {
        name: normalize_identifier(self.str(t.loc)),
        loc: t.loc,
        is_identifier: typ.is_identifier(),
      }),
      _ => Err(t.error(SyntaxErrorType::ExpectedSyntax("import or export name"))),
    }
  }

  // Parses the module specifier string and any import attributes after it.
  fn module_request(&mut self) -> SyntaxResult<usize> {
    let t = self.require(TT::LiteralString)?;
    let specifier =
      decode_string_literal(self.str(t.loc)).ok_or_else(|| t.error(SyntaxErrorType::InvalidToken))?;
    let (a, b) = self.peek_2();
    let has_attributes = !a.preceded_by_line_terminator
      && b.typ == TT::BraceOpen
      && (a.typ == TT::KeywordWith || (a.typ == TT::Identifier && self.str(a.loc) == "assert"));
    if has_attributes {
      self.consume();
      self.consume();
      self.list(TT::Comma, TT::BraceClose, |p| {
        p.module_export_name()?;
        p.require(TT::Colon)?;
        p.require(TT::LiteralString)?;
        Ok(())
      })?;
    };
    self.requests.push(ModuleRequest {
      specifier,
      loc: t.loc,
    });
    Ok(self.requests.len() - 1)
  }

  fn import_binding(&mut self, imported: Imported, specifiers: &mut Vec<ImportSpecifier>) -> SyntaxResult<()> {
    let (local, loc) = self.binding_identifier()?;
    self.declare(local.clone(), loc, DeclKind::Import, false);
    specifiers.push(ImportSpecifier {
      imported,
      local,
      loc,
    });
    Ok(())
  }

  /// Parses an `import` declaration.
  pub fn import_decl(&mut self) -> SyntaxResult<(ItemKind, bool)> {
    self.require(TT::KeywordImport)?;
    let mut specifiers = Vec::new();
    if self.peek().typ != TT::LiteralString {
      if self.peek().typ.is_identifier() {
        self.import_binding(Imported::Name("default".to_string()), &mut specifiers)?;
        if !self.consume_if(TT::Comma).is_match() {
          self.require(TT::KeywordFrom)?;
          return self.finish_import_decl(specifiers);
        };
      };
      if self.consume_if(TT::Asterisk).is_match() {
        self.require(TT::KeywordAs)?;
        self.import_binding(Imported::Namespace, &mut specifiers)?;
      } else {
        self.require(TT::BraceOpen)?;
        self.list(TT::Comma, TT::BraceClose, |p| {
          let imported = p.module_export_name()?;
          if p.consume_if(TT::KeywordAs).is_match() {
            return p.import_binding(Imported::Name(imported.name), &mut specifiers);
          };
          if !imported.is_identifier {
            return Err(imported.loc.error(
              SyntaxErrorType::RequiredTokenNotFound(TT::KeywordAs),
              None,
            ));
          };
          p.declare(imported.name.clone(), imported.loc, DeclKind::Import, false);
          specifiers.push(ImportSpecifier {
            imported: Imported::Name(imported.name.clone()),
            local: imported.name,
            loc: imported.loc,
          });
          Ok(())
        })?;
      };
      self.require(TT::KeywordFrom)?;
    };
    self.finish_import_decl(specifiers)
  }

  fn finish_import_decl(&mut self, specifiers: Vec<ImportSpecifier>) -> SyntaxResult<(ItemKind, bool)> {
    let request = self.module_request()?;
    let asi = self.require_semicolon()?;
    self.imports.push(ImportDecl { request, specifiers });
    Ok((ItemKind::Import, asi))
  }

  /// Parses an `export` declaration.
  pub fn export_decl(&mut self, ctx: ParseCtx) -> SyntaxResult<(ItemKind, bool)> {
    let kw = self.require(TT::KeywordExport)?;
    let t = self.peek();
    match t.typ {
      TT::KeywordDefault => self.export_default(ctx, kw.loc),
      TT::Asterisk => {
        self.consume();
        if self.consume_if(TT::KeywordAs).is_match() {
          let exported = self.module_export_name()?;
          self.require(TT::KeywordFrom)?;
          let request = self.module_request()?;
          self.exports.push(ExportSpecifier {
            exported: exported.name,
            loc: exported.loc,
            target: ExportTarget::From {
              request,
              imported: Imported::Namespace,
            },
          });
        } else {
          self.require(TT::KeywordFrom)?;
          let request = self.module_request()?;
          self.star_exports.push(request);
        };
        let asi = self.require_semicolon()?;
        Ok((ItemKind::ExportFrom, asi))
      }
      TT::BraceOpen => {
        self.consume();
        let mut names = Vec::new();
        self.list(TT::Comma, TT::BraceClose, |p| {
          let local = p.module_export_name()?;
          let exported = if p.consume_if(TT::KeywordAs).is_match() {
            Some(p.module_export_name()?)
          } else {
            None
          };
          names.push((local, exported));
          Ok(())
        })?;
        if self.consume_if(TT::KeywordFrom).is_match() {
          let request = self.module_request()?;
          for (local, exported) in names {
            let (exported, loc) = match exported {
              Some(e) => (e.name, e.loc),
              None => (local.name.clone(), local.loc),
            };
            self.exports.push(ExportSpecifier {
              exported,
              loc,
              target: ExportTarget::From {
                request,
                imported: Imported::Name(local.name),
              },
            });
          }
          let asi = self.require_semicolon()?;
          return Ok((ItemKind::ExportFrom, asi));
        };
        for (local, exported) in names {
          if !local.is_identifier {
            return Err(local.loc.error(
              SyntaxErrorType::ExpectedSyntax("local binding name"),
              None,
            ));
          };
          let (exported, loc) = match exported {
            Some(e) => (e.name, e.loc),
            None => (local.name.clone(), local.loc),
          };
          self.exports.push(ExportSpecifier {
            exported,
            loc,
            target: ExportTarget::Local(local.name),
          });
        }
        let asi = self.require_semicolon()?;
        Ok((ItemKind::ExportList, asi))
      }
      _ if self.at_declaration() => {
        let strip = Loc(kw.loc.0, t.loc.0);
        let decls_start = self.declarations.len();
        let asi = self.stmt(ctx)?;
        let names = ModuleSyntax::exported_declaration_names(
          &self.declarations,
          decls_start..self.declarations.len(),
        );
        for (name, loc) in names {
          self.exports.push(ExportSpecifier {
            exported: name.clone(),
            loc,
            target: ExportTarget::Local(name),
          });
        }
        Ok((ItemKind::ExportDeclaration { strip }, asi))
      }
      _ => Err(t.error(SyntaxErrorType::ExpectedSyntax("exportable declaration or export list"))),
    }
  }

  fn export_default(&mut self, ctx: ParseCtx, kw: Loc) -> SyntaxResult<(ItemKind, bool)> {
    let default_kw = self.consume();
    let next = self.peek_with_mode(LexMode::SlashIsRegex);
    let strip = Loc(kw.0, next.loc.0);
    let is_function = next.typ == TT::KeywordFunction || (next.typ == TT::KeywordAsync && self.at_declaration());
    if is_function || next.typ == TT::KeywordClass {
      let def = if is_function {
        self.function(ctx, DefinitionKind::DefaultExport)?
      } else {
        self.class(ctx, DefinitionKind::DefaultExport)?
      };
      let local = match def.name {
        Some(loc) => normalize_identifier(self.str(loc)),
        None => {
          let at = Loc(def.name_insert_at, def.name_insert_at);
          let kind = if is_function {
            DeclKind::Function
          } else {
            DeclKind::Class
          };
          self.declare(DEFAULT_EXPORT_BINDING.to_string(), at, kind, false);
          DEFAULT_EXPORT_BINDING.to_string()
        }
      };
      self.exports.push(ExportSpecifier {
        exported: "default".to_string(),
        loc: default_kw.loc,
        target: ExportTarget::Local(local),
      });
      return Ok((
        ItemKind::ExportDefaultDeclaration {
          strip,
          name_insert_at: def.name.is_none().then_some(def.name_insert_at),
        },
        false,
      ));
    };
    self.declare(
      DEFAULT_EXPORT_BINDING.to_string(),
      Loc(strip.1, strip.1),
      DeclKind::Const,
      false,
    );
    let expr = self.assign_expr(ctx.with_in_allowed(true))?;
    let asi = self.require_semicolon()?;
    self.exports.push(ExportSpecifier {
      exported: "default".to_string(),
      loc: default_kw.loc,
      target: ExportTarget::Local(DEFAULT_EXPORT_BINDING.to_string()),
    });
    Ok((
      ItemKind::ExportDefaultExpression {
        strip,
        expr: expr.loc,
      },
      asi,
    ))
  }
}
