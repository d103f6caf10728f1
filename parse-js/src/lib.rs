use error::SyntaxResult;
use lex::Lexer;
use module::ModuleSyntax;
use parse::Parser;

pub mod char;
pub mod error;
pub mod lex;
pub mod lit;
pub mod loc;
pub mod module;
pub mod operator;
pub mod parse;
pub mod scope;
pub mod token;

/// Parses an ES module and records what a bundler needs from it: its top-level items, imports, exports and
/// dynamic imports, and how every name in it resolves.
pub fn parse_module(source: &str) -> SyntaxResult<ModuleSyntax> {
  let lexer = Lexer::new(source);
  let parser = Parser::new(lexer);
  parser.parse_module()
}
