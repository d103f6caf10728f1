use crate::lex::is_binding_name;
use crate::lex::lex_next;
use crate::lex::LexMode;
use crate::lex::Lexer;
use crate::loc::Loc;
use crate::token::TT;
use crate::token::TT::*;

fn check<const N: usize>(code: &str, expecteds: [TT; N]) {
  let mut lexer = Lexer::new(code);
  for expected in expecteds {
    let t = lex_next(&mut lexer, LexMode::Standard);
    assert_eq!(t.typ, expected, "lexing {:?}", code);
  }
  let t = lex_next(&mut lexer, LexMode::Standard);
  assert_eq!(EOF, t.typ);
}

#[test]
fn test_lex_keywords() {
  check("class", [KeywordClass]);
  check("instanceof", [KeywordInstanceof]);
  check("classes", [Identifier]);
  check("\\u0063lass", [Identifier]);
}

#[test]
fn test_lex_identifiers() {
  check("h929", [Identifier]);
  check("$el _x", [Identifier, Identifier]);
  check("café", [Identifier]);
  check("#secret", [PrivateMember]);
}

#[test]
fn test_lex_literal_numbers() {
  check("1", [LiteralNumber]);
  check("929", [LiteralNumber]);
  check(".929", [LiteralNumber]);
  check(". 929", [Dot, LiteralNumber]);
  check(". 929.2.", [Dot, LiteralNumber, Dot]);
  check(".929.2..", [LiteralNumber, LiteralNumber, Dot, Dot]);
  check("1_000e-3", [LiteralNumber]);
  check("?.929", [Question, LiteralNumber]);
  check("?..929", [QuestionDot, LiteralNumber]);
  check("3px", [Invalid, Identifier]);
}

#[test]
fn test_lex_legacy_octals_have_no_fraction() {
  check("017.5", [LiteralNumber, LiteralNumber]);
  check("019.5", [LiteralNumber]);
  check("0.5", [LiteralNumber]);
  check("017n", [LiteralBigInt]);
}

#[test]
fn test_lex_literal_bigints() {
  check("1n", [LiteralBigInt]);
  check("0x800faceb00cn", [LiteralBigInt]);
  check("0b110101010n", [LiteralBigInt]);
  check("0o12077n", [LiteralBigInt]);
}

#[test]
fn test_lex_literal_strings() {
  check("'hello world'", [LiteralString]);
  check("\"it's\"", [LiteralString]);
  check("'a\\'b'", [LiteralString]);
  check("'line\\\ncontinued'", [LiteralString]);
  check("'hello world\n'", [Invalid, Invalid]);
}

#[test]
fn test_lex_comments_set_line_terminator_flag() {
  let mut lexer = Lexer::new("a /* x */ b /*\n*/ c // d\ne");
  let flags: Vec<bool> = (0..4)
    .map(|_| lex_next(&mut lexer, LexMode::Standard).preceded_by_line_terminator)
    .collect();
  assert_eq!(flags, vec![false, false, true, true]);
}

#[test]
fn test_lex_hashbang() {
  check("#!/usr/bin/env node\nx", [Identifier]);
}

#[test]
fn test_lex_regex_only_in_regex_mode() {
  let mut lexer = Lexer::new("/a[/]b/gi");
  let t = lex_next(&mut lexer, LexMode::SlashIsRegex);
  assert_eq!(t.typ, LiteralRegex);
  assert_eq!(t.loc, Loc(0, 9));

  check("a / b", [Identifier, Slash, Identifier]);
}

#[test]
fn test_lex_template_parts() {
  let mut lexer = Lexer::new("`a${b}c`");
  let head = lex_next(&mut lexer, LexMode::Standard);
  assert_eq!(head.typ, LiteralTemplatePartString);
  assert_eq!(lex_next(&mut lexer, LexMode::Standard).typ, Identifier);
  assert_eq!(lex_next(&mut lexer, LexMode::Standard).typ, BraceClose);
  let tail = lex_next(&mut lexer, LexMode::TemplateStrContinue);
  assert_eq!(tail.typ, LiteralTemplatePartStringEnd);
  assert_eq!(tail.loc, Loc(6, 8));
}

#[test]
fn test_lex_import_statement() {
  check("import * as ns from './a.js';", [
    KeywordImport,
    Asterisk,
    KeywordAs,
    Identifier,
    KeywordFrom,
    LiteralString,
    Semicolon,
  ]);
}

#[test]
fn test_binding_names() {
  assert!(is_binding_name("noise"));
  assert!(is_binding_name("from"));
  assert!(is_binding_name("$x1"));
  assert!(!is_binding_name("default"));
  assert!(!is_binding_name("await"));
  assert!(!is_binding_name("1x"));
  assert!(!is_binding_name("y z"));
  assert!(!is_binding_name(""));
}
