use crate::char::is_digit;
use crate::char::is_id_continue;
use crate::char::is_id_start;
use crate::char::is_line_terminator;
use crate::loc::Loc;
use crate::token::Token;
use crate::token::TT;
use ahash::HashMap;
use ahash::HashMapExt;
use aho_corasick::AhoCorasick;
use aho_corasick::AhoCorasickBuilder;
use aho_corasick::AhoCorasickKind;
use aho_corasick::Anchored;
use aho_corasick::Input;
use aho_corasick::MatchKind;
use aho_corasick::StartKind;
use core::ops::Index;
use memchr::memchr3;
use once_cell::sync::Lazy;

#[cfg(test)]
mod tests;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum LexMode {
  SlashIsRegex,
  Standard,
  TemplateStrContinue,
}

#[derive(Copy, Clone)]
pub struct LexerCheckpoint {
  next: usize,
}

// Contains the match length.
#[derive(Copy, Clone)]
struct Match(usize);

impl Match {
  pub fn len(&self) -> usize {
    self.0
  }

  pub fn prefix(&self, n: usize) -> Match {
    debug_assert!(n <= self.len());
    Match(n)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

struct PatternMatcher {
  patterns: Vec<TT>,
  matcher: AhoCorasick,
  anchored: bool,
}

impl PatternMatcher {
  pub fn new<D: AsRef<str>>(anchored: bool, patterns: Vec<(TT, D)>) -> Self {
    let (tts, syns): (Vec<_>, Vec<_>) = patterns.into_iter().unzip();
    let matcher = AhoCorasickBuilder::new()
      .start_kind(if anchored {
        StartKind::Anchored
      } else {
        StartKind::Unanchored
      })
      .kind(Some(AhoCorasickKind::DFA))
      .match_kind(MatchKind::LeftmostLongest)
      .build(syns.iter().map(|s| s.as_ref().as_bytes()))
      // The pattern sets are static, so this can only fail on a programming error.
      .expect("build lexer pattern matcher");
    PatternMatcher {
      patterns: tts,
      matcher,
      anchored,
    }
  }

  pub fn find(&self, lexer: &Lexer) -> LexResult<(TT, Match)> {
    self
      .matcher
      .find(
        Input::new(&lexer.source[lexer.next..]).anchored(if self.anchored {
          Anchored::Yes
        } else {
          Anchored::No
        }),
      )
      .map(|m| (self.patterns[m.pattern().as_usize()], Match(m.end())))
      .ok_or(LexNotFound)
  }
}

#[derive(Debug)]
struct LexNotFound;

type LexResult<T> = Result<T, LexNotFound>;

pub struct Lexer<'a> {
  source: &'a str,
  next: usize,
}

impl<'a> Lexer<'a> {
  pub fn new(code: &'a str) -> Lexer<'a> {
    Lexer {
      source: code,
      next: 0,
    }
  }

  pub fn source(&self) -> &'a str {
    self.source
  }

  pub fn next(&self) -> usize {
    self.next
  }

  fn end(&self) -> usize {
    self.source.len()
  }

  fn remaining(&self) -> usize {
    self.end() - self.next
  }

  pub fn source_range(&self) -> Loc {
    Loc(0, self.end())
  }

  fn eof_range(&self) -> Loc {
    Loc(self.end(), self.end())
  }

  fn at_end(&self) -> bool {
    self.next >= self.end()
  }

  fn peek(&self, n: usize) -> LexResult<char> {
    self.peek_or_eof(n).ok_or(LexNotFound)
  }

  fn peek_or_eof(&self, n: usize) -> Option<char> {
    self.source[self.next..].chars().nth(n)
  }

  /// WARNING: Prefer checkpoints instead. Only use this if you know what you're doing.
  pub fn set_next(&mut self, next: usize) {
    self.next = next;
  }

  pub fn checkpoint(&self) -> LexerCheckpoint {
    LexerCheckpoint { next: self.next }
  }

  pub fn since_checkpoint(&self, checkpoint: LexerCheckpoint) -> Loc {
    Loc(checkpoint.next, self.next)
  }

  pub fn apply_checkpoint(&mut self, checkpoint: LexerCheckpoint) {
    self.next = checkpoint.next;
  }

  fn if_char(&self, c: char) -> Match {
    match self.peek_or_eof(0) {
      Some(first) if first == c => Match(c.len_utf8()),
      _ => Match(0),
    }
  }

  fn while_not_3_chars(&self, a: u8, b: u8, c: u8) -> Match {
    Match(memchr3(a, b, c, self.source[self.next..].as_bytes()).unwrap_or(self.remaining()))
  }

  fn while_chars(&self, pred: impl Fn(char) -> bool) -> Match {
    let mut len = 0;
    for ch in self.source[self.next..].chars() {
      if !pred(ch) {
        break;
      };
      len += ch.len_utf8();
    }
    Match(len)
  }

  fn consume(&mut self, m: Match) -> Match {
    self.next += m.len();
    m
  }

  fn consume_next(&mut self) -> LexResult<char> {
    let c = self.peek(0)?;
    self.next += c.len_utf8();
    Ok(c)
  }

  fn skip_expect(&mut self, n: usize) {
    debug_assert!(self.next + n <= self.end());
    self.next += n;
  }

  fn drive_fallible(
    &mut self,
    preceded_by_line_terminator: bool,
    f: impl FnOnce(&mut Self) -> LexResult<TT>,
  ) -> Token {
    let cp = self.checkpoint();
    let typ = f(self).unwrap_or(TT::Invalid);
    Token {
      loc: self.since_checkpoint(cp),
      typ,
      preceded_by_line_terminator,
    }
  }
}

impl<'a> Index<Loc> for Lexer<'a> {
  type Output = str;

  fn index(&self, index: Loc) -> &Self::Output {
    &self.source[index.0..index.1]
  }
}

#[rustfmt::skip]
pub static OPERATORS_MAPPING: Lazy<HashMap<TT, &'static str>> = Lazy::new(|| {
  let mut map = HashMap::<TT, &'static str>::new();
  map.insert(TT::Ampersand, "&");
  map.insert(TT::AmpersandAmpersand, "&&");
  map.insert(TT::AmpersandAmpersandEquals, "&&=");
  map.insert(TT::AmpersandEquals, "&=");
  map.insert(TT::Asterisk, "*");
  map.insert(TT::AsteriskAsterisk, "**");
  map.insert(TT::AsteriskAsteriskEquals, "**=");
  map.insert(TT::AsteriskEquals, "*=");
  map.insert(TT::At, "@");
  map.insert(TT::Bar, "|");
  map.insert(TT::BarBar, "||");
  map.insert(TT::BarBarEquals, "||=");
  map.insert(TT::BarEquals, "|=");
  map.insert(TT::BraceClose, "}");
  map.insert(TT::BraceOpen, "{");
  map.insert(TT::BracketClose, "]");
  map.insert(TT::BracketOpen, "[");
  map.insert(TT::Caret, "^");
  map.insert(TT::CaretEquals, "^=");
  map.insert(TT::ChevronLeft, "<");
  map.insert(TT::ChevronLeftChevronLeft, "<<");
  map.insert(TT::ChevronLeftChevronLeftEquals, "<<=");
  map.insert(TT::ChevronLeftEquals, "<=");
  map.insert(TT::ChevronRight, ">");
  map.insert(TT::ChevronRightChevronRight, ">>");
  map.insert(TT::ChevronRightChevronRightChevronRight, ">>>");
  map.insert(TT::ChevronRightChevronRightChevronRightEquals, ">>>=");
  map.insert(TT::ChevronRightChevronRightEquals, ">>=");
  map.insert(TT::ChevronRightEquals, ">=");
  map.insert(TT::Colon, ":");
  map.insert(TT::Comma, ",");
  map.insert(TT::Dot, ".");
  map.insert(TT::DotDotDot, "...");
  map.insert(TT::Equals, "=");
  map.insert(TT::EqualsChevronRight, "=>");
  map.insert(TT::EqualsEquals, "==");
  map.insert(TT::EqualsEqualsEquals, "===");
  map.insert(TT::Exclamation, "!");
  map.insert(TT::ExclamationEquals, "!=");
  map.insert(TT::ExclamationEqualsEquals, "!==");
  map.insert(TT::Hyphen, "-");
  map.insert(TT::HyphenEquals, "-=");
  map.insert(TT::HyphenHyphen, "--");
  map.insert(TT::ParenthesisClose, ")");
  map.insert(TT::ParenthesisOpen, "(");
  map.insert(TT::Percent, "%");
  map.insert(TT::PercentEquals, "%=");
  map.insert(TT::Plus, "+");
  map.insert(TT::PlusEquals, "+=");
  map.insert(TT::PlusPlus, "++");
  map.insert(TT::PrivateMember, "#");
  map.insert(TT::Question, "?");
  map.insert(TT::QuestionDot, "?.");
  map.insert(TT::QuestionQuestion, "??");
  map.insert(TT::QuestionQuestionEquals, "??=");
  map.insert(TT::Semicolon, ";");
  map.insert(TT::Slash, "/");
  map.insert(TT::SlashEquals, "/=");
  map.insert(TT::Tilde, "~");
  map
});

#[rustfmt::skip]
pub static KEYWORDS_MAPPING: Lazy<HashMap<TT, &'static str>> = Lazy::new(|| {
  let mut map = HashMap::<TT, &'static str>::new();
  map.insert(TT::KeywordAs, "as");
  map.insert(TT::KeywordAsync, "async");
  map.insert(TT::KeywordAwait, "await");
  map.insert(TT::KeywordBreak, "break");
  map.insert(TT::KeywordCase, "case");
  map.insert(TT::KeywordCatch, "catch");
  map.insert(TT::KeywordClass, "class");
  map.insert(TT::KeywordConst, "const");
  map.insert(TT::KeywordContinue, "continue");
  map.insert(TT::KeywordDebugger, "debugger");
  map.insert(TT::KeywordDefault, "default");
  map.insert(TT::KeywordDelete, "delete");
  map.insert(TT::KeywordDo, "do");
  map.insert(TT::KeywordElse, "else");
  map.insert(TT::KeywordEnum, "enum");
  map.insert(TT::KeywordExport, "export");
  map.insert(TT::KeywordExtends, "extends");
  map.insert(TT::KeywordFinally, "finally");
  map.insert(TT::KeywordFor, "for");
  map.insert(TT::KeywordFrom, "from");
  map.insert(TT::KeywordFunction, "function");
  map.insert(TT::KeywordGet, "get");
  map.insert(TT::KeywordIf, "if");
  map.insert(TT::KeywordImport, "import");
  map.insert(TT::KeywordIn, "in");
  map.insert(TT::KeywordInstanceof, "instanceof");
  map.insert(TT::KeywordLet, "let");
  map.insert(TT::KeywordNew, "new");
  map.insert(TT::KeywordOf, "of");
  map.insert(TT::KeywordReturn, "return");
  map.insert(TT::KeywordSet, "set");
  map.insert(TT::KeywordStatic, "static");
  map.insert(TT::KeywordSuper, "super");
  map.insert(TT::KeywordSwitch, "switch");
  map.insert(TT::KeywordThis, "this");
  map.insert(TT::KeywordThrow, "throw");
  map.insert(TT::KeywordTry, "try");
  map.insert(TT::KeywordTypeof, "typeof");
  map.insert(TT::KeywordVar, "var");
  map.insert(TT::KeywordVoid, "void");
  map.insert(TT::KeywordWhile, "while");
  map.insert(TT::KeywordWith, "with");
  map.insert(TT::KeywordYield, "yield");
  map.insert(TT::LiteralFalse, "false");
  map.insert(TT::LiteralNull, "null");
  map.insert(TT::LiteralTrue, "true");
  map
});

pub static KEYWORD_STRS: Lazy<HashMap<&'static str, TT>> = Lazy::new(|| {
  HashMap::<&'static str, TT>::from_iter(KEYWORDS_MAPPING.iter().map(|(&tt, &s)| (s, tt)))
});

/// Whether `name` can be written as-is as a binding name in module code.
pub fn is_binding_name(name: &str) -> bool {
  let mut chars = name.chars();
  let Some(first) = chars.next() else {
    return false;
  };
  is_id_start(first)
    && chars.all(is_id_continue)
    && KEYWORD_STRS.get(name).map_or(true, |tt| tt.is_identifier())
}

// Identifiers are lexed before this matcher is consulted, so it only needs to cover punctuators,
// numbers, strings, templates and private names.
#[rustfmt::skip]
static SIG: Lazy<PatternMatcher> = Lazy::new(|| {
  let mut patterns: Vec<(TT, String)> = Vec::new();
  for (&k, &v) in OPERATORS_MAPPING.iter() {
    patterns.push((k, v.into()));
  }
  for c in "0123456789".chars() {
    patterns.push((TT::LiteralNumber, c.to_string()));
  }
  patterns.push((TT::LiteralNumberBin, "0b".into()));
  patterns.push((TT::LiteralNumberBin, "0B".into()));
  patterns.push((TT::LiteralNumberHex, "0x".into()));
  patterns.push((TT::LiteralNumberHex, "0X".into()));
  patterns.push((TT::LiteralNumberOct, "0o".into()));
  patterns.push((TT::LiteralNumberOct, "0O".into()));
  // Prevent `.` immediately followed by a digit from being recognised as the `.` operator.
  for digit in '0'..='9' {
    patterns.push((TT::LiteralNumber, format!(".{}", digit)));
  }
  // Prevent `?` immediately followed by a decimal number from being recognised as the `?.` operator.
  for digit in '0'..='9' {
    patterns.push((TT::Question, format!("?.{}", digit)));
  }
  patterns.push((TT::LiteralString, "\"".into()));
  patterns.push((TT::LiteralString, "'".into()));
  patterns.push((TT::LiteralTemplatePartString, "`".into()));

  PatternMatcher::new(true, patterns)
});

static ML_COMMENT: Lazy<PatternMatcher> = Lazy::new(|| {
  PatternMatcher::new::<&str>(false, vec![
    (TT::CommentMultilineEnd, "*/"),
    (TT::LineTerminator, "\r"),
    (TT::LineTerminator, "\n"),
    (TT::LineTerminator, "\u{2028}"),
    (TT::LineTerminator, "\u{2029}"),
  ])
});

static INSIG: Lazy<PatternMatcher> = Lazy::new(|| {
  PatternMatcher::new::<&str>(true, vec![
    (TT::LineTerminator, "\r"),
    (TT::LineTerminator, "\n"),
    (TT::LineTerminator, "\u{2028}"),
    (TT::LineTerminator, "\u{2029}"),
    (TT::Whitespace, "\x09"),
    (TT::Whitespace, "\x0b"),
    (TT::Whitespace, "\x0c"),
    (TT::Whitespace, "\x20"),
    (TT::Whitespace, "\u{00A0}"),
    (TT::Whitespace, "\u{1680}"),
    (TT::Whitespace, "\u{2000}"),
    (TT::Whitespace, "\u{2001}"),
    (TT::Whitespace, "\u{2002}"),
    (TT::Whitespace, "\u{2003}"),
    (TT::Whitespace, "\u{2004}"),
    (TT::Whitespace, "\u{2005}"),
    (TT::Whitespace, "\u{2006}"),
    (TT::Whitespace, "\u{2007}"),
    (TT::Whitespace, "\u{2008}"),
    (TT::Whitespace, "\u{2009}"),
    (TT::Whitespace, "\u{200A}"),
    (TT::Whitespace, "\u{202F}"),
    (TT::Whitespace, "\u{205F}"),
    (TT::Whitespace, "\u{3000}"),
    (TT::Whitespace, "\u{FEFF}"),
    (TT::CommentMultiline, "/*"),
    (TT::CommentSingle, "//"),
  ])
});

/// Returns whether the comment includes a line terminator.
fn lex_multiline_comment(lexer: &mut Lexer<'_>) -> bool {
  // Consume `/*`.
  lexer.skip_expect(2);
  let mut contains_newline = false;
  loop {
    let (tt, mat) = ML_COMMENT
      .find(lexer)
      // We can't reject with an error, so we just consume the rest of the source code if no matching `*/` is found.
      .unwrap_or((TT::EOF, Match(lexer.remaining())));
    lexer.consume(mat);
    match tt {
      TT::LineTerminator => contains_newline = true,
      _ => break,
    };
  }
  contains_newline
}

fn lex_single_comment(lexer: &mut Lexer<'_>) {
  // The line terminator itself is left for the next round of INSIG so it gets recorded.
  loop {
    lexer.consume(lexer.while_not_3_chars(b'\n', b'\r', 0xE2));
    match lexer.peek_or_eof(0) {
      None | Some('\n' | '\r' | '\u{2028}' | '\u{2029}') => break,
      Some(c) => lexer.skip_expect(c.len_utf8()),
    };
  }
}

fn lex_unicode_escape(lexer: &mut Lexer<'_>) -> LexResult<()> {
  // Consume `\`.
  lexer.skip_expect(1);
  if lexer.consume_next()? != 'u' {
    return Err(LexNotFound);
  };
  if !lexer.consume(lexer.if_char('{')).is_empty() {
    let digits = lexer.consume(lexer.while_chars(|c| c.is_ascii_hexdigit()));
    if digits.is_empty() || lexer.consume_next()? != '}' {
      return Err(LexNotFound);
    };
  } else {
    for _ in 0..4 {
      if !lexer.consume_next()?.is_ascii_hexdigit() {
        return Err(LexNotFound);
      };
    }
  };
  Ok(())
}

fn lex_identifier_chars(lexer: &mut Lexer<'_>) -> LexResult<()> {
  loop {
    lexer.consume(lexer.while_chars(|c| c != '\\' && is_id_continue(c)));
    if lexer.peek_or_eof(0) != Some('\\') {
      break;
    };
    lex_unicode_escape(lexer)?;
  }
  Ok(())
}

fn lex_identifier(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  let start = lexer.next();
  let starter = lexer.peek(0)?;
  if starter == '\\' {
    lex_unicode_escape(lexer)?;
  } else {
    lexer.skip_expect(starter.len_utf8());
  };
  lex_identifier_chars(lexer)?;
  let raw = &lexer[Loc(start, lexer.next())];
  // Keywords written with escapes are not keywords.
  Ok(
    KEYWORD_STRS
      .get(raw)
      .copied()
      .unwrap_or(TT::Identifier),
  )
}

fn lex_bigint_or_number(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  let start = lexer.next();
  let first_char = lexer.peek(0)?;
  lexer.consume(lexer.while_chars(|c| is_digit(c, 10)));
  let integer_part = &lexer[Loc(start, lexer.next())];
  // Legacy octals like `017` cannot have a fractional part.
  let is_legacy_octal = first_char == '0'
    && integer_part.len() > 1
    && integer_part.chars().all(|c| matches!(c, '0'..='7'));
  if !lexer.consume(lexer.if_char('n')).is_empty() {
    return Ok(TT::LiteralBigInt);
  };
  if lexer.peek_or_eof(0) == Some('.') && !is_legacy_octal {
    lexer.skip_expect(1);
    lexer.consume(lexer.while_chars(|c| is_digit(c, 10)));
  };
  if matches!(lexer.peek_or_eof(0), Some('e' | 'E')) {
    lexer.skip_expect(1);
    if matches!(lexer.peek(0)?, '+' | '-') {
      lexer.skip_expect(1);
    };
    if lexer.consume(lexer.while_chars(|c| is_digit(c, 10))).is_empty() {
      return Ok(TT::Invalid);
    };
  };
  // A numeric literal must not be immediately followed by an identifier start.
  if lexer.peek_or_eof(0).is_some_and(is_id_start) {
    return Ok(TT::Invalid);
  };
  Ok(TT::LiteralNumber)
}

fn lex_radix_bigint_or_number(lexer: &mut Lexer<'_>, radix: u32) -> TT {
  // Consume the `0x`, `0o` or `0b` prefix.
  lexer.skip_expect(2);
  if lexer.consume(lexer.while_chars(|c| is_digit(c, radix))).is_empty() {
    return TT::Invalid;
  };
  if !lexer.consume(lexer.if_char('n')).is_empty() {
    return TT::LiteralBigInt;
  };
  TT::LiteralNumber
}

fn lex_private_member(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  // Include the `#` in the token.
  lexer.skip_expect(1);
  let starter = lexer.peek(0)?;
  if starter != '\\' && !is_id_start(starter) {
    return Ok(TT::Invalid);
  };
  if starter == '\\' {
    lex_unicode_escape(lexer)?;
  } else {
    lexer.skip_expect(starter.len_utf8());
  };
  lex_identifier_chars(lexer)?;
  Ok(TT::PrivateMember)
}

fn lex_regex(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  // Consume slash.
  lexer.skip_expect(1);
  let mut in_charset = false;
  loop {
    match lexer.consume_next()? {
      '\\' => {
        // Cannot escape line terminator.
        let escaped_char = lexer.consume_next()?;
        if is_line_terminator(escaped_char) {
          return Ok(TT::Invalid);
        };
      }
      '/' if !in_charset => {
        break;
      }
      '[' => {
        in_charset = true;
      }
      ']' if in_charset => {
        in_charset = false;
      }
      c if is_line_terminator(c) => {
        return Ok(TT::Invalid);
      }
      _ => {}
    };
  }
  // Flags.
  lexer.consume(lexer.while_chars(is_id_continue));
  Ok(TT::LiteralRegex)
}

fn lex_string(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  let quote = lexer.consume_next()?;
  loop {
    lexer.consume(lexer.while_not_3_chars(b'\\', b'\n', quote as u8));
    match lexer.consume_next()? {
      '\\' => {
        // Line continuations and CRLF pairs are consumed as a unit.
        if lexer.consume_next()? == '\r' {
          lexer.consume(lexer.if_char('\n'));
        };
      }
      '\n' => return Ok(TT::Invalid),
      c if c == quote => break,
      _ => unreachable!(),
    };
  }
  Ok(TT::LiteralString)
}

/// Ends with `${` or backtick.
fn lex_template_string_continue(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  loop {
    lexer.consume(lexer.while_not_3_chars(b'\\', b'`', b'$'));
    match lexer.consume_next()? {
      '\\' => {
        lexer.consume_next()?;
      }
      '`' => return Ok(TT::LiteralTemplatePartStringEnd),
      '$' => {
        if !lexer.consume(lexer.if_char('{')).is_empty() {
          return Ok(TT::LiteralTemplatePartString);
        };
      }
      _ => unreachable!(),
    };
  }
}

fn lex_template(lexer: &mut Lexer<'_>) -> LexResult<TT> {
  // Consume backtick.
  lexer.skip_expect(1);
  lex_template_string_continue(lexer)
}

pub fn lex_next(lexer: &mut Lexer<'_>, mode: LexMode) -> Token {
  if mode == LexMode::TemplateStrContinue {
    return lexer.drive_fallible(false, lex_template_string_continue);
  };

  let mut preceded_by_line_terminator = false;
  // Hashbang comment.
  if lexer.next() == 0 && lexer.source.starts_with("#!") {
    lex_single_comment(lexer);
  };
  while let Ok((tt, mat)) = INSIG.find(lexer) {
    match tt {
      TT::LineTerminator => {
        lexer.consume(mat);
        preceded_by_line_terminator = true;
      }
      TT::Whitespace => {
        lexer.consume(mat);
      }
      TT::CommentMultiline => {
        preceded_by_line_terminator |= lex_multiline_comment(lexer);
      }
      TT::CommentSingle => {
        lex_single_comment(lexer);
      }
      _ => unreachable!(),
    };
  }

  // EOF is different from Invalid, so we should emit this specifically instead of letting drive_fallible return an Invalid.
  if lexer.at_end() {
    return Token {
      loc: lexer.eof_range(),
      typ: TT::EOF,
      preceded_by_line_terminator,
    };
  };

  lexer.drive_fallible(preceded_by_line_terminator, |lexer| {
    let c = lexer.peek(0)?;
    if c == '\\' || is_id_start(c) {
      return lex_identifier(lexer);
    };

    SIG.find(lexer).and_then(|(tt, mut mat)| match tt {
      TT::LiteralNumber => lex_bigint_or_number(lexer),
      TT::LiteralNumberBin => Ok(lex_radix_bigint_or_number(lexer, 2)),
      TT::LiteralNumberHex => Ok(lex_radix_bigint_or_number(lexer, 16)),
      TT::LiteralNumberOct => Ok(lex_radix_bigint_or_number(lexer, 8)),
      TT::LiteralString => lex_string(lexer),
      TT::LiteralTemplatePartString => lex_template(lexer),
      TT::PrivateMember => lex_private_member(lexer),
      TT::Slash | TT::SlashEquals if mode == LexMode::SlashIsRegex => lex_regex(lexer),
      typ => {
        if typ == TT::Question && mat.len() != 1 {
          // We've matched `?.[0-9]`.
          mat = mat.prefix(1);
        };
        lexer.consume(mat);
        Ok(typ)
      }
    })
  })
}
