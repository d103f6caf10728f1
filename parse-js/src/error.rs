use crate::loc::Loc;
use crate::token::TT;
use core::fmt;
use core::fmt::Debug;
use core::fmt::Formatter;
use std::error::Error;
use std::fmt::Display;

/// A stable classification of syntax errors produced by the parser.
///
/// Diagnostic codes (prefix `PS`) are assigned per variant and are stable:
/// - `PS0001`: [`SyntaxErrorType::ExpectedSyntax`]
/// - `PS0002`: [`SyntaxErrorType::InvalidToken`]
/// - `PS0003`: [`SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters`]
/// - `PS0004`: [`SyntaxErrorType::LineTerminatorAfterThrow`]
/// - `PS0005`: [`SyntaxErrorType::ModuleSyntaxNotAtTopLevel`]
/// - `PS0006`: [`SyntaxErrorType::RequiredTokenNotFound`]
/// - `PS0007`: [`SyntaxErrorType::TryStatementHasNoCatchOrFinally`]
/// - `PS0008`: [`SyntaxErrorType::UnexpectedEnd`]
/// - `PS0009`: [`SyntaxErrorType::NestingTooDeep`]
/// - `PS0010`: [`SyntaxErrorType::DuplicateDeclaration`]
/// - `PS0011`: [`SyntaxErrorType::ReturnOutsideFunction`]
/// - `PS0012`: [`SyntaxErrorType::MissingConstInitializer`]
/// - `PS0013`: [`SyntaxErrorType::UndefinedLabel`]
/// - `PS0014`: [`SyntaxErrorType::JumpOutsideLoop`]
/// - `PS0015`: [`SyntaxErrorType::DuplicateLabel`]
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SyntaxErrorType {
  ExpectedSyntax(&'static str),
  InvalidToken,
  LineTerminatorAfterArrowFunctionParameters,
  LineTerminatorAfterThrow,
  ModuleSyntaxNotAtTopLevel,
  RequiredTokenNotFound(TT),
  TryStatementHasNoCatchOrFinally,
  UnexpectedEnd,
  NestingTooDeep,
  DuplicateDeclaration,
  ReturnOutsideFunction,
  MissingConstInitializer,
  UndefinedLabel,
  // `break` outside a loop or `switch`, or `continue` outside a loop or targeting a label that isn't a loop.
  JumpOutsideLoop,
  DuplicateLabel,
}

#[derive(Clone)]
pub struct SyntaxError {
  pub typ: SyntaxErrorType,
  pub loc: Loc,
  pub actual_token: Option<TT>,
}

impl SyntaxError {
  pub fn new(typ: SyntaxErrorType, loc: Loc, actual_token: Option<TT>) -> SyntaxError {
    SyntaxError {
      typ,
      loc,
      actual_token,
    }
  }

  /// Human-readable message, without location.
  pub fn message(&self) -> String {
    self.typ.message(self.actual_token)
  }
}

impl Debug for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} around loc [{}:{}]", self, self.loc.0, self.loc.1)
  }
}

impl Display for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{:?} [token={:?}]", self.typ, self.actual_token)
  }
}

impl Error for SyntaxError {}

impl PartialEq for SyntaxError {
  fn eq(&self, other: &Self) -> bool {
    self.typ == other.typ
  }
}

impl Eq for SyntaxError {}

pub type SyntaxResult<T> = Result<T, SyntaxError>;

impl SyntaxErrorType {
  /// Stable diagnostic code for this syntax error variant.
  pub fn code(&self) -> &'static str {
    match self {
      SyntaxErrorType::ExpectedSyntax(_) => "PS0001",
      SyntaxErrorType::InvalidToken => "PS0002",
      SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters => "PS0003",
      SyntaxErrorType::LineTerminatorAfterThrow => "PS0004",
      SyntaxErrorType::ModuleSyntaxNotAtTopLevel => "PS0005",
      SyntaxErrorType::RequiredTokenNotFound(_) => "PS0006",
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => "PS0007",
      SyntaxErrorType::UnexpectedEnd => "PS0008",
      SyntaxErrorType::NestingTooDeep => "PS0009",
      SyntaxErrorType::DuplicateDeclaration => "PS0010",
      SyntaxErrorType::ReturnOutsideFunction => "PS0011",
      SyntaxErrorType::MissingConstInitializer => "PS0012",
      SyntaxErrorType::UndefinedLabel => "PS0013",
      SyntaxErrorType::JumpOutsideLoop => "PS0014",
      SyntaxErrorType::DuplicateLabel => "PS0015",
    }
  }

  /// Human-readable message describing this syntax error.
  pub fn message(&self, actual_token: Option<TT>) -> String {
    match self {
      SyntaxErrorType::ExpectedSyntax(expected) => format!("expected {}", expected),
      SyntaxErrorType::InvalidToken => {
        "invalid or unterminated token".into()
      }
      SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters => {
        "line terminator not allowed after arrow function parameters".into()
      }
      SyntaxErrorType::LineTerminatorAfterThrow => {
        "line terminator not allowed after `throw`".into()
      }
      SyntaxErrorType::ModuleSyntaxNotAtTopLevel => {
        "import and export declarations may only appear at the top level of a module".into()
      }
      SyntaxErrorType::RequiredTokenNotFound(token) => format!("expected token {:?}", token),
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => {
        "try statement requires a catch or finally block".into()
      }
      SyntaxErrorType::UnexpectedEnd => actual_token
        .map(|tok| format!("unexpected end before {:?}", tok))
        .unwrap_or_else(|| "unexpected end of input".into()),
      SyntaxErrorType::NestingTooDeep => "expressions or statements are nested too deeply".into(),
      SyntaxErrorType::DuplicateDeclaration => "identifier has already been declared".into(),
      SyntaxErrorType::ReturnOutsideFunction => "`return` outside of a function".into(),
      SyntaxErrorType::MissingConstInitializer => "missing initializer in `const` declaration".into(),
      SyntaxErrorType::UndefinedLabel => "label is not defined".into(),
      SyntaxErrorType::JumpOutsideLoop => match actual_token {
        Some(TT::KeywordContinue) => "`continue` must target an enclosing loop".into(),
        _ => "`break` must be inside a loop or `switch`".into(),
      },
      SyntaxErrorType::DuplicateLabel => "label has already been declared".into(),
    }
  }
}
