use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::loc::Loc;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
pub enum TT {
  // Special token used to represent the end of the source code. Easier than using and handling Option everywhere.
  EOF,
  // Source code the lexer could not form a token from (unterminated literal, stray character). The parser turns it into a SyntaxError when it reaches it.
  Invalid,

  Ampersand,
  AmpersandAmpersand,
  AmpersandAmpersandEquals,
  AmpersandEquals,
  Asterisk,
  AsteriskAsterisk,
  AsteriskAsteriskEquals,
  AsteriskEquals,
  At,
  Bar,
  BarBar,
  BarBarEquals,
  BarEquals,
  BraceClose,
  BraceOpen,
  BracketClose,
  BracketOpen,
  Caret,
  CaretEquals,
  ChevronLeft,
  ChevronLeftChevronLeft,
  ChevronLeftChevronLeftEquals,
  ChevronLeftEquals,
  ChevronRight,
  ChevronRightChevronRight,
  ChevronRightChevronRightChevronRight,
  ChevronRightChevronRightChevronRightEquals,
  ChevronRightChevronRightEquals,
  ChevronRightEquals,
  Colon,
  Comma,
  // Comment, whitespace, line terminator and number prefix types are only used inside the lexer and are never emitted.
  CommentMultiline,
  CommentMultilineEnd,
  CommentSingle,
  Dot,
  DotDotDot,
  Equals,
  EqualsChevronRight,
  EqualsEquals,
  EqualsEqualsEquals,
  Exclamation,
  ExclamationEquals,
  ExclamationEqualsEquals,
  Hyphen,
  HyphenEquals,
  HyphenHyphen,
  Identifier,
  KeywordAs,
  KeywordAsync,
  KeywordAwait,
  KeywordBreak,
  KeywordCase,
  KeywordCatch,
  KeywordClass,
  KeywordConst,
  KeywordContinue,
  KeywordDebugger,
  KeywordDefault,
  KeywordDelete,
  KeywordDo,
  KeywordElse,
  KeywordEnum,
  KeywordExport,
  KeywordExtends,
  KeywordFinally,
  KeywordFor,
  KeywordFrom,
  KeywordFunction,
  KeywordGet,
  KeywordIf,
  KeywordImport,
  KeywordIn,
  KeywordInstanceof,
  KeywordLet,
  KeywordNew,
  KeywordOf,
  KeywordReturn,
  KeywordSet,
  KeywordStatic,
  KeywordSuper,
  KeywordSwitch,
  KeywordThis,
  KeywordThrow,
  KeywordTry,
  KeywordTypeof,
  KeywordVar,
  KeywordVoid,
  KeywordWhile,
  KeywordWith,
  KeywordYield,
  LiteralBigInt,
  LiteralFalse,
  LiteralNull,
  LiteralNumber,
  LiteralNumberBin,
  LiteralNumberHex,
  LiteralNumberOct,
  LiteralRegex,
  LiteralString,
  // A template head or middle: starts after the backtick or `}` and ends with `${`.
  LiteralTemplatePartString,
  // A whole template or a template tail: ends with the closing backtick.
  LiteralTemplatePartStringEnd,
  LiteralTrue,
  LineTerminator,
  ParenthesisClose,
  ParenthesisOpen,
  Percent,
  PercentEquals,
  Plus,
  PlusEquals,
  PlusPlus,
  PrivateMember,
  Question,
  QuestionDot,
  QuestionQuestion,
  QuestionQuestionEquals,
  Semicolon,
  Slash,
  SlashEquals,
  Tilde,
  Whitespace,
}

impl TT {
  /// Keywords that can still be used as binding and reference names in strict mode code, which all module
  /// code is. `let`, `static`, `yield` and `await` are reserved there.
  pub fn is_unreserved_keyword(self) -> bool {
    matches!(
      self,
      TT::KeywordAs | TT::KeywordAsync | TT::KeywordFrom | TT::KeywordGet | TT::KeywordOf | TT::KeywordSet
    )
  }

  /// Whether this token can be a binding or reference name.
  pub fn is_identifier(self) -> bool {
    self == TT::Identifier || self.is_unreserved_keyword()
  }

  /// Whether this token can appear as a property name after `.` or as an object/class key. Every
  /// keyword qualifies.
  pub fn is_identifier_name(self) -> bool {
    self == TT::Identifier || self.is_keyword()
  }

  pub fn is_keyword(self) -> bool {
    matches!(
      self,
      TT::KeywordAs
        | TT::KeywordAsync
        | TT::KeywordAwait
        | TT::KeywordBreak
        | TT::KeywordCase
        | TT::KeywordCatch
        | TT::KeywordClass
        | TT::KeywordConst
        | TT::KeywordContinue
        | TT::KeywordDebugger
        | TT::KeywordDefault
        | TT::KeywordDelete
        | TT::KeywordDo
        | TT::KeywordElse
        | TT::KeywordEnum
        | TT::KeywordExport
        | TT::KeywordExtends
        | TT::KeywordFinally
        | TT::KeywordFor
        | TT::KeywordFrom
        | TT::KeywordFunction
        | TT::KeywordGet
        | TT::KeywordIf
        | TT::KeywordImport
        | TT::KeywordIn
        | TT::KeywordInstanceof
        | TT::KeywordLet
        | TT::KeywordNew
        | TT::KeywordOf
        | TT::KeywordReturn
        | TT::KeywordSet
        | TT::KeywordStatic
        | TT::KeywordSuper
        | TT::KeywordSwitch
        | TT::KeywordThis
        | TT::KeywordThrow
        | TT::KeywordTry
        | TT::KeywordTypeof
        | TT::KeywordVar
        | TT::KeywordVoid
        | TT::KeywordWhile
        | TT::KeywordWith
        | TT::KeywordYield
        | TT::LiteralFalse
        | TT::LiteralNull
        | TT::LiteralTrue
    )
  }

  pub fn is_assignment_operator(self) -> bool {
    matches!(
      self,
      TT::Equals
        | TT::AmpersandAmpersandEquals
        | TT::AmpersandEquals
        | TT::AsteriskAsteriskEquals
        | TT::AsteriskEquals
        | TT::BarBarEquals
        | TT::BarEquals
        | TT::CaretEquals
        | TT::ChevronLeftChevronLeftEquals
        | TT::ChevronRightChevronRightChevronRightEquals
        | TT::ChevronRightChevronRightEquals
        | TT::HyphenEquals
        | TT::PercentEquals
        | TT::PlusEquals
        | TT::QuestionQuestionEquals
        | TT::SlashEquals
    )
  }
}

#[derive(Clone, Debug)]
pub struct Token {
  pub loc: Loc,
  // Whether one or more whitespace characters appear immediately before this token, and at least
  // one of those whitespace characters is a line terminator.
  pub preceded_by_line_terminator: bool,
  pub typ: TT,
}

impl Token {
  pub fn error(&self, typ: SyntaxErrorType) -> SyntaxError {
    self.loc.error(typ, Some(self.typ))
  }
}
