use crate::id::ModuleId;
use parse_js::error::SyntaxError;
use parse_js::loc::LineIndex;
use parse_js::loc::Loc;
use serde::Serialize;
use thiserror::Error;
use url::Url;

/// Why a deliberately rejected specifier was rejected.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ResolutionKind {
  CrossOrigin,
  InvalidUrl,
}

/// Category of a failed compile. Every failure path ends up as exactly one of these.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ErrorKind {
  Resolution(ResolutionKind),
  Load,
  Parse,
  Link,
  Cancelled,
  Internal,
}

impl ErrorKind {
  pub fn as_str(&self) -> &'static str {
    match self {
      ErrorKind::Resolution(_) => "resolution",
      ErrorKind::Load => "load",
      ErrorKind::Parse => "parse",
      ErrorKind::Link => "link",
      ErrorKind::Cancelled => "cancelled",
      ErrorKind::Internal => "internal",
    }
  }

  pub fn sub_kind(&self) -> Option<&'static str> {
    match self {
      ErrorKind::Resolution(ResolutionKind::CrossOrigin) => Some("cross_origin"),
      ErrorKind::Resolution(ResolutionKind::InvalidUrl) => Some("invalid_url"),
      _ => None,
    }
  }
}

/// Stable diagnostic codes. Syntax errors keep the `PS` codes of `parse-js`.
pub mod codes {
  pub const CROSS_ORIGIN: &str = "BJ0001";
  pub const INVALID_URL: &str = "BJ0002";
  pub const FETCH_FAILED: &str = "BJ0003";
  pub const MISSING_FILE: &str = "BJ0004";
  pub const MISSING_EXPORT: &str = "BJ0101";
  pub const UNDECLARED_EXPORT: &str = "BJ0102";
  pub const CIRCULAR_REEXPORT: &str = "BJ0103";
  pub const DUPLICATE_EXPORT: &str = "BJ0104";
  pub const CANCELLED: &str = "BJ0900";
  pub const INTERNAL: &str = "BJ0999";
}

/// Line and column of an error in the module's source. Lines start at 1, columns at 0 and count UTF-16 code
/// units.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct Position {
  pub line: u32,
  pub column: u32,
}

impl Position {
  pub fn from_offset(source: &str, offset: usize) -> Position {
    let lc = LineIndex::new(source).line_col(offset);
    Position {
      line: lc.line + 1,
      column: lc.col,
    }
  }
}

/// The error half of a compile result.
#[derive(Clone, PartialEq, Eq, Debug, Error)]
#[error("{message}")]
pub struct CompileError {
  pub kind: ErrorKind,
  pub code: &'static str,
  pub message: String,
  pub module: Option<ModuleId>,
  pub position: Option<Position>,
  // Byte range within the module's source, for rendering.
  pub span: Option<Loc>,
}

impl CompileError {
  pub fn new(kind: ErrorKind, code: &'static str, message: impl Into<String>) -> CompileError {
    CompileError {
      kind,
      code,
      message: message.into(),
      module: None,
      position: None,
      span: None,
    }
  }

  pub fn in_module(mut self, module: ModuleId) -> CompileError {
    self.module = Some(module);
    self
  }

  /// Attaches a location within `source`, which must be the text of the error's module.
  pub fn at(mut self, source: &str, loc: Loc) -> CompileError {
    self.position = Some(Position::from_offset(source, loc.0));
    self.span = Some(loc);
    self
  }

  pub fn cancelled() -> CompileError {
    CompileError::new(ErrorKind::Cancelled, codes::CANCELLED, "compilation was cancelled")
  }

  pub fn internal(message: impl Into<String>) -> CompileError {
    CompileError::new(
      ErrorKind::Internal,
      codes::INTERNAL,
      format!("internal compiler error: {}", message.into()),
    )
  }

  pub fn syntax(module: ModuleId, source: &str, err: &SyntaxError) -> CompileError {
    CompileError::new(ErrorKind::Parse, err.typ.code(), err.message())
      .in_module(module)
      .at(source, err.loc)
  }

  pub fn link(code: &'static str, message: impl Into<String>) -> CompileError {
    CompileError::new(ErrorKind::Link, code, message)
  }
}

#[derive(Serialize)]
struct CompileErrorJson<'a> {
  kind: &'static str,
  #[serde(skip_serializing_if = "Option::is_none")]
  sub_kind: Option<&'static str>,
  code: &'static str,
  message: &'a str,
  module: Option<&'a ModuleId>,
  position: Option<Position>,
}

impl Serialize for CompileError {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    CompileErrorJson {
      kind: self.kind.as_str(),
      sub_kind: self.kind.sub_kind(),
      code: self.code,
      message: &self.message,
      module: self.module.as_ref(),
      position: self.position,
    }
    .serialize(serializer)
  }
}

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum FetchError {
  #[error("HTTP {status} for URL: {url}")]
  Status { status: u16, url: String },
  #[error("request for {url} failed: {reason}")]
  Network { url: String, reason: String },
}

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum ResolveError {
  #[error("`{specifier}` is not a valid URL: {reason}")]
  InvalidUrl {
    specifier: String,
    reason: url::ParseError,
  },
  #[error("`{url}` is not on the same origin as the editor ({origin}), so it can't be imported")]
  CrossOrigin { url: Url, origin: String },
}

impl ResolveError {
  pub fn kind(&self) -> ResolutionKind {
    match self {
      ResolveError::InvalidUrl { .. } => ResolutionKind::InvalidUrl,
      ResolveError::CrossOrigin { .. } => ResolutionKind::CrossOrigin,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      ResolveError::InvalidUrl { .. } => codes::INVALID_URL,
      ResolveError::CrossOrigin { .. } => codes::CROSS_ORIGIN,
    }
  }
}

impl From<ResolveError> for CompileError {
  fn from(err: ResolveError) -> Self {
    CompileError::new(ErrorKind::Resolution(err.kind()), err.code(), err.to_string())
  }
}

#[derive(Clone, PartialEq, Eq, Debug, Error)]
pub enum LoadError {
  #[error(transparent)]
  Fetch(#[from] FetchError),
  #[error("file `{0}` does not exist")]
  Missing(String),
}

impl From<LoadError> for CompileError {
  fn from(err: LoadError) -> Self {
    let code = match err {
      LoadError::Fetch(_) => codes::FETCH_FAILED,
      LoadError::Missing(_) => codes::MISSING_FILE,
    };
    CompileError::new(ErrorKind::Load, code, err.to_string())
  }
}
