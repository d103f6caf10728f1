use super::Parser;
use crate::error::SyntaxResult;
use crate::token::TT;

impl<'a> Parser<'a> {
  /// Parse a list of items separated by a delimiter until `close`, which will also be consumed.
  /// Allows for a trailing delimiter.
  pub fn list<F>(&mut self, delim: TT, close: TT, mut f: F) -> SyntaxResult<()>
  where
    F: FnMut(&mut Self) -> SyntaxResult<()>,
  {
    while !self.consume_if(close).is_match() {
      f(self)?;
      // We require either the delimiter or the close token.
      // If the delimiter exists, it can still immediately be followed by the close token (trailing delimiter).
      if !self.consume_if(delim).is_match() {
        self.require(close)?;
        break;
      }
    }
    Ok(())
  }

  /// Drives the parser with the closure and returns what it returns, undoing its changes if it returns None.
  pub fn rewindable<S, F>(&mut self, f: F) -> SyntaxResult<Option<S>>
  where
    F: FnOnce(&mut Self) -> SyntaxResult<Option<S>>,
  {
    let checkpoint = self.checkpoint();
    let stx = f(self)?;
    if stx.is_none() {
      self.restore_checkpoint(checkpoint);
    };
    Ok(stx)
  }
}
