use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::token::TT;
use std::cmp::max;
use std::cmp::min;
use std::ops::Add;
use std::ops::AddAssign;

/// A location within the current source file expressed as UTF-8 byte offsets.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub struct Loc(pub usize, pub usize);

impl Loc {
  pub fn error(self, typ: SyntaxErrorType, actual_token: Option<TT>) -> SyntaxError {
    SyntaxError::new(typ, self, actual_token)
  }

  pub fn is_empty(&self) -> bool {
    self.0 >= self.1
  }

  pub fn len(&self) -> usize {
    self.1.saturating_sub(self.0)
  }

  pub fn contains(&self, offset: usize) -> bool {
    offset >= self.0 && offset < self.1
  }

  pub fn extend(&mut self, other: Loc) {
    self.0 = min(self.0, other.0);
    self.1 = max(self.1, other.1);
  }
}

impl Add for Loc {
  type Output = Loc;

  fn add(self, rhs: Self) -> Self::Output {
    let mut new = self;
    new.extend(rhs);
    new
  }
}

impl AddAssign for Loc {
  fn add_assign(&mut self, rhs: Self) {
    self.extend(rhs);
  }
}

/// A zero-based line and column. Columns count UTF-16 code units, which is what JavaScript engines
/// report in stack traces and what source maps expect.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct LineCol {
  pub line: u32,
  pub col: u32,
}

/// Precomputed line starts for converting byte offsets into [`LineCol`] positions.
pub struct LineIndex<'a> {
  text: &'a str,
  starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
  pub fn new(text: &'a str) -> Self {
    let mut starts = vec![0];
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
      match bytes[i] {
        b'\n' => starts.push(i + 1),
        b'\r' => {
          // CRLF is a single line terminator.
          if bytes.get(i + 1) != Some(&b'\n') {
            starts.push(i + 1);
          }
        }
        // U+2028 and U+2029 are E2 80 A8 and E2 80 A9.
        0xE2 if bytes.get(i + 1) == Some(&0x80) && matches!(bytes.get(i + 2), Some(0xA8 | 0xA9)) => {
          starts.push(i + 3);
          i += 2;
        }
        _ => {}
      };
      i += 1;
    }
    Self { text, starts }
  }

  pub fn line_count(&self) -> usize {
    self.starts.len()
  }

  pub fn line_start(&self, line: usize) -> usize {
    self.starts.get(line).copied().unwrap_or(self.text.len())
  }

  pub fn line_col(&self, offset: usize) -> LineCol {
    let offset = clamp_to_char_boundary(self.text, offset);
    let line = match self.starts.binary_search(&offset) {
      Ok(i) => i,
      Err(i) => i - 1,
    };
    let col = self.text[self.starts[line]..offset]
      .chars()
      .map(char::len_utf16)
      .sum::<usize>();
    LineCol {
      line: line as u32,
      col: col as u32,
    }
  }
}

fn clamp_to_char_boundary(text: &str, offset: usize) -> usize {
  let mut offset = offset.min(text.len());
  while offset > 0 && !text.is_char_boundary(offset) {
    offset -= 1;
  }
  offset
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn extends_to_cover_both_ranges() {
    let mut loc = Loc(4, 10);
    loc += Loc(1, 6);
    assert_eq!(loc, Loc(1, 10));
    assert_eq!(Loc(3, 5) + Loc(8, 9), Loc(3, 9));
  }

  #[test]
  fn maps_offsets_to_lines_and_utf16_columns() {
    let text = "let a;\r\nlet é = '😀';\nx";
    let index = LineIndex::new(text);
    assert_eq!(index.line_count(), 3);
    assert_eq!(index.line_col(0), LineCol { line: 0, col: 0 });
    assert_eq!(index.line_col(4), LineCol { line: 0, col: 4 });
    let quote = text.find('\'').unwrap();
    assert_eq!(index.line_col(quote), LineCol { line: 1, col: 8 });
    // The emoji is two UTF-16 code units.
    assert_eq!(index.line_col(quote + 1 + 4), LineCol { line: 1, col: 11 });
    assert_eq!(index.line_col(text.len() - 1), LineCol { line: 2, col: 0 });
  }

  #[test]
  fn unicode_line_separators_start_new_lines() {
    let index = LineIndex::new("a\u{2028}b");
    assert_eq!(index.line_count(), 2);
    assert_eq!(index.line_col(4), LineCol { line: 1, col: 0 });
  }
}
