pub const ECMASCRIPT_LINE_TERMINATORS: [char; 4] = ['\n', '\r', '\u{2028}', '\u{2029}'];

pub const ECMASCRIPT_WHITESPACE: [char; 21] = [
  '\x09', // Horizontal tab
  '\x0b', // Vertical tab
  '\x0c', // Form feed
  '\x20', // Space
  '\u{00A0}', // NO-BREAK SPACE
  '\u{1680}', // OGHAM SPACE MARK
  '\u{2000}', // EN QUAD
  '\u{2001}', // EM QUAD
  '\u{2002}', // EN SPACE
  '\u{2003}', // EM SPACE
  '\u{2004}', // THREE-PER-EM SPACE
  '\u{2005}', // FOUR-PER-EM SPACE
  '\u{2006}', // SIX-PER-EM SPACE
  '\u{2007}', // FIGURE SPACE
  '\u{2008}', // PUNCTUATION SPACE
  '\u{2009}', // THIN SPACE
  '\u{200A}', // HAIR SPACE
  '\u{202F}', // NARROW NO-BREAK SPACE
  '\u{205F}', // MEDIUM MATHEMATICAL SPACE
  '\u{3000}', // IDEOGRAPHIC SPACE
  '\u{FEFF}', // ZERO WIDTH NO-BREAK SPACE (BOM)
];

const ZWNJ: char = '\u{200C}';
const ZWJ: char = '\u{200D}';

#[inline]
pub fn is_line_terminator(c: char) -> bool {
  ECMASCRIPT_LINE_TERMINATORS.contains(&c)
}

#[inline]
pub fn is_whitespace(c: char) -> bool {
  ECMASCRIPT_WHITESPACE.contains(&c)
}

// Non-ASCII ranges use Unicode alphabetic/alphanumeric properties, which is a close superset of
// ID_Start/ID_Continue for the scripts seen in practice.
#[inline]
pub fn is_id_start(c: char) -> bool {
  c.is_ascii_alphabetic() || c == '$' || c == '_' || (!c.is_ascii() && c.is_alphabetic())
}

#[inline]
pub fn is_id_continue(c: char) -> bool {
  c.is_ascii_alphanumeric()
    || c == '$'
    || c == '_'
    || c == ZWNJ
    || c == ZWJ
    || (!c.is_ascii() && c.is_alphanumeric())
}

#[inline]
pub fn is_digit(c: char, radix: u32) -> bool {
  c == '_' || c.is_digit(radix)
}
