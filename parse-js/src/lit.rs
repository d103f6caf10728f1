use crate::char::is_line_terminator;
use std::str::Chars;

fn parse_hex_escape(chars: &mut Chars<'_>, digits: usize) -> Option<char> {
  let mut v = 0u32;
  for _ in 0..digits {
    v = v * 16 + chars.next()?.to_digit(16)?;
  }
  char::from_u32(v)
}

// Handles the part after `\u`.
fn parse_unicode_escape(chars: &mut Chars<'_>) -> Option<char> {
  let mut lookahead = chars.clone();
  if lookahead.next() != Some('{') {
    return parse_hex_escape(chars, 4);
  };
  chars.next();
  let mut v = 0u32;
  loop {
    match chars.next()? {
      '}' => break,
      c => v = v.checked_mul(16)?.checked_add(c.to_digit(16)?)?,
    };
  }
  char::from_u32(v)
}

/// Decodes `\uXXXX` and `\u{X}` escapes in an identifier. Returns the input unchanged if there are none.
pub fn normalize_identifier(raw: &str) -> String {
  if !raw.contains('\\') {
    return raw.to_string();
  };
  let mut out = String::with_capacity(raw.len());
  let mut chars = raw.chars();
  while let Some(c) = chars.next() {
    if c != '\\' {
      out.push(c);
      continue;
    };
    chars.next();
    match parse_unicode_escape(&mut chars) {
      Some(c) => out.push(c),
      None => out.push('\u{FFFD}'),
    };
  }
  out
}

/// Decodes a string literal including its quotes. UTF-16 surrogate pairs written as two escapes are combined; a
/// lone surrogate becomes U+FFFD.
pub fn decode_string_literal(raw: &str) -> Option<String> {
  let mut chars = raw.get(1..raw.len().checked_sub(1)?)?.chars();
  let mut out = String::with_capacity(raw.len());
  let mut pending_high_surrogate: Option<u32> = None;
  while let Some(c) = chars.next() {
    if c != '\\' {
      if pending_high_surrogate.take().is_some() {
        out.push('\u{FFFD}');
      };
      out.push(c);
      continue;
    };
    let c = chars.next()?;
    let decoded = match c {
      'b' => '\u{8}',
      'f' => '\u{C}',
      'n' => '\n',
      'r' => '\r',
      't' => '\t',
      'v' => '\u{B}',
      '0' if !chars.clone().next().is_some_and(|c| c.is_ascii_digit()) => '\0',
      'x' => parse_hex_escape(&mut chars, 2)?,
      'u' => {
        // Surrogates aren't valid chars, so they are decoded by hand.
        let mut lookahead = chars.clone();
        let code = if lookahead.next() == Some('{') {
          parse_unicode_escape(&mut chars)? as u32
        } else {
          let mut v = 0u32;
          for _ in 0..4 {
            v = v * 16 + chars.next()?.to_digit(16)?;
          }
          v
        };
        match code {
          0xD800..=0xDBFF => {
            pending_high_surrogate = Some(code);
            continue;
          }
          0xDC00..=0xDFFF => match pending_high_surrogate.take() {
            Some(high) => char::from_u32(0x10000 + ((high - 0xD800) << 10) + (code - 0xDC00))?,
            None => '\u{FFFD}',
          },
          _ => char::from_u32(code)?,
        }
      }
      '\r' => {
        let mut lookahead = chars.clone();
        if lookahead.next() == Some('\n') {
          chars.next();
        };
        continue;
      }
      c if is_line_terminator(c) => continue,
      c => c,
    };
    if pending_high_surrogate.take().is_some() {
      out.push('\u{FFFD}');
    };
    out.push(decoded);
  }
  if pending_high_surrogate.is_some() {
    out.push('\u{FFFD}');
  };
  Some(out)
}
