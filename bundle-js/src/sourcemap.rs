use ahash::HashMap;
use ahash::HashMapExt;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use parse_js::char::is_line_terminator;
use parse_js::loc::LineCol;
use serde::Deserialize;
use serde::Serialize;

const BASE64_DIGITS: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

static BASE64_VALUES: Lazy<[Option<u8>; 128]> = Lazy::new(|| {
  let mut table = [None; 128];
  for (i, &c) in BASE64_DIGITS.iter().enumerate() {
    table[c as usize] = Some(i as u8);
  }
  table
});

/// A version 3 source map.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
  pub version: u8,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file: Option<String>,
  pub sources: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub sources_content: Option<Vec<Option<String>>>,
  pub names: Vec<String>,
  pub mappings: String,
}

/// A decoded entry of `mappings`. Lines and columns are zero-based; columns count UTF-16 code units.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Mapping {
  pub generated: LineCol,
  pub original: Option<OriginalPosition>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct OriginalPosition {
  pub source: u32,
  pub position: LineCol,
  pub name: Option<u32>,
}

pub fn encode_vlq(out: &mut String, value: i64) {
  let mut v = if value < 0 {
    ((-value as u64) << 1) | 1
  } else {
    (value as u64) << 1
  };
  loop {
    let mut digit = (v & 31) as u8;
    v >>= 5;
    if v > 0 {
      digit |= 32;
    };
    out.push(BASE64_DIGITS[digit as usize] as char);
    if v == 0 {
      break;
    };
  }
}

/// Decodes one VLQ value from the start of `bytes`, returning it with the number of bytes read.
pub fn decode_vlq(bytes: &[u8]) -> Option<(i64, usize)> {
  let mut v: u64 = 0;
  let mut shift = 0;
  for (i, &b) in bytes.iter().enumerate() {
    let digit = (*BASE64_VALUES.get(b as usize)?)? as u64;
    if shift > 60 {
      return None;
    };
    v |= (digit & 31) << shift;
    shift += 5;
    if digit & 32 == 0 {
      let value = (v >> 1) as i64;
      return Some((if v & 1 == 1 { -value } else { value }, i + 1));
    };
  }
  None
}

impl SourceMap {
  pub fn to_json(&self) -> serde_json::Result<String> {
    serde_json::to_string(self)
  }

  pub fn to_data_url(&self) -> serde_json::Result<String> {
    Ok(format!(
      "data:application/json;charset=utf-8;base64,{}",
      STANDARD.encode(self.to_json()?)
    ))
  }

  /// Decodes `mappings`. Returns `None` if it is malformed.
  pub fn decode_mappings(&self) -> Option<Vec<Mapping>> {
    let mut out = Vec::new();
    let (mut source, mut orig_line, mut orig_col, mut name) = (0i64, 0i64, 0i64, 0i64);
    for (line, text) in self.mappings.split(';').enumerate() {
      let mut col = 0i64;
      for segment in text.split(',').filter(|s| !s.is_empty()) {
        let mut fields = Vec::with_capacity(5);
        let mut bytes = segment.as_bytes();
        while !bytes.is_empty() {
          let (value, len) = decode_vlq(bytes)?;
          fields.push(value);
          bytes = &bytes[len..];
        }
        col += fields[0];
        let original = match fields.len() {
          1 => None,
          4 | 5 => {
            source += fields[1];
            orig_line += fields[2];
            orig_col += fields[3];
            let n = if fields.len() == 5 {
              name += fields[4];
              Some(u32::try_from(name).ok()?)
            } else {
              None
            };
            Some(OriginalPosition {
              source: u32::try_from(source).ok()?,
              position: LineCol {
                line: u32::try_from(orig_line).ok()?,
                col: u32::try_from(orig_col).ok()?,
              },
              name: n,
            })
          }
          _ => return None,
        };
        out.push(Mapping {
          generated: LineCol {
            line: line as u32,
            col: u32::try_from(col).ok()?,
          },
          original,
        });
      }
    }
    Some(out)
  }
}

/// Appends a `sourceMappingURL` comment pointing at `url` to `code`.
pub fn with_source_mapping_url(code: &str, url: &str) -> String {
  let mut out = String::with_capacity(code.len() + url.len() + 24);
  out.push_str(code);
  if !code.is_empty() && !code.ends_with('\n') {
    out.push('\n');
  };
  out.push_str("//# sourceMappingURL=");
  out.push_str(url);
  out.push('\n');
  out
}

/// Builds `mappings` while the output is written. The builder tracks the current output position; callers
/// report text as it is appended, and add a mapping before text that came from a source.
#[derive(Default)]
pub struct SourceMapBuilder {
  sources: Vec<String>,
  sources_content: Vec<Option<String>>,
  names: Vec<String>,
  name_indices: HashMap<String, u32>,
  mappings: String,
  line: u32,
  col: u32,
  after_cr: bool,
  line_has_segment: bool,
  prev_col: i64,
  prev_source: i64,
  prev_orig_line: i64,
  prev_orig_col: i64,
  prev_name: i64,
  // Last mapping written, to avoid repeating it for the same output position.
  last: Option<(u32, u32)>,
}

impl SourceMapBuilder {
  pub fn new() -> Self {
    Self {
      name_indices: HashMap::new(),
      ..Default::default()
    }
  }

  pub fn add_source(&mut self, path: &str, content: Option<&str>) -> u32 {
    self.sources.push(path.to_string());
    self.sources_content.push(content.map(|c| c.to_string()));
    (self.sources.len() - 1) as u32
  }

  fn name_index(&mut self, name: &str) -> u32 {
    if let Some(&i) = self.name_indices.get(name) {
      return i;
    };
    let i = self.names.len() as u32;
    self.names.push(name.to_string());
    self.name_indices.insert(name.to_string(), i);
    i
  }

  /// Maps the current output position to `original` in `source`.
  pub fn add_mapping(&mut self, source: u32, original: LineCol, name: Option<&str>) {
    if self.last == Some((self.line, self.col)) {
      return;
    };
    self.last = Some((self.line, self.col));
    if self.line_has_segment {
      self.mappings.push(',');
    };
    self.line_has_segment = true;
    encode_vlq(&mut self.mappings, self.col as i64 - self.prev_col);
    self.prev_col = self.col as i64;
    encode_vlq(&mut self.mappings, source as i64 - self.prev_source);
    self.prev_source = source as i64;
    encode_vlq(&mut self.mappings, original.line as i64 - self.prev_orig_line);
    self.prev_orig_line = original.line as i64;
    encode_vlq(&mut self.mappings, original.col as i64 - self.prev_orig_col);
    self.prev_orig_col = original.col as i64;
    if let Some(name) = name {
      let i = self.name_index(name) as i64;
      encode_vlq(&mut self.mappings, i - self.prev_name);
      self.prev_name = i;
    };
  }

  /// Moves the output position past `text`.
  pub fn advance(&mut self, text: &str) {
    for c in text.chars() {
      if c == '\n' && self.after_cr {
        self.after_cr = false;
        continue;
      };
      self.after_cr = c == '\r';
      if is_line_terminator(c) {
        self.mappings.push(';');
        self.line += 1;
        self.col = 0;
        self.prev_col = 0;
        self.line_has_segment = false;
      } else {
        self.col += c.len_utf16() as u32;
      };
    }
  }

  pub fn build(self, file: Option<String>, include_content: bool) -> SourceMap {
    SourceMap {
      version: 3,
      file,
      sources: self.sources,
      sources_content: include_content.then_some(self.sources_content),
      names: self.names,
      mappings: self.mappings,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn vlq_matches_known_encodings() {
    let mut out = String::new();
    for v in [0, 1, -1, 15, 16, -16, 1000] {
      encode_vlq(&mut out, v);
      out.push(' ');
    }
    assert_eq!(out, "A C D e gB hB w+B ");
    assert_eq!(decode_vlq(b"w+B"), Some((1000, 3)));
    assert_eq!(decode_vlq(b"hB,"), Some((-16, 2)));
    assert_eq!(decode_vlq(b"g"), None);
  }

  #[test]
  fn builder_tracks_lines_and_utf16_columns() {
    let mut b = SourceMapBuilder::new();
    let src = b.add_source("/index.js", Some("let é = 1;"));
    b.add_mapping(src, LineCol { line: 0, col: 0 }, None);
    b.advance("let ");
    b.add_mapping(src, LineCol { line: 0, col: 4 }, Some("é"));
    b.advance("é$1 = '😀';\r\n");
    b.add_mapping(src, LineCol { line: 0, col: 8 }, None);
    b.advance("x");
    let map = b.build(Some("bundle.js".into()), true);
    assert_eq!(map.names, vec!["é"]);
    let decoded = map.decode_mappings().unwrap();
    assert_eq!(decoded.len(), 3);
    assert_eq!(decoded[1].generated, LineCol { line: 0, col: 4 });
    assert_eq!(decoded[1].original.unwrap().name, Some(0));
    assert_eq!(decoded[2].generated, LineCol { line: 1, col: 0 });
    assert_eq!(decoded[2].original.unwrap().position, LineCol { line: 0, col: 8 });
  }

  #[test]
  fn serializes_as_v3_json() {
    let map = SourceMap {
      version: 3,
      file: None,
      sources: vec!["/index.js".into()],
      sources_content: None,
      names: vec![],
      mappings: "AAAA".into(),
    };
    assert_eq!(
      map.to_json().unwrap(),
      r#"{"version":3,"sources":["/index.js"],"names":[],"mappings":"AAAA"}"#
    );
    let url = map.to_data_url().unwrap();
    assert!(url.starts_with("data:application/json;charset=utf-8;base64,eyJ2ZXJzaW9uIjoz"));
    assert_eq!(
      with_source_mapping_url("x;", "a.map"),
      "x;\n//# sourceMappingURL=a.map\n"
    );
  }
}
