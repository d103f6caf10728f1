use serde::Serialize;
use serde::Serializer;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;
use url::Url;

/// Canonical identity of a module after resolution: a key of the virtual file set, or an absolute HTTP(S) URL
/// in WHATWG serialized form.
#[derive(Clone, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub enum ModuleId {
  Virtual(String),
  Remote(Url),
}

impl ModuleId {
  pub fn as_str(&self) -> &str {
    match self {
      ModuleId::Virtual(path) => path,
      ModuleId::Remote(url) => url.as_str(),
    }
  }

  pub fn is_remote(&self) -> bool {
    matches!(self, ModuleId::Remote(_))
  }

  /// A short name derived from the last path segment without its extension, usable as the start of an
  /// identifier, e.g. `my_lib` for `/lib/my-lib.js`.
  pub fn stem(&self) -> String {
    let path = match self {
      ModuleId::Virtual(path) => path.as_str(),
      ModuleId::Remote(url) => url.path(),
    };
    identifier_stem(path)
  }
}

pub(crate) fn identifier_stem(path: &str) -> String {
  let file = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or("");
  let file = match file.find('.') {
    Some(0) | None => file,
    Some(i) => &file[..i],
  };
  let mut out: String = file
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
        c
      } else {
        '_'
      }
    })
    .collect();
  if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
    out.insert(0, '_');
  };
  out
}

impl Display for ModuleId {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl Serialize for ModuleId {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn stems() {
    assert_eq!(ModuleId::Virtual("/index.js".into()).stem(), "index");
    assert_eq!(ModuleId::Virtual("/lib/my-lib.min.js".into()).stem(), "my_lib");
    assert_eq!(ModuleId::Virtual("/3d.js".into()).stem(), "_3d");
    let url = Url::parse("https://editor.example/vendor/noise.mjs?v=2").unwrap();
    assert_eq!(ModuleId::Remote(url).stem(), "noise");
  }

  #[test]
  fn remote_ids_use_normalized_urls() {
    let url = Url::parse("HTTPS://Editor.Example/a/../b.js").unwrap();
    assert_eq!(ModuleId::Remote(url).as_str(), "https://editor.example/b.js");
  }
}
