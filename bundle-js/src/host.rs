use crate::error::FetchError;
use crate::error::LoadError;
use crate::error::ResolveError;
use crate::id::ModuleId;
use serde::Deserialize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use tracing::trace;
use url::Origin;
use url::Url;

/// Path of the module that starts execution. It must be a key of the file set.
pub const ENTRY_PATH: &str = "/index.js";

/// The editor's files, keyed by absolute virtual path like `/lib/noise.js`. Ordered so that anything derived
/// from iterating it is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VirtualFileSet {
  files: BTreeMap<String, String>,
}

impl VirtualFileSet {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn insert(&mut self, path: impl Into<String>, text: impl Into<String>) -> Option<String> {
    self.files.insert(path.into(), text.into())
  }

  pub fn get(&self, path: &str) -> Option<&str> {
    self.files.get(path).map(|s| s.as_str())
  }

  pub fn contains(&self, path: &str) -> bool {
    self.files.contains_key(path)
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.files.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VirtualFileSet {
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    let mut set = VirtualFileSet::new();
    for (k, v) in iter {
      set.insert(k, v);
    }
    set
  }
}

/// Network access for remote modules. Only called with URLs on the hosting origin.
pub trait Fetcher: Send + Sync {
  fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

/// A fetcher for environments without network access. Every fetch fails.
#[derive(Clone, Copy, Default, Debug)]
pub struct NoFetcher;

impl Fetcher for NoFetcher {
  fn fetch(&self, url: &Url) -> Result<String, FetchError> {
    Err(FetchError::Network {
      url: url.to_string(),
      reason: "network access is disabled".to_string(),
    })
  }
}

/// Outcome of resolving a specifier that wasn't rejected.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Resolution {
  Module(ModuleId),
  // Not something we can bundle, so the import stays in the output as written.
  External,
}

/// Environment provider for a compile: how specifiers map to modules and where module text comes from.
pub trait ModuleHost: Send + Sync {
  /// Resolve a specifier imported by `importer`.
  fn resolve(&self, specifier: &str, importer: &ModuleId) -> Result<Resolution, ResolveError>;
  /// Return the full text for a module. Called at most once per module per compile.
  fn load(&self, id: &ModuleId) -> Result<Arc<str>, LoadError>;
}

/// The host used for editor compiles: virtual files plus same-origin HTTP modules.
pub struct VirtualHost<'a> {
  files: &'a VirtualFileSet,
  origin: &'a Origin,
  fetcher: &'a dyn Fetcher,
}

fn is_relative(specifier: &str) -> bool {
  specifier.starts_with("./") || specifier.starts_with("../")
}

/// Joins a relative specifier onto the directory of a virtual path, resolving `.` and `..` segments.
pub fn join_virtual(importer: &str, specifier: &str) -> String {
  let mut segments: Vec<&str> = importer.split('/').filter(|s| !s.is_empty()).collect();
  segments.pop();
  for seg in specifier.split('/') {
    match seg {
      "" | "." => {}
      ".." => {
        segments.pop();
      }
      seg => segments.push(seg),
    };
  }
  format!("/{}", segments.join("/"))
}

impl<'a> VirtualHost<'a> {
  pub fn new(files: &'a VirtualFileSet, origin: &'a Origin, fetcher: &'a dyn Fetcher) -> Self {
    Self {
      files,
      origin,
      fetcher,
    }
  }

  fn check_origin(&self, url: Url) -> Result<Resolution, ResolveError> {
    if url.origin() != *self.origin {
      return Err(ResolveError::CrossOrigin {
        url,
        origin: self.origin.ascii_serialization(),
      });
    };
    Ok(Resolution::Module(ModuleId::Remote(url)))
  }
}

impl<'a> ModuleHost for VirtualHost<'a> {
  fn resolve(&self, specifier: &str, importer: &ModuleId) -> Result<Resolution, ResolveError> {
    let res = if specifier.starts_with("http") {
      let url = Url::parse(specifier).map_err(|reason| ResolveError::InvalidUrl {
        specifier: specifier.to_string(),
        reason,
      })?;
      self.check_origin(url)?
    } else if self.files.contains(specifier) {
      Resolution::Module(ModuleId::Virtual(specifier.to_string()))
    } else {
      match importer {
        ModuleId::Remote(base) if is_relative(specifier) || specifier.starts_with('/') => {
          let url = base.join(specifier).map_err(|reason| ResolveError::InvalidUrl {
            specifier: specifier.to_string(),
            reason,
          })?;
          self.check_origin(url)?
        }
        ModuleId::Virtual(path) if is_relative(specifier) => {
          let joined = join_virtual(path, specifier);
          if self.files.contains(&joined) {
            Resolution::Module(ModuleId::Virtual(joined))
          } else {
            Resolution::External
          }
        }
        _ => Resolution::External,
      }
    };
    trace!(specifier, importer = %importer, resolution = ?res, "resolved specifier");
    Ok(res)
  }

  fn load(&self, id: &ModuleId) -> Result<Arc<str>, LoadError> {
    match id {
      ModuleId::Remote(url) => {
        debug!(url = %url, "fetching remote module");
        Ok(Arc::from(self.fetcher.fetch(url)?))
      }
      ModuleId::Virtual(path) => self
        .files
        .get(path)
        .map(Arc::from)
        .ok_or_else(|| LoadError::Missing(path.clone())),
    }
  }
}
