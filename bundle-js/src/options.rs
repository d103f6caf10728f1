use serde::Deserialize;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Lets the caller abort a compile from another thread. Checked before every load and between phases.
#[derive(Clone, Default, Debug)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn cancel(&self) {
    self.0.store(true, Ordering::Relaxed);
  }

  pub fn is_cancelled(&self) -> bool {
    self.0.load(Ordering::Relaxed)
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct CompileOptions {
  /// Drop top-level declarations of non-entry modules that nothing uses.
  pub treeshake: bool,
  /// Embed every module's source text in the source map.
  pub sources_content: bool,
  #[serde(skip)]
  pub cancel: Option<CancelToken>,
}

impl Default for CompileOptions {
  fn default() -> Self {
    Self {
      treeshake: true,
      sources_content: true,
      cancel: None,
    }
  }
}

impl CompileOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_treeshake(mut self, treeshake: bool) -> Self {
    self.treeshake = treeshake;
    self
  }

  pub fn with_sources_content(mut self, sources_content: bool) -> Self {
    self.sources_content = sources_content;
    self
  }

  pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
    self.cancel = Some(cancel);
    self
  }

  pub(crate) fn is_cancelled(&self) -> bool {
    self.cancel.as_ref().is_some_and(|c| c.is_cancelled())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn deserializes_with_defaults() {
    let opts: CompileOptions = serde_json::from_str(r#"{ "treeshake": false }"#).unwrap();
    assert!(!opts.treeshake);
    assert!(opts.sources_content);
    assert!(opts.cancel.is_none());
    assert!(serde_json::from_str::<CompileOptions>(r#"{ "minify": true }"#).is_err());
  }

  #[test]
  fn cancel_is_shared_between_clones() {
    let token = CancelToken::new();
    let opts = CompileOptions::new().with_cancel(token.clone());
    assert!(!opts.is_cancelled());
    token.cancel();
    assert!(opts.is_cancelled());
  }
}
