use bundle_js::CompileOptions;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;
use url::Origin;
use url::Url;

pub const DEFAULT_ORIGIN: &str = "http://localhost";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: io::Error },
  #[error("failed to parse {}: {source}", path.display())]
  Parse {
    path: PathBuf,
    source: serde_json::Error,
  },
  #[error("`{origin}` is not a valid origin URL: {source}")]
  InvalidOrigin {
    origin: String,
    source: url::ParseError,
  },
  #[error("`{0}` has no origin that modules could be served from")]
  OpaqueOrigin(String),
}

/// Contents of a `--config` file. Every field is optional; command line flags take precedence.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
  #[serde(default)]
  pub origin: Option<String>,
  #[serde(default)]
  pub treeshake: Option<bool>,
  #[serde(default)]
  pub sources_content: Option<bool>,
}

/// Settings given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Flags {
  pub origin: Option<String>,
  pub no_treeshake: bool,
  pub no_sources_content: bool,
}

pub struct Settings {
  pub origin: Origin,
  pub options: CompileOptions,
}

fn parse_origin(origin: &str) -> Result<Origin, ConfigError> {
  let url = Url::parse(origin).map_err(|source| ConfigError::InvalidOrigin {
    origin: origin.to_string(),
    source,
  })?;
  let origin = url.origin();
  if !origin.is_tuple() {
    return Err(ConfigError::OpaqueOrigin(url.to_string()));
  };
  Ok(origin)
}

impl Config {
  pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  pub fn merge(self, flags: &Flags) -> Result<Settings, ConfigError> {
    let origin = flags
      .origin
      .as_deref()
      .or(self.origin.as_deref())
      .unwrap_or(DEFAULT_ORIGIN);
    let defaults = CompileOptions::default();
    let treeshake = !flags.no_treeshake && self.treeshake.unwrap_or(defaults.treeshake);
    let sources_content =
      !flags.no_sources_content && self.sources_content.unwrap_or(defaults.sources_content);
    Ok(Settings {
      origin: parse_origin(origin)?,
      options: CompileOptions::new()
        .with_treeshake(treeshake)
        .with_sources_content(sources_content),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn flags_override_file() {
    let config: Config =
      serde_json::from_str(r#"{ "origin": "https://a.example", "treeshake": true }"#).unwrap();
    let settings = config
      .merge(&Flags {
        origin: Some("https://b.example:8080/some/path".into()),
        no_treeshake: true,
        no_sources_content: false,
      })
      .unwrap();
    assert_eq!(
      settings.origin.ascii_serialization(),
      "https://b.example:8080"
    );
    assert!(!settings.options.treeshake);
    assert!(settings.options.sources_content);
  }

  #[test]
  fn file_fills_in_defaults() {
    let config: Config =
      serde_json::from_str(r#"{ "treeshake": false, "sourcesContent": false }"#).unwrap();
    let settings = config.merge(&Flags::default()).unwrap();
    assert_eq!(settings.origin.ascii_serialization(), DEFAULT_ORIGIN);
    assert!(!settings.options.treeshake);
    assert!(!settings.options.sources_content);
  }

  #[test]
  fn rejects_bad_config() {
    assert!(serde_json::from_str::<Config>(r#"{ "minify": true }"#).is_err());
    let err = Config::default()
      .merge(&Flags {
        origin: Some("data:text/plain,hi".into()),
        ..Flags::default()
      })
      .err()
      .unwrap();
    assert!(matches!(err, ConfigError::OpaqueOrigin(_)));
    let err = Config::default()
      .merge(&Flags {
        origin: Some("not a url".into()),
        ..Flags::default()
      })
      .err()
      .unwrap();
    assert!(matches!(err, ConfigError::InvalidOrigin { .. }));
  }
}
