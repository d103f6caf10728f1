use anyhow::Context;
use bundle_js::render_error;
use bundle_js::sourcemap::with_source_mapping_url;
use bundle_js::Compiler;
use clap::Parser;
use config::Config;
use config::Flags;
use fetch::HttpFetcher;
use project::load_files;
use std::fs;
use std::io::stdout;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::format::FmtSpan;

mod config;
mod fetch;
mod project;

#[derive(Parser)]
#[command(
  name = "bundle-js",
  author,
  version,
  about = "Bundle a directory of ES modules into one module"
)]
struct Cli {
  /// Directory to bundle. Its index.js is the entry module.
  dir: PathBuf,

  /// Output destination; omit for stdout.
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Print the whole compile result, success or failure, as JSON.
  #[arg(long)]
  json: bool,

  /// Keep every top-level declaration of every module.
  #[arg(long)]
  no_treeshake: bool,

  /// Origin the files are served from. Only URLs on this origin can be imported.
  #[arg(long)]
  origin: Option<String>,

  /// JSON file with `origin`, `treeshake` and `sourcesContent` settings.
  #[arg(long)]
  config: Option<PathBuf>,

  /// Write the source map to this file and link to it from the code.
  #[arg(long, conflicts_with = "inline_source_map")]
  source_map: Option<PathBuf>,

  /// Append the source map to the code as a data URL.
  #[arg(long)]
  inline_source_map: bool,

  /// Leave module sources out of the source map.
  #[arg(long)]
  no_sources_content: bool,

  /// Emit tracing spans (JSON) to stderr.
  #[arg(long)]
  trace: bool,
}

fn init_tracing(enabled: bool) {
  if !enabled {
    return;
  }
  let _ = tracing_subscriber::fmt()
    .with_span_events(FmtSpan::CLOSE)
    .with_max_level(Level::DEBUG)
    .json()
    .with_ansi(false)
    .with_writer(std::io::stderr)
    .try_init();
}

fn write_output(dest: Option<&Path>, text: &str) -> anyhow::Result<()> {
  match dest {
    Some(p) => fs::write(p, text).with_context(|| format!("failed to write {}", p.display())),
    None => stdout()
      .write_all(text.as_bytes())
      .context("failed to write to stdout"),
  }
}

fn run(args: Cli) -> anyhow::Result<ExitCode> {
  let config = match &args.config {
    Some(path) => Config::load(path)?,
    None => Config::default(),
  };
  let settings = config.merge(&Flags {
    origin: args.origin.clone(),
    no_treeshake: args.no_treeshake,
    no_sources_content: args.no_sources_content,
  })?;
  let files = load_files(&args.dir)?;
  let fetcher = HttpFetcher::new().context("failed to create HTTP client")?;
  let compiler = Compiler::new(settings.origin, Arc::new(fetcher));
  let result = compiler.compile(&files, settings.options);

  if args.json {
    let mut json = serde_json::to_string_pretty(&result).context("failed to serialize result")?;
    json.push('\n');
    write_output(args.output.as_deref(), &json)?;
    return Ok(if result.is_success() {
      ExitCode::SUCCESS
    } else {
      ExitCode::FAILURE
    });
  };

  let bundle = match result.into_result() {
    Ok(bundle) => bundle,
    Err(err) => {
      eprint!("{}", render_error(&files, &err));
      return Ok(ExitCode::FAILURE);
    }
  };
  let code = if args.inline_source_map {
    let url = bundle
      .map
      .to_data_url()
      .context("failed to serialize source map")?;
    with_source_mapping_url(&bundle.code, &url)
  } else if let Some(path) = &args.source_map {
    let json = bundle.map.to_json().context("failed to serialize source map")?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    let url = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_else(|| path.display().to_string());
    with_source_mapping_url(&bundle.code, &url)
  } else {
    bundle.code
  };
  write_output(args.output.as_deref(), &code)?;
  Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
  let args = Cli::parse();
  init_tracing(args.trace);
  match run(args) {
    Ok(code) => code,
    Err(err) => {
      eprintln!("error: {err:#}");
      ExitCode::FAILURE
    }
  }
}
