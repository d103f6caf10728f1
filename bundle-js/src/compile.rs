use crate::emit::emit;
use crate::error::CompileError;
use crate::graph::ModuleGraph;
use crate::host::Fetcher;
use crate::host::NoFetcher;
use crate::host::VirtualFileSet;
use crate::host::VirtualHost;
use crate::link::link;
use crate::options::CompileOptions;
use crate::rename::assign_names;
use crate::rename::naming_order;
use crate::sourcemap::SourceMap;
use crate::treeshake::shake;
use serde::Serialize;
use std::any::Any;
use std::panic::catch_unwind;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::debug;
use tracing::debug_span;
use url::Origin;

/// The output of a successful compile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bundle {
  pub code: String,
  pub map: SourceMap,
}

/// Exactly one of a bundle or an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompileResult {
  Success(Bundle),
  Failure(CompileError),
}

impl CompileResult {
  pub fn is_success(&self) -> bool {
    matches!(self, CompileResult::Success(_))
  }

  pub fn code(&self) -> Option<&str> {
    match self {
      CompileResult::Success(b) => Some(&b.code),
      CompileResult::Failure(_) => None,
    }
  }

  pub fn map(&self) -> Option<&SourceMap> {
    match self {
      CompileResult::Success(b) => Some(&b.map),
      CompileResult::Failure(_) => None,
    }
  }

  pub fn error(&self) -> Option<&CompileError> {
    match self {
      CompileResult::Success(_) => None,
      CompileResult::Failure(e) => Some(e),
    }
  }

  pub fn into_result(self) -> Result<Bundle, CompileError> {
    match self {
      CompileResult::Success(b) => Ok(b),
      CompileResult::Failure(e) => Err(e),
    }
  }
}

impl From<Result<Bundle, CompileError>> for CompileResult {
  fn from(res: Result<Bundle, CompileError>) -> Self {
    match res {
      Ok(b) => CompileResult::Success(b),
      Err(e) => CompileResult::Failure(e),
    }
  }
}

#[derive(Serialize)]
struct CompileResultJson<'a> {
  code: Option<&'a str>,
  map: Option<&'a SourceMap>,
  error: Option<&'a CompileError>,
}

impl Serialize for CompileResult {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    CompileResultJson {
      code: self.code(),
      map: self.map(),
      error: self.error(),
    }
    .serialize(serializer)
  }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
  if let Some(msg) = payload.downcast_ref::<&str>() {
    msg.to_string()
  } else if let Some(msg) = payload.downcast_ref::<String>() {
    msg.clone()
  } else {
    "unknown panic".to_string()
  }
}

/// Compiles the editor's files into one module. Holds what stays the same across compiles: the origin the
/// editor is served from and the network access used for remote modules.
pub struct Compiler {
  origin: Origin,
  fetcher: Arc<dyn Fetcher>,
}

impl Compiler {
  pub fn new(origin: Origin, fetcher: Arc<dyn Fetcher>) -> Self {
    Self { origin, fetcher }
  }

  /// A compiler that fails every remote load.
  pub fn offline(origin: Origin) -> Self {
    Self::new(origin, Arc::new(NoFetcher))
  }

  pub fn origin(&self) -> &Origin {
    &self.origin
  }

  /// Bundles the module graph rooted at [`ENTRY_PATH`](crate::ENTRY_PATH). Never panics: every failure,
  /// including a bug in the compiler itself, comes back as [`CompileResult::Failure`].
  pub fn compile(&self, files: &VirtualFileSet, options: CompileOptions) -> CompileResult {
    let _span = debug_span!("compile", files = files.len(), treeshake = options.treeshake).entered();
    match catch_unwind(AssertUnwindSafe(|| self.try_compile(files, &options))) {
      Ok(res) => res.into(),
      Err(payload) => CompileResult::Failure(CompileError::internal(panic_message(&*payload))),
    }
  }

  fn try_compile(&self, files: &VirtualFileSet, options: &CompileOptions) -> Result<Bundle, CompileError> {
    let cancel_point = || {
      if options.is_cancelled() {
        Err(CompileError::cancelled())
      } else {
        Ok(())
      }
    };
    let host = VirtualHost::new(files, &self.origin, &*self.fetcher);
    let graph = {
      let _span = debug_span!("graph").entered();
      ModuleGraph::build(&host, options)?
    };
    cancel_point()?;
    let linked = {
      let _span = debug_span!("link").entered();
      link(&graph)?
    };
    cancel_point()?;
    let (shaken, names) = {
      let _span = debug_span!("shake").entered();
      let shaken = shake(&graph, &linked, options.treeshake);
      let names = assign_names(&graph, &linked, &shaken);
      (shaken, names)
    };
    cancel_point()?;
    let output = {
      let _span = debug_span!("emit").entered();
      emit(
        &graph,
        &linked,
        &shaken,
        &names,
        &naming_order(&graph),
        options.sources_content,
      )?
    };
    debug!(bytes = output.code.len(), modules = graph.modules.len(), "compiled bundle");
    Ok(Bundle {
      code: output.code,
      map: output.map,
    })
  }
}

/// Compiles `files` with default options besides `treeshake`.
pub fn compile(
  files: &VirtualFileSet,
  origin: Origin,
  fetcher: Arc<dyn Fetcher>,
  treeshake: bool,
) -> CompileResult {
  Compiler::new(origin, fetcher).compile(files, CompileOptions::new().with_treeshake(treeshake))
}
