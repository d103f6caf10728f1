//! Bundles an in-memory set of ES modules, plus any same-origin modules they import over HTTP, into a single
//! module with a source map.
//!
//! ```
//! use bundle_js::{Compiler, CompileOptions, VirtualFileSet};
//! use url::Url;
//!
//! let files: VirtualFileSet = [
//!   ("/index.js", "import { double } from \"./lib.js\";\nconsole.log(double(2));\n"),
//!   ("/lib.js", "export const double = (x) => x * 2;\nexport const unused = 1;\n"),
//! ]
//! .into_iter()
//! .collect();
//! let compiler = Compiler::offline(Url::parse("https://editor.example").unwrap().origin());
//! let bundle = compiler.compile(&files, CompileOptions::new()).into_result().unwrap();
//! assert!(bundle.code.contains("const double = (x) => x * 2;"));
//! assert!(!bundle.code.contains("unused"));
//! ```

pub use compile::compile;
pub use compile::Bundle;
pub use compile::CompileResult;
pub use compile::Compiler;
pub use diagnostic::render_error;
pub use error::CompileError;
pub use error::ErrorKind;
pub use error::FetchError;
pub use error::ResolutionKind;
pub use host::Fetcher;
pub use host::ModuleHost;
pub use host::NoFetcher;
pub use host::VirtualFileSet;
pub use host::VirtualHost;
pub use host::ENTRY_PATH;
pub use id::ModuleId;
pub use options::CancelToken;
pub use options::CompileOptions;
pub use sourcemap::SourceMap;

mod compile;
pub mod diagnostic;
mod emit;
pub mod error;
mod graph;
pub mod host;
mod id;
mod link;
pub mod options;
mod rename;
pub mod sourcemap;
mod treeshake;
