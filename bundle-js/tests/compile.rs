use bundle_js::error::codes;
use bundle_js::render_error;
use bundle_js::Bundle;
use bundle_js::CancelToken;
use bundle_js::CompileOptions;
use bundle_js::CompileResult;
use bundle_js::Compiler;
use bundle_js::ErrorKind;
use bundle_js::FetchError;
use bundle_js::Fetcher;
use bundle_js::ModuleId;
use bundle_js::ResolutionKind;
use bundle_js::VirtualFileSet;
use parse_js::loc::LineIndex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use url::Origin;
use url::Url;

const ORIGIN: &str = "https://editor.example";

#[derive(Default)]
struct FakeFetcher {
  responses: HashMap<String, Result<String, u16>>,
  calls: Mutex<Vec<String>>,
  // Cancelled as soon as anything is fetched.
  cancel_on_fetch: Option<CancelToken>,
}

impl FakeFetcher {
  fn with(mut self, url: &str, response: Result<&str, u16>) -> Self {
    self
      .responses
      .insert(url.to_string(), response.map(|s| s.to_string()));
    self
  }

  fn cancelling(mut self, cancel: CancelToken) -> Self {
    self.cancel_on_fetch = Some(cancel);
    self
  }

  fn calls(&self) -> Vec<String> {
    self.calls.lock().unwrap().clone()
  }
}

impl Fetcher for FakeFetcher {
  fn fetch(&self, url: &Url) -> Result<String, FetchError> {
    self.calls.lock().unwrap().push(url.to_string());
    if let Some(cancel) = &self.cancel_on_fetch {
      cancel.cancel();
    };
    match self.responses.get(url.as_str()) {
      Some(Ok(text)) => Ok(text.clone()),
      Some(Err(status)) => Err(FetchError::Status {
        status: *status,
        url: url.to_string(),
      }),
      None => Err(FetchError::Status {
        status: 404,
        url: url.to_string(),
      }),
    }
  }
}

fn origin() -> Origin {
  Url::parse(ORIGIN).unwrap().origin()
}

fn files(entries: &[(&str, &str)]) -> VirtualFileSet {
  entries.iter().copied().collect()
}

fn compile_with(files: &VirtualFileSet, fetcher: Arc<FakeFetcher>, options: CompileOptions) -> CompileResult {
  Compiler::new(origin(), fetcher).compile(files, options)
}

fn compile(files: &VirtualFileSet, treeshake: bool) -> CompileResult {
  compile_with(
    files,
    Arc::new(FakeFetcher::default()),
    CompileOptions::new().with_treeshake(treeshake),
  )
}

fn bundle(files: &VirtualFileSet) -> Bundle {
  match compile(files, true) {
    CompileResult::Success(bundle) => bundle,
    CompileResult::Failure(err) => panic!("compile failed: {}", render_error(files, &err)),
  }
}

#[test]
fn entry_without_imports_is_emitted_as_is() {
  let files = files(&[("/index.js", "const a = 1;\nconsole.log(a);\n")]);
  let bundle = bundle(&files);
  assert_eq!(bundle.code, "const a = 1;\nconsole.log(a);\n");
  assert_eq!(bundle.map.sources, vec!["/index.js"]);
  assert_eq!(
    bundle.map.sources_content,
    Some(vec![Some("const a = 1;\nconsole.log(a);\n".to_string())])
  );
}

#[test]
fn cross_origin_imports_are_rejected_without_fetching() {
  let files = files(&[(
    "/index.js",
    "import x from \"https://evil.example/x.js\";\nx();\n",
  )]);
  let fetcher = Arc::new(FakeFetcher::default());
  let res = compile_with(&files, fetcher.clone(), CompileOptions::new());
  let err = res.error().expect("expected failure");
  assert_eq!(err.kind, ErrorKind::Resolution(ResolutionKind::CrossOrigin));
  assert_eq!(err.code, codes::CROSS_ORIGIN);
  assert_eq!(err.module, Some(ModuleId::Virtual("/index.js".into())));
  let position = err.position.unwrap();
  assert_eq!((position.line, position.column), (1, 14));
  assert!(fetcher.calls().is_empty());
}

#[test]
fn failed_fetch_is_a_load_error() {
  let url = "https://editor.example/lib/missing.js";
  let files = files(&[("/index.js", "import { f } from \"https://editor.example/lib/missing.js\";\nf();\n")]);
  let fetcher = Arc::new(FakeFetcher::default().with(url, Err(404)));
  let err = compile_with(&files, fetcher.clone(), CompileOptions::new())
    .into_result()
    .unwrap_err();
  assert_eq!(err.kind, ErrorKind::Load);
  assert_eq!(err.code, codes::FETCH_FAILED);
  assert!(err.message.contains(url));
  assert_eq!(err.module, Some(ModuleId::Remote(Url::parse(url).unwrap())));
  assert_eq!(fetcher.calls(), vec![url.to_string()]);
}

#[test]
fn missing_entry_is_a_load_error() {
  let files = files(&[("/main.js", "")]);
  let err = compile(&files, true).into_result().unwrap_err();
  assert_eq!(err.kind, ErrorKind::Load);
  assert_eq!(err.code, codes::MISSING_FILE);
}

#[test]
fn remote_modules_are_fetched_once_and_resolve_relative_imports() {
  let files = files(&[
    ("/index.js", "import { noise } from \"https://editor.example/lib/noise.js\";\nimport \"./setup.js\";\nnoise();\n"),
    ("/setup.js", "import { seed } from \"https://editor.example/lib/noise.js\";\nseed(1);\n"),
  ]);
  let fetcher = Arc::new(
    FakeFetcher::default()
      .with(
        "https://editor.example/lib/noise.js",
        Ok("import { rand } from \"./rand.js\";\nexport function noise() { return rand(); }\nexport function seed(s) {}\n"),
      )
      .with("https://editor.example/lib/rand.js", Ok("export const rand = () => 4;\n")),
  );
  let bundle = compile_with(&files, fetcher.clone(), CompileOptions::new())
    .into_result()
    .unwrap();
  let mut calls = fetcher.calls();
  calls.sort();
  assert_eq!(calls, vec![
    "https://editor.example/lib/noise.js",
    "https://editor.example/lib/rand.js",
  ]);
  assert!(bundle.code.contains("const rand = () => 4;"));
  assert!(bundle.code.contains("function noise() { return rand(); }"));
  assert!(bundle.code.contains("seed(1);"));
  assert!(bundle
    .map
    .sources
    .contains(&"https://editor.example/lib/rand.js".to_string()));
}

#[test]
fn cycles_terminate_and_emit_each_module_once() {
  let files = files(&[
    ("/index.js", "import { useB } from \"./a.js\";\nuseB();\n"),
    ("/a.js", "import { b } from \"./b.js\";\nexport const a = 1;\nexport function useB() { return b; }\n"),
    ("/b.js", "import { a } from \"./a.js\";\nexport const b = 2;\nexport function useA() { return a; }\n"),
  ]);
  let bundle = compile(&files, false).into_result().unwrap();
  for needle in [
    "const a = 1;",
    "const b = 2;",
    "function useA() { return a; }",
    "function useB() { return b; }",
  ] {
    assert_eq!(bundle.code.matches(needle).count(), 1, "{} in {}", needle, bundle.code);
  }
  // b.js finishes first in a depth-first walk from the entry.
  assert!(bundle.code.find("const b = 2;") < bundle.code.find("const a = 1;"));
  assert!(bundle.code.ends_with("useB();\n"));
}

#[test]
fn unused_exports_are_removed_only_when_treeshaking() {
  let files = files(&[
    ("/index.js", "import { used } from \"./lib.js\";\nconsole.log(used);\n"),
    ("/lib.js", "export const used = 1;\nexport const unused = 2;\nexport const effect = sideEffect();\nconsole.log(\"lib loaded\");\n"),
  ]);
  let shaken = compile(&files, true).into_result().unwrap();
  assert!(shaken.code.contains("const used = 1;"));
  assert!(!shaken.code.contains("unused"));
  assert!(shaken.code.contains("const effect = sideEffect();"));
  assert!(shaken.code.contains("console.log(\"lib loaded\");"));

  let full = compile(&files, false).into_result().unwrap();
  assert!(full.code.contains("const unused = 2;"));
}

#[test]
fn entry_code_survives_treeshaking() {
  let files = files(&[("/index.js", "function helper() {}\nconst x = 1;\nlet y\n")]);
  let bundle = bundle(&files);
  assert_eq!(bundle.code, "function helper() {}\nconst x = 1;\nlet y;\n");
}

#[test]
fn compiles_are_deterministic() {
  let files = files(&[
    ("/index.js", "import * as a from \"./a.js\";\nimport { b } from \"./b.js\";\nconsole.log(a, b);\n"),
    ("/a.js", "const shared = 1;\nexport const x = shared;\nexport const y = 2;\n"),
    ("/b.js", "const shared = 3;\nexport const b = shared;\n"),
  ]);
  let first = compile(&files, true);
  let second = compile(&files, true);
  assert!(first.is_success());
  assert_eq!(first, second);
}

#[test]
fn colliding_bindings_are_renamed() {
  let files = files(&[
    ("/index.js", "import { value } from \"./a.js\";\nimport { other } from \"./b.js\";\nconst count = 3;\nconsole.log(count, value, other);\n"),
    ("/a.js", "const count = 1;\nexport const value = count;\n"),
    ("/b.js", "const count = 2;\nexport const other = count;\n"),
  ]);
  let bundle = bundle(&files);
  assert_eq!(
    bundle.code,
    "const count$1 = 1;\nconst value = count$1;\nconst count$2 = 2;\nconst other = count$2;\nconst count = 3;\nconsole.log(count, value, other);\n"
  );
}

#[test]
fn renames_avoid_globals_and_shadowing() {
  let files = files(&[
    ("/index.js", "import { x as y, d } from \"./a.js\";\nfunction f(x) { return y; }\ndocument.title = f(d);\n"),
    ("/a.js", "const document = \"doc\";\nexport const x = 1;\nexport const d = document;\n"),
  ]);
  let bundle = bundle(&files);
  assert!(bundle.code.contains("const document$1 = \"doc\";"));
  assert!(bundle.code.contains("const d = document$1;"));
  assert!(bundle.code.contains("const x$1 = 1;"));
  assert!(bundle.code.contains("function f(x) { return x$1; }"));
  assert!(bundle.code.contains("document.title = f(d);"));
}

#[test]
fn import_aliases_and_reexports_are_rewritten() {
  let files = files(&[
    ("/index.js", "import { thing as t, y, z } from \"./a.js\";\nimport answer from \"./answer.js\";\nconsole.log(t, y, z, answer);\n"),
    ("/a.js", "const x = 5;\nexport const thing = 1;\nexport { x as y };\nexport * from \"./c.js\";\n"),
    ("/c.js", "export let z = 3;\n"),
    ("/answer.js", "export default 40 + 2\n"),
  ]);
  let bundle = bundle(&files);
  assert!(bundle.code.contains("const x = 5;"));
  assert!(bundle.code.contains("let z = 3;"));
  assert!(bundle.code.contains("const answer_default = 40 + 2;"));
  assert!(bundle.code.contains("console.log(thing, x, z, answer_default);"));
}

#[test]
fn shorthand_properties_keep_their_keys() {
  let files = files(&[
    ("/index.js", "import { count } from \"./a.js\";\nconsole.log({ count });\n"),
    ("/a.js", "const count = 1;\nconst obj = { count };\nexport { obj as count };\n"),
  ]);
  let bundle = bundle(&files);
  assert!(bundle.code.contains("const count = 1;"));
  assert!(bundle.code.contains("const obj = { count };"));
  assert!(bundle.code.contains("console.log({ count: obj });"));
}

#[test]
fn namespace_imports_use_frozen_objects() {
  let files = files(&[
    ("/index.js", "import * as lib from \"./lib.js\";\nconsole.log(lib.a, lib[\"b\"]);\n"),
    ("/lib.js", "export const a = 1;\nexport function b() {}\nconst c = 2;\nexport { c as \"not an id\" };\n"),
  ]);
  let bundle = bundle(&files);
  assert_eq!(
    bundle.code,
    concat!(
      "const lib = Object.freeze({\n",
      "  __proto__: null,\n",
      "  [Symbol.toStringTag]: \"Module\",\n",
      "  get a() { return a; },\n",
      "  get b() { return b; },\n",
      "  get \"not an id\"() { return c; },\n",
      "});\n",
      "const a = 1;\n",
      "function b() {}\n",
      "const c = 2;\n",
      "console.log(lib.a, lib[\"b\"]);\n",
    )
  );
}

#[test]
fn dynamic_imports_of_bundled_modules_resolve_to_namespaces() {
  let files = files(&[
    ("/index.js", "const mod = import(\"./lazy.js\");\nconst ext = import(\"lazy-ext\");\n"),
    ("/lazy.js", "export const x = 1;\n"),
  ]);
  let bundle = bundle(&files);
  assert!(bundle.code.starts_with("const lazy_ns = Object.freeze({"));
  assert!(bundle.code.contains("  get x() { return x; },"));
  assert!(bundle
    .code
    .contains("const mod = Promise.resolve().then(() => lazy_ns);"));
  assert!(bundle.code.contains("const ext = import(\"lazy-ext\");"));
  assert!(bundle.code.contains("const x = 1;"));
}

#[test]
fn external_imports_are_hoisted_and_deduplicated() {
  let files = files(&[
    ("/index.js", "import { h } from \"preact\";\nimport * as R from \"react\";\nimport \"./a.js\";\nh(R);\n"),
    ("/a.js", "import { h as create, render } from \"preact\";\nimport \"polyfill\";\nrender(create(\"div\"));\n"),
  ]);
  let bundle = bundle(&files);
  assert_eq!(
    bundle.code,
    concat!(
      "import { h, render } from \"preact\";\n",
      "import * as R from \"react\";\n",
      "import \"polyfill\";\n",
      "render(h(\"div\"));\n",
      "h(R);\n",
    )
  );
}

#[test]
fn entry_exports_become_bundle_exports() {
  let files = files(&[(
    "/index.js",
    "export const a = 1;\nexport default function() {}\nexport { a as b };\nexport * from \"ext\";\n",
  )]);
  let bundle = bundle(&files);
  assert_eq!(
    bundle.code,
    concat!(
      "const a = 1;\n",
      "function index_default() {}\n",
      "export { a, index_default as default, a as b };\n",
      "export * from \"ext\";\n",
    )
  );
}

#[test]
fn missing_exports_are_link_errors_with_positions() {
  let files = files(&[
    ("/index.js", "import { nope } from \"./a.js\";\nnope();\n"),
    ("/a.js", "export const yes = 1;\n"),
  ]);
  let err = compile(&files, true).into_result().unwrap_err();
  assert_eq!(err.kind, ErrorKind::Link);
  assert_eq!(err.code, codes::MISSING_EXPORT);
  assert_eq!(err.module, Some(ModuleId::Virtual("/index.js".into())));
  let position = err.position.unwrap();
  assert_eq!((position.line, position.column), (1, 9));
  assert!(err.message.contains("/a.js"));
}

#[test]
fn reexport_problems_are_link_errors() {
  let circular = files(&[
    ("/index.js", "import { x } from \"./a.js\";\nx;\n"),
    ("/a.js", "export { x } from \"./b.js\";\n"),
    ("/b.js", "export { x } from \"./a.js\";\n"),
  ]);
  let err = compile(&circular, true).into_result().unwrap_err();
  assert_eq!(err.code, codes::CIRCULAR_REEXPORT);

  let duplicate = files(&[("/index.js", "export const a = 1;\nexport { a };\n")]);
  let err = compile(&duplicate, true).into_result().unwrap_err();
  assert_eq!(err.code, codes::DUPLICATE_EXPORT);
  assert_eq!(err.position.unwrap().line, 2);

  let undeclared = files(&[("/index.js", "export { ghost };\n")]);
  let err = compile(&undeclared, true).into_result().unwrap_err();
  assert_eq!(err.code, codes::UNDECLARED_EXPORT);
}

#[test]
fn syntax_errors_are_parse_errors_with_positions() {
  let files = files(&[
    ("/index.js", "import \"./bad.js\";\n"),
    ("/bad.js", "const a = 1;\nconst b = );\n"),
  ]);
  let err = compile(&files, true).into_result().unwrap_err();
  assert_eq!(err.kind, ErrorKind::Parse);
  assert!(err.code.starts_with("PS"));
  assert_eq!(err.module, Some(ModuleId::Virtual("/bad.js".into())));
  assert_eq!(err.position.unwrap().line, 2);
}

#[test]
fn cancelled_compiles_fail_without_fetching() {
  let files = files(&[("/index.js", "import \"https://editor.example/x.js\";\n")]);
  let fetcher = Arc::new(FakeFetcher::default().with("https://editor.example/x.js", Ok("")));
  let cancel = CancelToken::new();
  cancel.cancel();
  let err = compile_with(&files, fetcher.clone(), CompileOptions::new().with_cancel(cancel))
    .into_result()
    .unwrap_err();
  assert_eq!(err.kind, ErrorKind::Cancelled);
  assert!(fetcher.calls().is_empty());
}

#[test]
fn source_map_points_at_original_positions() {
  let a = "const count = 1;\nexport const value = count;\n";
  let index = "import { value } from \"./a.js\";\nconst count = 3;\nconsole.log(count, value);\n";
  let files = files(&[("/index.js", index), ("/a.js", a)]);
  let bundle = bundle(&files);
  let map = &bundle.map;
  assert_eq!(map.version, 3);
  assert_eq!(map.sources, vec!["/a.js", "/index.js"]);
  assert!(map.names.contains(&"count".to_string()));

  let texts = [a, index];
  let output_lines = LineIndex::new(&bundle.code).line_count() as u32;
  let mappings = map.decode_mappings().expect("valid mappings");
  assert!(!mappings.is_empty());
  for mapping in mappings.iter() {
    assert!(mapping.generated.line < output_lines);
    let original = mapping.original.expect("every mapping has a source");
    let lines = LineIndex::new(texts[original.source as usize]);
    assert!((original.position.line as usize) < lines.line_count());
  }

  // `count$1` in `const count$1 = 1;` comes from `count` on the first line of a.js.
  let renamed = mappings
    .iter()
    .find(|m| m.generated.line == 0 && m.generated.col == 6)
    .unwrap();
  let original = renamed.original.unwrap();
  assert_eq!(original.source, 0);
  assert_eq!((original.position.line, original.position.col), (0, 6));
  assert_eq!(map.names[original.name.unwrap() as usize], "count");
}

#[test]
fn results_serialize_with_null_for_the_absent_side() {
  let ok = compile(&files(&[("/index.js", "1;\n")]), true);
  let json = serde_json::to_value(&ok).unwrap();
  assert_eq!(json["code"], "1;\n");
  assert_eq!(json["map"]["version"], 3);
  assert!(json["error"].is_null());

  let failed = compile(&files(&[("/index.js", "import { x } from \"./y.js\"; x;\n"), ("/y.js", "")]), true);
  let json = serde_json::to_value(&failed).unwrap();
  assert!(json["code"].is_null());
  assert!(json["map"].is_null());
  assert_eq!(json["error"]["kind"], "link");
  assert_eq!(json["error"]["code"], "BJ0101");
  assert_eq!(json["error"]["module"], "/index.js");
  assert_eq!(json["error"]["position"]["line"], 1);
}

#[test]
fn cancelling_mid_frontier_skips_remaining_loads() {
  let count = 256;
  let index: String = (0..count)
    .map(|i| format!("import \"https://editor.example/m{}.js\";\n", i))
    .collect();
  let files = files(&[("/index.js", index.as_str())]);
  let cancel = CancelToken::new();
  let mut fetcher = FakeFetcher::default().cancelling(cancel.clone());
  for i in 0..count {
    fetcher = fetcher.with(&format!("https://editor.example/m{}.js", i), Ok(""));
  }
  let fetcher = Arc::new(fetcher);
  let err = compile_with(&files, fetcher.clone(), CompileOptions::new().with_cancel(cancel))
    .into_result()
    .unwrap_err();
  assert_eq!(err.kind, ErrorKind::Cancelled);
  // Only loads already in flight when the first fetch cancelled can have gone ahead.
  assert!(fetcher.calls().len() < count);
}

#[test]
fn deeply_nested_input_is_a_parse_error() {
  let nested = "(".repeat(20_000);
  let files = files(&[("/index.js", "import \"./deep.js\";\n"), ("/deep.js", nested.as_str())]);
  let err = compile(&files, true).into_result().unwrap_err();
  assert_eq!(err.kind, ErrorKind::Parse);
  assert_eq!(err.code, "PS0009");
  assert_eq!(err.module, Some(ModuleId::Virtual("/deep.js".into())));
}

#[test]
fn declarations_colliding_with_imports_are_parse_errors() {
  let files = files(&[
    ("/index.js", "import { a } from \"./b.js\";\nconst a = 2;\nconsole.log(a);\n"),
    ("/b.js", "export const a = 1;\n"),
  ]);
  let err = compile(&files, true).into_result().unwrap_err();
  assert_eq!(err.kind, ErrorKind::Parse);
  assert_eq!(err.code, "PS0010");
  assert_eq!(err.module, Some(ModuleId::Virtual("/index.js".into())));
  let position = err.position.unwrap();
  assert_eq!((position.line, position.column), (2, 6));
}

#[test]
fn early_errors_fail_the_compile() {
  for (source, code) in [
    ("let a = 1;\nlet a = 2;\n", "PS0010"),
    ("return;\n", "PS0011"),
    ("const x;\n", "PS0012"),
    ("for(;;){ break foo; }\n", "PS0013"),
  ] {
    let err = compile(&files(&[("/index.js", source)]), true)
      .into_result()
      .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Parse, "{source}");
    assert_eq!(err.code, code, "{source}");
  }
}

#[test]
fn anonymous_default_exports_get_names_without_stray_spaces() {
  let files = files(&[
    ("/index.js", "import f from \"./b.js\";\nimport K from \"./k.js\";\nf(new K());\n"),
    ("/b.js", "export default function (a) { return a; }\n"),
    ("/k.js", "class Base {}\nexport default class extends Base {}\n"),
  ]);
  let bundle = bundle(&files);
  assert!(bundle.code.contains("function b_default(a) { return a; }\n"), "{}", bundle.code);
  assert!(bundle.code.contains("class k_default extends Base {}\n"), "{}", bundle.code);
  assert!(bundle.code.contains("b_default(new k_default());\n"), "{}", bundle.code);
}

#[test]
fn namespaces_leave_out_names_from_external_stars_of_inner_modules() {
  let files = files(&[
    ("/index.js", "import * as lib from \"./lib.js\";\nconsole.log(lib);\n"),
    ("/lib.js", "export * from \"ext\";\nexport const a = 1;\n"),
  ]);
  let bundle = bundle(&files);
  assert!(bundle.code.contains("  get a() { return a; },\n"), "{}", bundle.code);
  assert_eq!(bundle.code.matches("  get ").count(), 1, "{}", bundle.code);
}
