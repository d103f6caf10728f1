use assert_cmd::Command;
use predicates::str::contains;
use predicates::str::is_empty;
use serde_json::Value;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
  let dir = tempfile::tempdir().unwrap();
  for (path, text) in files {
    let path = dir.path().join(path);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
  }
  dir
}

fn bundle_js(dir: &Path) -> Command {
  let mut cmd = Command::cargo_bin("bundle-js").unwrap();
  cmd.arg(dir.as_os_str());
  cmd
}

fn library() -> TempDir {
  project(&[
    (
      "index.js",
      "import { double } from \"./lib/math.js\";\nconsole.log(double(2));\n",
    ),
    (
      "lib/math.js",
      "export const double = (x) => x * 2;\nexport const unused = 1;\n",
    ),
  ])
}

#[test]
fn bundles_entry_to_stdout() {
  let dir = project(&[("index.js", "console.log(1);\n")]);
  bundle_js(dir.path())
    .assert()
    .success()
    .stdout("console.log(1);\n")
    .stderr(is_empty());
}

#[test]
fn bundles_nested_modules() {
  let dir = library();
  let out = bundle_js(dir.path()).assert().success().get_output().stdout.clone();
  let code = String::from_utf8(out).unwrap();
  assert!(code.contains("const double = (x) => x * 2;"), "{code}");
  assert!(code.ends_with("console.log(double(2));\n"), "{code}");
  assert!(!code.contains("unused"), "{code}");
}

#[test]
fn no_treeshake_keeps_unused_declarations() {
  let dir = library();
  bundle_js(dir.path())
    .arg("--no-treeshake")
    .assert()
    .success()
    .stdout(contains("const unused = 1;"));
}

#[test]
fn config_file_settings_apply() {
  let dir = library();
  let config = dir.path().join(".bundle.json");
  fs::write(&config, r#"{ "treeshake": false, "origin": "https://editor.example" }"#).unwrap();
  bundle_js(dir.path())
    .arg("--config")
    .arg(config.as_os_str())
    .assert()
    .success()
    .stdout(contains("const unused = 1;"));
}

#[test]
fn writes_output_and_source_map_files() {
  let dir = library();
  let out_dir = tempfile::tempdir().unwrap();
  let out = out_dir.path().join("bundle.js");
  let map = out_dir.path().join("bundle.js.map");
  bundle_js(dir.path())
    .arg("-o")
    .arg(out.as_os_str())
    .arg("--source-map")
    .arg(map.as_os_str())
    .arg("--no-sources-content")
    .assert()
    .success()
    .stdout(is_empty());

  let code = fs::read_to_string(&out).unwrap();
  assert!(code.ends_with("//# sourceMappingURL=bundle.js.map\n"), "{code}");
  let map: Value = serde_json::from_str(&fs::read_to_string(&map).unwrap()).unwrap();
  assert_eq!(map["version"], 3);
  assert_eq!(
    map["sources"],
    serde_json::json!(["/lib/math.js", "/index.js"])
  );
  assert!(map.get("sourcesContent").is_none());
  assert!(!map["mappings"].as_str().unwrap().is_empty());
}

#[test]
fn inline_source_map_is_a_data_url() {
  let dir = project(&[("index.js", "console.log(1);\n")]);
  bundle_js(dir.path())
    .arg("--inline-source-map")
    .assert()
    .success()
    .stdout(contains(
      "console.log(1);\n//# sourceMappingURL=data:application/json;charset=utf-8;base64,",
    ));
}

#[test]
fn compile_errors_are_rendered_to_stderr() {
  let dir = project(&[
    ("index.js", "import { nope } from \"./a.js\";\nnope();\n"),
    ("a.js", "export const yes = 1;\n"),
  ]);
  bundle_js(dir.path())
    .assert()
    .failure()
    .code(1)
    .stdout(is_empty())
    .stderr(contains("error[BJ0101]"))
    .stderr(contains(" --> /index.js:1:10"));
}

#[test]
fn json_reports_failures() {
  let dir = project(&[(
    "index.js",
    "import x from \"https://evil.example/x.js\";\nx();\n",
  )]);
  let out = bundle_js(dir.path())
    .args(["--json", "--origin", "https://editor.example"])
    .assert()
    .failure()
    .get_output()
    .stdout
    .clone();
  let json: Value = serde_json::from_slice(&out).unwrap();
  assert!(json["code"].is_null());
  assert!(json["map"].is_null());
  assert_eq!(json["error"]["kind"], "resolution");
  assert_eq!(json["error"]["sub_kind"], "cross_origin");
  assert_eq!(json["error"]["code"], "BJ0001");
}

#[test]
fn json_reports_success() {
  let dir = project(&[("index.js", "console.log(1);\n")]);
  let out = bundle_js(dir.path())
    .arg("--json")
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();
  let json: Value = serde_json::from_slice(&out).unwrap();
  assert_eq!(json["code"], "console.log(1);\n");
  assert_eq!(json["map"]["sources"][0], "/index.js");
  assert!(json["error"].is_null());
}

#[test]
fn missing_entry_fails() {
  let dir = project(&[("main.js", "console.log(1);\n")]);
  bundle_js(dir.path())
    .assert()
    .failure()
    .stderr(contains("error[BJ0004]"));
}

#[test]
fn bad_origin_fails_before_compiling() {
  let dir = project(&[("index.js", "console.log(1);\n")]);
  bundle_js(dir.path())
    .args(["--origin", "not a url"])
    .assert()
    .failure()
    .stderr(contains("not a valid origin URL"));
}
