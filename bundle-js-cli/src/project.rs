use anyhow::bail;
use anyhow::Context;
use bundle_js::VirtualFileSet;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Reads every UTF-8 file under `dir` into a file set, keyed by its path relative to `dir` with a leading `/`.
/// Hidden files and directories are skipped.
pub fn load_files(dir: &Path) -> anyhow::Result<VirtualFileSet> {
  if !dir.is_dir() {
    bail!("{} is not a directory", dir.display());
  };
  let mut files = VirtualFileSet::new();
  for entry in WalkDir::new(dir)
    .follow_links(false)
    .into_iter()
    .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
  {
    let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
    if !entry.file_type().is_file() {
      continue;
    };
    let rel = match entry.path().strip_prefix(dir) {
      Ok(rel) => rel,
      Err(_) => continue,
    };
    let Some(rel) = rel.to_str() else {
      continue;
    };
    let path = format!("/{}", rel.replace('\\', "/"));
    let text = match fs::read_to_string(entry.path()) {
      Ok(text) => text,
      Err(err) if err.kind() == std::io::ErrorKind::InvalidData => continue,
      Err(err) => {
        return Err(err).with_context(|| format!("failed to read {}", entry.path().display()))
      }
    };
    files.insert(path, text);
  }
  Ok(files)
}
