use crate::error::CompileError;
use crate::host::VirtualFileSet;
use crate::id::ModuleId;
use parse_js::loc::LineIndex;
use std::fmt::Write;

const DEFAULT_TAB_WIDTH: usize = 2;

const ANSI_RESET: &str = "\u{1b}[0m";
const ANSI_BOLD_RED: &str = "\u{1b}[1;31m";

/// Provides module text for rendering diagnostics.
pub trait SourceProvider {
  fn module_text(&self, id: &ModuleId) -> Option<&str>;
}

impl SourceProvider for VirtualFileSet {
  fn module_text(&self, id: &ModuleId) -> Option<&str> {
    match id {
      ModuleId::Virtual(path) => self.get(path),
      ModuleId::Remote(_) => None,
    }
  }
}

#[derive(Clone, Copy, Debug)]
pub struct RenderOptions {
  pub color: bool,
  pub tab_width: usize,
}

impl Default for RenderOptions {
  fn default() -> Self {
    Self {
      color: false,
      tab_width: DEFAULT_TAB_WIDTH,
    }
  }
}

/// Render a compile error into a human-readable string with caret highlighting.
pub fn render_error(provider: &dyn SourceProvider, error: &CompileError) -> String {
  render_error_with_options(provider, error, RenderOptions::default())
}

pub fn render_error_with_options(
  provider: &dyn SourceProvider,
  error: &CompileError,
  options: RenderOptions,
) -> String {
  let mut output = String::new();
  if options.color {
    output.push_str(ANSI_BOLD_RED);
    output.push_str("error");
    output.push_str(ANSI_RESET);
  } else {
    output.push_str("error");
  }
  writeln!(output, "[{}]: {}", error.code, error.message).unwrap();

  let Some(module) = &error.module else {
    return output;
  };
  let (Some(position), Some(span)) = (error.position, error.span) else {
    writeln!(output, " --> {}", module).unwrap();
    return output;
  };
  writeln!(output, " --> {}:{}:{}", module, position.line, position.column + 1).unwrap();
  let Some(text) = provider.module_text(module) else {
    writeln!(output, "  | (source unavailable)").unwrap();
    return output;
  };

  let lines = LineIndex::new(text);
  let line = position.line as usize - 1;
  let start = lines.line_start(line);
  let end = text[start..]
    .find(|c| c == '\n' || c == '\r' || c == '\u{2028}' || c == '\u{2029}')
    .map_or(text.len(), |i| start + i);
  let line_text = &text[start..end];
  let gutter_width = (line + 1).to_string().len();

  writeln!(output, "{:>width$} |", "", width = gutter_width).unwrap();
  writeln!(
    output,
    "{:>width$} | {}",
    line + 1,
    expand_tabs(line_text, options.tab_width),
    width = gutter_width
  )
  .unwrap();
  let span_start = span.0.clamp(start, end);
  let span_end = span.1.clamp(span_start, end);
  let start_col = display_column(line_text, span_start - start, options.tab_width);
  let end_col = display_column(line_text, span_end - start, options.tab_width);
  let carets = "^".repeat(end_col.saturating_sub(start_col).max(1));
  write!(output, "{:>width$} | {}", "", " ".repeat(start_col), width = gutter_width).unwrap();
  if options.color {
    output.push_str(ANSI_BOLD_RED);
    output.push_str(&carets);
    output.push_str(ANSI_RESET);
  } else {
    output.push_str(&carets);
  }
  output.push('\n');
  output
}

fn expand_tabs(line: &str, tab_width: usize) -> String {
  let tab_width = tab_width.max(1);
  let mut expanded = String::with_capacity(line.len());
  for ch in line.chars() {
    if ch == '\t' {
      expanded.push_str(&" ".repeat(tab_width));
    } else {
      expanded.push(ch);
    }
  }
  expanded
}

fn display_column(line_text: &str, offset_in_line: usize, tab_width: usize) -> usize {
  line_text
    .char_indices()
    .take_while(|(i, _)| *i < offset_in_line)
    .map(|(_, ch)| if ch == '\t' { tab_width.max(1) } else { 1 })
    .sum()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::codes;
  use parse_js::loc::Loc;

  #[test]
  fn renders_snippet_with_carets() {
    let mut files = VirtualFileSet::new();
    let text = "import { nope } from \"./a.js\";\n\tnope();\n";
    files.insert("/index.js", text);
    let err = CompileError::link(codes::MISSING_EXPORT, "no export named `nope`")
      .in_module(ModuleId::Virtual("/index.js".into()))
      .at(text, Loc(32, 36));
    let rendered = render_error(&files, &err);
    assert_eq!(
      rendered,
      "error[BJ0101]: no export named `nope`\n --> /index.js:2:2\n  |\n2 |   nope();\n  |   ^^^^\n"
    );
  }

  #[test]
  fn renders_without_source() {
    let files = VirtualFileSet::new();
    let err = CompileError::cancelled();
    assert_eq!(render_error(&files, &err), "error[BJ0900]: compilation was cancelled\n");
    let err = CompileError::link(codes::MISSING_EXPORT, "missing")
      .in_module(ModuleId::Virtual("/gone.js".into()))
      .at("x", Loc(0, 1));
    assert_eq!(
      render_error(&files, &err),
      "error[BJ0101]: missing\n --> /gone.js:1:1\n  | (source unavailable)\n"
    );
  }
}
