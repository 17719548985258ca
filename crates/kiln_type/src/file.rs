use std::{collections::HashMap, path::PathBuf};
use std::hash::{Hash, Hasher};
use ahash::AHasher;
use crate::{BytePosition, Id, Store, span::Span};

pub type FileId = Id<SourceFile>;

impl FileId {
  /// Sentinel FileId for compiler-synthesized code.
  /// Uses u32::MAX to never collide with real file indices (which start at 0).
  pub const SYNTHETIC: FileId = FileId::new(u32::MAX);
}

#[derive(Default, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SourceFile {
  pub path: PathBuf,
  pub text: String,
  pub line_starts: Vec<BytePosition>,
  pub hash: u64,
}

impl SourceFile {
  pub fn new(
    path: PathBuf,
    text: String,
  ) -> Self {
    let line_starts = compute_line_starts(&text);
    let hash = content_hash(&text);
    Self {
      path,
      text,
      line_starts,
      hash,
    }
  }

  #[inline]
  pub fn len_bytes(&self) -> u32 {
    self.text.len() as u32
  }
}

impl std::fmt::Display for Id<SourceFile> {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    write!(f, "(file id: {})", self.index())
  }
}

/// A resolved `file:line:col` location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
  pub path: PathBuf,
  pub line: u32,
  pub column: u32,
}

impl std::fmt::Display for Position {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    write!(f, "{}:{}:{}", self.path.display(), self.line, self.column)
  }
}

pub struct SourceMap {
  files: Store<SourceFile>,
  by_path: HashMap<PathBuf, FileId>,
}

impl Default for SourceMap {
  fn default() -> Self {
    Self::new()
  }
}

impl SourceMap {
  pub fn new() -> Self {
    Self {
      files: Store::new(),
      by_path: HashMap::new(),
    }
  }

  pub fn add_file<P: Into<PathBuf>>(
    &mut self,
    path: P,
    text: String,
  ) -> FileId {
    let path = normalize_path(path.into());

    if let Some(id) = self.by_path.get(&path) {
      return *id;
    }

    let id = self.files.alloc(SourceFile::new(path.clone(), text));
    self.by_path.insert(path, id);
    id
  }

  pub fn add_virtual(
    &mut self,
    label: &str,
    text: String,
  ) -> FileId {
    let path = PathBuf::from(format!("<{}>", label));

    self.files.alloc(SourceFile::new(path, text))
  }

  #[inline]
  pub fn get(
    &self,
    id: &FileId,
  ) -> &SourceFile {
    self.files.get(id)
  }

  pub fn contains(
    &self,
    id: &FileId,
  ) -> bool {
    self.files.contains(id)
  }

  pub fn line_col(
    &self,
    file: &FileId,
    pos: BytePosition,
  ) -> (u32, u32) {
    let f = self.get(file);
    let pos = BytePosition(pos.0.min(f.len_bytes()));
    let line = f.line_starts.partition_point(|start| start.0 <= pos.0).saturating_sub(1);
    let line_start = f.line_starts[line].0 as usize;
    let slice = &f.text.as_bytes()[line_start..pos.0 as usize];
    let col = unicode_column(slice);

    ((line as u32) + 1, (col as u32) + 1)
  }

  /// Resolve the start of `span` to a printable position. Synthetic spans and
  /// spans into unknown files resolve to `<synthetic>:0:0`.
  pub fn position(
    &self,
    span: &Span,
  ) -> Position {
    if span.is_synthetic() || !self.contains(&span.file) {
      return Position {
        path: PathBuf::from("<synthetic>"),
        line: 0,
        column: 0,
      };
    }

    let (line, column) = self.line_col(&span.file, span.start);
    Position {
      path: self.get(&span.file).path.clone(),
      line,
      column,
    }
  }

  pub fn snippet(
    &self,
    span: &Span,
  ) -> String {
    let (line, col) = self.line_col(&span.file, span.start);
    let f = self.get(&span.file);
    let line_idx = (line - 1) as usize;
    let line_start = f.line_starts[line_idx].0 as usize;
    let line_end = f
      .line_starts
      .get(line_idx + 1)
      .map(|p| p.0 as usize)
      .unwrap_or_else(|| f.text.len());

    let line_str = &f.text[line_start..line_end].trim_end_matches(&['\r', '\n'][..]);
    let caret = " ".repeat((col - 1) as usize) + &"^".repeat(span.len().max(1));

    format!("{:>4} | {}\n     | {}", line, line_str, caret)
  }
}

/// Normalize a path for consistent comparison.
///
/// Falls back to the original path if canonicalization fails (e.g., file doesn't exist).
pub fn normalize_path(mut p: PathBuf) -> PathBuf {
  if let Ok(c) = p.canonicalize() {
    p = c;
  }
  p
}

fn compute_line_starts(text: &str) -> Vec<BytePosition> {
  let bytes = text.as_bytes();
  let mut v = Vec::with_capacity(128);
  v.push(BytePosition(0));

  for (i, b) in bytes.iter().enumerate() {
    if *b == b'\n' {
      v.push(BytePosition((i + 1) as u32));
    }
  }
  v
}

fn unicode_column(slice: &[u8]) -> usize {
  std::str::from_utf8(slice)
    .map(|s| s.chars().count())
    .unwrap_or(slice.len())
}

fn content_hash(text: &str) -> u64 {
  let mut h = AHasher::default();
  text.hash(&mut h);
  h.finish()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_line_col_is_one_based() {
    let mut sm = SourceMap::new();
    let file = sm.add_virtual("t", "var a = 1\nvar b = 2\n".to_string());

    assert_eq!(sm.line_col(&file, BytePosition(0)), (1, 1));
    assert_eq!(sm.line_col(&file, BytePosition(14)), (2, 5));
  }

  #[test]
  fn test_position_display() {
    let mut sm = SourceMap::new();
    let file = sm.add_virtual("pkg.kl", "func f() {}\n".to_string());
    let span = Span::new(file, BytePosition(5), BytePosition(6));

    assert_eq!(sm.position(&span).to_string(), "<pkg.kl>:1:6");
    assert_eq!(sm.position(&Span::synthetic()).to_string(), "<synthetic>:0:0");
  }
}
