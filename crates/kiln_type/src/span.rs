use crate::{BytePosition, file::FileId};

/// Half-open byte range `[start, end)` inside one source file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub struct Span {
  pub start: BytePosition,
  pub end: BytePosition,
  pub file: FileId,
}

impl Span {
  pub fn new(
    file: FileId,
    start: BytePosition,
    end: BytePosition,
  ) -> Self {
    debug_assert!(start <= end, "inverted span {}..{}", start, end);
    Self { start, end, file }
  }

  pub fn empty_at(
    file: FileId,
    at: BytePosition,
  ) -> Self {
    Self::new(file, at, at)
  }

  /// Position of code the lowering invents itself, such as shims.
  pub fn synthetic() -> Self {
    Self::empty_at(FileId::SYNTHETIC, BytePosition::default())
  }

  pub fn is_synthetic(&self) -> bool {
    self.file == FileId::SYNTHETIC
  }

  pub fn len(&self) -> usize {
    self.end.0.saturating_sub(self.start.0) as usize
  }

  pub fn is_empty(&self) -> bool {
    self.start >= self.end
  }
}

impl std::fmt::Display for Span {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    write!(f, "{}@{}..{}", self.file, self.start, self.end)
  }
}
