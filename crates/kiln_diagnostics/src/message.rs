use std::fmt;

use kiln_type::span::Span;

use super::diagnostic_report::{Diagnostic, Severity};

/// Diagnostics raised while lowering declarations to IR.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticMessage {
  /// A node's semantic annotation is not of the kind lowering expects.
  MetadataMismatch {
    expected: String,
    found: String,
    at: Span,
  },
  UnsupportedDeclaration {
    kind: String,
    at: Span,
  },
  UnboundIdentifier {
    name: String,
    at: Span,
  },
  UnsupportedExpression {
    what: String,
    at: Span,
  },
  InvalidAttribute {
    directive: String,
    reason: String,
    at: Span,
  },
  /// Anything else that aborted lowering of a declaration.
  LoweringFailed {
    message: String,
    at: Span,
  },
}

impl fmt::Display for DiagnosticMessage {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      DiagnosticMessage::MetadataMismatch { expected, found, .. } => {
        write!(f, "expected {} annotation, found {}", expected, found)
      },
      DiagnosticMessage::UnsupportedDeclaration { kind, .. } => write!(f, "unhandled declaration ({})", kind),
      DiagnosticMessage::UnboundIdentifier { name, .. } => {
        write!(f, "identifier '{}' has no storage or function bound", name)
      },
      DiagnosticMessage::UnsupportedExpression { what, .. } => write!(f, "cannot lower {}", what),
      DiagnosticMessage::InvalidAttribute { directive, reason, .. } => {
        write!(f, "invalid attribute '{}': {}", directive, reason)
      },
      DiagnosticMessage::LoweringFailed { message, .. } => write!(f, "{}", message),
    }
  }
}

impl DiagnosticMessage {
  pub fn primary_span(&self) -> Span {
    match self {
      DiagnosticMessage::MetadataMismatch { at, .. }
      | DiagnosticMessage::UnsupportedDeclaration { at, .. }
      | DiagnosticMessage::UnboundIdentifier { at, .. }
      | DiagnosticMessage::UnsupportedExpression { at, .. }
      | DiagnosticMessage::InvalidAttribute { at, .. }
      | DiagnosticMessage::LoweringFailed { at, .. } => at.clone(),
    }
  }

  pub fn code(&self) -> String {
    match self {
      DiagnosticMessage::MetadataMismatch { .. } => "L0001",
      DiagnosticMessage::UnsupportedDeclaration { .. } => "L0002",
      DiagnosticMessage::UnboundIdentifier { .. } => "L0003",
      DiagnosticMessage::UnsupportedExpression { .. } => "L0004",
      DiagnosticMessage::InvalidAttribute { .. } => "L0005",
      DiagnosticMessage::LoweringFailed { .. } => "L0099",
    }
    .to_string()
  }

  pub fn level(&self) -> Severity {
    Severity::Error
  }

  fn note(&self) -> Option<&'static str> {
    match self {
      DiagnosticMessage::MetadataMismatch { .. } => Some("the checker's annotation for this node disagrees with its syntax"),
      DiagnosticMessage::UnsupportedDeclaration { .. } => Some("the declaration was skipped"),
      DiagnosticMessage::InvalidAttribute { .. }
      | DiagnosticMessage::UnboundIdentifier { .. }
      | DiagnosticMessage::UnsupportedExpression { .. }
      | DiagnosticMessage::LoweringFailed { .. } => None,
    }
  }

  pub fn report(&self) -> Diagnostic {
    let diag = Diagnostic::new(self.level(), self.to_string(), self.code(), self.primary_span());

    match self.note() {
      Some(note) => diag.with_note(note),
      None => diag,
    }
  }
}
