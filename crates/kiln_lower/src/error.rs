use kiln_diagnostics::message::DiagnosticMessage;
use kiln_type::span::Span;

/// Failure while lowering one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LowerError {
  /// A semantic annotation is not of the kind lowering expects.
  MetadataMismatch { expected: String, found: String },

  UnsupportedDecl { kind: String },

  /// An identifier with neither storage nor a function bound to it.
  UnboundObject { name: String },

  UnsupportedExpr { what: String },

  InvalidAttribute { directive: String, reason: String },

  /// An instruction was requested with no function under construction.
  NoInsertionPoint,

  /// A value has no defining instruction where one was required.
  MissingDefinition { name: String },
}

pub type LowerResult<T> = Result<T, LowerError>;

impl std::fmt::Display for LowerError {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      LowerError::MetadataMismatch { expected, found } => write!(f, "expected {}, found {}", expected, found),
      LowerError::UnsupportedDecl { kind } => write!(f, "unhandled declaration ({})", kind),
      LowerError::UnboundObject { name } => write!(f, "'{}' is not bound", name),
      LowerError::UnsupportedExpr { what } => write!(f, "cannot lower {}", what),
      LowerError::InvalidAttribute { directive, reason } => write!(f, "invalid attribute '{}': {}", directive, reason),
      LowerError::NoInsertionPoint => write!(f, "no insertion point"),
      LowerError::MissingDefinition { name } => write!(f, "'{}' has no defining instruction", name),
    }
  }
}

impl std::error::Error for LowerError {}

impl LowerError {
  pub(crate) fn mismatch(
    expected: impl Into<String>,
    found: impl Into<String>,
  ) -> Self {
    LowerError::MetadataMismatch {
      expected: expected.into(),
      found: found.into(),
    }
  }

  pub(crate) fn unsupported(what: impl Into<String>) -> Self {
    LowerError::UnsupportedExpr { what: what.into() }
  }

  /// Tags the error with the failing declaration's span.
  pub fn into_diagnostic(
    self,
    at: Span,
  ) -> DiagnosticMessage {
    match self {
      LowerError::MetadataMismatch { expected, found } => DiagnosticMessage::MetadataMismatch { expected, found, at },
      LowerError::UnsupportedDecl { kind } => DiagnosticMessage::UnsupportedDeclaration { kind, at },
      LowerError::UnboundObject { name } => DiagnosticMessage::UnboundIdentifier { name, at },
      LowerError::UnsupportedExpr { what } => DiagnosticMessage::UnsupportedExpression { what, at },
      LowerError::InvalidAttribute { directive, reason } => {
        DiagnosticMessage::InvalidAttribute { directive, reason, at }
      },
      other => DiagnosticMessage::LoweringFailed {
        message: other.to_string(),
        at,
      },
    }
  }
}
