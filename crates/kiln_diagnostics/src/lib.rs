pub mod diagnostic_report;
pub mod message;

use std::fmt::Write;

use colored::*;
use diagnostic_report::{Diagnostic, Severity};
use kiln_type::file::SourceMap;

/// Render a diagnostic in the one-line `file:line:col: message` form.
pub fn format_plain(
  diag: &Diagnostic,
  sm: &SourceMap,
) -> String {
  format!("{}: {}", sm.position(&diag.primary_span), diag.message)
}

pub fn format_plain_batch(
  diagnostics: &[Diagnostic],
  sm: &SourceMap,
) -> Vec<String> {
  diagnostics.iter().map(|d| format_plain(d, sm)).collect()
}

/// Machine-readable export of a diagnostic list.
pub fn to_json(diagnostics: &[Diagnostic]) -> Result<String, serde_json::Error> {
  serde_json::to_string_pretty(diagnostics)
}

/// Render a diagnostic the way a terminal shows it: colored headline, position,
/// the offending source line with a caret, then notes.
pub fn render(
  diag: &Diagnostic,
  sm: &SourceMap,
) -> String {
  let mut out = String::new();

  writeln!(out, "{}", header(diag)).unwrap();
  writeln!(out, "  {} {}", "-->".blue().bold(), sm.position(&diag.primary_span)).unwrap();

  if !diag.primary_span.is_synthetic() && sm.contains(&diag.primary_span.file) {
    for line in sm.snippet(&diag.primary_span).lines() {
      writeln!(out, "{}", line.dimmed()).unwrap();
    }
  }

  for note in &diag.notes {
    writeln!(out, "  {} {}", "note:".cyan().bold(), note).unwrap();
  }

  out
}

pub fn render_batch(
  diagnostics: &[Diagnostic],
  sm: &SourceMap,
) -> String {
  diagnostics.iter().map(|d| render(d, sm)).collect::<Vec<_>>().join("\n")
}

fn header(diag: &Diagnostic) -> String {
  let message = diag.message.bold();

  match diag.severity {
    Severity::Error => format!("{}[{}]: {}", "Error".red().bold(), diag.error_code.red().bold(), message),
    Severity::Warning => format!("{}[{}]: {}", "Warning".yellow().bold(), diag.error_code.yellow(), message),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use kiln_type::{BytePosition, span::Span};
  use message::DiagnosticMessage;

  #[test]
  fn test_plain_format_is_file_line_col() {
    let mut sm = SourceMap::new();
    let file = sm.add_virtual("main.kl", "package main\n\nfunc broken() {}\n".to_string());
    let at = Span::new(file, BytePosition(14), BytePosition(18));

    let diag = DiagnosticMessage::UnsupportedDeclaration {
      kind: "bad declaration".to_string(),
      at,
    }
    .report();

    assert_eq!(format_plain(&diag, &sm), "<main.kl>:3:1: unhandled declaration (bad declaration)");
    assert_eq!(diag.error_code, "L0002");
  }

  #[test]
  fn test_json_export() {
    let diag = DiagnosticMessage::LoweringFailed {
      message: "boom".to_string(),
      at: Span::synthetic(),
    }
    .report();

    let json = to_json(&[diag]).unwrap();
    assert!(json.contains("\"message\": \"boom\""));
    assert!(json.contains("\"severity\": \"error\""));
  }

  #[test]
  fn test_render_shows_snippet_and_note() {
    colored::control::set_override(false);

    let mut sm = SourceMap::new();
    let file = sm.add_virtual("main.kl", "package main\n\nfunc broken\n".to_string());
    let at = Span::new(file, BytePosition(14), BytePosition(18));

    let diag = DiagnosticMessage::UnsupportedDeclaration {
      kind: "bad declaration".to_string(),
      at,
    }
    .report();

    let expected = "\
Error[L0002]: unhandled declaration (bad declaration)
  --> <main.kl>:3:1
   3 | func broken
     | ^^^^
  note: the declaration was skipped
";
    assert_eq!(render(&diag, &sm), expected);
  }

  #[test]
  fn test_render_synthetic_span_has_no_snippet() {
    colored::control::set_override(false);

    let diag = DiagnosticMessage::LoweringFailed {
      message: "boom".to_string(),
      at: Span::synthetic(),
    }
    .report();

    let rendered = render_batch(&[diag.clone(), diag], &SourceMap::new());
    assert_eq!(rendered.matches("Error[L0099]: boom").count(), 2);
    assert!(rendered.contains("--> <synthetic>:0:0"));
    assert!(!rendered.contains('|'));
  }
}
