use serde::{Deserialize, Serialize};

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DumpKind {
  Ir,
  Symbols,
  Diagnostics,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DebugTrace {
  Decl,
  Promote,
  Init,
  Verify,
}

/// Options for the declaration lowering pass.
///
/// Expected format in kiln.toml:
/// ```toml
/// [lower]
/// verify = true
/// attribute_prefix = "#kiln"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LowerOptions {
  /// Run the IR verifier after a package has been lowered.
  pub verify: bool,
  /// Doc-comment prefix that introduces a declaration attribute.
  pub attribute_prefix: String,
}

impl Default for LowerOptions {
  fn default() -> Self {
    Self {
      verify: true,
      attribute_prefix: "#kiln".to_string(),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
  pub quiet: bool,
  pub verbose: u8,
  pub debug: bool,
  pub debug_trace: Vec<DebugTrace>,
  pub dump: Vec<DumpKind>,
  pub lower: LowerOptions,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
  Parse(String),
}

impl std::fmt::Display for ConfigError {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      ConfigError::Parse(msg) => write!(f, "invalid kiln.toml: {}", msg),
    }
  }
}

impl std::error::Error for ConfigError {}

impl KilnConfig {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse a `kiln.toml` document. Missing keys take their defaults.
  pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
    toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
  }

  pub fn with_trace(
    mut self,
    trace: DebugTrace,
  ) -> Self {
    if !self.debug_trace.contains(&trace) {
      self.debug_trace.push(trace);
    }
    self
  }

  pub fn wants_dump(
    &self,
    kind: DumpKind,
  ) -> bool {
    self.dump.contains(&kind)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_defaults_when_empty() {
    let config = KilnConfig::from_toml_str("").unwrap();
    assert!(config.lower.verify);
    assert_eq!(config.lower.attribute_prefix, "#kiln");
    assert!(config.debug_trace.is_empty());
  }

  #[test]
  fn test_parse_lower_table_and_traces() {
    let config = KilnConfig::from_toml_str(
      r#"
verbose = 2
debug_trace = ["decl", "promote"]
dump = ["ir"]

[lower]
verify = false
"#,
    )
    .unwrap();

    assert_eq!(config.verbose, 2);
    assert_eq!(config.debug_trace, vec![DebugTrace::Decl, DebugTrace::Promote]);
    assert!(config.wants_dump(DumpKind::Ir));
    assert!(!config.lower.verify);
    assert_eq!(config.lower.attribute_prefix, "#kiln");
  }

  #[test]
  fn test_malformed_config_is_an_error() {
    let err = KilnConfig::from_toml_str("verbose = \"loud\"").unwrap_err();
    assert!(err.to_string().starts_with("invalid kiln.toml:"));
  }
}
