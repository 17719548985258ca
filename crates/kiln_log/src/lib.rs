//! Logging utilities for the Kiln backend.
//!
//! Provides macros for:
//! - Phase logging (`phase_log!`, `phase_warn!`)
//! - Debug traces by category (`trace_dbg!`)
//! - Verbose logging (`log_dbg!`, `log_trc!`)
//!
//! All output goes to stderr to avoid mixing with dumps/stdout.

pub use colored;

use kiln_config::{DebugTrace, KilnConfig};

pub fn effective_verbose(config: &KilnConfig) -> u8 {
  if config.quiet {
    return 0;
  }

  if config.debug && config.verbose < 2 {
    return 2;
  }

  config.verbose
}

pub fn log_phase(config: &KilnConfig) -> bool {
  !config.quiet
}

pub fn log_debug(config: &KilnConfig) -> bool {
  effective_verbose(config) >= 2
}

pub fn log_trace(config: &KilnConfig) -> bool {
  effective_verbose(config) >= 3
}

pub fn debug_trace_enabled(
  config: &KilnConfig,
  trace: DebugTrace,
) -> bool {
  !config.quiet && (config.debug || config.debug_trace.contains(&trace))
}

/// Returns lowercase name of a DebugTrace variant for log output.
pub fn trace_name(trace: DebugTrace) -> &'static str {
  match trace {
    DebugTrace::Decl => "decl",
    DebugTrace::Promote => "promote",
    DebugTrace::Init => "init",
    DebugTrace::Verify => "verify",
  }
}

/// Log a compiler phase message with an arrow prefix.
///
/// # Examples
///
/// ```ignore
/// phase_log!(&config, "Lowering package {}", name);
/// ```
#[macro_export]
macro_rules! phase_log {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
    if $crate::log_phase($config) && $crate::effective_verbose($config) >= 1 {
      use $crate::colored::Colorize;
      eprintln!("{} {}", "-->".bright_green().bold(), format!($fmt $(, $arg)*));
    }
  }};
}

/// Log a warning during a phase (yellow arrow).
#[macro_export]
macro_rules! phase_warn {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
    if $crate::log_phase($config) {
      use $crate::colored::Colorize;
      eprintln!("{} {}", "-->".bright_yellow().bold(), format!($fmt $(, $arg)*));
    }
  }};
}

/// Log a debug trace for a specific lowering component.
///
/// Output format: `debug[component]: message`
///
/// ```ignore
/// trace_dbg!(&config, DebugTrace::Decl, "lowering declaration at {}", pos);
/// // Output: debug[decl]: lowering declaration at main.kl:3:1
/// ```
#[macro_export]
macro_rules! trace_dbg {
  ($config:expr, $trace:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
    if $crate::debug_trace_enabled($config, $trace) {
      eprintln!(
        "debug[{}]: {}",
        $crate::trace_name($trace),
        format!($fmt $(, $arg)*)
      );
    }
  }};
}

/// Log a verbose debug message (verbosity >= 2).
#[macro_export]
macro_rules! log_dbg {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
    if $crate::log_debug($config) {
      eprintln!("debug: {}", format!($fmt $(, $arg)*));
    }
  }};
}

/// Log a trace message (verbosity >= 3).
#[macro_export]
macro_rules! log_trc {
  ($config:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {{
    if $crate::log_trace($config) {
      eprintln!("trace: {}", format!($fmt $(, $arg)*));
    }
  }};
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_quiet_silences_everything() {
    let config = KilnConfig {
      quiet: true,
      debug: true,
      verbose: 3,
      ..KilnConfig::default()
    };

    assert_eq!(effective_verbose(&config), 0);
    assert!(!debug_trace_enabled(&config, DebugTrace::Decl));
  }

  #[test]
  fn test_debug_implies_verbose_two() {
    let config = KilnConfig {
      debug: true,
      ..KilnConfig::default()
    };

    assert_eq!(effective_verbose(&config), 2);
    assert!(debug_trace_enabled(&config, DebugTrace::Promote));
  }

  #[test]
  fn test_trace_categories() {
    let config = KilnConfig::default().with_trace(DebugTrace::Init);
    assert!(debug_trace_enabled(&config, DebugTrace::Init));
    assert!(!debug_trace_enabled(&config, DebugTrace::Verify));
  }
}
