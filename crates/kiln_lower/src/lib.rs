//! Declaration lowering: turns a type-checked package into an SSA module.
//!
//! Each top-level declaration is lowered independently. A failing
//! declaration is reported as a diagnostic and lowering moves on to the next.

pub mod context;
pub mod decl;
pub mod error;
pub mod expr;
pub mod stackvar;
pub mod stmt;
pub mod types;

use kiln_ast::Package;
use kiln_config::{DebugTrace, DumpKind, KilnConfig};
use kiln_diagnostics::diagnostic_report::Diagnostic;
use kiln_ir::{FuncId, Module, VerifyError, display, verify_module};
use kiln_log::{log_dbg, phase_log, phase_warn, trace_dbg};
use kiln_type::file::SourceMap;

pub use context::{Binding, Cursor, FuncValue, FunctionFrame, LowerCtx};
pub use error::{LowerError, LowerResult};

/// Everything lowering produced for one package.
#[derive(Debug)]
pub struct LowerOutput {
  pub module: Module,
  /// Synthesized variable initializers, in the order they must run.
  pub var_init_funcs: Vec<FuncId>,
  /// User `init` functions, run after every variable initializer.
  pub init_funcs: Vec<FuncId>,
  pub diagnostics: Vec<Diagnostic>,
  pub verify_errors: Vec<VerifyError>,
  /// Text dumps requested through `KilnConfig::dump`, in request order.
  pub dumps: Vec<(DumpKind, String)>,
}

impl LowerOutput {
  pub fn has_errors(&self) -> bool {
    !self.verify_errors.is_empty() || self.diagnostics.iter().any(Diagnostic::is_error)
  }

  /// Initializer functions in execution order.
  pub fn init_order(&self) -> impl Iterator<Item = &FuncId> {
    self.var_init_funcs.iter().chain(self.init_funcs.iter())
  }

  pub fn dump(
    &self,
    kind: DumpKind,
  ) -> Option<&str> {
    self.dumps.iter().find(|(k, _)| *k == kind).map(|(_, text)| text.as_str())
  }

  /// Diagnostics rendered for a terminal, with source snippets.
  pub fn render_diagnostics(
    &self,
    sources: &SourceMap,
  ) -> String {
    kiln_diagnostics::render_batch(&self.diagnostics, sources)
  }
}

pub fn lower_package(
  pkg: &Package,
  sources: &SourceMap,
  config: &KilnConfig,
) -> LowerOutput {
  phase_log!(config, "Lowering package {}", pkg.name);

  let mut ctx = LowerCtx::new(pkg, sources, config);
  for decl in pkg.decls() {
    ctx.lower_decl(decl);
  }

  let LowerCtx {
    module,
    var_init_funcs,
    init_funcs,
    diagnostics,
    ..
  } = ctx;

  let verify_errors = if config.lower.verify {
    trace_dbg!(config, DebugTrace::Verify, "verifying {} functions", module.functions.len());
    match verify_module(&module) {
      Ok(()) => Vec::new(),
      Err(errors) => {
        for error in &errors {
          phase_warn!(config, "verify: {}", error);
        }
        errors
      },
    }
  } else {
    Vec::new()
  };

  let dumps = collect_dumps(config, &module, &diagnostics);

  LowerOutput {
    module,
    var_init_funcs,
    init_funcs,
    diagnostics,
    verify_errors,
    dumps,
  }
}

fn collect_dumps(
  config: &KilnConfig,
  module: &Module,
  diagnostics: &[Diagnostic],
) -> Vec<(DumpKind, String)> {
  let mut dumps = Vec::new();

  for kind in &config.dump {
    let text = match kind {
      DumpKind::Ir => display::print_module(module),
      DumpKind::Symbols => display::format_symbol_table(module),
      DumpKind::Diagnostics => match kiln_diagnostics::to_json(diagnostics) {
        Ok(json) => json,
        Err(err) => {
          phase_warn!(config, "could not serialize diagnostics: {}", err);
          continue;
        },
      },
    };

    log_dbg!(config, "dump {:?}: {} bytes", kind, text.len());
    dumps.push((*kind, text));
  }

  dumps
}
