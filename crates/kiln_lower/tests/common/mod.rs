#![allow(dead_code)]

use kiln_ast::{Package, builder::PackageBuilder};
use kiln_config::KilnConfig;
use kiln_ir::{FuncId, Instr, Module, Operand, eval::Machine};
use kiln_lower::{LowerOutput, lower_package};
use kiln_type::file::SourceMap;

/// Backing text for the test package. Byte offsets used with
/// `PackageBuilder::at` point into it.
pub const SOURCE: &str = "package main\n\nvar x = tick()\n\nfunc broken\n";

pub struct Fixture {
  pub sources: SourceMap,
  pub builder: PackageBuilder,
}

pub fn fixture() -> Fixture {
  let mut sources = SourceMap::new();
  let file = sources.add_file("main.kl", SOURCE.to_string());

  Fixture {
    sources,
    builder: PackageBuilder::new("main", file),
  }
}

pub fn config() -> KilnConfig {
  KilnConfig {
    quiet: true,
    ..KilnConfig::default()
  }
}

pub fn lower(
  pkg: &Package,
  sources: &SourceMap,
) -> LowerOutput {
  lower_package(pkg, sources, &config())
}

pub fn assert_clean(output: &LowerOutput) {
  assert!(output.diagnostics.is_empty(), "{:#?}", output.diagnostics);
  assert!(output.verify_errors.is_empty(), "{:#?}", output.verify_errors);
}

/// Runs variable initializers, then `init` functions.
pub fn run_inits(
  machine: &mut Machine,
  output: &LowerOutput,
) {
  for func in output.init_order() {
    machine.call(*func, Vec::new()).unwrap();
  }
}

/// Names of the globals `func` stores to, in instruction order.
pub fn stored_globals(
  module: &Module,
  func: &FuncId,
) -> Vec<String> {
  module
    .function(func)
    .blocks
    .get_all()
    .iter()
    .flat_map(|b| b.instructions.iter())
    .filter_map(|instr| match instr {
      Instr::Store {
        ptr: Operand::Global(g), ..
      } => Some(module.global(g).name.clone()),
      _ => None,
    })
    .collect()
}

pub fn count_instrs(
  module: &Module,
  func: &FuncId,
  pred: impl Fn(&Instr) -> bool,
) -> usize {
  module
    .function(func)
    .blocks
    .get_all()
    .iter()
    .flat_map(|b| b.instructions.iter())
    .filter(|i| pred(i))
    .count()
}
