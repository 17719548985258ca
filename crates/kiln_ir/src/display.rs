use std::fmt::Write;

use ascii_table::AsciiTable;

use crate::{Block, Function, Instr, Module, Operand, Terminator};

/// Pretty printer for modules.
pub struct ModulePrinter<'a> {
  module: &'a Module,
  output: String,
}

impl<'a> ModulePrinter<'a> {
  pub fn new(module: &'a Module) -> Self {
    Self {
      module,
      output: String::new(),
    }
  }

  pub fn print(mut self) -> String {
    writeln!(self.output, "; module {}", self.module.name).unwrap();

    if !self.module.runtime_types.is_empty() {
      writeln!(self.output).unwrap();
      for descriptor in &self.module.runtime_types {
        writeln!(self.output, "type {} = {}", descriptor.name, descriptor.layout).unwrap();
      }
    }

    if !self.module.globals.is_empty() {
      writeln!(self.output).unwrap();
      for (id, global) in self.module.globals.iter() {
        let name = if global.name.is_empty() {
          id.index().to_string()
        } else {
          global.name.clone()
        };
        writeln!(
          self.output,
          "@{} = {} global {}",
          name, global.linkage, global.initializer
        )
        .unwrap();
      }
    }

    for (id, func) in self.module.functions.iter() {
      writeln!(self.output).unwrap();
      self.print_function(id.index(), func);
    }

    self.output
  }

  fn print_function(
    &mut self,
    index: u32,
    func: &Function,
  ) {
    let name = if func.is_anonymous() {
      index.to_string()
    } else {
      func.name.clone()
    };

    let params: Vec<String> = func
      .ty
      .params
      .iter()
      .enumerate()
      .map(|(i, ty)| format!("{} %p{}", ty, i))
      .collect();

    let attrs = if func.attributes.is_empty() {
      String::new()
    } else {
      let attrs: Vec<String> = func.attributes.iter().map(|a| a.to_string()).collect();
      format!(" [{}]", attrs.join(", "))
    };

    let keyword = if func.is_declaration() { "declare" } else { "define" };
    write!(
      self.output,
      "{} {} {} @{}({}){}",
      keyword,
      func.linkage,
      func.ty.ret,
      name,
      params.join(", "),
      attrs
    )
    .unwrap();

    if func.is_declaration() {
      writeln!(self.output).unwrap();
      return;
    }

    writeln!(self.output, " {{").unwrap();
    for block in func.blocks.get_all() {
      self.print_block(func, block);
    }
    writeln!(self.output, "}}").unwrap();
  }

  fn print_block(
    &mut self,
    func: &Function,
    block: &Block,
  ) {
    writeln!(self.output, "{}:", block.label).unwrap();

    for instr in &block.instructions {
      write!(self.output, "  ").unwrap();
      self.print_instr(func, instr);
    }

    write!(self.output, "  ").unwrap();
    match &block.terminator {
      Some(term) => self.print_terminator(func, term),
      None => writeln!(self.output, "<open>").unwrap(),
    }
  }

  fn print_instr(
    &mut self,
    func: &Function,
    instr: &Instr,
  ) {
    let text = match instr {
      Instr::Alloca { dest, ty } => format!("%t{} = alloca {}", dest.index(), ty),
      Instr::HeapAlloc { dest, ty } => format!("%t{} = heapalloc {}", dest.index(), ty),
      Instr::Load { dest, ptr } => format!("%t{} = load {}", dest.index(), self.operand(func, ptr)),
      Instr::Store { ptr, value } => format!("store {}, {}", self.operand(func, value), self.operand(func, ptr)),
      Instr::BinOp { dest, op, left, right } => format!(
        "%t{} = {} {}, {}",
        dest.index(),
        op,
        self.operand(func, left),
        self.operand(func, right)
      ),
      Instr::Call { dest, callee, args } => {
        let args: Vec<String> = args.iter().map(|a| self.operand(func, a)).collect();
        let call = format!("call {}({})", self.operand(func, callee), args.join(", "));
        match dest {
          Some(d) => format!("%t{} = {}", d.index(), call),
          None => call,
        }
      },
      Instr::Aggregate { dest, elements } => {
        let elements: Vec<String> = elements.iter().map(|e| self.operand(func, e)).collect();
        format!("%t{} = aggregate {{{}}}", dest.index(), elements.join(", "))
      },
      Instr::Extract { dest, aggregate, index } => {
        format!("%t{} = extract {}, {}", dest.index(), self.operand(func, aggregate), index)
      },
    };

    let name = instr
      .dest()
      .and_then(|d| func.temps.try_get(&d))
      .and_then(|d| d.name.as_deref());
    match name {
      Some(name) => writeln!(self.output, "{}  ; {}", text, name).unwrap(),
      None => writeln!(self.output, "{}", text).unwrap(),
    }
  }

  fn print_terminator(
    &mut self,
    func: &Function,
    term: &Terminator,
  ) {
    let text = match term {
      Terminator::Goto(target) => format!("br {}", func.blocks.get(target).label),
      Terminator::Branch {
        condition,
        then_block,
        else_block,
      } => format!(
        "br {}, {}, {}",
        self.operand(func, condition),
        func.blocks.get(then_block).label,
        func.blocks.get(else_block).label
      ),
      Terminator::Return(Some(value)) => format!("ret {}", self.operand(func, value)),
      Terminator::Return(None) => "ret void".to_string(),
      Terminator::Unreachable => "unreachable".to_string(),
    };
    writeln!(self.output, "{}", text).unwrap();
  }

  fn operand(
    &self,
    _func: &Function,
    operand: &Operand,
  ) -> String {
    match operand {
      Operand::Temp(t) => format!("%t{}", t.index()),
      Operand::Param(i) => format!("%p{}", i),
      Operand::Const(c) => c.to_string(),
      Operand::Func(f) => {
        let func = self.module.function(f);
        if func.is_anonymous() {
          format!("@{}", f.index())
        } else {
          format!("@{}", func.name)
        }
      },
      Operand::Global(g) => {
        let global = self.module.global(g);
        if global.name.is_empty() {
          format!("@{}", g.index())
        } else {
          format!("@{}", global.name)
        }
      },
    }
  }
}

pub fn print_module(module: &Module) -> String {
  ModulePrinter::new(module).print()
}

/// One row per module symbol: kind, name, type, linkage.
pub fn symbol_rows(module: &Module) -> Vec<Vec<String>> {
  let mut rows = Vec::new();

  for global in module.globals.get_all() {
    rows.push(vec![
      "global".to_string(),
      global.name.clone(),
      global.ty.to_string(),
      global.linkage.to_string(),
    ]);
  }

  for (id, func) in module.functions.iter() {
    let kind = if func.is_declaration() { "declare" } else { "define" };
    let name = if func.is_anonymous() {
      format!("<{}>", id.index())
    } else {
      func.name.clone()
    };
    rows.push(vec![kind.to_string(), name, func.ty.to_string(), func.linkage.to_string()]);
  }

  for descriptor in &module.runtime_types {
    rows.push(vec![
      "type".to_string(),
      descriptor.name.clone(),
      descriptor.layout.to_string(),
      String::new(),
    ]);
  }

  rows
}

pub fn format_symbol_table(module: &Module) -> String {
  let mut ascii_table = AsciiTable::default();
  ascii_table.column(0).set_header("Kind");
  ascii_table.column(1).set_header("Name");
  ascii_table.column(2).set_header("Type");
  ascii_table.column(3).set_header("Linkage");

  ascii_table.format(symbol_rows(module))
}
