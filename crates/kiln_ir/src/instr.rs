use kiln_type::op::BinaryOperation;

use crate::{IrType, Operand, TempId};

/// A single instruction. Every value-producing instruction defines one temp.
#[derive(Debug, Clone, PartialEq)]
pub enum Instr {
  /// Stack slot for a value of `ty`. `dest` has type `ty*`.
  Alloca { dest: TempId, ty: IrType },

  /// Heap cell for a value of `ty`, zero-filled. `dest` has type `ty*`.
  HeapAlloc { dest: TempId, ty: IrType },

  /// `dest = *ptr`
  Load { dest: TempId, ptr: Operand },

  /// `*ptr = value`
  Store { ptr: Operand, value: Operand },

  /// `dest = left op right`
  BinOp {
    dest: TempId,
    op: BinaryOperation,
    left: Operand,
    right: Operand,
  },

  /// `dest = callee(args...)`
  Call {
    dest: Option<TempId>,
    callee: Operand,
    args: Vec<Operand>,
  },

  /// Build a struct value from its elements: `dest = {elements...}`
  Aggregate { dest: TempId, elements: Vec<Operand> },

  /// `dest = aggregate.index`
  Extract {
    dest: TempId,
    aggregate: Operand,
    index: u32,
  },
}

impl Instr {
  pub fn dest(&self) -> Option<TempId> {
    match self {
      Instr::Alloca { dest, .. }
      | Instr::HeapAlloc { dest, .. }
      | Instr::Load { dest, .. }
      | Instr::BinOp { dest, .. }
      | Instr::Aggregate { dest, .. }
      | Instr::Extract { dest, .. } => Some(*dest),
      Instr::Call { dest, .. } => *dest,
      Instr::Store { .. } => None,
    }
  }

  pub fn operands(&self) -> Vec<&Operand> {
    match self {
      Instr::Alloca { .. } | Instr::HeapAlloc { .. } => Vec::new(),
      Instr::Load { ptr, .. } => vec![ptr],
      Instr::Store { ptr, value } => vec![ptr, value],
      Instr::BinOp { left, right, .. } => vec![left, right],
      Instr::Call { callee, args, .. } => std::iter::once(callee).chain(args.iter()).collect(),
      Instr::Aggregate { elements, .. } => elements.iter().collect(),
      Instr::Extract { aggregate, .. } => vec![aggregate],
    }
  }

  pub fn operands_mut(&mut self) -> Vec<&mut Operand> {
    match self {
      Instr::Alloca { .. } | Instr::HeapAlloc { .. } => Vec::new(),
      Instr::Load { ptr, .. } => vec![ptr],
      Instr::Store { ptr, value } => vec![ptr, value],
      Instr::BinOp { left, right, .. } => vec![left, right],
      Instr::Call { callee, args, .. } => std::iter::once(callee).chain(args.iter_mut()).collect(),
      Instr::Aggregate { elements, .. } => elements.iter_mut().collect(),
      Instr::Extract { aggregate, .. } => vec![aggregate],
    }
  }
}
