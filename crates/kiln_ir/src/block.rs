use crate::{BlockId, Instr, Operand};

/// A basic block: a sequence of instructions ending with a terminator.
#[derive(Debug, Clone)]
pub struct Block {
  /// Unique label within the function.
  pub label: String,
  pub instructions: Vec<Instr>,
  /// `None` while the block is still open.
  pub terminator: Option<Terminator>,
}

impl Block {
  pub fn new(label: String) -> Self {
    Self {
      label,
      instructions: Vec::new(),
      terminator: None,
    }
  }

  pub fn is_terminated(&self) -> bool {
    self.terminator.is_some()
  }
}

/// How control exits a basic block.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
  Goto(BlockId),

  Branch {
    condition: Operand,
    then_block: BlockId,
    else_block: BlockId,
  },

  Return(Option<Operand>),

  Unreachable,
}

impl Terminator {
  pub fn operands_mut(&mut self) -> Vec<&mut Operand> {
    match self {
      Terminator::Branch { condition, .. } => vec![condition],
      Terminator::Return(Some(value)) => vec![value],
      _ => Vec::new(),
    }
  }

  pub fn successors(&self) -> Vec<BlockId> {
    match self {
      Terminator::Goto(target) => vec![*target],
      Terminator::Branch {
        then_block, else_block, ..
      } => vec![*then_block, *else_block],
      _ => Vec::new(),
    }
  }
}
