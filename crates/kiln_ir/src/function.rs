use kiln_type::Store;

use crate::{Block, BlockId, FnType, Instr, IrType, Operand, TempId, Terminator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Linkage {
  #[default]
  External,
  Internal,
  Weak,
}

impl std::fmt::Display for Linkage {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      Linkage::External => write!(f, "external"),
      Linkage::Internal => write!(f, "internal"),
      Linkage::Weak => write!(f, "weak"),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FnAttribute {
  NoInline,
  AlwaysInline,
  NoReturn,
}

impl std::fmt::Display for FnAttribute {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      FnAttribute::NoInline => write!(f, "noinline"),
      FnAttribute::AlwaysInline => write!(f, "alwaysinline"),
      FnAttribute::NoReturn => write!(f, "noreturn"),
    }
  }
}

/// Metadata for a temporary value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempData {
  pub ty: IrType,
  /// Debug name, if the value came from a named source entity.
  pub name: Option<String>,
}

/// A function definition or, while it has no blocks, a declaration.
#[derive(Debug, Clone)]
pub struct Function {
  /// Symbol name. Empty for anonymous functions.
  pub name: String,
  pub ty: FnType,
  pub temps: Store<TempData>,
  pub blocks: Store<Block>,
  pub linkage: Linkage,
  pub attributes: Vec<FnAttribute>,
}

impl Function {
  pub fn new(
    name: &str,
    ty: FnType,
  ) -> Self {
    Self {
      name: name.to_string(),
      ty,
      temps: Store::new(),
      blocks: Store::new(),
      linkage: Linkage::External,
      attributes: Vec::new(),
    }
  }

  pub fn is_declaration(&self) -> bool {
    self.blocks.is_empty()
  }

  pub fn is_anonymous(&self) -> bool {
    self.name.is_empty()
  }

  pub fn entry(&self) -> Option<BlockId> {
    self.blocks.ids().next()
  }

  /// The most recently created block.
  pub fn last_block(&self) -> Option<BlockId> {
    self.blocks.ids().last()
  }

  pub fn create_block(
    &mut self,
    prefix: &str,
  ) -> BlockId {
    let label = format!("{}_{}", prefix, self.blocks.len());
    self.blocks.alloc(Block::new(label))
  }

  pub fn alloc_temp(
    &mut self,
    ty: IrType,
    name: Option<String>,
  ) -> TempId {
    self.temps.alloc(TempData { ty, name })
  }

  pub fn temp_type(
    &self,
    temp: &TempId,
  ) -> &IrType {
    &self.temps.get(temp).ty
  }

  pub fn param_type(
    &self,
    index: u32,
  ) -> Option<&IrType> {
    self.ty.params.get(index as usize)
  }

  pub fn emit(
    &mut self,
    block: &BlockId,
    instr: Instr,
  ) {
    self.blocks.get_mut(block).instructions.push(instr);
  }

  pub fn terminate(
    &mut self,
    block: &BlockId,
    term: Terminator,
  ) {
    self.blocks.get_mut(block).terminator = Some(term);
  }

  pub fn is_terminated(
    &self,
    block: &BlockId,
  ) -> bool {
    self.blocks.get(block).is_terminated()
  }

  /// Location of the instruction defining `temp`.
  pub fn find_def(
    &self,
    temp: &TempId,
  ) -> Option<(BlockId, usize)> {
    self.blocks.iter().find_map(|(id, block)| {
      block
        .instructions
        .iter()
        .position(|i| i.dest().as_ref() == Some(temp))
        .map(|index| (id, index))
    })
  }

  pub fn insert_before(
    &mut self,
    block: &BlockId,
    index: usize,
    instr: Instr,
  ) {
    self.blocks.get_mut(block).instructions.insert(index, instr);
  }

  pub fn remove(
    &mut self,
    block: &BlockId,
    index: usize,
  ) -> Instr {
    self.blocks.get_mut(block).instructions.remove(index)
  }

  /// Rewrites every use of `old` in this function to `new`. Returns the number of rewritten uses.
  pub fn replace_all_uses(
    &mut self,
    old: &Operand,
    new: &Operand,
  ) -> usize {
    let mut count = 0;

    for id in self.blocks.ids().collect::<Vec<_>>() {
      let block = self.blocks.get_mut(&id);

      for instr in &mut block.instructions {
        for operand in instr.operands_mut() {
          if operand == old {
            *operand = new.clone();
            count += 1;
          }
        }
      }

      if let Some(term) = &mut block.terminator {
        for operand in term.operands_mut() {
          if operand == old {
            *operand = new.clone();
            count += 1;
          }
        }
      }
    }

    count
  }

  pub fn uses_of(
    &self,
    operand: &Operand,
  ) -> usize {
    let mut count = 0;
    for block in self.blocks.get_all() {
      count += block
        .instructions
        .iter()
        .flat_map(|i| i.operands())
        .filter(|o| *o == operand)
        .count();
      if let Some(Terminator::Branch { condition, .. }) = &block.terminator {
        count += usize::from(condition == operand);
      }
      if let Some(Terminator::Return(Some(value))) = &block.terminator {
        count += usize::from(value == operand);
      }
    }
    count
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample() -> (Function, BlockId, TempId) {
    let mut func = Function::new("f", FnType::new(vec![IrType::I64], IrType::I64));
    let entry = func.create_block("entry");
    let slot = func.alloc_temp(IrType::ptr(IrType::I64), Some("x".into()));
    let value = func.alloc_temp(IrType::I64, None);

    func.emit(&entry, Instr::Alloca {
      dest: slot,
      ty: IrType::I64,
    });
    func.emit(&entry, Instr::Store {
      ptr: Operand::Temp(slot),
      value: Operand::Param(0),
    });
    func.emit(&entry, Instr::Load {
      dest: value,
      ptr: Operand::Temp(slot),
    });
    func.terminate(&entry, Terminator::Return(Some(Operand::Temp(value))));
    (func, entry, slot)
  }

  #[test]
  fn test_find_def_and_replace_uses() {
    let (mut func, entry, slot) = sample();
    assert_eq!(func.find_def(&slot), Some((entry, 0)));
    assert_eq!(func.uses_of(&Operand::Temp(slot)), 2);

    let heap = func.alloc_temp(IrType::ptr(IrType::I64), Some("x".into()));
    func.insert_before(&entry, 0, Instr::HeapAlloc {
      dest: heap,
      ty: IrType::I64,
    });
    let replaced = func.replace_all_uses(&Operand::Temp(slot), &Operand::Temp(heap));

    assert_eq!(replaced, 2);
    assert_eq!(func.uses_of(&Operand::Temp(slot)), 0);
    assert_eq!(func.find_def(&slot), Some((entry, 1)));
  }

  #[test]
  fn test_block_labels_are_unique() {
    let mut func = Function::new("", FnType::nullary_void());
    let a = func.create_block("entry");
    let b = func.create_block("then");

    assert_eq!(func.blocks.get(&a).label, "entry_0");
    assert_eq!(func.blocks.get(&b).label, "then_1");
    assert_eq!(func.last_block(), Some(b));
    assert!(func.is_anonymous());
  }
}
