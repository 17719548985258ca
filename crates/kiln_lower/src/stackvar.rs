//! Addressable variable storage and stack-to-heap promotion.
//!
//! Consumers hold a [`VarId`], never the address itself, so promotion can
//! swap the backing storage without revisiting code that was already lowered.

use kiln_config::DebugTrace;
use kiln_ir::{FuncId, GlobalId, Instr, IrType, Operand};
use kiln_log::trace_dbg;
use kiln_type::types::TypeId;

use crate::{
  context::{LowerCtx, VarId},
  error::{LowerError, LowerResult},
};

#[derive(Debug, Clone, PartialEq)]
pub struct StackVar {
  pub name: String,
  /// Address of the storage.
  pub ptr: Operand,
  pub pointee: TypeId,
  pub ty: IrType,
  /// Owning function while the storage lives on its stack.
  pub owner: Option<FuncId>,
}

impl StackVar {
  pub fn is_stack_resident(&self) -> bool {
    self.owner.is_some()
  }
}

impl<'a> LowerCtx<'a> {
  /// Allocates a stack slot at the cursor, owned by the function under construction.
  pub fn alloc_stack_var(
    &mut self,
    name: &str,
    pointee: TypeId,
  ) -> LowerResult<VarId> {
    let cursor = self.cursor()?;
    let ty = self.ir_type(&pointee);
    let dest = self.new_temp(IrType::ptr(ty.clone()), Some(name.to_string()))?;
    self.emit(Instr::Alloca { dest, ty: ty.clone() })?;

    Ok(self.alloc_var(StackVar {
      name: name.to_string(),
      ptr: Operand::Temp(dest),
      pointee,
      ty,
      owner: Some(cursor.func),
    }))
  }

  /// Registers a module global as variable storage.
  pub fn global_var(
    &mut self,
    name: &str,
    global: GlobalId,
    pointee: TypeId,
  ) -> VarId {
    let ty = self.module.global(&global).ty.clone();
    self.alloc_var(StackVar {
      name: name.to_string(),
      ptr: Operand::Global(global),
      pointee,
      ty,
      owner: None,
    })
  }

  /// Moves a stack-resident variable to heap storage.
  ///
  /// The heap allocation is placed right before the stack allocation so it
  /// keeps the same dominance. Every use of the old address is rewritten and
  /// the stack slot is removed. Variables already off the stack are left alone.
  pub fn promote_stack_var(
    &mut self,
    id: VarId,
  ) -> LowerResult<()> {
    let var = self.var(&id).clone();
    let Some(owner) = var.owner else {
      return Ok(());
    };

    let missing = || LowerError::MissingDefinition { name: var.name.clone() };
    let old = var.ptr.as_temp().ok_or_else(missing)?;

    let func = self.module.function_mut(&owner);
    let (block, index) = func.find_def(&old).ok_or_else(missing)?;
    if !matches!(func.blocks.get(&block).instructions[index], Instr::Alloca { .. }) {
      return Err(missing());
    }

    let name = func.temps.get(&old).name.clone();
    let heap = func.alloc_temp(IrType::ptr(var.ty.clone()), name);
    func.insert_before(&block, index, Instr::HeapAlloc {
      dest: heap,
      ty: var.ty.clone(),
    });
    func.replace_all_uses(&Operand::Temp(old), &Operand::Temp(heap));
    func.remove(&block, index + 1);

    let stack_var = self.var_mut(&id);
    stack_var.ptr = Operand::Temp(heap);
    stack_var.owner = None;

    trace_dbg!(self.config, DebugTrace::Promote, "moved '{}' to the heap", var.name);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use kiln_ast::Package;
  use kiln_config::KilnConfig;
  use kiln_ir::{FnType, Terminator};
  use kiln_type::{file::SourceMap, op::BinaryOperation};

  #[test]
  fn test_promotion_keeps_position_and_rewrites_uses() {
    let pkg = Package::new("main");
    let sources = SourceMap::new();
    let config = KilnConfig::default();
    let mut ctx = LowerCtx::new(&pkg, &sources, &config);

    let f = ctx.module.add_function("main.f", FnType::new(Vec::new(), IrType::I64));
    let entry = ctx.module.function_mut(&f).create_block("entry");
    ctx.position_at_end(f, entry);

    let one = Operand::int(1, IrType::I64);
    let marker = ctx.build_binop(BinaryOperation::Add, one.clone(), one, IrType::I64).unwrap();
    let int = pkg.types.int();
    let var = ctx.alloc_stack_var("x", int).unwrap();
    let ptr = ctx.var(&var).ptr.clone();
    ctx.build_store(ptr.clone(), marker).unwrap();
    let value = ctx.build_load(ptr, IrType::I64).unwrap();
    ctx.terminate(Terminator::Return(Some(value))).unwrap();

    ctx.promote_stack_var(var).unwrap();

    let promoted = ctx.var(&var).clone();
    assert!(!promoted.is_stack_resident());

    let func = ctx.module.function(&f);
    let instrs = &func.blocks.get(&entry).instructions;
    assert!(matches!(instrs[0], Instr::BinOp { .. }));
    assert!(matches!(instrs[1], Instr::HeapAlloc { .. }));
    assert!(!instrs.iter().any(|i| matches!(i, Instr::Alloca { .. })));
    assert_eq!(func.uses_of(&promoted.ptr), 2);
    assert_eq!(func.temps.get(&promoted.ptr.as_temp().unwrap()).name.as_deref(), Some("x"));

    // A second promotion is a no-op.
    ctx.promote_stack_var(var).unwrap();
    assert_eq!(ctx.var(&var), &promoted);
  }
}
