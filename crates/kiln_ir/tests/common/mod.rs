#![allow(dead_code)]

use kiln_ir::{ConstValue, FnType, FuncId, Global, Instr, IrType, Linkage, Module, Operand, Terminator, TypeDescriptor};
use kiln_type::op::BinaryOperation;

pub struct Sample {
  pub module: Module,
  pub add: FuncId,
  pub init: FuncId,
}

/// A small module with one of each kind of symbol.
pub fn sample_module() -> Sample {
  let mut module = Module::new("main");

  module.add_runtime_type(TypeDescriptor {
    name: "main.Point".into(),
    layout: IrType::Struct(vec![IrType::I64, IrType::I64]),
  });

  let count = module.add_global(Global {
    name: "main.count".into(),
    ty: IrType::I64,
    initializer: ConstValue::Int(3, IrType::I64),
    linkage: Linkage::External,
  });

  let print = module.add_function("io.print", FnType::new(vec![IrType::Str], IrType::Void));

  let add = module.add_function("main.add", FnType::new(vec![IrType::I64, IrType::I64], IrType::I64));
  {
    let func = module.function_mut(&add);
    let entry = func.create_block("entry");
    let sum = func.alloc_temp(IrType::I64, None);
    func.emit(&entry, Instr::BinOp {
      dest: sum,
      op: BinaryOperation::Add,
      left: Operand::Param(0),
      right: Operand::Param(1),
    });
    func.terminate(&entry, Terminator::Return(Some(Operand::Temp(sum))));
  }

  let init = module.add_function("", FnType::nullary_void());
  {
    let func = module.function_mut(&init);
    let entry = func.create_block("entry");
    let old = func.alloc_temp(IrType::I64, None);
    let next = func.alloc_temp(IrType::I64, Some("next".into()));
    func.emit(&entry, Instr::Load {
      dest: old,
      ptr: Operand::Global(count),
    });
    func.emit(&entry, Instr::BinOp {
      dest: next,
      op: BinaryOperation::Add,
      left: Operand::Temp(old),
      right: Operand::int(1, IrType::I64),
    });
    func.emit(&entry, Instr::Store {
      ptr: Operand::Global(count),
      value: Operand::Temp(next),
    });
    func.emit(&entry, Instr::Call {
      dest: None,
      callee: Operand::Func(print),
      args: vec![Operand::Const(ConstValue::Str("hi".into()))],
    });
    func.terminate(&entry, Terminator::Return(None));
  }

  Sample { module, add, init }
}
