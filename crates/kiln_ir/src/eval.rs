//! Reference interpreter for lowered modules.
//!
//! Memory is a flat list of cells; a pointer is a cell address. Functions
//! without a body run as stubs: every call to one is logged and answered
//! with a registered value or the zero value of its result type.

use std::collections::HashMap;

use kiln_type::op::BinaryOperation;

use crate::{BlockId, ConstValue, FuncId, Function, GlobalId, Instr, IrType, Module, Operand, TempId, Terminator};

const DEFAULT_STEP_LIMIT: usize = 100_000;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Int(i64),
  Float(f64),
  Bool(bool),
  Str(String),
  Ptr(usize),
  Null,
  Tuple(Vec<Value>),
  Func(FuncId),
  Undef,
}

impl Value {
  pub fn zero(ty: &IrType) -> Self {
    match ty {
      IrType::I1 => Value::Bool(false),
      IrType::I8 | IrType::I16 | IrType::I32 | IrType::I64 => Value::Int(0),
      IrType::F32 | IrType::F64 => Value::Float(0.0),
      IrType::Str => Value::Str(String::new()),
      IrType::Ptr(_) | IrType::Func(_) => Value::Null,
      IrType::Struct(fields) => Value::Tuple(fields.iter().map(Value::zero).collect()),
      IrType::Void | IrType::Opaque(_) => Value::Undef,
    }
  }

  pub fn from_const(c: &ConstValue) -> Self {
    match c {
      ConstValue::Int(v, _) => Value::Int(*v),
      ConstValue::Float(v, _) => Value::Float(v.into_inner()),
      ConstValue::Bool(v) => Value::Bool(*v),
      ConstValue::Str(v) => Value::Str(v.clone()),
      ConstValue::Zero(ty) => Value::zero(ty),
      ConstValue::Undef(_) => Value::Undef,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
  StepLimit,
  UnknownFunction(String),
  InvalidPointer(Value),
  UndefinedTemp(TempId),
  TypeMismatch(String),
  DivisionByZero,
  Unreachable(String),
  OpenBlock(String),
}

impl std::fmt::Display for EvalError {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      EvalError::StepLimit => write!(f, "step limit exceeded"),
      EvalError::UnknownFunction(name) => write!(f, "unknown function '{}'", name),
      EvalError::InvalidPointer(v) => write!(f, "invalid pointer {:?}", v),
      EvalError::UndefinedTemp(t) => write!(f, "read of undefined temp %t{}", t.index()),
      EvalError::TypeMismatch(what) => write!(f, "type mismatch: {}", what),
      EvalError::DivisionByZero => write!(f, "division by zero"),
      EvalError::Unreachable(func) => write!(f, "reached unreachable in {}", func),
      EvalError::OpenBlock(label) => write!(f, "fell off unterminated block {}", label),
    }
  }
}

pub type EvalResult<T> = Result<T, EvalError>;

/// One call to a body-less function.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
  pub name: String,
  pub args: Vec<Value>,
}

pub struct Machine<'m> {
  module: &'m Module,
  memory: Vec<Value>,
  globals: HashMap<GlobalId, usize>,
  stubs: HashMap<String, Value>,
  calls: Vec<CallRecord>,
  steps: usize,
  step_limit: usize,
  stack_allocs: usize,
  heap_allocs: usize,
}

struct Frame {
  temps: Vec<Option<Value>>,
  params: Vec<Value>,
}

impl<'m> Machine<'m> {
  pub fn new(module: &'m Module) -> Self {
    let mut machine = Self {
      module,
      memory: Vec::new(),
      globals: HashMap::new(),
      stubs: HashMap::new(),
      calls: Vec::new(),
      steps: 0,
      step_limit: DEFAULT_STEP_LIMIT,
      stack_allocs: 0,
      heap_allocs: 0,
    };

    for (id, global) in module.globals.iter() {
      let addr = machine.alloc(Value::from_const(&global.initializer));
      machine.globals.insert(id, addr);
    }

    machine
  }

  pub fn with_step_limit(
    mut self,
    limit: usize,
  ) -> Self {
    self.step_limit = limit;
    self
  }

  /// Answer calls to the body-less function `name` with `value`.
  pub fn stub(
    &mut self,
    name: &str,
    value: Value,
  ) -> &mut Self {
    self.stubs.insert(name.to_string(), value);
    self
  }

  /// Allocates a fresh cell holding `value` and returns its address.
  pub fn alloc(
    &mut self,
    value: Value,
  ) -> usize {
    self.memory.push(value);
    self.memory.len() - 1
  }

  pub fn load(
    &self,
    ptr: &Value,
  ) -> EvalResult<Value> {
    match ptr {
      Value::Ptr(addr) if *addr < self.memory.len() => Ok(self.memory[*addr].clone()),
      other => Err(EvalError::InvalidPointer(other.clone())),
    }
  }

  fn store(
    &mut self,
    ptr: &Value,
    value: Value,
  ) -> EvalResult<()> {
    match ptr {
      Value::Ptr(addr) if *addr < self.memory.len() => {
        self.memory[*addr] = value;
        Ok(())
      },
      other => Err(EvalError::InvalidPointer(other.clone())),
    }
  }

  /// Current value of the global called `name`.
  pub fn global(
    &self,
    name: &str,
  ) -> Option<Value> {
    let id = self.module.named_global(name)?;
    let addr = self.globals.get(&id)?;
    self.memory.get(*addr).cloned()
  }

  pub fn calls(&self) -> &[CallRecord] {
    &self.calls
  }

  pub fn call_count(
    &self,
    name: &str,
  ) -> usize {
    self.calls.iter().filter(|c| c.name == name).count()
  }

  pub fn stack_allocs(&self) -> usize {
    self.stack_allocs
  }

  pub fn heap_allocs(&self) -> usize {
    self.heap_allocs
  }

  pub fn call_named(
    &mut self,
    name: &str,
    args: Vec<Value>,
  ) -> EvalResult<Option<Value>> {
    let id = self
      .module
      .named_function(name)
      .ok_or_else(|| EvalError::UnknownFunction(name.to_string()))?;
    self.call(id, args)
  }

  pub fn call(
    &mut self,
    id: FuncId,
    args: Vec<Value>,
  ) -> EvalResult<Option<Value>> {
    let module = self.module;
    let func = module
      .functions
      .try_get(&id)
      .ok_or_else(|| EvalError::UnknownFunction(format!("@{}", id.index())))?;

    if func.is_declaration() {
      return Ok(self.call_stub(func, args));
    }

    let mut frame = Frame {
      temps: vec![None; func.temps.len()],
      params: args,
    };

    let mut current = func
      .entry()
      .ok_or_else(|| EvalError::UnknownFunction(func.name.clone()))?;

    loop {
      match self.run_block(func, current, &mut frame)? {
        Flow::Jump(next) => current = next,
        Flow::Return(value) => return Ok(value),
      }
    }
  }

  fn call_stub(
    &mut self,
    func: &Function,
    args: Vec<Value>,
  ) -> Option<Value> {
    self.calls.push(CallRecord {
      name: func.name.clone(),
      args,
    });

    if func.ty.ret.is_void() {
      return None;
    }

    Some(
      self
        .stubs
        .get(&func.name)
        .cloned()
        .unwrap_or_else(|| Value::zero(&func.ty.ret)),
    )
  }

  fn run_block(
    &mut self,
    func: &Function,
    block_id: BlockId,
    frame: &mut Frame,
  ) -> EvalResult<Flow> {
    let block = func.blocks.get(&block_id);

    for instr in &block.instructions {
      self.tick()?;
      self.exec(instr, frame)?;
    }

    self.tick()?;
    match &block.terminator {
      Some(Terminator::Goto(target)) => Ok(Flow::Jump(*target)),
      Some(Terminator::Branch {
        condition,
        then_block,
        else_block,
      }) => match self.operand(condition, frame)? {
        Value::Bool(true) => Ok(Flow::Jump(*then_block)),
        Value::Bool(false) => Ok(Flow::Jump(*else_block)),
        other => Err(EvalError::TypeMismatch(format!("branch on {:?}", other))),
      },
      Some(Terminator::Return(value)) => {
        let value = match value {
          Some(v) => Some(self.operand(v, frame)?),
          None => None,
        };
        Ok(Flow::Return(value))
      },
      Some(Terminator::Unreachable) => Err(EvalError::Unreachable(func.name.clone())),
      None => Err(EvalError::OpenBlock(block.label.clone())),
    }
  }

  fn tick(&mut self) -> EvalResult<()> {
    self.steps += 1;
    if self.steps > self.step_limit {
      return Err(EvalError::StepLimit);
    }
    Ok(())
  }

  fn exec(
    &mut self,
    instr: &Instr,
    frame: &mut Frame,
  ) -> EvalResult<()> {
    match instr {
      Instr::Alloca { dest, .. } => {
        self.stack_allocs += 1;
        let addr = self.alloc(Value::Undef);
        set(frame, *dest, Value::Ptr(addr));
      },
      Instr::HeapAlloc { dest, ty } => {
        self.heap_allocs += 1;
        let addr = self.alloc(Value::zero(ty));
        set(frame, *dest, Value::Ptr(addr));
      },
      Instr::Load { dest, ptr } => {
        let ptr = self.operand(ptr, frame)?;
        let value = self.load(&ptr)?;
        set(frame, *dest, value);
      },
      Instr::Store { ptr, value } => {
        let ptr = self.operand(ptr, frame)?;
        let value = self.operand(value, frame)?;
        self.store(&ptr, value)?;
      },
      Instr::BinOp { dest, op, left, right } => {
        let left = self.operand(left, frame)?;
        let right = self.operand(right, frame)?;
        set(frame, *dest, binary(*op, left, right)?);
      },
      Instr::Call { dest, callee, args } => {
        let target = match self.operand(callee, frame)? {
          Value::Func(id) => id,
          other => return Err(EvalError::TypeMismatch(format!("call of {:?}", other))),
        };
        let args = args
          .iter()
          .map(|a| self.operand(a, frame))
          .collect::<EvalResult<Vec<_>>>()?;
        let result = self.call(target, args)?;
        if let Some(d) = dest {
          set(frame, *d, result.unwrap_or(Value::Undef));
        }
      },
      Instr::Aggregate { dest, elements } => {
        let elements = elements
          .iter()
          .map(|e| self.operand(e, frame))
          .collect::<EvalResult<Vec<_>>>()?;
        set(frame, *dest, Value::Tuple(elements));
      },
      Instr::Extract { dest, aggregate, index } => {
        let value = match self.operand(aggregate, frame)? {
          Value::Tuple(mut elements) if (*index as usize) < elements.len() => elements.swap_remove(*index as usize),
          other => return Err(EvalError::TypeMismatch(format!("extract {} of {:?}", index, other))),
        };
        set(frame, *dest, value);
      },
    }
    Ok(())
  }

  fn operand(
    &self,
    operand: &Operand,
    frame: &Frame,
  ) -> EvalResult<Value> {
    match operand {
      Operand::Temp(t) => frame
        .temps
        .get(t.index() as usize)
        .and_then(|v| v.clone())
        .ok_or(EvalError::UndefinedTemp(*t)),
      Operand::Param(i) => frame
        .params
        .get(*i as usize)
        .cloned()
        .ok_or_else(|| EvalError::TypeMismatch(format!("missing argument {}", i))),
      Operand::Const(c) => Ok(Value::from_const(c)),
      Operand::Func(f) => Ok(Value::Func(*f)),
      Operand::Global(g) => self
        .globals
        .get(g)
        .map(|addr| Value::Ptr(*addr))
        .ok_or(EvalError::InvalidPointer(Value::Null)),
    }
  }
}

enum Flow {
  Jump(BlockId),
  Return(Option<Value>),
}

fn set(
  frame: &mut Frame,
  temp: TempId,
  value: Value,
) {
  let index = temp.index() as usize;
  if index >= frame.temps.len() {
    frame.temps.resize(index + 1, None);
  }
  frame.temps[index] = Some(value);
}

fn binary(
  op: BinaryOperation,
  left: Value,
  right: Value,
) -> EvalResult<Value> {
  use BinaryOperation::*;

  let value = match (&left, &right) {
    (Value::Int(l), Value::Int(r)) => match op {
      Add => Value::Int(l.wrapping_add(*r)),
      Sub => Value::Int(l.wrapping_sub(*r)),
      Mul => Value::Int(l.wrapping_mul(*r)),
      Div => {
        if *r == 0 {
          return Err(EvalError::DivisionByZero);
        }
        Value::Int(l.wrapping_div(*r))
      },
      Equal => Value::Bool(l == r),
      NotEqual => Value::Bool(l != r),
      LessThan => Value::Bool(l < r),
      GreaterThan => Value::Bool(l > r),
    },
    (Value::Float(l), Value::Float(r)) => match op {
      Add => Value::Float(l + r),
      Sub => Value::Float(l - r),
      Mul => Value::Float(l * r),
      Div => Value::Float(l / r),
      Equal => Value::Bool(l == r),
      NotEqual => Value::Bool(l != r),
      LessThan => Value::Bool(l < r),
      GreaterThan => Value::Bool(l > r),
    },
    (Value::Str(l), Value::Str(r)) => match op {
      Add => Value::Str(format!("{}{}", l, r)),
      Equal => Value::Bool(l == r),
      NotEqual => Value::Bool(l != r),
      LessThan => Value::Bool(l < r),
      GreaterThan => Value::Bool(l > r),
      _ => return Err(EvalError::TypeMismatch(format!("{} on strings", op))),
    },
    (Value::Bool(l), Value::Bool(r)) => match op {
      Equal => Value::Bool(l == r),
      NotEqual => Value::Bool(l != r),
      _ => return Err(EvalError::TypeMismatch(format!("{} on booleans", op))),
    },
    _ => return Err(EvalError::TypeMismatch(format!("{} on {:?} and {:?}", op, left, right))),
  };

  Ok(value)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{FnType, Global, Linkage};

  #[test]
  fn test_globals_start_from_initializers() {
    let mut module = Module::new("main");
    module.add_global(Global {
      name: "main.x".into(),
      ty: IrType::I64,
      initializer: ConstValue::Int(7, IrType::I64),
      linkage: Linkage::External,
    });

    let machine = Machine::new(&module);
    assert_eq!(machine.global("main.x"), Some(Value::Int(7)));
  }

  #[test]
  fn test_stub_calls_are_logged() {
    let mut module = Module::new("main");
    let ext = module.add_function("io.read", FnType::new(Vec::new(), IrType::I64));
    let f = module.add_function("main.f", FnType::new(Vec::new(), IrType::I64));

    let func = module.function_mut(&f);
    let entry = func.create_block("entry");
    let a = func.alloc_temp(IrType::I64, None);
    let b = func.alloc_temp(IrType::I64, None);
    let sum = func.alloc_temp(IrType::I64, None);
    func.emit(&entry, Instr::Call {
      dest: Some(a),
      callee: Operand::Func(ext),
      args: vec![],
    });
    func.emit(&entry, Instr::Call {
      dest: Some(b),
      callee: Operand::Func(ext),
      args: vec![],
    });
    func.emit(&entry, Instr::BinOp {
      dest: sum,
      op: BinaryOperation::Add,
      left: Operand::Temp(a),
      right: Operand::Temp(b),
    });
    func.terminate(&entry, Terminator::Return(Some(Operand::Temp(sum))));

    let mut machine = Machine::new(&module);
    machine.stub("io.read", Value::Int(21));
    let result = machine.call_named("main.f", vec![]).unwrap();

    assert_eq!(result, Some(Value::Int(42)));
    assert_eq!(machine.call_count("io.read"), 2);
  }

  #[test]
  fn test_step_limit_stops_loops() {
    let mut module = Module::new("main");
    let f = module.add_function("main.spin", FnType::nullary_void());
    let func = module.function_mut(&f);
    let entry = func.create_block("entry");
    func.terminate(&entry, Terminator::Goto(entry));

    let mut machine = Machine::new(&module).with_step_limit(10);
    assert_eq!(machine.call(f, vec![]), Err(EvalError::StepLimit));
  }
}
