use std::collections::HashSet;

use crate::{Block, BlockId, FuncId, Function, Instr, IrType, Module, Operand, TempId, Terminator};

/// Errors found during module verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
  /// A block of a defined function was never terminated.
  MissingTerminator { function: String, block: String },

  InvalidBlockRef {
    function: String,
    block: String,
    target: BlockId,
  },

  InvalidTempRef {
    function: String,
    block: String,
    temp: TempId,
  },

  InvalidParamRef {
    function: String,
    block: String,
    index: u32,
  },

  InvalidFuncRef {
    function: String,
    block: String,
    target: FuncId,
  },

  TempUsedBeforeDef {
    function: String,
    block: String,
    temp: TempId,
  },

  MissingReturnValue { function: String, block: String },

  UnexpectedReturnValue { function: String, block: String },

  ReturnTypeMismatch {
    function: String,
    block: String,
    expected: IrType,
    actual: IrType,
  },

  ArgumentCountMismatch {
    function: String,
    block: String,
    callee: String,
    expected: usize,
    actual: usize,
  },

  /// Load or store through an operand that is not pointer-typed.
  NonPointerAccess {
    function: String,
    block: String,
    actual: IrType,
  },
}

impl std::fmt::Display for VerifyError {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      VerifyError::MissingTerminator { function, block } => {
        write!(f, "{}: block {} has no terminator", function, block)
      },
      VerifyError::InvalidBlockRef {
        function,
        block,
        target,
      } => write!(f, "{}: {} branches to unknown block {}", function, block, target.index()),
      VerifyError::InvalidTempRef { function, block, temp } => {
        write!(f, "{}: {} references unknown temp %t{}", function, block, temp.index())
      },
      VerifyError::InvalidParamRef { function, block, index } => {
        write!(f, "{}: {} references unknown parameter %p{}", function, block, index)
      },
      VerifyError::InvalidFuncRef {
        function,
        block,
        target,
      } => write!(f, "{}: {} references unknown function {}", function, block, target.index()),
      VerifyError::TempUsedBeforeDef { function, block, temp } => {
        write!(f, "{}: {} uses %t{} before its definition", function, block, temp.index())
      },
      VerifyError::MissingReturnValue { function, block } => {
        write!(f, "{}: {} returns no value from a non-void function", function, block)
      },
      VerifyError::UnexpectedReturnValue { function, block } => {
        write!(f, "{}: {} returns a value from a void function", function, block)
      },
      VerifyError::ReturnTypeMismatch {
        function,
        block,
        expected,
        actual,
      } => write!(f, "{}: {} returns {}, expected {}", function, block, actual, expected),
      VerifyError::ArgumentCountMismatch {
        function,
        block,
        callee,
        expected,
        actual,
      } => write!(
        f,
        "{}: {} calls {} with {} arguments, expected {}",
        function, block, callee, actual, expected
      ),
      VerifyError::NonPointerAccess { function, block, actual } => {
        write!(f, "{}: {} accesses memory through non-pointer {}", function, block, actual)
      },
    }
  }
}

pub type VerifyResult = Result<(), Vec<VerifyError>>;

pub struct ModuleVerifier<'a> {
  module: &'a Module,
  errors: Vec<VerifyError>,
}

impl<'a> ModuleVerifier<'a> {
  pub fn new(module: &'a Module) -> Self {
    Self {
      module,
      errors: Vec::new(),
    }
  }

  pub fn verify(mut self) -> VerifyResult {
    for (id, func) in self.module.functions.iter() {
      if !func.is_declaration() {
        let name = if func.is_anonymous() {
          format!("@{}", id.index())
        } else {
          format!("@{}", func.name)
        };
        self.verify_function(&name, func);
      }
    }

    if self.errors.is_empty() {
      Ok(())
    } else {
      Err(self.errors)
    }
  }

  fn verify_function(
    &mut self,
    func_name: &str,
    func: &Function,
  ) {
    let mut defined_temps: HashSet<TempId> = HashSet::new();

    for block in func.blocks.get_all() {
      self.verify_block(func, func_name, block, &mut defined_temps);
    }
  }

  fn verify_block(
    &mut self,
    func: &Function,
    func_name: &str,
    block: &Block,
    defined_temps: &mut HashSet<TempId>,
  ) {
    for instr in &block.instructions {
      self.verify_instr(func, func_name, &block.label, instr, defined_temps);
    }

    match &block.terminator {
      Some(term) => self.verify_terminator(func, func_name, &block.label, term, defined_temps),
      None => self.errors.push(VerifyError::MissingTerminator {
        function: func_name.to_string(),
        block: block.label.clone(),
      }),
    }
  }

  fn verify_instr(
    &mut self,
    func: &Function,
    func_name: &str,
    block_name: &str,
    instr: &Instr,
    defined_temps: &mut HashSet<TempId>,
  ) {
    for operand in instr.operands() {
      self.check_operand(func, func_name, block_name, operand, defined_temps);
    }

    match instr {
      Instr::Load { ptr, .. } | Instr::Store { ptr, .. } => {
        self.check_pointer(func, func_name, block_name, ptr);
      },
      Instr::Call { callee, args, .. } => {
        if let Operand::Func(target) = callee {
          if let Some(target_fn) = self.module.functions.try_get(target) {
            if target_fn.ty.params.len() != args.len() {
              self.errors.push(VerifyError::ArgumentCountMismatch {
                function: func_name.to_string(),
                block: block_name.to_string(),
                callee: target_fn.name.clone(),
                expected: target_fn.ty.params.len(),
                actual: args.len(),
              });
            }
          }
        }
      },
      _ => {},
    }

    if let Some(dest) = instr.dest() {
      self.check_temp_exists(func, func_name, block_name, dest);
      defined_temps.insert(dest);
    }
  }

  fn verify_terminator(
    &mut self,
    func: &Function,
    func_name: &str,
    block_name: &str,
    term: &Terminator,
    defined_temps: &HashSet<TempId>,
  ) {
    match term {
      Terminator::Goto(target) => {
        self.check_block_exists(func, func_name, block_name, *target);
      },
      Terminator::Branch {
        condition,
        then_block,
        else_block,
      } => {
        self.check_operand(func, func_name, block_name, condition, defined_temps);
        self.check_block_exists(func, func_name, block_name, *then_block);
        self.check_block_exists(func, func_name, block_name, *else_block);
      },
      Terminator::Return(value) => {
        let ret_ty = &func.ty.ret;

        match value {
          Some(val) => {
            self.check_operand(func, func_name, block_name, val, defined_temps);

            if ret_ty.is_void() {
              self.errors.push(VerifyError::UnexpectedReturnValue {
                function: func_name.to_string(),
                block: block_name.to_string(),
              });
            } else if let Some(actual) = self.module.operand_type(func, val) {
              if &actual != ret_ty {
                self.errors.push(VerifyError::ReturnTypeMismatch {
                  function: func_name.to_string(),
                  block: block_name.to_string(),
                  expected: ret_ty.clone(),
                  actual,
                });
              }
            }
          },
          None => {
            if !ret_ty.is_void() {
              self.errors.push(VerifyError::MissingReturnValue {
                function: func_name.to_string(),
                block: block_name.to_string(),
              });
            }
          },
        }
      },
      Terminator::Unreachable => {},
    }
  }

  fn check_operand(
    &mut self,
    func: &Function,
    func_name: &str,
    block_name: &str,
    operand: &Operand,
    defined_temps: &HashSet<TempId>,
  ) {
    match operand {
      Operand::Temp(temp) => {
        if self.check_temp_exists(func, func_name, block_name, *temp) && !defined_temps.contains(temp) {
          self.errors.push(VerifyError::TempUsedBeforeDef {
            function: func_name.to_string(),
            block: block_name.to_string(),
            temp: *temp,
          });
        }
      },
      Operand::Param(index) => {
        if func.param_type(*index).is_none() {
          self.errors.push(VerifyError::InvalidParamRef {
            function: func_name.to_string(),
            block: block_name.to_string(),
            index: *index,
          });
        }
      },
      Operand::Func(target) => {
        if !self.module.functions.contains(target) {
          self.errors.push(VerifyError::InvalidFuncRef {
            function: func_name.to_string(),
            block: block_name.to_string(),
            target: *target,
          });
        }
      },
      Operand::Const(_) | Operand::Global(_) => {},
    }
  }

  fn check_pointer(
    &mut self,
    func: &Function,
    func_name: &str,
    block_name: &str,
    ptr: &Operand,
  ) {
    if let Some(ty) = self.module.operand_type(func, ptr) {
      if ty.pointee().is_none() {
        self.errors.push(VerifyError::NonPointerAccess {
          function: func_name.to_string(),
          block: block_name.to_string(),
          actual: ty,
        });
      }
    }
  }

  fn check_block_exists(
    &mut self,
    func: &Function,
    func_name: &str,
    block_name: &str,
    block_id: BlockId,
  ) {
    if !func.blocks.contains(&block_id) {
      self.errors.push(VerifyError::InvalidBlockRef {
        function: func_name.to_string(),
        block: block_name.to_string(),
        target: block_id,
      });
    }
  }

  fn check_temp_exists(
    &mut self,
    func: &Function,
    func_name: &str,
    block_name: &str,
    temp_id: TempId,
  ) -> bool {
    if func.temps.contains(&temp_id) {
      return true;
    }
    self.errors.push(VerifyError::InvalidTempRef {
      function: func_name.to_string(),
      block: block_name.to_string(),
      temp: temp_id,
    });
    false
  }
}

/// Verify every defined function of a module.
pub fn verify_module(module: &Module) -> VerifyResult {
  ModuleVerifier::new(module).verify()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::FnType;

  #[test]
  fn test_open_block_is_reported() {
    let mut module = Module::new("main");
    let f = module.add_function("main.f", FnType::nullary_void());
    module.function_mut(&f).create_block("entry");

    let errors = verify_module(&module).unwrap_err();
    assert_eq!(
      errors,
      vec![VerifyError::MissingTerminator {
        function: "@main.f".into(),
        block: "entry_0".into(),
      }]
    );
  }

  #[test]
  fn test_use_before_def_and_arity() {
    let mut module = Module::new("main");
    let callee = module.add_function("main.g", FnType::new(vec![IrType::I64], IrType::Void));
    let f = module.add_function("main.f", FnType::new(Vec::new(), IrType::I64));

    let func = module.function_mut(&f);
    let entry = func.create_block("entry");
    let early = func.alloc_temp(IrType::I64, None);
    func.emit(&entry, Instr::Call {
      dest: None,
      callee: Operand::Func(callee),
      args: vec![],
    });
    func.terminate(&entry, Terminator::Return(Some(Operand::Temp(early))));

    let errors = verify_module(&module).unwrap_err();
    assert!(matches!(errors[0], VerifyError::ArgumentCountMismatch { expected: 1, actual: 0, .. }));
    assert!(matches!(errors[1], VerifyError::TempUsedBeforeDef { .. }));
  }

  #[test]
  fn test_store_through_value_is_reported() {
    let mut module = Module::new("main");
    let f = module.add_function("main.f", FnType::new(vec![IrType::I64], IrType::Void));

    let func = module.function_mut(&f);
    let entry = func.create_block("entry");
    func.emit(&entry, Instr::Store {
      ptr: Operand::Param(0),
      value: Operand::int(1, IrType::I64),
    });
    func.terminate(&entry, Terminator::Return(None));

    let errors = verify_module(&module).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(matches!(errors[0], VerifyError::NonPointerAccess { .. }));
  }
}
