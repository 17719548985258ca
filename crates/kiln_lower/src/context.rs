use std::collections::HashMap;

use kiln_ast::Package;
use kiln_config::KilnConfig;
use kiln_diagnostics::{diagnostic_report::Diagnostic, message::DiagnosticMessage};
use kiln_ir::{BlockId, FnType, FuncId, Function, Instr, IrType, Module, Operand, TempId, Terminator};
use kiln_type::{
  Id, Store,
  file::SourceMap,
  object::ObjectId,
  op::BinaryOperation,
  types::{Signature, TypeId},
};

use crate::{
  error::{LowerError, LowerResult},
  stackvar::StackVar,
  types::TypeLowering,
};

pub type VarId = Id<StackVar>;

/// Where newly built instructions are appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
  pub func: FuncId,
  pub block: BlockId,
}

/// A materialized function and, for value-receiver methods, its pointer-receiver entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuncValue {
  pub func: FuncId,
  pub shim: Option<FuncId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
  Func(FuncValue),
  Var(VarId),
}

/// One function whose body is being lowered.
#[derive(Debug, Clone)]
pub struct FunctionFrame {
  pub func: FuncId,
  pub sig: Signature,
  /// Storage of named results, in order. Empty for unnamed results.
  pub named_results: Vec<VarId>,
}

/// All mutable lowering state for one package.
pub struct LowerCtx<'a> {
  pub pkg: &'a Package,
  pub sources: &'a SourceMap,
  pub config: &'a KilnConfig,
  pub module: Module,

  cursor: Option<Cursor>,
  functions: Vec<FunctionFrame>,
  bindings: HashMap<ObjectId, Binding>,
  vars: Store<StackVar>,

  /// Synthesized variable initializers, in discovery order.
  pub var_init_funcs: Vec<FuncId>,
  /// User `init` functions, in discovery order.
  pub init_funcs: Vec<FuncId>,
  pub diagnostics: Vec<Diagnostic>,
}

impl<'a> LowerCtx<'a> {
  pub fn new(
    pkg: &'a Package,
    sources: &'a SourceMap,
    config: &'a KilnConfig,
  ) -> Self {
    Self {
      pkg,
      sources,
      config,
      module: Module::new(&pkg.name),
      cursor: None,
      functions: Vec::new(),
      bindings: HashMap::new(),
      vars: Store::new(),
      var_init_funcs: Vec::new(),
      init_funcs: Vec::new(),
      diagnostics: Vec::new(),
    }
  }

  // ========================================================================
  // Cursor and function nesting
  // ========================================================================

  pub fn cursor(&self) -> LowerResult<Cursor> {
    self.cursor.ok_or(LowerError::NoInsertionPoint)
  }

  pub fn position_at_end(
    &mut self,
    func: FuncId,
    block: BlockId,
  ) {
    self.cursor = Some(Cursor { func, block });
  }

  /// Runs `f` and restores the insertion cursor afterwards, whether `f` succeeded or not.
  pub fn with_saved_cursor<T>(
    &mut self,
    f: impl FnOnce(&mut Self) -> LowerResult<T>,
  ) -> LowerResult<T> {
    let saved = self.cursor;
    let result = f(self);
    self.cursor = saved;
    result
  }

  /// Runs `f` with `frame` on top of the nesting stack.
  pub fn with_function<T>(
    &mut self,
    frame: FunctionFrame,
    f: impl FnOnce(&mut Self) -> LowerResult<T>,
  ) -> LowerResult<T> {
    self.functions.push(frame);
    let result = f(self);
    self.functions.pop();
    result
  }

  pub fn current_function(&self) -> Option<&FunctionFrame> {
    self.functions.last()
  }

  pub fn function_depth(&self) -> usize {
    self.functions.len()
  }

  // ========================================================================
  // Bindings and storage
  // ========================================================================

  pub fn binding(
    &self,
    object: &ObjectId,
  ) -> Option<Binding> {
    self.bindings.get(object).copied()
  }

  pub fn bind(
    &mut self,
    object: ObjectId,
    binding: Binding,
  ) {
    self.bindings.insert(object, binding);
  }

  pub fn is_bound(
    &self,
    object: &ObjectId,
  ) -> bool {
    self.bindings.contains_key(object)
  }

  pub(crate) fn alloc_var(
    &mut self,
    var: StackVar,
  ) -> VarId {
    self.vars.alloc(var)
  }

  pub fn var(
    &self,
    id: &VarId,
  ) -> &StackVar {
    self.vars.get(id)
  }

  pub(crate) fn var_mut(
    &mut self,
    id: &VarId,
  ) -> &mut StackVar {
    self.vars.get_mut(id)
  }

  // ========================================================================
  // Types
  // ========================================================================

  pub fn ir_type(
    &self,
    ty: &TypeId,
  ) -> IrType {
    TypeLowering::new(&self.pkg.types, &self.pkg.objects).lower(ty)
  }

  pub fn fn_type(
    &self,
    sig: &Signature,
  ) -> FnType {
    TypeLowering::new(&self.pkg.types, &self.pkg.objects).signature(sig)
  }

  /// The resolved signature of a function object.
  pub fn signature_of(
    &self,
    object: &ObjectId,
  ) -> LowerResult<Signature> {
    let ty = self.pkg.objects.type_of(object);
    self
      .pkg
      .types
      .as_signature(&ty)
      .cloned()
      .ok_or_else(|| LowerError::mismatch("function signature", format!("{:?}", self.pkg.types.get(&ty))))
  }

  pub fn operand_type(
    &self,
    operand: &Operand,
  ) -> LowerResult<IrType> {
    let cursor = self.cursor()?;
    let func = self.module.function(&cursor.func);
    self
      .module
      .operand_type(func, operand)
      .ok_or_else(|| LowerError::unsupported(format!("operand {:?}", operand)))
  }

  // ========================================================================
  // Emission
  // ========================================================================

  fn current(&mut self) -> LowerResult<(&mut Function, BlockId)> {
    let cursor = self.cursor()?;
    Ok((self.module.function_mut(&cursor.func), cursor.block))
  }

  pub fn create_block(
    &mut self,
    prefix: &str,
  ) -> LowerResult<BlockId> {
    let (func, _) = self.current()?;
    Ok(func.create_block(prefix))
  }

  pub fn new_temp(
    &mut self,
    ty: IrType,
    name: Option<String>,
  ) -> LowerResult<TempId> {
    let (func, _) = self.current()?;
    Ok(func.alloc_temp(ty, name))
  }

  pub fn emit(
    &mut self,
    instr: Instr,
  ) -> LowerResult<()> {
    let (func, block) = self.current()?;
    func.emit(&block, instr);
    Ok(())
  }

  pub fn terminate(
    &mut self,
    term: Terminator,
  ) -> LowerResult<()> {
    let (func, block) = self.current()?;
    func.terminate(&block, term);
    Ok(())
  }

  pub fn is_terminated(&self) -> LowerResult<bool> {
    let cursor = self.cursor()?;
    Ok(self.module.function(&cursor.func).is_terminated(&cursor.block))
  }

  pub fn build_load(
    &mut self,
    ptr: Operand,
    ty: IrType,
  ) -> LowerResult<Operand> {
    let dest = self.new_temp(ty, None)?;
    self.emit(Instr::Load { dest, ptr })?;
    Ok(Operand::Temp(dest))
  }

  pub fn build_store(
    &mut self,
    ptr: Operand,
    value: Operand,
  ) -> LowerResult<()> {
    self.emit(Instr::Store { ptr, value })
  }

  pub fn build_binop(
    &mut self,
    op: BinaryOperation,
    left: Operand,
    right: Operand,
    ty: IrType,
  ) -> LowerResult<Operand> {
    let dest = self.new_temp(ty, None)?;
    self.emit(Instr::BinOp { dest, op, left, right })?;
    Ok(Operand::Temp(dest))
  }

  /// Direct call. Returns the result operand unless the callee returns void.
  pub fn build_call(
    &mut self,
    callee: FuncId,
    args: Vec<Operand>,
  ) -> LowerResult<Option<Operand>> {
    let ret = self.module.function(&callee).ty.ret.clone();
    let dest = if ret.is_void() {
      None
    } else {
      Some(self.new_temp(ret, None)?)
    };

    self.emit(Instr::Call {
      dest,
      callee: Operand::Func(callee),
      args,
    })?;

    Ok(dest.map(Operand::Temp))
  }

  pub fn build_aggregate(
    &mut self,
    elements: Vec<Operand>,
    ty: IrType,
  ) -> LowerResult<Operand> {
    let dest = self.new_temp(ty, None)?;
    self.emit(Instr::Aggregate { dest, elements })?;
    Ok(Operand::Temp(dest))
  }

  pub fn build_extract(
    &mut self,
    aggregate: Operand,
    index: u32,
    ty: IrType,
  ) -> LowerResult<Operand> {
    let dest = self.new_temp(ty, None)?;
    self.emit(Instr::Extract { dest, aggregate, index })?;
    Ok(Operand::Temp(dest))
  }

  // ========================================================================
  // Diagnostics
  // ========================================================================

  pub fn report(
    &mut self,
    message: DiagnosticMessage,
  ) {
    self.diagnostics.push(message.report());
  }
}
