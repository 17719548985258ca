use kiln_ast::Block;
use kiln_ir::{FuncId, Operand, Terminator};
use kiln_type::types::Signature;

use crate::{
  context::{Binding, FuncValue, FunctionFrame, LowerCtx},
  error::LowerResult,
};

impl<'a> LowerCtx<'a> {
  /// Emits the body of a materialized function.
  ///
  /// Receiver and parameters, then named results, each get a stack slot at
  /// function entry. Named results start at their zero value. A function
  /// whose body already exists is left untouched.
  pub fn build_function_body(
    &mut self,
    value: FuncValue,
    sig: &Signature,
    body: &Block,
  ) -> LowerResult<()> {
    if !self.module.function(&value.func).is_declaration() {
      return Ok(());
    }

    self.with_saved_cursor(|ctx| {
      let entry = ctx.module.function_mut(&value.func).create_block("entry");
      ctx.position_at_end(value.func, entry);

      let pkg = ctx.pkg;
      for (index, param) in sig.recv.iter().chain(sig.params.iter()).enumerate() {
        let object = pkg.objects.get(param);
        if object.is_blank() {
          continue;
        }

        let var = ctx.alloc_stack_var(&object.name, object.ty)?;
        let ptr = ctx.var(&var).ptr.clone();
        ctx.build_store(ptr, Operand::Param(index as u32))?;
        ctx.bind(*param, Binding::Var(var));
      }

      let mut named_results = Vec::new();
      for result in &sig.results {
        let object = pkg.objects.get(result);
        if object.name.is_empty() {
          continue;
        }

        let var = ctx.alloc_stack_var(&object.name, object.ty)?;
        let (ptr, ty) = {
          let var = ctx.var(&var);
          (var.ptr.clone(), var.ty.clone())
        };
        ctx.build_store(ptr, Operand::zero(ty))?;
        if !object.is_blank() {
          ctx.bind(*result, Binding::Var(var));
        }
        named_results.push(var);
      }

      let frame = FunctionFrame {
        func: value.func,
        sig: sig.clone(),
        named_results,
      };
      ctx.with_function(frame, |ctx| ctx.lower_block(body))?;
      ctx.seal_last_block(value.func);

      if value.shim.is_some() {
        ctx.build_receiver_shim(value)?;
      }

      Ok(())
    })
  }

  /// Terminates the function's last block if the body left it open: a void
  /// return for functions without results, otherwise `unreachable`.
  fn seal_last_block(
    &mut self,
    func: FuncId,
  ) {
    let function = self.module.function_mut(&func);
    let Some(last) = function.last_block() else {
      return;
    };

    if function.is_terminated(&last) {
      return;
    }

    let term = if function.ty.ret.is_void() {
      Terminator::Return(None)
    } else {
      Terminator::Unreachable
    };
    function.terminate(&last, term);
  }
}
