use kiln_ir::{Operand, Terminator};

use crate::{
  context::{FuncValue, LowerCtx},
  error::{LowerError, LowerResult},
};

impl<'a> LowerCtx<'a> {
  /// Fills in the pointer-receiver entry point of a value-receiver method:
  /// load the receiver through the pointer, forward everything to the
  /// canonical function and return its result.
  pub fn build_receiver_shim(
    &mut self,
    value: FuncValue,
  ) -> LowerResult<()> {
    let Some(shim) = value.shim else {
      return Ok(());
    };

    if !self.module.function(&shim).is_declaration() {
      return Ok(());
    }

    let canonical = self.module.function(&value.func).ty.clone();
    let recv_ty = canonical
      .params
      .first()
      .cloned()
      .ok_or_else(|| LowerError::mismatch("receiver parameter", "none"))?;

    self.with_saved_cursor(|ctx| {
      let entry = ctx.module.function_mut(&shim).create_block("entry");
      ctx.position_at_end(shim, entry);

      let recv = ctx.build_load(Operand::Param(0), recv_ty)?;
      let args = std::iter::once(recv)
        .chain((1..canonical.params.len()).map(|i| Operand::Param(i as u32)))
        .collect();

      let result = ctx.build_call(value.func, args)?;
      ctx.terminate(Terminator::Return(result))
    })
  }
}
