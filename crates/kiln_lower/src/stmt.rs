//! Statement lowering for function bodies and initializers.

use kiln_ast::{Block, ExprId, ExprKind, Stmt, StmtKind};
use kiln_ir::Terminator;

use crate::{
  context::{Binding, LowerCtx},
  error::{LowerError, LowerResult},
};

impl<'a> LowerCtx<'a> {
  /// Lowers statements in order. Statements after a terminator are dropped.
  pub fn lower_block(
    &mut self,
    block: &Block,
  ) -> LowerResult<()> {
    for stmt in &block.stmts {
      if self.is_terminated()? {
        break;
      }
      self.lower_stmt(stmt)?;
    }
    Ok(())
  }

  pub fn lower_stmt(
    &mut self,
    stmt: &Stmt,
  ) -> LowerResult<()> {
    match &stmt.kind {
      StmtKind::Expr(expr) => self.lower_expr_effect(*expr),
      StmtKind::Assign { target, value } => self.lower_assign(*target, *value),
      StmtKind::Decl(decl) => self.lower_gen_decl(decl),
      StmtKind::Return(values) => self.lower_return(values),
      StmtKind::If {
        condition,
        then_block,
        else_block,
      } => self.lower_if(*condition, then_block, else_block.as_ref()),
      StmtKind::Block(block) => self.lower_block(block),
    }
  }

  fn lower_assign(
    &mut self,
    target: ExprId,
    value: ExprId,
  ) -> LowerResult<()> {
    let pkg = self.pkg;
    let target_expr = pkg.expr(&target);

    // Promotion while lowering the value replaces the slot, so a variable's
    // pointer is read only after the value is lowered.
    let ptr = match &target_expr.kind {
      ExprKind::Ident(object) => match self.binding(object) {
        Some(Binding::Var(var)) => {
          let operand = self.lower_value_as(value, &target_expr.ty)?;
          let ptr = self.var(&var).ptr.clone();
          return self.build_store(ptr, operand);
        },
        _ => {
          return Err(LowerError::UnboundObject {
            name: pkg.objects.name_of(object).to_string(),
          });
        },
      },
      ExprKind::Deref(pointer) => self.lower_expr(*pointer)?,
      _ => return Err(LowerError::unsupported("assignment target")),
    };

    let operand = self.lower_value_as(value, &target_expr.ty)?;
    self.build_store(ptr, operand)
  }

  fn lower_return(
    &mut self,
    values: &[ExprId],
  ) -> LowerResult<()> {
    let frame = self
      .current_function()
      .cloned()
      .ok_or(LowerError::NoInsertionPoint)?;
    let ret_ty = self.module.function(&frame.func).ty.ret.clone();
    let result_count = frame.sig.results.len();

    let mut operands = if values.is_empty() {
      if frame.named_results.len() != result_count {
        return Err(LowerError::mismatch(
          format!("{} return values", result_count),
          "bare return",
        ));
      }

      let mut operands = Vec::with_capacity(result_count);
      for var in &frame.named_results {
        let (ptr, ty) = {
          let var = self.var(var);
          (var.ptr.clone(), var.ty.clone())
        };
        operands.push(self.build_load(ptr, ty)?);
      }
      operands
    } else if values.len() == 1 && result_count > 1 {
      // `return f()` forwarding a multi-value call: the call already yields the result struct.
      let operand = self.lower_expr(values[0])?;
      self.terminate(Terminator::Return(Some(operand)))?;
      return Ok(());
    } else if values.len() == result_count {
      let mut operands = Vec::with_capacity(result_count);
      for (value, result) in values.iter().zip(&frame.sig.results) {
        let ty = self.pkg.objects.type_of(result);
        operands.push(self.lower_value_as(*value, &ty)?);
      }
      operands
    } else {
      return Err(LowerError::mismatch(
        format!("{} return values", result_count),
        values.len().to_string(),
      ));
    };

    let term = match operands.len() {
      0 => Terminator::Return(None),
      1 => Terminator::Return(operands.pop()),
      _ => Terminator::Return(Some(self.build_aggregate(operands, ret_ty)?)),
    };
    self.terminate(term)
  }

  /// `if` with an optional `else`. The join block is created after both arms
  /// so it is laid out last.
  fn lower_if(
    &mut self,
    condition: ExprId,
    then_block: &Block,
    else_block: Option<&Block>,
  ) -> LowerResult<()> {
    let bool_ty = self.pkg.types.bool();
    let condition = self.lower_value_as(condition, &bool_ty)?;
    let origin = self.cursor()?;

    let then_id = self.create_block("then")?;
    self.position_at_end(origin.func, then_id);
    self.lower_block(then_block)?;
    let then_end = self.cursor()?;

    let else_arm = match else_block {
      Some(block) => {
        let else_id = self.create_block("else")?;
        self.position_at_end(origin.func, else_id);
        self.lower_block(block)?;
        Some((else_id, self.cursor()?))
      },
      None => None,
    };

    let join = self.create_block("endif")?;

    self.position_at_end(origin.func, origin.block);
    self.terminate(Terminator::Branch {
      condition,
      then_block: then_id,
      else_block: else_arm.map(|(id, _)| id).unwrap_or(join),
    })?;

    let mut arm_ends = vec![then_end];
    arm_ends.extend(else_arm.map(|(_, end)| end));
    for end in arm_ends {
      self.position_at_end(end.func, end.block);
      if !self.is_terminated()? {
        self.terminate(Terminator::Goto(join))?;
      }
    }

    self.position_at_end(origin.func, join);
    Ok(())
  }
}
