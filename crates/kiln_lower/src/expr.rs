//! Expression lowering.

use kiln_ast::{ExprId, ExprKind};
use kiln_ir::Operand;
use kiln_type::{
  object::{ObjectId, ObjectKind},
  types::{Type, TypeId},
};

use crate::{
  context::{Binding, LowerCtx},
  error::{LowerError, LowerResult},
  types::const_value,
};

impl<'a> LowerCtx<'a> {
  /// Lowers an expression that must produce exactly one value.
  pub fn lower_expr(
    &mut self,
    id: ExprId,
  ) -> LowerResult<Operand> {
    let pkg = self.pkg;
    let expr = pkg.expr(&id);

    if let Some(constant) = &expr.constant {
      let ty = self.ir_type(&expr.ty);
      return Ok(Operand::Const(const_value(constant, &ty)?));
    }

    match &expr.kind {
      ExprKind::Literal => Err(LowerError::mismatch("constant value", "literal without one")),
      ExprKind::Ident(object) => self.lower_ident(object),
      ExprKind::Binary { op, left, right } => {
        let lty = pkg.expr(left).ty;
        let rty = pkg.expr(right).ty;
        let operand_ty = if pkg.types.is_untyped(&lty) { rty } else { lty };

        let left = self.lower_value_as(*left, &operand_ty)?;
        let right = self.lower_value_as(*right, &operand_ty)?;
        let ty = self.ir_type(&expr.ty);
        self.build_binop(*op, left, right, ty)
      },
      ExprKind::Call { callee, args } => self
        .lower_call(*callee, args)?
        .ok_or_else(|| LowerError::unsupported("call without a result used as a value")),
      ExprKind::AddressOf(object) => match self.binding(object) {
        Some(Binding::Var(var)) => {
          // The address may outlive the frame.
          self.promote_stack_var(var)?;
          Ok(self.var(&var).ptr.clone())
        },
        Some(Binding::Func(value)) => Ok(Operand::Func(value.func)),
        None => Err(LowerError::UnboundObject {
          name: pkg.objects.name_of(object).to_string(),
        }),
      },
      ExprKind::Deref(pointer) => {
        let ptr = self.lower_expr(*pointer)?;
        let ty = self.ir_type(&expr.ty);
        self.build_load(ptr, ty)
      },
    }
  }

  fn lower_ident(
    &mut self,
    object: &ObjectId,
  ) -> LowerResult<Operand> {
    let pkg = self.pkg;

    match self.binding(object) {
      Some(Binding::Var(var)) => {
        let (ptr, ty) = {
          let var = self.var(&var);
          (var.ptr.clone(), var.ty.clone())
        };
        return self.build_load(ptr, ty);
      },
      Some(Binding::Func(value)) => return Ok(Operand::Func(value.func)),
      None => {},
    }

    let obj = pkg.objects.get(object);
    match &obj.kind {
      ObjectKind::Var if pkg.pkgmap.is_package_level(object) && self.lower_forward_global(object)? => {
        match self.binding(object) {
          Some(_) => self.lower_ident(object),
          None => Err(LowerError::UnboundObject { name: obj.name.clone() }),
        }
      },
      ObjectKind::Func => Ok(Operand::Func(self.declare_function(*object)?.func)),
      ObjectKind::Const(value) => {
        let ty = self.ir_type(&obj.ty);
        Ok(Operand::Const(const_value(value, &ty)?))
      },
      _ => Err(LowerError::UnboundObject { name: obj.name.clone() }),
    }
  }

  /// Lowers `id` for storage into a slot of semantic type `dest`. Constants
  /// are converted to the destination type.
  pub fn lower_value_as(
    &mut self,
    id: ExprId,
    dest: &TypeId,
  ) -> LowerResult<Operand> {
    let expr = self.pkg.expr(&id);
    match &expr.constant {
      Some(constant) => {
        let ty = self.ir_type(dest);
        Ok(Operand::Const(const_value(constant, &ty)?))
      },
      None => self.lower_expr(id),
    }
  }

  /// Lowers an expression for its side effects only.
  pub fn lower_expr_effect(
    &mut self,
    id: ExprId,
  ) -> LowerResult<()> {
    let expr = self.pkg.expr(&id);
    if expr.constant.is_some() {
      return Ok(());
    }

    match &expr.kind {
      ExprKind::Call { callee, args } => self.lower_call(*callee, args).map(|_| ()),
      _ => self.lower_expr(id).map(|_| ()),
    }
  }

  /// Evaluates a multi-value call once and splits it into `count` components.
  pub fn lower_expr_multi(
    &mut self,
    id: ExprId,
    count: usize,
  ) -> LowerResult<Vec<Operand>> {
    let pkg = self.pkg;
    let expr = pkg.expr(&id);

    let ExprKind::Call { callee, args } = &expr.kind else {
      return Err(LowerError::unsupported("multi-value expression that is not a call"));
    };

    let Type::Tuple(elements) = pkg.types.get(&expr.ty) else {
      return Err(LowerError::mismatch("tuple type", format!("{:?}", pkg.types.get(&expr.ty))));
    };

    if elements.len() != count {
      return Err(LowerError::mismatch(
        format!("{} values", count),
        elements.len().to_string(),
      ));
    }

    let aggregate = self
      .lower_call(*callee, args)?
      .ok_or_else(|| LowerError::unsupported("multi-value call without results"))?;

    let mut components = Vec::with_capacity(count);
    for (index, element) in elements.iter().enumerate() {
      let ty = self.ir_type(element);
      components.push(self.build_extract(aggregate.clone(), index as u32, ty)?);
    }
    Ok(components)
  }

  /// Direct call of a function object. Arguments are converted to the
  /// parameter types; the receiver of a method call comes first.
  pub fn lower_call(
    &mut self,
    callee: ObjectId,
    args: &[ExprId],
  ) -> LowerResult<Option<Operand>> {
    let pkg = self.pkg;

    let value = match self.binding(&callee) {
      Some(Binding::Func(value)) => value,
      Some(Binding::Var(_)) => return Err(LowerError::unsupported("call through a variable")),
      None => self.declare_function(callee)?,
    };

    let sig = self.signature_of(&callee)?;
    let params: Vec<ObjectId> = sig.recv.iter().chain(sig.params.iter()).copied().collect();
    if params.len() != args.len() {
      return Err(LowerError::mismatch(
        format!("{} arguments", params.len()),
        args.len().to_string(),
      ));
    }

    let mut operands = Vec::with_capacity(args.len());
    for (arg, param) in args.iter().zip(&params) {
      let ty = pkg.objects.type_of(param);
      operands.push(self.lower_value_as(*arg, &ty)?);
    }

    self.build_call(value.func, operands)
  }
}
