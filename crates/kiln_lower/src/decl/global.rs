use kiln_ast::{Decl, GenKind, Spec, ValueSpec};
use kiln_config::DebugTrace;
use kiln_ir::{ConstValue, FnType, Global, GlobalId, Linkage, Terminator};
use kiln_log::{log_dbg, trace_dbg};
use kiln_type::{object::ObjectId, types::Signature};

use crate::{
  context::{Binding, FunctionFrame, LowerCtx, VarId},
  error::{LowerError, LowerResult},
  types::const_value,
};

impl<'a> LowerCtx<'a> {
  /// Storage and initialization for one package-level `var` spec.
  ///
  /// Constant initializers are folded into the global's initial value. If any
  /// member of a one-to-one group is not constant, the whole group is
  /// evaluated in source order inside a synthesized initializer function.
  /// A single multi-value initializer is evaluated once and destructured.
  pub fn lower_global_spec(
    &mut self,
    spec: &ValueSpec,
    doc: &[String],
  ) -> LowerResult<()> {
    let pkg = self.pkg;

    if spec.names.iter().filter_map(|n| n.object).any(|o| self.is_bound(&o)) {
      return Ok(());
    }

    let attributes = self.parse_doc_attributes(doc)?;

    let mut storage: Vec<Option<(VarId, GlobalId)>> = Vec::with_capacity(spec.names.len());
    for ident in &spec.names {
      if ident.is_blank() {
        storage.push(None);
        continue;
      }

      let object = ident.object.ok_or_else(|| LowerError::UnboundObject {
        name: ident.name.clone(),
      })?;
      let pointee = pkg.objects.type_of(&object);
      let ty = self.ir_type(&pointee);
      let owner = pkg.pkgmap.package_of(&object).unwrap_or(&pkg.name);

      let global = self.module.add_global(Global {
        name: format!("{}.{}", owner, ident.name),
        ty: ty.clone(),
        initializer: ConstValue::Zero(ty),
        linkage: Linkage::External,
      });
      self.apply_global_attributes(global, &attributes)?;

      let var = self.global_var(&ident.name, global, pointee);
      self.bind(object, Binding::Var(var));
      storage.push(Some((var, global)));
    }

    let values = &spec.values;
    if values.is_empty() {
      return Ok(());
    }

    if values.len() == storage.len() {
      let mut all_constant = true;
      for (slot, value) in storage.iter().zip(values) {
        match (&pkg.expr(value).constant, slot) {
          (Some(constant), Some((var, global))) => {
            let folded = const_value(constant, &self.var(var).ty)?;
            self.module.global_mut(global).initializer = folded;
          },
          (Some(_), None) => {},
          (None, _) => all_constant = false,
        }
      }

      if all_constant {
        return Ok(());
      }

      return self.build_var_init(|ctx| {
        for (slot, value) in storage.iter().zip(values) {
          match slot {
            Some((var, _)) => {
              let pointee = ctx.var(var).pointee;
              let operand = ctx.lower_value_as(*value, &pointee)?;
              let ptr = ctx.var(var).ptr.clone();
              ctx.build_store(ptr, operand)?;
            },
            None => ctx.lower_expr_effect(*value)?,
          }
        }
        Ok(())
      });
    }

    if values.len() == 1 {
      for (var, global) in storage.iter().flatten() {
        let ty = self.var(var).ty.clone();
        self.module.global_mut(global).initializer = ConstValue::Undef(ty);
      }

      return self.build_var_init(|ctx| {
        let components = ctx.lower_expr_multi(values[0], storage.len())?;
        for (slot, component) in storage.iter().zip(components) {
          if let Some((var, _)) = slot {
            let ptr = ctx.var(var).ptr.clone();
            ctx.build_store(ptr, component)?;
          }
        }
        Ok(())
      });
    }

    Err(LowerError::mismatch(
      format!("{} initializers", storage.len()),
      values.len().to_string(),
    ))
  }

  /// Lowers the package-level `var` spec that declares `object` ahead of its
  /// position in source. Returns false when no such spec exists.
  pub fn lower_forward_global(
    &mut self,
    object: &ObjectId,
  ) -> LowerResult<bool> {
    let pkg = self.pkg;

    for decl in pkg.decls() {
      let Decl::Gen(general) = decl else {
        continue;
      };
      if general.kind != GenKind::Var {
        continue;
      }

      for spec in &general.specs {
        let Spec::Value(value) = spec else {
          continue;
        };
        if value.names.iter().any(|n| n.object.as_ref() == Some(object)) {
          log_dbg!(self.config, "forward reference to '{}'", pkg.objects.name_of(object));
          self.lower_global_spec(value, &general.doc)?;
          return Ok(true);
        }
      }
    }

    Ok(false)
  }

  /// Builds a nullary initializer function around `f` and appends it to the
  /// package's variable initializers.
  fn build_var_init(
    &mut self,
    f: impl FnOnce(&mut Self) -> LowerResult<()>,
  ) -> LowerResult<()> {
    let func = self.module.add_function("", FnType::nullary_void());

    self.with_saved_cursor(|ctx| {
      let entry = ctx.module.function_mut(&func).create_block("entry");
      ctx.position_at_end(func, entry);

      let frame = FunctionFrame {
        func,
        sig: Signature::default(),
        named_results: Vec::new(),
      };
      ctx.with_function(frame, f)?;
      ctx.terminate(Terminator::Return(None))
    })?;

    trace_dbg!(self.config, DebugTrace::Init, "variable initializer @{}", func.index());
    self.var_init_funcs.push(func);
    Ok(())
  }
}
