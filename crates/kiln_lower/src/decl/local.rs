use kiln_ast::ValueSpec;
use kiln_ir::Operand;

use crate::{
  context::{Binding, LowerCtx},
  error::{LowerError, LowerResult},
};

impl<'a> LowerCtx<'a> {
  /// Storage and initialization for a `var` spec inside a function body.
  ///
  /// Initializers run inline at the declaration site, before the new names
  /// are bound. A spec whose names are already bound is skipped.
  pub fn lower_local_spec(
    &mut self,
    spec: &ValueSpec,
  ) -> LowerResult<()> {
    let pkg = self.pkg;

    if spec.names.iter().filter_map(|n| n.object).any(|o| self.is_bound(&o)) {
      return Ok(());
    }

    let values = &spec.values;
    let count = spec.names.len();

    let mut inits: Vec<Option<Operand>> = Vec::with_capacity(count);
    if values.is_empty() {
      inits.resize(count, None);
    } else if values.len() == count {
      for (ident, value) in spec.names.iter().zip(values) {
        match ident.object {
          Some(object) if !ident.is_blank() => {
            let ty = pkg.objects.type_of(&object);
            inits.push(Some(self.lower_value_as(*value, &ty)?));
          },
          _ => {
            self.lower_expr_effect(*value)?;
            inits.push(None);
          },
        }
      }
    } else if values.len() == 1 {
      inits = self.lower_expr_multi(values[0], count)?.into_iter().map(Some).collect();
    } else {
      return Err(LowerError::mismatch(format!("{} initializers", count), values.len().to_string()));
    }

    for (ident, init) in spec.names.iter().zip(inits) {
      if ident.is_blank() {
        continue;
      }

      let object = ident.object.ok_or_else(|| LowerError::UnboundObject {
        name: ident.name.clone(),
      })?;

      let var = self.alloc_stack_var(&ident.name, pkg.objects.type_of(&object))?;
      let (ptr, ty) = {
        let var = self.var(&var);
        (var.ptr.clone(), var.ty.clone())
      };
      self.build_store(ptr, init.unwrap_or_else(|| Operand::zero(ty)))?;
      self.bind(object, Binding::Var(var));
    }

    Ok(())
  }
}
