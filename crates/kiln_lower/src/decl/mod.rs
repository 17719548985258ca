//! Declaration lowering: the per-declaration entry point and the components
//! it routes to.

pub mod attribute;
mod body;
mod function;
mod global;
mod local;
mod shim;

use kiln_ast::{Decl, FuncDecl, GenDecl, GenKind, Spec, TypeSpec};
use kiln_config::DebugTrace;
use kiln_ir::TypeDescriptor;
use kiln_log::{log_dbg, trace_dbg};

use crate::{
  context::LowerCtx,
  error::{LowerError, LowerResult},
};

impl<'a> LowerCtx<'a> {
  /// Lowers one top-level declaration. A failure is recorded as a diagnostic
  /// at the declaration's position and does not stop the caller.
  pub fn lower_decl(
    &mut self,
    decl: &Decl,
  ) {
    trace_dbg!(
      self.config,
      DebugTrace::Decl,
      "lowering declaration at {}",
      self.sources.position(decl.span())
    );

    if let Err(err) = self.try_lower_decl(decl) {
      log_dbg!(self.config, "declaration failed: {}", err);
      self.report(err.into_diagnostic(decl.span().clone()));
    }
  }

  pub fn try_lower_decl(
    &mut self,
    decl: &Decl,
  ) -> LowerResult<()> {
    match decl {
      Decl::Func(func) => self.lower_func_decl(func),
      Decl::Gen(general) => self.lower_gen_decl(general),
      Decl::Bad { .. } => Err(LowerError::UnsupportedDecl {
        kind: decl.kind_name().to_string(),
      }),
    }
  }

  pub fn lower_func_decl(
    &mut self,
    decl: &FuncDecl,
  ) -> LowerResult<()> {
    let value = self.materialize_function(decl)?;

    if self.is_init_decl(decl) && !self.init_funcs.contains(&value.func) {
      self.init_funcs.push(value.func);
    }

    let Some(body) = &decl.body else {
      return Ok(());
    };

    let sig = match decl.name.object {
      Some(object) => self.signature_of(&object)?,
      None => Default::default(),
    };

    self.build_function_body(value, &sig, body)
  }

  /// Routes the specs of an `import`, `type`, `const` or `var` declaration.
  /// Also used for declarations inside function bodies.
  pub fn lower_gen_decl(
    &mut self,
    decl: &GenDecl,
  ) -> LowerResult<()> {
    match decl.kind {
      GenKind::Import | GenKind::Const => Ok(()),
      GenKind::Type => {
        for spec in &decl.specs {
          match spec {
            Spec::Type(type_spec) => self.register_runtime_type(type_spec)?,
            other => return Err(LowerError::mismatch("type spec", other.describe())),
          }
        }
        Ok(())
      },
      GenKind::Var => {
        for spec in &decl.specs {
          let Spec::Value(value_spec) = spec else {
            return Err(LowerError::mismatch("value spec", spec.describe()));
          };

          let package_level = value_spec
            .names
            .iter()
            .filter_map(|n| n.object)
            .any(|o| self.pkg.pkgmap.is_package_level(&o));

          if package_level || self.function_depth() == 0 {
            self.lower_global_spec(value_spec, &decl.doc)?;
          } else {
            self.lower_local_spec(value_spec)?;
          }
        }
        Ok(())
      },
    }
  }

  /// Records the runtime layout of a declared named type.
  fn register_runtime_type(
    &mut self,
    spec: &TypeSpec,
  ) -> LowerResult<()> {
    let pkg = self.pkg;
    let object = spec.name.object.ok_or_else(|| LowerError::UnboundObject {
      name: spec.name.name.clone(),
    })?;

    let ty = pkg.objects.type_of(&object);
    if pkg.types.as_named(&ty).is_none() {
      return Err(LowerError::mismatch("named type", format!("{:?}", pkg.types.get(&ty))));
    }

    let owner = pkg.pkgmap.package_of(&object).unwrap_or(&pkg.name);
    let descriptor = TypeDescriptor {
      name: format!("{}.{}", owner, spec.name.name),
      layout: self.ir_type(&ty),
    };
    self.module.add_runtime_type(descriptor);
    Ok(())
  }
}
