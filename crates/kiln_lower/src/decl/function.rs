use kiln_ast::FuncDecl;
use kiln_ir::{FnType, IrType};
use kiln_log::{log_dbg, log_trc};
use kiln_type::{
  object::ObjectId,
  types::{Signature, Type},
};

use crate::{
  context::{Binding, FuncValue, LowerCtx},
  error::{LowerError, LowerResult},
};

/// A receiverless, parameterless `init`. A package may hold many of these.
fn is_package_init(
  name: &str,
  sig: &Signature,
) -> bool {
  name == "init" && sig.recv.is_none() && sig.params.is_empty() && sig.results.is_empty()
}

impl<'a> LowerCtx<'a> {
  /// Symbol name of a function object: `pkg.name`, `pkg.T.name` for value
  /// receivers, `pkg.*T.name` for pointer receivers. Package initializers are
  /// anonymous.
  pub fn mangle_function(
    &self,
    object: &ObjectId,
    sig: &Signature,
  ) -> LowerResult<String> {
    let pkg = self.pkg;
    let name = pkg.objects.name_of(object);
    let owner = pkg.pkgmap.package_of(object).unwrap_or(&pkg.name);

    let Some(recv) = sig.recv else {
      if is_package_init(name, sig) {
        return Ok(String::new());
      }
      return Ok(format!("{}.{}", owner, name));
    };

    let recv_ty = pkg.objects.type_of(&recv);
    let (star, base) = match pkg.types.get(&recv_ty) {
      Type::Pointer(inner) => ("*", *inner),
      _ => ("", recv_ty),
    };

    let named = pkg
      .types
      .as_named(&base)
      .ok_or_else(|| LowerError::mismatch("named receiver type", format!("{:?}", pkg.types.get(&base))))?;
    let type_name = pkg.objects.name_of(&named.object);

    Ok(format!("{}.{}{}.{}", owner, star, type_name, name))
  }

  /// Returns the function bound to `object`, creating its declaration on first use.
  pub fn declare_function(
    &mut self,
    object: ObjectId,
  ) -> LowerResult<FuncValue> {
    match self.binding(&object) {
      Some(Binding::Func(value)) => return Ok(value),
      Some(Binding::Var(_)) => {
        return Err(LowerError::mismatch("function", "variable"));
      },
      None => {},
    }

    let sig = self.signature_of(&object)?;
    let name = self.mangle_function(&object, &sig)?;

    if !name.is_empty() {
      if let Some(func) = self.module.named_function(&name) {
        log_dbg!(self.config, "reusing function {}", name);
        let value = FuncValue {
          func,
          shim: self.module.named_function(&format!("*{}", name)),
        };
        self.bind(object, Binding::Func(value));
        return Ok(value);
      }
    }

    let fn_ty = self.fn_type(&sig);
    log_trc!(self.config, "declaring @{}: {}", name, fn_ty);
    let func = self.module.add_function(&name, fn_ty.clone());

    let value_receiver = sig
      .recv
      .is_some_and(|recv| self.pkg.types.pointee(&self.pkg.objects.type_of(&recv)).is_none());

    let shim = if value_receiver {
      let mut shim_ty: FnType = fn_ty;
      if let Some(first) = shim_ty.params.first_mut() {
        *first = IrType::ptr(first.clone());
      }
      Some(self.module.add_function(&format!("*{}", name), shim_ty))
    } else {
      None
    };

    let value = FuncValue { func, shim };
    self.bind(object, Binding::Func(value));
    Ok(value)
  }

  /// Materializes the function a declaration introduces and applies its attributes.
  pub fn materialize_function(
    &mut self,
    decl: &FuncDecl,
  ) -> LowerResult<FuncValue> {
    let value = match decl.name.object {
      Some(object) => self.declare_function(object)?,
      None => FuncValue {
        func: self.module.add_function("", FnType::nullary_void()),
        shim: None,
      },
    };

    let attributes = self.parse_doc_attributes(&decl.doc)?;
    self.apply_function_attributes(value.func, &attributes);

    Ok(value)
  }

  pub(crate) fn is_init_decl(
    &self,
    decl: &FuncDecl,
  ) -> bool {
    match decl.name.object {
      None => decl.name.name == "init",
      Some(object) => self
        .signature_of(&object)
        .map(|sig| is_package_init(&decl.name.name, &sig))
        .unwrap_or(false),
    }
  }
}
