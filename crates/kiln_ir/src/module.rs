use std::collections::HashMap;

use kiln_type::Store;

use crate::{ConstValue, FnType, FuncId, Function, GlobalId, IrType, Linkage, Operand};

/// A module-level variable.
#[derive(Debug, Clone)]
pub struct Global {
  pub name: String,
  /// Type of the stored value. The global itself is a `ty*`.
  pub ty: IrType,
  pub initializer: ConstValue,
  pub linkage: Linkage,
}

/// Runtime layout record for a declared named type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
  pub name: String,
  pub layout: IrType,
}

/// The output container: functions, globals and runtime type records.
#[derive(Debug, Clone, Default)]
pub struct Module {
  pub name: String,
  pub functions: Store<Function>,
  pub globals: Store<Global>,
  pub runtime_types: Vec<TypeDescriptor>,
  function_names: HashMap<String, FuncId>,
  global_names: HashMap<String, GlobalId>,
}

impl Module {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      ..Default::default()
    }
  }

  /// Adds a function declaration. Named functions become reachable through
  /// [`Module::named_function`] unless the name is already taken.
  pub fn add_function(
    &mut self,
    name: &str,
    ty: FnType,
  ) -> FuncId {
    let id = self.functions.alloc(Function::new(name, ty));
    if !name.is_empty() {
      self.function_names.entry(name.to_string()).or_insert(id);
    }
    id
  }

  pub fn named_function(
    &self,
    name: &str,
  ) -> Option<FuncId> {
    self.function_names.get(name).copied()
  }

  #[inline]
  pub fn function(
    &self,
    id: &FuncId,
  ) -> &Function {
    self.functions.get(id)
  }

  #[inline]
  pub fn function_mut(
    &mut self,
    id: &FuncId,
  ) -> &mut Function {
    self.functions.get_mut(id)
  }

  pub fn rename_function(
    &mut self,
    id: &FuncId,
    name: &str,
  ) {
    let old = std::mem::replace(&mut self.functions.get_mut(id).name, name.to_string());
    if self.function_names.get(&old) == Some(id) {
      self.function_names.remove(&old);
    }
    if !name.is_empty() {
      self.function_names.insert(name.to_string(), *id);
    }
  }

  pub fn add_global(
    &mut self,
    global: Global,
  ) -> GlobalId {
    let name = global.name.clone();
    let id = self.globals.alloc(global);
    if !name.is_empty() {
      self.global_names.entry(name).or_insert(id);
    }
    id
  }

  pub fn named_global(
    &self,
    name: &str,
  ) -> Option<GlobalId> {
    self.global_names.get(name).copied()
  }

  #[inline]
  pub fn global(
    &self,
    id: &GlobalId,
  ) -> &Global {
    self.globals.get(id)
  }

  #[inline]
  pub fn global_mut(
    &mut self,
    id: &GlobalId,
  ) -> &mut Global {
    self.globals.get_mut(id)
  }

  pub fn rename_global(
    &mut self,
    id: &GlobalId,
    name: &str,
  ) {
    let old = std::mem::replace(&mut self.globals.get_mut(id).name, name.to_string());
    if self.global_names.get(&old) == Some(id) {
      self.global_names.remove(&old);
    }
    if !name.is_empty() {
      self.global_names.insert(name.to_string(), *id);
    }
  }

  /// Records a runtime type descriptor. Returns `false` if one with the same name exists.
  pub fn add_runtime_type(
    &mut self,
    descriptor: TypeDescriptor,
  ) -> bool {
    if self.runtime_types.iter().any(|d| d.name == descriptor.name) {
      return false;
    }
    self.runtime_types.push(descriptor);
    true
  }

  pub fn runtime_type(
    &self,
    name: &str,
  ) -> Option<&TypeDescriptor> {
    self.runtime_types.iter().find(|d| d.name == name)
  }

  /// Type of `operand` as seen from inside `func`.
  pub fn operand_type(
    &self,
    func: &Function,
    operand: &Operand,
  ) -> Option<IrType> {
    match operand {
      Operand::Temp(t) => func.temps.try_get(t).map(|d| d.ty.clone()),
      Operand::Param(i) => func.param_type(*i).cloned(),
      Operand::Const(c) => Some(c.ty()),
      Operand::Func(f) => self
        .functions
        .try_get(f)
        .map(|f| IrType::ptr(IrType::Func(Box::new(f.ty.clone())))),
      Operand::Global(g) => self.globals.try_get(g).map(|g| IrType::ptr(g.ty.clone())),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_anonymous_functions_are_not_indexed() {
    let mut module = Module::new("main");
    let a = module.add_function("", FnType::nullary_void());
    let b = module.add_function("", FnType::nullary_void());

    assert_ne!(a, b);
    assert_eq!(module.named_function(""), None);
  }

  #[test]
  fn test_rename_function_moves_index() {
    let mut module = Module::new("main");
    let f = module.add_function("main.f", FnType::nullary_void());
    module.rename_function(&f, "exported_f");

    assert_eq!(module.named_function("main.f"), None);
    assert_eq!(module.named_function("exported_f"), Some(f));
    assert_eq!(module.function(&f).name, "exported_f");
  }

  #[test]
  fn test_runtime_types_are_deduplicated() {
    let mut module = Module::new("main");
    let point = TypeDescriptor {
      name: "main.Point".into(),
      layout: IrType::Struct(vec![IrType::I64, IrType::I64]),
    };

    assert!(module.add_runtime_type(point.clone()));
    assert!(!module.add_runtime_type(point));
    assert_eq!(module.runtime_types.len(), 1);
  }
}
