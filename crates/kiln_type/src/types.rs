use std::collections::HashMap;

use crate::{Id, Store, object::ObjectId};

pub type TypeId = Id<Type>;

/// Semantic types as resolved by the type checker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
  Bool,
  Int,
  Int8,
  Int16,
  Int32,
  Int64,
  Uint8,
  Uint16,
  Uint32,
  Uint64,
  Float32,
  Float64,
  String,

  UntypedInt,
  UntypedFloat,
  UntypedBool,
  UntypedString,

  Pointer(TypeId),
  Named(NamedType),
  Struct(Vec<Field>),
  Tuple(Vec<TypeId>),
  Signature(Signature),

  Error,
}

/// A declared type name. `underlying` is patched after creation so that
/// self-referential declarations can be built.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedType {
  pub object: ObjectId,
  pub underlying: TypeId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
  pub name: String,
  pub ty: TypeId,
}

/// A function signature. Receiver, parameters and results are objects so
/// that lowering can bind them by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
  pub recv: Option<ObjectId>,
  pub params: Vec<ObjectId>,
  pub results: Vec<ObjectId>,
}

#[derive(Debug, Clone)]
pub struct TypeStore {
  types: Store<Type>,
  primitives: HashMap<Type, TypeId>,
  pointers: HashMap<TypeId, TypeId>,
  tuples: HashMap<Vec<TypeId>, TypeId>,
}

impl Default for TypeStore {
  fn default() -> Self {
    Self::new()
  }
}

impl TypeStore {
  pub fn new() -> Self {
    let mut store = Self {
      types: Store::new(),
      primitives: HashMap::new(),
      pointers: HashMap::new(),
      tuples: HashMap::new(),
    };
    store.init_primitives();
    store
  }

  fn init_primitives(&mut self) {
    let primitives = [
      Type::Bool,
      Type::Int,
      Type::Int8,
      Type::Int16,
      Type::Int32,
      Type::Int64,
      Type::Uint8,
      Type::Uint16,
      Type::Uint32,
      Type::Uint64,
      Type::Float32,
      Type::Float64,
      Type::String,
      Type::UntypedInt,
      Type::UntypedFloat,
      Type::UntypedBool,
      Type::UntypedString,
      Type::Error,
    ];

    for ty in primitives {
      let id = self.types.alloc(ty.clone());
      self.primitives.insert(ty, id);
    }
  }

  pub fn pointer(
    &mut self,
    inner: TypeId,
  ) -> TypeId {
    if let Some(&id) = self.pointers.get(&inner) {
      return id;
    }
    let id = self.types.alloc(Type::Pointer(inner));
    self.pointers.insert(inner, id);
    id
  }

  pub fn tuple(
    &mut self,
    elements: Vec<TypeId>,
  ) -> TypeId {
    if let Some(&id) = self.tuples.get(&elements) {
      return id;
    }
    let id = self.types.alloc(Type::Tuple(elements.clone()));
    self.tuples.insert(elements, id);
    id
  }

  /// Declare a named type whose underlying type is filled in later with
  /// [`TypeStore::set_underlying`].
  pub fn named(
    &mut self,
    object: ObjectId,
  ) -> TypeId {
    let error = self.error();
    self.types.alloc(Type::Named(NamedType {
      object,
      underlying: error,
    }))
  }

  pub fn set_underlying(
    &mut self,
    named: TypeId,
    underlying: TypeId,
  ) {
    if let Type::Named(n) = self.types.get_mut(&named) {
      n.underlying = underlying;
    }
  }

  pub fn structure(
    &mut self,
    fields: Vec<Field>,
  ) -> TypeId {
    self.types.alloc(Type::Struct(fields))
  }

  pub fn signature(
    &mut self,
    sig: Signature,
  ) -> TypeId {
    self.types.alloc(Type::Signature(sig))
  }

  #[inline]
  pub fn get(
    &self,
    id: &TypeId,
  ) -> &Type {
    self.types.get(id)
  }

  #[inline]
  pub fn bool(&self) -> TypeId {
    self.primitives[&Type::Bool]
  }
  #[inline]
  pub fn int(&self) -> TypeId {
    self.primitives[&Type::Int]
  }
  #[inline]
  pub fn int8(&self) -> TypeId {
    self.primitives[&Type::Int8]
  }
  #[inline]
  pub fn int32(&self) -> TypeId {
    self.primitives[&Type::Int32]
  }
  #[inline]
  pub fn int64(&self) -> TypeId {
    self.primitives[&Type::Int64]
  }
  #[inline]
  pub fn uint8(&self) -> TypeId {
    self.primitives[&Type::Uint8]
  }
  #[inline]
  pub fn float64(&self) -> TypeId {
    self.primitives[&Type::Float64]
  }
  #[inline]
  pub fn string(&self) -> TypeId {
    self.primitives[&Type::String]
  }
  #[inline]
  pub fn untyped_int(&self) -> TypeId {
    self.primitives[&Type::UntypedInt]
  }
  #[inline]
  pub fn untyped_float(&self) -> TypeId {
    self.primitives[&Type::UntypedFloat]
  }
  #[inline]
  pub fn untyped_bool(&self) -> TypeId {
    self.primitives[&Type::UntypedBool]
  }
  #[inline]
  pub fn untyped_string(&self) -> TypeId {
    self.primitives[&Type::UntypedString]
  }
  #[inline]
  pub fn error(&self) -> TypeId {
    self.primitives[&Type::Error]
  }

  pub fn is_untyped(
    &self,
    ty: &TypeId,
  ) -> bool {
    matches!(
      self.get(ty),
      Type::UntypedInt | Type::UntypedFloat | Type::UntypedBool | Type::UntypedString
    )
  }

  /// The pointee of a pointer type.
  pub fn pointee(
    &self,
    ty: &TypeId,
  ) -> Option<TypeId> {
    match self.get(ty) {
      Type::Pointer(inner) => Some(*inner),
      _ => None,
    }
  }

  /// Follows named types down to their underlying structure.
  pub fn underlying(
    &self,
    ty: &TypeId,
  ) -> TypeId {
    let mut current = *ty;
    // Bounded in case a malformed declaration names itself.
    for _ in 0..64 {
      match self.get(&current) {
        Type::Named(n) => current = n.underlying,
        _ => return current,
      }
    }
    self.error()
  }

  pub fn as_signature(
    &self,
    ty: &TypeId,
  ) -> Option<&Signature> {
    match self.get(ty) {
      Type::Signature(sig) => Some(sig),
      _ => None,
    }
  }

  pub fn as_named(
    &self,
    ty: &TypeId,
  ) -> Option<&NamedType> {
    match self.get(ty) {
      Type::Named(n) => Some(n),
      _ => None,
    }
  }

  #[inline]
  pub fn is_error(
    &self,
    ty: &TypeId,
  ) -> bool {
    matches!(self.get(ty), Type::Error)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_pointer_types_are_interned() {
    let mut types = TypeStore::new();
    let int = types.int();
    let a = types.pointer(int);
    let b = types.pointer(int);

    assert_eq!(a, b);
    assert_eq!(types.pointee(&a), Some(int));
    assert_eq!(types.pointee(&int), None);
  }

  #[test]
  fn test_named_underlying_is_patched() {
    let mut types = TypeStore::new();
    let named = types.named(ObjectId::new(0));
    assert!(types.is_error(&types.underlying(&named)));

    let string = types.string();
    types.set_underlying(named, string);
    assert_eq!(types.underlying(&named), string);
  }

  #[test]
  fn test_untyped_kinds() {
    let types = TypeStore::new();
    assert!(types.is_untyped(&types.untyped_int()));
    assert!(types.is_untyped(&types.untyped_string()));
    assert!(!types.is_untyped(&types.int()));
  }
}
