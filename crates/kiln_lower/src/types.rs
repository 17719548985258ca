//! Semantic to IR type mapping and constant conversion.

use kiln_ir::{ConstValue, FnType, IrType};
use kiln_type::{
  object::{ConstValue as SemConst, ObjectStore},
  types::{Signature, Type, TypeId, TypeStore},
};
use ordered_float::OrderedFloat;

use crate::error::{LowerError, LowerResult};

pub struct TypeLowering<'a> {
  types: &'a TypeStore,
  objects: &'a ObjectStore,
  /// Named types currently being laid out.
  visiting: Vec<TypeId>,
}

impl<'a> TypeLowering<'a> {
  pub fn new(
    types: &'a TypeStore,
    objects: &'a ObjectStore,
  ) -> Self {
    Self {
      types,
      objects,
      visiting: Vec::new(),
    }
  }

  pub fn lower(
    &mut self,
    ty: &TypeId,
  ) -> IrType {
    let types = self.types;
    match types.get(ty) {
      Type::Bool | Type::UntypedBool => IrType::I1,
      Type::Int8 | Type::Uint8 => IrType::I8,
      Type::Int16 | Type::Uint16 => IrType::I16,
      Type::Int32 | Type::Uint32 => IrType::I32,
      Type::Int | Type::Int64 | Type::Uint64 | Type::UntypedInt => IrType::I64,
      Type::Float32 => IrType::F32,
      Type::Float64 | Type::UntypedFloat => IrType::F64,
      Type::String | Type::UntypedString => IrType::Str,
      Type::Pointer(inner) => IrType::ptr(self.lower(inner)),
      Type::Named(named) => {
        let name = self.objects.name_of(&named.object).to_string();
        if self.visiting.contains(ty) {
          return IrType::Opaque(name);
        }

        self.visiting.push(*ty);
        let underlying = named.underlying;
        let lowered = self.lower(&underlying);
        self.visiting.pop();
        lowered
      },
      Type::Struct(fields) => IrType::Struct(fields.iter().map(|f| self.lower(&f.ty)).collect()),
      Type::Tuple(elements) => match elements.as_slice() {
        [] => IrType::Void,
        elements => IrType::Struct(elements.iter().map(|e| self.lower(e)).collect()),
      },
      Type::Signature(sig) => IrType::Func(Box::new(self.signature(sig))),
      Type::Error => IrType::Opaque("error".to_string()),
    }
  }

  /// Function type of `sig`. The receiver, if any, becomes the first parameter;
  /// several results are returned as one struct.
  pub fn signature(
    &mut self,
    sig: &Signature,
  ) -> FnType {
    let params = sig
      .recv
      .iter()
      .chain(sig.params.iter())
      .map(|p| {
        let ty = self.objects.type_of(p);
        self.lower(&ty)
      })
      .collect();

    let mut results: Vec<IrType> = sig
      .results
      .iter()
      .map(|r| {
        let ty = self.objects.type_of(r);
        self.lower(&ty)
      })
      .collect();

    let ret = match results.len() {
      0 => IrType::Void,
      1 => results.remove(0),
      _ => IrType::Struct(results),
    };

    FnType::new(params, ret)
  }
}

/// Converts a checker constant to the IR representation of `ty`.
pub fn const_value(
  value: &SemConst,
  ty: &IrType,
) -> LowerResult<ConstValue> {
  match (value, ty) {
    (SemConst::Int(v), t) if t.is_integer() => Ok(ConstValue::Int(*v, t.clone())),
    (SemConst::Int(v), t) if t.is_float() => Ok(ConstValue::Float(OrderedFloat(*v as f64), t.clone())),
    (SemConst::Float(v), t) if t.is_float() => Ok(ConstValue::Float(*v, t.clone())),
    (SemConst::Float(v), t) if t.is_integer() && v.0.fract() == 0.0 => Ok(ConstValue::Int(v.0 as i64, t.clone())),
    (SemConst::Bool(v), IrType::I1) => Ok(ConstValue::Bool(*v)),
    (SemConst::String(v), IrType::Str) => Ok(ConstValue::Str(v.clone())),
    _ => Err(LowerError::mismatch(format!("{} constant", ty), value.to_string())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use kiln_type::{
    object::{Object, ObjectKind},
    span::Span,
    types::Field,
  };

  #[test]
  fn test_recursive_named_type_is_cut() {
    let mut types = TypeStore::new();
    let mut objects = ObjectStore::new();
    let error = types.error();
    let node_obj = objects.alloc(Object {
      name: "Node".into(),
      kind: ObjectKind::TypeName,
      ty: error,
      span: Span::synthetic(),
    });
    let node = types.named(node_obj);
    let node_ptr = types.pointer(node);
    let int = types.int();
    let layout = types.structure(vec![
      Field {
        name: "value".into(),
        ty: int,
      },
      Field {
        name: "next".into(),
        ty: node_ptr,
      },
    ]);
    types.set_underlying(node, layout);

    let lowered = TypeLowering::new(&types, &objects).lower(&node);
    assert_eq!(
      lowered,
      IrType::Struct(vec![IrType::I64, IrType::ptr(IrType::Opaque("Node".into()))])
    );
  }

  #[test]
  fn test_untyped_constants_take_destination_type() {
    assert_eq!(
      const_value(&SemConst::Int(3), &IrType::I32),
      Ok(ConstValue::Int(3, IrType::I32))
    );
    assert_eq!(
      const_value(&SemConst::Int(2), &IrType::F64),
      Ok(ConstValue::Float(OrderedFloat(2.0), IrType::F64))
    );
    assert!(const_value(&SemConst::String("x".into()), &IrType::I64).is_err());
  }
}
