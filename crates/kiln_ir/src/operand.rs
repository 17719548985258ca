use ordered_float::OrderedFloat;

use crate::{FuncId, GlobalId, IrType, TempId};

/// A value usable as an instruction input.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
  /// Result of a previous instruction.
  Temp(TempId),
  /// The n-th parameter of the enclosing function.
  Param(u32),
  Const(ConstValue),
  /// Address of a function.
  Func(FuncId),
  /// Address of a global variable.
  Global(GlobalId),
}

/// Compile-time constant values.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
  Int(i64, IrType),
  Float(OrderedFloat<f64>, IrType),
  Bool(bool),
  Str(String),
  /// All-zero value of the given type.
  Zero(IrType),
  /// Undefined value of the given type.
  Undef(IrType),
}

impl ConstValue {
  pub fn ty(&self) -> IrType {
    match self {
      ConstValue::Int(_, ty) => ty.clone(),
      ConstValue::Float(_, ty) => ty.clone(),
      ConstValue::Bool(_) => IrType::I1,
      ConstValue::Str(_) => IrType::Str,
      ConstValue::Zero(ty) => ty.clone(),
      ConstValue::Undef(ty) => ty.clone(),
    }
  }
}

impl Operand {
  pub fn int(
    value: i64,
    ty: IrType,
  ) -> Self {
    Operand::Const(ConstValue::Int(value, ty))
  }

  pub fn zero(ty: IrType) -> Self {
    Operand::Const(ConstValue::Zero(ty))
  }

  pub fn as_temp(&self) -> Option<TempId> {
    match self {
      Operand::Temp(t) => Some(*t),
      _ => None,
    }
  }
}

impl std::fmt::Display for ConstValue {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      ConstValue::Int(v, ty) => write!(f, "{} {}", ty, v),
      ConstValue::Float(v, ty) => write!(f, "{} {}", ty, v),
      ConstValue::Bool(v) => write!(f, "i1 {}", v),
      ConstValue::Str(v) => write!(f, "str {:?}", v),
      ConstValue::Zero(ty) => write!(f, "{} zeroinitializer", ty),
      ConstValue::Undef(ty) => write!(f, "{} undef", ty),
    }
  }
}
