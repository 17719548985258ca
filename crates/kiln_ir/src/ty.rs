/// Machine-level value types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
  Void,
  I1,
  I8,
  I16,
  I32,
  I64,
  F32,
  F64,
  Str,
  Ptr(Box<IrType>),
  Struct(Vec<IrType>),
  Func(Box<FnType>),
  /// Named type that could not be laid out (recursive or erroneous).
  Opaque(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FnType {
  pub params: Vec<IrType>,
  pub ret: IrType,
}

impl FnType {
  pub fn new(
    params: Vec<IrType>,
    ret: IrType,
  ) -> Self {
    Self { params, ret }
  }

  pub fn nullary_void() -> Self {
    Self::new(Vec::new(), IrType::Void)
  }
}

impl IrType {
  pub fn ptr(inner: IrType) -> Self {
    IrType::Ptr(Box::new(inner))
  }

  pub fn pointee(&self) -> Option<&IrType> {
    match self {
      IrType::Ptr(inner) => Some(inner),
      _ => None,
    }
  }

  pub fn is_void(&self) -> bool {
    matches!(self, IrType::Void)
  }

  pub fn is_integer(&self) -> bool {
    matches!(self, IrType::I8 | IrType::I16 | IrType::I32 | IrType::I64)
  }

  pub fn is_float(&self) -> bool {
    matches!(self, IrType::F32 | IrType::F64)
  }
}

impl std::fmt::Display for IrType {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      IrType::Void => write!(f, "void"),
      IrType::I1 => write!(f, "i1"),
      IrType::I8 => write!(f, "i8"),
      IrType::I16 => write!(f, "i16"),
      IrType::I32 => write!(f, "i32"),
      IrType::I64 => write!(f, "i64"),
      IrType::F32 => write!(f, "f32"),
      IrType::F64 => write!(f, "f64"),
      IrType::Str => write!(f, "str"),
      IrType::Ptr(inner) => write!(f, "{}*", inner),
      IrType::Struct(fields) => {
        let fields: Vec<String> = fields.iter().map(|t| t.to_string()).collect();
        write!(f, "{{{}}}", fields.join(", "))
      },
      IrType::Func(fn_ty) => write!(f, "{}", fn_ty),
      IrType::Opaque(name) => write!(f, "%{}", name),
    }
  }
}

impl std::fmt::Display for FnType {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    let params: Vec<String> = self.params.iter().map(|t| t.to_string()).collect();
    write!(f, "{} ({})", self.ret, params.join(", "))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_type_display() {
    let ty = IrType::ptr(IrType::Struct(vec![IrType::I64, IrType::Str]));
    assert_eq!(ty.to_string(), "{i64, str}*");

    let fn_ty = FnType::new(vec![IrType::ptr(IrType::I32)], IrType::Void);
    assert_eq!(fn_ty.to_string(), "void (i32*)");
  }
}
