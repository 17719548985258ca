use crate::{Id, Store, span::Span, types::TypeId};

/// A compile-time constant value attached by the type checker.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ConstValue {
  Int(i64),
  Float(ordered_float::OrderedFloat<f64>),
  Bool(bool),
  String(String),
}

impl std::fmt::Display for ConstValue {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    match self {
      ConstValue::Int(v) => write!(f, "{}", v),
      ConstValue::Float(v) => write!(f, "{}", v),
      ConstValue::Bool(v) => write!(f, "{}", v),
      ConstValue::String(v) => write!(f, "{:?}", v),
    }
  }
}

pub type ObjectId = Id<Object>;

/// A declared entity: what an identifier resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
  pub name: String,
  pub kind: ObjectKind,
  pub ty: TypeId,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectKind {
  Var,
  Param,
  Func,
  TypeName,
  Const(ConstValue),
  Import,
}

impl ObjectKind {
  pub fn describe(&self) -> &'static str {
    match self {
      ObjectKind::Var => "variable",
      ObjectKind::Param => "parameter",
      ObjectKind::Func => "function",
      ObjectKind::TypeName => "type name",
      ObjectKind::Const(_) => "constant",
      ObjectKind::Import => "import",
    }
  }
}

impl Object {
  /// The blank identifier (and unnamed parameters) bind no storage.
  pub fn is_blank(&self) -> bool {
    self.name.is_empty() || self.name == "_"
  }
}

#[derive(Debug, Clone, Default)]
pub struct ObjectStore {
  objects: Store<Object>,
}

impl ObjectStore {
  pub fn new() -> Self {
    Self { objects: Store::new() }
  }

  pub fn alloc(
    &mut self,
    object: Object,
  ) -> ObjectId {
    self.objects.alloc(object)
  }

  #[inline]
  pub fn get(
    &self,
    id: &ObjectId,
  ) -> &Object {
    self.objects.get(id)
  }

  pub fn get_mut(
    &mut self,
    id: &ObjectId,
  ) -> &mut Object {
    self.objects.get_mut(id)
  }

  #[inline]
  pub fn type_of(
    &self,
    id: &ObjectId,
  ) -> TypeId {
    self.objects.get(id).ty
  }

  #[inline]
  pub fn name_of(
    &self,
    id: &ObjectId,
  ) -> &str {
    &self.objects.get(id).name
  }

  pub fn len(&self) -> usize {
    self.objects.len()
  }

  pub fn is_empty(&self) -> bool {
    self.objects.is_empty()
  }
}
