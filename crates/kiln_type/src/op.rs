/// Binary operations shared by the annotated tree and the target IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperation {
  Add,
  Sub,
  Mul,
  Div,
  Equal,
  NotEqual,
  LessThan,
  GreaterThan,
}

impl BinaryOperation {
  pub fn is_comparison(&self) -> bool {
    matches!(
      self,
      BinaryOperation::Equal | BinaryOperation::NotEqual | BinaryOperation::LessThan | BinaryOperation::GreaterThan
    )
  }
}

impl std::fmt::Display for BinaryOperation {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    let s = match self {
      BinaryOperation::Add => "add",
      BinaryOperation::Sub => "sub",
      BinaryOperation::Mul => "mul",
      BinaryOperation::Div => "div",
      BinaryOperation::Equal => "eq",
      BinaryOperation::NotEqual => "ne",
      BinaryOperation::LessThan => "lt",
      BinaryOperation::GreaterThan => "gt",
    };
    write!(f, "{}", s)
  }
}
