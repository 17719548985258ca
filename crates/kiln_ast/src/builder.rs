//! Programmatic construction of checked packages.
//!
//! Front ends that already hold resolved objects, and the lowering tests,
//! build [`Package`]s through this instead of going through a parser.

use kiln_type::{
  BytePosition,
  file::FileId,
  object::{ConstValue, Object, ObjectId, ObjectKind},
  op::BinaryOperation,
  span::Span,
  types::{Field, Signature, Type, TypeId, TypeStore},
};
use ordered_float::OrderedFloat;

use crate::{
  Block, Decl, Expr, ExprId, ExprKind, FuncDecl, GenDecl, GenKind, Ident, ImportSpec, Package, SourceUnit, Spec,
  Stmt, StmtKind, TypeSpec, ValueSpec,
};

pub struct PackageBuilder {
  package: Package,
  span: Span,
  pending_doc: Vec<String>,
}

impl PackageBuilder {
  pub fn new(
    name: &str,
    file: FileId,
  ) -> Self {
    let mut package = Package::new(name);
    package.files.push(SourceUnit {
      file,
      decls: Vec::new(),
    });

    Self {
      package,
      span: Span::empty_at(file, BytePosition(0)),
      pending_doc: Vec::new(),
    }
  }

  /// Sets the span attached to every node created until the next call.
  pub fn at(
    &mut self,
    start: u32,
    end: u32,
  ) -> &mut Self {
    self.span = Span::new(self.span.file, BytePosition(start), BytePosition(end));
    self
  }

  /// Starts a new source unit. Later declarations are pushed into it.
  pub fn file(
    &mut self,
    file: FileId,
  ) -> &mut Self {
    self.package.files.push(SourceUnit {
      file,
      decls: Vec::new(),
    });
    self.span = Span::empty_at(file, BytePosition(0));
    self
  }

  /// Doc lines for the next function or general declaration.
  pub fn doc(
    &mut self,
    lines: &[&str],
  ) -> &mut Self {
    self.pending_doc = lines.iter().map(|l| l.to_string()).collect();
    self
  }

  pub fn types(&mut self) -> &mut TypeStore {
    &mut self.package.types
  }

  pub fn package(&self) -> &Package {
    &self.package
  }

  pub fn push(
    &mut self,
    decl: Decl,
  ) {
    if let Some(unit) = self.package.files.last_mut() {
      unit.decls.push(decl);
    }
  }

  pub fn finish(self) -> Package {
    self.package
  }

  // ========================================================================
  // Objects
  // ========================================================================

  fn object(
    &mut self,
    name: &str,
    kind: ObjectKind,
    ty: TypeId,
  ) -> ObjectId {
    self.package.objects.alloc(Object {
      name: name.to_string(),
      kind,
      ty,
      span: self.span.clone(),
    })
  }

  fn package_object(
    &mut self,
    name: &str,
    kind: ObjectKind,
    ty: TypeId,
  ) -> ObjectId {
    let id = self.object(name, kind, ty);
    let owner = self.package.name.clone();
    self.package.pkgmap.insert(id, &owner);
    id
  }

  /// Package-level variable.
  pub fn global(
    &mut self,
    name: &str,
    ty: TypeId,
  ) -> ObjectId {
    self.package_object(name, ObjectKind::Var, ty)
  }

  /// Function-local variable.
  pub fn local(
    &mut self,
    name: &str,
    ty: TypeId,
  ) -> ObjectId {
    self.object(name, ObjectKind::Var, ty)
  }

  pub fn constant(
    &mut self,
    name: &str,
    value: ConstValue,
    ty: TypeId,
  ) -> ObjectId {
    self.package_object(name, ObjectKind::Const(value), ty)
  }

  /// Declares a named type whose underlying type is `underlying`.
  pub fn named_type(
    &mut self,
    name: &str,
    underlying: TypeId,
  ) -> (ObjectId, TypeId) {
    let error = self.package.types.error();
    let object = self.package_object(name, ObjectKind::TypeName, error);
    let named = self.package.types.named(object);
    self.package.types.set_underlying(named, underlying);
    self.package.objects.get_mut(&object).ty = named;
    (object, named)
  }

  pub fn struct_type(
    &mut self,
    fields: &[(&str, TypeId)],
  ) -> TypeId {
    let fields = fields
      .iter()
      .map(|(name, ty)| Field {
        name: name.to_string(),
        ty: *ty,
      })
      .collect();
    self.package.types.structure(fields)
  }

  fn signature(
    &mut self,
    recv: Option<(&str, TypeId)>,
    params: &[(&str, TypeId)],
    results: &[(&str, TypeId)],
  ) -> TypeId {
    let recv = recv.map(|(name, ty)| self.object(name, ObjectKind::Param, ty));
    let params = params
      .iter()
      .map(|(name, ty)| self.object(name, ObjectKind::Param, *ty))
      .collect();
    let results = results
      .iter()
      .map(|(name, ty)| self.object(name, ObjectKind::Var, *ty))
      .collect();

    self.package.types.signature(Signature { recv, params, results })
  }

  /// Package-level function. Result names may be empty.
  pub fn func(
    &mut self,
    name: &str,
    params: &[(&str, TypeId)],
    results: &[(&str, TypeId)],
  ) -> ObjectId {
    let sig = self.signature(None, params, results);
    self.package_object(name, ObjectKind::Func, sig)
  }

  /// Method bound to `recv`. A pointer receiver type makes a pointer method.
  pub fn method(
    &mut self,
    recv: (&str, TypeId),
    name: &str,
    params: &[(&str, TypeId)],
    results: &[(&str, TypeId)],
  ) -> ObjectId {
    let sig = self.signature(Some(recv), params, results);
    self.package_object(name, ObjectKind::Func, sig)
  }

  /// Function owned by another package.
  pub fn imported_func(
    &mut self,
    package: &str,
    name: &str,
    params: &[(&str, TypeId)],
    results: &[(&str, TypeId)],
  ) -> ObjectId {
    let sig = self.signature(None, params, results);
    let id = self.object(name, ObjectKind::Func, sig);
    self.package.pkgmap.insert(id, package);
    id
  }

  fn sig_of(
    &self,
    func: &ObjectId,
  ) -> Signature {
    let ty = self.package.objects.type_of(func);
    self.package.types.as_signature(&ty).cloned().unwrap_or_default()
  }

  pub fn params_of(
    &self,
    func: &ObjectId,
  ) -> Vec<ObjectId> {
    self.sig_of(func).params
  }

  pub fn results_of(
    &self,
    func: &ObjectId,
  ) -> Vec<ObjectId> {
    self.sig_of(func).results
  }

  pub fn recv_of(
    &self,
    func: &ObjectId,
  ) -> Option<ObjectId> {
    self.sig_of(func).recv
  }

  // ========================================================================
  // Expressions
  // ========================================================================

  fn expr(
    &mut self,
    kind: ExprKind,
    ty: TypeId,
    constant: Option<ConstValue>,
  ) -> ExprId {
    self.package.exprs.alloc(Expr {
      kind,
      ty,
      constant,
      span: self.span.clone(),
    })
  }

  /// Untyped integer literal.
  pub fn int(
    &mut self,
    value: i64,
  ) -> ExprId {
    let ty = self.package.types.untyped_int();
    self.expr(ExprKind::Literal, ty, Some(ConstValue::Int(value)))
  }

  pub fn typed_int(
    &mut self,
    value: i64,
    ty: TypeId,
  ) -> ExprId {
    self.expr(ExprKind::Literal, ty, Some(ConstValue::Int(value)))
  }

  pub fn float(
    &mut self,
    value: f64,
  ) -> ExprId {
    let ty = self.package.types.untyped_float();
    self.expr(ExprKind::Literal, ty, Some(ConstValue::Float(OrderedFloat(value))))
  }

  pub fn bool(
    &mut self,
    value: bool,
  ) -> ExprId {
    let ty = self.package.types.untyped_bool();
    self.expr(ExprKind::Literal, ty, Some(ConstValue::Bool(value)))
  }

  pub fn string(
    &mut self,
    value: &str,
  ) -> ExprId {
    let ty = self.package.types.untyped_string();
    self.expr(ExprKind::Literal, ty, Some(ConstValue::String(value.to_string())))
  }

  pub fn ident(
    &mut self,
    object: ObjectId,
  ) -> ExprId {
    let obj = self.package.objects.get(&object);
    let ty = obj.ty;
    let constant = match &obj.kind {
      ObjectKind::Const(value) => Some(value.clone()),
      _ => None,
    };
    self.expr(ExprKind::Ident(object), ty, constant)
  }

  /// Binary expression, folded when both operands are constant.
  pub fn binary(
    &mut self,
    op: BinaryOperation,
    left: ExprId,
    right: ExprId,
  ) -> ExprId {
    let (lty, lconst) = {
      let e = self.package.exprs.get(&left);
      (e.ty, e.constant.clone())
    };
    let (rty, rconst) = {
      let e = self.package.exprs.get(&right);
      (e.ty, e.constant.clone())
    };

    let types = &self.package.types;
    let both_untyped = types.is_untyped(&lty) && types.is_untyped(&rty);
    let ty = if op.is_comparison() {
      if both_untyped { types.untyped_bool() } else { types.bool() }
    } else if types.is_untyped(&lty) {
      rty
    } else {
      lty
    };

    let constant = match (lconst, rconst) {
      (Some(l), Some(r)) => fold(op, &l, &r),
      _ => None,
    };

    self.expr(ExprKind::Binary { op, left, right }, ty, constant)
  }

  /// Call expression typed by the callee's results: nothing, one value, or a tuple.
  pub fn call(
    &mut self,
    callee: ObjectId,
    args: Vec<ExprId>,
  ) -> ExprId {
    let results: Vec<TypeId> = self
      .results_of(&callee)
      .iter()
      .map(|r| self.package.objects.type_of(r))
      .collect();

    let ty = match results.as_slice() {
      [single] => *single,
      _ => self.package.types.tuple(results),
    };

    self.expr(ExprKind::Call { callee, args }, ty, None)
  }

  pub fn addr_of(
    &mut self,
    object: ObjectId,
  ) -> ExprId {
    let inner = self.package.objects.type_of(&object);
    let ty = self.package.types.pointer(inner);
    self.expr(ExprKind::AddressOf(object), ty, None)
  }

  pub fn deref(
    &mut self,
    pointer: ExprId,
  ) -> ExprId {
    let pty = self.package.exprs.get(&pointer).ty;
    let ty = match self.package.types.get(&pty) {
      Type::Pointer(inner) => *inner,
      _ => self.package.types.error(),
    };
    self.expr(ExprKind::Deref(pointer), ty, None)
  }

  // ========================================================================
  // Statements
  // ========================================================================

  fn stmt(
    &self,
    kind: StmtKind,
  ) -> Stmt {
    Stmt {
      kind,
      span: self.span.clone(),
    }
  }

  pub fn block(
    &self,
    stmts: Vec<Stmt>,
  ) -> Block {
    Block {
      stmts,
      span: self.span.clone(),
    }
  }

  pub fn expr_stmt(
    &self,
    expr: ExprId,
  ) -> Stmt {
    self.stmt(StmtKind::Expr(expr))
  }

  pub fn assign(
    &self,
    target: ExprId,
    value: ExprId,
  ) -> Stmt {
    self.stmt(StmtKind::Assign { target, value })
  }

  pub fn ret(
    &self,
    values: Vec<ExprId>,
  ) -> Stmt {
    self.stmt(StmtKind::Return(values))
  }

  pub fn if_stmt(
    &self,
    condition: ExprId,
    then_block: Block,
    else_block: Option<Block>,
  ) -> Stmt {
    self.stmt(StmtKind::If {
      condition,
      then_block,
      else_block,
    })
  }

  pub fn block_stmt(
    &self,
    block: Block,
  ) -> Stmt {
    self.stmt(StmtKind::Block(block))
  }

  /// `var names = values` inside a function body.
  pub fn local_decl(
    &mut self,
    names: &[ObjectId],
    values: Vec<ExprId>,
  ) -> Stmt {
    let spec = self.value_spec(names, values);
    let decl = self.gen_decl(GenKind::Var, vec![spec]);
    self.stmt(StmtKind::Decl(decl))
  }

  // ========================================================================
  // Declarations
  // ========================================================================

  fn ident_for(
    &self,
    object: ObjectId,
  ) -> Ident {
    Ident {
      name: self.package.objects.name_of(&object).to_string(),
      object: Some(object),
      span: self.span.clone(),
    }
  }

  pub fn value_spec(
    &self,
    names: &[ObjectId],
    values: Vec<ExprId>,
  ) -> Spec {
    Spec::Value(ValueSpec {
      names: names.iter().map(|n| self.ident_for(*n)).collect(),
      values,
      span: self.span.clone(),
    })
  }

  pub fn type_spec(
    &self,
    object: ObjectId,
  ) -> Spec {
    Spec::Type(TypeSpec {
      name: self.ident_for(object),
      span: self.span.clone(),
    })
  }

  pub fn import_spec(
    &self,
    path: &str,
  ) -> Spec {
    Spec::Import(ImportSpec {
      path: path.to_string(),
      span: self.span.clone(),
    })
  }

  pub fn gen_decl(
    &mut self,
    kind: GenKind,
    specs: Vec<Spec>,
  ) -> GenDecl {
    GenDecl {
      kind,
      specs,
      doc: std::mem::take(&mut self.pending_doc),
      span: self.span.clone(),
    }
  }

  /// Package-level `var names = values`.
  pub fn var_decl(
    &mut self,
    names: &[ObjectId],
    values: Vec<ExprId>,
  ) -> Decl {
    let spec = self.value_spec(names, values);
    Decl::Gen(self.gen_decl(GenKind::Var, vec![spec]))
  }

  pub fn const_decl(
    &mut self,
    names: &[ObjectId],
    values: Vec<ExprId>,
  ) -> Decl {
    let spec = self.value_spec(names, values);
    Decl::Gen(self.gen_decl(GenKind::Const, vec![spec]))
  }

  pub fn type_decl(
    &mut self,
    object: ObjectId,
  ) -> Decl {
    let spec = self.type_spec(object);
    Decl::Gen(self.gen_decl(GenKind::Type, vec![spec]))
  }

  pub fn import_decl(
    &mut self,
    path: &str,
  ) -> Decl {
    let spec = self.import_spec(path);
    Decl::Gen(self.gen_decl(GenKind::Import, vec![spec]))
  }

  pub fn func_decl(
    &mut self,
    object: ObjectId,
    body: Option<Block>,
  ) -> Decl {
    Decl::Func(FuncDecl {
      name: self.ident_for(object),
      body,
      doc: std::mem::take(&mut self.pending_doc),
      span: self.span.clone(),
    })
  }

  /// A package initializer. The checker records no object for these.
  pub fn init_decl(
    &mut self,
    body: Block,
  ) -> Decl {
    Decl::Func(FuncDecl {
      name: Ident {
        name: "init".to_string(),
        object: None,
        span: self.span.clone(),
      },
      body: Some(body),
      doc: std::mem::take(&mut self.pending_doc),
      span: self.span.clone(),
    })
  }

  pub fn bad_decl(&self) -> Decl {
    Decl::Bad { span: self.span.clone() }
  }
}

fn fold(
  op: BinaryOperation,
  left: &ConstValue,
  right: &ConstValue,
) -> Option<ConstValue> {
  use BinaryOperation::*;

  match (left, right) {
    (ConstValue::Int(l), ConstValue::Int(r)) => match op {
      Add => l.checked_add(*r).map(ConstValue::Int),
      Sub => l.checked_sub(*r).map(ConstValue::Int),
      Mul => l.checked_mul(*r).map(ConstValue::Int),
      Div => l.checked_div(*r).map(ConstValue::Int),
      Equal => Some(ConstValue::Bool(l == r)),
      NotEqual => Some(ConstValue::Bool(l != r)),
      LessThan => Some(ConstValue::Bool(l < r)),
      GreaterThan => Some(ConstValue::Bool(l > r)),
    },
    (ConstValue::String(l), ConstValue::String(r)) => match op {
      Add => Some(ConstValue::String(format!("{}{}", l, r))),
      Equal => Some(ConstValue::Bool(l == r)),
      NotEqual => Some(ConstValue::Bool(l != r)),
      _ => None,
    },
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_binary_folds_constants() {
    let mut b = PackageBuilder::new("main", FileId::new(0));
    let one = b.int(1);
    let two = b.int(2);
    let sum = b.binary(BinaryOperation::Add, one, two);

    let expr = b.package().expr(&sum);
    assert_eq!(expr.constant, Some(ConstValue::Int(3)));
    assert!(b.package().types.is_untyped(&expr.ty));
  }

  #[test]
  fn test_division_by_zero_is_not_folded() {
    let mut b = PackageBuilder::new("main", FileId::new(0));
    let one = b.int(1);
    let zero = b.int(0);
    let div = b.binary(BinaryOperation::Div, one, zero);

    assert_eq!(b.package().expr(&div).constant, None);
  }

  #[test]
  fn test_call_type_follows_results() {
    let mut b = PackageBuilder::new("main", FileId::new(0));
    let int = b.types().int();
    let string = b.types().string();

    let one = b.func("one", &[], &[("", int)]);
    let two = b.func("two", &[], &[("", int), ("", string)]);

    let c1 = b.call(one, vec![]);
    let c2 = b.call(two, vec![]);

    assert_eq!(b.package().expr(&c1).ty, int);
    let c2_ty = b.package().expr(&c2).ty;
    assert_eq!(b.package().types.get(&c2_ty), &Type::Tuple(vec![int, string]));
  }

  #[test]
  fn test_package_objects_are_registered() {
    let mut b = PackageBuilder::new("main", FileId::new(0));
    let int = b.types().int();
    let g = b.global("counter", int);
    let l = b.local("x", int);
    let ext = b.imported_func("fmt", "Println", &[], &[]);

    let pkg = b.finish();
    assert_eq!(pkg.pkgmap.package_of(&g), Some("main"));
    assert!(!pkg.pkgmap.is_package_level(&l));
    assert_eq!(pkg.pkgmap.package_of(&ext), Some("fmt"));
  }

  #[test]
  fn test_doc_is_consumed_once() {
    let mut b = PackageBuilder::new("main", FileId::new(0));
    let int = b.types().int();
    let g = b.global("g", int);

    b.doc(&["#kiln name: renamed"]);
    let first = b.var_decl(&[g], vec![]);
    let second = b.var_decl(&[g], vec![]);

    match (first, second) {
      (Decl::Gen(a), Decl::Gen(b)) => {
        assert_eq!(a.doc, vec!["#kiln name: renamed".to_string()]);
        assert!(b.doc.is_empty());
      },
      _ => panic!("expected general declarations"),
    }
  }
}
