//! The annotated declaration tree handed to lowering by the type checker.
//!
//! Every identifier resolves to an object in the package's [`ObjectStore`],
//! and every expression carries its semantic type and, when the checker
//! could fold it, a constant value.

pub mod builder;

use kiln_type::{
  Id, Store,
  file::FileId,
  object::{ConstValue, ObjectId, ObjectStore},
  op::BinaryOperation,
  package::PackageSymbolTable,
  span::Span,
  types::{TypeId, TypeStore},
};

pub use builder::PackageBuilder;

pub type ExprId = Id<Expr>;

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
  pub name: String,
  /// `None` for identifiers the checker does not record (e.g. `init`).
  pub object: Option<ObjectId>,
  pub span: Span,
}

impl Ident {
  pub fn is_blank(&self) -> bool {
    self.name.is_empty() || self.name == "_"
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
  Func(FuncDecl),
  Gen(GenDecl),
  /// Parser recovery node.
  Bad { span: Span },
}

impl Decl {
  pub fn span(&self) -> &Span {
    match self {
      Decl::Func(f) => &f.span,
      Decl::Gen(g) => &g.span,
      Decl::Bad { span } => span,
    }
  }

  pub fn kind_name(&self) -> &'static str {
    match self {
      Decl::Func(_) => "function declaration",
      Decl::Gen(g) => g.kind.describe(),
      Decl::Bad { .. } => "bad declaration",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
  pub name: Ident,
  /// `None` for functions implemented elsewhere.
  pub body: Option<Block>,
  pub doc: Vec<String>,
  pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenKind {
  Import,
  Type,
  Const,
  Var,
}

impl GenKind {
  pub fn describe(&self) -> &'static str {
    match self {
      GenKind::Import => "import declaration",
      GenKind::Type => "type declaration",
      GenKind::Const => "constant declaration",
      GenKind::Var => "variable declaration",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenDecl {
  pub kind: GenKind,
  pub specs: Vec<Spec>,
  pub doc: Vec<String>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
  Import(ImportSpec),
  Type(TypeSpec),
  Value(ValueSpec),
}

impl Spec {
  pub fn describe(&self) -> &'static str {
    match self {
      Spec::Import(_) => "import spec",
      Spec::Type(_) => "type spec",
      Spec::Value(_) => "value spec",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
  pub path: String,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
  pub name: Ident,
  pub span: Span,
}

/// One declaration statement's identifiers and initializers.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
  pub names: Vec<Ident>,
  pub values: Vec<ExprId>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
  pub stmts: Vec<Stmt>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
  pub kind: StmtKind,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
  Expr(ExprId),
  Assign {
    target: ExprId,
    value: ExprId,
  },
  Decl(GenDecl),
  Return(Vec<ExprId>),
  If {
    condition: ExprId,
    then_block: Block,
    else_block: Option<Block>,
  },
  Block(Block),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
  pub kind: ExprKind,
  pub ty: TypeId,
  /// Set when the checker folded this expression to a constant.
  pub constant: Option<ConstValue>,
  pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
  Literal,
  Ident(ObjectId),
  Binary {
    op: BinaryOperation,
    left: ExprId,
    right: ExprId,
  },
  /// Direct call. Method calls arrive with the receiver as the first argument.
  Call {
    callee: ObjectId,
    args: Vec<ExprId>,
  },
  AddressOf(ObjectId),
  Deref(ExprId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
  pub file: FileId,
  pub decls: Vec<Decl>,
}

/// A type-checked package ready for lowering.
#[derive(Debug, Clone)]
pub struct Package {
  pub name: String,
  pub files: Vec<SourceUnit>,
  pub types: TypeStore,
  pub objects: ObjectStore,
  pub exprs: Store<Expr>,
  pub pkgmap: PackageSymbolTable,
}

impl Package {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      files: Vec::new(),
      types: TypeStore::new(),
      objects: ObjectStore::new(),
      exprs: Store::new(),
      pkgmap: PackageSymbolTable::new(),
    }
  }

  #[inline]
  pub fn expr(
    &self,
    id: &ExprId,
  ) -> &Expr {
    self.exprs.get(id)
  }

  pub fn decls(&self) -> impl Iterator<Item = &Decl> {
    self.files.iter().flat_map(|f| f.decls.iter())
  }
}
