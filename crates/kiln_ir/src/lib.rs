pub mod block;
pub mod display;
pub mod eval;
pub mod function;
pub mod instr;
pub mod module;
pub mod operand;
pub mod ty;
pub mod verify;

use kiln_type::Id;

pub use block::{Block, Terminator};
pub use function::{FnAttribute, Function, Linkage, TempData};
pub use instr::Instr;
pub use module::{Global, Module, TypeDescriptor};
pub use operand::{ConstValue, Operand};
pub use ty::{FnType, IrType};
pub use verify::{VerifyError, verify_module};

/// Unique identifier for an SSA temporary within a function.
pub type TempId = Id<TempData>;

/// Unique identifier for a basic block within a function.
pub type BlockId = Id<Block>;

/// Unique identifier for a function within a module.
pub type FuncId = Id<Function>;

/// Unique identifier for a global variable within a module.
pub type GlobalId = Id<Global>;
