//! SV32 machine-level IR.
//!
//! Arena-allocated value graph for the machine-lowering stage: nodes
//! indexed by `NodeRef` into a `PrimaryMap`, interned types, a symbol
//! table, and the immutable `TargetConfig`. Rewrites mutate node slots
//! in place; see `ridge-lower` for the rules and the fixpoint driver.

pub mod config;
pub mod func;
pub mod node;
pub mod op;
pub mod printer;
pub mod refs;
pub mod sym;
pub mod types;
pub mod verify;

pub use config::{Endianness, Int64Strategy, TargetConfig};
pub use func::{BlockData, Function, Pair64};
pub use node::{Aux, NodeData, Pos};
pub use op::Op;
pub use refs::{BlockRef, NodeRef, SymRef, TypeRef};
pub use types::{TypeCatalog, TypeData, TypeInterner};
pub use verify::{VerifyError, check_lowered};
