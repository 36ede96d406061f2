//! Machine lowering to SV32.
//!
//! Rewrites a function's machine-independent value graph into SV32
//! opcodes by running guarded rewrite rules to a fixpoint. 64-bit
//! integer operations decompose into 32-bit halves (or retag to native
//! 64-bit instructions when the target has them), shifts acquire their
//! defensive out-of-range behavior, and address arithmetic folds into
//! access offsets. See `ridge_ir::verify::check_lowered` for the shape
//! the output is expected to satisfy.

pub mod driver;
pub mod legality;
pub mod rules;

pub use driver::{ApplyResult, DEFAULT_MAX_ITERATIONS, Driver, lower};
