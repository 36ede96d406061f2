//! Constant materialization.

use ridge_ir::{Function, NodeRef, Op};

/// Every 8/16/32-bit literal becomes a machine `I32Const`. The payload
/// is already stored sign-extended, so it carries over unchanged.
pub(super) fn rewrite_const32(f: &mut Function, n: NodeRef) -> bool {
    let v = f.aux_int(n);
    f.reset(n, Op::I32Const);
    f.set_aux_int(n, v as i32 as i64);
    true
}

/// A 64-bit literal splits into a register pair of word literals.
pub(super) fn rewrite_const64(f: &mut Function, n: NodeRef) -> bool {
    let c = f.aux_int(n);
    let uint32 = f.cat.uint32;
    let hi = f.helper(n, Op::Const32, uint32);
    f.set_aux_int(hi, (c >> 32) as i32 as i64);
    let lo = f.helper(n, Op::Const32, uint32);
    f.set_aux_int(lo, c as i32 as i64);
    f.reset(n, Op::Int64Make);
    f.add_args2(n, hi, lo);
    true
}
