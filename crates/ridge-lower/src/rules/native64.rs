//! 64-bit lowering for targets with real 64-bit registers
//! (`Int64Strategy::Native64`).
//!
//! Most of the work is a retag handled by the dispatch; what lives here
//! are the shift guards, where the count is a 64-bit value and the
//! result width decides the saturation bound, and the handful of
//! operations with no single-instruction equivalent.

use ridge_ir::{Function, NodeRef, Op};

use super::{ShiftKind, as_const64, retag};

fn i64const(f: &mut Function, at: NodeRef, c: i64) -> NodeRef {
    let n = f.helper(at, Op::I64Const, f.cat.int64);
    f.set_aux_int(n, c);
    n
}

/// 8/16/32-bit result, 64-bit count. The value sits in a word register;
/// `ext` normalizes it for the right-shift forms.
pub(super) fn small_x64(
    f: &mut Function,
    n: NodeRef,
    kind: ShiftKind,
    width: u32,
    ext: Option<Op>,
) -> bool {
    let bounded = f.node(n).aux_bool();
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    let uint32 = f.cat.uint32;
    let int32 = f.cat.int32;
    let x = match ext {
        Some(ext) => {
            let ty = match ext {
                Op::SignExt8to32 | Op::SignExt16to32 => int32,
                _ => uint32,
            };
            f.helper1(n, ext, ty, x)
        }
        None => x,
    };

    if let Some(c) = as_const64(f, y) {
        if (c as u64) < width as u64 {
            let cn = f.iconst(n, c as u32);
            f.reset(n, kind.machine32());
            f.add_args2(n, x, cn);
        } else {
            match kind {
                ShiftKind::Shl | ShiftKind::ShrU => {
                    f.reset(n, Op::I32Const);
                }
                ShiftKind::ShrS => {
                    let sat = f.iconst(n, width - 1);
                    f.reset(n, Op::I32ShrS);
                    f.add_args2(n, x, sat);
                }
            }
        }
        return true;
    }

    let yw = f.helper1(n, Op::I32WrapI64, uint32, y);
    if bounded {
        f.reset(n, kind.machine32());
        f.add_args2(n, x, yw);
        return true;
    }

    // The guard looks at the full 64-bit count; wrapping it first
    // would let a count of 2^32 slip through as zero.
    let bool_ = f.cat.bool_;
    let bound = i64const(f, n, width as i64);
    let in_range = f.helper2(n, Op::I64LtU, bool_, y, bound);
    match kind {
        ShiftKind::Shl | ShiftKind::ShrU => {
            let shifted = f.helper2(n, kind.machine32(), uint32, x, yw);
            let zero = f.iconst(n, 0);
            f.reset(n, Op::Select);
            f.add_args3(n, shifted, zero, in_range);
        }
        ShiftKind::ShrS => {
            let sat = f.iconst(n, width - 1);
            let count = f.helper3(n, Op::Select, uint32, yw, sat, in_range);
            f.reset(n, Op::I32ShrS);
            f.add_args2(n, x, count);
        }
    }
    true
}

/// 64-bit result, 64-bit count.
pub(super) fn shift64(f: &mut Function, n: NodeRef, kind: ShiftKind) -> bool {
    let bounded = f.node(n).aux_bool();
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    let int64 = f.cat.int64;

    if let Some(c) = as_const64(f, y) {
        if (c as u64) < 64 {
            let cn = i64const(f, n, c);
            f.reset(n, kind.machine64());
            f.add_args2(n, x, cn);
        } else {
            match kind {
                ShiftKind::Shl | ShiftKind::ShrU => {
                    f.reset(n, Op::I64Const);
                }
                ShiftKind::ShrS => {
                    let sat = i64const(f, n, 63);
                    f.reset(n, Op::I64ShrS);
                    f.add_args2(n, x, sat);
                }
            }
        }
        return true;
    }

    if bounded {
        f.reset(n, kind.machine64());
        f.add_args2(n, x, y);
        return true;
    }

    let bool_ = f.cat.bool_;
    let bound = i64const(f, n, 64);
    let in_range = f.helper2(n, Op::I64LtU, bool_, y, bound);
    match kind {
        ShiftKind::Shl | ShiftKind::ShrU => {
            let shifted = f.helper2(n, kind.machine64(), int64, x, y);
            let zero = f.helper(n, Op::I64Const, int64);
            f.reset(n, Op::Select);
            f.add_args3(n, shifted, zero, in_range);
        }
        ShiftKind::ShrS => {
            let sat = i64const(f, n, 63);
            let count = f.helper3(n, Op::Select, int64, y, sat, in_range);
            f.reset(n, Op::I64ShrS);
            f.add_args2(n, x, count);
        }
    }
    true
}

/// Narrow counts on 64-bit results widen into the x64 form, keeping
/// the bounded flag.
pub(super) fn extend_count(f: &mut Function, n: NodeRef, target: Op, ext: Op) -> bool {
    let bounded = f.node(n).aux_bool();
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    let uint64 = f.cat.uint64;
    let ye = f.helper1(n, ext, uint64, y);
    f.reset(n, target);
    f.set_aux_int(n, bounded as i64);
    f.add_args2(n, x, ye);
    true
}

pub(super) fn rewrite_neg64(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let zero = f.helper(n, Op::I64Const, f.cat.int64);
    f.reset(n, Op::I64Sub);
    f.add_args2(n, zero, x);
    true
}

pub(super) fn rewrite_com64(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let ones = i64const(f, n, -1);
    f.reset(n, Op::I64Xor);
    f.add_args2(n, x, ones);
    true
}

pub(super) fn rewrite_cmp64(f: &mut Function, n: NodeRef) -> bool {
    let machine = match f.op(n) {
        Op::Eq64 => Op::I64Eq,
        Op::Neq64 => Op::I64Ne,
        Op::Less64S => Op::I64LtS,
        Op::Less64U => Op::I64LtU,
        Op::Leq64S => Op::I64LeS,
        Op::Leq64U => Op::I64LeU,
        op => unreachable!("rewrite_cmp64 on {op}"),
    };
    retag(f, n, machine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridge_ir::{Pos, TargetConfig};

    fn native_func() -> Function {
        Function::new("t", TargetConfig::sv32_native64())
    }

    #[test]
    fn unbounded_shift64_is_guarded() {
        let mut f = native_func();
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.int64, Pos::default());
        let y = f.new_node(b, Op::Arg, f.cat.uint64, Pos::default());
        let s = f.new_node(b, Op::Lsh64x64, f.cat.int64, Pos::default());
        f.add_args2(s, x, y);

        assert!(shift64(&mut f, s, ShiftKind::Shl));
        assert_eq!(f.op(s), Op::Select);
        assert_eq!(f.op(f.arg(s, 0)), Op::I64Shl);
        let guard = f.arg(s, 2);
        assert_eq!(f.op(guard), Op::I64LtU);
        assert_eq!(f.aux_int(f.arg(guard, 1)), 64);
    }

    #[test]
    fn const_count_past_63_saturates_arithmetic() {
        let mut f = native_func();
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.int64, Pos::default());
        let c = f.new_node(b, Op::I64Const, f.cat.int64, Pos::default());
        f.set_aux_int(c, 100);
        let s = f.new_node(b, Op::Rsh64Sx64, f.cat.int64, Pos::default());
        f.add_args2(s, x, c);

        assert!(shift64(&mut f, s, ShiftKind::ShrS));
        assert_eq!(f.op(s), Op::I64ShrS);
        assert_eq!(f.aux_int(f.arg(s, 1)), 63);
    }

    #[test]
    fn bounded_small_shift_wraps_the_count() {
        let mut f = native_func();
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.uint32, Pos::default());
        let y = f.new_node(b, Op::Arg, f.cat.uint64, Pos::default());
        let s = f.new_node(b, Op::Lsh32x64, f.cat.uint32, Pos::default());
        f.set_aux_int(s, 1);
        f.add_args2(s, x, y);

        assert!(small_x64(&mut f, s, ShiftKind::Shl, 32, None));
        assert_eq!(f.op(s), Op::I32Shl);
        assert_eq!(f.op(f.arg(s, 1)), Op::I32WrapI64);
    }

    #[test]
    fn cmp64_retags_straight_to_machine() {
        let mut f = native_func();
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.int64, Pos::default());
        let y = f.new_node(b, Op::Arg, f.cat.int64, Pos::default());
        let c = f.new_node(b, Op::Less64S, f.cat.bool_, Pos::default());
        f.add_args2(c, x, y);

        assert!(rewrite_cmp64(&mut f, c));
        assert_eq!(f.op(c), Op::I64LtS);
        assert_eq!(f.args(c), [x, y]);
    }
}
