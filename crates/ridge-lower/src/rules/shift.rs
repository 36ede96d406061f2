//! Shift lowering: the full width-by-count matrix.
//!
//! Every generic shift funnels toward the three 32-bit-count base
//! forms. 64-bit counts collapse: a provably nonzero high half
//! saturates, a provably zero high half drops to the 32-bit count, and
//! anything else becomes `Or32(Zeromask(hi), lo)`, which is >= 32
//! whenever the high half was nonzero. The base forms emit the raw
//! machine shift only for bounded counts and otherwise build the
//! defensive `Select` that yields the architecture-independent result
//! for oversized counts: zero for logical shifts, a count saturated to
//! 31 for arithmetic ones.

use ridge_ir::{Function, NodeRef, Op};

use super::{as_const32, as_const64, as_int64_make, halves, retag};
use crate::legality;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ShiftKind {
    Shl,
    ShrU,
    ShrS,
}

impl ShiftKind {
    pub(crate) fn machine32(self) -> Op {
        match self {
            ShiftKind::Shl => Op::I32Shl,
            ShiftKind::ShrU => Op::I32ShrU,
            ShiftKind::ShrS => Op::I32ShrS,
        }
    }

    pub(crate) fn machine64(self) -> Op {
        match self {
            ShiftKind::Shl => Op::I64Shl,
            ShiftKind::ShrU => Op::I64ShrU,
            ShiftKind::ShrS => Op::I64ShrS,
        }
    }
}

/// Funnel a narrow shift into `target`, widening the value operand
/// and/or the count operand. The bounded-count flag rides along.
pub(super) fn funnel(
    f: &mut Function,
    n: NodeRef,
    target: Op,
    value_ext: Option<Op>,
    count_ext: Option<Op>,
) -> bool {
    let bounded = f.node(n).aux_bool();
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    let x = match value_ext {
        Some(ext) => {
            let ty = match ext {
                Op::SignExt8to32 | Op::SignExt16to32 => f.cat.int32,
                _ => f.cat.uint32,
            };
            f.helper1(n, ext, ty, x)
        }
        None => x,
    };
    let y = match count_ext {
        Some(ext) => {
            let uint32 = f.cat.uint32;
            f.helper1(n, ext, uint32, y)
        }
        None => y,
    };
    f.reset(n, target);
    f.set_aux_int(n, bounded as i64);
    f.add_args2(n, x, y);
    true
}

/// The three 32-bit-count base forms.
pub(super) fn base32(f: &mut Function, n: NodeRef, kind: ShiftKind) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    let machine = kind.machine32();

    // Bounded counts (flagged upstream or provable here) take the raw
    // machine shift.
    if f.node(n).aux_bool() || legality::shift_is_bounded(f, y, 32) {
        f.reset(n, machine);
        f.add_args2(n, x, y);
        return true;
    }

    if let Some(c) = super::as_i32const(f, y) {
        // Bounded consts were handled above; this count saturates.
        debug_assert!(c as u32 >= 32);
        match kind {
            ShiftKind::Shl | ShiftKind::ShrU => {
                f.reset(n, Op::I32Const);
            }
            ShiftKind::ShrS => {
                let c31 = f.iconst(n, 31);
                f.reset(n, Op::I32ShrS);
                f.add_args2(n, x, c31);
            }
        }
        return true;
    }

    let uint32 = f.cat.uint32;
    let int32 = f.cat.int32;
    let bool_ = f.cat.bool_;
    match kind {
        ShiftKind::Shl | ShiftKind::ShrU => {
            let shifted = f.helper2(n, machine, uint32, x, y);
            let zero = f.iconst(n, 0);
            let c32 = f.iconst(n, 32);
            let in_range = f.helper2(n, Op::I32LtU, bool_, y, c32);
            f.reset(n, Op::Select);
            f.add_args3(n, shifted, zero, in_range);
        }
        ShiftKind::ShrS => {
            let c31 = f.iconst(n, 31);
            let c32 = f.iconst(n, 32);
            let in_range = f.helper2(n, Op::I32LtU, bool_, y, c32);
            let count = f.helper3(n, Op::Select, int32, y, c31, in_range);
            f.reset(n, Op::I32ShrS);
            f.add_args2(n, x, count);
        }
    }
    true
}

/// 8/16/32-bit results with a 64-bit count. `x32op` is the matching
/// 32-bit-count form; `sext` widens the value for the saturated
/// arithmetic result.
pub(super) fn small_x64(
    f: &mut Function,
    n: NodeRef,
    kind: ShiftKind,
    width: u32,
    x32op: Op,
    sext: Option<Op>,
) -> bool {
    let bounded = f.node(n).aux_bool();
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    let uint32 = f.cat.uint32;
    let int32 = f.cat.int32;

    if let Some(c) = as_const64(f, y) {
        if (c as u64) < width as u64 {
            // A literal in-range count is bounded by inspection; the
            // 32-bit-count form takes it from here.
            let cn = f.iconst(n, c as u32);
            f.reset(n, x32op);
            f.add_args2(n, x, cn);
        } else {
            match kind {
                ShiftKind::Shl | ShiftKind::ShrU => {
                    f.reset(n, Op::I32Const);
                }
                ShiftKind::ShrS => {
                    let v = match sext {
                        Some(ext) => f.helper1(n, ext, int32, x),
                        None => x,
                    };
                    f.reset(n, Op::Signmask);
                    f.add_arg(n, v);
                }
            }
        }
        return true;
    }

    if let Some((hi, lo)) = as_int64_make(f, y) {
        return match as_const32(f, hi) {
            Some(c) if c != 0 => {
                // The count is provably >= 2^32: saturate.
                match kind {
                    ShiftKind::Shl | ShiftKind::ShrU => {
                        f.reset(n, Op::Const32);
                    }
                    ShiftKind::ShrS => {
                        let v = match sext {
                            Some(ext) => f.helper1(n, ext, int32, x),
                            None => x,
                        };
                        f.reset(n, Op::Signmask);
                        f.add_arg(n, v);
                    }
                }
                true
            }
            Some(_) => {
                // High half is zero: the low half is the whole count.
                f.reset(n, x32op);
                f.set_aux_int(n, bounded as i64);
                f.add_args2(n, x, lo);
                true
            }
            None => {
                let zm = f.helper1(n, Op::Zeromask, uint32, hi);
                let or = f.helper2(n, Op::Or32, uint32, zm, lo);
                f.reset(n, x32op);
                f.add_args2(n, x, or);
                true
            }
        };
    }

    // Count not visibly split yet: project the halves ourselves.
    let (hi, lo) = halves(f, n, y);
    let zm = f.helper1(n, Op::Zeromask, uint32, hi);
    let or = f.helper2(n, Op::Or32, uint32, zm, lo);
    f.reset(n, x32op);
    f.add_args2(n, x, or);
    true
}

/// 64-bit results with a 64-bit count: collapse the count to 32 bits.
pub(super) fn wide_x64(f: &mut Function, n: NodeRef, kind: ShiftKind) -> bool {
    let bounded = f.node(n).aux_bool();
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    let uint32 = f.cat.uint32;
    let x32op = match kind {
        ShiftKind::Shl => Op::Lsh64x32,
        ShiftKind::ShrU => Op::Rsh64Ux32,
        ShiftKind::ShrS => Op::Rsh64Sx32,
    };

    if let Some((hi, lo)) = as_int64_make(f, y) {
        return match as_const32(f, hi) {
            Some(c) if c != 0 => {
                match kind {
                    ShiftKind::Shl | ShiftKind::ShrU => {
                        f.reset(n, Op::Const64);
                    }
                    ShiftKind::ShrS => {
                        // Both halves become the replicated sign.
                        let xhi = f.helper1(n, Op::Int64Hi, uint32, x);
                        let sm = f.helper1(n, Op::Signmask, uint32, xhi);
                        f.reset(n, Op::Int64Make);
                        f.add_args2(n, sm, sm);
                    }
                }
                true
            }
            Some(_) => {
                f.reset(n, x32op);
                f.set_aux_int(n, bounded as i64);
                f.add_args2(n, x, lo);
                true
            }
            None => {
                let zm = f.helper1(n, Op::Zeromask, uint32, hi);
                let or = f.helper2(n, Op::Or32, uint32, zm, lo);
                f.reset(n, x32op);
                f.add_args2(n, x, or);
                true
            }
        };
    }

    let (hi, lo) = halves(f, n, y);
    let zm = f.helper1(n, Op::Zeromask, uint32, hi);
    let or = f.helper2(n, Op::Or32, uint32, zm, lo);
    f.reset(n, x32op);
    f.add_args2(n, x, or);
    true
}

/// Per-count-width opcode selections for the 64-bit or-of-shifts trees.
struct TreeOps {
    lsh: Op,
    rshu: Op,
    rshs: Op,
    sub: Op,
    const_: Op,
    const_ty: fn(&Function) -> ridge_ir::TypeRef,
    /// Shift of the count itself, for the sign gate.
    count_shr: Op,
    count_ext: Option<Op>,
}

fn tree_ops(count_width: u32) -> TreeOps {
    match count_width {
        32 => TreeOps {
            lsh: Op::Lsh32x32,
            rshu: Op::Rsh32Ux32,
            rshs: Op::Rsh32Sx32,
            sub: Op::Sub32,
            const_: Op::Const32,
            const_ty: |f| f.cat.uint32,
            count_shr: Op::Rsh32Ux32,
            count_ext: None,
        },
        16 => TreeOps {
            lsh: Op::Lsh32x16,
            rshu: Op::Rsh32Ux16,
            rshs: Op::Rsh32Sx16,
            sub: Op::Sub16,
            const_: Op::Const16,
            const_ty: |f| f.cat.uint16,
            count_shr: Op::Rsh16Ux32,
            count_ext: Some(Op::ZeroExt16to32),
        },
        8 => TreeOps {
            lsh: Op::Lsh32x8,
            rshu: Op::Rsh32Ux8,
            rshs: Op::Rsh32Sx8,
            sub: Op::Sub8,
            const_: Op::Const8,
            const_ty: |f| f.cat.uint8,
            count_shr: Op::Rsh8Ux32,
            count_ext: Some(Op::ZeroExt8to32),
        },
        _ => unreachable!("tree_ops width {count_width}"),
    }
}

/// 64-bit result, narrow count: the three-term or-of-shifts. The
/// sub-shifts saturate individually, which is what makes a straight-
/// line funnel out of a count that may reach 63.
pub(super) fn wide_tree(f: &mut Function, n: NodeRef, kind: ShiftKind, count_width: u32) -> bool {
    let ops = tree_ops(count_width);
    let x = f.arg(n, 0);
    let s = f.arg(n, 1);
    let uint32 = f.cat.uint32;
    let cty = (ops.const_ty)(f);

    let (xhi, xlo) = halves(f, n, x);
    let c32 = f.helper(n, ops.const_, cty);
    f.set_aux_int(c32, 32);

    let (hi_out, lo_out) = match kind {
        ShiftKind::Shl => {
            // hi' = hi<<s | lo>>(32-s) | lo<<(s-32); lo' = lo<<s
            let t1 = f.helper2(n, ops.lsh, uint32, xhi, s);
            let d1 = f.helper2(n, ops.sub, cty, c32, s);
            let t2 = f.helper2(n, ops.rshu, uint32, xlo, d1);
            let o1 = f.helper2(n, Op::Or32, uint32, t1, t2);
            let d2 = f.helper2(n, ops.sub, cty, s, c32);
            let t3 = f.helper2(n, ops.lsh, uint32, xlo, d2);
            let hi_out = f.helper2(n, Op::Or32, uint32, o1, t3);
            let lo_out = f.helper2(n, ops.lsh, uint32, xlo, s);
            (hi_out, lo_out)
        }
        ShiftKind::ShrU => {
            // hi' = hi>>s; lo' = lo>>s | hi<<(32-s) | hi>>(s-32)
            let hi_out = f.helper2(n, ops.rshu, uint32, xhi, s);
            let t1 = f.helper2(n, ops.rshu, uint32, xlo, s);
            let d1 = f.helper2(n, ops.sub, cty, c32, s);
            let t2 = f.helper2(n, ops.lsh, uint32, xhi, d1);
            let o1 = f.helper2(n, Op::Or32, uint32, t1, t2);
            let d2 = f.helper2(n, ops.sub, cty, s, c32);
            let t3 = f.helper2(n, ops.rshu, uint32, xhi, d2);
            let lo_out = f.helper2(n, Op::Or32, uint32, o1, t3);
            (hi_out, lo_out)
        }
        ShiftKind::ShrS => {
            // Like ShrU, but the third term carries sign bits and only
            // applies once the count passes 32, gated by Zeromask(s>>5).
            let hi_out = f.helper2(n, ops.rshs, uint32, xhi, s);
            let t1 = f.helper2(n, ops.rshu, uint32, xlo, s);
            let d1 = f.helper2(n, ops.sub, cty, c32, s);
            let t2 = f.helper2(n, ops.lsh, uint32, xhi, d1);
            let o1 = f.helper2(n, Op::Or32, uint32, t1, t2);
            let d2 = f.helper2(n, ops.sub, cty, s, c32);
            let sat = f.helper2(n, ops.rshs, uint32, xhi, d2);
            let c5 = f.helper(n, Op::Const32, uint32);
            f.set_aux_int(c5, 5);
            let g0 = f.helper2(n, ops.count_shr, cty, s, c5);
            let g1 = match ops.count_ext {
                Some(ext) => f.helper1(n, ext, uint32, g0),
                None => g0,
            };
            let gate = f.helper1(n, Op::Zeromask, uint32, g1);
            let t3 = f.helper2(n, Op::And32, uint32, sat, gate);
            let lo_out = f.helper2(n, Op::Or32, uint32, o1, t3);
            (hi_out, lo_out)
        }
    };

    f.reset(n, Op::Int64Make);
    f.add_args2(n, hi_out, lo_out);
    true
}

/// Rotate on a word maps to the machine rotate; a 64-bit count keeps
/// only its low half, since rotates are modular anyway.
pub(super) fn rotate32(f: &mut Function, n: NodeRef) -> bool {
    let y = f.arg(n, 1);
    if let Some((_, lo)) = as_int64_make(f, y) {
        f.set_arg(n, 1, lo);
        return true;
    }
    retag(f, n, Op::I32Rotl)
}

/// Sub-word rotates by a constant split into an or-of-shifts; there is
/// no sub-word machine rotate. Variable sub-word counts are left to the
/// upstream builder, which only emits them for constants.
pub(super) fn rotate_narrow(
    f: &mut Function,
    n: NodeRef,
    mask: u32,
    or: Op,
    lsh: Op,
    rshu: Op,
) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    if let Some(c) = super::as_i32const(f, y) {
        let ty = f.ty(n);
        let cl = f.iconst(n, (c as u32) & mask);
        let left = f.helper2(n, lsh, ty, x, cl);
        let cr = f.iconst(n, (c as u32).wrapping_neg() & mask);
        let right = f.helper2(n, rshu, ty, x, cr);
        f.reset(n, or);
        f.add_args2(n, left, right);
        return true;
    }
    if let Some((_, lo)) = as_int64_make(f, y) {
        f.set_arg(n, 1, lo);
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridge_ir::{Pos, TargetConfig};

    fn shift_node(op: Op, ty_of: fn(&Function) -> ridge_ir::TypeRef) -> (Function, NodeRef) {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let ty = ty_of(&f);
        let x = f.new_node(b, Op::Arg, ty, Pos::default());
        let y = f.new_node(b, Op::Arg, f.cat.uint32, Pos::default());
        let s = f.new_node(b, op, ty, Pos::default());
        f.add_args2(s, x, y);
        (f, s)
    }

    #[test]
    fn bounded_flag_takes_the_raw_shift() {
        let (mut f, s) = shift_node(Op::Lsh32x32, |f| f.cat.uint32);
        f.set_aux_int(s, 1);
        assert!(base32(&mut f, s, ShiftKind::Shl));
        assert_eq!(f.op(s), Op::I32Shl);
        assert_eq!(f.args(s).len(), 2);
    }

    #[test]
    fn unbounded_logical_shift_gets_a_select() {
        let (mut f, s) = shift_node(Op::Lsh32x32, |f| f.cat.uint32);
        assert!(base32(&mut f, s, ShiftKind::Shl));
        assert_eq!(f.op(s), Op::Select);
        let shifted = f.arg(s, 0);
        let zero = f.arg(s, 1);
        let guard = f.arg(s, 2);
        assert_eq!(f.op(shifted), Op::I32Shl);
        assert_eq!(f.aux_int(zero), 0);
        assert_eq!(f.op(guard), Op::I32LtU);
        assert_eq!(f.node(f.arg(guard, 1)).aux_u32(), 32);
    }

    #[test]
    fn unbounded_arithmetic_shift_saturates_the_count() {
        let (mut f, s) = shift_node(Op::Rsh32Sx32, |f| f.cat.int32);
        assert!(base32(&mut f, s, ShiftKind::ShrS));
        assert_eq!(f.op(s), Op::I32ShrS);
        let count = f.arg(s, 1);
        assert_eq!(f.op(count), Op::Select);
        assert_eq!(f.node(f.arg(count, 1)).aux_u32(), 31);
    }

    #[test]
    fn const_count_past_the_width_is_zero() {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.uint32, Pos::default());
        let c = f.new_node(b, Op::Const64, f.cat.int64, Pos::default());
        f.set_aux_int(c, 64);
        let s = f.new_node(b, Op::Lsh32x64, f.cat.uint32, Pos::default());
        f.add_args2(s, x, c);

        assert!(small_x64(&mut f, s, ShiftKind::Shl, 32, Op::Lsh32x32, None));
        assert_eq!(f.op(s), Op::I32Const);
        assert_eq!(f.aux_int(s), 0);
    }

    #[test]
    fn nonzero_high_count_half_saturates_signed_shift() {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.int32, Pos::default());
        let hi = f.new_node(b, Op::Const32, f.cat.uint32, Pos::default());
        f.set_aux_int(hi, 1);
        let lo = f.new_node(b, Op::Arg, f.cat.uint32, Pos::default());
        let make = f.new_node(b, Op::Int64Make, f.cat.uint64, Pos::default());
        f.add_args2(make, hi, lo);
        let s = f.new_node(b, Op::Rsh32Sx64, f.cat.int32, Pos::default());
        f.add_args2(s, x, make);

        assert!(small_x64(&mut f, s, ShiftKind::ShrS, 32, Op::Rsh32Sx32, None));
        assert_eq!(f.op(s), Op::Signmask);
        assert_eq!(f.arg(s, 0), x);
    }

    #[test]
    fn zero_high_count_half_collapses_to_the_low_word() {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.uint32, Pos::default());
        let hi = f.new_node(b, Op::Const32, f.cat.uint32, Pos::default());
        let lo = f.new_node(b, Op::Arg, f.cat.uint32, Pos::default());
        let make = f.new_node(b, Op::Int64Make, f.cat.uint64, Pos::default());
        f.add_args2(make, hi, lo);
        let s = f.new_node(b, Op::Lsh32x64, f.cat.uint32, Pos::default());
        f.add_args2(s, x, make);

        assert!(small_x64(&mut f, s, ShiftKind::Shl, 32, Op::Lsh32x32, None));
        assert_eq!(f.op(s), Op::Lsh32x32);
        assert_eq!(f.arg(s, 1), lo);
    }

    #[test]
    fn rotate16_by_const_splits_into_or_of_shifts() {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.uint16, Pos::default());
        let c = f.new_node(b, Op::I32Const, f.cat.uint32, Pos::default());
        f.set_aux_int(c, 3);
        let r = f.new_node(b, Op::RotateLeft16, f.cat.uint16, Pos::default());
        f.add_args2(r, x, c);

        assert!(rotate_narrow(&mut f, r, 15, Op::Or16, Op::Lsh16x32, Op::Rsh16Ux32));
        assert_eq!(f.op(r), Op::Or16);
        let left = f.arg(r, 0);
        let right = f.arg(r, 1);
        assert_eq!(f.op(left), Op::Lsh16x32);
        assert_eq!(f.aux_int(f.arg(left, 1)), 3);
        assert_eq!(f.op(right), Op::Rsh16Ux32);
        assert_eq!(f.aux_int(f.arg(right, 1)), 13);
    }
}
