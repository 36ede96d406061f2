//! 64-bit integer decomposition.
//!
//! Under `Int64Strategy::Decompose` every 64-bit value lives as a
//! register pair; `Int64Make` combines two words, `Int64Hi`/`Int64Lo`
//! project them, and the carry-coupled operations go through the
//! two-word pseudo ops with exactly one `Select0` and one `Select1`.
//! The branch-free masks live here too since only the pair rules use
//! them.

use ridge_ir::{Function, NodeRef, Op};

use super::{as_const64, halves, retag};

/// Add64/Sub64/Mul64/Div64/Mod64. Two literal operands fold at the
/// 64-bit level first; otherwise the operation becomes a single tuple
/// node over the four halves, or a native `I64` op.
pub(super) fn rewrite_arith64(f: &mut Function, n: NodeRef, native: bool) -> bool {
    let op = f.op(n);
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);

    if let (Some(a), Some(b)) = (as_const64(f, x), as_const64(f, y))
        && let Some(v) = fold64(op, a, b)
    {
        f.reset(n, Op::Const64);
        f.set_aux_int(n, v);
        return true;
    }

    if native {
        let machine = match op {
            Op::Add64 => Op::I64Add,
            Op::Sub64 => Op::I64Sub,
            Op::Mul64 => Op::I64Mul,
            Op::Div64S => Op::I64DivS,
            Op::Div64U => Op::I64DivU,
            Op::Mod64S => Op::I64RemS,
            Op::Mod64U => Op::I64RemU,
            _ => unreachable!("rewrite_arith64 on {op}"),
        };
        return retag(f, n, machine);
    }

    let pair_op = match op {
        Op::Add64 => Op::LoweredAdd64,
        Op::Sub64 => Op::LoweredSub64,
        Op::Mul64 => Op::LoweredMul64,
        Op::Div64S => Op::LoweredDiv64S,
        Op::Div64U => Op::LoweredDiv64U,
        Op::Mod64S => Op::LoweredMod64S,
        Op::Mod64U => Op::LoweredMod64U,
        _ => unreachable!("rewrite_arith64 on {op}"),
    };
    let (xhi, xlo) = halves(f, n, x);
    let (yhi, ylo) = halves(f, n, y);
    let p = f.pair64(n, pair_op, xhi, xlo, yhi, ylo);
    f.reset(n, Op::Int64Make);
    f.add_args2(n, p.hi, p.lo);
    true
}

/// Wrapping 64-bit fold of the generic arithmetic ops. Division by
/// zero and the `MIN / -1` overflow stay unfolded.
pub(super) fn fold64(op: Op, a: i64, b: i64) -> Option<i64> {
    Some(match op {
        Op::Add64 => a.wrapping_add(b),
        Op::Sub64 => a.wrapping_sub(b),
        Op::Mul64 => a.wrapping_mul(b),
        Op::Div64S => a.checked_div(b)?,
        Op::Div64U => ((a as u64).checked_div(b as u64)?) as i64,
        Op::Mod64S => a.checked_rem(b)?,
        Op::Mod64U => ((a as u64).checked_rem(b as u64)?) as i64,
        Op::And64 => a & b,
        Op::Or64 => a | b,
        Op::Xor64 => a ^ b,
        _ => return None,
    })
}

/// And64/Or64/Xor64 act on the halves independently.
pub(super) fn rewrite_logic64(f: &mut Function, n: NodeRef, native: bool) -> bool {
    let op = f.op(n);
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);

    if let (Some(a), Some(b)) = (as_const64(f, x), as_const64(f, y))
        && let Some(v) = fold64(op, a, b)
    {
        f.reset(n, Op::Const64);
        f.set_aux_int(n, v);
        return true;
    }

    let (op32, machine) = match op {
        Op::And64 => (Op::And32, Op::I64And),
        Op::Or64 => (Op::Or32, Op::I64Or),
        Op::Xor64 => (Op::Xor32, Op::I64Xor),
        _ => unreachable!("rewrite_logic64 on {op}"),
    };
    if native {
        return retag(f, n, machine);
    }

    let uint32 = f.cat.uint32;
    let (xhi, xlo) = halves(f, n, x);
    let (yhi, ylo) = halves(f, n, y);
    let hi = f.helper2(n, op32, uint32, xhi, yhi);
    let lo = f.helper2(n, op32, uint32, xlo, ylo);
    f.reset(n, Op::Int64Make);
    f.add_args2(n, hi, lo);
    true
}

/// `-x` at 64 bits: `0 - x`, re-lowered through the pair path.
pub(super) fn rewrite_neg64(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let int64 = f.cat.int64;
    let zero = f.helper(n, Op::Const64, int64);
    f.reset(n, Op::Sub64);
    f.add_args2(n, zero, x);
    true
}

/// `^x` complements each half.
pub(super) fn rewrite_com64(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let (xhi, xlo) = halves(f, n, x);
    let hi = f.helper1(n, Op::Com32, uint32, xhi);
    let lo = f.helper1(n, Op::Com32, uint32, xlo);
    f.reset(n, Op::Int64Make);
    f.add_args2(n, hi, lo);
    true
}

/// `Int64Hi(Int64Make(hi, _))` forwards to `hi`; the residual-free
/// split/combine law.
pub(super) fn rewrite_int64_hi(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    if f.op(x) == Op::Int64Make {
        let hi = f.arg(x, 0);
        f.copy_of(n, hi);
        return true;
    }
    false
}

pub(super) fn rewrite_int64_lo(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    if f.op(x) == Op::Int64Make {
        let lo = f.arg(x, 1);
        f.copy_of(n, lo);
        return true;
    }
    false
}

/// All-ones when `x` is nonzero, zero otherwise:
/// `(x >>u 1) - x` is negative exactly when `x != 0`.
pub(super) fn rewrite_zeromask(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let int32 = f.cat.int32;
    let one = f.iconst(n, 1);
    let half = f.helper2(n, Op::I32ShrU, uint32, x, one);
    let sub = f.helper2(n, Op::I32Sub, int32, half, x);
    let c31 = f.iconst(n, 31);
    f.reset(n, Op::I32ShrS);
    f.add_args2(n, sub, c31);
    true
}

/// The sign bit smeared across the word.
pub(super) fn rewrite_signmask(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let c31 = f.iconst(n, 31);
    f.reset(n, Op::I32ShrS);
    f.add_args2(n, x, c31);
    true
}

/// All-ones when `x > 0` (slice lengths are non-negative): `(0 - x) >> 31`.
pub(super) fn rewrite_slicemask(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let int32 = f.cat.int32;
    let zero = f.iconst(n, 0);
    let neg = f.helper2(n, Op::I32Sub, int32, zero, x);
    let c31 = f.iconst(n, 31);
    f.reset(n, Op::I32ShrS);
    f.add_args2(n, neg, c31);
    true
}
