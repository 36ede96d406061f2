//! Bit-counting and byte-swap lowering.
//!
//! Word forms retag to the machine instructions; sub-word forms widen
//! first. The 64-bit forms combine two word counts branch-free using
//! `Zeromask` of the half that decides which word contributes.

use ridge_ir::{Function, NodeRef, Op};

use super::halves;

/// Ctz8/Ctz16: set the bit just past the width so a zero input counts
/// exactly `width` trailing zeros.
pub(super) fn rewrite_ctz_narrow(f: &mut Function, n: NodeRef, sentinel: u32) -> bool {
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let s = f.iconst(n, sentinel);
    let or = f.helper2(n, Op::I32Or, uint32, x, s);
    f.reset(n, Op::I32Ctz);
    f.add_arg(n, or);
    true
}

/// `ctz64(x) = ctz32(lo) + (lo == 0 ? ctz32(hi) : 0)`, with the
/// conditional as a mask. The helpers stay generic and lower on the
/// next sweep.
pub(super) fn rewrite_ctz64(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let (hi, lo) = halves(f, n, x);
    let clo = f.helper1(n, Op::Ctz32, uint32, lo);
    let chi = f.helper1(n, Op::Ctz32, uint32, hi);
    let zm = f.helper1(n, Op::Zeromask, uint32, lo);
    let notzm = f.helper1(n, Op::Com32, uint32, zm);
    let gated = f.helper2(n, Op::And32, uint32, notzm, chi);
    f.reset(n, Op::Add32);
    f.add_args2(n, clo, gated);
    true
}

/// BitLen8/BitLen16 widen unsigned and defer to the word form.
pub(super) fn rewrite_bitlen_narrow(f: &mut Function, n: NodeRef, ext: Op) -> bool {
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let e = f.helper1(n, ext, uint32, x);
    f.reset(n, Op::BitLen32);
    f.add_arg(n, e);
    true
}

/// `bitlen32(x) = 32 - clz(x)`.
pub(super) fn rewrite_bitlen32(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let c32 = f.iconst(n, 32);
    let clz = f.helper1(n, Op::I32Clz, uint32, x);
    f.reset(n, Op::I32Sub);
    f.add_args2(n, c32, clz);
    true
}

/// A nonzero high half forces the low word to all-ones, so its count
/// contributes a full 32 and the high count lands on top.
pub(super) fn rewrite_bitlen64(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let (hi, lo) = halves(f, n, x);
    let bhi = f.helper1(n, Op::BitLen32, uint32, hi);
    let zm = f.helper1(n, Op::Zeromask, uint32, hi);
    let or = f.helper2(n, Op::Or32, uint32, lo, zm);
    let blo = f.helper1(n, Op::BitLen32, uint32, or);
    f.reset(n, Op::Add32);
    f.add_args2(n, bhi, blo);
    true
}

pub(super) fn rewrite_popcount_narrow(f: &mut Function, n: NodeRef, ext: Op) -> bool {
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let e = f.helper1(n, ext, uint32, x);
    f.reset(n, Op::I32Popcnt);
    f.add_arg(n, e);
    true
}

/// Swap within each half, then swap the halves.
pub(super) fn rewrite_bswap64(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let (hi, lo) = halves(f, n, x);
    let new_hi = f.helper1(n, Op::Bswap32, uint32, lo);
    let new_lo = f.helper1(n, Op::Bswap32, uint32, hi);
    f.reset(n, Op::Int64Make);
    f.add_args2(n, new_hi, new_lo);
    true
}

/// Four-byte swap as shifts and masks; the two middle bytes need the
/// masks, the outer bytes fall off the ends on their own.
pub(super) fn rewrite_bswap32(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let c24 = f.iconst(n, 24);
    let c8 = f.iconst(n, 8);
    let b0 = f.helper2(n, Op::I32Shl, uint32, x, c24);
    let t1 = f.helper2(n, Op::I32Shl, uint32, x, c8);
    let m1 = f.iconst(n, 0x00FF_0000);
    let b1 = f.helper2(n, Op::I32And, uint32, t1, m1);
    let t2 = f.helper2(n, Op::I32ShrU, uint32, x, c8);
    let m2 = f.iconst(n, 0x0000_FF00);
    let b2 = f.helper2(n, Op::I32And, uint32, t2, m2);
    let b3 = f.helper2(n, Op::I32ShrU, uint32, x, c24);
    let top = f.helper2(n, Op::I32Or, uint32, b0, b1);
    let bot = f.helper2(n, Op::I32Or, uint32, b2, b3);
    f.reset(n, Op::I32Or);
    f.add_args2(n, top, bot);
    true
}

pub(super) fn rewrite_bswap16(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let c8 = f.iconst(n, 8);
    let mask = f.iconst(n, 0xFF00);
    let shl = f.helper2(n, Op::I32Shl, uint32, x, c8);
    let hi = f.helper2(n, Op::I32And, uint32, shl, mask);
    let masked = f.helper2(n, Op::I32And, uint32, x, mask);
    let lo = f.helper2(n, Op::I32ShrU, uint32, masked, c8);
    f.reset(n, Op::I32Or);
    f.add_args2(n, hi, lo);
    true
}
