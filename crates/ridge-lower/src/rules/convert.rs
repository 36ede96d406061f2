//! Width conversions.
//!
//! Sign extensions prefer the native extend instructions when the
//! target has them and elide entirely after a signed load of the same
//! width; the shl/sar fallback shares one count literal between both
//! shifts. Zero extensions are masks. Truncations into a word are free;
//! truncations out of a pair project the low half.

use ridge_ir::{Function, NodeRef, Op};

use super::retag;

/// SignExt8to16 / SignExt8to32 / SignExt16to32.
pub(super) fn sign_ext_narrow(
    f: &mut Function,
    n: NodeRef,
    load: Op,
    extend: Op,
    shift: u32,
) -> bool {
    let x = f.arg(n, 0);
    // A signed load of the same width already produced the extension.
    if f.op(x) == load {
        f.copy_of(n, x);
        return true;
    }
    if f.cfg.has_sign_ext {
        f.reset(n, extend);
        f.add_arg(n, x);
        return true;
    }
    let int32 = f.cat.int32;
    let c = f.iconst(n, shift);
    let shl = f.helper2(n, Op::I32Shl, int32, x, c);
    f.reset(n, Op::I32ShrS);
    f.add_args2(n, shl, c);
    true
}

/// ZeroExt8to16 / ZeroExt8to32 / ZeroExt16to32 as a mask.
pub(super) fn zero_ext_narrow(f: &mut Function, n: NodeRef, load: Op, mask: u32) -> bool {
    let x = f.arg(n, 0);
    if f.op(x) == load {
        f.copy_of(n, x);
        return true;
    }
    let m = f.iconst(n, mask);
    f.reset(n, Op::I32And);
    f.add_args2(n, x, m);
    true
}

/// 8/16-bit extensions to 64 go through the 32-bit form.
pub(super) fn ext_to64(f: &mut Function, n: NodeRef, ext32: Op, ext64: Op) -> bool {
    let x = f.arg(n, 0);
    let ty = match ext32 {
        Op::SignExt8to32 | Op::SignExt16to32 => f.cat.int32,
        _ => f.cat.uint32,
    };
    let e = f.helper1(n, ext32, ty, x);
    f.reset(n, ext64);
    f.add_arg(n, e);
    true
}

pub(super) fn sign_ext32to64(f: &mut Function, n: NodeRef, native: bool) -> bool {
    if native {
        return retag(f, n, Op::I64ExtendI32S);
    }
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let sm = f.helper1(n, Op::Signmask, uint32, x);
    f.reset(n, Op::Int64Make);
    f.add_args2(n, sm, x);
    true
}

pub(super) fn zero_ext32to64(f: &mut Function, n: NodeRef, native: bool) -> bool {
    if native {
        return retag(f, n, Op::I64ExtendI32U);
    }
    let x = f.arg(n, 0);
    let uint32 = f.cat.uint32;
    let zero = f.helper(n, Op::Const32, uint32);
    f.reset(n, Op::Int64Make);
    f.add_args2(n, zero, x);
    true
}

pub(super) fn trunc64to32(f: &mut Function, n: NodeRef, native: bool) -> bool {
    if native {
        return retag(f, n, Op::I32WrapI64);
    }
    let x = f.arg(n, 0);
    if f.op(x) == Op::Int64Make {
        let lo = f.arg(x, 1);
        f.copy_of(n, lo);
        return true;
    }
    f.reset(n, Op::Int64Lo);
    f.add_arg(n, x);
    true
}

/// Trunc64to8 / Trunc64to16. The in-word truncation is a no-op, so
/// this only has to reach the low half.
pub(super) fn trunc64_narrow(f: &mut Function, n: NodeRef, trunc32: Op, native: bool) -> bool {
    if native {
        return retag(f, n, Op::I32WrapI64);
    }
    let x = f.arg(n, 0);
    let lo = if f.op(x) == Op::Int64Make {
        f.arg(x, 1)
    } else {
        let uint32 = f.cat.uint32;
        f.helper1(n, Op::Int64Lo, uint32, x)
    };
    f.reset(n, trunc32);
    f.add_arg(n, lo);
    true
}
