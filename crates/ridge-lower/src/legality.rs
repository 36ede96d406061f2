//! Target legality predicates consulted by the rewrite rules.
//!
//! These answer "may the raw machine form be used here": whether a
//! shift count is provably below the width, and whether a byte offset
//! fits the addressing immediate. They look through value structure but
//! never mutate it.

use ridge_ir::{Function, NodeRef, Op};

/// Constant payload of any integer literal node, as an unsigned count.
pub fn const_count(f: &Function, n: NodeRef) -> Option<u64> {
    match f.op(n) {
        Op::Const8 | Op::Const16 | Op::Const32 | Op::I32Const => {
            Some(f.node(n).aux_u32() as u64)
        }
        Op::Const64 | Op::I64Const => Some(f.node(n).aux_u64()),
        _ => None,
    }
}

/// Whether `count` is provably below `width`, so the raw machine shift
/// already computes the language-level result.
pub fn shift_is_bounded(f: &Function, count: NodeRef, width: u32) -> bool {
    let mut n = count;
    loop {
        if let Some(c) = const_count(f, n) {
            return c < width as u64;
        }
        match f.op(n) {
            // Masking with a small literal bounds the count.
            Op::I32And | Op::And8 | Op::And16 | Op::And32 | Op::And64 => {
                let x = f.arg(n, 0);
                let y = f.arg(n, 1);
                return [x, y]
                    .iter()
                    .any(|&a| const_count(f, a).is_some_and(|m| m < width as u64));
            }
            // An unsigned remainder is below its literal modulus.
            Op::I32RemU | Op::Mod32U | Op::Mod64U => {
                let m = f.arg(n, 1);
                return const_count(f, m).is_some_and(|m| m != 0 && m <= width as u64);
            }
            // Extensions and forwarding copies do not grow the count.
            Op::Copy
            | Op::ZeroExt8to16
            | Op::ZeroExt8to32
            | Op::ZeroExt8to64
            | Op::ZeroExt16to32
            | Op::ZeroExt16to64
            | Op::ZeroExt32to64 => {
                n = f.arg(n, 0);
            }
            _ => return false,
        }
    }
}

/// Whether `off` can ride in the addressing immediate of a load, store,
/// or lowered address.
pub fn fits_addr_offset(f: &Function, off: i64) -> bool {
    f.cfg.fits_addr_imm(off)
}
