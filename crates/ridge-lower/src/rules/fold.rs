//! Machine-level canonicalization and constant folding.
//!
//! These rules run on opcodes the lowering itself produced, so the
//! whole pass stays a single fixpoint: lower, then keep folding until
//! nothing fires. Commutative operations move a literal operand to the
//! right; address arithmetic folds into access offsets when the target
//! can encode them; loads through read-only data become literals.

use ridge_ir::node::{aux_from_f64, aux_from_i32, aux_from_u32};
use ridge_ir::{Endianness, Function, NodeRef, Op, SymRef};

use super::as_i32const;
use crate::legality;

pub(super) fn i32_add(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    if let (Some(a), Some(b)) = (as_i32const(f, x), as_i32const(f, y)) {
        f.reset(n, Op::I32Const);
        f.set_aux_int(n, aux_from_i32(a.wrapping_add(b)));
        return true;
    }
    if as_i32const(f, x).is_some() {
        f.set_arg(n, 0, y);
        f.set_arg(n, 1, x);
        return true;
    }
    if let Some(c) = as_i32const(f, y)
        && !f.types.is_ptr(f.ty(y))
    {
        f.reset(n, Op::I32AddConst);
        f.set_aux_int(n, aux_from_i32(c));
        f.add_arg(n, x);
        return true;
    }
    false
}

pub(super) fn i32_add_const(f: &mut Function, n: NodeRef) -> bool {
    let off = f.node(n).aux_i32();
    let x = f.arg(n, 0);
    if off == 0 {
        f.copy_of(n, x);
        return true;
    }
    match f.op(x) {
        Op::LoweredAddr => {
            let sum = off.wrapping_add(f.node(x).aux_i32());
            if sum >= 0 && legality::fits_addr_offset(f, sum as i64) {
                let aux = f.node(x).aux;
                let base = f.arg(x, 0);
                f.reset(n, Op::LoweredAddr);
                f.set_aux_int(n, aux_from_i32(sum));
                f.set_aux(n, aux);
                f.add_arg(n, base);
                return true;
            }
            false
        }
        Op::SP if off >= 0 && legality::fits_addr_offset(f, off as i64) => {
            f.reset(n, Op::LoweredAddr);
            f.set_aux_int(n, aux_from_i32(off));
            f.add_arg(n, x);
            true
        }
        _ => false,
    }
}

/// Commutative word operation: fold two literals, else move a literal
/// operand to the right.
pub(super) fn i32_binop(f: &mut Function, n: NodeRef, fold: impl Fn(i32, i32) -> i32) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    if let (Some(a), Some(b)) = (as_i32const(f, x), as_i32const(f, y)) {
        f.reset(n, Op::I32Const);
        f.set_aux_int(n, aux_from_i32(fold(a, b)));
        return true;
    }
    if as_i32const(f, x).is_some() {
        f.set_arg(n, 0, y);
        f.set_arg(n, 1, x);
        return true;
    }
    false
}

/// Fold a shift of two literals with saturating count semantics:
/// logical shifts by 32 or more are zero, arithmetic ones keep the
/// sign word.
pub(super) fn i32_shift(f: &mut Function, n: NodeRef) -> bool {
    let op = f.op(n);
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    let (Some(a), Some(c)) = (as_i32const(f, x), as_i32const(f, y)) else {
        return false;
    };
    let c = c as u32;
    let v = match op {
        Op::I32Shl => {
            if c < 32 {
                a.wrapping_shl(c)
            } else {
                0
            }
        }
        Op::I32ShrU => {
            if c < 32 {
                ((a as u32) >> c) as i32
            } else {
                0
            }
        }
        Op::I32ShrS => a >> c.min(31),
        _ => unreachable!("i32_shift on {op}"),
    };
    f.reset(n, Op::I32Const);
    f.set_aux_int(n, aux_from_i32(v));
    true
}

pub(super) fn i32_eq(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    if let (Some(a), Some(b)) = (as_i32const(f, x), as_i32const(f, y)) {
        f.reset(n, Op::I32Const);
        f.set_aux_int(n, (a == b) as i64);
        return true;
    }
    if as_i32const(f, x).is_some() {
        f.set_arg(n, 0, y);
        f.set_arg(n, 1, x);
        return true;
    }
    if as_i32const(f, y) == Some(0) {
        f.reset(n, Op::I32Eqz);
        f.add_arg(n, x);
        return true;
    }
    false
}

pub(super) fn i32_ne(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    if let (Some(a), Some(b)) = (as_i32const(f, x), as_i32const(f, y)) {
        f.reset(n, Op::I32Const);
        f.set_aux_int(n, (a != b) as i64);
        return true;
    }
    if as_i32const(f, x).is_some() {
        f.set_arg(n, 0, y);
        f.set_arg(n, 1, x);
        return true;
    }
    if as_i32const(f, y) == Some(0) {
        let bool_ = f.cat.bool_;
        let z = f.helper1(n, Op::I32Eqz, bool_, x);
        f.reset(n, Op::I32Eqz);
        f.add_arg(n, z);
        return true;
    }
    false
}

/// A triple negation is a single one.
pub(super) fn i32_eqz(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    if f.op(x) == Op::I32Eqz {
        let y = f.arg(x, 0);
        if f.op(y) == Op::I32Eqz {
            let inner = f.arg(y, 0);
            f.reset(n, Op::I32Eqz);
            f.add_arg(n, inner);
            return true;
        }
    }
    false
}

pub(super) fn i32_le_u(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    if as_i32const(f, y) == Some(0) {
        f.reset(n, Op::I32Eqz);
        f.add_arg(n, x);
        return true;
    }
    if as_i32const(f, x) == Some(1) {
        let bool_ = f.cat.bool_;
        let z = f.helper1(n, Op::I32Eqz, bool_, y);
        f.reset(n, Op::I32Eqz);
        f.add_arg(n, z);
        return true;
    }
    false
}

pub(super) fn i32_lt_u(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    if as_i32const(f, x) == Some(0) {
        let bool_ = f.cat.bool_;
        let z = f.helper1(n, Op::I32Eqz, bool_, y);
        f.reset(n, Op::I32Eqz);
        f.add_arg(n, z);
        return true;
    }
    if as_i32const(f, y) == Some(1) {
        f.reset(n, Op::I32Eqz);
        f.add_arg(n, x);
        return true;
    }
    false
}

/// Single-precision add and multiply only canonicalize; folding them
/// here would have to reproduce the target's rounding exactly.
pub(super) fn f32_commute(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    if f.op(x) == Op::F32Const && f.op(y) != Op::F32Const {
        f.set_arg(n, 0, y);
        f.set_arg(n, 1, x);
        return true;
    }
    false
}

pub(super) fn f64_add(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    if f.op(x) == Op::F64Const && f.op(y) == Op::F64Const {
        let v = f.node(x).aux_f64() + f.node(y).aux_f64();
        // NaN payloads are not portable across the fold.
        if !v.is_nan() {
            f.reset(n, Op::F64Const);
            f.set_aux_int(n, aux_from_f64(v));
            return true;
        }
        return false;
    }
    if f.op(x) == Op::F64Const {
        f.set_arg(n, 0, y);
        f.set_arg(n, 1, x);
        return true;
    }
    false
}

pub(super) fn f64_mul(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    if f.op(x) == Op::F64Const && f.op(y) == Op::F64Const {
        let v = f.node(x).aux_f64() * f.node(y).aux_f64();
        // NaN payloads are not portable across the fold.
        if !v.is_nan() {
            f.reset(n, Op::F64Const);
            f.set_aux_int(n, aux_from_f64(v));
            return true;
        }
        return false;
    }
    if f.op(x) == Op::F64Const {
        f.set_arg(n, 0, y);
        f.set_arg(n, 1, x);
        return true;
    }
    false
}

/// Fold an immediate pointer increment into the access offset.
fn fold_addr_offset(f: &mut Function, n: NodeRef) -> bool {
    let ptr = f.arg(n, 0);
    if f.op(ptr) != Op::I32AddConst {
        return false;
    }
    let sum = f.node(n).aux_i32().wrapping_add(f.node(ptr).aux_i32());
    if sum >= 0 && legality::fits_addr_offset(f, sum as i64) {
        let base = f.arg(ptr, 0);
        f.set_aux_int(n, aux_from_i32(sum));
        f.set_arg(n, 0, base);
        return true;
    }
    false
}

fn read_u16(f: &Function, sym: SymRef, off: i64) -> Option<u32> {
    let b0 = f.syms.read_u8(sym, off)? as u32;
    let b1 = f.syms.read_u8(sym, off + 1)? as u32;
    Some(match f.cfg.endian {
        Endianness::Little => b0 | (b1 << 8),
        Endianness::Big => (b0 << 8) | b1,
    })
}

pub(super) fn load(f: &mut Function, n: NodeRef) -> bool {
    if fold_addr_offset(f, n) {
        return true;
    }
    let op = f.op(n);
    let ptr = f.arg(n, 0);
    // Unsigned loads through a read-only global become literals.
    if matches!(op, Op::I32Load | Op::I32Load16U | Op::I32Load8U)
        && f.op(ptr) == Op::LoweredAddr
        && let Some(sym) = f.node(ptr).sym()
        && f.syms.is_readonly(sym)
        && f.op(f.arg(ptr, 0)) == Op::SB
    {
        let off = f.node(n).aux_i32() as i64 + f.node(ptr).aux_i32() as i64;
        let endian = f.cfg.endian;
        let v = match op {
            Op::I32Load => f.syms.read_u32(sym, off, endian),
            Op::I32Load16U => read_u16(f, sym, off),
            _ => f.syms.read_u8(sym, off).map(u32::from),
        };
        if let Some(v) = v {
            f.reset(n, Op::I32Const);
            f.set_aux_int(n, aux_from_u32(v));
            return true;
        }
    }
    false
}

pub(super) fn store(f: &mut Function, n: NodeRef) -> bool {
    fold_addr_offset(f, n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridge_ir::{Aux, Pos, TargetConfig};

    fn binop(op: Op, a: Option<i32>, b: Option<i32>) -> (Function, NodeRef) {
        let mut f = Function::new("t", TargetConfig::sv32());
        let bl = f.add_block();
        let mk = |f: &mut Function, c: Option<i32>| match c {
            Some(c) => {
                let n = f.new_node(bl, Op::I32Const, f.cat.uint32, Pos::default());
                f.set_aux_int(n, aux_from_i32(c));
                n
            }
            None => f.new_node(bl, Op::Arg, f.cat.uint32, Pos::default()),
        };
        let x = mk(&mut f, a);
        let y = mk(&mut f, b);
        let n = f.new_node(bl, op, f.cat.uint32, Pos::default());
        f.add_args2(n, x, y);
        (f, n)
    }

    #[test]
    fn add_of_two_literals_folds() {
        let (mut f, n) = binop(Op::I32Add, Some(i32::MAX), Some(1));
        assert!(i32_add(&mut f, n));
        assert_eq!(f.op(n), Op::I32Const);
        assert_eq!(f.node(n).aux_i32(), i32::MIN);
    }

    #[test]
    fn add_with_one_literal_becomes_an_immediate() {
        let (mut f, n) = binop(Op::I32Add, None, Some(12));
        assert!(i32_add(&mut f, n));
        assert_eq!(f.op(n), Op::I32AddConst);
        assert_eq!(f.aux_int(n), 12);
        assert_eq!(f.args(n).len(), 1);
    }

    #[test]
    fn literal_moves_to_the_right() {
        let (mut f, n) = binop(Op::I32Mul, Some(3), None);
        assert!(i32_binop(&mut f, n, i32::wrapping_mul));
        assert_eq!(f.op(n), Op::I32Mul);
        assert_eq!(f.op(f.arg(n, 1)), Op::I32Const);
    }

    #[test]
    fn immediate_folds_into_a_lowered_address() {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let sym = f.syms.intern("g");
        let sb = f.new_node(b, Op::SB, f.cat.ptr, Pos::default());
        let addr = f.new_node(b, Op::LoweredAddr, f.cat.ptr, Pos::default());
        f.set_aux(addr, Aux::Sym(sym));
        f.set_aux_int(addr, 8);
        f.add_arg(addr, sb);
        let n = f.new_node(b, Op::I32AddConst, f.cat.ptr, Pos::default());
        f.set_aux_int(n, 16);
        f.add_arg(n, addr);

        assert!(i32_add_const(&mut f, n));
        assert_eq!(f.op(n), Op::LoweredAddr);
        assert_eq!(f.aux_int(n), 24);
        assert_eq!(f.node(n).sym(), Some(sym));
        assert_eq!(f.args(n), [sb]);
    }

    #[test]
    fn oversized_offset_stays_unfolded() {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let ptr = f.new_node(b, Op::Arg, f.cat.ptr, Pos::default());
        let inc = f.new_node(b, Op::I32AddConst, f.cat.ptr, Pos::default());
        f.set_aux_int(inc, i32::MAX as i64);
        f.add_arg(inc, ptr);
        let ld = f.new_node(b, Op::I32Load, f.cat.uint32, Pos::default());
        f.set_aux_int(ld, 1024);
        let mem = f.new_node(b, Op::Arg, f.cat.mem, Pos::default());
        f.add_args2(ld, inc, mem);

        assert!(!load(&mut f, ld));
        assert_eq!(f.arg(ld, 0), inc);
        assert_eq!(f.aux_int(ld), 1024);
    }

    #[test]
    fn readonly_table_load_becomes_a_literal() {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let sym = f.syms.define_readonly("tab", vec![0xAA, 0xBB, 0xCC, 0xDD]);
        let sb = f.new_node(b, Op::SB, f.cat.ptr, Pos::default());
        let addr = f.new_node(b, Op::LoweredAddr, f.cat.ptr, Pos::default());
        f.set_aux(addr, Aux::Sym(sym));
        f.add_arg(addr, sb);
        let mem = f.new_node(b, Op::Arg, f.cat.mem, Pos::default());
        let ld = f.new_node(b, Op::I32Load, f.cat.uint32, Pos::default());
        f.add_args2(ld, addr, mem);

        assert!(load(&mut f, ld));
        assert_eq!(f.op(ld), Op::I32Const);
        assert_eq!(f.node(ld).aux_u32(), 0xDDCC_BBAA);
    }

    fn f64_binop(op: Op, a: f64, b: f64) -> (Function, NodeRef) {
        let mut f = Function::new("t", TargetConfig::sv32());
        let bl = f.add_block();
        let mk = |f: &mut Function, v: f64| {
            let n = f.new_node(bl, Op::F64Const, f.cat.float64, Pos::default());
            f.set_aux_int(n, aux_from_f64(v));
            n
        };
        let x = mk(&mut f, a);
        let y = mk(&mut f, b);
        let n = f.new_node(bl, op, f.cat.float64, Pos::default());
        f.add_args2(n, x, y);
        (f, n)
    }

    #[test]
    fn float_add_folds_finite_literals() {
        let (mut f, n) = f64_binop(Op::F64Add, 1.5, 2.25);
        assert!(f64_add(&mut f, n));
        assert_eq!(f.op(n), Op::F64Const);
        assert_eq!(f.node(n).aux_f64(), 3.75);
    }

    #[test]
    fn float_add_keeps_nan_results_unfolded() {
        let (mut f, n) = f64_binop(Op::F64Add, f64::INFINITY, f64::NEG_INFINITY);
        assert!(!f64_add(&mut f, n));
        assert_eq!(f.op(n), Op::F64Add);
    }

    #[test]
    fn unsigned_compares_against_the_edge_become_eqz() {
        let (mut f, n) = binop(Op::I32LtU, None, Some(1));
        assert!(i32_lt_u(&mut f, n));
        assert_eq!(f.op(n), Op::I32Eqz);

        let (mut f, n) = binop(Op::I32LeU, Some(1), None);
        assert!(i32_le_u(&mut f, n));
        assert_eq!(f.op(n), Op::I32Eqz);
        assert_eq!(f.op(f.arg(n, 0)), Op::I32Eqz);
    }
}
