//! Memory and addressing lowering.
//!
//! Addresses become `LoweredAddr` with a folded byte offset. Loads and
//! stores dispatch on the value type; 64-bit accesses split into two
//! word accesses threaded through one memory token, ordered by the
//! target endianness.

use ridge_ir::{Endianness, Function, NodeRef, Op};

use super::{as_int64_make, halves, retag};

/// `Addr {sym} base` of a global is already in machine shape, offset 0.
pub(super) fn rewrite_addr(f: &mut Function, n: NodeRef) -> bool {
    retag(f, n, Op::LoweredAddr)
}

/// `LocalAddr {sym} base mem` drops the memory argument; stack slots do
/// not move during lowering.
pub(super) fn rewrite_local_addr(f: &mut Function, n: NodeRef) -> bool {
    let aux = f.node(n).aux;
    let base = f.arg(n, 0);
    f.reset(n, Op::LoweredAddr);
    f.set_aux(n, aux);
    f.add_arg(n, base);
    true
}

/// `OffPtr [off] ptr` is pointer addition with an immediate.
pub(super) fn rewrite_off_ptr(f: &mut Function, n: NodeRef) -> bool {
    let off = f.aux_int(n);
    let ptr = f.arg(n, 0);
    f.reset(n, Op::I32AddConst);
    f.set_aux_int(n, off as i32 as i64);
    f.add_arg(n, ptr);
    true
}

/// 64-bit incoming arguments split into two word-sized argument slots
/// when the target has no 64-bit registers. Everything else stays.
pub(super) fn rewrite_arg(f: &mut Function, n: NodeRef, native: bool) -> bool {
    let ty = f.ty(n);
    if native || !f.types.is_int64(ty) {
        return false;
    }
    let off = f.aux_int(n);
    let aux = f.node(n).aux;
    let (hi_off, lo_off) = match f.cfg.endian {
        Endianness::Little => (off + 4, off),
        Endianness::Big => (off, off + 4),
    };
    let hi_ty = if f.types.is_signed(ty) {
        f.cat.int32
    } else {
        f.cat.uint32
    };
    let uint32 = f.cat.uint32;
    let hi = f.helper(n, Op::Arg, hi_ty);
    f.set_aux_int(hi, hi_off);
    f.set_aux(hi, aux);
    let lo = f.helper(n, Op::Arg, uint32);
    f.set_aux_int(lo, lo_off);
    f.set_aux(lo, aux);
    f.reset(n, Op::Int64Make);
    f.add_args2(n, hi, lo);
    true
}

pub(super) fn rewrite_load(f: &mut Function, n: NodeRef, native: bool) -> bool {
    let ty = f.ty(n);
    if f.types.is_int64(ty) {
        if native {
            return retag(f, n, Op::I64Load);
        }
        let ptr = f.arg(n, 0);
        let mem = f.arg(n, 1);
        let hi_ty = if f.types.is_signed(ty) {
            f.cat.int32
        } else {
            f.cat.uint32
        };
        let uint32 = f.cat.uint32;
        let ptr4 = f.helper1(n, Op::OffPtr, f.cat.ptr, ptr);
        f.set_aux_int(ptr4, 4);
        let (hi_ptr, lo_ptr) = match f.cfg.endian {
            Endianness::Little => (ptr4, ptr),
            Endianness::Big => (ptr, ptr4),
        };
        let hi = f.helper2(n, Op::Load, hi_ty, hi_ptr, mem);
        let lo = f.helper2(n, Op::Load, uint32, lo_ptr, mem);
        f.reset(n, Op::Int64Make);
        f.add_args2(n, hi, lo);
        return true;
    }
    let machine = if f.types.is_float(ty) {
        match f.types.bit_size(ty) {
            32 => Op::F32Load,
            _ => Op::F64Load,
        }
    } else if f.types.is_ptr(ty) {
        Op::I32Load
    } else if ty == f.cat.bool_ {
        Op::I32Load8U
    } else {
        match (f.types.bit_size(ty), f.types.is_signed(ty)) {
            (8, true) => Op::I32Load8S,
            (8, false) => Op::I32Load8U,
            (16, true) => Op::I32Load16S,
            (16, false) => Op::I32Load16U,
            _ => Op::I32Load,
        }
    };
    retag(f, n, machine)
}

pub(super) fn rewrite_store(f: &mut Function, n: NodeRef, native: bool) -> bool {
    let dst = f.arg(n, 0);
    let val = f.arg(n, 1);
    let mem = f.arg(n, 2);
    let ty = f.ty(val);

    if f.types.is_int64(ty) {
        if native {
            return retag(f, n, Op::I64Store);
        }
        let (hi, lo) = match as_int64_make(f, val) {
            Some(pair) => pair,
            None => halves(f, n, val),
        };
        let dst4 = f.helper1(n, Op::OffPtr, f.cat.ptr, dst);
        f.set_aux_int(dst4, 4);
        // The outer store's value is a word, so the next sweep retags
        // both stores instead of splitting again.
        let mem_ty = f.cat.mem;
        let (first_val, outer_val) = match f.cfg.endian {
            Endianness::Little => (lo, hi),
            Endianness::Big => (hi, lo),
        };
        let inner = f.helper3(n, Op::Store, mem_ty, dst, first_val, mem);
        f.reset(n, Op::Store);
        f.add_args3(n, dst4, outer_val, inner);
        return true;
    }
    let machine = if f.types.is_float(ty) {
        match f.types.bit_size(ty) {
            32 => Op::F32Store,
            _ => Op::F64Store,
        }
    } else if f.types.is_ptr(ty) {
        Op::I32Store
    } else if ty == f.cat.bool_ {
        Op::I32Store8
    } else {
        match f.types.bit_size(ty) {
            8 => Op::I32Store8,
            16 => Op::I32Store16,
            _ => Op::I32Store,
        }
    };
    retag(f, n, machine)
}
