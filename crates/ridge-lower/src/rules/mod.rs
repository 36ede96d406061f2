//! Rewrite rules: machine-independent opcodes to SV32.
//!
//! One dispatch over the opcode enum. Each interesting opcode gets a
//! rewrite function trying ordered guarded alternatives; the first
//! alternative whose structure and side-conditions match fires and
//! mutates the node in place, with no backtracking. Copy chains in the
//! argument list are forwarded first so structural matches see the real
//! producers. A node with no matching alternative is left unchanged.

mod arith;
mod bits;
mod cmp;
mod const_;
mod convert;
mod fold;
mod mem;
mod native64;
mod shift;
mod wide;

use ridge_ir::{Function, Int64Strategy, NodeRef, Op};

pub(crate) use shift::ShiftKind;

/// Apply at most one rewrite to `n`. Returns whether the node changed.
pub fn rewrite_node(f: &mut Function, n: NodeRef) -> bool {
    let forwarded = forward_copies(f, n);
    let rewritten = dispatch(f, n);
    forwarded | rewritten
}

fn dispatch(f: &mut Function, n: NodeRef) -> bool {
    use Op::*;
    let native = matches!(f.cfg.int64, Int64Strategy::Native64);
    match f.op(n) {
        // === Straight retags: same arguments, same payload ===
        Abs => retag(f, n, F64Abs),
        Add8 | Add16 | Add32 | AddPtr => retag(f, n, I32Add),
        Add32F => retag(f, n, F32Add),
        Add64F => retag(f, n, F64Add),
        And8 | And16 | And32 | AndB => retag(f, n, I32And),
        Or8 | Or16 | Or32 | OrB => retag(f, n, I32Or),
        Xor8 | Xor16 | Xor32 => retag(f, n, I32Xor),
        Ceil => retag(f, n, F64Ceil),
        Floor => retag(f, n, F64Floor),
        Trunc => retag(f, n, F64Trunc),
        Round => retag(f, n, F64Nearest),
        Sqrt => retag(f, n, F64Sqrt),
        Copysign => retag(f, n, F64Copysign),
        CondSelect => retag(f, n, Select),
        Const32F => retag(f, n, F32Const),
        Const64F => retag(f, n, F64Const),
        Ctz32 | Ctz8NonZero | Ctz16NonZero | Ctz32NonZero => retag(f, n, I32Ctz),
        Ctz64NonZero => retag(f, n, Ctz64),
        Cvt32to32F => retag(f, n, F32ConvertI32S),
        Cvt32Uto32F => retag(f, n, F32ConvertI32U),
        Cvt32to64F => retag(f, n, F64ConvertI32S),
        Cvt32Uto64F => retag(f, n, F64ConvertI32U),
        Cvt32Fto32 => retag(f, n, I32TruncSatF32S),
        Cvt64Fto32 => retag(f, n, I32TruncSatF64S),
        Cvt32Fto64F => retag(f, n, F64PromoteF32),
        Cvt64Fto32F => retag(f, n, F32DemoteF64),
        CvtBoolToUint8 => retag(f, n, Copy),
        Div32F => retag(f, n, F32Div),
        Div64F => retag(f, n, F64Div),
        Mul8 | Mul16 | Mul32 => retag(f, n, I32Mul),
        Mul32F => retag(f, n, F32Mul),
        Mul64F => retag(f, n, F64Mul),
        Sub8 | Sub16 | Sub32 | SubPtr => retag(f, n, I32Sub),
        Sub32F => retag(f, n, F32Sub),
        Sub64F => retag(f, n, F64Sub),
        Neg32F => retag(f, n, F32Neg),
        Neg64F => retag(f, n, F64Neg),
        Eq32 | EqB | EqPtr => retag(f, n, I32Eq),
        Eq32F => retag(f, n, F32Eq),
        Eq64F => retag(f, n, F64Eq),
        Neq32 | NeqB | NeqPtr => retag(f, n, I32Ne),
        Neq32F => retag(f, n, F32Ne),
        Neq64F => retag(f, n, F64Ne),
        Less32S => retag(f, n, I32LtS),
        Less32U => retag(f, n, I32LtU),
        Leq32S => retag(f, n, I32LeS),
        Leq32U => retag(f, n, I32LeU),
        Less32F => retag(f, n, F32Lt),
        Less64F => retag(f, n, F64Lt),
        Leq32F => retag(f, n, F32Le),
        Leq64F => retag(f, n, F64Le),
        IsInBounds => retag(f, n, I32LtU),
        IsSliceInBounds => retag(f, n, I32LeU),
        NilCheck => retag(f, n, LoweredNilCheck),
        Not => retag(f, n, I32Eqz),
        Trunc16to8 | Trunc32to8 | Trunc32to16 => retag(f, n, Copy),
        PopCount32 => retag(f, n, I32Popcnt),
        Div32S => retag(f, n, I32DivS),
        Div32U => retag(f, n, I32DivU),
        Mod32S => retag(f, n, I32RemS),
        Mod32U => retag(f, n, I32RemU),
        // Count funnels: the retag keeps the bounded-shift flag.
        Lsh8x32 | Lsh16x32 => retag(f, n, Lsh32x32),

        // === Constants ===
        Const8 | Const16 | Const32 | ConstBool | ConstNil => const_::rewrite_const32(f, n),
        Const64 if native => retag(f, n, I64Const),
        Const64 => const_::rewrite_const64(f, n),

        // === Narrow integer arithmetic ===
        Neg8 | Neg16 | Neg32 => arith::rewrite_neg32(f, n),
        Com8 | Com16 | Com32 => arith::rewrite_com32(f, n),
        Div8S => arith::narrow_divmod(f, n, I32DivS, SignExt8to32),
        Div8U => arith::narrow_divmod(f, n, I32DivU, ZeroExt8to32),
        Div16S => arith::narrow_divmod(f, n, I32DivS, SignExt16to32),
        Div16U => arith::narrow_divmod(f, n, I32DivU, ZeroExt16to32),
        Mod8S => arith::narrow_divmod(f, n, I32RemS, SignExt8to32),
        Mod8U => arith::narrow_divmod(f, n, I32RemU, ZeroExt8to32),
        Mod16S => arith::narrow_divmod(f, n, I32RemS, SignExt16to32),
        Mod16U => arith::narrow_divmod(f, n, I32RemU, ZeroExt16to32),

        // === 64-bit integer arithmetic ===
        Add64 | Sub64 | Mul64 | Div64S | Div64U | Mod64S | Mod64U => {
            wide::rewrite_arith64(f, n, native)
        }
        And64 | Or64 | Xor64 => wide::rewrite_logic64(f, n, native),
        Neg64 if native => native64::rewrite_neg64(f, n),
        Neg64 => wide::rewrite_neg64(f, n),
        Com64 if native => native64::rewrite_com64(f, n),
        Com64 => wide::rewrite_com64(f, n),
        Int64Hi => wide::rewrite_int64_hi(f, n),
        Int64Lo => wide::rewrite_int64_lo(f, n),
        Zeromask => wide::rewrite_zeromask(f, n),
        Signmask => wide::rewrite_signmask(f, n),
        Slicemask => wide::rewrite_slicemask(f, n),

        // === Comparisons ===
        Eq8 => cmp::narrow_cmp(f, n, I32Eq, ZeroExt8to32),
        Eq16 => cmp::narrow_cmp(f, n, I32Eq, ZeroExt16to32),
        Neq8 => cmp::narrow_cmp(f, n, I32Ne, ZeroExt8to32),
        Neq16 => cmp::narrow_cmp(f, n, I32Ne, ZeroExt16to32),
        Less8S => cmp::narrow_cmp(f, n, I32LtS, SignExt8to32),
        Less8U => cmp::narrow_cmp(f, n, I32LtU, ZeroExt8to32),
        Less16S => cmp::narrow_cmp(f, n, I32LtS, SignExt16to32),
        Less16U => cmp::narrow_cmp(f, n, I32LtU, ZeroExt16to32),
        Leq8S => cmp::narrow_cmp(f, n, I32LeS, SignExt8to32),
        Leq8U => cmp::narrow_cmp(f, n, I32LeU, ZeroExt8to32),
        Leq16S => cmp::narrow_cmp(f, n, I32LeS, SignExt16to32),
        Leq16U => cmp::narrow_cmp(f, n, I32LeU, ZeroExt16to32),
        Eq64 | Neq64 | Less64S | Less64U | Leq64S | Leq64U if native => {
            native64::rewrite_cmp64(f, n)
        }
        Eq64 | Neq64 | Less64S | Less64U | Leq64S | Leq64U => cmp::rewrite_cmp64(f, n),
        IsNonNil => cmp::rewrite_is_non_nil(f, n),

        // === Conversions ===
        SignExt8to16 | SignExt8to32 => convert::sign_ext_narrow(f, n, I32Load8S, I32Extend8S, 24),
        SignExt16to32 => convert::sign_ext_narrow(f, n, I32Load16S, I32Extend16S, 16),
        SignExt8to64 => convert::ext_to64(f, n, SignExt8to32, SignExt32to64),
        SignExt16to64 => convert::ext_to64(f, n, SignExt16to32, SignExt32to64),
        SignExt32to64 => convert::sign_ext32to64(f, n, native),
        ZeroExt8to16 | ZeroExt8to32 => convert::zero_ext_narrow(f, n, I32Load8U, 0xff),
        ZeroExt16to32 => convert::zero_ext_narrow(f, n, I32Load16U, 0xffff),
        ZeroExt8to64 => convert::ext_to64(f, n, ZeroExt8to32, ZeroExt32to64),
        ZeroExt16to64 => convert::ext_to64(f, n, ZeroExt16to32, ZeroExt32to64),
        ZeroExt32to64 => convert::zero_ext32to64(f, n, native),
        Trunc64to8 => convert::trunc64_narrow(f, n, Trunc32to8, native),
        Trunc64to16 => convert::trunc64_narrow(f, n, Trunc32to16, native),
        Trunc64to32 => convert::trunc64to32(f, n, native),

        // === Bit counting and byte swaps ===
        Ctz8 => bits::rewrite_ctz_narrow(f, n, 0x100),
        Ctz16 => bits::rewrite_ctz_narrow(f, n, 0x1_0000),
        Ctz64 => bits::rewrite_ctz64(f, n),
        BitLen8 => bits::rewrite_bitlen_narrow(f, n, ZeroExt8to32),
        BitLen16 => bits::rewrite_bitlen_narrow(f, n, ZeroExt16to32),
        BitLen32 => bits::rewrite_bitlen32(f, n),
        BitLen64 => bits::rewrite_bitlen64(f, n),
        PopCount8 => bits::rewrite_popcount_narrow(f, n, ZeroExt8to32),
        PopCount16 => bits::rewrite_popcount_narrow(f, n, ZeroExt16to32),
        Bswap16 => bits::rewrite_bswap16(f, n),
        Bswap32 => bits::rewrite_bswap32(f, n),
        Bswap64 => bits::rewrite_bswap64(f, n),

        // === Memory and addressing ===
        Addr => mem::rewrite_addr(f, n),
        LocalAddr => mem::rewrite_local_addr(f, n),
        OffPtr => mem::rewrite_off_ptr(f, n),
        Arg => mem::rewrite_arg(f, n, native),
        Load => mem::rewrite_load(f, n, native),
        Store => mem::rewrite_store(f, n, native),

        // === Shifts: count funnels into the 32-bit-count forms ===
        Lsh8x8 | Lsh16x8 | Lsh32x8 => shift::funnel(f, n, Lsh32x32, None, Some(ZeroExt8to32)),
        Lsh8x16 | Lsh16x16 | Lsh32x16 => shift::funnel(f, n, Lsh32x32, None, Some(ZeroExt16to32)),
        Rsh8Ux8 => shift::funnel(f, n, Rsh32Ux32, Some(ZeroExt8to32), Some(ZeroExt8to32)),
        Rsh8Ux16 => shift::funnel(f, n, Rsh32Ux32, Some(ZeroExt8to32), Some(ZeroExt16to32)),
        Rsh8Ux32 => shift::funnel(f, n, Rsh32Ux32, Some(ZeroExt8to32), None),
        Rsh16Ux8 => shift::funnel(f, n, Rsh32Ux32, Some(ZeroExt16to32), Some(ZeroExt8to32)),
        Rsh16Ux16 => shift::funnel(f, n, Rsh32Ux32, Some(ZeroExt16to32), Some(ZeroExt16to32)),
        Rsh16Ux32 => shift::funnel(f, n, Rsh32Ux32, Some(ZeroExt16to32), None),
        Rsh8Sx8 => shift::funnel(f, n, Rsh32Sx32, Some(SignExt8to32), Some(ZeroExt8to32)),
        Rsh8Sx16 => shift::funnel(f, n, Rsh32Sx32, Some(SignExt8to32), Some(ZeroExt16to32)),
        Rsh8Sx32 => shift::funnel(f, n, Rsh32Sx32, Some(SignExt8to32), None),
        Rsh16Sx8 => shift::funnel(f, n, Rsh32Sx32, Some(SignExt16to32), Some(ZeroExt8to32)),
        Rsh16Sx16 => shift::funnel(f, n, Rsh32Sx32, Some(SignExt16to32), Some(ZeroExt16to32)),
        Rsh16Sx32 => shift::funnel(f, n, Rsh32Sx32, Some(SignExt16to32), None),
        Rsh32Ux8 => shift::funnel(f, n, Rsh32Ux32, None, Some(ZeroExt8to32)),
        Rsh32Ux16 => shift::funnel(f, n, Rsh32Ux32, None, Some(ZeroExt16to32)),
        Rsh32Sx8 => shift::funnel(f, n, Rsh32Sx32, None, Some(ZeroExt8to32)),
        Rsh32Sx16 => shift::funnel(f, n, Rsh32Sx32, None, Some(ZeroExt16to32)),

        // === Shifts: 64-bit counts on 8/16/32-bit results ===
        Lsh8x64 if native => native64::small_x64(f, n, ShiftKind::Shl, 8, None),
        Lsh8x64 => shift::small_x64(f, n, ShiftKind::Shl, 8, Lsh8x32, None),
        Lsh16x64 if native => native64::small_x64(f, n, ShiftKind::Shl, 16, None),
        Lsh16x64 => shift::small_x64(f, n, ShiftKind::Shl, 16, Lsh16x32, None),
        Lsh32x64 if native => native64::small_x64(f, n, ShiftKind::Shl, 32, None),
        Lsh32x64 => shift::small_x64(f, n, ShiftKind::Shl, 32, Lsh32x32, None),
        Rsh8Ux64 if native => native64::small_x64(f, n, ShiftKind::ShrU, 8, Some(ZeroExt8to32)),
        Rsh8Ux64 => shift::small_x64(f, n, ShiftKind::ShrU, 8, Rsh8Ux32, None),
        Rsh16Ux64 if native => native64::small_x64(f, n, ShiftKind::ShrU, 16, Some(ZeroExt16to32)),
        Rsh16Ux64 => shift::small_x64(f, n, ShiftKind::ShrU, 16, Rsh16Ux32, None),
        Rsh32Ux64 if native => native64::small_x64(f, n, ShiftKind::ShrU, 32, None),
        Rsh32Ux64 => shift::small_x64(f, n, ShiftKind::ShrU, 32, Rsh32Ux32, None),
        Rsh8Sx64 if native => native64::small_x64(f, n, ShiftKind::ShrS, 8, Some(SignExt8to32)),
        Rsh8Sx64 => shift::small_x64(f, n, ShiftKind::ShrS, 8, Rsh8Sx32, Some(SignExt8to32)),
        Rsh16Sx64 if native => native64::small_x64(f, n, ShiftKind::ShrS, 16, Some(SignExt16to32)),
        Rsh16Sx64 => shift::small_x64(f, n, ShiftKind::ShrS, 16, Rsh16Sx32, Some(SignExt16to32)),
        Rsh32Sx64 if native => native64::small_x64(f, n, ShiftKind::ShrS, 32, None),
        Rsh32Sx64 => shift::small_x64(f, n, ShiftKind::ShrS, 32, Rsh32Sx32, None),

        // === Shifts: 32-bit-count base forms with defensive fallback ===
        Lsh32x32 => shift::base32(f, n, ShiftKind::Shl),
        Rsh32Ux32 => shift::base32(f, n, ShiftKind::ShrU),
        Rsh32Sx32 => shift::base32(f, n, ShiftKind::ShrS),

        // === Shifts: 64-bit results ===
        Lsh64x64 if native => native64::shift64(f, n, ShiftKind::Shl),
        Lsh64x64 => shift::wide_x64(f, n, ShiftKind::Shl),
        Rsh64Ux64 if native => native64::shift64(f, n, ShiftKind::ShrU),
        Rsh64Ux64 => shift::wide_x64(f, n, ShiftKind::ShrU),
        Rsh64Sx64 if native => native64::shift64(f, n, ShiftKind::ShrS),
        Rsh64Sx64 => shift::wide_x64(f, n, ShiftKind::ShrS),
        Lsh64x32 if native => native64::extend_count(f, n, Lsh64x64, ZeroExt32to64),
        Lsh64x32 => shift::wide_tree(f, n, ShiftKind::Shl, 32),
        Lsh64x16 if native => native64::extend_count(f, n, Lsh64x64, ZeroExt16to64),
        Lsh64x16 => shift::wide_tree(f, n, ShiftKind::Shl, 16),
        Lsh64x8 if native => native64::extend_count(f, n, Lsh64x64, ZeroExt8to64),
        Lsh64x8 => shift::wide_tree(f, n, ShiftKind::Shl, 8),
        Rsh64Ux32 if native => native64::extend_count(f, n, Rsh64Ux64, ZeroExt32to64),
        Rsh64Ux32 => shift::wide_tree(f, n, ShiftKind::ShrU, 32),
        Rsh64Ux16 if native => native64::extend_count(f, n, Rsh64Ux64, ZeroExt16to64),
        Rsh64Ux16 => shift::wide_tree(f, n, ShiftKind::ShrU, 16),
        Rsh64Ux8 if native => native64::extend_count(f, n, Rsh64Ux64, ZeroExt8to64),
        Rsh64Ux8 => shift::wide_tree(f, n, ShiftKind::ShrU, 8),
        Rsh64Sx32 if native => native64::extend_count(f, n, Rsh64Sx64, ZeroExt32to64),
        Rsh64Sx32 => shift::wide_tree(f, n, ShiftKind::ShrS, 32),
        Rsh64Sx16 if native => native64::extend_count(f, n, Rsh64Sx64, ZeroExt16to64),
        Rsh64Sx16 => shift::wide_tree(f, n, ShiftKind::ShrS, 16),
        Rsh64Sx8 if native => native64::extend_count(f, n, Rsh64Sx64, ZeroExt8to64),
        Rsh64Sx8 => shift::wide_tree(f, n, ShiftKind::ShrS, 8),

        // === Rotates ===
        RotateLeft8 => shift::rotate_narrow(f, n, 7, Or8, Lsh8x32, Rsh8Ux32),
        RotateLeft16 => shift::rotate_narrow(f, n, 15, Or16, Lsh16x32, Rsh16Ux32),
        RotateLeft32 => shift::rotate32(f, n),

        // === Machine-level canonicalization and folding ===
        I32Add => fold::i32_add(f, n),
        I32AddConst => fold::i32_add_const(f, n),
        I32Mul => fold::i32_binop(f, n, i32::wrapping_mul),
        I32And => fold::i32_binop(f, n, |a, b| a & b),
        I32Or => fold::i32_binop(f, n, |a, b| a | b),
        I32Xor => fold::i32_binop(f, n, |a, b| a ^ b),
        I32Shl | I32ShrS | I32ShrU => fold::i32_shift(f, n),
        I32Eq => fold::i32_eq(f, n),
        I32Ne => fold::i32_ne(f, n),
        I32Eqz => fold::i32_eqz(f, n),
        I32LeU => fold::i32_le_u(f, n),
        I32LtU => fold::i32_lt_u(f, n),
        F32Add | F32Mul => fold::f32_commute(f, n),
        F64Add => fold::f64_add(f, n),
        F64Mul => fold::f64_mul(f, n),
        op if op.is_machine_load() => fold::load(f, n),
        op if op.is_machine_store() => fold::store(f, n),

        _ => false,
    }
}

// === Shared matching helpers ===

/// Swap the opcode, keeping arguments and payloads. The machine
/// equivalents of many generic opcodes have the same operand shape.
pub(crate) fn retag(f: &mut Function, n: NodeRef, op: Op) -> bool {
    f.node_mut(n).op = op;
    true
}

/// Forward every argument through Copy chains.
pub(crate) fn forward_copies(f: &mut Function, n: NodeRef) -> bool {
    let mut changed = false;
    for i in 0..f.args(n).len() {
        let orig = f.arg(n, i);
        let mut a = orig;
        while f.op(a) == Op::Copy {
            a = f.arg(a, 0);
        }
        if a != orig {
            f.set_arg(n, i, a);
            changed = true;
        }
    }
    changed
}

/// Machine 32-bit constant payload of `n`, if it is one.
pub(crate) fn as_i32const(f: &Function, n: NodeRef) -> Option<i32> {
    (f.op(n) == Op::I32Const).then(|| f.node(n).aux_i32())
}

/// 32-bit constant payload, generic or already-lowered.
pub(crate) fn as_const32(f: &Function, n: NodeRef) -> Option<i32> {
    matches!(f.op(n), Op::Const32 | Op::I32Const).then(|| f.node(n).aux_i32())
}

/// 64-bit constant payload: a literal node, or an `Int64Make` whose
/// halves already lowered to word literals.
pub(crate) fn as_const64(f: &Function, n: NodeRef) -> Option<i64> {
    match f.op(n) {
        Op::Const64 | Op::I64Const => Some(f.node(n).aux_i64()),
        Op::Int64Make => {
            let hi = as_const32(f, f.arg(n, 0))? as u32 as u64;
            let lo = as_const32(f, f.arg(n, 1))? as u32 as u64;
            Some(((hi << 32) | lo) as i64)
        }
        _ => None,
    }
}

/// The (hi, lo) arguments of an `Int64Make`, if `n` is one.
pub(crate) fn as_int64_make(f: &Function, n: NodeRef) -> Option<(NodeRef, NodeRef)> {
    (f.op(n) == Op::Int64Make).then(|| (f.arg(n, 0), f.arg(n, 1)))
}

/// Fresh `Int64Hi`/`Int64Lo` projections of a 64-bit value.
pub(crate) fn halves(f: &mut Function, at: NodeRef, x: NodeRef) -> (NodeRef, NodeRef) {
    let uint32 = f.cat.uint32;
    let hi = f.helper1(at, Op::Int64Hi, uint32, x);
    let lo = f.helper1(at, Op::Int64Lo, uint32, x);
    (hi, lo)
}
