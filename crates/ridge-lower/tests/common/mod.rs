//! Reference evaluator for value graphs.
//!
//! Computes the meaning of a function's nodes over a concrete argument
//! environment, for both the machine-independent input graph and the
//! SV32 output graph, so tests can check that lowering preserved the
//! result. Argument slots are keyed by their byte offset; a 64-bit
//! argument that lowering split into two word slots reads the same
//! environment entry at `off` and `off + 4`.

use std::collections::HashMap;

use ridge_ir::{Function, NodeRef, Op};

const M32: u64 = 0xFFFF_FFFF;

pub struct Eval<'a> {
    f: &'a Function,
    env: &'a HashMap<i64, u64>,
    memo: HashMap<NodeRef, u64>,
}

/// Environment for a set of 64-bit arguments at 8-byte strides,
/// with the word slots the decomposed form reads pre-populated.
pub fn env64(args: &[u64]) -> HashMap<i64, u64> {
    let mut env = HashMap::new();
    for (i, &v) in args.iter().enumerate() {
        let off = (i * 8) as i64;
        env.insert(off, v);
        env.insert(off + 4, v >> 32);
    }
    env
}

impl<'a> Eval<'a> {
    pub fn new(f: &'a Function, env: &'a HashMap<i64, u64>) -> Self {
        Self {
            f,
            env,
            memo: HashMap::new(),
        }
    }

    pub fn value(&mut self, n: NodeRef) -> u64 {
        if let Some(&v) = self.memo.get(&n) {
            return v;
        }
        let v = self.compute(n);
        self.memo.insert(n, v);
        v
    }

    fn compute(&mut self, n: NodeRef) -> u64 {
        use Op::*;
        let f = self.f;
        match f.op(n) {
            Arg => {
                let off = f.aux_int(n);
                let raw = *self
                    .env
                    .get(&off)
                    .unwrap_or_else(|| panic!("no argument at offset {off}"));
                match f.types.bit_size(f.ty(n)) {
                    64 => raw,
                    bits => raw & ((1u64 << bits) - 1),
                }
            }
            Copy => self.value(f.arg(n, 0)),

            Const8 | Const16 | Const32 | ConstBool | I32Const => f.node(n).aux_u32() as u64,
            Const64 | I64Const => f.node(n).aux_u64(),

            Int64Make => {
                let hi = self.value(f.arg(n, 0)) & M32;
                let lo = self.value(f.arg(n, 1)) & M32;
                (hi << 32) | lo
            }
            Int64Hi => self.value(f.arg(n, 0)) >> 32,
            Int64Lo => self.value(f.arg(n, 0)) & M32,
            Select0 => self.pair(f.arg(n, 0)) >> 32,
            Select1 => self.pair(f.arg(n, 0)) & M32,

            // === Machine word ops ===
            I32Add => self.bin32(n, |a, b| a.wrapping_add(b)),
            I32Sub => self.bin32(n, |a, b| a.wrapping_sub(b)),
            I32Mul => self.bin32(n, |a, b| a.wrapping_mul(b)),
            I32DivS => self.bin32(n, |a, b| (a as i32).wrapping_div(b as i32) as u32),
            I32DivU => self.bin32(n, |a, b| a / b),
            I32RemS => self.bin32(n, |a, b| (a as i32).wrapping_rem(b as i32) as u32),
            I32RemU => self.bin32(n, |a, b| a % b),
            I32And => self.bin32(n, |a, b| a & b),
            I32Or => self.bin32(n, |a, b| a | b),
            I32Xor => self.bin32(n, |a, b| a ^ b),
            // Machine shifts take the count modulo the width.
            I32Shl => self.bin32(n, |a, b| a.wrapping_shl(b)),
            I32ShrU => self.bin32(n, |a, b| a.wrapping_shr(b)),
            I32ShrS => self.bin32(n, |a, b| (a as i32).wrapping_shr(b) as u32),
            I32Rotl => self.bin32(n, |a, b| a.rotate_left(b & 31)),
            I32AddConst => {
                let x = self.value(f.arg(n, 0)) as u32;
                x.wrapping_add(f.node(n).aux_i32() as u32) as u64
            }
            I32Eqz => (self.value(f.arg(n, 0)) & M32 == 0) as u64,
            I32Eq => self.cmp32(n, |a, b| a == b),
            I32Ne => self.cmp32(n, |a, b| a != b),
            I32LtU => self.cmp32(n, |a, b| a < b),
            I32LeU => self.cmp32(n, |a, b| a <= b),
            I32GtU => self.cmp32(n, |a, b| a > b),
            I32GeU => self.cmp32(n, |a, b| a >= b),
            I32LtS => self.cmp32(n, |a, b| (a as i32) < b as i32),
            I32LeS => self.cmp32(n, |a, b| a as i32 <= b as i32),
            I32GtS => self.cmp32(n, |a, b| a as i32 > b as i32),
            I32GeS => self.cmp32(n, |a, b| a as i32 >= b as i32),
            I32Clz => (self.value(f.arg(n, 0)) as u32).leading_zeros() as u64,
            I32Ctz => (self.value(f.arg(n, 0)) as u32).trailing_zeros() as u64,
            I32Popcnt => (self.value(f.arg(n, 0)) as u32).count_ones() as u64,
            I32Extend8S => (self.value(f.arg(n, 0)) as u8 as i8 as i32 as u32) as u64,
            I32Extend16S => (self.value(f.arg(n, 0)) as u16 as i16 as i32 as u32) as u64,
            I32WrapI64 => self.value(f.arg(n, 0)) & M32,
            Select => {
                let a = self.value(f.arg(n, 0));
                let b = self.value(f.arg(n, 1));
                let cond = self.value(f.arg(n, 2));
                if cond != 0 { a } else { b }
            }

            // === Machine 64-bit ops (native strategy) ===
            I64Add => self.bin64(n, |a, b| a.wrapping_add(b)),
            I64Sub => self.bin64(n, |a, b| a.wrapping_sub(b)),
            I64Mul => self.bin64(n, |a, b| a.wrapping_mul(b)),
            I64And => self.bin64(n, |a, b| a & b),
            I64Or => self.bin64(n, |a, b| a | b),
            I64Xor => self.bin64(n, |a, b| a ^ b),
            I64Shl => self.bin64(n, |a, b| a.wrapping_shl(b as u32)),
            I64ShrU => self.bin64(n, |a, b| a.wrapping_shr(b as u32)),
            I64ShrS => self.bin64(n, |a, b| ((a as i64).wrapping_shr(b as u32)) as u64),
            I64LtU => {
                let a = self.value(f.arg(n, 0));
                let b = self.value(f.arg(n, 1));
                (a < b) as u64
            }

            // === Generic opcodes: the reference semantics ===
            Add64 => self.bin64(n, |a, b| a.wrapping_add(b)),
            Sub64 => self.bin64(n, |a, b| a.wrapping_sub(b)),
            Mul64 => self.bin64(n, |a, b| a.wrapping_mul(b)),
            And64 => self.bin64(n, |a, b| a & b),
            Or64 => self.bin64(n, |a, b| a | b),
            Xor64 => self.bin64(n, |a, b| a ^ b),
            Add32 => self.bin32(n, |a, b| a.wrapping_add(b)),
            Or32 => self.bin32(n, |a, b| a | b),
            // Language-level shifts: an oversized count saturates instead
            // of wrapping.
            Lsh64x64 | Lsh64x32 | Lsh64x16 | Lsh64x8 => {
                self.bin64(n, |a, b| if b >= 64 { 0 } else { a << b })
            }
            Rsh64Ux64 | Rsh64Ux32 | Rsh64Ux16 | Rsh64Ux8 => {
                self.bin64(n, |a, b| if b >= 64 { 0 } else { a >> b })
            }
            Rsh64Sx64 | Rsh64Sx32 | Rsh64Sx16 | Rsh64Sx8 => {
                self.bin64(n, |a, b| ((a as i64) >> b.min(63)) as u64)
            }
            Lsh32x32 => self.bin32(n, |a, b| if b >= 32 { 0 } else { a << b }),
            Rsh32Ux32 => self.bin32(n, |a, b| if b >= 32 { 0 } else { a >> b }),
            Rsh32Sx32 => self.bin32(n, |a, b| ((a as i32) >> (b.min(31))) as u32),
            Eq64 => self.cmp64(n, |a, b| a == b),
            Neq64 => self.cmp64(n, |a, b| a != b),
            Less64U => self.cmp64(n, |a, b| a < b),
            Leq64U => self.cmp64(n, |a, b| a <= b),
            Less64S => self.cmp64(n, |a, b| (a as i64) < b as i64),
            Leq64S => self.cmp64(n, |a, b| a as i64 <= b as i64),
            Ctz64 => (self.value(f.arg(n, 0)).trailing_zeros() as u64).min(64),
            BitLen64 => 64 - self.value(f.arg(n, 0)).leading_zeros() as u64,
            BitLen32 => 32 - (self.value(f.arg(n, 0)) as u32).leading_zeros() as u64,
            Bswap64 => self.value(f.arg(n, 0)).swap_bytes(),
            Bswap32 => (self.value(f.arg(n, 0)) as u32).swap_bytes() as u64,
            Com64 => !self.value(f.arg(n, 0)),
            Neg64 => self.value(f.arg(n, 0)).wrapping_neg(),
            Zeromask => {
                let x = self.value(f.arg(n, 0)) & M32;
                if x != 0 { M32 } else { 0 }
            }
            Signmask => (((self.value(f.arg(n, 0)) as u32 as i32) >> 31) as u32) as u64,
            Trunc64to32 => self.value(f.arg(n, 0)) & M32,
            SignExt32to64 => self.value(f.arg(n, 0)) as u32 as i32 as i64 as u64,
            ZeroExt32to64 => self.value(f.arg(n, 0)) & M32,
            ZeroExt8to32 | ZeroExt8to64 => self.value(f.arg(n, 0)) & 0xFF,
            ZeroExt16to32 | ZeroExt16to64 => self.value(f.arg(n, 0)) & 0xFFFF,

            op => panic!("evaluator has no semantics for {op}"),
        }
    }

    /// The full 64-bit result of a two-word pseudo op.
    fn pair(&mut self, tuple: NodeRef) -> u64 {
        let f = self.f;
        let xhi = self.value(f.arg(tuple, 0)) & M32;
        let xlo = self.value(f.arg(tuple, 1)) & M32;
        let yhi = self.value(f.arg(tuple, 2)) & M32;
        let ylo = self.value(f.arg(tuple, 3)) & M32;
        let x = (xhi << 32) | xlo;
        let y = (yhi << 32) | ylo;
        match f.op(tuple) {
            Op::LoweredAdd64 => x.wrapping_add(y),
            Op::LoweredSub64 => x.wrapping_sub(y),
            Op::LoweredMul64 => x.wrapping_mul(y),
            Op::LoweredDiv64S => ((x as i64).wrapping_div(y as i64)) as u64,
            Op::LoweredDiv64U => x / y,
            Op::LoweredMod64S => ((x as i64).wrapping_rem(y as i64)) as u64,
            Op::LoweredMod64U => x % y,
            op => panic!("not a two-word pseudo op: {op}"),
        }
    }

    fn bin32(&mut self, n: NodeRef, op: impl Fn(u32, u32) -> u32) -> u64 {
        let a = self.value(self.f.arg(n, 0)) as u32;
        let b = self.value(self.f.arg(n, 1)) as u32;
        op(a, b) as u64
    }

    fn cmp32(&mut self, n: NodeRef, op: impl Fn(u32, u32) -> bool) -> u64 {
        let a = self.value(self.f.arg(n, 0)) as u32;
        let b = self.value(self.f.arg(n, 1)) as u32;
        op(a, b) as u64
    }

    fn bin64(&mut self, n: NodeRef, op: impl Fn(u64, u64) -> u64) -> u64 {
        let a = self.value(self.f.arg(n, 0));
        let b = self.value(self.f.arg(n, 1));
        op(a, b)
    }

    fn cmp64(&mut self, n: NodeRef, op: impl Fn(u64, u64) -> bool) -> u64 {
        let a = self.value(self.f.arg(n, 0));
        let b = self.value(self.f.arg(n, 1));
        op(a, b) as u64
    }
}
