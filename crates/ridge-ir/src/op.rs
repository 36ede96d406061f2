//! The closed opcode set.
//!
//! One flat enum covering both the machine-independent (generic) opcodes
//! that arrive from the middle end and the SV32 machine opcodes the
//! lowering rules produce. The partition queries (`is_machine`,
//! `is_machine_legal`) drive the post-lowering verifier; `is_commutative`
//! drives canonicalization.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    // === Generic: constants ===
    Const8,
    Const16,
    Const32,
    Const64,
    ConstBool,
    ConstNil,
    Const32F,
    Const64F,

    // === Generic: integer arithmetic ===
    Add8,
    Add16,
    Add32,
    Add64,
    Sub8,
    Sub16,
    Sub32,
    Sub64,
    Mul8,
    Mul16,
    Mul32,
    Mul64,
    Div8S,
    Div8U,
    Div16S,
    Div16U,
    Div32S,
    Div32U,
    Div64S,
    Div64U,
    Mod8S,
    Mod8U,
    Mod16S,
    Mod16U,
    Mod32S,
    Mod32U,
    Mod64S,
    Mod64U,
    Neg8,
    Neg16,
    Neg32,
    Neg64,
    Com8,
    Com16,
    Com32,
    Com64,

    // === Generic: float arithmetic ===
    Add32F,
    Add64F,
    Sub32F,
    Sub64F,
    Mul32F,
    Mul64F,
    Div32F,
    Div64F,
    Neg32F,
    Neg64F,
    Abs,
    Sqrt,
    Floor,
    Ceil,
    Trunc,
    Round,
    Copysign,

    // === Generic: bitwise & boolean ===
    And8,
    And16,
    And32,
    And64,
    Or8,
    Or16,
    Or32,
    Or64,
    Xor8,
    Xor16,
    Xor32,
    Xor64,
    AndB,
    OrB,
    Not,

    // === Generic: shifts (result width x count width) ===
    Lsh8x8,
    Lsh8x16,
    Lsh8x32,
    Lsh8x64,
    Lsh16x8,
    Lsh16x16,
    Lsh16x32,
    Lsh16x64,
    Lsh32x8,
    Lsh32x16,
    Lsh32x32,
    Lsh32x64,
    Lsh64x8,
    Lsh64x16,
    Lsh64x32,
    Lsh64x64,
    Rsh8Sx8,
    Rsh8Sx16,
    Rsh8Sx32,
    Rsh8Sx64,
    Rsh8Ux8,
    Rsh8Ux16,
    Rsh8Ux32,
    Rsh8Ux64,
    Rsh16Sx8,
    Rsh16Sx16,
    Rsh16Sx32,
    Rsh16Sx64,
    Rsh16Ux8,
    Rsh16Ux16,
    Rsh16Ux32,
    Rsh16Ux64,
    Rsh32Sx8,
    Rsh32Sx16,
    Rsh32Sx32,
    Rsh32Sx64,
    Rsh32Ux8,
    Rsh32Ux16,
    Rsh32Ux32,
    Rsh32Ux64,
    Rsh64Sx8,
    Rsh64Sx16,
    Rsh64Sx32,
    Rsh64Sx64,
    Rsh64Ux8,
    Rsh64Ux16,
    Rsh64Ux32,
    Rsh64Ux64,
    RotateLeft8,
    RotateLeft16,
    RotateLeft32,

    // === Generic: comparisons ===
    Eq8,
    Eq16,
    Eq32,
    Eq64,
    EqB,
    EqPtr,
    Neq8,
    Neq16,
    Neq32,
    Neq64,
    NeqB,
    NeqPtr,
    Less8S,
    Less8U,
    Less16S,
    Less16U,
    Less32S,
    Less32U,
    Less64S,
    Less64U,
    Leq8S,
    Leq8U,
    Leq16S,
    Leq16U,
    Leq32S,
    Leq32U,
    Leq64S,
    Leq64U,
    Eq32F,
    Eq64F,
    Neq32F,
    Neq64F,
    Less32F,
    Less64F,
    Leq32F,
    Leq64F,
    IsNonNil,
    IsInBounds,
    IsSliceInBounds,

    // === Generic: conversions ===
    SignExt8to16,
    SignExt8to32,
    SignExt8to64,
    SignExt16to32,
    SignExt16to64,
    SignExt32to64,
    ZeroExt8to16,
    ZeroExt8to32,
    ZeroExt8to64,
    ZeroExt16to32,
    ZeroExt16to64,
    ZeroExt32to64,
    Trunc16to8,
    Trunc32to8,
    Trunc32to16,
    Trunc64to8,
    Trunc64to16,
    Trunc64to32,
    Cvt32to32F,
    Cvt32to64F,
    Cvt32Uto32F,
    Cvt32Uto64F,
    Cvt32Fto32,
    Cvt64Fto32,
    Cvt32Fto64F,
    Cvt64Fto32F,
    CvtBoolToUint8,

    // === Generic: 64-bit pair plumbing and masks ===
    Int64Make,
    Int64Hi,
    Int64Lo,
    Zeromask,
    Signmask,
    Slicemask,

    // === Generic: bit counting ===
    Ctz8,
    Ctz16,
    Ctz32,
    Ctz64,
    Ctz8NonZero,
    Ctz16NonZero,
    Ctz32NonZero,
    Ctz64NonZero,
    BitLen8,
    BitLen16,
    BitLen32,
    BitLen64,
    PopCount8,
    PopCount16,
    PopCount32,
    Bswap16,
    Bswap32,
    Bswap64,

    // === Generic: memory & addressing ===
    Load,
    Store,
    Addr,
    LocalAddr,
    OffPtr,
    Arg,
    SP,
    SB,
    AddPtr,
    SubPtr,

    // === Generic: misc ===
    Copy,
    Phi,
    Select0,
    Select1,
    CondSelect,
    NilCheck,

    // === Machine: constants ===
    I32Const,
    I64Const,
    F32Const,
    F64Const,

    // === Machine: 32-bit integer ===
    I32Add,
    I32Sub,
    I32Mul,
    I32DivS,
    I32DivU,
    I32RemS,
    I32RemU,
    I32And,
    I32Or,
    I32Xor,
    I32Shl,
    I32ShrS,
    I32ShrU,
    I32Rotl,
    I32Eq,
    I32Ne,
    I32LtS,
    I32LtU,
    I32LeS,
    I32LeU,
    I32GtS,
    I32GtU,
    I32GeS,
    I32GeU,
    I32Eqz,
    I32Clz,
    I32Ctz,
    I32Popcnt,
    I32Extend8S,
    I32Extend16S,
    /// `x + imm`, the building block of addressing arithmetic.
    I32AddConst,

    // === Machine: 64-bit integer (native-64 configuration) ===
    I64Add,
    I64Sub,
    I64Mul,
    I64DivS,
    I64DivU,
    I64RemS,
    I64RemU,
    I64And,
    I64Or,
    I64Xor,
    I64Shl,
    I64ShrS,
    I64ShrU,
    I64Eq,
    I64Ne,
    I64LtS,
    I64LtU,
    I64LeS,
    I64LeU,
    I64Eqz,
    I64ExtendI32S,
    I64ExtendI32U,
    I32WrapI64,
    I64Extend8S,
    I64Extend16S,
    I64Extend32S,

    // === Machine: floats ===
    F32Add,
    F32Sub,
    F32Mul,
    F32Div,
    F32Neg,
    F32Eq,
    F32Ne,
    F32Lt,
    F32Le,
    F32Gt,
    F32Ge,
    F64Add,
    F64Sub,
    F64Mul,
    F64Div,
    F64Neg,
    F64Eq,
    F64Ne,
    F64Lt,
    F64Le,
    F64Gt,
    F64Ge,
    F64Abs,
    F64Sqrt,
    F64Floor,
    F64Ceil,
    F64Trunc,
    F64Nearest,
    F64Copysign,
    F32ConvertI32S,
    F32ConvertI32U,
    F64ConvertI32S,
    F64ConvertI32U,
    F32DemoteF64,
    F64PromoteF32,
    I32TruncSatF32S,
    I32TruncSatF32U,
    I32TruncSatF64S,
    I32TruncSatF64U,
    I64TruncSatF64U,

    // === Machine: memory (unsigned 32-bit offset immediate) ===
    I32Load,
    I32Load8S,
    I32Load8U,
    I32Load16S,
    I32Load16U,
    I64Load,
    F32Load,
    F64Load,
    I32Store,
    I32Store8,
    I32Store16,
    I64Store,
    F32Store,
    F64Store,

    // === Machine: addressing, selection, checks ===
    /// Symbol address plus offset immediate.
    LoweredAddr,
    /// `cond != 0 ? a : b` over args `(a, b, cond)`.
    Select,
    LoweredNilCheck,

    // === Machine: two-word pseudo ops, pair(u32, u32) = (hi, lo) ===
    LoweredAdd64,
    LoweredSub64,
    LoweredMul64,
    LoweredDiv64S,
    LoweredDiv64U,
    LoweredMod64S,
    LoweredMod64U,
}

impl Op {
    /// Machine opcodes: everything the SV32 emitter understands directly.
    pub fn is_machine(self) -> bool {
        use Op::*;
        matches!(
            self,
            I32Const
                | I64Const
                | F32Const
                | F64Const
                | I32Add
                | I32Sub
                | I32Mul
                | I32DivS
                | I32DivU
                | I32RemS
                | I32RemU
                | I32And
                | I32Or
                | I32Xor
                | I32Shl
                | I32ShrS
                | I32ShrU
                | I32Rotl
                | I32Eq
                | I32Ne
                | I32LtS
                | I32LtU
                | I32LeS
                | I32LeU
                | I32GtS
                | I32GtU
                | I32GeS
                | I32GeU
                | I32Eqz
                | I32Clz
                | I32Ctz
                | I32Popcnt
                | I32Extend8S
                | I32Extend16S
                | I32AddConst
                | I64Add
                | I64Sub
                | I64Mul
                | I64DivS
                | I64DivU
                | I64RemS
                | I64RemU
                | I64And
                | I64Or
                | I64Xor
                | I64Shl
                | I64ShrS
                | I64ShrU
                | I64Eq
                | I64Ne
                | I64LtS
                | I64LtU
                | I64LeS
                | I64LeU
                | I64Eqz
                | I64ExtendI32S
                | I64ExtendI32U
                | I32WrapI64
                | I64Extend8S
                | I64Extend16S
                | I64Extend32S
                | F32Add
                | F32Sub
                | F32Mul
                | F32Div
                | F32Neg
                | F32Eq
                | F32Ne
                | F32Lt
                | F32Le
                | F32Gt
                | F32Ge
                | F64Add
                | F64Sub
                | F64Mul
                | F64Div
                | F64Neg
                | F64Eq
                | F64Ne
                | F64Lt
                | F64Le
                | F64Gt
                | F64Ge
                | F64Abs
                | F64Sqrt
                | F64Floor
                | F64Ceil
                | F64Trunc
                | F64Nearest
                | F64Copysign
                | F32ConvertI32S
                | F32ConvertI32U
                | F64ConvertI32S
                | F64ConvertI32U
                | F32DemoteF64
                | F64PromoteF32
                | I32TruncSatF32S
                | I32TruncSatF32U
                | I32TruncSatF64S
                | I32TruncSatF64U
                | I64TruncSatF64U
                | I32Load
                | I32Load8S
                | I32Load8U
                | I32Load16S
                | I32Load16U
                | I64Load
                | F32Load
                | F64Load
                | I32Store
                | I32Store8
                | I32Store16
                | I64Store
                | F32Store
                | F64Store
                | LoweredAddr
                | Select
                | LoweredNilCheck
                | LoweredAdd64
                | LoweredSub64
                | LoweredMul64
                | LoweredDiv64S
                | LoweredDiv64U
                | LoweredMod64S
                | LoweredMod64U
        )
    }

    /// Machine opcodes plus the generic residue the emitter resolves
    /// itself (register pairs, projections, block plumbing).
    pub fn is_machine_legal(self) -> bool {
        use Op::*;
        self.is_machine()
            || matches!(
                self,
                Int64Make | Int64Hi | Int64Lo | Select0 | Select1 | Arg | Phi | Copy | SP | SB
            )
    }

    /// Binops where swapping the two arguments preserves the result.
    /// Canonicalization moves a constant operand of these to the right.
    pub fn is_commutative(self) -> bool {
        use Op::*;
        matches!(
            self,
            Add8 | Add16
                | Add32
                | Add64
                | Mul8
                | Mul16
                | Mul32
                | Mul64
                | And8
                | And16
                | And32
                | And64
                | Or8
                | Or16
                | Or32
                | Or64
                | Xor8
                | Xor16
                | Xor32
                | Xor64
                | Eq8
                | Eq16
                | Eq32
                | Eq64
                | EqB
                | EqPtr
                | Neq8
                | Neq16
                | Neq32
                | Neq64
                | NeqB
                | NeqPtr
                | AndB
                | OrB
                | Add32F
                | Add64F
                | Mul32F
                | Mul64F
                | Eq32F
                | Eq64F
                | Neq32F
                | Neq64F
                | I32Add
                | I32Mul
                | I32And
                | I32Or
                | I32Xor
                | I32Eq
                | I32Ne
                | I64Add
                | I64Mul
                | I64And
                | I64Or
                | I64Xor
                | I64Eq
                | I64Ne
                | F32Add
                | F32Mul
                | F32Eq
                | F32Ne
                | F64Add
                | F64Mul
                | F64Eq
                | F64Ne
        )
    }

    /// The two-word pseudo ops producing a pair(u32, u32) result.
    pub fn is_lowered_pair(self) -> bool {
        use Op::*;
        matches!(
            self,
            LoweredAdd64 | LoweredSub64 | LoweredMul64 | LoweredDiv64S | LoweredDiv64U
                | LoweredMod64S
                | LoweredMod64U
        )
    }

    /// Machine loads carrying an offset immediate checked by the verifier.
    pub fn is_machine_load(self) -> bool {
        use Op::*;
        matches!(
            self,
            I32Load | I32Load8S | I32Load8U | I32Load16S | I32Load16U | I64Load | F32Load
                | F64Load
        )
    }

    /// Machine stores carrying an offset immediate checked by the verifier.
    pub fn is_machine_store(self) -> bool {
        use Op::*;
        matches!(
            self,
            I32Store | I32Store8 | I32Store16 | I64Store | F32Store | F64Store
        )
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
