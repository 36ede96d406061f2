//! Value node payloads.
//!
//! A node is one slot in the function's arena: opcode, result type, an
//! integer immediate (`aux_int`, reinterpreted per opcode), an optional
//! reference payload (`Aux`), the ordered argument list, and a source
//! position. Rewrites mutate the slot in place so `NodeRef` identity is
//! stable across the whole lowering run.

use smallvec::SmallVec;

use crate::op::Op;
use crate::refs::{BlockRef, NodeRef, SymRef, TypeRef};

/// Source position carried through rewriting unchanged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pos {
    pub line: u32,
    pub col: u32,
}

impl Pos {
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }
}

/// Reference payload. Most opcodes carry `None`; addressing opcodes
/// carry a symbol, a few carry a type descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Aux {
    #[default]
    None,
    Sym(SymRef),
    Type(TypeRef),
}

/// One node slot.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub op: Op,
    pub ty: TypeRef,
    /// Immediate payload, reinterpreted per opcode via the `aux_*`
    /// accessors below. Zero for opcodes that carry none.
    pub aux_int: i64,
    pub aux: Aux,
    pub args: SmallVec<[NodeRef; 4]>,
    pub pos: Pos,
    /// Owning block; helper nodes created during rewriting are appended
    /// here.
    pub block: BlockRef,
}

impl NodeData {
    pub fn arg(&self, i: usize) -> NodeRef {
        self.args[i]
    }

    // aux_int views. Narrow immediates are stored sign-extended so the
    // stored i64 round-trips through the accessor of the defining width.

    pub fn aux_i8(&self) -> i8 {
        self.aux_int as i8
    }

    pub fn aux_i16(&self) -> i16 {
        self.aux_int as i16
    }

    pub fn aux_i32(&self) -> i32 {
        self.aux_int as i32
    }

    pub fn aux_i64(&self) -> i64 {
        self.aux_int
    }

    pub fn aux_u32(&self) -> u32 {
        self.aux_int as u32
    }

    pub fn aux_u64(&self) -> u64 {
        self.aux_int as u64
    }

    pub fn aux_bool(&self) -> bool {
        self.aux_int != 0
    }

    pub fn aux_f32(&self) -> f32 {
        f32::from_bits(self.aux_int as u32)
    }

    pub fn aux_f64(&self) -> f64 {
        f64::from_bits(self.aux_int as u64)
    }

    pub fn sym(&self) -> Option<SymRef> {
        match self.aux {
            Aux::Sym(s) => Some(s),
            _ => None,
        }
    }
}

/// Sign-extended storage for the narrow immediate widths.
pub fn aux_from_i8(v: i8) -> i64 {
    v as i64
}

pub fn aux_from_i16(v: i16) -> i64 {
    v as i64
}

pub fn aux_from_i32(v: i32) -> i64 {
    v as i64
}

pub fn aux_from_u32(v: u32) -> i64 {
    v as i32 as i64
}

pub fn aux_from_bool(v: bool) -> i64 {
    v as i64
}

pub fn aux_from_f32(v: f32) -> i64 {
    v.to_bits() as i64
}

pub fn aux_from_f64(v: f64) -> i64 {
    v.to_bits() as i64
}
