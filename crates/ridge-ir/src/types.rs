//! Interned value types.
//!
//! Types are structural and deduplicated: interning the same `TypeData`
//! twice yields the same `TypeRef`, so types compare by reference. The
//! lowering rules only ever need a small fixed set, pre-interned in
//! `TypeCatalog` so rule code never touches the interner directly.

use std::collections::HashMap;

use cranelift_entity::PrimaryMap;

use crate::refs::TypeRef;

/// Structural description of a value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeData {
    /// Fixed-width integer. `bits` is 8, 16, 32, or 64.
    Int { bits: u8, signed: bool },
    /// 32-bit IEEE float.
    F32,
    /// 64-bit IEEE float.
    F64,
    /// Boolean, materialized as 0 or 1 in a 32-bit register.
    Bool,
    /// Machine pointer (32-bit on this target).
    Ptr,
    /// Memory state token. Carries no bits; orders loads and stores.
    Mem,
    /// Two-result aggregate, e.g. the (hi, lo) carry pair.
    Pair(TypeRef, TypeRef),
    /// No value (stores, checks).
    Void,
}

/// Interner mapping `TypeData` to stable `TypeRef`s.
#[derive(Debug, Default)]
pub struct TypeInterner {
    types: PrimaryMap<TypeRef, TypeData>,
    dedup: HashMap<TypeData, TypeRef>,
}

impl TypeInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a type, returning the existing ref if already present.
    pub fn intern(&mut self, data: TypeData) -> TypeRef {
        if let Some(&existing) = self.dedup.get(&data) {
            return existing;
        }
        let r = self.types.push(data);
        self.dedup.insert(data, r);
        r
    }

    pub fn get(&self, r: TypeRef) -> &TypeData {
        &self.types[r]
    }

    /// Width of the type's value in bits. Pairs report the sum of their
    /// halves; `Mem` and `Void` report zero.
    pub fn bit_size(&self, r: TypeRef) -> u32 {
        match *self.get(r) {
            TypeData::Int { bits, .. } => bits as u32,
            TypeData::F32 => 32,
            TypeData::F64 => 64,
            TypeData::Bool => 8,
            TypeData::Ptr => 32,
            TypeData::Mem | TypeData::Void => 0,
            TypeData::Pair(a, b) => self.bit_size(a) + self.bit_size(b),
        }
    }

    pub fn is_signed(&self, r: TypeRef) -> bool {
        matches!(self.get(r), TypeData::Int { signed: true, .. })
    }

    pub fn is_integer(&self, r: TypeRef) -> bool {
        matches!(self.get(r), TypeData::Int { .. })
    }

    pub fn is_float(&self, r: TypeRef) -> bool {
        matches!(self.get(r), TypeData::F32 | TypeData::F64)
    }

    pub fn is_ptr(&self, r: TypeRef) -> bool {
        matches!(self.get(r), TypeData::Ptr)
    }

    pub fn is_mem(&self, r: TypeRef) -> bool {
        matches!(self.get(r), TypeData::Mem)
    }

    pub fn is_pair(&self, r: TypeRef) -> bool {
        matches!(self.get(r), TypeData::Pair(..))
    }

    /// Integer of exactly 64 bits, either signedness.
    pub fn is_int64(&self, r: TypeRef) -> bool {
        matches!(self.get(r), TypeData::Int { bits: 64, .. })
    }

    /// The two halves of a pair type.
    pub fn pair_parts(&self, r: TypeRef) -> Option<(TypeRef, TypeRef)> {
        match *self.get(r) {
            TypeData::Pair(a, b) => Some((a, b)),
            _ => None,
        }
    }
}

/// Pre-interned refs for every type the lowering rules mention.
#[derive(Debug, Clone, Copy)]
pub struct TypeCatalog {
    pub int8: TypeRef,
    pub uint8: TypeRef,
    pub int16: TypeRef,
    pub uint16: TypeRef,
    pub int32: TypeRef,
    pub uint32: TypeRef,
    pub int64: TypeRef,
    pub uint64: TypeRef,
    pub float32: TypeRef,
    pub float64: TypeRef,
    pub bool_: TypeRef,
    pub ptr: TypeRef,
    pub mem: TypeRef,
    pub void: TypeRef,
    /// (hi: u32, lo: u32) result pair of the decomposed 64-bit ops.
    pub uint32_pair: TypeRef,
}

impl TypeCatalog {
    pub fn build(types: &mut TypeInterner) -> Self {
        let int = |t: &mut TypeInterner, bits, signed| t.intern(TypeData::Int { bits, signed });
        let int8 = int(types, 8, true);
        let uint8 = int(types, 8, false);
        let int16 = int(types, 16, true);
        let uint16 = int(types, 16, false);
        let int32 = int(types, 32, true);
        let uint32 = int(types, 32, false);
        let int64 = int(types, 64, true);
        let uint64 = int(types, 64, false);
        let float32 = types.intern(TypeData::F32);
        let float64 = types.intern(TypeData::F64);
        let bool_ = types.intern(TypeData::Bool);
        let ptr = types.intern(TypeData::Ptr);
        let mem = types.intern(TypeData::Mem);
        let void = types.intern(TypeData::Void);
        let uint32_pair = types.intern(TypeData::Pair(uint32, uint32));
        Self {
            int8,
            uint8,
            int16,
            uint16,
            int32,
            uint32,
            int64,
            uint64,
            float32,
            float64,
            bool_,
            ptr,
            mem,
            void,
            uint32_pair,
        }
    }
}
