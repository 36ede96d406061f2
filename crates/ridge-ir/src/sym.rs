//! Symbol table.
//!
//! Interns symbol names and, for read-only data symbols, keeps the
//! initializer bytes so constant loads through them can fold.

use std::collections::HashMap;

use cranelift_entity::PrimaryMap;

use crate::config::Endianness;
use crate::refs::SymRef;

#[derive(Debug)]
pub struct SymbolData {
    pub name: String,
    /// Initializer bytes for read-only data symbols. `None` for
    /// everything mutable or external.
    pub readonly: Option<Vec<u8>>,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    syms: PrimaryMap<SymRef, SymbolData>,
    by_name: HashMap<String, SymRef>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, name: &str) -> SymRef {
        if let Some(&s) = self.by_name.get(name) {
            return s;
        }
        let s = self.syms.push(SymbolData {
            name: name.to_owned(),
            readonly: None,
        });
        self.by_name.insert(name.to_owned(), s);
        s
    }

    /// Intern a symbol and attach read-only initializer bytes.
    pub fn define_readonly(&mut self, name: &str, data: Vec<u8>) -> SymRef {
        let s = self.intern(name);
        self.syms[s].readonly = Some(data);
        s
    }

    pub fn get(&self, s: SymRef) -> &SymbolData {
        &self.syms[s]
    }

    pub fn is_readonly(&self, s: SymRef) -> bool {
        self.syms[s].readonly.is_some()
    }

    /// Read a 32-bit word out of a read-only symbol's initializer.
    /// `None` when the symbol is not read-only or the range is out of
    /// bounds.
    pub fn read_u32(&self, s: SymRef, off: i64, endian: Endianness) -> Option<u32> {
        let data = self.syms[s].readonly.as_deref()?;
        if off < 0 {
            return None;
        }
        let off = off as usize;
        let bytes: [u8; 4] = data.get(off..off + 4)?.try_into().ok()?;
        Some(match endian {
            Endianness::Little => u32::from_le_bytes(bytes),
            Endianness::Big => u32::from_be_bytes(bytes),
        })
    }

    /// Read a single byte out of a read-only symbol's initializer.
    pub fn read_u8(&self, s: SymRef, off: i64) -> Option<u8> {
        let data = self.syms[s].readonly.as_deref()?;
        if off < 0 {
            return None;
        }
        data.get(off as usize).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readonly_reads() {
        let mut syms = SymbolTable::new();
        let ro = syms.define_readonly("tab", vec![0x01, 0x02, 0x03, 0x04, 0x05]);
        let rw = syms.intern("buf");

        assert_eq!(syms.read_u32(ro, 0, Endianness::Little), Some(0x04030201));
        assert_eq!(syms.read_u32(ro, 0, Endianness::Big), Some(0x01020304));
        assert_eq!(syms.read_u32(ro, 1, Endianness::Little), Some(0x05040302));
        assert_eq!(syms.read_u32(ro, 2, Endianness::Little), None);
        assert_eq!(syms.read_u32(ro, -1, Endianness::Little), None);
        assert_eq!(syms.read_u32(rw, 0, Endianness::Little), None);
        assert_eq!(syms.read_u8(ro, 4), Some(0x05));
    }

    #[test]
    fn interning_deduplicates() {
        let mut syms = SymbolTable::new();
        let a = syms.intern("x");
        let b = syms.intern("x");
        assert_eq!(a, b);
        assert_eq!(syms.get(a).name, "x");
    }
}
