//! Immutable target description consulted by the lowering rules.

/// Byte order of multi-word memory accesses and 64-bit argument slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

/// How 64-bit integer operations reach the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Int64Strategy {
    /// Decompose into 32-bit halves with carry/sign plumbing.
    Decompose,
    /// Map straight to the I64 instruction set.
    Native64,
}

/// Target configuration. Built once, shared read-only for the whole run.
#[derive(Debug, Clone, Copy)]
pub struct TargetConfig {
    pub endian: Endianness,
    /// Width of the unsigned addressing-offset immediate on loads,
    /// stores, and `LoweredAddr`.
    pub addr_imm_bits: u8,
    /// Native sign-extension instructions available (`I32Extend8S` etc).
    /// Float-to-int conversion is not gated: SV32 always has the
    /// saturating `TruncSat` instructions and no trapping variant.
    pub has_sign_ext: bool,
    pub int64: Int64Strategy,
}

impl TargetConfig {
    /// The default SV32 target: little-endian, 32-bit offsets, full
    /// feature set, 64-bit ops decomposed.
    pub fn sv32() -> Self {
        Self {
            endian: Endianness::Little,
            addr_imm_bits: 32,
            has_sign_ext: true,
            int64: Int64Strategy::Decompose,
        }
    }

    /// SV32 with the native 64-bit instruction set enabled.
    pub fn sv32_native64() -> Self {
        Self {
            int64: Int64Strategy::Native64,
            ..Self::sv32()
        }
    }

    /// Whether `off` fits the unsigned addressing-offset immediate.
    pub fn fits_addr_imm(&self, off: i64) -> bool {
        debug_assert!(self.addr_imm_bits <= 32);
        off >= 0 && (off >> self.addr_imm_bits) == 0
    }
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self::sv32()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addr_imm_range() {
        let cfg = TargetConfig::sv32();
        assert!(cfg.fits_addr_imm(0));
        assert!(cfg.fits_addr_imm(u32::MAX as i64));
        assert!(!cfg.fits_addr_imm(u32::MAX as i64 + 1));
        assert!(!cfg.fits_addr_imm(-1));

        let narrow = TargetConfig {
            addr_imm_bits: 12,
            ..TargetConfig::sv32()
        };
        assert!(narrow.fits_addr_imm(4095));
        assert!(!narrow.fits_addr_imm(4096));
    }
}
