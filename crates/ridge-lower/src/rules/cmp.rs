//! Comparison lowering.
//!
//! Word comparisons retag directly. Sub-word comparisons widen both
//! operands; 64-bit comparisons combine a high-half compare with an
//! unsigned low-half compare. Low halves are always compared unsigned
//! regardless of the operation's signedness.

use ridge_ir::{Function, NodeRef, Op};

use super::halves;

/// Widen both operands and compare as words.
pub(super) fn narrow_cmp(f: &mut Function, n: NodeRef, machine: Op, ext: Op) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    let ty = match ext {
        Op::SignExt8to32 | Op::SignExt16to32 => f.cat.int32,
        _ => f.cat.uint32,
    };
    let ex = f.helper1(n, ext, ty, x);
    let ey = f.helper1(n, ext, ty, y);
    f.reset(n, machine);
    f.add_args2(n, ex, ey);
    true
}

/// 64-bit comparisons over the register pair.
pub(super) fn rewrite_cmp64(f: &mut Function, n: NodeRef) -> bool {
    let op = f.op(n);
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    let bool_ = f.cat.bool_;
    let (xhi, xlo) = halves(f, n, x);
    let (yhi, ylo) = halves(f, n, y);

    match op {
        Op::Eq64 => {
            let hi = f.helper2(n, Op::Eq32, bool_, xhi, yhi);
            let lo = f.helper2(n, Op::Eq32, bool_, xlo, ylo);
            f.reset(n, Op::AndB);
            f.add_args2(n, hi, lo);
        }
        Op::Neq64 => {
            let hi = f.helper2(n, Op::Neq32, bool_, xhi, yhi);
            let lo = f.helper2(n, Op::Neq32, bool_, xlo, ylo);
            f.reset(n, Op::OrB);
            f.add_args2(n, hi, lo);
        }
        Op::Less64S | Op::Less64U | Op::Leq64S | Op::Leq64U => {
            // hi-cmp OR (hi-eq AND unsigned lo-cmp)
            let hi_cmp = match op {
                Op::Less64S | Op::Leq64S => Op::Less32S,
                _ => Op::Less32U,
            };
            let lo_cmp = match op {
                Op::Less64S | Op::Less64U => Op::Less32U,
                _ => Op::Leq32U,
            };
            let strict = f.helper2(n, hi_cmp, bool_, xhi, yhi);
            let eq = f.helper2(n, Op::Eq32, bool_, xhi, yhi);
            let low = f.helper2(n, lo_cmp, bool_, xlo, ylo);
            let tie = f.helper2(n, Op::AndB, bool_, eq, low);
            f.reset(n, Op::OrB);
            f.add_args2(n, strict, tie);
        }
        _ => unreachable!("rewrite_cmp64 on {op}"),
    }
    true
}

/// `p != nil` as a double `I32Eqz`.
pub(super) fn rewrite_is_non_nil(f: &mut Function, n: NodeRef) -> bool {
    let p = f.arg(n, 0);
    let bool_ = f.cat.bool_;
    let z = f.helper1(n, Op::I32Eqz, bool_, p);
    f.reset(n, Op::I32Eqz);
    f.add_arg(n, z);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridge_ir::{Pos, TargetConfig};

    fn cmp_node(op: Op) -> (Function, NodeRef) {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.int64, Pos::default());
        let y = f.new_node(b, Op::Arg, f.cat.int64, Pos::default());
        let c = f.new_node(b, op, f.cat.bool_, Pos::default());
        f.add_args2(c, x, y);
        (f, c)
    }

    #[test]
    fn less64s_compares_high_signed_low_unsigned() {
        let (mut f, c) = cmp_node(Op::Less64S);
        assert!(rewrite_cmp64(&mut f, c));
        assert_eq!(f.op(c), Op::OrB);

        let strict = f.arg(c, 0);
        let tie = f.arg(c, 1);
        assert_eq!(f.op(strict), Op::Less32S);
        assert_eq!(f.op(tie), Op::AndB);
        assert_eq!(f.op(f.arg(tie, 0)), Op::Eq32);
        assert_eq!(f.op(f.arg(tie, 1)), Op::Less32U);
        // The strict compare and the equality test see the same halves.
        assert_eq!(f.args(strict), f.args(f.arg(tie, 0)));
    }

    #[test]
    fn leq64u_is_unsigned_on_both_levels() {
        let (mut f, c) = cmp_node(Op::Leq64U);
        assert!(rewrite_cmp64(&mut f, c));
        assert_eq!(f.op(f.arg(c, 0)), Op::Less32U);
        assert_eq!(f.op(f.arg(f.arg(c, 1), 1)), Op::Leq32U);
    }

    #[test]
    fn eq16_widens_unsigned() {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.uint16, Pos::default());
        let y = f.new_node(b, Op::Arg, f.cat.uint16, Pos::default());
        let c = f.new_node(b, Op::Eq16, f.cat.bool_, Pos::default());
        f.add_args2(c, x, y);

        assert!(narrow_cmp(&mut f, c, Op::I32Eq, Op::ZeroExt16to32));
        assert_eq!(f.op(c), Op::I32Eq);
        assert_eq!(f.op(f.arg(c, 0)), Op::ZeroExt16to32);
        assert_eq!(f.op(f.arg(c, 1)), Op::ZeroExt16to32);
    }
}
