//! Narrow integer arithmetic.
//!
//! 8/16/32-bit operations all run in a 32-bit register. Add/Sub/Mul and
//! the bitwise ops are retagged by the dispatch; negation, complement,
//! and the sub-word divisions need small expansions here.

use ridge_ir::{Function, NodeRef, Op};

/// `-x` as `0 - x`.
pub(super) fn rewrite_neg32(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let zero = f.iconst(n, 0);
    f.reset(n, Op::I32Sub);
    f.add_args2(n, zero, x);
    true
}

/// `^x` as `x ^ -1`.
pub(super) fn rewrite_com32(f: &mut Function, n: NodeRef) -> bool {
    let x = f.arg(n, 0);
    let ones = f.iconst(n, u32::MAX);
    f.reset(n, Op::I32Xor);
    f.add_args2(n, x, ones);
    true
}

/// Sub-word division and remainder widen both operands first; the
/// machine only divides words.
pub(super) fn narrow_divmod(f: &mut Function, n: NodeRef, machine: Op, ext: Op) -> bool {
    let x = f.arg(n, 0);
    let y = f.arg(n, 1);
    let ty = f.ty(n);
    let ex = f.helper1(n, ext, ty, x);
    let ey = f.helper1(n, ext, ty, y);
    f.reset(n, machine);
    f.add_args2(n, ex, ey);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridge_ir::{Pos, TargetConfig};

    #[test]
    fn div16s_widens_both_operands() {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.int16, Pos::default());
        let y = f.new_node(b, Op::Arg, f.cat.int16, Pos::default());
        let d = f.new_node(b, Op::Div16S, f.cat.int16, Pos::default());
        f.add_args2(d, x, y);

        assert!(narrow_divmod(&mut f, d, Op::I32DivS, Op::SignExt16to32));
        assert_eq!(f.op(d), Op::I32DivS);
        assert_eq!(f.op(f.arg(d, 0)), Op::SignExt16to32);
        assert_eq!(f.op(f.arg(d, 1)), Op::SignExt16to32);
    }

    #[test]
    fn neg_is_sub_from_zero() {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.int32, Pos::default());
        let neg = f.new_node(b, Op::Neg32, f.cat.int32, Pos::default());
        f.add_arg(neg, x);

        assert!(rewrite_neg32(&mut f, neg));
        assert_eq!(f.op(neg), Op::I32Sub);
        assert_eq!(f.node(f.arg(neg, 0)).aux_u32(), 0);
        assert_eq!(f.arg(neg, 1), x);
    }
}
