//! Post-lowering verification.
//!
//! After the rewrite engine reports a fixpoint, every node must be a
//! machine opcode or accepted residue, two-word pseudo ops must be
//! consumed by exactly one `Select0` and one `Select1`, addressing
//! immediates must fit the target's offset range, and memory tokens
//! must sit in the memory operand position only.

use std::collections::HashMap;

use derive_more::{Display, Error};

use crate::func::Function;
use crate::node::Aux;
use crate::op::Op;
use crate::refs::NodeRef;

#[derive(Debug, Display, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[display("{node}: generic opcode {op} survived lowering")]
    GenericOpRemains { node: NodeRef, op: Op },

    #[display("{node}: pair result consumed by {sel0} Select0 and {sel1} Select1 uses")]
    PairConsumers {
        node: NodeRef,
        sel0: usize,
        sel1: usize,
    },

    #[display("{node}: pair result escapes into {user} ({op})")]
    PairEscapes {
        node: NodeRef,
        user: NodeRef,
        op: Op,
    },

    #[display("{node}: {op} projects a non-pair value")]
    ProjectionOfNonPair { node: NodeRef, op: Op },

    #[display("{node}: {op} offset {offset} exceeds the addressing immediate")]
    AddrOffsetOutOfRange {
        node: NodeRef,
        op: Op,
        offset: i64,
    },

    #[display("{node}: {op} memory token mis-threaded")]
    MemTokenMisuse { node: NodeRef, op: Op },

    #[display("{node}: LoweredAddr with a non-symbol payload")]
    AddrBadPayload { node: NodeRef },
}

/// Check that `f` is fully lowered and structurally sound.
pub fn check_lowered(f: &Function) -> Result<(), VerifyError> {
    // Pair-consumer tallies, filled while scanning uses below.
    let mut consumers: HashMap<NodeRef, (usize, usize)> = HashMap::new();

    for n in f.node_refs() {
        let node = f.node(n);
        let op = node.op;

        if !op.is_machine_legal() {
            return Err(VerifyError::GenericOpRemains { node: n, op });
        }

        match op {
            Op::Select0 | Op::Select1 => {
                let src = node.arg(0);
                if !f.types.is_pair(f.ty(src)) {
                    return Err(VerifyError::ProjectionOfNonPair { node: n, op });
                }
                let tally = consumers.entry(src).or_default();
                if op == Op::Select0 {
                    tally.0 += 1;
                } else {
                    tally.1 += 1;
                }
            }
            Op::LoweredAddr => {
                // Stack-relative addresses carry no symbol; a type
                // payload here is always a bug.
                if matches!(node.aux, Aux::Type(_)) {
                    return Err(VerifyError::AddrBadPayload { node: n });
                }
                check_offset(f, n)?;
            }
            _ if op.is_machine_load() => {
                check_offset(f, n)?;
                check_mem_operand(f, n, 1)?;
            }
            _ if op.is_machine_store() => {
                check_offset(f, n)?;
                check_mem_operand(f, n, 2)?;
                if !f.types.is_mem(node.ty) {
                    return Err(VerifyError::MemTokenMisuse { node: n, op });
                }
            }
            Op::LoweredNilCheck => check_mem_operand(f, n, 1)?,
            _ => {
                // Other pair escapes are caught here: a pair value may
                // only flow into Select0/Select1.
                for &a in &node.args {
                    if f.types.is_pair(f.ty(a)) {
                        return Err(VerifyError::PairEscapes {
                            node: a,
                            user: n,
                            op,
                        });
                    }
                }
            }
        }
    }

    for n in f.node_refs() {
        if f.types.is_pair(f.ty(n)) {
            let (sel0, sel1) = consumers.get(&n).copied().unwrap_or((0, 0));
            if sel0 != 1 || sel1 != 1 {
                return Err(VerifyError::PairConsumers { node: n, sel0, sel1 });
            }
        }
    }

    Ok(())
}

fn check_offset(f: &Function, n: NodeRef) -> Result<(), VerifyError> {
    let node = f.node(n);
    if !f.cfg.fits_addr_imm(node.aux_int) {
        return Err(VerifyError::AddrOffsetOutOfRange {
            node: n,
            op: node.op,
            offset: node.aux_int,
        });
    }
    Ok(())
}

/// The memory token sits at `mem_idx` and nowhere else.
fn check_mem_operand(f: &Function, n: NodeRef, mem_idx: usize) -> Result<(), VerifyError> {
    let node = f.node(n);
    if node.args.len() != mem_idx + 1 {
        return Err(VerifyError::MemTokenMisuse { node: n, op: node.op });
    }
    for (i, &a) in node.args.iter().enumerate() {
        let is_mem = f.types.is_mem(f.ty(a));
        if is_mem != (i == mem_idx) {
            return Err(VerifyError::MemTokenMisuse { node: n, op: node.op });
        }
    }
    Ok(())
}
