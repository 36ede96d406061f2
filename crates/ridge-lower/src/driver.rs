//! Fixpoint driver.
//!
//! Sweeps every node slot and applies at most one rewrite per node per
//! sweep; helpers created mid-sweep get their turn on the next one. The
//! pass is done when a full sweep changes nothing. The iteration cap
//! only exists to turn a non-terminating rule set into a diagnosable
//! failure instead of a hang.

use ridge_ir::{Function, NodeRef};

use crate::rules;

pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Outcome of a lowering run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyResult {
    /// Full sweeps performed, including the final quiet one.
    pub iterations: usize,
    /// Nodes changed across all sweeps.
    pub total_changes: usize,
    /// False only when the iteration cap fired.
    pub reached_fixpoint: bool,
}

#[derive(Debug, Clone)]
pub struct Driver {
    max_iterations: usize,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    pub fn new() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    pub fn with_max_iterations(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    pub fn run_to_fixpoint(&self, f: &mut Function) -> ApplyResult {
        let mut result = ApplyResult::default();
        loop {
            if result.iterations >= self.max_iterations {
                tracing::error!(
                    function = %f.name,
                    iterations = result.iterations,
                    "lowering did not reach a fixpoint"
                );
                return result;
            }
            // Snapshot the slots that exist now; helpers appended during
            // this sweep are picked up by the next.
            let snapshot: Vec<NodeRef> = f.node_refs().collect();
            let mut changes = 0;
            for n in snapshot {
                if rules::rewrite_node(f, n) {
                    changes += 1;
                }
            }
            result.iterations += 1;
            result.total_changes += changes;
            tracing::debug!(
                function = %f.name,
                iteration = result.iterations,
                changes,
                nodes = f.node_count(),
                "rewrite sweep"
            );
            if changes == 0 {
                result.reached_fixpoint = true;
                return result;
            }
        }
    }
}

/// Run the lowering with the default driver.
pub fn lower(f: &mut Function) -> ApplyResult {
    Driver::new().run_to_fixpoint(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ridge_ir::{Op, Pos, TargetConfig};

    #[test]
    fn already_lowered_input_is_one_quiet_sweep() {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.uint32, Pos::default());
        let y = f.new_node(b, Op::Arg, f.cat.uint32, Pos::default());
        let add = f.new_node(b, Op::I32Add, f.cat.uint32, Pos::default());
        f.add_args2(add, x, y);

        let r = lower(&mut f);
        assert!(r.reached_fixpoint);
        assert_eq!(r.iterations, 1);
        assert_eq!(r.total_changes, 0);
    }

    #[test]
    fn iteration_cap_reports_no_fixpoint() {
        let mut f = Function::new("t", TargetConfig::sv32());
        let b = f.add_block();
        let x = f.new_node(b, Op::Arg, f.cat.int64, Pos::default());
        let y = f.new_node(b, Op::Arg, f.cat.int64, Pos::default());
        let add = f.new_node(b, Op::Add64, f.cat.int64, Pos::default());
        f.add_args2(add, x, y);

        let r = Driver::with_max_iterations(0).run_to_fixpoint(&mut f);
        assert!(!r.reached_fixpoint);
        assert_eq!(r.iterations, 0);
    }
}
