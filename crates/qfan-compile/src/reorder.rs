//! Reordering that brings merge partners next to each other.

use tracing::{debug, trace};

use qfan_ir::{GateFamily, Operation};

use crate::commutation::CommutationChecker;
use crate::config::AnglePolicy;

/// Slides mergeable operations back to their nearest merge partner.
///
/// For each raw controlled gate, the reorderer walks backwards over the
/// operations already emitted. It stops at the first operation with the same
/// control and family whose targets it could join (the partner) and moves the
/// gate directly behind it, or stops at the first operation it does not
/// commute with and leaves the gate where it is. Operations never move without
/// a partner in reach, and non-commuting pairs keep their relative order.
///
/// Fan-outs stay where they are. They can still serve as partners for raw
/// gates that follow them.
#[derive(Debug, Clone, Default)]
pub struct Reorderer {
    checker: CommutationChecker,
    accumulate: bool,
}

impl Reorderer {
    /// Create a reorderer using the given commutation rules.
    pub fn new(checker: CommutationChecker) -> Self {
        Self {
            checker,
            accumulate: false,
        }
    }

    /// Treat phase gates that repeat a target as partners when angles accumulate.
    #[must_use]
    pub fn with_angle_policy(mut self, policy: AnglePolicy) -> Self {
        self.accumulate = policy == AnglePolicy::Accumulate;
        self
    }

    /// Produce a reordered copy of `ops`.
    pub fn reorder(&self, ops: &[Operation]) -> Vec<Operation> {
        let mut out: Vec<Operation> = Vec::with_capacity(ops.len());
        let mut moved = 0usize;

        for op in ops {
            let position = out.len();
            if let Some(dest) = self.destination(&out, op) {
                trace!("moving {} from {} to {}", op, position, dest);
                out.insert(dest, op.clone());
                moved += 1;
            } else {
                out.push(op.clone());
            }
        }

        debug!("Reorderer moved {} of {} operations", moved, ops.len());
        out
    }

    /// Index right after the nearest reachable partner, if moving is legal and useful.
    fn destination(&self, emitted: &[Operation], op: &Operation) -> Option<usize> {
        if !matches!(
            op,
            Operation::Controlled { .. } | Operation::ControlledPhase { .. }
        ) {
            return None;
        }

        for (k, prev) in emitted.iter().enumerate().rev() {
            if self.is_partner(prev, op) {
                let dest = k + 1;
                return (dest < emitted.len()).then_some(dest);
            }
            if !self.checker.commutes(prev, op) {
                return None;
            }
        }
        None
    }

    /// Same family and control, with targets the packer could merge.
    fn is_partner(&self, prev: &Operation, op: &Operation) -> bool {
        if prev.family() != op.family()
            || prev.control().is_none()
            || prev.control() != op.control()
        {
            return false;
        }
        let repeats = op.targets().iter().any(|t| prev.acts_on(*t));
        !repeats || (self.accumulate && op.family() == GateFamily::ControlledPhase)
    }
}
