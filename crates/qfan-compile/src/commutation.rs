//! Commutation rules used to decide whether two operations may be swapped.
//!
//! The checker is a fixed, conservative table keyed by pairs of
//! [`GateFamily`]. A missing row means "does not commute"; a false negative
//! only costs a merge opportunity, never correctness.
//!
//! Rules, in priority order:
//! 1. Disjoint footprints always commute.
//! 2. [`PairRule::Always`]: both operations are diagonal in the Z basis.
//! 3. [`PairRule::SharedControl`]: controlled operations with the same control
//!    and disjoint targets.
//! 4. Anything else does not commute.

use rustc_hash::FxHashMap;

use qfan_ir::{GateFamily, Operation};

/// How a pair of families commutes once their footprints overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairRule {
    /// Commute regardless of shared qubits.
    Always,
    /// Commute when the controls match and the target sets are disjoint.
    SharedControl,
}

/// Table-driven commutation predicate.
#[derive(Debug, Clone)]
pub struct CommutationChecker {
    rows: FxHashMap<(GateFamily, GateFamily), PairRule>,
}

impl CommutationChecker {
    /// Create a checker with no rows: only disjoint operations commute.
    pub fn empty() -> Self {
        Self {
            rows: FxHashMap::default(),
        }
    }

    /// Create the standard rule table.
    pub fn new() -> Self {
        use GateFamily::{Controlled, ControlledPhase, ZDiagonal};

        Self::empty()
            .with_rule(ZDiagonal, ZDiagonal, PairRule::Always)
            .with_rule(ZDiagonal, ControlledPhase, PairRule::Always)
            .with_rule(ControlledPhase, ControlledPhase, PairRule::Always)
            .with_rule(Controlled, Controlled, PairRule::SharedControl)
            .with_rule(Controlled, ControlledPhase, PairRule::SharedControl)
    }

    /// Add a symmetric row to the table, replacing any existing one.
    #[must_use]
    pub fn with_rule(mut self, a: GateFamily, b: GateFamily, rule: PairRule) -> Self {
        self.rows.insert((a, b), rule);
        self.rows.insert((b, a), rule);
        self
    }

    /// Look up the row for a pair of families.
    pub fn rule(&self, a: GateFamily, b: GateFamily) -> Option<PairRule> {
        self.rows.get(&(a, b)).copied()
    }

    /// Number of (ordered) rows in the table.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check whether `a`, immediately followed by `b`, may be swapped.
    pub fn commutes(&self, a: &Operation, b: &Operation) -> bool {
        if !a.overlaps(b) {
            return true;
        }

        match self.rule(a.family(), b.family()) {
            Some(PairRule::Always) => true,
            Some(PairRule::SharedControl) => {
                a.control().is_some()
                    && a.control() == b.control()
                    && a.targets().into_iter().all(|t| !b.acts_on(t))
            }
            None => false,
        }
    }
}

impl Default for CommutationChecker {
    fn default() -> Self {
        Self::new()
    }
}
