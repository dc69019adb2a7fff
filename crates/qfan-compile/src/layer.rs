//! Layers of concurrently executable operations.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use qfan_ir::{GateFamily, Operation, QubitId};

use crate::config::AnglePolicy;
use crate::error::CompileResult;
use crate::merge::{AngleConflict, MergeSlot, PackedOperation};

/// A finished layer: operations with pairwise-disjoint footprints.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layer {
    ops: Vec<PackedOperation>,
}

impl Layer {
    /// Packed operations in slot order.
    pub fn packed(&self) -> &[PackedOperation] {
        &self.ops
    }

    /// Iterate over the operations of this layer.
    pub fn operations(&self) -> impl Iterator<Item = &Operation> + '_ {
        self.ops.iter().map(PackedOperation::operation)
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Check if the layer is empty.
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Every qubit touched by the layer.
    pub fn qubits(&self) -> Vec<QubitId> {
        let mut qubits: Vec<QubitId> = self.operations().flat_map(Operation::footprint).collect();
        qubits.sort_unstable();
        qubits
    }

    /// Check that no two operations share a qubit.
    pub fn is_valid(&self) -> bool {
        let mut seen: FxHashSet<QubitId> = FxHashSet::default();
        self.operations()
            .flat_map(Operation::footprint)
            .all(|q| seen.insert(q))
    }
}

/// How an operation would fit into a layer under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerFit {
    /// No qubit in common with the layer.
    Disjoint,
    /// Shares only its control with a compatible fan-out, which can absorb it.
    Merge {
        /// Slot index of the absorbing fan-out.
        slot: usize,
    },
    /// Cannot be placed in this layer.
    Conflict,
}

impl LayerFit {
    /// Whether the operation can go into this layer.
    #[inline]
    pub fn is_eligible(self) -> bool {
        !matches!(self, LayerFit::Conflict)
    }
}

/// A layer being filled by the packer.
#[derive(Debug, Default)]
pub(crate) struct LayerBuilder {
    slots: Vec<MergeSlot>,
    owner: FxHashMap<QubitId, usize>,
}

impl LayerBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current operations that share a qubit with `op`.
    pub(crate) fn overlapping<'a>(
        &'a self,
        op: &'a Operation,
    ) -> impl Iterator<Item = &'a Operation> + 'a {
        let mut owners: Vec<usize> = op
            .footprint()
            .into_iter()
            .filter_map(|q| self.owner.get(&q).copied())
            .collect();
        owners.sort_unstable();
        owners.dedup();
        owners.into_iter().map(|s| self.slots[s].operation())
    }

    /// Decide how `op` fits, reporting a repeated phase target with a different angle.
    pub(crate) fn fit(
        &self,
        op: &Operation,
        position: usize,
        policy: AnglePolicy,
    ) -> (LayerFit, Option<AngleConflict>) {
        let mut owners: Vec<usize> = op
            .footprint()
            .into_iter()
            .filter_map(|q| self.owner.get(&q).copied())
            .collect();
        owners.sort_unstable();
        owners.dedup();

        let slot = match owners.as_slice() {
            [] => return (LayerFit::Disjoint, None),
            [slot] if self.slots[*slot].is_partner(op) => *slot,
            _ => return (LayerFit::Conflict, None),
        };

        let partner = self.slots[slot].operation();
        let repeated: Vec<QubitId> = op
            .targets()
            .into_iter()
            .filter(|&t| partner.acts_on(t))
            .collect();
        if repeated.is_empty() {
            return (LayerFit::Merge { slot }, None);
        }

        match (op.family(), policy) {
            (GateFamily::ControlledPhase, AnglePolicy::Accumulate) => {
                (LayerFit::Merge { slot }, None)
            }
            (GateFamily::ControlledPhase, _) => {
                let conflict = repeated.into_iter().find_map(|target| {
                    let existing = phase_angle(partner, target)?;
                    let incoming = phase_angle(op, target)?;
                    #[allow(clippy::float_cmp)]
                    let differs = existing != incoming;
                    differs.then_some(AngleConflict {
                        control: op.control()?,
                        target,
                        existing,
                        incoming,
                        position,
                    })
                });
                (LayerFit::Conflict, conflict)
            }
            _ => (LayerFit::Conflict, None),
        }
    }

    /// Place `op` according to an eligible `fit`.
    pub(crate) fn insert(
        &mut self,
        op: &Operation,
        position: usize,
        fit: LayerFit,
        accumulate: bool,
    ) -> CompileResult<()> {
        let slot = match fit {
            LayerFit::Merge { slot } => {
                self.slots[slot].absorb(op, position, accumulate)?;
                slot
            }
            LayerFit::Disjoint | LayerFit::Conflict => {
                self.slots.push(MergeSlot::open(op, position)?);
                self.slots.len() - 1
            }
        };
        for q in op.footprint() {
            self.owner.insert(q, slot);
        }
        Ok(())
    }

    pub(crate) fn freeze(self) -> Layer {
        Layer {
            ops: self.slots.into_iter().map(MergeSlot::freeze).collect(),
        }
    }
}

fn phase_angle(op: &Operation, target: QubitId) -> Option<f64> {
    match op {
        Operation::ControlledPhase {
            target: t, angle, ..
        } if *t == target => Some(*angle),
        Operation::PhaseFanout(g) => g.angle_of(target),
        _ => None,
    }
}
