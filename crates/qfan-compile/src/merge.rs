//! Merge semantics for fan-out groups.
//!
//! During packing every controlled operation lives in a [`MergeSlot`], an
//! append-only builder that owns the growing fan-out and the input positions
//! it absorbed. Slots are frozen into [`PackedOperation`]s once packing
//! returns.

use serde::Serialize;

use qfan_ir::{FanoutGate, Operation, PhaseFanoutGate, QubitId};

use crate::error::{CompileError, CompileResult};

/// A repeated phase target offered with a different angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AngleConflict {
    /// Shared control qubit.
    pub control: QubitId,
    /// Repeated target qubit.
    pub target: QubitId,
    /// Angle already held by the fan-out.
    pub existing: f64,
    /// Angle of the incoming operation.
    pub incoming: f64,
    /// Position of the incoming operation in the packed sequence.
    pub position: usize,
}

impl From<AngleConflict> for CompileError {
    fn from(c: AngleConflict) -> Self {
        CompileError::AngleConflict {
            control: c.control,
            target: c.target,
            existing: c.existing,
            incoming: c.incoming,
        }
    }
}

/// An operation in its final layer, with the input positions it stands for.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PackedOperation {
    operation: Operation,
    sources: Vec<usize>,
}

impl PackedOperation {
    /// The (possibly merged) operation.
    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    /// Input positions absorbed into this operation, in absorption order.
    pub fn sources(&self) -> &[usize] {
        &self.sources
    }

    /// Earliest absorbed input position.
    pub fn first_source(&self) -> usize {
        self.sources.iter().copied().min().unwrap_or(usize::MAX)
    }

    /// Consume and return the operation.
    pub fn into_operation(self) -> Operation {
        self.operation
    }
}

/// Append-only fan-out under construction.
#[derive(Debug, Clone)]
pub(crate) struct MergeSlot {
    op: Operation,
    sources: Vec<usize>,
}

impl MergeSlot {
    /// Open a slot for `op`; controlled gates are promoted to one-target fan-outs.
    pub(crate) fn open(op: &Operation, position: usize) -> CompileResult<Self> {
        let op = match op {
            Operation::Controlled { control, target } => {
                FanoutGate::new(*control, [*target])?.into()
            }
            Operation::ControlledPhase {
                control,
                target,
                angle,
            } => PhaseFanoutGate::new(*control, [(*target, *angle)])?.into(),
            other => other.clone(),
        };
        Ok(Self {
            op,
            sources: vec![position],
        })
    }

    /// Current state of the fan-out.
    pub(crate) fn operation(&self) -> &Operation {
        &self.op
    }

    /// Same family and same control.
    pub(crate) fn is_partner(&self, op: &Operation) -> bool {
        op.family().is_mergeable()
            && self.op.family() == op.family()
            && self.op.control() == op.control()
    }

    /// Extend the fan-out with `op` in place.
    ///
    /// With `accumulate`, repeated phase targets add their angle to the existing entry;
    /// otherwise every target must be new.
    pub(crate) fn absorb(
        &mut self,
        op: &Operation,
        position: usize,
        accumulate: bool,
    ) -> CompileResult<()> {
        if !self.is_partner(op) {
            return Err(self.mismatch(op));
        }
        let extended = match (&mut self.op, op) {
            (Operation::Fanout(fan), Operation::Controlled { target, .. }) => {
                insert_cx_target(fan, *target)?;
                true
            }
            (Operation::Fanout(fan), Operation::Fanout(other)) => {
                for &target in other.targets() {
                    insert_cx_target(fan, target)?;
                }
                true
            }
            (Operation::PhaseFanout(fan), Operation::ControlledPhase { target, angle, .. }) => {
                insert_phase_target(fan, *target, *angle, accumulate)?;
                true
            }
            (Operation::PhaseFanout(fan), Operation::PhaseFanout(other)) => {
                for &(target, angle) in other.targets() {
                    insert_phase_target(fan, target, angle, accumulate)?;
                }
                true
            }
            _ => false,
        };
        if !extended {
            return Err(self.mismatch(op));
        }
        self.sources.push(position);
        Ok(())
    }

    /// Freeze the slot into its final value.
    pub(crate) fn freeze(self) -> PackedOperation {
        PackedOperation {
            operation: self.op,
            sources: self.sources,
        }
    }

    fn mismatch(&self, op: &Operation) -> CompileError {
        CompileError::IncompatibleMerge {
            slot: self.op.to_string(),
            incoming: op.to_string(),
        }
    }
}

fn insert_cx_target(fan: &mut FanoutGate, target: QubitId) -> CompileResult<()> {
    if !fan.insert_target(target)? {
        return Err(qfan_ir::IrError::DuplicateTarget {
            gate: "fanout".into(),
            control: fan.control(),
            target,
        }
        .into());
    }
    Ok(())
}

fn insert_phase_target(
    fan: &mut PhaseFanoutGate,
    target: QubitId,
    angle: f64,
    accumulate: bool,
) -> CompileResult<()> {
    if accumulate {
        fan.accumulate(target, angle)?;
    } else {
        fan.insert_target(target, angle)?;
    }
    Ok(())
}
