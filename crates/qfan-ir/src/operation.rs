//! Operations and their qubit footprints.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{IrError, IrResult};
use crate::gate::{SingleQubitKind, format_angle};
use crate::qubit::QubitId;

/// Coarse classification of an operation used by commutation and merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateFamily {
    /// Single-qubit gate that is not diagonal in the computational basis.
    SingleQubit,
    /// Single-qubit gate diagonal in the computational basis (Z, S, T, Rz, P, ...).
    ZDiagonal,
    /// CX and its fan-out.
    Controlled,
    /// Controlled-phase and its fan-out.
    ControlledPhase,
}

impl GateFamily {
    /// Whether operations of this family can be merged into a fan-out.
    #[inline]
    pub fn is_mergeable(self) -> bool {
        matches!(self, GateFamily::Controlled | GateFamily::ControlledPhase)
    }
}

/// A CX broadcast from one control to several targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanoutGate {
    control: QubitId,
    targets: Vec<QubitId>,
}

impl FanoutGate {
    /// Create a fan-out, rejecting empty, repeated or self-controlled targets.
    pub fn new(control: QubitId, targets: impl IntoIterator<Item = QubitId>) -> IrResult<Self> {
        let gate = Self {
            control,
            targets: targets.into_iter().collect(),
        };
        gate.validate()?;
        Ok(gate)
    }

    /// The control qubit.
    #[inline]
    pub fn control(&self) -> QubitId {
        self.control
    }

    /// Targets in insertion order.
    #[inline]
    pub fn targets(&self) -> &[QubitId] {
        &self.targets
    }

    /// Check whether `qubit` is already a target.
    pub fn contains(&self, qubit: QubitId) -> bool {
        self.targets.contains(&qubit)
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if the fan-out has no targets.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Add a target with set semantics.
    ///
    /// Returns `Ok(false)` when the target is already present.
    pub fn insert_target(&mut self, target: QubitId) -> IrResult<bool> {
        if target == self.control {
            return Err(IrError::TargetIsControl {
                gate: "fanout".into(),
                qubit: target,
            });
        }
        if self.contains(target) {
            return Ok(false);
        }
        self.targets.push(target);
        Ok(true)
    }

    fn validate(&self) -> IrResult<()> {
        if self.targets.is_empty() {
            return Err(IrError::malformed("fanout", "no targets"));
        }
        let mut seen = FxHashSet::default();
        for &t in &self.targets {
            if t == self.control {
                return Err(IrError::malformed(
                    "fanout",
                    format!("target {t} equals control"),
                ));
            }
            if !seen.insert(t) {
                return Err(IrError::malformed("fanout", format!("target {t} repeated")));
            }
        }
        Ok(())
    }
}

/// A controlled-phase broadcast with one angle per target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseFanoutGate {
    control: QubitId,
    targets: Vec<(QubitId, f64)>,
}

impl PhaseFanoutGate {
    /// Create a phase fan-out from `(target, angle)` pairs.
    pub fn new(
        control: QubitId,
        targets: impl IntoIterator<Item = (QubitId, f64)>,
    ) -> IrResult<Self> {
        let gate = Self {
            control,
            targets: targets.into_iter().collect(),
        };
        gate.validate()?;
        Ok(gate)
    }

    /// The control qubit.
    #[inline]
    pub fn control(&self) -> QubitId {
        self.control
    }

    /// `(target, angle)` pairs in insertion order.
    #[inline]
    pub fn targets(&self) -> &[(QubitId, f64)] {
        &self.targets
    }

    /// Angle currently mapped to `target`.
    pub fn angle_of(&self, target: QubitId) -> Option<f64> {
        self.targets
            .iter()
            .find(|(t, _)| *t == target)
            .map(|&(_, angle)| angle)
    }

    /// Number of targets.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    /// Check if the fan-out has no targets.
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Add a new target; keys must stay unique.
    pub fn insert_target(&mut self, target: QubitId, angle: f64) -> IrResult<()> {
        if target == self.control {
            return Err(IrError::TargetIsControl {
                gate: "cp_fanout".into(),
                qubit: target,
            });
        }
        if self.angle_of(target).is_some() {
            return Err(IrError::DuplicateTarget {
                gate: "cp_fanout".into(),
                control: self.control,
                target,
            });
        }
        self.targets.push((target, angle));
        Ok(())
    }

    /// Add `angle` to the entry for `target`, inserting it if absent.
    pub fn accumulate(&mut self, target: QubitId, angle: f64) -> IrResult<()> {
        match self.targets.iter_mut().find(|(t, _)| *t == target) {
            Some((_, existing)) => {
                *existing += angle;
                Ok(())
            }
            None => self.insert_target(target, angle),
        }
    }

    fn validate(&self) -> IrResult<()> {
        if self.targets.is_empty() {
            return Err(IrError::malformed("cp_fanout", "no targets"));
        }
        let mut seen = FxHashSet::default();
        for &(t, angle) in &self.targets {
            if t == self.control {
                return Err(IrError::malformed(
                    "cp_fanout",
                    format!("target {t} equals control"),
                ));
            }
            if !seen.insert(t) {
                return Err(IrError::malformed(
                    "cp_fanout",
                    format!("target {t} repeated"),
                ));
            }
            if !angle.is_finite() {
                return Err(IrError::malformed(
                    "cp_fanout",
                    format!("angle for target {t} is not finite"),
                ));
            }
        }
        Ok(())
    }
}

/// A circuit operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// A single-qubit gate; never merges.
    Single {
        /// The gate kind.
        kind: SingleQubitKind,
        /// The qubit it acts on.
        qubit: QubitId,
    },
    /// A CX gate.
    #[serde(rename = "cx")]
    Controlled {
        /// Control qubit.
        control: QubitId,
        /// Target qubit.
        target: QubitId,
    },
    /// A controlled-phase gate.
    #[serde(rename = "cp")]
    ControlledPhase {
        /// Control qubit.
        control: QubitId,
        /// Target qubit.
        target: QubitId,
        /// Phase angle.
        angle: f64,
    },
    /// Merged CX fan-out.
    Fanout(FanoutGate),
    /// Merged controlled-phase fan-out.
    PhaseFanout(PhaseFanoutGate),
}

impl Operation {
    /// Create a single-qubit operation.
    pub fn single(kind: SingleQubitKind, qubit: QubitId) -> Self {
        Operation::Single { kind, qubit }
    }

    /// Create a validated CX.
    pub fn cx(control: QubitId, target: QubitId) -> IrResult<Self> {
        let op = Operation::Controlled { control, target };
        op.validate()?;
        Ok(op)
    }

    /// Create a validated controlled-phase gate.
    pub fn cp(angle: f64, control: QubitId, target: QubitId) -> IrResult<Self> {
        let op = Operation::ControlledPhase {
            control,
            target,
            angle,
        };
        op.validate()?;
        Ok(op)
    }

    /// Get the name of this operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Single { kind, .. } => kind.name(),
            Operation::Controlled { .. } => "cx",
            Operation::ControlledPhase { .. } => "cp",
            Operation::Fanout(_) => "fanout",
            Operation::PhaseFanout(_) => "cp_fanout",
        }
    }

    /// Gate family of this operation.
    pub fn family(&self) -> GateFamily {
        match self {
            Operation::Single { kind, .. } if kind.is_z_diagonal() => GateFamily::ZDiagonal,
            Operation::Single { .. } => GateFamily::SingleQubit,
            Operation::Controlled { .. } | Operation::Fanout(_) => GateFamily::Controlled,
            Operation::ControlledPhase { .. } | Operation::PhaseFanout(_) => {
                GateFamily::ControlledPhase
            }
        }
    }

    /// Control qubit, for controlled operations.
    pub fn control(&self) -> Option<QubitId> {
        match self {
            Operation::Single { .. } => None,
            Operation::Controlled { control, .. } | Operation::ControlledPhase { control, .. } => {
                Some(*control)
            }
            Operation::Fanout(g) => Some(g.control()),
            Operation::PhaseFanout(g) => Some(g.control()),
        }
    }

    /// Target qubits, in order. Empty for single-qubit gates.
    pub fn targets(&self) -> Vec<QubitId> {
        match self {
            Operation::Single { .. } => vec![],
            Operation::Controlled { target, .. } | Operation::ControlledPhase { target, .. } => {
                vec![*target]
            }
            Operation::Fanout(g) => g.targets().to_vec(),
            Operation::PhaseFanout(g) => g.targets().iter().map(|&(t, _)| t).collect(),
        }
    }

    /// Every qubit this operation touches, control first.
    pub fn footprint(&self) -> Vec<QubitId> {
        match self {
            Operation::Single { qubit, .. } => vec![*qubit],
            _ => {
                let mut qubits = Vec::with_capacity(1 + self.num_targets());
                qubits.extend(self.control());
                qubits.extend(self.targets());
                qubits
            }
        }
    }

    /// Number of target qubits.
    pub fn num_targets(&self) -> usize {
        match self {
            Operation::Single { .. } => 0,
            Operation::Controlled { .. } | Operation::ControlledPhase { .. } => 1,
            Operation::Fanout(g) => g.len(),
            Operation::PhaseFanout(g) => g.len(),
        }
    }

    /// Check whether `qubit` is in the footprint.
    pub fn acts_on(&self, qubit: QubitId) -> bool {
        match self {
            Operation::Single { qubit: q, .. } => *q == qubit,
            Operation::Controlled { control, target }
            | Operation::ControlledPhase {
                control, target, ..
            } => *control == qubit || *target == qubit,
            Operation::Fanout(g) => g.control() == qubit || g.contains(qubit),
            Operation::PhaseFanout(g) => g.control() == qubit || g.angle_of(qubit).is_some(),
        }
    }

    /// Check whether two operations share at least one qubit.
    pub fn overlaps(&self, other: &Operation) -> bool {
        self.footprint().into_iter().any(|q| other.acts_on(q))
    }

    /// Largest qubit index touched.
    pub fn max_qubit(&self) -> QubitId {
        self.footprint()
            .into_iter()
            .max()
            .unwrap_or(QubitId(0))
    }

    /// Check that the operation references the distinct qubits its kind requires.
    pub fn validate(&self) -> IrResult<()> {
        match self {
            Operation::Single { kind, .. } => match kind.angle() {
                Some(a) if !a.is_finite() => Err(IrError::malformed(
                    kind.name(),
                    "rotation angle is not finite",
                )),
                _ => Ok(()),
            },
            Operation::Controlled { control, target } => {
                if control == target {
                    return Err(IrError::malformed(
                        "cx",
                        format!("control and target are both qubit {control}"),
                    ));
                }
                Ok(())
            }
            Operation::ControlledPhase {
                control,
                target,
                angle,
            } => {
                if control == target {
                    return Err(IrError::malformed(
                        "cp",
                        format!("control and target are both qubit {control}"),
                    ));
                }
                if !angle.is_finite() {
                    return Err(IrError::malformed("cp", "phase angle is not finite"));
                }
                Ok(())
            }
            Operation::Fanout(g) => g.validate(),
            Operation::PhaseFanout(g) => g.validate(),
        }
    }
}

impl From<FanoutGate> for Operation {
    fn from(gate: FanoutGate) -> Self {
        Operation::Fanout(gate)
    }
}

impl From<PhaseFanoutGate> for Operation {
    fn from(gate: PhaseFanoutGate) -> Self {
        Operation::PhaseFanout(gate)
    }
}

fn join<T>(items: impl IntoIterator<Item = T>, f: impl Fn(T) -> String) -> String {
    items.into_iter().map(f).collect::<Vec<_>>().join(",")
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Single { kind, qubit } => {
                let name = kind.name().to_uppercase();
                match kind.angle() {
                    Some(a) => write!(f, "{name}({qubit}; {})", format_angle(a)),
                    None => write!(f, "{name}({qubit})"),
                }
            }
            Operation::Controlled { control, target } => write!(f, "CX({control}→{target})"),
            Operation::ControlledPhase {
                control,
                target,
                angle,
            } => write!(f, "CP({})({control}→{target})", format_angle(*angle)),
            Operation::Fanout(g) => write!(
                f,
                "FANOUT({}→{{{}}})",
                g.control(),
                join(g.targets(), ToString::to_string)
            ),
            Operation::PhaseFanout(g) => write!(
                f,
                "CP_FANOUT({}→{{{}}})",
                g.control(),
                join(g.targets(), |(t, a)| format!("{t}:{}", format_angle(*a)))
            ),
        }
    }
}
